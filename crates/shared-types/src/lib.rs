//! # Shared Types Crate
//!
//! Domain entities and wire messages exchanged by roadside peers and the
//! aggregator.
//!
//! ## Contents
//!
//! - **Entities**: [`TransactionRecord`], [`Block`], [`Endorsement`] and the
//!   public-key / signature snapshots carried inside endorsements.
//! - **Wire messages**: [`WireMessage`] and its four payloads. The JSON shape
//!   is the interoperability contract between nodes.

pub mod entities;
pub mod errors;
pub mod ipc;

pub use entities::*;
pub use errors::*;
pub use ipc::*;
