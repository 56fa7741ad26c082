//! Ports for the endorsement protocol.
//!
//! The driven side is shared with every node and lives elsewhere:
//! [`NetworkSink`] and [`Clock`] in `shared-bus`, [`SigningApi`] in
//! `rl-01-signatures`.

pub mod inbound;

pub use inbound::EndorsementApi;
pub use rl_01_signatures::SigningApi;
pub use shared_bus::{Clock, NetworkSink};
