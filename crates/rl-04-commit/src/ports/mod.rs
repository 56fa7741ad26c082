//! Hexagonal ports for the aggregator.
//!
//! Driven ports come from the shared crates: [`NetworkSink`] and [`Clock`]
//! from `shared-bus`, [`SignatureVerificationApi`] from `rl-01-signatures`.

pub mod inbound;

pub use inbound::{CommitApi, CommitOutcome};
pub use rl_01_signatures::SignatureVerificationApi;
pub use shared_bus::{Clock, NetworkSink};
