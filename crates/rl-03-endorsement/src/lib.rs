//! # Endorsement Subsystem (RL-03)
//!
//! Protocol logic of a roadside peer node.
//!
//! ## Architecture
//!
//! A peer creates a transaction, asks every other peer to endorse it and
//! waits for a quorum of responses. The endorsement that completed the
//! quorum travels with the transaction to the aggregator:
//!
//! ```text
//! Peer 1 ──EndorsementRequest──→ Peers 2..N
//!        ←─EndorsementResponse── (each signs the canonical request bytes)
//!        ──CommitRequest───────→ Aggregator ──BlockBroadcast──→ every peer
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | One in flight | A peer never creates a transaction while awaiting quorum |
//! | Distinct responders | Each responder counts once per transaction |
//! | Monotonic ids | Transaction ids start at 1 and are never reused |
//! | Local ledger | Broadcast blocks land in the peer's own chain view |

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::{PeerConfig, QuorumRule, Refusal, ValidationWindow, DEFAULT_TRANSACTION_INTERVAL_MS};
pub use domain::{
    ConfigError, EndorsementError, EndorsementResult, PeerStats, PendingQuorum, QuorumProgress,
    QuorumState, RunningMean,
};
pub use ports::EndorsementApi;
pub use service::{PeerDependencies, PeerService};
