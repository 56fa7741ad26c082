//! Error types for the commit subsystem

use rl_02_ledger_store::LedgerError;
use shared_bus::TransportError;
use shared_types::{NodeId, WireError};
use thiserror::Error;

/// Result type alias for commit operations
pub type CommitResult<T> = std::result::Result<T, CommitError>;

/// Failures of the aggregator itself.
///
/// A rejected commit request is not one of these; see
/// [`Rejection`](crate::domain::Rejection).
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("Aggregator cannot handle {kind} from node {from}")]
    UnexpectedMessage { kind: &'static str, from: NodeId },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Invalid [`AggregatorConfig`](crate::AggregatorConfig) or block size
/// policy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Peer set contains the aggregator ({0})")]
    AggregatorInPeerSet(NodeId),

    #[error("Invalid block size policy: {0}")]
    InvalidBlockSize(String),
}
