//! Error types for the endorsement protocol.

use shared_bus::TransportError;
use shared_types::{NodeId, WireError};
use rl_01_signatures::SignatureError;
use rl_02_ledger_store::LedgerError;
use thiserror::Error;

/// Endorsement protocol errors.
///
/// Refused endorsements and stale responses are not errors; they are
/// counted in [`PeerStats`](super::PeerStats).
#[derive(Debug, Error)]
pub enum EndorsementError {
    #[error("Transaction {tx_id} is still awaiting quorum")]
    QuorumPending { tx_id: u64 },

    #[error("Peer cannot handle {kind} from node {from}")]
    UnexpectedMessage { kind: &'static str, from: NodeId },

    #[error("Signing failed: {0}")]
    Signing(#[from] SignatureError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Result type for endorsement operations.
pub type EndorsementResult<T> = Result<T, EndorsementError>;

/// Invalid [`PeerConfig`](crate::PeerConfig).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Node {0} is the aggregator and cannot run as a peer")]
    PeerIsAggregator(NodeId),

    #[error("Peer set contains the node itself ({0})")]
    SelfInPeerSet(NodeId),

    #[error("Peer set contains the aggregator ({0})")]
    AggregatorInPeerSet(NodeId),

    #[error("Quorum threshold is zero; no transaction could be endorsed")]
    EmptyQuorum,

    #[error("Payment {0} is not a finite number")]
    InvalidPayment(f64),

    #[error("Validation window accepts nothing")]
    EmptyWindow,

    #[error("Transaction interval must be positive")]
    ZeroInterval,
}
