//! Driving ports (Inbound API)

use crate::domain::{EndorsementResult, PeerStats};
use async_trait::async_trait;
use rl_02_ledger_store::Blockchain;
use shared_types::TransactionRecord;

/// Operations a runtime or test drives on a peer, besides delivering
/// messages through `MessageHandler`.
#[async_trait]
pub trait EndorsementApi: Send {
    /// Create a transaction and ask every peer to endorse it.
    ///
    /// Refused with `QuorumPending` while another transaction is in flight.
    async fn create_transaction(&mut self) -> EndorsementResult<TransactionRecord>;

    /// Abandon the in-flight quorum if it has timed out. Returns whether it
    /// did.
    fn poll_timeout(&mut self) -> bool;

    fn is_awaiting_quorum(&self) -> bool;

    /// Snapshot of this peer's counters.
    fn stats(&self) -> PeerStats;

    /// This peer's view of the chain.
    fn ledger(&self) -> &Blockchain;
}
