//! Inbound port: what drives the aggregator.

use crate::domain::{AggregatorStats, Rejection};
use crate::error::CommitResult;
use async_trait::async_trait;
use rl_02_ledger_store::Blockchain;
use shared_types::{Block, CommitRequest};

/// Result of one commit request.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Appended and broadcast.
    Committed(Block),
    Rejected(Rejection),
}

impl CommitOutcome {
    pub fn block(&self) -> Option<&Block> {
        match self {
            CommitOutcome::Committed(block) => Some(block),
            CommitOutcome::Rejected(_) => None,
        }
    }
}

#[async_trait]
pub trait CommitApi: Send {
    /// Verify an endorsed transaction and, if it holds up, commit it in a
    /// new block and broadcast the block to every peer.
    async fn commit(&mut self, request: CommitRequest) -> CommitResult<CommitOutcome>;

    fn stats(&self) -> AggregatorStats;

    fn ledger(&self) -> &Blockchain;
}
