//! Quorum state machine.
//!
//! ```text
//!   Idle ──create_transaction──▶ AwaitingQuorum ──threshold reached──▶ Idle
//!                                      │
//!                                      └──────── timeout ─────────────▶ Idle
//! ```
//!
//! At most one transaction is in flight per peer.

use shared_types::{Endorsement, NodeId, Timestamp, TransactionKey, TransactionRecord};
use std::collections::BTreeSet;

/// Where a peer is in its endorsement round.
#[derive(Debug, Clone, Default)]
pub enum QuorumState {
    #[default]
    Idle,
    AwaitingQuorum(PendingQuorum),
}

impl QuorumState {
    pub fn is_idle(&self) -> bool {
        matches!(self, QuorumState::Idle)
    }

    pub fn pending(&self) -> Option<&PendingQuorum> {
        match self {
            QuorumState::Idle => None,
            QuorumState::AwaitingQuorum(pending) => Some(pending),
        }
    }

    /// Leave the current round, returning it.
    pub fn take(&mut self) -> Option<PendingQuorum> {
        match std::mem::take(self) {
            QuorumState::Idle => None,
            QuorumState::AwaitingQuorum(pending) => Some(pending),
        }
    }
}

/// Effect of recording one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuorumProgress {
    /// Responder is not part of the expected set.
    Unexpected,
    /// Responder already counted.
    Duplicate,
    /// Counted; `count` of `threshold` so far.
    Counted { count: usize, threshold: usize },
    /// This response reached the threshold.
    Complete,
}

/// The one transaction a peer is collecting responses for.
#[derive(Debug, Clone)]
pub struct PendingQuorum {
    transaction: TransactionRecord,
    expected: BTreeSet<NodeId>,
    responders: BTreeSet<NodeId>,
    last: Option<(NodeId, Endorsement)>,
    latest_signed: Option<(NodeId, Endorsement)>,
    started_at: Timestamp,
}

impl PendingQuorum {
    /// A round that completes once every node in `expected` has responded.
    pub fn new(
        transaction: TransactionRecord,
        expected: BTreeSet<NodeId>,
        started_at: Timestamp,
    ) -> Self {
        Self {
            transaction,
            expected,
            responders: BTreeSet::new(),
            last: None,
            latest_signed: None,
            started_at,
        }
    }

    pub fn key(&self) -> TransactionKey {
        self.transaction.key()
    }

    pub fn transaction(&self) -> &TransactionRecord {
        &self.transaction
    }

    pub fn threshold(&self) -> usize {
        self.expected.len()
    }

    pub fn expected(&self) -> &BTreeSet<NodeId> {
        &self.expected
    }

    pub fn responders(&self) -> &BTreeSet<NodeId> {
        &self.responders
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn is_complete(&self) -> bool {
        self.responders.len() >= self.expected.len()
    }

    /// Milliseconds since the round started.
    pub fn age(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.started_at)
    }

    /// Count a response. Each expected responder counts once, signed or not.
    pub fn record(&mut self, responder: NodeId, endorsement: Endorsement) -> QuorumProgress {
        if !self.expected.contains(&responder) {
            return QuorumProgress::Unexpected;
        }
        if !self.responders.insert(responder) {
            return QuorumProgress::Duplicate;
        }
        if endorsement.is_signed {
            self.latest_signed = Some((responder, endorsement.clone()));
        }
        self.last = Some((responder, endorsement));

        if self.is_complete() {
            QuorumProgress::Complete
        } else {
            QuorumProgress::Counted {
                count: self.responders.len(),
                threshold: self.expected.len(),
            }
        }
    }

    /// Endorsement to forward: the last response's, or the most recent
    /// signed one if the last was unsigned.
    pub fn commit_endorsement(&self) -> Option<(NodeId, Endorsement)> {
        match &self.last {
            Some((_, endorsement)) if !endorsement.is_signed => {
                self.latest_signed.clone().or_else(|| self.last.clone())
            }
            last => last.clone(),
        }
    }
}
