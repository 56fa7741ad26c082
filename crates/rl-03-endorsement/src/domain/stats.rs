//! Per-peer statistics, returned by value.

/// Incremental arithmetic mean.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMean {
    count: u64,
    mean: f64,
}

impl RunningMean {
    pub fn record(&mut self, value: f64) {
        self.count += 1;
        self.mean += (value - self.mean) / self.count as f64;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// `None` until something is recorded.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }
}

/// Counters kept by one peer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerStats {
    pub transactions_created: u64,
    /// Ticks that found a quorum still pending.
    pub creations_skipped: u64,
    pub quorums_completed: u64,
    pub quorums_abandoned: u64,
    pub endorsements_signed: u64,
    pub endorsements_refused: u64,
    /// Endorsements refused because signing failed even after key
    /// regeneration. Also counted in `endorsements_refused`.
    pub signing_failures: u64,
    /// Responses for a transaction that is not in flight, or from a node
    /// outside the expected responder set.
    pub stale_responses: u64,
    pub duplicate_responses: u64,
    pub blocks_received: u64,
    pub orphan_blocks: u64,
    pub own_transactions_committed: u64,
    /// Creation-to-forward latency in milliseconds.
    pub latency_ms: RunningMean,
}

impl PeerStats {
    pub fn mean_latency_ms(&self) -> Option<f64> {
        self.latency_ms.mean()
    }
}
