//! Aggregator counters.

use super::Rejection;

/// Counters kept by the aggregator, returned by value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatorStats {
    pub commits_received: u64,
    pub rejected_duplicate: u64,
    pub rejected_unsigned: u64,
    pub rejected_digest_mismatch: u64,
    pub rejected_bad_signature: u64,
    pub blocks_produced: u64,
    pub transactions_committed: u64,
    /// Sum of declared block sizes.
    pub bytes_committed: u64,
}

impl AggregatorStats {
    pub fn record_rejection(&mut self, rejection: &Rejection) {
        match rejection {
            Rejection::Duplicate(_) => self.rejected_duplicate += 1,
            Rejection::Unsigned => self.rejected_unsigned += 1,
            Rejection::DigestMismatch { .. } => self.rejected_digest_mismatch += 1,
            Rejection::BadSignature(_) => self.rejected_bad_signature += 1,
        }
    }

    pub fn rejected(&self) -> u64 {
        self.rejected_duplicate
            + self.rejected_unsigned
            + self.rejected_digest_mismatch
            + self.rejected_bad_signature
    }
}
