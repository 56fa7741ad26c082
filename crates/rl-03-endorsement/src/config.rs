//! Peer configuration.
//!
//! Injected once at construction. Every field has a default matching the
//! reference deployment, so a TOML or JSON file only needs the node's own id
//! and peer set.

use crate::domain::ConfigError;
use serde::Deserialize;
use shared_types::{NodeId, TransactionPayload, AGGREGATOR_ID};
use std::collections::BTreeSet;
use std::time::Duration;

/// Default pause between two transactions created by one peer.
pub const DEFAULT_TRANSACTION_INTERVAL_MS: u64 = 250;

/// Which responses count towards a quorum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumRule {
    /// Every other peer must respond.
    #[default]
    AllPeers,
    /// Every other peer must respond and the originator endorses its own
    /// transaction locally.
    AllPeersAndSelf,
}

impl QuorumRule {
    /// Responses needed for a quorum given `peer_count` other peers.
    pub fn threshold(self, peer_count: usize) -> usize {
        match self {
            QuorumRule::AllPeers => peer_count,
            QuorumRule::AllPeersAndSelf => peer_count + 1,
        }
    }
}

/// Why a transaction falls outside the [`ValidationWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    Payment,
    Timestamp,
}

/// Half-open ranges a transaction must fall in to be endorsed.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ValidationWindow {
    pub payment_low: f64,
    pub payment_high: f64,
    pub timestamp_low: u64,
    pub timestamp_high: u64,
}

impl Default for ValidationWindow {
    fn default() -> Self {
        Self {
            payment_low: 0.0,
            payment_high: 100_000.0,
            timestamp_low: 0,
            timestamp_high: 1_000_000_000,
        }
    }
}

impl ValidationWindow {
    pub fn check(&self, tx: &TransactionPayload) -> Result<(), Refusal> {
        if !(tx.payment >= self.payment_low && tx.payment < self.payment_high) {
            return Err(Refusal::Payment);
        }
        if !(self.timestamp_low..self.timestamp_high).contains(&tx.timestamp) {
            return Err(Refusal::Timestamp);
        }
        Ok(())
    }
}

/// Configuration of one peer node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    pub node_id: NodeId,
    /// Every other peer; never contains `node_id` or the aggregator.
    pub peers: Vec<NodeId>,
    pub aggregator_id: NodeId,
    /// Auction winner this peer reports.
    pub winner_id: u32,
    /// Payment this peer reports.
    pub payment: f64,
    pub window: ValidationWindow,
    pub transaction_interval_ms: u64,
    pub quorum_rule: QuorumRule,
    /// Abandon a quorum after this long. `None` waits forever.
    pub quorum_timeout_ms: Option<u64>,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            node_id: 1,
            peers: Vec::new(),
            aggregator_id: AGGREGATOR_ID,
            winner_id: 0,
            payment: 0.0,
            window: ValidationWindow::default(),
            transaction_interval_ms: DEFAULT_TRANSACTION_INTERVAL_MS,
            quorum_rule: QuorumRule::default(),
            quorum_timeout_ms: None,
        }
    }
}

impl PeerConfig {
    pub fn new(node_id: NodeId, peers: Vec<NodeId>) -> Self {
        Self {
            node_id,
            peers,
            ..Self::default()
        }
    }

    pub fn with_auction(mut self, winner_id: u32, payment: f64) -> Self {
        self.winner_id = winner_id;
        self.payment = payment;
        self
    }

    pub fn with_quorum_rule(mut self, quorum_rule: QuorumRule) -> Self {
        self.quorum_rule = quorum_rule;
        self
    }

    pub fn with_quorum_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.quorum_timeout_ms = timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_transaction_interval(mut self, interval: Duration) -> Self {
        self.transaction_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_window(mut self, window: ValidationWindow) -> Self {
        self.window = window;
        self
    }

    /// Responses needed before forwarding to the aggregator.
    pub fn threshold(&self) -> usize {
        self.expected_responders().len()
    }

    /// Nodes whose responses count towards a quorum: the peer set, plus this
    /// node under [`QuorumRule::AllPeersAndSelf`].
    pub fn expected_responders(&self) -> BTreeSet<NodeId> {
        let mut expected: BTreeSet<NodeId> = self.peers.iter().copied().collect();
        if self.quorum_rule == QuorumRule::AllPeersAndSelf {
            expected.insert(self.node_id);
        }
        expected
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_id == self.aggregator_id {
            return Err(ConfigError::PeerIsAggregator(self.node_id));
        }
        if self.peers.contains(&self.node_id) {
            return Err(ConfigError::SelfInPeerSet(self.node_id));
        }
        if self.peers.contains(&self.aggregator_id) {
            return Err(ConfigError::AggregatorInPeerSet(self.aggregator_id));
        }
        if self.threshold() == 0 {
            return Err(ConfigError::EmptyQuorum);
        }
        if !self.payment.is_finite() {
            return Err(ConfigError::InvalidPayment(self.payment));
        }
        let w = &self.window;
        if !(w.payment_low < w.payment_high) || w.timestamp_low >= w.timestamp_high {
            return Err(ConfigError::EmptyWindow);
        }
        if self.transaction_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(payment: f64, timestamp: u64) -> TransactionPayload {
        TransactionPayload {
            peer_id: 1,
            tx_id: 1,
            timestamp,
            payment,
            winner_id: 1,
        }
    }

    #[test]
    fn test_expected_responders_follow_rule() {
        let config = PeerConfig::new(1, vec![3, 2]);
        assert_eq!(config.expected_responders().into_iter().collect::<Vec<_>>(), vec![2, 3]);

        let config = config.with_quorum_rule(QuorumRule::AllPeersAndSelf);
        assert_eq!(config.expected_responders().into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(config.threshold(), 3);
    }

    #[test]
    fn test_window_is_half_open() {
        let window = ValidationWindow::default();
        assert_eq!(window.check(&payload(0.0, 0)), Ok(()));
        assert_eq!(window.check(&payload(99_999.99, 999_999_999)), Ok(()));
        assert_eq!(window.check(&payload(100_000.0, 0)), Err(Refusal::Payment));
        assert_eq!(window.check(&payload(-1.0, 0)), Err(Refusal::Payment));
        assert_eq!(window.check(&payload(f64::NAN, 0)), Err(Refusal::Payment));
        assert_eq!(window.check(&payload(1.0, 1_000_000_000)), Err(Refusal::Timestamp));
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(QuorumRule::AllPeers.threshold(2), 2);
        assert_eq!(QuorumRule::AllPeersAndSelf.threshold(2), 3);
        assert_eq!(PeerConfig::new(1, vec![2, 3]).threshold(), 2);
        assert_eq!(PeerConfig::new(1, vec![2, 3, 3]).threshold(), 2);
    }

    #[test]
    fn test_validation() {
        assert!(PeerConfig::new(1, vec![2, 3]).validate().is_ok());
        assert_eq!(PeerConfig::new(0, vec![2]).validate(), Err(ConfigError::PeerIsAggregator(0)));
        assert_eq!(PeerConfig::new(1, vec![1, 2]).validate(), Err(ConfigError::SelfInPeerSet(1)));
        assert_eq!(PeerConfig::new(1, vec![0, 2]).validate(), Err(ConfigError::AggregatorInPeerSet(0)));
        assert_eq!(PeerConfig::new(1, vec![]).validate(), Err(ConfigError::EmptyQuorum));
        assert!(PeerConfig::new(1, vec![])
            .with_quorum_rule(QuorumRule::AllPeersAndSelf)
            .validate()
            .is_ok());
        assert_eq!(
            PeerConfig::new(1, vec![2]).with_auction(1, f64::INFINITY).validate(),
            Err(ConfigError::InvalidPayment(f64::INFINITY))
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: PeerConfig = serde_json::from_str(
            r#"{"node_id": 2, "peers": [1, 3], "payment": 12.5, "quorum_rule": "all_peers_and_self"}"#,
        )
        .unwrap();
        assert_eq!(config.node_id, 2);
        assert_eq!(config.payment, 12.5);
        assert_eq!(config.quorum_rule, QuorumRule::AllPeersAndSelf);
        assert_eq!(config.transaction_interval_ms, DEFAULT_TRANSACTION_INTERVAL_MS);
        assert_eq!(config.window, ValidationWindow::default());
        assert_eq!(config.quorum_timeout_ms, None);
    }
}
