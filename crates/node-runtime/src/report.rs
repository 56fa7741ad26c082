//! # Simulation Reports
//!
//! Each node task sends one [`NodeReport`] when it stops; the runtime folds
//! them into a [`SimulationReport`].

use rl_01_signatures::{SignatureVerificationApi, SigningApi};
use rl_02_ledger_store::Blockchain;
use rl_03_endorsement::{EndorsementApi, PeerService, PeerStats};
use rl_04_commit::{AggregatorService, AggregatorStats, CommitApi};
use shared_bus::{Clock, NetworkSink};
use shared_types::NodeId;
use std::fmt;
use std::time::Duration;

/// Role-specific counters.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeStats {
    Peer(PeerStats),
    Aggregator(AggregatorStats),
}

/// What one node looked like when the simulation stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeReport {
    pub node_id: NodeId,
    pub chain_height: u64,
    pub total_blocks: u64,
    pub blocks_in_forks: usize,
    pub orphans: usize,
    pub frames_dropped: u64,
    pub stats: NodeStats,
}

impl NodeReport {
    fn from_ledger(node_id: NodeId, ledger: &Blockchain, stats: NodeStats) -> Self {
        Self {
            node_id,
            chain_height: ledger.blockchain_height(),
            total_blocks: ledger.total_blocks(),
            blocks_in_forks: ledger.blocks_in_forks(),
            orphans: ledger.orphan_count(),
            frames_dropped: 0,
            stats,
        }
    }

    pub fn with_frames_dropped(mut self, frames_dropped: u64) -> Self {
        self.frames_dropped = frames_dropped;
        self
    }

    pub fn peer_stats(&self) -> Option<&PeerStats> {
        match &self.stats {
            NodeStats::Peer(stats) => Some(stats),
            NodeStats::Aggregator(_) => None,
        }
    }

    pub fn aggregator_stats(&self) -> Option<&AggregatorStats> {
        match &self.stats {
            NodeStats::Aggregator(stats) => Some(stats),
            NodeStats::Peer(_) => None,
        }
    }
}

/// A node that can describe itself at shutdown.
pub trait Reportable {
    fn report(&self) -> NodeReport;
}

impl<N, C, S> Reportable for PeerService<N, C, S>
where
    N: NetworkSink,
    C: Clock,
    S: SigningApi,
{
    fn report(&self) -> NodeReport {
        NodeReport::from_ledger(
            self.config().node_id,
            self.ledger(),
            NodeStats::Peer(EndorsementApi::stats(self)),
        )
    }
}

impl<N, C, V> Reportable for AggregatorService<N, C, V>
where
    N: NetworkSink,
    C: Clock,
    V: SignatureVerificationApi,
{
    fn report(&self) -> NodeReport {
        NodeReport::from_ledger(
            self.config().node_id,
            self.ledger(),
            NodeStats::Aggregator(CommitApi::stats(self)),
        )
    }
}

/// Summary of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub duration: Duration,
    /// Sorted by node id, so the aggregator comes first.
    pub nodes: Vec<NodeReport>,
}

impl SimulationReport {
    pub fn new(duration: Duration, mut nodes: Vec<NodeReport>) -> Self {
        nodes.sort_by_key(|node| node.node_id);
        Self { duration, nodes }
    }

    pub fn aggregator(&self) -> Option<&NodeReport> {
        self.nodes.iter().find(|node| node.aggregator_stats().is_some())
    }

    pub fn peers(&self) -> impl Iterator<Item = (&NodeReport, &PeerStats)> {
        self.nodes
            .iter()
            .filter_map(|node| node.peer_stats().map(|stats| (node, stats)))
    }

    /// Aggregator chain height.
    pub fn chain_height(&self) -> u64 {
        self.aggregator().map_or(0, |node| node.chain_height)
    }

    pub fn transactions_committed(&self) -> u64 {
        self.aggregator()
            .and_then(NodeReport::aggregator_stats)
            .map_or(0, |stats| stats.transactions_committed)
    }

    /// Committed transactions per second of run time.
    pub fn throughput_tps(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.transactions_committed() as f64 / secs
        } else {
            0.0
        }
    }

    /// Creation-to-forward latency across every peer, weighted by the
    /// number of quorums each completed.
    pub fn mean_latency_ms(&self) -> Option<f64> {
        let (sum, count) = self.peers().fold((0.0, 0u64), |(sum, count), (_, stats)| {
            match stats.latency_ms.mean() {
                Some(mean) => (sum + mean * stats.latency_ms.count() as f64, count + stats.latency_ms.count()),
                None => (sum, count),
            }
        });
        (count > 0).then(|| sum / count as f64)
    }

    /// Fork blocks seen by the peer with the most.
    pub fn max_peer_forks(&self) -> usize {
        self.peers().map(|(node, _)| node.blocks_in_forks).max().unwrap_or(0)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.nodes.iter().map(|node| node.frames_dropped).sum()
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Simulation summary ({} ms) ===", self.duration.as_millis())?;
        writeln!(f, "chain height:           {}", self.chain_height())?;
        writeln!(f, "transactions committed: {}", self.transactions_committed())?;
        writeln!(f, "throughput:             {:.2} tx/s", self.throughput_tps())?;
        match self.mean_latency_ms() {
            Some(latency) => writeln!(f, "mean quorum latency:    {latency:.2} ms")?,
            None => writeln!(f, "mean quorum latency:    n/a")?,
        }
        writeln!(f, "peer fork blocks (max): {}", self.max_peer_forks())?;
        writeln!(f, "frames dropped:         {}", self.frames_dropped())?;

        if let Some(stats) = self.aggregator().and_then(NodeReport::aggregator_stats) {
            writeln!(
                f,
                "aggregator: received={} blocks={} rejected={} (duplicate={} unsigned={} digest={} signature={})",
                stats.commits_received,
                stats.blocks_produced,
                stats.rejected(),
                stats.rejected_duplicate,
                stats.rejected_unsigned,
                stats.rejected_digest_mismatch,
                stats.rejected_bad_signature,
            )?;
        }
        for (node, stats) in self.peers() {
            writeln!(
                f,
                "peer {}: created={} quorums={} abandoned={} signed={} refused={} height={} committed={}",
                node.node_id,
                stats.transactions_created,
                stats.quorums_completed,
                stats.quorums_abandoned,
                stats.endorsements_signed,
                stats.endorsements_refused,
                node.chain_height,
                stats.own_transactions_committed,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_03_endorsement::RunningMean;

    fn peer(node_id: NodeId, latencies: &[f64]) -> NodeReport {
        let mut latency_ms = RunningMean::default();
        for &latency in latencies {
            latency_ms.record(latency);
        }
        let stats = PeerStats {
            quorums_completed: latencies.len() as u64,
            latency_ms,
            ..PeerStats::default()
        };
        NodeReport::from_ledger(node_id, &Blockchain::new(), NodeStats::Peer(stats))
    }

    fn aggregator(committed: u64) -> NodeReport {
        let stats = AggregatorStats {
            transactions_committed: committed,
            blocks_produced: committed,
            ..AggregatorStats::default()
        };
        let mut report = NodeReport::from_ledger(0, &Blockchain::new(), NodeStats::Aggregator(stats));
        report.chain_height = committed;
        report
    }

    #[test]
    fn test_weighted_latency() {
        let report = SimulationReport::new(
            Duration::from_secs(2),
            vec![peer(2, &[30.0]), aggregator(4), peer(1, &[10.0, 10.0, 10.0])],
        );
        assert_eq!(report.nodes[0].node_id, 0);
        assert!((report.mean_latency_ms().unwrap() - 15.0).abs() < 1e-9);
        assert_eq!(report.chain_height(), 4);
        assert!((report.throughput_tps() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_run() {
        let report = SimulationReport::new(Duration::from_secs(1), vec![peer(1, &[])]);
        assert_eq!(report.mean_latency_ms(), None);
        assert_eq!(report.transactions_committed(), 0);
        assert!(report.to_string().contains("mean quorum latency:    n/a"));
    }
}
