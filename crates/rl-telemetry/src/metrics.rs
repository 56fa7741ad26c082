//! Prometheus metrics for roadside ledger nodes.
//!
//! All metrics follow the naming convention: `rl_<area>_<metric>_<unit>`.
//! Per-node series carry a `node` label holding the node id.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGaugeVec,
    Opts, Registry, TextEncoder,
};
use shared_types::NodeId;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PEER METRICS
    // =========================================================================

    pub static ref TRANSACTIONS_CREATED: IntCounterVec = IntCounterVec::new(
        Opts::new("rl_peer_transactions_created_total", "Transactions created by a peer"),
        &["node"]
    ).expect("metric creation failed");

    /// Endorsement replies, `outcome` is `signed` or `refused`
    pub static ref ENDORSEMENTS: IntCounterVec = IntCounterVec::new(
        Opts::new("rl_peer_endorsements_total", "Endorsement responses sent"),
        &["node", "outcome"]
    ).expect("metric creation failed");

    /// Quorums, `outcome` is `completed` or `abandoned`
    pub static ref QUORUMS: IntCounterVec = IntCounterVec::new(
        Opts::new("rl_peer_quorums_total", "Quorum rounds finished"),
        &["node", "outcome"]
    ).expect("metric creation failed");

    /// Creation-to-forward latency in milliseconds
    pub static ref QUORUM_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "rl_peer_quorum_latency_milliseconds",
            "Time from transaction creation to forwarding"
        ).buckets(exponential_buckets(1.0, 2.0, 14).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // AGGREGATOR METRICS
    // =========================================================================

    /// Commit requests by `outcome`: `accepted`, `unsigned`,
    /// `digest_mismatch`, `bad_signature`, `duplicate`
    pub static ref COMMITS: IntCounterVec = IntCounterVec::new(
        Opts::new("rl_aggregator_commits_total", "Commit requests handled"),
        &["outcome"]
    ).expect("metric creation failed");

    pub static ref BLOCKS_COMMITTED: IntCounter = IntCounter::new(
        "rl_aggregator_blocks_committed_total",
        "Blocks appended and broadcast by the aggregator"
    ).expect("metric creation failed");

    // =========================================================================
    // LEDGER / TRANSPORT
    // =========================================================================

    /// Height of each node's local chain view
    pub static ref CHAIN_HEIGHT: IntGaugeVec = IntGaugeVec::new(
        Opts::new("rl_ledger_chain_height", "Current blockchain height"),
        &["node"]
    ).expect("metric creation failed");

    pub static ref FRAMES_DROPPED: IntCounterVec = IntCounterVec::new(
        Opts::new("rl_transport_frames_dropped_total", "Frames that failed to decode"),
        &["node"]
    ).expect("metric creation failed");
}

/// Handle returned once metrics are registered.
pub struct MetricsHandle {
    registry: Registry,
}

impl MetricsHandle {
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Register all metrics with the global registry.
///
/// Fails if called twice in one process.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(TRANSACTIONS_CREATED.clone()),
        Box::new(ENDORSEMENTS.clone()),
        Box::new(QUORUMS.clone()),
        Box::new(QUORUM_LATENCY.clone()),
        Box::new(COMMITS.clone()),
        Box::new(BLOCKS_COMMITTED.clone()),
        Box::new(CHAIN_HEIGHT.clone()),
        Box::new(FRAMES_DROPPED.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        registry: REGISTRY.clone(),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

// =============================================================================
// RECORDING HELPERS
// =============================================================================

pub fn record_transaction_created(node: NodeId) {
    TRANSACTIONS_CREATED.with_label_values(&[&node.to_string()]).inc();
}

pub fn record_endorsement(node: NodeId, signed: bool) {
    let outcome = if signed { "signed" } else { "refused" };
    ENDORSEMENTS
        .with_label_values(&[&node.to_string(), outcome])
        .inc();
}

pub fn record_quorum_completed(node: NodeId, latency_ms: u64) {
    QUORUMS
        .with_label_values(&[&node.to_string(), "completed"])
        .inc();
    QUORUM_LATENCY.observe(latency_ms as f64);
}

pub fn record_quorum_abandoned(node: NodeId) {
    QUORUMS
        .with_label_values(&[&node.to_string(), "abandoned"])
        .inc();
}

pub fn record_commit(outcome: &str) {
    COMMITS.with_label_values(&[outcome]).inc();
}

pub fn record_block_committed() {
    BLOCKS_COMMITTED.inc();
}

pub fn set_chain_height(node: NodeId, height: u64) {
    CHAIN_HEIGHT
        .with_label_values(&[&node.to_string()])
        .set(i64::try_from(height).unwrap_or(i64::MAX));
}

pub fn record_frames_dropped(node: NodeId, count: u64) {
    if count > 0 {
        FRAMES_DROPPED
            .with_label_values(&[&node.to_string()])
            .inc_by(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_labelled_by_node() {
        record_transaction_created(901);
        record_transaction_created(901);
        assert!(TRANSACTIONS_CREATED.with_label_values(&["901"]).get() >= 2);

        record_endorsement(902, false);
        assert!(ENDORSEMENTS.with_label_values(&["902", "refused"]).get() >= 1);
    }

    #[test]
    fn test_quorum_latency_observed() {
        let before = QUORUM_LATENCY.get_sample_count();
        record_quorum_completed(903, 42);
        assert!(QUORUM_LATENCY.get_sample_count() > before);
    }

    #[test]
    fn test_gauge_set() {
        set_chain_height(904, 7);
        assert_eq!(CHAIN_HEIGHT.with_label_values(&["904"]).get(), 7);
    }

    #[test]
    fn test_register_and_encode() {
        // A second registration in the same process is refused.
        match register_metrics() {
            Ok(handle) => assert!(!handle.registry.gather().is_empty()),
            Err(TelemetryError::MetricsInit(reason)) => assert!(reason.contains("Duplicate"), "{reason}"),
            Err(other) => panic!("unexpected error: {other}"),
        }
        assert!(matches!(register_metrics(), Err(TelemetryError::MetricsInit(_))));
        record_commit("accepted");
        let text = encode_metrics().unwrap();
        assert!(text.contains("rl_aggregator_commits_total"));
    }
}
