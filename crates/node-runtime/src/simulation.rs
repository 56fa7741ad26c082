//! # Cluster Simulation
//!
//! One tokio task per node over an [`InMemoryNetwork`]. Each task owns its
//! protocol state and drains its own inbox, so handling is sequential per
//! node and nothing is shared between nodes but the network routes.
//!
//! ```text
//! ┌──────────┐  frames   ┌────────────┐  messages  ┌────────────────┐
//! │ Network  │ ────────→ │ FrameBuffer│ ─────────→ │ MessageHandler │
//! └──────────┘           └────────────┘            └────────────────┘
//!                                        ticks ──→   on_tick()
//! ```
//!
//! After the configured duration a watch channel stops every task; each
//! sends a [`NodeReport`] on its way out.

use crate::config::{ConfigError, SimulationConfig};
use crate::report::{NodeReport, Reportable, SimulationReport};
use rl_01_signatures::{KeyGenerationError, SigningService, VerificationService};
use rl_03_endorsement::{PeerDependencies, PeerService};
use rl_04_commit::{AggregatorDependencies, AggregatorService};
use rl_telemetry::metrics;
use shared_bus::{Datagram, FrameBuffer, InMemoryNetwork, MessageHandler, MonotonicClock};
use shared_types::{NodeId, AGGREGATOR_ID};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Peers are ticked this many times per transaction interval, so creation
/// and quorum timeouts are never late by more than a tenth of an interval.
pub const TICKS_PER_INTERVAL: u32 = 10;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Key generation failed: {0}")]
    KeyGeneration(#[from] KeyGenerationError),

    #[error("Node task failed: {0}")]
    NodeTask(#[from] JoinError),
}

pub struct Simulation {
    config: SimulationConfig,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run the cluster for the configured duration and collect reports.
    pub async fn run(self) -> Result<SimulationReport, SimulationError> {
        let config = self.config;
        config.validate()?;
        let peer_ids = config.peer_ids()?;

        let mut network = InMemoryNetwork::new();
        if let Some(chunk_size) = config.chunk_size {
            network = network.with_chunk_size(chunk_size);
        }
        let clock = Arc::new(MonotonicClock::starting_now());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (report_tx, mut report_rx) = mpsc::unbounded_channel();

        // Every inbox exists before any node sends.
        let aggregator_inbox = network.register(AGGREGATOR_ID);
        let peer_inboxes: Vec<_> = peer_ids.iter().map(|&id| (id, network.register(id))).collect();

        let mut tasks = Vec::with_capacity(peer_ids.len() + 1);

        let deps = AggregatorDependencies {
            network: Arc::new(network.handle(AGGREGATOR_ID)),
            clock: Arc::clone(&clock),
            verifier: Arc::new(VerificationService::new()),
            config: config.aggregator_config(&peer_ids),
        };
        let aggregator = match config.seed {
            Some(seed) => AggregatorService::with_seed(deps, seed),
            None => AggregatorService::new(deps),
        };
        tasks.push(tokio::spawn(run_node(
            aggregator,
            aggregator_inbox,
            None,
            shutdown_rx.clone(),
            report_tx.clone(),
        )));

        let tick = tick_period(config.transaction_interval);
        for (id, inbox) in peer_inboxes {
            let signer = match config.seed {
                Some(seed) => SigningService::from_seed(seed.wrapping_add(u64::from(id)))?,
                None => SigningService::generate()?,
            };
            let peer = PeerService::new(PeerDependencies {
                network: Arc::new(network.handle(id)),
                clock: Arc::clone(&clock),
                signer,
                config: config.peer_config(id, &peer_ids),
            });
            tasks.push(tokio::spawn(run_node(
                peer,
                inbox,
                Some(tick),
                shutdown_rx.clone(),
                report_tx.clone(),
            )));
        }
        drop(report_tx);

        info!(
            peers = peer_ids.len(),
            duration_ms = config.duration.as_millis() as u64,
            quorum_rule = ?config.quorum_rule,
            block_size = %config.block_size,
            "Simulation started"
        );
        tokio::time::sleep(config.duration).await;

        info!(frames = network.frames_sent(), "Duration elapsed, stopping nodes");
        if shutdown_tx.send(true).is_err() {
            debug!("Every node task already stopped");
        }
        for task in tasks {
            task.await?;
        }

        let mut reports = Vec::with_capacity(peer_ids.len() + 1);
        while let Some(report) = report_rx.recv().await {
            reports.push(report);
        }
        Ok(SimulationReport::new(config.duration, reports))
    }
}

fn tick_period(interval: Duration) -> Duration {
    (interval / TICKS_PER_INTERVAL).max(Duration::from_millis(1))
}

/// Drive one node until shutdown, then report.
async fn run_node<H>(
    mut handler: H,
    mut inbox: mpsc::UnboundedReceiver<Datagram>,
    tick: Option<Duration>,
    mut shutdown: watch::Receiver<bool>,
    reports: mpsc::UnboundedSender<NodeReport>,
) where
    H: MessageHandler + Reportable,
{
    let node_id = handler.node_id();
    let mut frames = FrameBuffer::<NodeId>::new();
    let ticking = tick.is_some();
    let mut ticker = tokio::time::interval(tick.unwrap_or(Duration::from_secs(3600)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    debug!(node_id, ticking, "Node task started");

    loop {
        tokio::select! {
            biased;

            _ = shutdown.changed() => break,

            datagram = inbox.recv() => {
                let Some(datagram) = datagram else {
                    debug!(node_id, "Inbox closed");
                    break;
                };
                for message in frames.push(datagram.from, &datagram.bytes) {
                    let kind = message.name();
                    if let Err(err) = handler.handle_message(datagram.from, message).await {
                        warn!(node_id, from = datagram.from, kind, error = %err, "Message handling failed");
                    }
                }
            }

            _ = ticker.tick(), if ticking => {
                if let Err(err) = handler.on_tick().await {
                    warn!(node_id, error = %err, "Tick failed");
                }
            }
        }
    }

    let dropped = frames.dropped_frames();
    metrics::record_frames_dropped(node_id, dropped);
    let report = handler.report().with_frames_dropped(dropped);
    debug!(node_id, height = report.chain_height, "Node task stopped");
    if reports.send(report).is_err() {
        warn!(node_id, "Report channel closed before node report was sent");
    }
}
