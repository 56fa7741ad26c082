//! # Simulation Configuration
//!
//! Command-line arguments and the validated configuration built from them.
//!
//! ## Topology
//!
//! Peers are ids `1..=N`, the aggregator is id 0. Peers form a full mesh and
//! every peer links to the aggregator.

use crate::auction::{Auction, AuctionError};
use clap::{Parser, ValueEnum};
use rl_03_endorsement::{PeerConfig, QuorumRule, DEFAULT_TRANSACTION_INTERVAL_MS};
use rl_04_commit::{AggregatorConfig, BlockSizePolicy};
use shared_types::NodeId;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default simulated run time.
pub const DEFAULT_DURATION_MS: u64 = 10_000;

/// Peers when no winners file says otherwise.
pub const DEFAULT_NUM_PEERS: usize = 3;

/// Roadside ledger cluster simulation
#[derive(Parser, Debug, Clone)]
#[command(name = "node-runtime")]
#[command(about = "Run a roadside ledger cluster: N endorsing peers and one aggregator")]
pub struct Args {
    /// Peer ids, one per line; line order assigns winner ids
    #[arg(long, requires = "payments")]
    pub winners: Option<PathBuf>,

    /// Payments, one per line, indexed by winner id
    #[arg(long, requires = "winners")]
    pub payments: Option<PathBuf>,

    /// Number of peers (defaults to the winners file length, or 3)
    #[arg(short = 'n', long)]
    pub num_peers: Option<usize>,

    /// How long to run, in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_DURATION_MS)]
    pub duration_ms: u64,

    /// Pause between transactions of one peer, in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_TRANSACTION_INTERVAL_MS)]
    pub interval_ms: u64,

    /// Abandon a quorum after this many milliseconds (never by default)
    #[arg(long)]
    pub quorum_timeout_ms: Option<u64>,

    /// Which responses count towards a quorum
    #[arg(long, value_enum, default_value_t = QuorumArg::AllPeers)]
    pub quorum_rule: QuorumArg,

    /// Block size policy: fixed:<bytes>, gaussian or gaussian:<mean>:<std_dev>
    #[arg(long, default_value = "gaussian")]
    pub block_size: BlockSizePolicy,

    /// Seed for key generation, nonces and block sizes
    #[arg(long)]
    pub seed: Option<u64>,

    /// Split frames into chunks of this many bytes on the wire
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Log filter, overrides RL_LOG_LEVEL
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    pub json_logs: bool,

    /// Print Prometheus metrics after the summary
    #[arg(long)]
    pub print_metrics: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QuorumArg {
    /// Every other peer responds
    AllPeers,
    /// Every other peer responds and the originator endorses itself
    AllPeersAndSelf,
}

impl From<QuorumArg> for QuorumRule {
    fn from(arg: QuorumArg) -> Self {
        match arg {
            QuorumArg::AllPeers => QuorumRule::AllPeers,
            QuorumArg::AllPeersAndSelf => QuorumRule::AllPeersAndSelf,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("A cluster needs at least one peer")]
    NoPeers,

    #[error("{0} peers do not fit in a node id")]
    TooManyPeers(usize),

    #[error("Duration must be positive")]
    ZeroDuration,

    #[error("Chunk size must be positive")]
    ZeroChunkSize,

    #[error(transparent)]
    Auction(#[from] AuctionError),

    #[error("Peer {node}: {source}")]
    Peer {
        node: NodeId,
        #[source]
        source: rl_03_endorsement::ConfigError,
    },

    #[error("Aggregator: {0}")]
    Aggregator(#[from] rl_04_commit::ConfigError),
}

/// Everything a [`Simulation`](crate::Simulation) needs.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub num_peers: usize,
    pub duration: Duration,
    pub transaction_interval: Duration,
    pub quorum_timeout: Option<Duration>,
    pub quorum_rule: QuorumRule,
    pub block_size: BlockSizePolicy,
    pub seed: Option<u64>,
    pub chunk_size: Option<usize>,
    pub auction: Auction,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_peers: DEFAULT_NUM_PEERS,
            duration: Duration::from_millis(DEFAULT_DURATION_MS),
            transaction_interval: Duration::from_millis(DEFAULT_TRANSACTION_INTERVAL_MS),
            quorum_timeout: None,
            quorum_rule: QuorumRule::default(),
            block_size: BlockSizePolicy::default(),
            seed: None,
            chunk_size: None,
            auction: Auction::default(),
        }
    }
}

impl SimulationConfig {
    pub fn new(num_peers: usize) -> Self {
        Self {
            num_peers,
            ..Self::default()
        }
    }

    /// Build and validate from command-line arguments, loading the auction
    /// files if given.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let auction = match (&args.winners, &args.payments) {
            (Some(winners), Some(payments)) => Auction::load(winners, payments)?,
            _ => Auction::default(),
        };
        let num_peers = match args.num_peers {
            Some(n) => n,
            None if !auction.is_empty() => auction.peer_count(),
            None => DEFAULT_NUM_PEERS,
        };

        let config = Self {
            num_peers,
            duration: Duration::from_millis(args.duration_ms),
            transaction_interval: Duration::from_millis(args.interval_ms),
            quorum_timeout: args.quorum_timeout_ms.map(Duration::from_millis),
            quorum_rule: args.quorum_rule.into(),
            block_size: args.block_size,
            seed: args.seed,
            chunk_size: args.chunk_size,
            auction,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_auction(mut self, auction: Auction) -> Self {
        self.auction = auction;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Peer ids `1..=num_peers`.
    pub fn peer_ids(&self) -> Result<Vec<NodeId>, ConfigError> {
        let last = NodeId::try_from(self.num_peers).map_err(|_| ConfigError::TooManyPeers(self.num_peers))?;
        Ok((1..=last).collect())
    }

    /// Configuration of peer `node`: every other peer as its peer set.
    pub fn peer_config(&self, node: NodeId, peer_ids: &[NodeId]) -> PeerConfig {
        let (winner_id, payment) = self.auction.assignment(node);
        let peers = peer_ids.iter().copied().filter(|&id| id != node).collect();
        PeerConfig::new(node, peers)
            .with_auction(winner_id, payment)
            .with_quorum_rule(self.quorum_rule)
            .with_quorum_timeout(self.quorum_timeout)
            .with_transaction_interval(self.transaction_interval)
    }

    pub fn aggregator_config(&self, peer_ids: &[NodeId]) -> AggregatorConfig {
        AggregatorConfig::new(peer_ids.to_vec()).with_block_size(self.block_size)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_peers == 0 {
            return Err(ConfigError::NoPeers);
        }
        if self.duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }
        if self.chunk_size == Some(0) {
            return Err(ConfigError::ZeroChunkSize);
        }
        let peer_ids = self.peer_ids()?;
        for &node in &peer_ids {
            self.peer_config(node, &peer_ids)
                .validate()
                .map_err(|source| ConfigError::Peer { node, source })?;
        }
        self.aggregator_config(&peer_ids).validate()?;
        Ok(())
    }
}
