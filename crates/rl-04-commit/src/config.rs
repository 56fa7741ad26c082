//! Configuration types for the aggregator

use crate::domain::BlockSizePolicy;
use crate::error::ConfigError;
use serde::Deserialize;
use shared_types::{NodeId, AGGREGATOR_ID};

/// Bytes every block spends on its header.
pub const DEFAULT_HEADER_SIZE_BYTES: u32 = 81;

/// Runtime configuration for the aggregator
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub node_id: NodeId,

    /// Peers that receive every committed block
    pub peers: Vec<NodeId>,

    /// Declared block size
    pub block_size: BlockSizePolicy,

    /// Lower bound on any declared block size, together with the
    /// transactions' own sizes
    pub header_size_bytes: u32,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            node_id: AGGREGATOR_ID,
            peers: Vec::new(),
            block_size: BlockSizePolicy::default(),
            header_size_bytes: DEFAULT_HEADER_SIZE_BYTES,
        }
    }
}

impl AggregatorConfig {
    pub fn new(peers: Vec<NodeId>) -> Self {
        Self {
            peers,
            ..Self::default()
        }
    }

    pub fn with_block_size(mut self, block_size: BlockSizePolicy) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.peers.contains(&self.node_id) {
            return Err(ConfigError::AggregatorInPeerSet(self.node_id));
        }
        self.block_size.validate()
    }
}
