//! Deterministic cluster: N peers and the aggregator over one
//! [`LoopbackNetwork`] queue, driven a message at a time under a
//! [`ManualClock`].

use anyhow::{anyhow, bail, Result};
use rl_01_signatures::{SigningService, VerificationService};
use rl_03_endorsement::{PeerConfig, PeerDependencies, PeerService, QuorumRule};
use rl_04_commit::{AggregatorConfig, AggregatorDependencies, AggregatorService, BlockSizePolicy};
use shared_bus::{Envelope, LoopbackNetwork, LoopbackSink, ManualClock, MessageHandler};
use shared_types::{NodeId, AGGREGATOR_ID};
use std::sync::Arc;
use std::time::Duration;

pub type TestPeer = PeerService<LoopbackSink, ManualClock, SigningService>;
pub type TestAggregator = AggregatorService<LoopbackSink, ManualClock, VerificationService>;

/// Upper bound on deliveries in one [`Cluster::deliver_all`].
pub const MAX_DELIVERIES: usize = 10_000;

/// Cluster start time.
pub const START_MILLIS: u64 = 1_000;

pub struct Cluster {
    pub network: LoopbackNetwork,
    pub clock: Arc<ManualClock>,
    pub peers: Vec<TestPeer>,
    pub aggregator: TestAggregator,
}

impl Cluster {
    /// Peers `1..=num_peers`, each paying 100 to winner 1.
    pub fn new(num_peers: u32, rule: QuorumRule) -> Result<Self> {
        Self::build(num_peers, |config| config.with_quorum_rule(rule))
    }

    /// Like [`Cluster::new`], with `customize` applied to every peer config.
    pub fn build(num_peers: u32, customize: impl Fn(PeerConfig) -> PeerConfig) -> Result<Self> {
        let network = LoopbackNetwork::new();
        let clock = Arc::new(ManualClock::at(START_MILLIS));
        let ids: Vec<NodeId> = (1..=num_peers).collect();

        let peers = ids
            .iter()
            .map(|&id| {
                let config = PeerConfig::new(id, ids.iter().copied().filter(|&p| p != id).collect())
                    .with_auction(1, 100.0);
                let config = customize(config);
                config.validate()?;
                Ok(PeerService::new(PeerDependencies {
                    network: Arc::new(network.sink(id)),
                    clock: Arc::clone(&clock),
                    signer: SigningService::from_seed(u64::from(id) * 31)?,
                    config,
                }))
            })
            .collect::<Result<Vec<_>>>()?;

        let aggregator_config =
            AggregatorConfig::new(ids.clone()).with_block_size(BlockSizePolicy::Fixed { bytes: 500 });
        aggregator_config.validate()?;
        let aggregator = AggregatorService::with_seed(
            AggregatorDependencies {
                network: Arc::new(network.sink(AGGREGATOR_ID)),
                clock: Arc::clone(&clock),
                verifier: Arc::new(VerificationService::new()),
                config: aggregator_config,
            },
            7,
        );

        Ok(Self {
            network,
            clock,
            peers,
            aggregator,
        })
    }

    pub fn peer(&self, id: NodeId) -> &TestPeer {
        &self.peers[id as usize - 1]
    }

    pub fn peer_mut(&mut self, id: NodeId) -> &mut TestPeer {
        &mut self.peers[id as usize - 1]
    }

    pub fn advance(&self, millis: u64) {
        self.clock.advance(Duration::from_millis(millis));
    }

    /// Hand one envelope to its destination.
    pub async fn deliver(&mut self, envelope: Envelope) -> Result<()> {
        let Envelope { from, to, message } = envelope;
        if to == AGGREGATOR_ID {
            self.aggregator.handle_message(from, message).await?;
        } else {
            let index = usize::try_from(to)?
                .checked_sub(1)
                .filter(|&i| i < self.peers.len())
                .ok_or_else(|| anyhow!("no peer {to}"))?;
            self.peers[index].handle_message(from, message).await?;
        }
        Ok(())
    }

    /// Deliver until the queue is empty. Returns the number delivered.
    pub async fn deliver_all(&mut self) -> Result<usize> {
        self.deliver_where(|_| true).await
    }

    /// Deliver until the queue is empty, silently dropping envelopes that
    /// `keep` rejects.
    pub async fn deliver_where(&mut self, keep: impl Fn(&Envelope) -> bool) -> Result<usize> {
        let mut delivered = 0;
        while let Some(envelope) = self.network.pop() {
            if delivered >= MAX_DELIVERIES {
                bail!("cluster did not settle after {MAX_DELIVERIES} deliveries");
            }
            if keep(&envelope) {
                self.deliver(envelope).await?;
                delivered += 1;
            }
        }
        Ok(delivered)
    }
}
