//! Aggregator service.
//!
//! Verifies each forwarded endorsement against the transaction it claims to
//! cover, then commits the transaction in a block of its own:
//!
//! 1. Reject transactions already committed.
//! 2. Reject unsigned endorsements.
//! 3. Recompute the digest of the canonical endorsement request and compare
//!    it with the carried digest.
//! 4. Verify the signature under the carried public key.
//! 5. Build the block on top of the current chain head, append, broadcast.

use crate::config::AggregatorConfig;
use crate::domain::{AggregatorStats, Rejection};
use crate::error::{CommitError, CommitResult};
use crate::ports::{Clock, CommitApi, CommitOutcome, NetworkSink, SignatureVerificationApi};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rl_01_signatures::verify_endorsed_message;
use rl_02_ledger_store::Blockchain;
use rl_telemetry::metrics;
use shared_bus::MessageHandler;
use shared_types::{
    Block, BlockBroadcast, CommitRequest, EndorsementRequest, NodeId, TransactionKey, WireMessage,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dependencies for [`AggregatorService`].
pub struct AggregatorDependencies<N, C, V> {
    pub network: Arc<N>,
    pub clock: Arc<C>,
    pub verifier: Arc<V>,
    pub config: AggregatorConfig,
}

/// The single aggregator ("cloud server").
pub struct AggregatorService<N, C, V, R = StdRng>
where
    N: NetworkSink,
    C: Clock,
    V: SignatureVerificationApi,
{
    network: Arc<N>,
    clock: Arc<C>,
    verifier: Arc<V>,
    config: AggregatorConfig,
    rng: R,
    ledger: Blockchain,
    committed: HashSet<TransactionKey>,
    stats: AggregatorStats,
}

impl<N, C, V> AggregatorService<N, C, V, StdRng>
where
    N: NetworkSink,
    C: Clock,
    V: SignatureVerificationApi,
{
    pub fn new(deps: AggregatorDependencies<N, C, V>) -> Self {
        Self::with_rng(deps, StdRng::from_entropy())
    }

    /// Reproducible nonces and block sizes.
    pub fn with_seed(deps: AggregatorDependencies<N, C, V>, seed: u64) -> Self {
        Self::with_rng(deps, StdRng::seed_from_u64(seed))
    }
}

impl<N, C, V, R> AggregatorService<N, C, V, R>
where
    N: NetworkSink,
    C: Clock,
    V: SignatureVerificationApi,
    R: Rng + Send,
{
    pub fn with_rng(deps: AggregatorDependencies<N, C, V>, rng: R) -> Self {
        info!(
            node_id = deps.config.node_id,
            peers = deps.config.peers.len(),
            block_size = %deps.config.block_size,
            "Aggregator started"
        );
        Self {
            network: deps.network,
            clock: deps.clock,
            verifier: deps.verifier,
            config: deps.config,
            rng,
            ledger: Blockchain::new(),
            committed: HashSet::new(),
            stats: AggregatorStats::default(),
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn is_committed(&self, key: &TransactionKey) -> bool {
        self.committed.contains(key)
    }

    /// Steps 1 to 4: everything short of building the block.
    fn check(&self, request: &CommitRequest) -> CommitResult<Result<(), Rejection>> {
        let key = request.transaction.key();
        if self.committed.contains(&key) {
            return Ok(Err(Rejection::Duplicate(key)));
        }
        if !request.endorsement.is_signed {
            return Ok(Err(Rejection::Unsigned));
        }

        let message = EndorsementRequest::new(request.transaction.clone()).canonical_bytes()?;
        let verdict = verify_endorsed_message(self.verifier.as_ref(), &request.endorsement, &message);
        Ok(verdict.into_result().map_err(Rejection::from))
    }

    /// Step 5.
    fn build_block(&mut self, request: &CommitRequest) -> Block {
        let mut record = request
            .transaction
            .to_record()
            .with_endorsement(request.responder_id, request.endorsement.clone());
        record.validated = true;

        let floor = self
            .config
            .header_size_bytes
            .saturating_add(record.size_bytes);
        let size = self.config.block_size.sample(&mut self.rng, floor);

        let top = self.ledger.current_top_block();
        Block::new(top.height + 1, self.config.node_id, top.miner_id, self.clock.now_millis())
            .with_nonce(self.rng.gen())
            .with_size(size)
            .with_transactions(vec![record])
    }
}

#[async_trait]
impl<N, C, V, R> CommitApi for AggregatorService<N, C, V, R>
where
    N: NetworkSink,
    C: Clock,
    V: SignatureVerificationApi,
    R: Rng + Send,
{
    async fn commit(&mut self, request: CommitRequest) -> CommitResult<CommitOutcome> {
        self.stats.commits_received += 1;
        let key = request.transaction.key();

        if let Err(rejection) = self.check(&request)? {
            warn!(
                node_id = self.config.node_id,
                tx = %key,
                responder = request.responder_id,
                reason = %rejection,
                "Commit request rejected"
            );
            self.stats.record_rejection(&rejection);
            metrics::record_commit(rejection.label());
            return Ok(CommitOutcome::Rejected(rejection));
        }

        let block = self.build_block(&request);
        self.ledger.add_block(block.clone())?;
        self.committed.insert(key);

        self.stats.blocks_produced += 1;
        self.stats.transactions_committed += block.transactions.len() as u64;
        self.stats.bytes_committed += u64::from(block.size_bytes);
        metrics::record_commit("accepted");
        metrics::record_block_committed();
        metrics::set_chain_height(self.config.node_id, self.ledger.blockchain_height());

        info!(
            height = block.height,
            tx = %key,
            responder = request.responder_id,
            size_bytes = block.size_bytes,
            "Block committed"
        );

        let broadcast = WireMessage::BlockBroadcast(BlockBroadcast::from_block(&block));
        for (peer, err) in self.network.broadcast(&self.config.peers, &broadcast).await {
            warn!(peer, height = block.height, error = %err, "Block broadcast not delivered");
        }
        Ok(CommitOutcome::Committed(block))
    }

    fn stats(&self) -> AggregatorStats {
        self.stats.clone()
    }

    fn ledger(&self) -> &Blockchain {
        &self.ledger
    }
}

#[async_trait]
impl<N, C, V, R> MessageHandler for AggregatorService<N, C, V, R>
where
    N: NetworkSink,
    C: Clock,
    V: SignatureVerificationApi,
    R: Rng + Send,
{
    type Error = CommitError;

    fn node_id(&self) -> NodeId {
        self.config.node_id
    }

    async fn handle_message(&mut self, from: NodeId, message: WireMessage) -> CommitResult<()> {
        match message {
            WireMessage::CommitRequest(request) => {
                if request.request_from != from {
                    debug!(from, request_from = request.request_from, "Commit relayed by another node");
                }
                self.commit(request).await.map(|_| ())
            }
            other => Err(CommitError::UnexpectedMessage {
                kind: other.name(),
                from,
            }),
        }
    }
}
