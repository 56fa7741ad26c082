//! Peer Service - endorsement protocol logic
//!
//! One `PeerService` per roadside node. It owns the node's signing identity,
//! its quorum state, its ledger view and its counters; the runtime feeds it
//! messages one at a time through [`MessageHandler`].

use crate::config::{PeerConfig, QuorumRule};
use crate::domain::{
    EndorsementError, EndorsementResult, PeerStats, PendingQuorum, QuorumProgress, QuorumState,
};
use crate::ports::{Clock, EndorsementApi, NetworkSink, SigningApi};
use async_trait::async_trait;
use rl_01_signatures::endorsement_from;
use rl_02_ledger_store::{Blockchain, IngestOutcome};
use rl_telemetry::metrics;
use shared_bus::MessageHandler;
use shared_types::{
    BlockBroadcast, CommitRequest, Endorsement, EndorsementRequest, EndorsementResponse, NodeId,
    Timestamp, TransactionKey, TransactionPayload, TransactionRecord, WireMessage,
};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Dependencies for [`PeerService`].
pub struct PeerDependencies<N, C, S> {
    pub network: Arc<N>,
    pub clock: Arc<C>,
    pub signer: S,
    pub config: PeerConfig,
}

/// Endorsement protocol for one peer.
pub struct PeerService<N, C, S>
where
    N: NetworkSink,
    C: Clock,
    S: SigningApi,
{
    network: Arc<N>,
    clock: Arc<C>,
    signer: S,
    config: PeerConfig,
    state: QuorumState,
    next_tx_id: u64,
    last_created_at: Option<Timestamp>,
    ledger: Blockchain,
    stats: PeerStats,
}

impl<N, C, S> PeerService<N, C, S>
where
    N: NetworkSink,
    C: Clock,
    S: SigningApi,
{
    pub fn new(deps: PeerDependencies<N, C, S>) -> Self {
        info!(
            node_id = deps.config.node_id,
            peers = deps.config.peers.len(),
            threshold = deps.config.threshold(),
            "Peer started"
        );
        Self {
            network: deps.network,
            clock: deps.clock,
            signer: deps.signer,
            config: deps.config,
            state: QuorumState::Idle,
            next_tx_id: 1,
            last_created_at: None,
            ledger: Blockchain::new(),
            stats: PeerStats::default(),
        }
    }

    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    pub fn state(&self) -> &QuorumState {
        &self.state
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    // === ENDORSING ===

    /// Check a request against the validation window and sign it if it
    /// passes.
    fn endorse(&mut self, request: &EndorsementRequest) -> Endorsement {
        let node_id = self.config.node_id;
        let tx = &request.transaction;

        if let Err(reason) = self.config.window.check(tx) {
            debug!(node_id, peer = tx.peer_id, tx_id = tx.tx_id, ?reason, payment = tx.payment, "Endorsement refused");
            self.stats.endorsements_refused += 1;
            metrics::record_endorsement(node_id, false);
            return Endorsement::unsigned();
        }

        let signed = request
            .canonical_bytes()
            .map_err(EndorsementError::from)
            .and_then(|bytes| {
                self.signer
                    .sign_message(&bytes)
                    .map_err(EndorsementError::from)
            });

        match signed {
            Ok(signed) => {
                trace!(node_id, peer = tx.peer_id, tx_id = tx.tx_id, digest = signed.digest, "Endorsement signed");
                self.stats.endorsements_signed += 1;
                metrics::record_endorsement(node_id, true);
                endorsement_from(&signed)
            }
            Err(err) => {
                error!(node_id, peer = tx.peer_id, tx_id = tx.tx_id, error = %err, "Signing failed, refusing endorsement");
                self.stats.signing_failures += 1;
                self.stats.endorsements_refused += 1;
                metrics::record_endorsement(node_id, false);
                Endorsement::unsigned()
            }
        }
    }

    // === QUORUM ===

    async fn record_response(
        &mut self,
        key: TransactionKey,
        responder: NodeId,
        endorsement: Endorsement,
    ) -> EndorsementResult<()> {
        let node_id = self.config.node_id;
        let progress = match &mut self.state {
            QuorumState::AwaitingQuorum(pending) if pending.key() == key => {
                pending.record(responder, endorsement)
            }
            _ => {
                debug!(node_id, responder, tx_id = key.tx_id, "Stale endorsement response ignored");
                self.stats.stale_responses += 1;
                return Ok(());
            }
        };

        match progress {
            QuorumProgress::Unexpected => {
                warn!(node_id, responder, tx_id = key.tx_id, "Response from outside the quorum ignored");
                self.stats.stale_responses += 1;
                Ok(())
            }
            QuorumProgress::Duplicate => {
                debug!(node_id, responder, tx_id = key.tx_id, "Duplicate endorsement response");
                self.stats.duplicate_responses += 1;
                Ok(())
            }
            QuorumProgress::Counted { count, threshold } => {
                trace!(node_id, responder, tx_id = key.tx_id, count, threshold, "Endorsement counted");
                Ok(())
            }
            QuorumProgress::Complete => self.forward_commit().await,
        }
    }

    /// Forward the in-flight transaction to the aggregator and go idle.
    async fn forward_commit(&mut self) -> EndorsementResult<()> {
        let Some(pending) = self.state.take() else {
            return Ok(());
        };
        let node_id = self.config.node_id;
        let Some((responder, endorsement)) = pending.commit_endorsement() else {
            return Ok(());
        };

        let now = self.clock.now_millis();
        let latency = now.saturating_sub(pending.transaction().timestamp);
        self.stats.quorums_completed += 1;
        self.stats.latency_ms.record(latency as f64);
        metrics::record_quorum_completed(node_id, latency);

        info!(
            node_id,
            tx_id = pending.key().tx_id,
            responder,
            signed = endorsement.is_signed,
            latency_ms = latency,
            "Quorum reached, forwarding to aggregator"
        );

        let commit = CommitRequest::new(
            TransactionPayload::from(pending.transaction()),
            responder,
            node_id,
            endorsement,
        );
        self.network
            .send(self.config.aggregator_id, WireMessage::CommitRequest(commit))
            .await?;
        Ok(())
    }

    /// Abandon the in-flight quorum if it is older than the configured
    /// timeout.
    fn abandon_if_stalled(&mut self, now: Timestamp) -> bool {
        let Some(timeout) = self.config.quorum_timeout_ms else {
            return false;
        };
        let stalled = self
            .state
            .pending()
            .is_some_and(|pending| pending.age(now) >= timeout);
        if !stalled {
            return false;
        }

        if let Some(pending) = self.state.take() {
            warn!(
                node_id = self.config.node_id,
                tx_id = pending.key().tx_id,
                responses = pending.responders().len(),
                threshold = pending.threshold(),
                "Quorum timed out, abandoning transaction"
            );
        }
        self.stats.quorums_abandoned += 1;
        metrics::record_quorum_abandoned(self.config.node_id);
        true
    }

    // === MESSAGE HANDLERS ===

    async fn handle_endorsement_request(
        &mut self,
        from: NodeId,
        request: EndorsementRequest,
    ) -> EndorsementResult<()> {
        let endorsement = self.endorse(&request);
        let response = EndorsementResponse::new(request.transaction, self.config.node_id, endorsement);
        self.network
            .send(from, WireMessage::EndorsementResponse(response))
            .await?;
        Ok(())
    }

    async fn handle_endorsement_response(
        &mut self,
        from: NodeId,
        response: EndorsementResponse,
    ) -> EndorsementResult<()> {
        if from != response.responder_id {
            debug!(node_id = self.config.node_id, from, responder = response.responder_id, "Response relayed by another node");
        }
        self.record_response(response.transaction.key(), response.responder_id, response.endorsement)
            .await
    }

    /// Ingest a block into the local ledger view.
    fn handle_block_broadcast(&mut self, from: NodeId, broadcast: BlockBroadcast) -> EndorsementResult<()> {
        let node_id = self.config.node_id;
        let block = broadcast.to_block(self.clock.now_millis(), from);
        let height = block.height;
        let own = block
            .transactions
            .iter()
            .filter(|tx| tx.peer_id == node_id)
            .count() as u64;

        self.stats.blocks_received += 1;
        match self.ledger.ingest(block)? {
            IngestOutcome::Appended { adopted } => {
                self.stats.own_transactions_committed += own;
                debug!(node_id, height, adopted, own, "Block appended to local ledger");
            }
            IngestOutcome::Orphaned => {
                self.stats.own_transactions_committed += own;
                self.stats.orphan_blocks += 1;
                debug!(node_id, height, "Block parked as orphan");
            }
            IngestOutcome::Duplicate => {
                trace!(node_id, height, "Duplicate block ignored");
            }
        }
        metrics::set_chain_height(node_id, self.ledger.blockchain_height());
        Ok(())
    }
}

#[async_trait]
impl<N, C, S> EndorsementApi for PeerService<N, C, S>
where
    N: NetworkSink,
    C: Clock,
    S: SigningApi,
{
    async fn create_transaction(&mut self) -> EndorsementResult<TransactionRecord> {
        if let Some(pending) = self.state.pending() {
            return Err(EndorsementError::QuorumPending {
                tx_id: pending.key().tx_id,
            });
        }

        let node_id = self.config.node_id;
        let now = self.clock.now_millis();
        let record = TransactionRecord::new(
            node_id,
            self.next_tx_id,
            now,
            self.config.payment,
            self.config.winner_id,
        );
        self.next_tx_id += 1;
        self.last_created_at = Some(now);
        self.stats.transactions_created += 1;
        metrics::record_transaction_created(node_id);

        self.state = QuorumState::AwaitingQuorum(PendingQuorum::new(
            record.clone(),
            self.config.expected_responders(),
            now,
        ));
        info!(node_id, tx_id = record.tx_id, payment = record.payment, winner = record.winner_id, "Transaction created");

        let request = EndorsementRequest::new(TransactionPayload::from(&record));
        let message = WireMessage::EndorsementRequest(request.clone());
        for (peer, err) in self.network.broadcast(&self.config.peers, &message).await {
            warn!(node_id, peer, error = %err, "Endorsement request not delivered");
        }

        if self.config.quorum_rule == QuorumRule::AllPeersAndSelf {
            let endorsement = self.endorse(&request);
            self.record_response(record.key(), node_id, endorsement).await?;
        }

        Ok(record)
    }

    fn poll_timeout(&mut self) -> bool {
        let now = self.clock.now_millis();
        self.abandon_if_stalled(now)
    }

    fn is_awaiting_quorum(&self) -> bool {
        !self.state.is_idle()
    }

    fn stats(&self) -> PeerStats {
        self.stats.clone()
    }

    fn ledger(&self) -> &Blockchain {
        &self.ledger
    }
}

#[async_trait]
impl<N, C, S> MessageHandler for PeerService<N, C, S>
where
    N: NetworkSink,
    C: Clock,
    S: SigningApi,
{
    type Error = EndorsementError;

    fn node_id(&self) -> NodeId {
        self.config.node_id
    }

    async fn handle_message(&mut self, from: NodeId, message: WireMessage) -> EndorsementResult<()> {
        match message {
            WireMessage::EndorsementRequest(request) => {
                self.handle_endorsement_request(from, request).await
            }
            WireMessage::EndorsementResponse(response) => {
                self.handle_endorsement_response(from, response).await
            }
            WireMessage::BlockBroadcast(broadcast) => self.handle_block_broadcast(from, broadcast),
            other => Err(EndorsementError::UnexpectedMessage {
                kind: other.name(),
                from,
            }),
        }
    }

    /// Time out a stalled quorum, then create the next transaction once the
    /// interval has passed and no quorum is pending.
    async fn on_tick(&mut self) -> EndorsementResult<()> {
        let now = self.clock.now_millis();
        self.abandon_if_stalled(now);

        let due = self
            .last_created_at
            .map_or(true, |last| now.saturating_sub(last) >= self.config.transaction_interval_ms);
        if !due {
            return Ok(());
        }
        if !self.state.is_idle() {
            self.stats.creations_skipped += 1;
            return Ok(());
        }
        self.create_transaction().await.map(|_| ())
    }
}
