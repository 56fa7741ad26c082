//! Quorum gating across the cluster.

#[cfg(test)]
mod tests {
    use crate::harness::Cluster;
    use rl_03_endorsement::{EndorsementApi, EndorsementError, QuorumRule};
    use rl_04_commit::CommitApi;
    use shared_bus::MessageHandler;
    use shared_bus::Envelope;
    use shared_types::{WireMessage, AGGREGATOR_ID};
    use std::time::Duration;

    fn is_response_from(envelope: &Envelope, responder: u32) -> bool {
        envelope.from == responder && matches!(envelope.message, WireMessage::EndorsementResponse(_))
    }

    #[tokio::test]
    async fn test_missing_response_blocks_commit() {
        let mut cluster = Cluster::new(4, QuorumRule::AllPeers).unwrap();
        cluster.peer_mut(1).create_transaction().await.unwrap();

        cluster.deliver_where(|e| !is_response_from(e, 4)).await.unwrap();

        assert_eq!(cluster.aggregator.stats().commits_received, 0);
        assert_eq!(cluster.aggregator.ledger().blockchain_height(), 0);
        assert!(cluster.peer(1).is_awaiting_quorum());

        let err = cluster.peer_mut(1).create_transaction().await.unwrap_err();
        assert!(matches!(err, EndorsementError::QuorumPending { tx_id: 1 }));
    }

    #[tokio::test]
    async fn test_replayed_response_after_commit_is_stale() {
        let mut cluster = Cluster::new(4, QuorumRule::AllPeers).unwrap();
        cluster.peer_mut(1).create_transaction().await.unwrap();

        let mut replay = None;
        while let Some(envelope) = cluster.network.pop() {
            if replay.is_none() && is_response_from(&envelope, 2) {
                replay = Some(envelope.clone());
            }
            cluster.deliver(envelope).await.unwrap();
        }
        assert_eq!(cluster.aggregator.ledger().blockchain_height(), 1);

        cluster.deliver(replay.unwrap()).await.unwrap();
        assert!(cluster.network.is_empty());
        assert_eq!(cluster.peer(1).stats().stale_responses, 1);
        assert_eq!(cluster.peer(1).stats().quorums_completed, 1);
        assert_eq!(cluster.aggregator.stats().commits_received, 1);
    }

    /// Copy of `envelope` claiming to come from `responder`.
    fn respond_as(envelope: &Envelope, responder: u32) -> Envelope {
        let mut forged = envelope.clone();
        forged.from = responder;
        if let WireMessage::EndorsementResponse(response) = &mut forged.message {
            response.responder_id = responder;
        }
        forged
    }

    #[tokio::test]
    async fn test_outside_responders_cannot_complete_quorum() {
        let mut cluster = Cluster::new(3, QuorumRule::AllPeers).unwrap();
        cluster.peer_mut(1).create_transaction().await.unwrap();

        let mut from_two = None;
        let mut held = Vec::new();
        while let Some(envelope) = cluster.network.pop() {
            if is_response_from(&envelope, 3) {
                held.push(envelope);
                continue;
            }
            if is_response_from(&envelope, 2) {
                from_two = Some(envelope.clone());
            }
            cluster.deliver(envelope).await.unwrap();
        }
        let from_two = from_two.unwrap();

        for outsider in [99, AGGREGATOR_ID, 1] {
            cluster.deliver(respond_as(&from_two, outsider)).await.unwrap();
        }
        assert!(cluster.network.is_empty());
        assert!(cluster.peer(1).is_awaiting_quorum());
        assert_eq!(cluster.peer(1).stats().stale_responses, 3);
        assert_eq!(cluster.aggregator.stats().commits_received, 0);

        for envelope in held {
            cluster.deliver(envelope).await.unwrap();
        }
        cluster.deliver_all().await.unwrap();
        assert_eq!(cluster.peer(1).stats().quorums_completed, 1);
        assert_eq!(cluster.aggregator.ledger().blockchain_height(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_responder_counts_once() {
        let mut cluster = Cluster::new(3, QuorumRule::AllPeers).unwrap();
        cluster.peer_mut(1).create_transaction().await.unwrap();

        // Deliver both requests, then replay peer 2's response before peer
        // 3's arrives.
        let mut responses = Vec::new();
        while let Some(envelope) = cluster.network.pop() {
            if matches!(envelope.message, WireMessage::EndorsementResponse(_)) {
                responses.push(envelope);
            } else {
                cluster.deliver(envelope).await.unwrap();
            }
        }
        assert_eq!(responses.len(), 2);
        let from_two = responses.iter().find(|e| e.from == 2).cloned().unwrap();
        let from_three = responses.iter().find(|e| e.from == 3).cloned().unwrap();

        cluster.deliver(from_two.clone()).await.unwrap();
        cluster.deliver(from_two).await.unwrap();
        assert!(cluster.network.is_empty());
        assert_eq!(cluster.peer(1).stats().duplicate_responses, 1);

        cluster.deliver(from_three).await.unwrap();
        cluster.deliver_all().await.unwrap();
        assert_eq!(cluster.aggregator.ledger().blockchain_height(), 1);
    }

    #[tokio::test]
    async fn test_timeout_abandons_and_frees_the_peer() {
        let mut cluster = Cluster::build(3, |config| {
            config.with_quorum_timeout(Some(Duration::from_millis(500)))
        })
        .unwrap();
        cluster.peer_mut(1).create_transaction().await.unwrap();

        let mut late = Vec::new();
        while let Some(envelope) = cluster.network.pop() {
            if is_response_from(&envelope, 3) {
                late.push(envelope);
            } else {
                cluster.deliver(envelope).await.unwrap();
            }
        }
        assert!(cluster.peer(1).is_awaiting_quorum());

        cluster.advance(499);
        assert!(!cluster.peer_mut(1).poll_timeout());
        cluster.advance(1);
        assert!(cluster.peer_mut(1).poll_timeout());
        assert_eq!(cluster.peer(1).stats().quorums_abandoned, 1);

        for envelope in late {
            cluster.deliver(envelope).await.unwrap();
        }
        assert_eq!(cluster.peer(1).stats().stale_responses, 1);
        assert_eq!(cluster.aggregator.stats().commits_received, 0);

        cluster.peer_mut(1).on_tick().await.unwrap();
        cluster.deliver_all().await.unwrap();
        let ledger = cluster.aggregator.ledger();
        assert_eq!(ledger.blockchain_height(), 1);
        assert_eq!(ledger.current_top_block().transactions[0].tx_id, 2);
    }
}
