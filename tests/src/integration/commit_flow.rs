//! End-to-end commit flow with three peers.

#[cfg(test)]
mod tests {
    use crate::harness::Cluster;
    use rl_03_endorsement::{EndorsementApi, QuorumRule};
    use rl_04_commit::CommitApi;
    use shared_bus::MessageHandler;
    use shared_types::AGGREGATOR_ID;

    async fn single_commit(rule: QuorumRule) -> Cluster {
        let mut cluster = Cluster::new(3, rule).unwrap();
        let tx = cluster.peer_mut(1).create_transaction().await.unwrap();
        assert_eq!(tx.tx_id, 1);
        cluster.deliver_all().await.unwrap();
        cluster
    }

    #[tokio::test]
    async fn test_three_peers_commit_under_all_peers() {
        let cluster = single_commit(QuorumRule::AllPeers).await;

        let ledger = cluster.aggregator.ledger();
        assert_eq!(ledger.blockchain_height(), 1);
        let block = ledger.current_top_block();
        assert_eq!((block.miner_id, block.parent_miner_id), (AGGREGATOR_ID, AGGREGATOR_ID));
        let tx = &block.transactions[0];
        assert_eq!((tx.peer_id, tx.tx_id), (1, 1));
        assert!(tx.validated);
        // Responses arrive in request order, so peer 3 completes the quorum.
        assert_eq!(tx.endorsed_by, Some(3));

        for peer in &cluster.peers {
            assert_eq!(peer.ledger().blockchain_height(), 1, "peer {}", peer.node_id());
            assert_eq!(peer.ledger().current_top_block(), block);
        }
        let stats = cluster.peer(1).stats();
        assert_eq!(stats.quorums_completed, 1);
        assert_eq!(stats.own_transactions_committed, 1);
        assert!(!cluster.peer(1).is_awaiting_quorum());
        assert_eq!(cluster.peer(2).stats().endorsements_signed, 1);
    }

    #[tokio::test]
    async fn test_three_peers_commit_under_all_peers_and_self() {
        let cluster = single_commit(QuorumRule::AllPeersAndSelf).await;

        assert_eq!(cluster.aggregator.ledger().blockchain_height(), 1);
        let block = cluster.aggregator.ledger().current_top_block();
        assert_eq!(block.transactions[0].endorsed_by, Some(3));

        let originator = cluster.peer(1).stats();
        assert_eq!(originator.endorsements_signed, 1);
        assert_eq!(originator.quorums_completed, 1);
    }

    #[tokio::test]
    async fn test_concurrent_transactions_build_one_chain() {
        let mut cluster = Cluster::new(3, QuorumRule::AllPeers).unwrap();
        for id in 1..=3 {
            cluster.peer_mut(id).create_transaction().await.unwrap();
        }
        cluster.deliver_all().await.unwrap();

        let ledger = cluster.aggregator.ledger();
        assert_eq!(ledger.blockchain_height(), 3);
        assert_eq!(ledger.blocks_in_forks(), 0);
        assert_eq!(cluster.aggregator.stats().blocks_produced, 3);

        for peer in &cluster.peers {
            let view = peer.ledger();
            assert_eq!(view.blockchain_height(), 3);
            assert_eq!(view.orphan_count(), 0);
            for height in 1..=3 {
                assert_eq!(view.blocks_at(height), ledger.blocks_at(height));
            }
            assert_eq!(peer.stats().own_transactions_committed, 1);
        }
    }

    #[tokio::test]
    async fn test_ticks_pace_successive_transactions() {
        let mut cluster = Cluster::new(3, QuorumRule::AllPeers).unwrap();

        cluster.peer_mut(1).on_tick().await.unwrap();
        cluster.deliver_all().await.unwrap();
        assert_eq!(cluster.aggregator.ledger().blockchain_height(), 1);

        // Not due yet.
        cluster.advance(100);
        cluster.peer_mut(1).on_tick().await.unwrap();
        assert!(cluster.network.is_empty());

        cluster.advance(150);
        cluster.peer_mut(1).on_tick().await.unwrap();
        cluster.deliver_all().await.unwrap();

        let ledger = cluster.aggregator.ledger();
        assert_eq!(ledger.blockchain_height(), 2);
        assert_eq!(ledger.current_top_block().transactions[0].tx_id, 2);
        assert_eq!(cluster.peer(1).stats().transactions_created, 2);
    }

    #[tokio::test]
    async fn test_out_of_window_payment_never_commits() {
        let mut cluster = Cluster::build(3, |config| {
            if config.node_id == 1 {
                config.with_auction(1, -1.0)
            } else {
                config
            }
        })
        .unwrap();

        cluster.peer_mut(1).create_transaction().await.unwrap();
        cluster.deliver_all().await.unwrap();

        assert_eq!(cluster.aggregator.ledger().blockchain_height(), 0);
        let stats = cluster.aggregator.stats();
        assert_eq!(stats.commits_received, 1);
        assert_eq!(stats.rejected_unsigned, 1);
        for peer in &cluster.peers {
            assert_eq!(peer.ledger().blockchain_height(), 0);
        }
        assert_eq!(cluster.peer(2).stats().endorsements_refused, 1);
        assert_eq!(cluster.peer(3).stats().endorsements_refused, 1);
        // The originator is free to try again.
        assert!(!cluster.peer(1).is_awaiting_quorum());
    }
}
