//! Commit requests altered between the originator and the aggregator.

#[cfg(test)]
mod tests {
    use crate::harness::Cluster;
    use rl_01_signatures::digest_message;
    use rl_03_endorsement::{EndorsementApi, QuorumRule};
    use rl_04_commit::{CommitApi, CommitOutcome, Rejection};
    use shared_types::{CommitRequest, EndorsementRequest, Endorsement, WireMessage, AGGREGATOR_ID};

    /// Run peer 1's transaction up to the point where its commit request is
    /// queued for the aggregator, and take it off the queue.
    async fn intercept_commit(cluster: &mut Cluster) -> CommitRequest {
        cluster.peer_mut(1).create_transaction().await.unwrap();
        while let Some(envelope) = cluster.network.pop() {
            if envelope.to == AGGREGATOR_ID {
                let WireMessage::CommitRequest(request) = envelope.message else {
                    panic!("expected commit request");
                };
                return request;
            }
            cluster.deliver(envelope).await.unwrap();
        }
        panic!("no commit request was sent");
    }

    fn digest_of(request: &CommitRequest) -> u64 {
        let p = request.endorsement.public_key.unwrap().p;
        let bytes = EndorsementRequest::new(request.transaction.clone())
            .canonical_bytes()
            .unwrap();
        digest_message(&bytes, p)
    }

    #[tokio::test]
    async fn test_untouched_request_commits() {
        let mut cluster = Cluster::new(3, QuorumRule::AllPeers).unwrap();
        let request = intercept_commit(&mut cluster).await;

        let outcome = cluster.aggregator.commit(request).await.unwrap();
        assert!(matches!(outcome, CommitOutcome::Committed(_)));
    }

    #[tokio::test]
    async fn test_changed_payment_rejected() {
        let mut cluster = Cluster::new(3, QuorumRule::AllPeers).unwrap();
        let original = intercept_commit(&mut cluster).await;
        let carried = original.endorsement.digest.unwrap();

        // Any payment whose digest differs from the carried one; the toy
        // digest is reduced mod a small prime, so a few candidates collide.
        let tampered = (1..)
            .map(|extra| {
                let mut request = original.clone();
                request.transaction.payment += f64::from(extra);
                request
            })
            .find(|request| digest_of(request) != carried)
            .unwrap();

        let outcome = cluster.aggregator.commit(tampered).await.unwrap();
        assert!(matches!(
            outcome,
            CommitOutcome::Rejected(Rejection::DigestMismatch { .. })
        ));
        assert_eq!(cluster.aggregator.ledger().blockchain_height(), 0);
        assert!(cluster.network.is_empty());
    }

    #[tokio::test]
    async fn test_stripped_signature_rejected() {
        let mut cluster = Cluster::new(3, QuorumRule::AllPeers).unwrap();
        let mut request = intercept_commit(&mut cluster).await;
        request.endorsement = Endorsement::unsigned();

        let outcome = cluster.aggregator.commit(request).await.unwrap();
        assert_eq!(outcome, CommitOutcome::Rejected(Rejection::Unsigned));
    }

    #[tokio::test]
    async fn test_forged_signature_rejected() {
        let mut cluster = Cluster::new(3, QuorumRule::AllPeers).unwrap();
        let mut request = intercept_commit(&mut cluster).await;
        if let Some(signature) = request.endorsement.signature.as_mut() {
            signature.r = 0;
        }

        let outcome = cluster.aggregator.commit(request).await.unwrap();
        assert!(matches!(outcome, CommitOutcome::Rejected(Rejection::BadSignature(_))));
        assert_eq!(cluster.aggregator.stats().rejected_bad_signature, 1);
    }

    #[tokio::test]
    async fn test_resubmitted_request_commits_once() {
        let mut cluster = Cluster::new(3, QuorumRule::AllPeers).unwrap();
        let request = intercept_commit(&mut cluster).await;

        cluster.aggregator.commit(request.clone()).await.unwrap();
        let outcome = cluster.aggregator.commit(request).await.unwrap();

        assert!(matches!(outcome, CommitOutcome::Rejected(Rejection::Duplicate(_))));
        assert_eq!(cluster.aggregator.ledger().blockchain_height(), 1);
        cluster.deliver_all().await.unwrap();
        assert_eq!(cluster.peer(1).stats().own_transactions_committed, 1);
    }
}
