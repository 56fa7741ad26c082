//! # Core Domain Entities
//!
//! Value types for the roadside ledger.
//!
//! ## Clusters
//!
//! - **Identity**: `NodeId`, `Timestamp`, `TransactionKey`
//! - **Endorsement**: `Endorsement`, `PublicKeyInfo`, `SignatureInfo`
//! - **Chain**: `TransactionRecord`, `Block`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Identifier of a node in the closed network.
pub type NodeId = u32;

/// Milliseconds since the start of the run.
pub type Timestamp = u64;

/// The aggregator always runs as node `0`.
pub const AGGREGATOR_ID: NodeId = 0;

/// Declared size of a single transaction when none is configured.
pub const DEFAULT_TRANSACTION_SIZE_BYTES: u32 = 100;

/// Unique identity of a transaction: the originating peer plus its
/// per-peer sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionKey {
    pub peer_id: NodeId,
    pub tx_id: u64,
}

impl fmt::Display for TransactionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.peer_id, self.tx_id)
    }
}

// =============================================================================
// CLUSTER B: ENDORSEMENT
// =============================================================================

/// Signature pair `(r, s)` as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub r: u64,
    pub s: u64,
}

/// Snapshot of a signer's public key as carried on the wire.
///
/// The curve coefficient `b` is not transmitted; verification only needs
/// the field prime, `a`, the generator, its order and the public point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyInfo {
    pub p: u64,
    pub a: u64,
    pub n: u64,
    #[serde(rename = "Gx")]
    pub gx: u64,
    #[serde(rename = "Gy")]
    pub gy: u64,
    #[serde(rename = "Qx")]
    pub qx: u64,
    #[serde(rename = "Qy")]
    pub qy: u64,
}

/// A peer's verdict on a transaction.
///
/// When `is_signed` is false the remaining fields are absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endorsement {
    pub is_signed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<PublicKeyInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureInfo>,
}

impl Endorsement {
    /// A refusal to endorse.
    pub fn unsigned() -> Self {
        Self {
            is_signed: false,
            digest: None,
            public_key: None,
            signature: None,
        }
    }

    /// A signed endorsement over `digest`.
    pub fn signed(digest: u64, public_key: PublicKeyInfo, signature: SignatureInfo) -> Self {
        Self {
            is_signed: true,
            digest: Some(digest),
            public_key: Some(public_key),
            signature: Some(signature),
        }
    }

    /// Returns the signed material, or `None` if the endorsement is unsigned
    /// or incomplete.
    pub fn signed_parts(&self) -> Option<(u64, PublicKeyInfo, SignatureInfo)> {
        if !self.is_signed {
            return None;
        }
        Some((self.digest?, self.public_key?, self.signature?))
    }
}

// =============================================================================
// CLUSTER C: THE CHAIN
// =============================================================================

/// One auction settlement claim.
///
/// Two records are equal when they share `(peer_id, tx_id)`; the remaining
/// fields describe the claim but not its identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Originating peer.
    pub peer_id: NodeId,
    /// Per-peer sequence number, unique for a given peer.
    pub tx_id: u64,
    /// Creation time in milliseconds since the run started.
    pub timestamp: Timestamp,
    /// Settled payment amount.
    pub payment: f64,
    /// Auction winner identifier.
    pub winner_id: u32,
    /// Set once the aggregator has accepted the record.
    pub validated: bool,
    /// Declared size used for block sizing.
    pub size_bytes: u32,
    /// Endorsement that carried the record to the aggregator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endorsement: Option<Endorsement>,
    /// Peer that produced `endorsement`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endorsed_by: Option<NodeId>,
}

impl TransactionRecord {
    pub fn new(
        peer_id: NodeId,
        tx_id: u64,
        timestamp: Timestamp,
        payment: f64,
        winner_id: u32,
    ) -> Self {
        Self {
            peer_id,
            tx_id,
            timestamp,
            payment,
            winner_id,
            validated: false,
            size_bytes: DEFAULT_TRANSACTION_SIZE_BYTES,
            endorsement: None,
            endorsed_by: None,
        }
    }

    pub fn key(&self) -> TransactionKey {
        TransactionKey {
            peer_id: self.peer_id,
            tx_id: self.tx_id,
        }
    }

    /// Attach the endorsement a peer produced for this record.
    pub fn with_endorsement(mut self, endorsed_by: NodeId, endorsement: Endorsement) -> Self {
        self.endorsed_by = Some(endorsed_by);
        self.endorsement = Some(endorsement);
        self
    }

    pub fn is_endorsed(&self) -> bool {
        self.endorsement.as_ref().is_some_and(|e| e.is_signed)
    }
}

impl PartialEq for TransactionRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TransactionRecord {}

impl Hash for TransactionRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tx {} (winner {}, payment {:.2}, t={}ms{})",
            self.key(),
            self.winner_id,
            self.payment,
            self.timestamp,
            if self.validated { ", validated" } else { "" }
        )
    }
}

/// A block in the aggregator's chain.
///
/// Blocks are identified by `(height, miner_id, parent_miner_id)`; parent
/// linkage is by `(height - 1, parent_miner_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    pub miner_id: NodeId,
    pub nonce: u32,
    pub parent_miner_id: NodeId,
    pub size_bytes: u32,
    pub time_created: Timestamp,
    pub time_received: Timestamp,
    /// Address of the node the block arrived from, if it arrived over the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_from: Option<String>,
    pub transactions: Vec<TransactionRecord>,
}

impl Block {
    /// The block every chain starts from.
    pub const GENESIS: Block = Block {
        height: 0,
        miner_id: AGGREGATOR_ID,
        nonce: 0,
        parent_miner_id: AGGREGATOR_ID,
        size_bytes: 0,
        time_created: 0,
        time_received: 0,
        received_from: None,
        transactions: Vec::new(),
    };

    pub fn new(
        height: u64,
        miner_id: NodeId,
        parent_miner_id: NodeId,
        time_created: Timestamp,
    ) -> Self {
        Self {
            height,
            miner_id,
            nonce: 0,
            parent_miner_id,
            size_bytes: 0,
            time_created,
            time_received: time_created,
            received_from: None,
            transactions: Vec::new(),
        }
    }

    pub fn genesis() -> Self {
        Self::GENESIS
    }

    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn with_size(mut self, size_bytes: u32) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    pub fn with_transactions(mut self, transactions: Vec<TransactionRecord>) -> Self {
        self.transactions = transactions;
        self
    }

    /// Record when and from where the block arrived.
    pub fn received(mut self, at: Timestamp, from: impl Into<String>) -> Self {
        self.time_received = at;
        self.received_from = Some(from.into());
        self
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    /// True if `self` is the parent of `child`.
    pub fn is_parent(&self, child: &Block) -> bool {
        child.height > 0 && self.height == child.height - 1 && self.miner_id == child.parent_miner_id
    }

    /// True if `self` is a child of `parent`.
    pub fn is_child(&self, parent: &Block) -> bool {
        parent.is_parent(self)
    }

    /// Sum of the declared transaction sizes.
    pub fn transaction_bytes(&self) -> u32 {
        self.transactions
            .iter()
            .fold(0u32, |acc, tx| acc.saturating_add(tx.size_bytes))
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.height == other.height
            && self.miner_id == other.miner_id
            && self.parent_miner_id == other.parent_miner_id
    }
}

impl Eq for Block {}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block h={} miner={} parent={} size={}B txs={} created={}ms received={}ms",
            self.height,
            self.miner_id,
            self.parent_miner_id,
            self.size_bytes,
            self.transactions.len(),
            self.time_created,
            self.time_received
        )?;
        if let Some(from) = &self.received_from {
            write!(f, " from={from}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_identity_ignores_payload() {
        let a = TransactionRecord::new(1, 7, 10, 50.0, 3);
        let mut b = TransactionRecord::new(1, 7, 99, 12.5, 9);
        b.validated = true;
        assert_eq!(a, b);

        let c = TransactionRecord::new(2, 7, 10, 50.0, 3);
        assert_ne!(a, c);

        let set: std::collections::HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_new_transaction_defaults() {
        let tx = TransactionRecord::new(4, 0, 0, 1.0, 1);
        assert!(!tx.validated);
        assert_eq!(tx.size_bytes, DEFAULT_TRANSACTION_SIZE_BYTES);
        assert!(!tx.is_endorsed());
    }

    #[test]
    fn test_block_equality_uses_linkage_fields() {
        let a = Block::new(3, 0, 0, 100).with_nonce(1);
        let b = Block::new(3, 0, 0, 999).with_nonce(2).with_size(500);
        assert_eq!(a, b);
        assert_ne!(a, Block::new(3, 1, 0, 100));
    }

    #[test]
    fn test_parent_child_symmetry() {
        let parent = Block::new(1, 5, 0, 0);
        let child = Block::new(2, 0, 5, 0);
        let stranger = Block::new(2, 0, 6, 0);

        assert!(parent.is_parent(&child));
        assert!(child.is_child(&parent));
        assert!(!parent.is_parent(&stranger));
        assert!(!child.is_parent(&parent));
    }

    #[test]
    fn test_genesis_has_no_parent() {
        let genesis = Block::genesis();
        assert!(genesis.is_genesis());
        assert!(!genesis.is_parent(&genesis));
        assert!(!Block::new(0, 0, 0, 0).is_child(&genesis));
    }

    #[test]
    fn test_unsigned_endorsement_has_no_parts() {
        assert_eq!(Endorsement::unsigned().signed_parts(), None);

        let key = PublicKeyInfo {
            p: 1009,
            a: 101,
            n: 13,
            gx: 1,
            gy: 2,
            qx: 3,
            qy: 4,
        };
        let sig = SignatureInfo { r: 5, s: 6 };
        let signed = Endorsement::signed(42, key, sig);
        assert_eq!(signed.signed_parts(), Some((42, key, sig)));

        let mut incomplete = signed;
        incomplete.signature = None;
        assert_eq!(incomplete.signed_parts(), None);
    }

    #[test]
    fn test_block_transaction_bytes() {
        let block = Block::new(1, 0, 0, 0).with_transactions(vec![
            TransactionRecord::new(1, 0, 0, 1.0, 1),
            TransactionRecord::new(2, 0, 0, 1.0, 1),
        ]);
        assert_eq!(block.transaction_bytes(), 2 * DEFAULT_TRANSACTION_SIZE_BYTES);
    }
}
