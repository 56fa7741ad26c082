//! # Wire Message Payloads
//!
//! The four messages exchanged between nodes.
//!
//! ```text
//! originator ──endorsement_request──▶ peer
//! originator ◀─endorsement_response── peer
//! originator ──commit_request───────▶ aggregator
//! peers      ◀─block_broadcast─────── aggregator
//! ```
//!
//! Every message is a JSON object whose `"message"` field names the kind.
//! Payload objects carry a `"type"` of `"transaction"` or `"block"`.
//! Field names are camelCase on the wire.

use crate::entities::*;
use crate::errors::WireError;
use serde::{Deserialize, Serialize};

/// Payload `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    Transaction,
    Block,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Transaction => "transaction",
            PayloadKind::Block => "block",
        }
    }
}

// =============================================================================
// TRANSACTION PAYLOADS
// =============================================================================

/// Wire view of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub peer_id: NodeId,
    pub tx_id: u64,
    pub timestamp: Timestamp,
    pub payment: f64,
    pub winner_id: u32,
}

impl TransactionPayload {
    pub fn key(&self) -> TransactionKey {
        TransactionKey {
            peer_id: self.peer_id,
            tx_id: self.tx_id,
        }
    }

    pub fn to_record(&self) -> TransactionRecord {
        TransactionRecord::new(
            self.peer_id,
            self.tx_id,
            self.timestamp,
            self.payment,
            self.winner_id,
        )
    }
}

impl From<&TransactionRecord> for TransactionPayload {
    fn from(tx: &TransactionRecord) -> Self {
        Self {
            peer_id: tx.peer_id,
            tx_id: tx.tx_id,
            timestamp: tx.timestamp,
            payment: tx.payment,
            winner_id: tx.winner_id,
        }
    }
}

/// Originator asks a peer to endorse a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndorsementRequest {
    #[serde(rename = "type")]
    pub kind: PayloadKind,
    pub transaction: TransactionPayload,
}

impl EndorsementRequest {
    pub fn new(transaction: TransactionPayload) -> Self {
        Self {
            kind: PayloadKind::Transaction,
            transaction,
        }
    }

    /// The bytes an endorser hashes before signing.
    ///
    /// Both endorsers and the aggregator derive the digest from this exact
    /// encoding, so it must stay stable.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, WireError> {
        WireMessage::EndorsementRequest(self.clone()).encode()
    }
}

/// A peer's reply to an [`EndorsementRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndorsementResponse {
    #[serde(rename = "type")]
    pub kind: PayloadKind,
    pub transaction: TransactionPayload,
    pub responder_id: NodeId,
    #[serde(flatten)]
    pub endorsement: Endorsement,
}

impl EndorsementResponse {
    pub fn new(transaction: TransactionPayload, responder_id: NodeId, endorsement: Endorsement) -> Self {
        Self {
            kind: PayloadKind::Transaction,
            transaction,
            responder_id,
            endorsement,
        }
    }
}

/// Originator forwards an endorsed transaction to the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    #[serde(rename = "type")]
    pub kind: PayloadKind,
    pub transaction: TransactionPayload,
    /// Peer whose endorsement is attached.
    pub responder_id: NodeId,
    /// Originating peer.
    pub request_from: NodeId,
    #[serde(flatten)]
    pub endorsement: Endorsement,
}

impl CommitRequest {
    pub fn new(
        transaction: TransactionPayload,
        responder_id: NodeId,
        request_from: NodeId,
        endorsement: Endorsement,
    ) -> Self {
        Self {
            kind: PayloadKind::Transaction,
            transaction,
            responder_id,
            request_from,
            endorsement,
        }
    }
}

// =============================================================================
// BLOCK PAYLOADS
// =============================================================================

/// A committed transaction inside a [`BlockBroadcast`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedTransaction {
    #[serde(flatten)]
    pub transaction: TransactionPayload,
    pub validated: bool,
}

/// Aggregator announces a newly committed block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockBroadcast {
    #[serde(rename = "type")]
    pub kind: PayloadKind,
    pub block_height: u64,
    pub miner_id: NodeId,
    pub parent_miner_id: NodeId,
    pub size_bytes: u32,
    pub timestamp: Timestamp,
    pub transactions: Vec<CommittedTransaction>,
}

impl BlockBroadcast {
    pub fn from_block(block: &Block) -> Self {
        Self {
            kind: PayloadKind::Block,
            block_height: block.height,
            miner_id: block.miner_id,
            parent_miner_id: block.parent_miner_id,
            size_bytes: block.size_bytes,
            timestamp: block.time_created,
            transactions: block
                .transactions
                .iter()
                .map(|tx| CommittedTransaction {
                    transaction: TransactionPayload::from(tx),
                    validated: tx.validated,
                })
                .collect(),
        }
    }

    /// Rebuild the block as seen by a receiver.
    pub fn to_block(&self, received_at: Timestamp, received_from: NodeId) -> Block {
        let transactions = self
            .transactions
            .iter()
            .map(|committed| {
                let mut record = committed.transaction.to_record();
                record.validated = committed.validated;
                record
            })
            .collect();

        Block::new(self.block_height, self.miner_id, self.parent_miner_id, self.timestamp)
            .with_size(self.size_bytes)
            .with_transactions(transactions)
            .received(received_at, format!("node-{received_from}"))
    }
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// Every message that travels between nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message", rename_all = "snake_case")]
pub enum WireMessage {
    EndorsementRequest(EndorsementRequest),
    EndorsementResponse(EndorsementResponse),
    CommitRequest(CommitRequest),
    BlockBroadcast(BlockBroadcast),
}

impl WireMessage {
    /// The `"message"` tag of this variant.
    pub fn name(&self) -> &'static str {
        match self {
            WireMessage::EndorsementRequest(_) => "endorsement_request",
            WireMessage::EndorsementResponse(_) => "endorsement_response",
            WireMessage::CommitRequest(_) => "commit_request",
            WireMessage::BlockBroadcast(_) => "block_broadcast",
        }
    }

    fn payload_kind(&self) -> PayloadKind {
        match self {
            WireMessage::EndorsementRequest(m) => m.kind,
            WireMessage::EndorsementResponse(m) => m.kind,
            WireMessage::CommitRequest(m) => m.kind,
            WireMessage::BlockBroadcast(m) => m.kind,
        }
    }

    fn expected_kind(&self) -> PayloadKind {
        match self {
            WireMessage::BlockBroadcast(_) => PayloadKind::Block,
            _ => PayloadKind::Transaction,
        }
    }

    /// Structural checks that serde cannot express.
    pub fn validate(&self) -> Result<(), WireError> {
        let found = self.payload_kind();
        let expected = self.expected_kind();
        if found != expected {
            return Err(WireError::PayloadKindMismatch {
                message: self.name(),
                expected: expected.as_str(),
                found: found.as_str(),
            });
        }

        let payments: Vec<f64> = match self {
            WireMessage::EndorsementRequest(m) => vec![m.transaction.payment],
            WireMessage::EndorsementResponse(m) => vec![m.transaction.payment],
            WireMessage::CommitRequest(m) => vec![m.transaction.payment],
            WireMessage::BlockBroadcast(m) => {
                m.transactions.iter().map(|t| t.transaction.payment).collect()
            }
        };
        if let Some(bad) = payments.into_iter().find(|p| !p.is_finite()) {
            return Err(WireError::InvalidField {
                field: "payment",
                reason: format!("{bad} is not a finite number"),
            });
        }
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let message: WireMessage = serde_json::from_slice(bytes)?;
        message.validate()?;
        Ok(message)
    }
}
