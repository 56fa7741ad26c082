//! Why a commit request did not make it into a block.

use rl_01_signatures::SignatureError;
use shared_types::TransactionKey;
use std::fmt;

/// A commit request the aggregator refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Already in a block.
    Duplicate(TransactionKey),
    /// Carries no signature.
    Unsigned,
    /// Carried digest is not the digest of the carried transaction.
    DigestMismatch { carried: u64, computed: u64 },
    /// Signature does not verify under the carried key.
    BadSignature(SignatureError),
}

impl Rejection {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Rejection::Duplicate(_) => "duplicate",
            Rejection::Unsigned => "unsigned",
            Rejection::DigestMismatch { .. } => "digest_mismatch",
            Rejection::BadSignature(_) => "bad_signature",
        }
    }
}

impl From<SignatureError> for Rejection {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::Unsigned => Rejection::Unsigned,
            SignatureError::DigestMismatch { carried, computed } => {
                Rejection::DigestMismatch { carried, computed }
            }
            other => Rejection::BadSignature(other),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Duplicate(key) => write!(f, "transaction {key} already committed"),
            Rejection::Unsigned => f.write_str("endorsement is unsigned"),
            Rejection::DigestMismatch { carried, computed } => {
                write!(f, "carried digest {carried} does not match {computed}")
            }
            Rejection::BadSignature(err) => write!(f, "signature rejected: {err}"),
        }
    }
}
