//! # Domain Entities
//!
//! Request and result types around signing and verification.

use super::ecdsa::{Signature, VerifyingKey};
use super::errors::SignatureError;
use super::keys::PublicKey;

/// A digest together with the signature over it and the key that made it.
///
/// `digest` is always reduced modulo `public_key.curve.p`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedDigest {
    pub digest: u64,
    pub signature: Signature,
    pub public_key: PublicKey,
}

/// One `(key, signature, digest)` triple to check.
#[derive(Clone, Debug)]
pub struct VerificationRequest {
    pub key: VerifyingKey,
    pub signature: Signature,
    pub digest: u64,
}

/// Result of signature verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    /// Whether the signature is valid
    pub valid: bool,
    /// Error details (if verification failed)
    pub error: Option<SignatureError>,
}

impl VerificationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: SignatureError) -> Self {
        Self {
            valid: false,
            error: Some(error),
        }
    }

    /// Convert into a `Result`, for callers that propagate with `?`.
    pub fn into_result(self) -> Result<(), SignatureError> {
        match (self.valid, self.error) {
            (true, _) => Ok(()),
            (false, Some(err)) => Err(err),
            (false, None) => Err(SignatureError::VerificationFailed),
        }
    }
}

/// Result of batch verification.
#[derive(Clone, Debug)]
pub struct BatchVerificationResult {
    /// Individual results, in request order
    pub results: Vec<VerificationResult>,
    pub all_valid: bool,
    pub valid_count: usize,
    pub invalid_count: usize,
}

impl BatchVerificationResult {
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let valid_count = results.iter().filter(|r| r.valid).count();
        let invalid_count = results.len() - valid_count;

        Self {
            all_valid: invalid_count == 0,
            results,
            valid_count,
            invalid_count,
        }
    }
}
