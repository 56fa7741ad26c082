//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of this subsystem.

use crate::domain::ecdsa::{Signature, VerifyingKey};
use crate::domain::entities::{
    BatchVerificationResult, SignedDigest, VerificationRequest, VerificationResult,
};
use crate::domain::errors::SignatureError;
use crate::domain::keys::PublicKey;

/// A node's signing identity.
///
/// Signing takes `&mut self`: it consumes randomness and may replace the
/// key pair.
pub trait SigningApi: Send {
    /// Current public key.
    fn public_key(&self) -> &PublicKey;

    /// Digest of `message` under the current key's modulus.
    fn digest(&self, message: &[u8]) -> u64;

    /// Sign a digest with the current key. No key regeneration.
    fn sign_digest(&mut self, digest: u64) -> Result<Signature, SignatureError>;

    /// Digest and sign `message`.
    ///
    /// If every nonce fails the key pair is regenerated and the message is
    /// digested again under the new key, a bounded number of times. The
    /// returned digest and key always belong together.
    fn sign_message(&mut self, message: &[u8]) -> Result<SignedDigest, SignatureError>;
}

/// Stateless verification API.
pub trait SignatureVerificationApi: Send + Sync {
    /// Verify a signature over a digest.
    fn verify(&self, key: &VerifyingKey, signature: &Signature, digest: u64) -> VerificationResult;

    /// Verify a signature and check that `carried_digest` really is the
    /// digest of `message` under the key's modulus.
    fn verify_message(
        &self,
        key: &VerifyingKey,
        signature: &Signature,
        message: &[u8],
        carried_digest: u64,
    ) -> VerificationResult;

    /// Verify many signatures in parallel.
    fn batch_verify(&self, requests: &[VerificationRequest]) -> BatchVerificationResult;
}
