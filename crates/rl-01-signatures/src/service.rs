//! # Signature Services
//!
//! Application services implementing the inbound ports.
//!
//! - [`SigningService`] owns a node's key pair and its randomness source.
//! - [`VerificationService`] is stateless and delegates to the domain layer.

use crate::domain::ecdsa::{self, Signature, VerifyingKey};
use crate::domain::entities::{
    BatchVerificationResult, SignedDigest, VerificationRequest, VerificationResult,
};
use crate::domain::errors::{KeyGenerationError, SignatureError};
use crate::domain::keys::{generate_key, KeyPair, PublicKey};
use crate::ports::inbound::{SignatureVerificationApi, SigningApi};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

/// Times a node may replace its key pair while signing one message.
pub const MAX_KEY_REGENERATIONS: u32 = 3;

/// Signing identity of one node.
pub struct SigningService<R = StdRng> {
    key_pair: KeyPair,
    rng: R,
    regenerations: u32,
    max_regenerations: u32,
}

impl SigningService<StdRng> {
    /// Generate a key pair from OS entropy.
    pub fn generate() -> Result<Self, KeyGenerationError> {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic identity for tests and reproducible runs.
    pub fn from_seed(seed: u64) -> Result<Self, KeyGenerationError> {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> SigningService<R> {
    pub fn with_rng(mut rng: R) -> Result<Self, KeyGenerationError> {
        let key_pair = generate_key(&mut rng)?;
        Ok(Self::from_key_pair(key_pair, rng))
    }

    pub fn from_key_pair(key_pair: KeyPair, rng: R) -> Self {
        Self {
            key_pair,
            rng,
            regenerations: 0,
            max_regenerations: MAX_KEY_REGENERATIONS,
        }
    }

    /// Override [`MAX_KEY_REGENERATIONS`].
    pub fn with_max_regenerations(mut self, max_regenerations: u32) -> Self {
        self.max_regenerations = max_regenerations;
        self
    }

    /// Replace the key pair with a freshly generated one.
    pub fn regenerate(&mut self) -> Result<(), KeyGenerationError> {
        self.key_pair = generate_key(&mut self.rng)?;
        self.regenerations += 1;
        let key = self.key_pair.public();
        info!(p = key.curve.p, n = key.n, total = self.regenerations, "Key pair regenerated");
        Ok(())
    }

    /// Key pairs replaced over the lifetime of this service.
    pub fn regenerations(&self) -> u32 {
        self.regenerations
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey::from(self.key_pair.public())
    }
}

impl<R: Rng + Send> SigningApi for SigningService<R> {
    fn public_key(&self) -> &PublicKey {
        self.key_pair.public()
    }

    fn digest(&self, message: &[u8]) -> u64 {
        ecdsa::digest_message(message, self.key_pair.public().curve.p)
    }

    fn sign_digest(&mut self, digest: u64) -> Result<Signature, SignatureError> {
        ecdsa::sign(&self.key_pair, digest, &mut self.rng)
    }

    fn sign_message(&mut self, message: &[u8]) -> Result<SignedDigest, SignatureError> {
        let mut regenerated = 0u32;
        loop {
            let digest = self.digest(message);
            match ecdsa::sign(&self.key_pair, digest, &mut self.rng) {
                Ok(signature) => {
                    return Ok(SignedDigest {
                        digest,
                        signature,
                        public_key: *self.key_pair.public(),
                    })
                }
                Err(SignatureError::SigningExhausted { attempts }) => {
                    if regenerated >= self.max_regenerations {
                        return Err(SignatureError::KeyRegenerationExhausted {
                            regenerations: regenerated,
                        });
                    }
                    warn!(attempts, n = self.key_pair.public().n, "Every nonce failed, regenerating key pair");
                    self.regenerate()?;
                    regenerated += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Stateless verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerificationService;

impl VerificationService {
    pub fn new() -> Self {
        Self
    }
}

impl SignatureVerificationApi for VerificationService {
    fn verify(&self, key: &VerifyingKey, signature: &Signature, digest: u64) -> VerificationResult {
        ecdsa::verify_detailed(key, signature, digest)
    }

    fn verify_message(
        &self,
        key: &VerifyingKey,
        signature: &Signature,
        message: &[u8],
        carried_digest: u64,
    ) -> VerificationResult {
        let computed = ecdsa::digest_message(message, key.p);
        if computed != carried_digest {
            return VerificationResult::invalid(SignatureError::DigestMismatch {
                carried: carried_digest,
                computed,
            });
        }
        ecdsa::verify_detailed(key, signature, carried_digest)
    }

    fn batch_verify(&self, requests: &[VerificationRequest]) -> BatchVerificationResult {
        ecdsa::batch_verify(requests)
    }
}
