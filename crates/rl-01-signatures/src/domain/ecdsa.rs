//! # ECDSA over Toy Curves
//!
//! Signing and verification with the keys from [`super::keys`].
//!
//! ## Notes
//!
//! - **Digest truncation**: only the first 32 bits of SHA-256 are kept and
//!   then reduced modulo `p`. This models the scheme, it does not secure it.
//! - **Scalar range**: `r` and `s` must lie in `[1, n)`.
//! - **Nonce retries**: a nonce producing `r == 0` or `s == 0` is discarded;
//!   at most [`MAX_SIGNING_ATTEMPTS`] nonces are drawn.

use super::curve::{CurveArithmetic, Point};
use super::entities::{BatchVerificationResult, VerificationRequest, VerificationResult};
use super::errors::SignatureError;
use super::keys::{KeyPair, PublicKey};
use super::modular::{add_mod, modular_inverse, mul_mod};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::trace;

/// Nonces drawn before signing gives up.
pub const MAX_SIGNING_ATTEMPTS: usize = 64;

/// Bytes of the SHA-256 output kept for the digest (8 hex characters).
pub const DIGEST_PREFIX_BYTES: usize = 4;

/// Signature pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub r: u64,
    pub s: u64,
}

/// What a verifier needs from a public key. The coefficient `b` is not
/// part of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKey {
    pub p: u64,
    pub a: u64,
    pub n: u64,
    pub g: Point,
    pub q: Point,
}

impl VerifyingKey {
    /// Reject parameters the arithmetic cannot work with.
    pub fn validate(&self) -> Result<(), SignatureError> {
        if self.p < 3 {
            return Err(SignatureError::InvalidPublicKey(format!("modulus {} is below 3", self.p)));
        }
        if self.n < 2 {
            return Err(SignatureError::InvalidPublicKey(format!("order {} is below 2", self.n)));
        }
        let in_field = |pt: Point| pt.x < self.p && pt.y < self.p;
        if !in_field(self.g) || !in_field(self.q) {
            return Err(SignatureError::InvalidPublicKey(
                "point coordinates exceed the field".to_string(),
            ));
        }
        if self.g.is_identity() {
            return Err(SignatureError::InvalidPublicKey("generator is the identity".to_string()));
        }
        Ok(())
    }

    fn arithmetic(&self) -> CurveArithmetic {
        CurveArithmetic::new(self.p, self.a)
    }
}

impl From<&PublicKey> for VerifyingKey {
    fn from(key: &PublicKey) -> Self {
        Self {
            p: key.curve.p,
            a: key.curve.a,
            n: key.n,
            g: key.g,
            q: key.q,
        }
    }
}

// =============================================================================
// DIGEST
// =============================================================================

/// SHA-256 of `message`, first 32 bits as a big-endian integer, reduced
/// modulo `p`. Returns 0 for `p == 0`.
pub fn digest_message(message: &[u8], p: u64) -> u64 {
    let hash = Sha256::digest(message);
    let prefix = hash
        .iter()
        .take(DIGEST_PREFIX_BYTES)
        .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));
    prefix.checked_rem(p).unwrap_or(0)
}

// =============================================================================
// SIGNING
// =============================================================================

/// Sign `digest` with `key_pair`.
///
/// `s = k^-1 (z + d r) mod n` with `r = (kG).x mod n` and a fresh random `k`.
pub fn sign<R: Rng + ?Sized>(
    key_pair: &KeyPair,
    digest: u64,
    rng: &mut R,
) -> Result<Signature, SignatureError> {
    let PublicKey { curve, g, n, .. } = *key_pair.public();
    if n < 2 {
        return Err(SignatureError::InvalidPublicKey(format!("order {n} is below 2")));
    }
    let arithmetic = curve.arithmetic();
    let d = key_pair.private().scalar();
    let z = digest % n;

    for attempt in 1..=MAX_SIGNING_ATTEMPTS {
        let k = rng.gen_range(1..n);
        let r = arithmetic.double_and_add(k, g, n)?.x % n;
        if r == 0 {
            trace!(attempt, "Nonce gave r = 0, drawing another");
            continue;
        }
        let k_inv = modular_inverse(i128::from(k), n)?;
        let s = mul_mod(k_inv, add_mod(z, mul_mod(d, r, n), n), n);
        if s == 0 {
            trace!(attempt, "Nonce gave s = 0, drawing another");
            continue;
        }
        return Ok(Signature { r, s });
    }

    Err(SignatureError::SigningExhausted {
        attempts: MAX_SIGNING_ATTEMPTS,
    })
}

// =============================================================================
// VERIFICATION
// =============================================================================

/// `true` iff `signature` is valid for `digest` under `key`.
pub fn verify(key: &VerifyingKey, signature: &Signature, digest: u64) -> bool {
    verify_detailed(key, signature, digest).valid
}

/// Verify and report why a signature was rejected.
///
/// 1. key parameters are usable;
/// 2. `r` and `s` lie in `[1, n)`;
/// 3. `A = (z w) G + (r w) Q` with `w = s^-1 mod n`;
/// 4. valid iff `A.x mod n == r`.
pub fn verify_detailed(key: &VerifyingKey, signature: &Signature, digest: u64) -> VerificationResult {
    if let Err(err) = key.validate() {
        return VerificationResult::invalid(err);
    }
    let n = key.n;
    let Signature { r, s } = *signature;
    if r == 0 || r >= n || s == 0 || s >= n {
        return VerificationResult::invalid(SignatureError::InvalidFormat);
    }

    match recover_x(key, r, s, digest) {
        Ok(x) if x % n == r => VerificationResult::valid(),
        Ok(_) => VerificationResult::invalid(SignatureError::VerificationFailed),
        Err(err) => VerificationResult::invalid(err),
    }
}

fn recover_x(key: &VerifyingKey, r: u64, s: u64, digest: u64) -> Result<u64, SignatureError> {
    let n = key.n;
    let arithmetic = key.arithmetic();
    let w = modular_inverse(i128::from(s), n)?;
    let u1 = mul_mod(digest % n, w, n);
    let u2 = mul_mod(r, w, n);

    let a1 = arithmetic.double_and_add(u1, key.g, n)?;
    let a2 = arithmetic.double_and_add(u2, key.q, n)?;
    Ok(arithmetic.add(a1, a2)?.x)
}

/// Verify many signatures in parallel. Results keep request order.
pub fn batch_verify(requests: &[VerificationRequest]) -> BatchVerificationResult {
    let results: Vec<VerificationResult> = requests
        .par_iter()
        .map(|req| verify_detailed(&req.key, &req.signature, req.digest))
        .collect();
    BatchVerificationResult::from_results(results)
}
