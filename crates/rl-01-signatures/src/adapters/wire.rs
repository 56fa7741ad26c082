//! # Wire Adapter
//!
//! Maps keys and signatures to and from the endorsement fields carried on
//! the wire, and verifies endorsements as received.

use crate::domain::curve::Point;
use crate::domain::ecdsa::{Signature, VerifyingKey};
use crate::domain::entities::{SignedDigest, VerificationResult};
use crate::domain::errors::SignatureError;
use crate::domain::keys::PublicKey;
use crate::ports::inbound::SignatureVerificationApi;
use shared_types::{Endorsement, PublicKeyInfo, SignatureInfo};

impl From<&PublicKey> for PublicKeyInfo {
    fn from(key: &PublicKey) -> Self {
        PublicKeyInfo {
            p: key.curve.p,
            a: key.curve.a,
            n: key.n,
            gx: key.g.x,
            gy: key.g.y,
            qx: key.q.x,
            qy: key.q.y,
        }
    }
}

impl From<PublicKeyInfo> for VerifyingKey {
    fn from(info: PublicKeyInfo) -> Self {
        VerifyingKey {
            p: info.p,
            a: info.a,
            n: info.n,
            g: Point::new(info.gx, info.gy),
            q: Point::new(info.qx, info.qy),
        }
    }
}

impl From<Signature> for SignatureInfo {
    fn from(sig: Signature) -> Self {
        SignatureInfo { r: sig.r, s: sig.s }
    }
}

impl From<SignatureInfo> for Signature {
    fn from(info: SignatureInfo) -> Self {
        Signature { r: info.r, s: info.s }
    }
}

/// Signed endorsement carrying `signed`.
pub fn endorsement_from(signed: &SignedDigest) -> Endorsement {
    Endorsement::signed(
        signed.digest,
        PublicKeyInfo::from(&signed.public_key),
        SignatureInfo::from(signed.signature),
    )
}

/// Verify an endorsement's signature over its carried digest.
pub fn verify_endorsement<V: SignatureVerificationApi + ?Sized>(
    verifier: &V,
    endorsement: &Endorsement,
) -> VerificationResult {
    match endorsement.signed_parts() {
        Some((digest, key, signature)) => {
            verifier.verify(&VerifyingKey::from(key), &Signature::from(signature), digest)
        }
        None => VerificationResult::invalid(SignatureError::Unsigned),
    }
}

/// Verify an endorsement and check its digest against `message`.
pub fn verify_endorsed_message<V: SignatureVerificationApi + ?Sized>(
    verifier: &V,
    endorsement: &Endorsement,
    message: &[u8],
) -> VerificationResult {
    match endorsement.signed_parts() {
        Some((digest, key, signature)) => verifier.verify_message(
            &VerifyingKey::from(key),
            &Signature::from(signature),
            message,
            digest,
        ),
        None => VerificationResult::invalid(SignatureError::Unsigned),
    }
}
