//! # Signatures Subsystem (RL-01)
//!
//! Small-prime elliptic-curve signatures used by peers to endorse each
//! other's transactions.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): modular arithmetic, primality, curve
//!   group law, key generation, ECDSA. Pure, no I/O.
//! - **Ports Layer** (`ports/`): `SigningApi` and `SignatureVerificationApi`.
//! - **Service Layer** (`service.rs`): `SigningService` owns a key pair,
//!   `VerificationService` is stateless.
//! - **Adapters** (`adapters/`): conversions to the wire endorsement fields.
//!
//! ## Security Notes
//!
//! Curves have 4-digit primes and the digest keeps 32 bits of SHA-256.
//! The scheme demonstrates the protocol; it offers no real security.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::wire::{endorsement_from, verify_endorsed_message, verify_endorsement};
pub use domain::curve::{Curve, CurveArithmetic, Point};
pub use domain::ecdsa::{
    batch_verify, digest_message, sign, verify, verify_detailed, Signature, VerifyingKey,
    MAX_SIGNING_ATTEMPTS,
};
pub use domain::entities::{
    BatchVerificationResult, SignedDigest, VerificationRequest, VerificationResult,
};
pub use domain::errors::{ArithmeticError, KeyGenerationError, SignatureError};
pub use domain::keys::{generate_key, KeyPair, PublicKey, MAX_CURVE_ATTEMPTS, MAX_ORDER_PROBES};
pub use domain::modular::{mod_pow, modular_inverse, modulo, to_binary};
pub use domain::primes::{generate_prime, is_prime};
pub use ports::inbound::{SignatureVerificationApi, SigningApi};
pub use service::{SigningService, VerificationService, MAX_KEY_REGENERATIONS};
