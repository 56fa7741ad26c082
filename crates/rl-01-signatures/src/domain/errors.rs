//! # Signature Errors
//!
//! Error types for arithmetic, key generation and signing.

use thiserror::Error;

/// Errors from modular arithmetic.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("Modulus must be non-zero")]
    ZeroModulus,

    /// `gcd(value, modulus) != 1`
    #[error("{value} has no inverse modulo {modulus}")]
    NoInverse { value: i128, modulus: u64 },

    /// Prime generation supports 1 to 18 decimal digits.
    #[error("Cannot generate a prime with {0} digits (supported: 1..=18)")]
    InvalidDigits(u32),
}

/// Errors from curve and key generation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyGenerationError {
    #[error("Curve y^2 = x^3 + {a}x + {b} is singular modulo {p}")]
    SingularCurve { p: u64, a: u64, b: u64 },

    #[error("Field modulus {0} is too small")]
    ModulusTooSmall(u64),

    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Every sampled curve lacked a usable prime-order point.
    #[error("No prime-order point found after {attempts} curves")]
    NoPrimeOrderPoint { attempts: usize },

    #[error("Arithmetic failure: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

/// Errors that can occur while signing or verifying.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// `r` or `s` outside `[1, n)`
    #[error("Invalid signature format")]
    InvalidFormat,

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Signature does not match message and key
    #[error("Signature verification failed")]
    VerificationFailed,

    /// The digest carried with a signature is not the digest of the message.
    #[error("Digest mismatch: carried {carried}, computed {computed}")]
    DigestMismatch { carried: u64, computed: u64 },

    /// Endorsement carried no signature material.
    #[error("Endorsement is unsigned")]
    Unsigned,

    /// Every nonce produced `r == 0` or `s == 0`.
    #[error("Signing gave up after {attempts} nonces")]
    SigningExhausted { attempts: usize },

    #[error("Signing failed with {regenerations} fresh key pairs")]
    KeyRegenerationExhausted { regenerations: u32 },

    #[error("Arithmetic failure: {0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("Key generation failed: {0}")]
    KeyGeneration(#[from] KeyGenerationError),
}
