//! # Domain Layer
//!
//! Pure arithmetic and signature logic. No I/O.

pub mod curve;
pub mod ecdsa;
pub mod entities;
pub mod errors;
pub mod keys;
pub mod modular;
pub mod primes;
