//! # Domain Layer

pub mod chain;
pub mod errors;
