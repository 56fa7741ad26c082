//! # Adapters Layer
//!
//! Conversions between domain types and the wire types in `shared-types`.

pub mod wire;
