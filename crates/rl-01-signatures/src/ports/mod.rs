//! # Ports Layer
//!
//! Inbound API of the signature subsystem.

pub mod inbound;
