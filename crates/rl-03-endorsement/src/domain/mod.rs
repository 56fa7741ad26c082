//! Domain layer for the endorsement protocol.

mod error;
mod quorum;
mod stats;

pub use error::*;
pub use quorum::*;
pub use stats::*;
