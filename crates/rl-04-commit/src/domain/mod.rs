//! Domain layer for the commit subsystem

mod block_size;
mod rejection;
mod stats;

pub use block_size::*;
pub use rejection::*;
pub use stats::*;
