//! # Commit Subsystem (RL-04)
//!
//! The aggregator. It receives endorsed transactions from peers, checks the
//! endorsement really covers the transaction, and commits each accepted
//! transaction in a block of its own on top of its chain.
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Digest binding | The carried digest must equal the digest of the canonical request bytes |
//! | Exactly once | A transaction key is committed at most once |
//! | Linear chain | Every block extends the current head at height + 1 |
//! | Size floor | Declared size is at least header plus transaction bytes |

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use config::{AggregatorConfig, DEFAULT_HEADER_SIZE_BYTES};
pub use domain::{
    AggregatorStats, BlockSizePolicy, Rejection, DEFAULT_BLOCK_SIZE_STD_DEV,
    DEFAULT_MEAN_BLOCK_SIZE,
};
pub use error::{CommitError, CommitResult, ConfigError};
pub use ports::{CommitApi, CommitOutcome};
pub use service::{AggregatorDependencies, AggregatorService};
