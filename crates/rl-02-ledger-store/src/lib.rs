//! # Ledger Store (RL-02)
//!
//! In-memory blockchain kept by the aggregator and mirrored by every peer.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Genesis | Height 0 holds exactly one genesis block |
//! | 2 | Top | The current top is the first block at the highest height |
//! | 3 | Fillers | Appending above the top creates empty buckets for skipped heights |
//! | 4 | Monotonic | Blocks are never removed from the main store |
//!
//! Blocks link by `(height - 1, parent_miner_id)`, not by content hash.
//! Blocks whose parent is unknown wait in the orphan pool.

pub mod domain;

pub use domain::chain::{Blockchain, IngestOutcome, MAX_HEIGHT_GAP};
pub use domain::errors::{LedgerError, Result};
