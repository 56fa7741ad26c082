//! # Roadside Ledger Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── harness.rs        # Deterministic cluster over the loopback network
//! │   └── integration/      # Peer ↔ aggregator scenarios
//! └── benches/              # Criterion benchmarks
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p rl-tests
//! cargo test -p rl-tests integration::quorum
//! cargo bench -p rl-tests
//! ```

pub mod harness;
pub mod integration;

pub use harness::Cluster;
