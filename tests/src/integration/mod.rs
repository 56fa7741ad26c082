//! # Integration Tests
//!
//! Peers and the aggregator wired together over the loopback network.
//!
//! ## Flows Tested
//!
//! 1. **Endorsement → commit → broadcast**: a transaction travels from its
//!    originator through every peer to the aggregator and back as a block.
//! 2. **Quorum gating**: nothing reaches the aggregator without every
//!    expected response.
//! 3. **Tampering**: the aggregator refuses endorsements that do not cover
//!    the transaction they travel with.

pub mod commit_flow;
pub mod quorum;
pub mod tampering;
