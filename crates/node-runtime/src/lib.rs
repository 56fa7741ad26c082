//! # Node Runtime Library
//!
//! Wires peers and the aggregator into a running cluster. The binary in
//! `main.rs` parses arguments, installs telemetry and prints the summary;
//! everything else lives here so it can be tested.
//!
//! - `auction`: winners/payments file loader
//! - `config`: command-line arguments and validated `SimulationConfig`
//! - `simulation`: one tokio task per node over the in-memory network
//! - `report`: per-node reports and the run summary

#![allow(clippy::module_name_repetitions)]

pub mod auction;
pub mod config;
pub mod report;
pub mod simulation;

pub use auction::{Auction, AuctionError};
pub use config::{Args, ConfigError, QuorumArg, SimulationConfig};
pub use report::{NodeReport, NodeStats, Reportable, SimulationReport};
pub use simulation::{Simulation, SimulationError, TICKS_PER_INTERVAL};
