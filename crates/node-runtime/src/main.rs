//! # Roadside Ledger Node Runtime
//!
//! Runs N roadside peers and the aggregator in one process for a fixed
//! duration, then prints a summary.
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments
//! 2. Install logging and metrics
//! 3. Load auction outcomes and validate configuration
//! 4. Spawn one task per node and run for the configured duration
//! 5. Print the summary (and metrics, if asked)

use anyhow::{Context, Result};
use clap::Parser;
use node_runtime::{Args, Simulation, SimulationConfig};
use rl_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if args.json_logs {
        telemetry = telemetry.with_json_logs(true);
    }
    if let Some(level) = &args.log_level {
        telemetry = telemetry.with_log_level(level.clone());
    }
    if args.print_metrics {
        telemetry.metrics_enabled = true;
    }
    let _telemetry = init_telemetry(telemetry).context("Failed to initialize telemetry")?;

    let config = SimulationConfig::from_args(&args).context("Invalid configuration")?;
    info!(
        peers = config.num_peers,
        auction_entries = config.auction.peer_count(),
        seed = ?config.seed,
        "Configuration loaded"
    );

    let report = Simulation::new(config)
        .run()
        .await
        .context("Simulation failed")?;
    println!("{report}");

    if args.print_metrics {
        let metrics = encode_metrics().context("Failed to encode metrics")?;
        println!("{metrics}");
    }
    Ok(())
}
