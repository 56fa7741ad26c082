//! # Roadside Ledger Telemetry
//!
//! Logging and metrics shared by every node.
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter`, human-readable
//!   or JSON output.
//! - **Metrics**: Prometheus counters, gauges and a latency histogram in a
//!   process-wide registry, labelled by node id where it matters.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rl_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RL_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directives |
//! | `RL_JSON_LOGS` | `false` | Emit one JSON object per line |
//! | `RL_METRICS_ENABLED` | `true` | Register Prometheus metrics |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{encode_metrics, register_metrics, MetricsHandle};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install log subscriber: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging and, if enabled, register metrics.
///
/// Hold the returned guard for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = if config.metrics_enabled {
        Some(register_metrics()?)
    } else {
        None
    };
    init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        metrics = config.metrics_enabled,
        "Telemetry initialized"
    );
    Ok(TelemetryGuard { _metrics: metrics })
}

/// Keeps telemetry alive until dropped.
pub struct TelemetryGuard {
    _metrics: Option<MetricsHandle>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TelemetryError::Config("bad level".into());
        assert_eq!(err.to_string(), "Invalid configuration: bad level");
    }
}
