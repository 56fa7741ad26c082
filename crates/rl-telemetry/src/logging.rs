//! Structured logging.
//!
//! Every crate logs through `tracing` with structured fields (`node_id`,
//! `tx_id`, `height`, `responder`). This module installs the subscriber that
//! turns those events into lines on stderr.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// Fails if the filter does not parse or a subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    config.validate()?;
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("invalid log filter: {e}")))?;

    let console = config.console_output;
    let json_layer = (console && config.json_logs).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
    });
    let fmt_layer = (console && !config.json_logs).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_a_config_error() {
        let config = TelemetryConfig::default().with_log_level("rl=notalevel");
        assert!(matches!(init_logging(&config), Err(TelemetryError::Config(_))));
    }

    #[test]
    fn test_second_install_fails() {
        let config = TelemetryConfig::default().with_log_level("warn");
        // Whichever call installs first, the second cannot.
        let first = init_logging(&config);
        let second = init_logging(&config);
        assert!(first.is_err() || second.is_err());
        assert!(matches!(second, Err(TelemetryError::LoggingInit(_))));
    }
}
