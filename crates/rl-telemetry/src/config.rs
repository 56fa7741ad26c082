//! Telemetry configuration from environment variables.

use crate::TelemetryError;
use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to startup logs
    pub service_name: String,

    /// `EnvFilter` directives, e.g. `info` or `rl_03_endorsement=debug`
    pub log_level: String,

    /// Whether to print anything at all
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to register Prometheus metrics
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "roadside-ledger".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RL_SERVICE_NAME`: Service name (default: roadside-ledger)
    /// - `RL_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `RL_CONSOLE_OUTPUT`: Print logs (default: true)
    /// - `RL_JSON_LOGS`: JSON logs (default: false)
    /// - `RL_METRICS_ENABLED`: Register metrics (default: true)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("RL_SERVICE_NAME")
                .unwrap_or_else(|_| "roadside-ledger".to_string()),

            log_level: env::var("RL_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("RL_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("RL_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(false),

            metrics_enabled: env::var("RL_METRICS_ENABLED")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),
        }
    }

    /// Override the log filter, e.g. from a `--log-level` flag.
    pub fn with_log_level(mut self, log_level: impl Into<String>) -> Self {
        self.log_level = log_level.into();
        self
    }

    pub fn with_json_logs(mut self, json_logs: bool) -> Self {
        self.json_logs = json_logs;
        self
    }

    pub fn validate(&self) -> Result<(), TelemetryError> {
        if self.log_level.trim().is_empty() {
            return Err(TelemetryError::Config("log level is empty".to_string()));
        }
        Ok(())
    }
}

fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
