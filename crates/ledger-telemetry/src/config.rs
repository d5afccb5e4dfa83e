//! Telemetry configuration from environment variables.

use std::env;

use serde::{Deserialize, Serialize};

/// Logging and metrics settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// `EnvFilter` directive, e.g. `info` or `sl_04_cross_shard_relay=debug`
    pub log_level: String,

    /// Emit JSON log lines instead of the human format
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "shard-ledger".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SL_SERVICE_NAME`: Service name (default: shard-ledger)
    /// - `SL_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `SL_JSON_LOGS`: `true`/`1` for JSON logs (default: false)
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply the environment on top of values loaded elsewhere.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(name) = env::var("SL_SERVICE_NAME") {
            self.service_name = name;
        }
        if let Ok(level) = env::var("SL_LOG_LEVEL").or_else(|_| env::var("RUST_LOG")) {
            self.log_level = level;
        }
        if let Ok(v) = env::var("SL_JSON_LOGS") {
            self.json_logs = v.eq_ignore_ascii_case("true") || v == "1";
        }
        self
    }
}
