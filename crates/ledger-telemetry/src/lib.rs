//! # Ledger Telemetry
//!
//! Logging and metrics bootstrap for the shard ledger core.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let metrics = init_telemetry(&TelemetryConfig::from_env())?;
//! metrics.record_view_inserted("beacon");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SL_SERVICE_NAME` | `shard-ledger` | Service name in logs |
//! | `SL_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directive |
//! | `SL_JSON_LOGS` | `false` | JSON log lines |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};
pub use metrics::LedgerMetrics;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging and build the metrics set.
///
/// Metrics are built first so a registry failure leaves logging untouched.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<LedgerMetrics, TelemetryError> {
    let metrics = LedgerMetrics::new()?;
    init_logging(config)?;
    Ok(metrics)
}
