//! Subscriber setup.
//!
//! One global `tracing` subscriber per process. The filter comes from
//! [`TelemetryConfig::log_level`]; JSON output is line-delimited so a log
//! shipper can forward it unchanged.

use tracing_subscriber::EnvFilter;

use crate::{TelemetryConfig, TelemetryError};

/// Parse the configured filter directive.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::Config(format!("log level {:?}: {}", config.log_level, e)))
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed, which happens when two
/// components both try to own logging.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}
