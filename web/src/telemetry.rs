//! Logging setup for servers.

use crate::config::ServerConfig;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Failure while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log filter could not be parsed.
    #[error("Invalid log filter: {0}")]
    Filter(String),
    /// Another global subscriber is already installed.
    #[error("Failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured log level. Production
/// logs use the full format with thread ids; other environments use the
/// compact format.
///
/// # Errors
///
/// Returns [`TelemetryError`] if the filter is invalid or a subscriber is
/// already installed.
pub fn init(config: &ServerConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|error| TelemetryError::Filter(error.to_string()))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.environment.is_production() {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
    } else {
        registry.with(fmt::layer().compact().with_target(true)).try_init()
    };
    installed.map_err(|error| TelemetryError::Install(error.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = %config.environment,
        "Telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_reported() {
        let config = ServerConfig::default();
        let first = init(&config);
        let second = init(&config);
        // Only one global subscriber per process.
        assert!(first.is_ok() || matches!(first, Err(TelemetryError::Install(_))));
        assert!(matches!(second, Err(TelemetryError::Install(_))));
    }
}
