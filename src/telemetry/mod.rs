//! Logging setup.
//!
//! Everything is logged through `tracing` to stderr: stdout carries the
//! protocol and must stay clean.

use tracing_subscriber::EnvFilter;

/// Configuration for the telemetry system
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Name of the service
    pub service_name: String,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Colorize output
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "terminal-toolkit-mcp".to_string(),
            log_level: "info".to_string(),
            ansi: false,
        }
    }
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over [`TelemetryConfig::log_level`].
pub fn init_telemetry(config: TelemetryConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(config.ansi)
        .try_init()?;

    tracing::debug!(service = %config.service_name, "Telemetry initialized");
    Ok(())
}
