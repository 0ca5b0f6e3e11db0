pub mod config;
pub mod error;
pub mod prefs;

pub use config::{ApiConfig, ChartConfig, Config, LocationConfig, ValidationResult};
pub use error::{AppError, ConfigError, NetworkError, ReqwestErrorExt};
pub use prefs::PreferenceStore;

use anyhow::Result;

/// Initialize logging for the command-line front end.
///
/// Defaults to `warn` so the printed weather card stays readable;
/// `RUST_LOG` overrides it.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::debug!("wx core initialized");
    Ok(())
}
