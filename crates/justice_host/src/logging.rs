//! Logging system setup
//!
//! Structured logging through `tracing`, filtered by `RUST_LOG` when set and
//! by the configured level otherwise.

use anyhow::{anyhow, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingSettings;

/// Initialize the global tracing subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn setup_logging(settings: &LoggingSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let registry = tracing_subscriber::registry().with(filter);

    if settings.json_format {
        registry
            .with(fmt::layer().json().with_target(false).with_thread_names(true))
            .try_init()
            .map_err(|e| anyhow!("failed to install JSON logger: {e}"))?;
    } else {
        registry
            .with(fmt::layer().with_target(false).with_thread_names(true))
            .try_init()
            .map_err(|e| anyhow!("failed to install logger: {e}"))?;
    }

    info!("🔧 Logging initialized with level: {}", settings.level);
    Ok(())
}
