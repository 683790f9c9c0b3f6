// src/telemetry/tracing.rs
//! Log subscriber setup for the service binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::app_config::LoggingConfig;

const DEFAULT_LEVEL: &str = "info";

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init_tracing(cfg: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cfg.level.as_deref().unwrap_or(DEFAULT_LEVEL)))?;

    let registry = tracing_subscriber::registry().with(filter);
    if cfg.json {
        registry.with(fmt::layer().json().with_target(true)).try_init()?;
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()?;
    }
    Ok(())
}
