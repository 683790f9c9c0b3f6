// src/config/app_config.rs

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::info;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "NOTIFICATION_ROUTER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/notification-router.yaml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Manifest with alerts, providers and secrets. Without one the service
    /// starts with an empty directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            fetch_timeout_secs: default_timeout_secs(),
        }
    }
}

impl DirectoryConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl NotifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Filter directive; `RUST_LOG` wins when set.
    pub level: Option<String>,
    #[serde(default)]
    pub json: bool,
}

fn default_bind() -> String {
    "0.0.0.0:9292".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl AppConfig {
    /// Loads from the file named by `NOTIFICATION_ROUTER_CONFIG` (or the
    /// default path) and `APP__*` environment variables.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut cfg = Config::builder();

        if path.exists() {
            cfg = cfg.add_source(File::from(path));
            info!("Loaded config file: {:?}", path);
        } else {
            info!("Config file not found, skipping: {:?}", path);
        }

        cfg = cfg.add_source(Environment::with_prefix("APP").separator("__"));

        let built = cfg.build().context("Failed to build configuration")?;
        let app_config: AppConfig = built
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.bind.trim().is_empty() {
            anyhow::bail!("server.bind must not be empty");
        }
        self.server
            .bind
            .parse::<SocketAddr>()
            .with_context(|| format!("server.bind '{}' is not a socket address", self.server.bind))?;

        if self.directory.fetch_timeout_secs == 0 {
            anyhow::bail!("directory.fetch_timeout_secs must be greater than zero");
        }
        if self.notifier.timeout_secs == 0 {
            anyhow::bail!("notifier.timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .with_context(|| format!("invalid server.bind '{}'", self.server.bind))
    }
}
