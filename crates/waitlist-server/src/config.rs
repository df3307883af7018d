//! Configuration for the waitlist service.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Registrant storage configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Registration and recent-query behaviour
    #[serde(default)]
    pub waitlist: WaitlistConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the waitlist snapshot file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Enable persistence (if false, registrants are kept in memory only)
    #[serde(default = "default_true")]
    pub persist: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaitlistConfig {
    /// Recent-query size when the caller gives none
    #[serde(default = "default_recent_limit")]
    pub recent_default_limit: usize,

    /// Upper bound applied to every recent query
    #[serde(default = "default_recent_max_limit")]
    pub recent_max_limit: usize,

    /// Bound on each storage call
    #[serde(default = "default_storage_timeout", with = "humantime_serde")]
    pub storage_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            persist: true,
        }
    }
}

impl Default for WaitlistConfig {
    fn default() -> Self {
        Self {
            recent_default_limit: default_recent_limit(),
            recent_max_limit: default_recent_max_limit(),
            storage_timeout: default_storage_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_store_path() -> PathBuf {
    PathBuf::from("/data/waitlist.json")
}

fn default_true() -> bool {
    true
}

fn default_recent_limit() -> usize {
    5
}

fn default_recent_max_limit() -> usize {
    50
}

fn default_storage_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Nested keys use `__`, e.g. `STORE__PATH=/var/lib/waitlist.json`.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
