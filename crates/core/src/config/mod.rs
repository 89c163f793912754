//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (DOCTREE_*)
//! 2. TOML config file (if DOCTREE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_FILE_ENV: &str = "DOCTREE_CONFIG_FILE";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (DOCTREE_*)
/// 2. TOML config file (if DOCTREE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    ///
    /// Set via DOCTREE_LISTEN_ADDR environment variable.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Path to the SQLite document database.
    ///
    /// Set via DOCTREE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// How long a cached document stays valid, in seconds.
    ///
    /// Set via DOCTREE_CACHE_LIVE_TIME_SECS environment variable.
    #[serde(default = "default_cache_live_time_secs")]
    pub cache_live_time_secs: u64,

    /// How often expired cache entries are swept, in seconds.
    ///
    /// Set via DOCTREE_CACHE_SWEEP_INTERVAL_SECS environment variable.
    #[serde(default = "default_cache_sweep_interval_secs")]
    pub cache_sweep_interval_secs: u64,

    /// Number of placeholder documents created when the store starts empty.
    ///
    /// Set via DOCTREE_SEED_DOCUMENTS environment variable. 0 disables seeding.
    #[serde(default)]
    pub seed_documents: usize,

    /// Maximum number of list items processed concurrently.
    ///
    /// Set via DOCTREE_LIST_MAX_CONCURRENCY environment variable.
    #[serde(default = "default_list_max_concurrency")]
    pub list_max_concurrency: usize,

    /// Text appended to each title in list responses.
    ///
    /// Set via DOCTREE_LIST_TITLE_SUFFIX environment variable. Environment
    /// values are trimmed, so a suffix with leading or trailing spaces must
    /// be set in the TOML file.
    #[serde(default)]
    pub list_title_suffix: String,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./doctree.sqlite")
}

fn default_cache_live_time_secs() -> u64 {
    300
}

fn default_cache_sweep_interval_secs() -> u64 {
    60
}

fn default_list_max_concurrency() -> usize {
    8
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            db_path: default_db_path(),
            cache_live_time_secs: default_cache_live_time_secs(),
            cache_sweep_interval_secs: default_cache_sweep_interval_secs(),
            seed_documents: 0,
            list_max_concurrency: default_list_max_concurrency(),
            list_title_suffix: String::new(),
        }
    }
}

impl AppConfig {
    pub fn cache_live_time(&self) -> Duration {
        Duration::from_secs(self.cache_live_time_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs)
    }

    /// Parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `listen_addr` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr.parse().map_err(|e| ConfigError::Invalid {
            field: "listen_addr".into(),
            reason: format!("{e}"),
        })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `DOCTREE_`
    /// 2. TOML file from `DOCTREE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var(CONFIG_FILE_ENV) {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("DOCTREE_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
