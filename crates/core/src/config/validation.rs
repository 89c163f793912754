//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Upper bound for the cache live time: one day.
const MAX_CACHE_LIVE_TIME_SECS: u64 = 86_400;
const MAX_SEED_DOCUMENTS: usize = 10_000;
const MAX_LIST_CONCURRENCY: usize = 256;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `listen_addr` is not a socket address
    /// - `cache_live_time_secs` is 0 or exceeds one day
    /// - `cache_sweep_interval_secs` is 0
    /// - `seed_documents` exceeds 10000
    /// - `list_max_concurrency` is 0 or exceeds 256
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        if self.cache_live_time_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_live_time_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.cache_live_time_secs > MAX_CACHE_LIVE_TIME_SECS {
            return Err(ConfigError::Invalid {
                field: "cache_live_time_secs".into(),
                reason: "must not exceed one day (86400s)".into(),
            });
        }

        if self.cache_sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_sweep_interval_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.seed_documents > MAX_SEED_DOCUMENTS {
            return Err(ConfigError::Invalid {
                field: "seed_documents".into(),
                reason: format!("must not exceed {MAX_SEED_DOCUMENTS}"),
            });
        }

        if self.list_max_concurrency == 0 || self.list_max_concurrency > MAX_LIST_CONCURRENCY {
            return Err(ConfigError::Invalid {
                field: "list_max_concurrency".into(),
                reason: format!("must be between 1 and {MAX_LIST_CONCURRENCY}"),
            });
        }

        if self.cache_sweep_interval_secs > self.cache_live_time_secs {
            tracing::warn!(
                sweep_interval_secs = self.cache_sweep_interval_secs,
                live_time_secs = self.cache_live_time_secs,
                "Cache sweep interval exceeds live time; \
                 expired entries may linger until read"
            );
        }

        Ok(())
    }
}
