//! Storefront configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use storefront_core::MAX_PAGE_SIZE;
use storefront_db::DbConfig;

/// Storefront configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool upper bound
    pub db_max_connections: u32,

    /// Connections kept open while idle
    pub db_min_connections: u32,

    /// Seconds to wait for a pooled connection
    pub db_connect_timeout_secs: u64,

    /// tracing filter directive, e.g. `info` or `storefront_db=debug,info`
    pub log_filter: String,

    /// Page size used when a list query doesn't give one
    pub default_page_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: PathBuf::from("./storefront.db"),
            db_max_connections: 5,
            db_min_connections: 1,
            db_connect_timeout_secs: 30,
            log_filter: "info".to_string(),
            default_page_size: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let config = AppConfig {
            database_path: lookup("STOREFRONT_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            db_max_connections: parse_or(
                &lookup,
                "STOREFRONT_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,

            db_min_connections: parse_or(
                &lookup,
                "STOREFRONT_DB_MIN_CONNECTIONS",
                defaults.db_min_connections,
            )?,

            db_connect_timeout_secs: parse_or(
                &lookup,
                "STOREFRONT_DB_CONNECT_TIMEOUT_SECS",
                defaults.db_connect_timeout_secs,
            )?,

            log_filter: lookup("STOREFRONT_LOG")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_filter),

            default_page_size: parse_or(
                &lookup,
                "STOREFRONT_DEFAULT_PAGE_SIZE",
                defaults.default_page_size,
            )?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "STOREFRONT_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        if config.db_min_connections > config.db_max_connections {
            return Err(ConfigError::InvalidPoolBounds {
                min: config.db_min_connections,
                max: config.db_max_connections,
            });
        }
        if config.default_page_size == 0 || config.default_page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue(
                "STOREFRONT_DEFAULT_PAGE_SIZE".to_string(),
            ));
        }

        Ok(config)
    }

    /// Pool settings for [`storefront_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.db_max_connections)
            .min_connections(self.db_min_connections)
            .connect_timeout(Duration::from_secs(self.db_connect_timeout_secs))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Pool minimum ({min}) exceeds maximum ({max})")]
    InvalidPoolBounds { min: u32, max: u32 },
}
