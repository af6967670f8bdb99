//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Ledger configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// How long a transfer may wait for a pooled connection
    pub database_acquire_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = var_or("DATABASE_MAX_CONNECTIONS", 10)?;

        let acquire_timeout_secs: u64 = var_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?;

        Ok(Self {
            database_url,
            database_max_connections,
            database_acquire_timeout: Duration::from_secs(acquire_timeout_secs),
        })
    }

    /// Configuration for an explicit URL with default pool settings
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            database_max_connections: 10,
            database_acquire_timeout: Duration::from_secs(5),
        }
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.database_max_connections = max_connections;
        self
    }

    pub fn acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.database_acquire_timeout = acquire_timeout;
        self
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn var_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
