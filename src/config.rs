//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

use crate::event_store::DEFAULT_SNAPSHOT_INTERVAL;

/// Ledger configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Versions between two snapshots of an aggregate (0 disables snapshots)
    pub snapshot_interval: u64,

    /// Attempts per command before giving up on concurrency conflicts
    pub max_retries: u32,

    /// Base delay between retries; attempt `n` waits `n` times this
    pub retry_backoff_ms: u64,

    /// Environment (development, production)
    pub environment: String,

    /// Log output format (`pretty` or `json`)
    pub log_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            max_retries: 3,
            retry_backoff_ms: 50,
            environment: "development".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let snapshot_interval = parse_or(&lookup, "SNAPSHOT_INTERVAL", defaults.snapshot_interval)?;

        let max_retries: u32 = parse_or(&lookup, "MAX_COMMAND_RETRIES", defaults.max_retries)?;
        if max_retries == 0 {
            return Err(ConfigError::InvalidValue("MAX_COMMAND_RETRIES"));
        }

        let retry_backoff_ms = parse_or(&lookup, "RETRY_BACKOFF_MS", defaults.retry_backoff_ms)?;

        let environment = lookup("ENVIRONMENT").unwrap_or(defaults.environment);

        let log_format = lookup("LOG_FORMAT").unwrap_or(defaults.log_format);
        if log_format != "pretty" && log_format != "json" {
            return Err(ConfigError::InvalidValue("LOG_FORMAT"));
        }

        Ok(Self {
            snapshot_interval,
            max_retries,
            retry_backoff_ms,
            environment,
            log_format,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key)),
        None => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
