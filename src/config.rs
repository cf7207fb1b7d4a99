//! Configuration Module
//!
//! Handles loading and managing layer configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{PerfError, Result};
use crate::retry::RetryPolicy;

/// Resilience layer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in seconds for cache entries without explicit TTL
    pub default_ttl: u64,
    /// Maximum attempts per retried operation (first call included)
    pub retry_max_attempts: u32,
    /// Base backoff delay in milliseconds
    pub retry_base_delay_ms: u64,
    /// Number of classified errors kept in the error log
    pub error_log_capacity: usize,
    /// Cap applied by the ranking optimizer to fetched result lists
    pub max_ranked_items: usize,
    /// Background cleanup interval in seconds, 0 disables the task
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL` - Default cache TTL in seconds (default: 300)
    /// - `RETRY_MAX_ATTEMPTS` - Attempts per operation (default: 3)
    /// - `RETRY_BASE_DELAY_MS` - Base backoff delay in ms (default: 1000)
    /// - `ERROR_LOG_CAPACITY` - Error log ring buffer size (default: 100)
    /// - `MAX_RANKED_ITEMS` - Ranking truncation cap (default: 50)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 0, disabled)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            retry_max_attempts: env_or("RETRY_MAX_ATTEMPTS", defaults.retry_max_attempts),
            retry_base_delay_ms: env_or("RETRY_BASE_DELAY_MS", defaults.retry_base_delay_ms),
            error_log_capacity: env_or("ERROR_LOG_CAPACITY", defaults.error_log_capacity),
            max_ranked_items: env_or("MAX_RANKED_ITEMS", defaults.max_ranked_items),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    /// Rejects values the components cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.retry_max_attempts == 0 {
            return Err(PerfError::InvalidConfig(
                "RETRY_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        if self.error_log_capacity == 0 {
            return Err(PerfError::InvalidConfig(
                "ERROR_LOG_CAPACITY must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Default cache TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    /// Retry policy described by this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    /// Cleanup interval, or None when the background sweep is disabled.
    pub fn cleanup_interval(&self) -> Option<Duration> {
        (self.cleanup_interval > 0).then(|| Duration::from_secs(self.cleanup_interval))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: 300,
            retry_max_attempts: 3,
            retry_base_delay_ms: 1000,
            error_log_capacity: 100,
            max_ranked_items: 50,
            cleanup_interval: 0,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_ttl, 300);
        assert_eq!(config.retry_max_attempts, 3);
        assert_eq!(config.retry_base_delay_ms, 1000);
        assert_eq!(config.error_log_capacity, 100);
        assert_eq!(config.max_ranked_items, 50);
        assert!(config.cleanup_interval().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        env::remove_var("DEFAULT_TTL");
        env::remove_var("RETRY_MAX_ATTEMPTS");
        env::remove_var("RETRY_BASE_DELAY_MS");
        env::remove_var("ERROR_LOG_CAPACITY");
        env::remove_var("MAX_RANKED_ITEMS");
        env::remove_var("CLEANUP_INTERVAL");

        let config = Config::from_env();
        assert_eq!(config.default_ttl, 300);
        assert_eq!(config.retry_max_attempts, 3);
        assert_eq!(config.error_log_capacity, 100);
        assert_eq!(config.max_ranked_items, 50);
    }

    #[test]
    fn test_config_retry_policy() {
        let policy = Config::default().retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_config_validate_rejects_zero_attempts() {
        let config = Config {
            retry_max_attempts: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(PerfError::InvalidConfig(_))));
    }
}
