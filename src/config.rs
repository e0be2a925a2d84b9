//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Prefix for the versioned resource routes
    pub api_prefix: String,
    /// Per-request deadline in seconds
    pub request_timeout: u64,
    /// Consecutive store failures that open the circuit breaker
    pub failure_threshold: u32,
    /// Seconds the breaker stays open before admitting a trial
    pub recovery_timeout: f64,
    /// Whether the read cache is active
    pub cache_enabled: bool,
    /// Cache entry lifetime in seconds
    pub cache_ttl: f64,
    /// Maximum number of cached entries
    pub cache_max_size: usize,
    /// Retries for a failing store read
    pub retry_max_retries: u32,
    /// First backoff delay in milliseconds
    pub retry_base_delay_ms: u64,
    /// Backoff cap in milliseconds
    pub retry_max_delay_ms: u64,
    /// Load the demo funds, investors and investments at startup
    pub seed_demo_data: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `API_PREFIX` - Route prefix (default: /api/v1)
    /// - `REQUEST_TIMEOUT` - Request deadline in seconds (default: 30)
    /// - `CB_FAILURE_THRESHOLD` - Breaker failure threshold (default: 5)
    /// - `CB_RECOVERY_TIMEOUT` - Breaker recovery timeout in seconds (default: 30)
    /// - `CACHE_ENABLED` - Enable the cache (default: true)
    /// - `CACHE_TTL` - Cache TTL in seconds (default: 30)
    /// - `CACHE_MAX_SIZE` - Cache capacity (default: 1000)
    /// - `RETRY_MAX_RETRIES` - Store read retries (default: 3)
    /// - `RETRY_BASE_DELAY_MS` - First backoff delay (default: 500)
    /// - `RETRY_MAX_DELAY_MS` - Backoff cap (default: 10000)
    /// - `SEED_DEMO_DATA` - Load demo records into an empty store (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            api_prefix: env::var("API_PREFIX").unwrap_or(defaults.api_prefix),
            request_timeout: env_or("REQUEST_TIMEOUT", defaults.request_timeout),
            failure_threshold: env_or("CB_FAILURE_THRESHOLD", defaults.failure_threshold),
            recovery_timeout: env_or("CB_RECOVERY_TIMEOUT", defaults.recovery_timeout),
            cache_enabled: env::var("CACHE_ENABLED")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.cache_enabled),
            cache_ttl: env_or("CACHE_TTL", defaults.cache_ttl),
            cache_max_size: env_or("CACHE_MAX_SIZE", defaults.cache_max_size),
            retry_max_retries: env_or("RETRY_MAX_RETRIES", defaults.retry_max_retries),
            retry_base_delay_ms: env_or("RETRY_BASE_DELAY_MS", defaults.retry_base_delay_ms),
            retry_max_delay_ms: env_or("RETRY_MAX_DELAY_MS", defaults.retry_max_delay_ms),
            seed_demo_data: env::var("SEED_DEMO_DATA")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.seed_demo_data),
        }
    }

    /// Breaker recovery timeout as a Duration. Invalid values clamp to zero.
    pub fn recovery_timeout(&self) -> Duration {
        seconds(self.recovery_timeout)
    }

    /// Cache TTL as a Duration. Invalid values clamp to zero.
    pub fn cache_ttl(&self) -> Duration {
        seconds(self.cache_ttl)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            api_prefix: "/api/v1".to_string(),
            request_timeout: 30,
            failure_threshold: 5,
            recovery_timeout: 30.0,
            cache_enabled: true,
            cache_ttl: 30.0,
            cache_max_size: 1000,
            retry_max_retries: 3,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 10_000,
            seed_demo_data: false,
        }
    }
}

// == Helpers ==
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.api_prefix, "/api/v1");
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.recovery_timeout(), Duration::from_secs(30));
        assert!(config.cache_enabled);
        assert_eq!(config.cache_ttl(), Duration::from_secs(30));
        assert_eq!(config.cache_max_size, 1000);
        assert_eq!(config.retry_max_retries, 3);
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for key in [
            "SERVER_PORT",
            "CB_FAILURE_THRESHOLD",
            "CB_RECOVERY_TIMEOUT",
            "CACHE_ENABLED",
            "CACHE_TTL",
            "CACHE_MAX_SIZE",
        ] {
            env::remove_var(key);
        }

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.failure_threshold, 5);
        assert!(config.cache_enabled);
        assert_eq!(config.cache_max_size, 1000);
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" yes "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_negative_durations_clamp_to_zero() {
        let config = Config {
            cache_ttl: -1.0,
            recovery_timeout: -5.0,
            ..Config::default()
        };
        assert_eq!(config.cache_ttl(), Duration::ZERO);
        assert_eq!(config.recovery_timeout(), Duration::ZERO);
    }
}
