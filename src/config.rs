//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::LruConfig;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// LRU byte budget, 0 for unbounded
    pub lru_max_bytes: u64,
    /// Interval between LRU staleness sweeps in seconds
    pub lru_sweep_interval_secs: u64,
    /// Idle time in seconds after which an LRU entry is stale
    pub lru_stale_after_secs: u64,
    /// Number of shards in the TTL cache
    pub ttl_shard_count: usize,
    /// Interval between TTL shard sweeps in milliseconds
    pub ttl_cleanup_interval_ms: u64,
    /// TTL in milliseconds for set requests without an explicit `ttl_ms`
    pub ttl_default_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `LRU_MAX_BYTES` - LRU byte budget (default: 64 MiB)
    /// - `LRU_SWEEP_INTERVAL_SECS` - LRU sweep frequency (default: 60)
    /// - `LRU_STALE_AFTER_SECS` - LRU idle limit (default: 60)
    /// - `TTL_SHARD_COUNT` - TTL cache shards (default: 16)
    /// - `TTL_CLEANUP_INTERVAL_MS` - TTL sweep frequency (default: 1000)
    /// - `TTL_DEFAULT_MS` - Default TTL (default: 300000)
    ///
    /// Unset or unparsable variables fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            lru_max_bytes: env_or("LRU_MAX_BYTES", defaults.lru_max_bytes),
            lru_sweep_interval_secs: env_or(
                "LRU_SWEEP_INTERVAL_SECS",
                defaults.lru_sweep_interval_secs,
            ),
            lru_stale_after_secs: env_or("LRU_STALE_AFTER_SECS", defaults.lru_stale_after_secs),
            ttl_shard_count: env_or("TTL_SHARD_COUNT", defaults.ttl_shard_count),
            ttl_cleanup_interval_ms: env_or(
                "TTL_CLEANUP_INTERVAL_MS",
                defaults.ttl_cleanup_interval_ms,
            ),
            ttl_default_ms: env_or("TTL_DEFAULT_MS", defaults.ttl_default_ms),
        }
    }

    pub fn lru_config(&self) -> LruConfig {
        LruConfig {
            max_bytes: self.lru_max_bytes,
            sweep_interval: Duration::from_secs(self.lru_sweep_interval_secs),
            stale_after: Duration::from_secs(self.lru_stale_after_secs),
        }
    }

    pub fn ttl_cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.ttl_cleanup_interval_ms)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_default_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            lru_max_bytes: 64 * 1024 * 1024,
            lru_sweep_interval_secs: 60,
            lru_stale_after_secs: 60,
            ttl_shard_count: 16,
            ttl_cleanup_interval_ms: 1000,
            ttl_default_ms: 300_000,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
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
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.lru_max_bytes, 64 * 1024 * 1024);
        assert_eq!(config.ttl_shard_count, 16);
        assert_eq!(config.ttl_cleanup_interval(), Duration::from_secs(1));
        assert_eq!(config.default_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "SERVER_PORT",
            "LRU_MAX_BYTES",
            "LRU_SWEEP_INTERVAL_SECS",
            "LRU_STALE_AFTER_SECS",
            "TTL_SHARD_COUNT",
            "TTL_CLEANUP_INTERVAL_MS",
            "TTL_DEFAULT_MS",
        ] {
            env::remove_var(name);
        }

        assert_eq!(Config::from_env(), Config::default());
    }

    #[test]
    fn test_env_or_ignores_garbage() {
        env::set_var("HOTCACHE_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("HOTCACHE_TEST_GARBAGE", 7u64), 7);
        env::set_var("HOTCACHE_TEST_GARBAGE", "42");
        assert_eq!(env_or("HOTCACHE_TEST_GARBAGE", 7u64), 42);
        env::remove_var("HOTCACHE_TEST_GARBAGE");
    }

    #[test]
    fn test_lru_config_conversion() {
        let config = Config {
            lru_max_bytes: 1024,
            lru_sweep_interval_secs: 5,
            lru_stale_after_secs: 30,
            ..Config::default()
        };

        let lru = config.lru_config();
        assert_eq!(lru.max_bytes, 1024);
        assert_eq!(lru.sweep_interval, Duration::from_secs(5));
        assert_eq!(lru.stale_after, Duration::from_secs(30));
    }
}
