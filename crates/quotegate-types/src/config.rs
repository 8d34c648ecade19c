//! Configuration traits for decoupled config passing between crates.
//!
//! The admission controller and the cache are built from these capability
//! traits rather than from the full file-backed configuration, so either
//! can be used without pulling in `quotegate-config`.

use std::time::Duration;

/// Base trait for all configuration types.
pub trait ConfigProvider: Clone + Send + Sync + 'static {}

/// Sliding-window admission settings.
pub trait HasRateLimitConfig: ConfigProvider {
    /// Maximum number of admitted requests inside one window.
    fn max_requests(&self) -> usize;

    /// Length of the trailing window.
    fn time_window(&self) -> Duration;
}

/// Expiring cache settings.
pub trait HasCacheConfig: ConfigProvider {
    /// TTL applied when a caller does not pass one.
    fn default_ttl(&self) -> Duration;

    /// Maximum number of entries before the oldest is evicted.
    fn max_size(&self) -> usize;
}

// ─────────────────────────────────────────────────────────────────────────────
// Default values
// ─────────────────────────────────────────────────────────────────────────────

/// Default configuration values.
pub mod defaults {
    use std::time::Duration;

    pub const MAX_REQUESTS: usize = 30;
    pub const TIME_WINDOW_SECS: u64 = 60;
    pub const CACHE_TTL_SECS: u64 = 3600;
    pub const CACHE_MAX_SIZE: usize = 100;
    pub const API_TIMEOUT_SECS: u64 = 30;
    pub const MAX_RETRIES: u32 = 3;
    pub const BACKOFF_FACTOR: f64 = 1.0;
    /// Ceiling on a single retry delay and on `backoff_factor`.
    pub const MAX_BACKOFF_SECS: u64 = 300;
    pub const DEFAULT_SYMBOLS: [&str; 3] = ["MC.PA", "RMS.PA", "KER.PA"];

    pub fn time_window() -> Duration {
        Duration::from_secs(TIME_WINDOW_SECS)
    }

    pub fn cache_ttl() -> Duration {
        Duration::from_secs(CACHE_TTL_SECS)
    }

    pub fn api_timeout() -> Duration {
        Duration::from_secs(API_TIMEOUT_SECS)
    }

    pub fn max_backoff() -> Duration {
        Duration::from_secs(MAX_BACKOFF_SECS)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Simple wrapper types for standalone config passing
// ─────────────────────────────────────────────────────────────────────────────

/// Standalone rate limit configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfigProvider {
    pub max_requests: usize,
    pub time_window: Duration,
}

impl Default for RateLimitConfigProvider {
    fn default() -> Self {
        Self {
            max_requests: defaults::MAX_REQUESTS,
            time_window: defaults::time_window(),
        }
    }
}

impl ConfigProvider for RateLimitConfigProvider {}

impl HasRateLimitConfig for RateLimitConfigProvider {
    fn max_requests(&self) -> usize {
        self.max_requests
    }

    fn time_window(&self) -> Duration {
        self.time_window
    }
}

/// Standalone cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfigProvider {
    pub default_ttl: Duration,
    pub max_size: usize,
}

impl Default for CacheConfigProvider {
    fn default() -> Self {
        Self {
            default_ttl: defaults::cache_ttl(),
            max_size: defaults::CACHE_MAX_SIZE,
        }
    }
}

impl ConfigProvider for CacheConfigProvider {}

impl HasCacheConfig for CacheConfigProvider {
    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn max_size(&self) -> usize {
        self.max_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_defaults() {
        let config = RateLimitConfigProvider::default();
        assert_eq!(config.max_requests(), 30);
        assert_eq!(config.time_window(), Duration::from_secs(60));
    }

    #[test]
    fn test_cache_defaults() {
        let config = CacheConfigProvider::default();
        assert_eq!(config.default_ttl(), Duration::from_secs(3600));
        assert_eq!(config.max_size(), defaults::CACHE_MAX_SIZE);
    }
}
