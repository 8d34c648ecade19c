//! Configuration for the expiring cache.

use std::time::Duration;

use quotegate_types::config::{ConfigProvider, HasCacheConfig, defaults};

use crate::error::{Error, Result};

/// Default maximum number of cached entries.
pub const DEFAULT_MAX_SIZE: usize = defaults::CACHE_MAX_SIZE;

/// Configuration for the expiring cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL applied by [`set`](crate::ExpiringCache::set).
    pub default_ttl: Duration,

    /// Maximum number of entries before the oldest-set one is evicted.
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: defaults::cache_ttl(),
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from any cache capability provider.
    pub fn from_provider<C: HasCacheConfig>(provider: &C) -> Self {
        Self {
            default_ttl: provider.default_ttl(),
            max_size: provider.max_size(),
        }
    }

    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the maximum number of entries.
    pub fn with_max_size(mut self, max: usize) -> Self {
        self.max_size = max;
        self
    }

    /// Reject configurations that cannot hold or keep anything.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::InvalidConfig(
                "max_size must be greater than zero".to_string(),
            ));
        }
        if self.default_ttl.is_zero() {
            return Err(Error::InvalidConfig(
                "default_ttl must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl ConfigProvider for CacheConfig {}

impl HasCacheConfig for CacheConfig {
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
    fn test_defaults() {
        let config = CacheConfig::new();
        assert_eq!(config.default_ttl, Duration::from_secs(3600));
        assert_eq!(config.max_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::new()
            .with_default_ttl(Duration::from_secs(5))
            .with_max_size(2);
        assert_eq!(config.default_ttl, Duration::from_secs(5));
        assert_eq!(config.max_size, 2);
    }

    #[test]
    fn test_validate() {
        assert!(CacheConfig::new().with_max_size(0).validate().is_err());
        let err = CacheConfig::new()
            .with_default_ttl(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("default_ttl"));
    }
}
