//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [rate_limit]
//! max_requests = 30
//! time_window_secs = 60
//!
//! [cache]
//! ttl_secs = 3600
//! max_size = 100
//!
//! [api]
//! timeout_secs = 30
//! max_retries = 3
//! backoff_factor = 1.0
//! default_symbols = ["MC.PA", "RMS.PA", "KER.PA"]
//! ```

use std::time::Duration;

use quotegate_types::config::{ConfigProvider, HasCacheConfig, HasRateLimitConfig, defaults};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotegateConfig {
    /// Outbound request admission.
    pub rate_limit: Option<RateLimitSection>,

    /// Quote cache.
    pub cache: Option<CacheSection>,

    /// Quote API client.
    pub api: Option<ApiSection>,
}

impl QuotegateConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: QuotegateConfig) {
        if other.rate_limit.is_some() {
            self.rate_limit = other.rate_limit;
        }

        if other.cache.is_some() {
            self.cache = other.cache;
        }

        if other.api.is_some() {
            self.api = other.api;
        }
    }

    /// Effective rate limit settings.
    pub fn rate_limit(&self) -> RateLimitSection {
        self.rate_limit.clone().unwrap_or_default()
    }

    /// Effective cache settings.
    pub fn cache(&self) -> CacheSection {
        self.cache.clone().unwrap_or_default()
    }

    /// Effective API settings.
    pub fn api(&self) -> ApiSection {
        self.api.clone().unwrap_or_default()
    }

    /// Check the effective settings for values no component can run with.
    pub fn validate(&self) -> Result<()> {
        let rate_limit = self.rate_limit();
        if rate_limit.max_requests == 0 {
            return Err(invalid("rate_limit.max_requests", "must be greater than zero"));
        }
        if rate_limit.time_window_secs == 0 {
            return Err(invalid("rate_limit.time_window_secs", "must be greater than zero"));
        }

        let cache = self.cache();
        if cache.max_size == 0 {
            return Err(invalid("cache.max_size", "must be greater than zero"));
        }
        if cache.ttl_secs == 0 {
            return Err(invalid("cache.ttl_secs", "must be greater than zero"));
        }

        let api = self.api();
        if api.timeout_secs == 0 {
            return Err(invalid("api.timeout_secs", "must be greater than zero"));
        }
        if !(0.0..=defaults::MAX_BACKOFF_SECS as f64).contains(&api.backoff_factor) {
            return Err(invalid(
                "api.backoff_factor",
                "must be between 0 and 300 seconds",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate Limit Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Sliding-window admission settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSection {
    /// Requests admitted per window.
    pub max_requests: usize,
    /// Window length in seconds.
    pub time_window_secs: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            max_requests: defaults::MAX_REQUESTS,
            time_window_secs: defaults::TIME_WINDOW_SECS,
        }
    }
}

impl ConfigProvider for RateLimitSection {}

impl HasRateLimitConfig for RateLimitSection {
    fn max_requests(&self) -> usize {
        self.max_requests
    }

    fn time_window(&self) -> Duration {
        Duration::from_secs(self.time_window_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Quote cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Default entry lifetime in seconds.
    pub ttl_secs: u64,
    /// Maximum number of cached entries.
    pub max_size: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: defaults::CACHE_TTL_SECS,
            max_size: defaults::CACHE_MAX_SIZE,
        }
    }
}

impl ConfigProvider for CacheSection {}

impl HasCacheConfig for CacheSection {
    fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    fn max_size(&self) -> usize {
        self.max_size
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Quote API client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after a transient failure.
    pub max_retries: u32,
    /// Base delay in seconds for exponential backoff between retries.
    pub backoff_factor: f64,
    /// Symbols quoted by `QuoteService::get_default_quotes`.
    pub default_symbols: Vec<String>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::API_TIMEOUT_SECS,
            max_retries: defaults::MAX_RETRIES,
            backoff_factor: defaults::BACKOFF_FACTOR,
            default_symbols: defaults::DEFAULT_SYMBOLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ApiSection {
    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
