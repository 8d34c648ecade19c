//! Configuration for the admission controller.

use std::time::Duration;

use quotegate_types::config::{ConfigProvider, HasRateLimitConfig, defaults};

use crate::error::{Error, Result};

/// Window size and admission ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum number of requests admitted inside one window.
    pub max_requests: usize,

    /// Length of the trailing window.
    pub time_window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: defaults::MAX_REQUESTS,
            time_window: defaults::time_window(),
        }
    }
}

impl RateLimitConfig {
    /// Create a configuration with explicit values.
    pub fn new(max_requests: usize, time_window: Duration) -> Self {
        Self {
            max_requests,
            time_window,
        }
    }

    /// Build from any rate limit capability provider.
    pub fn from_provider<C: HasRateLimitConfig>(provider: &C) -> Self {
        Self::new(provider.max_requests(), provider.time_window())
    }

    /// Set the admission ceiling.
    pub fn with_max_requests(mut self, max: usize) -> Self {
        self.max_requests = max;
        self
    }

    /// Set the window length.
    pub fn with_time_window(mut self, window: Duration) -> Self {
        self.time_window = window;
        self
    }

    /// Reject configurations that never admit or never limit.
    pub fn validate(&self) -> Result<()> {
        if self.max_requests == 0 {
            return Err(Error::InvalidConfig(
                "max_requests must be greater than zero".to_string(),
            ));
        }
        if self.time_window.is_zero() {
            return Err(Error::InvalidConfig(
                "time_window must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl ConfigProvider for RateLimitConfig {}

impl HasRateLimitConfig for RateLimitConfig {
    fn max_requests(&self) -> usize {
        self.max_requests
    }

    fn time_window(&self) -> Duration {
        self.time_window
    }
}
