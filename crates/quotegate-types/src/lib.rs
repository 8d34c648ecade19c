//! Shared types for the quotegate crates.

pub mod clock;
pub mod config;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock, system_clock};
pub use config::{
    CacheConfigProvider, ConfigProvider, HasCacheConfig, HasRateLimitConfig,
    RateLimitConfigProvider, defaults as config_defaults,
};
