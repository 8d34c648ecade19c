//! Expiring key-value cache for fetched quote data.
//!
//! This crate provides:
//! - [`ExpiringCache`]: a bounded map with per-entry TTL, lazy expiry on
//!   read, and eviction of the oldest-set entry once `max_size` is reached
//! - [`RequestFingerprint`]: deterministic cache keys built from a request
//!   name plus positional and keyword arguments
//!
//! # Example
//!
//! ```rust,ignore
//! use quotegate_cache::{CacheConfig, ExpiringCache, RequestFingerprint};
//!
//! let cache = ExpiringCache::new(CacheConfig::new().with_max_size(100));
//! let key = RequestFingerprint::new("get_quote").arg("MC.PA").kwarg("period", "6M").key();
//!
//! cache.set(key.clone(), quote);
//! assert!(cache.get(&key).is_some());
//! ```

mod cache;
mod config;
mod error;
mod fingerprint;

pub use cache::{CacheStats, ExpiringCache};
pub use config::CacheConfig;
pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, RequestFingerprint};
