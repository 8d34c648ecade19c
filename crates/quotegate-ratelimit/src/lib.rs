//! Sliding-window request admission control.
//!
//! Tracks the timestamps of recently admitted outbound requests and decides
//! whether another one may be dispatched without exceeding `max_requests`
//! inside the trailing `time_window`:
//!
//! ```rust,ignore
//! use quotegate_ratelimit::{RateLimitConfig, RequestAdmissionController};
//!
//! let limiter = RequestAdmissionController::new(RateLimitConfig::new(30, Duration::from_secs(60)));
//! if limiter.can_proceed() {
//!     fetch().await?;
//!     limiter.add_request();
//! } else {
//!     println!("retry in {:?}", limiter.get_wait_time());
//! }
//! ```
//!
//! Expired timestamps are pruned lazily at the start of every call, so the
//! controller needs no background task.

mod config;
mod controller;
mod error;
mod window;

pub use config::RateLimitConfig;
pub use controller::{RateLimitStats, RequestAdmissionController};
pub use error::{Error, RateLimited, Result};
pub use window::SlidingWindow;
