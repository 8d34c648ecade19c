//! Error types for admission control.

use std::time::Duration;

/// Error type for rate limiter configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration can never admit a request.
    #[error("Invalid rate limit config: {0}")]
    InvalidConfig(String),
}

/// Result type for rate limiter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Denial returned by [`try_acquire`](crate::RequestAdmissionController::try_acquire)
/// when the window is saturated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Rate limit exceeded, retry in {:.1}s", .wait.as_secs_f64())]
pub struct RateLimited {
    /// Time until the oldest tracked request leaves the window.
    pub wait: Duration,
}
