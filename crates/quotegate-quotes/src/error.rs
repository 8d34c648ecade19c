//! Error types for quote fetching.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using the quote error type.
pub type Result<T> = std::result::Result<T, QuoteError>;

/// Errors surfaced by [`QuoteService`](crate::QuoteService) and quote sources.
#[derive(Debug, Clone, Error)]
pub enum QuoteError {
    /// The symbol is not an exchange ticker of the form `XX.XX`.
    #[error("invalid symbol '{0}': expected format like MC.PA")]
    InvalidSymbol(String),

    /// The period is not one of the supported lookback windows.
    #[error("invalid period '{0}': expected one of 1M, 3M, 6M, 1Y, 2Y, 5Y")]
    InvalidPeriod(String),

    /// The local admission controller refused the request.
    #[error("rate limit reached, retry in {:.0}s", .wait.as_secs_f64())]
    RateLimited {
        /// Time until a slot frees up.
        wait: Duration,
    },

    /// The source did not answer within the per-attempt timeout.
    #[error("quote request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The source failed.
    #[error("quote source error: {message}")]
    Source {
        /// Description from the source.
        message: String,
        /// Whether retrying may succeed.
        transient: bool,
    },
}

impl QuoteError {
    /// Create a source error that may succeed on retry.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
            transient: true,
        }
    }

    /// Create a source error that will not succeed on retry.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
            transient: false,
        }
    }

    /// Classify an HTTP status from an upstream quote endpoint.
    ///
    /// Returns `None` for success. 429 and 5xx are transient; other
    /// statuses are permanent.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            429 => Some(Self::transient("upstream rate limit reached (429)")),
            500..=599 => Some(Self::transient(format!("server error: {}", status))),
            400..=499 => Some(Self::permanent(format!("client error: {}", status))),
            _ => Some(Self::permanent(format!("unexpected status: {}", status))),
        }
    }

    /// Whether the retry policy should try again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Source { transient, .. } => *transient,
            Self::InvalidSymbol(_) | Self::InvalidPeriod(_) | Self::RateLimited { .. } => false,
        }
    }

    /// Time to wait before retrying, if the error says so.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { wait } => Some(*wait),
            _ => None,
        }
    }
}

impl From<quotegate_ratelimit::RateLimited> for QuoteError {
    fn from(denied: quotegate_ratelimit::RateLimited) -> Self {
        Self::RateLimited { wait: denied.wait }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(QuoteError::from_status(200).is_none());
        assert!(QuoteError::from_status(429).unwrap().is_transient());
        assert!(QuoteError::from_status(503).unwrap().is_transient());
        assert!(!QuoteError::from_status(404).unwrap().is_transient());
        assert!(!QuoteError::from_status(302).unwrap().is_transient());
    }

    #[test]
    fn test_rate_limited_conversion() {
        let err: QuoteError = quotegate_ratelimit::RateLimited {
            wait: Duration::from_secs(12),
        }
        .into();
        assert!(!err.is_transient());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(12)));
        assert_eq!(err.to_string(), "rate limit reached, retry in 12s");
    }

    #[test]
    fn test_timeout_is_transient() {
        let err = QuoteError::Timeout(Duration::from_secs(30));
        assert!(err.is_transient());
        assert!(err.to_string().contains("30s"));
    }
}
