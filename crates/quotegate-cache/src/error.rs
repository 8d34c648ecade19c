//! Error types for cache operations.

/// Error type for cache operations.
///
/// Misses and expired entries are not errors; they come back as `None`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration cannot hold or keep any entry.
    #[error("Invalid cache config: {0}")]
    InvalidConfig(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;
