//! Rate-limited, cached quote fetching.
//!
//! [`QuoteService`] sits between a presentation layer and a [`QuoteSource`]:
//! cache hits are served without touching the source, misses are admitted
//! through a [`RequestAdmissionController`](quotegate_ratelimit::RequestAdmissionController)
//! before the source is called, and fresh quotes are stored in an
//! [`ExpiringCache`](quotegate_cache::ExpiringCache).

mod error;
mod service;
mod source;
mod types;

pub use error::{QuoteError, Result};
pub use service::{QuoteService, RetryPolicy};
pub use source::{QuoteSource, SimulatedQuoteSource};
pub use types::{Period, Quote, QuoteRequest, validate_symbol};
