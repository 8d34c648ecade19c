//! Quote sources.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::Result;
use crate::types::{Quote, QuoteRequest};

/// Anything that can produce a quote for a request.
///
/// Implementations perform the actual outbound call. They should not do
/// their own rate limiting or caching; [`QuoteService`](crate::QuoteService)
/// handles both.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch the latest quote.
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<Quote>;

    /// Get the name of this source.
    fn name(&self) -> &str;
}

/// Deterministic development source with fixed prices for a few
/// Euronext Paris tickers and a flat 100.00 for everything else.
#[derive(Debug, Default)]
pub struct SimulatedQuoteSource {
    fetches: AtomicUsize,
}

impl SimulatedQuoteSource {
    /// Create a new simulated source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of quotes served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    fn snapshot(symbol: &str) -> (f64, f64, u64) {
        match symbol {
            "MC.PA" => (519.60, -0.93, 26_164),
            "RMS.PA" => (2450.00, 0.0, 0),
            "KER.PA" => (320.00, 0.0, 0),
            _ => (100.00, 0.0, 0),
        }
    }
}

#[async_trait]
impl QuoteSource for SimulatedQuoteSource {
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<Quote> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let (price, change_percent, volume) = Self::snapshot(request.symbol());

        Ok(Quote {
            symbol: request.symbol().to_string(),
            price,
            change_percent,
            volume,
            fetched_at: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
