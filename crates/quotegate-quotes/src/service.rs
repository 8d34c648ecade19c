//! Quote fetching through the admission controller and cache.

use std::time::Duration;

use quotegate_cache::{CacheConfig, CacheStats, ExpiringCache, Fingerprint};
use quotegate_config::{ApiSection, QuotegateConfig};
use quotegate_ratelimit::{RateLimitConfig, RateLimitStats, RequestAdmissionController};
use quotegate_types::clock::{SharedClock, system_clock};
use quotegate_types::config::defaults;
use tracing::{debug, warn};

use crate::error::{QuoteError, Result};
use crate::source::QuoteSource;
use crate::types::{Period, Quote, QuoteRequest};

// ─────────────────────────────────────────────────────────────────────────────
// Retry Policy
// ─────────────────────────────────────────────────────────────────────────────

/// Timeout and retry settings for calls into a [`QuoteSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Upper bound on a single attempt.
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Base delay in seconds; attempt `n` waits `factor * 2^(n-1)`.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: defaults::api_timeout(),
            max_retries: defaults::MAX_RETRIES,
            backoff_factor: defaults::BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Build from the `[api]` config section.
    pub fn from_api(api: &ApiSection) -> Self {
        Self {
            timeout: api.timeout(),
            max_retries: api.max_retries,
            backoff_factor: api.backoff_factor,
        }
    }

    /// A policy that tries once.
    pub fn no_retries(timeout: Duration) -> Self {
        Self {
            timeout,
            max_retries: 0,
            backoff_factor: 0.0,
        }
    }

    /// Delay before retry number `attempt` (1-based), capped at
    /// [`MAX_BACKOFF_SECS`](defaults::MAX_BACKOFF_SECS).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 || self.backoff_factor.is_nan() || self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 1).min(16) as i32;
        let max = defaults::max_backoff();
        Duration::try_from_secs_f64(self.backoff_factor * 2f64.powi(exponent))
            .map_or(max, |delay| delay.min(max))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Service
// ─────────────────────────────────────────────────────────────────────────────

/// Serves quotes from cache when possible and from the source otherwise,
/// never calling the source more often than the admission controller allows.
///
/// Every attempt against the source, retries included, takes one admission
/// slot. Cache hits take none.
pub struct QuoteService<S> {
    source: S,
    limiter: RequestAdmissionController,
    cache: ExpiringCache<Quote>,
    retry: RetryPolicy,
    default_symbols: Vec<String>,
}

impl<S: QuoteSource> QuoteService<S> {
    /// Assemble a service from already-built parts.
    pub fn new(
        source: S,
        limiter: RequestAdmissionController,
        cache: ExpiringCache<Quote>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            source,
            limiter,
            cache,
            retry,
            default_symbols: defaults::DEFAULT_SYMBOLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Replace the symbols quoted by [`get_default_quotes`](Self::get_default_quotes).
    pub fn with_default_symbols(mut self, symbols: Vec<String>) -> Self {
        self.default_symbols = symbols;
        self
    }

    /// Build a service from a loaded configuration on the system clock.
    pub fn from_config(source: S, config: &QuotegateConfig) -> Self {
        Self::from_config_with_clock(source, config, system_clock())
    }

    /// Build a service from a loaded configuration with an explicit clock
    /// shared by the admission controller and the cache.
    pub fn from_config_with_clock(source: S, config: &QuotegateConfig, clock: SharedClock) -> Self {
        let limiter = RequestAdmissionController::with_clock(
            RateLimitConfig::from_provider(&config.rate_limit()),
            clock.clone(),
        );
        let cache = ExpiringCache::with_clock(CacheConfig::from_provider(&config.cache()), clock);

        let api = config.api();
        Self::new(source, limiter, cache, RetryPolicy::from_api(&api))
            .with_default_symbols(api.default_symbols)
    }

    /// Get a quote, from cache if a live entry exists.
    pub async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote> {
        let key = request.cache_key();

        if let Some(quote) = self.cache.get(&key) {
            debug!(
                symbol = request.symbol(),
                period = %request.period(),
                "Quote served from cache"
            );
            return Ok(quote);
        }

        let quote = self.fetch_with_retry(request).await?;
        self.cache.set(key, quote.clone());
        Ok(quote)
    }

    /// Validate `symbol` and get its quote.
    pub async fn get_quote_for(&self, symbol: &str, period: Period) -> Result<Quote> {
        let request = QuoteRequest::new(symbol, period)?;
        self.get_quote(&request).await
    }

    /// Get quotes for several requests in order. One failure does not stop
    /// the rest.
    pub async fn get_quotes(&self, requests: &[QuoteRequest]) -> Vec<Result<Quote>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.get_quote(request).await);
        }
        results
    }

    /// Requests for the configured default symbols.
    pub fn default_requests(&self, period: Period) -> Result<Vec<QuoteRequest>> {
        self.default_symbols
            .iter()
            .map(|symbol| QuoteRequest::new(symbol, period))
            .collect()
    }

    /// Get quotes for the configured default symbols, in order.
    ///
    /// A malformed default symbol yields an `InvalidSymbol` entry in its
    /// slot and does not stop the rest.
    pub async fn get_default_quotes(&self, period: Period) -> Vec<Result<Quote>> {
        let mut results = Vec::with_capacity(self.default_symbols.len());
        for symbol in &self.default_symbols {
            results.push(self.get_quote_for(symbol, period).await);
        }
        results
    }

    /// Fetch a fresh quote, ignoring any cached one, and cache the result.
    ///
    /// Still subject to admission control.
    pub async fn refresh(&self, request: &QuoteRequest) -> Result<Quote> {
        let quote = self.fetch_with_retry(request).await?;
        self.cache.set(request.cache_key(), quote.clone());
        debug!(symbol = request.symbol(), "Quote refreshed");
        Ok(quote)
    }

    /// Drop the admission history so requests are accepted immediately.
    pub fn force_unlock(&self) {
        warn!(
            dropped = self.limiter.request_count(),
            "Forcing rate limiter unlock"
        );
        self.limiter.clear_history();
    }

    /// Admission statistics.
    pub fn rate_limit_stats(&self) -> RateLimitStats {
        self.limiter.stats()
    }

    /// Cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.get_stats()
    }

    /// Remove every cached quote.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// The admission controller gating the source.
    pub fn limiter(&self) -> &RequestAdmissionController {
        &self.limiter
    }

    /// The quote cache.
    pub fn cache(&self) -> &ExpiringCache<Quote> {
        &self.cache
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The retry policy in effect.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    async fn fetch_with_retry(&self, request: &QuoteRequest) -> Result<Quote> {
        let mut attempt = 0;

        loop {
            self.limiter.try_acquire()?;

            let result =
                match tokio::time::timeout(self.retry.timeout, self.source.fetch_quote(request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(QuoteError::Timeout(self.retry.timeout)),
                };

            match result {
                Ok(quote) => {
                    debug!(
                        symbol = request.symbol(),
                        source = self.source.name(),
                        attempts = attempt + 1,
                        "Quote fetched"
                    );
                    return Ok(quote);
                }
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.backoff_delay(attempt);
                    warn!(
                        symbol = request.symbol(),
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient quote fetch failure, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => {
                    warn!(symbol = request.symbol(), error = %e, "Quote fetch failed");
                    return Err(e);
                }
            }
        }
    }
}

impl<S: QuoteSource> std::fmt::Debug for QuoteService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteService")
            .field("source", &self.source.name())
            .field("limiter", &self.limiter)
            .field("cache", &self.cache)
            .field("retry", &self.retry)
            .field("default_symbols", &self.default_symbols)
            .finish()
    }
}
