//! Quote and request types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use quotegate_cache::{Fingerprint, RequestFingerprint};
use serde::{Deserialize, Serialize};

use crate::error::{QuoteError, Result};

/// A price snapshot for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Exchange ticker, e.g. `MC.PA`.
    pub symbol: String,
    /// Last traded price.
    pub price: f64,
    /// Change since previous close, in percent.
    pub change_percent: f64,
    /// Traded volume for the session.
    pub volume: u64,
    /// When the quote was fetched from the source.
    pub fetched_at: DateTime<Utc>,
}

/// Lookback window requested alongside a quote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[default]
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "2Y")]
    TwoYears,
    #[serde(rename = "5Y")]
    FiveYears,
}

impl Period {
    /// Short code used in requests and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMonth => "1M",
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::OneYear => "1Y",
            Self::TwoYears => "2Y",
            Self::FiveYears => "5Y",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1M" => Ok(Self::OneMonth),
            "3M" => Ok(Self::ThreeMonths),
            "6M" => Ok(Self::SixMonths),
            "1Y" => Ok(Self::OneYear),
            "2Y" => Ok(Self::TwoYears),
            "5Y" => Ok(Self::FiveYears),
            _ => Err(QuoteError::InvalidPeriod(s.to_string())),
        }
    }
}

/// Identifying fields of a quote fetch.
///
/// Only built through [`QuoteRequest::new`], so the symbol is always
/// normalised.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QuoteRequest {
    symbol: String,
    period: Period,
}

impl QuoteRequest {
    /// Validate and normalise `symbol`, then build a request.
    pub fn new(symbol: &str, period: Period) -> Result<Self> {
        Ok(Self {
            symbol: validate_symbol(symbol)?,
            period,
        })
    }

    /// Normalised exchange ticker.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Lookback window.
    pub fn period(&self) -> Period {
        self.period
    }
}

impl Fingerprint for QuoteRequest {
    fn fingerprint(&self) -> RequestFingerprint {
        RequestFingerprint::new("quote")
            .arg(&self.symbol)
            .kwarg("period", self.period)
    }
}

/// Normalise a ticker (trim, uppercase) and check it looks like `MC.PA`:
/// two to four letters, a dot, and a two-letter exchange suffix.
pub fn validate_symbol(input: &str) -> Result<String> {
    let symbol = input.trim().to_ascii_uppercase();

    let valid = match symbol.split_once('.') {
        Some((ticker, exchange)) => {
            (2..=4).contains(&ticker.len())
                && exchange.len() == 2
                && ticker.bytes().all(|b| b.is_ascii_uppercase())
                && exchange.bytes().all(|b| b.is_ascii_uppercase())
        }
        None => false,
    };

    if valid {
        Ok(symbol)
    } else {
        Err(QuoteError::InvalidSymbol(input.trim().to_string()))
    }
}
