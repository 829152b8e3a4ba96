//! Price source trait and structured error types.
//!
//! The PriceSource trait abstracts over where adjusted closes come from
//! (Yahoo Finance, the CSV cache, a synthetic walk) so the runner can swap
//! implementations and tests can run offline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PriceSeries;
use crate::error::BacktestError;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {ticker}")]
    SymbolNotFound { ticker: String },

    #[error("no cached data for '{ticker}' (run `crosslab download {ticker}` first)")]
    NoCachedData { ticker: String },

    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("cache metadata error: {0}")]
    Meta(#[from] serde_json::Error),

    #[error("invalid price series: {0}")]
    InvalidSeries(#[from] BacktestError),

    #[error("data error: {0}")]
    Other(String),
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    Cache,
    Synthetic,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::YahooFinance => write!(f, "yahoo"),
            DataSource::Cache => write!(f, "cache"),
            DataSource::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Anything that can produce daily adjusted closes for a ticker.
///
/// Implementations return a validated series covering at most
/// `[start, end]` (both inclusive). They don't know about each other;
/// the fallback order lives in the runner.
pub trait PriceSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Which kind of source this is, recorded alongside results.
    fn source(&self) -> DataSource;

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError>;

    /// False when the source is known to be unusable right now.
    fn is_available(&self) -> bool {
        true
    }
}
