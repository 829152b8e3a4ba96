//! Price loading and data resolution for the runner.
//!
//! Given a ticker and date range, returns a validated price series. Implements
//! the fallback policy:
//! 1. If cached data covers the range → use it
//! 2. If not cached and a provider is available → download and merge into the cache
//! 3. If no data and `synthetic` is set → generate a synthetic walk (tagged)
//! 4. Otherwise → fail with a clear error
//!
//! Whatever the source, the series is sliced to `[start, end]` inclusive.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use crosslab_core::data::{CsvCache, DataError, DataSource, PriceSource, SyntheticProvider};
use crosslab_core::domain::PriceSeries;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "no cached data for '{ticker}' and no network access (use --synthetic for synthetic data)"
    )]
    NoCachedDataOffline { ticker: String },

    #[error("no cached data for '{ticker}' and download failed: {reason}")]
    DownloadFailed { ticker: String, reason: String },

    #[error("no prices for '{ticker}' between {start} and {end}")]
    EmptyRange {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Options controlling how prices are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Inclusive.
    pub start: NaiveDate,
    /// Inclusive.
    pub end: NaiveDate,
    /// If true, never make network requests.
    pub offline: bool,
    /// If true, generate synthetic prices when real data is unavailable.
    pub synthetic: bool,
    /// Force re-download even if cached.
    pub force: bool,
}

impl LoadOptions {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            offline: false,
            synthetic: false,
            force: false,
        }
    }
}

/// A loaded series and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedPrices {
    pub series: PriceSeries,
    pub source: DataSource,
    /// BLAKE3 over the series, for reproducibility records.
    pub dataset_hash: String,
}

impl LoadedPrices {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Load prices for one ticker from the cache, with fallback to download or synthetic.
pub fn load_prices(
    ticker: &str,
    cache: &CsvCache,
    provider: Option<&dyn PriceSource>,
    opts: &LoadOptions,
) -> Result<LoadedPrices, LoadError> {
    let (series, source) = resolve(ticker, cache, provider, opts)?;
    let series = series.slice(opts.start, opts.end);
    if series.is_empty() {
        return Err(LoadError::EmptyRange {
            ticker: ticker.to_string(),
            start: opts.start,
            end: opts.end,
        });
    }

    info!(
        ticker,
        %source,
        points = series.len(),
        "loaded prices"
    );
    let dataset_hash = series.content_hash();
    Ok(LoadedPrices {
        series,
        source,
        dataset_hash,
    })
}

fn resolve(
    ticker: &str,
    cache: &CsvCache,
    provider: Option<&dyn PriceSource>,
    opts: &LoadOptions,
) -> Result<(PriceSeries, DataSource), LoadError> {
    // Step 1: cache
    if !opts.force && cache.covers(ticker, opts.start, opts.end) {
        return Ok((cache.load(ticker)?, DataSource::Cache));
    }

    // Step 2: download
    let mut failure = None;
    if !opts.offline {
        if let Some(prov) = provider.filter(|p| p.is_available()) {
            info!(ticker, provider = prov.name(), "fetching prices");
            match prov.fetch(ticker, opts.start, opts.end) {
                Ok(series) if !series.is_empty() => {
                    let path = cache.write_range(&series, opts.start, opts.end)?;
                    info!(ticker, path = %path.display(), "cached prices");
                    return Ok((series, prov.source()));
                }
                Ok(_) => failure = Some("provider returned no prices".to_string()),
                Err(e) => {
                    warn!(ticker, error = %e, "download failed");
                    failure = Some(e.to_string());
                }
            }
        }
    }

    // A partial cache is better than nothing when the download failed.
    if !opts.force {
        if let Ok(series) = cache.load(ticker) {
            warn!(ticker, "using cached prices that do not cover the full range");
            return Ok((series, DataSource::Cache));
        }
    }

    // Step 3: synthetic
    if opts.synthetic {
        warn!(
            ticker,
            "generating synthetic data; results will be tagged as synthetic"
        );
        let series = SyntheticProvider::new().fetch(ticker, opts.start, opts.end)?;
        return Ok((series, DataSource::Synthetic));
    }

    // Step 4: fail
    match failure {
        Some(reason) => Err(LoadError::DownloadFailed {
            ticker: ticker.to_string(),
            reason,
        }),
        None if opts.offline || provider.is_none() => Err(LoadError::NoCachedDataOffline {
            ticker: ticker.to_string(),
        }),
        None => Err(LoadError::DownloadFailed {
            ticker: ticker.to_string(),
            reason: "provider unavailable".into(),
        }),
    }
}
