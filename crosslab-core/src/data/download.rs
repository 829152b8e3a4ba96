//! Download orchestrator: fills the CSV cache for a list of tickers.

use super::csv_cache::CsvCache;
use super::provider::{DataError, PriceSource};
use chrono::NaiveDate;
use tracing::{info, warn};

/// Fetch each ticker from `source` and write it to `cache`.
///
/// Tickers already covering `[start, end]` in the cache are skipped unless
/// `force` is set. Stops early once the source reports itself unavailable.
pub fn download_tickers(
    source: &dyn PriceSource,
    cache: &CsvCache,
    tickers: &[&str],
    start: NaiveDate,
    end: NaiveDate,
    force: bool,
) -> DownloadSummary {
    let total = tickers.len();
    let mut succeeded = 0;
    let mut skipped = 0;
    let mut errors: Vec<(String, DataError)> = Vec::new();

    for (i, ticker) in tickers.iter().enumerate() {
        if !force && cache.covers(ticker, start, end) {
            info!(ticker, "[{}/{}] cache already covers range", i + 1, total);
            skipped += 1;
            continue;
        }

        info!(ticker, source = source.name(), "[{}/{}] fetching", i + 1, total);
        match download_single(source, cache, ticker, start, end) {
            Ok(points) => {
                info!(ticker, points, "cached");
                succeeded += 1;
            }
            Err(e) => {
                warn!(ticker, error = %e, "download failed");
                errors.push((ticker.to_string(), e));
            }
        }

        if !source.is_available() {
            for rest in &tickers[(i + 1)..] {
                errors.push((
                    rest.to_string(),
                    DataError::Other(format!("{} is no longer available", source.name())),
                ));
            }
            break;
        }
    }

    DownloadSummary {
        total,
        succeeded,
        skipped,
        errors,
    }
}

fn download_single(
    source: &dyn PriceSource,
    cache: &CsvCache,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<usize, DataError> {
    let series = source.fetch(ticker, start, end)?;
    if series.is_empty() {
        return Err(DataError::SymbolNotFound {
            ticker: ticker.to_string(),
        });
    }
    cache.write_range(&series, start, end)?;
    Ok(series.len())
}

/// Summary of a batch download.
#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticProvider;
    use tempfile::TempDir;

    fn range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        )
    }

    #[test]
    fn fills_cache_then_skips() {
        let dir = TempDir::new().unwrap();
        let cache = CsvCache::new(dir.path());
        let source = SyntheticProvider::new();
        let (start, end) = range();

        let first = download_tickers(&source, &cache, &["SPY", "QQQ"], start, end, false);
        assert!(first.all_succeeded());
        assert_eq!(first.succeeded, 2);
        assert!(cache.contains("SPY") && cache.contains("QQQ"));

        let second = download_tickers(&source, &cache, &["SPY"], start, end, false);
        assert_eq!(second.skipped, 1);
        assert_eq!(second.succeeded, 0);

        let forced = download_tickers(&source, &cache, &["SPY"], start, end, true);
        assert_eq!(forced.succeeded, 1);
    }

    #[test]
    fn empty_range_is_reported() {
        let dir = TempDir::new().unwrap();
        let cache = CsvCache::new(dir.path());
        let sat = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let summary = download_tickers(&SyntheticProvider::new(), &cache, &["SPY"], sat, sat, false);
        assert!(!summary.all_succeeded());
        assert!(matches!(
            summary.errors[0].1,
            DataError::SymbolNotFound { .. }
        ));
    }
}
