//! CSV price cache.
//!
//! Layout:
//! ```text
//! {cache_dir}/
//!   SPY.csv          # date,adj_close
//!   SPY.meta.json    # CacheMeta: the calendar range the file is complete for
//! ```
//!
//! Writes merge with what is already cached and are atomic: write to `.tmp`,
//! then rename into place. Loading runs the rows through `PriceSeries`
//! validation, so a hand-edited file with duplicate or out-of-order dates is
//! rejected rather than repaired.

use super::provider::{DataError, DataSource, PriceSource};
use crate::domain::{PricePoint, PriceSeries};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Serialize, Deserialize)]
struct CacheRow {
    date: NaiveDate,
    adj_close: f64,
}

/// Sidecar metadata for one cached ticker.
///
/// `start_date..=end_date` is the requested calendar range the file is known
/// to be complete for, which usually extends past the first and last trading
/// days actually stored (weekends, holidays, today).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub point_count: usize,
    pub data_hash: String,
    pub cached_at: chrono::NaiveDateTime,
}

/// Directory of per-ticker CSV files.
#[derive(Debug, Clone)]
pub struct CsvCache {
    cache_dir: PathBuf,
}

impl CsvCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// `{cache_dir}/{TICKER}.csv`
    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.csv", ticker.to_ascii_uppercase()))
    }

    /// `{cache_dir}/{TICKER}.meta.json`
    fn meta_path(&self, ticker: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.meta.json", ticker.to_ascii_uppercase()))
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.path_for(ticker).is_file()
    }

    /// Load the full cached series for a ticker.
    pub fn load(&self, ticker: &str) -> Result<PriceSeries, DataError> {
        let path = self.path_for(ticker);
        if !path.is_file() {
            return Err(DataError::NoCachedData {
                ticker: ticker.to_string(),
            });
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut points = Vec::new();
        for row in reader.deserialize() {
            let row: CacheRow = row?;
            points.push(PricePoint::new(row.date, row.adj_close));
        }
        if points.is_empty() {
            return Err(DataError::NoCachedData {
                ticker: ticker.to_string(),
            });
        }

        Ok(PriceSeries::new(ticker, points)?)
    }

    /// Metadata sidecar, if present and readable.
    pub fn get_meta(&self, ticker: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(ticker)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Cache a series that was fetched for exactly its own date span.
    pub fn write(&self, series: &PriceSeries) -> Result<PathBuf, DataError> {
        match (series.first_date(), series.last_date()) {
            (Some(first), Some(last)) => self.write_range(series, first, last),
            _ => Err(DataError::Other(format!(
                "refusing to cache an empty series for {}",
                series.ticker()
            ))),
        }
    }

    /// Cache a series fetched for the inclusive range `[start, end]`.
    ///
    /// The new points replace whatever was cached inside `[start, end]`;
    /// cached points outside it are kept. The recorded coverage grows to the
    /// union of the old and new ranges when they touch, otherwise it becomes
    /// `[start, end]`.
    pub fn write_range(
        &self,
        series: &PriceSeries,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PathBuf, DataError> {
        if series.is_empty() {
            return Err(DataError::Other(format!(
                "refusing to cache an empty series for {}",
                series.ticker()
            )));
        }
        fs::create_dir_all(&self.cache_dir)?;
        let ticker = series.ticker();

        let (mut merged, previous) = match self.load(ticker) {
            Ok(existing) => {
                let previous = self.get_meta(ticker).map(|m| (m.start_date, m.end_date)).or(
                    match (existing.first_date(), existing.last_date()) {
                        (Some(first), Some(last)) => Some((first, last)),
                        _ => None,
                    },
                );
                let by_date: BTreeMap<NaiveDate, f64> = existing
                    .points()
                    .iter()
                    .map(|p| (p.date, p.adjusted_close))
                    .collect();
                (by_date, previous)
            }
            Err(DataError::NoCachedData { .. }) => (BTreeMap::new(), None),
            Err(e) => {
                warn!(ticker, error = %e, "replacing unreadable cache file");
                (BTreeMap::new(), None)
            }
        };

        merged.retain(|date, _| *date < start || *date > end);
        for p in series.points() {
            merged.insert(p.date, p.adjusted_close);
        }
        let merged = PriceSeries::new(
            ticker,
            merged
                .into_iter()
                .map(|(date, close)| PricePoint::new(date, close))
                .collect(),
        )?;

        let day = chrono::Duration::days(1);
        let (covered_start, covered_end) = match previous {
            Some((old_start, old_end)) if old_start <= end + day && start <= old_end + day => {
                (old_start.min(start), old_end.max(end))
            }
            _ => (start, end),
        };

        let path = self.path_for(ticker);
        let tmp = path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp)?;
            for point in merged.points() {
                writer.serialize(CacheRow {
                    date: point.date,
                    adj_close: point.adjusted_close,
                })?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &path)?;

        let meta = CacheMeta {
            ticker: ticker.to_ascii_uppercase(),
            start_date: covered_start,
            end_date: covered_end,
            point_count: merged.len(),
            data_hash: merged.content_hash(),
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_path = self.meta_path(ticker);
        let meta_tmp = meta_path.with_extension("json.tmp");
        fs::write(&meta_tmp, serde_json::to_string_pretty(&meta)?)?;
        fs::rename(&meta_tmp, &meta_path)?;

        Ok(path)
    }

    /// True when the cache is complete for `[start, end]`.
    ///
    /// Uses the recorded request range when a sidecar exists; a bare CSV
    /// file only covers its first to last stored date.
    pub fn covers(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> bool {
        if !self.contains(ticker) {
            return false;
        }
        let range = match self.get_meta(ticker) {
            Some(meta) => Some((meta.start_date, meta.end_date)),
            None => self
                .load(ticker)
                .ok()
                .and_then(|s| Some((s.first_date()?, s.last_date()?))),
        };
        matches!(range, Some((first, last)) if first <= start && last >= end)
    }
}

impl PriceSource for CsvCache {
    fn name(&self) -> &str {
        "csv_cache"
    }

    fn source(&self) -> DataSource {
        DataSource::Cache
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        Ok(self.load(ticker)?.slice(start, end))
    }
}
