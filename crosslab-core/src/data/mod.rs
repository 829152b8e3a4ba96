//! Price sources: Yahoo Finance, the CSV cache, and a synthetic walk.

pub mod csv_cache;
pub mod download;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use csv_cache::CsvCache;
pub use download::{download_tickers, DownloadSummary};
pub use provider::{DataError, DataSource, PriceSource};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
