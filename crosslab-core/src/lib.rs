//! CrossLab Core: price series, moving averages, crossover signals, lagged
//! position simulation, and equity curves.
//!
//! This crate contains the deterministic heart of the backtester:
//! - Domain types (price points, validated price series, positions)
//! - Simple moving averages with explicit warm-up (`None`) entries
//! - Golden/death cross signal generation with persisted state
//! - Strategy simulation under the one-day lag rule
//! - Equity curve compounding for the strategy and buy-and-hold
//! - Price sources (Yahoo Finance, CSV cache, synthetic) behind one trait
//!
//! Everything except the price sources is a pure function of its inputs.

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod signal;

pub use error::BacktestError;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the runner shares across sweep threads
    /// is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::PositionPoint>();
        require_sync::<domain::PositionPoint>();
        require_send::<indicators::SmaSeries>();
        require_sync::<indicators::SmaSeries>();
        require_send::<engine::EquityCurve>();
        require_sync::<engine::EquityCurve>();
        require_send::<engine::SimulatedReturns>();
        require_sync::<engine::SimulatedReturns>();
        require_send::<BacktestError>();
        require_sync::<BacktestError>();

        require_send::<data::CsvCache>();
        require_sync::<data::CsvCache>();
        require_send::<data::SyntheticProvider>();
        require_sync::<data::SyntheticProvider>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
    }

    /// Architecture contract: the signal generator sees only the two SMA
    /// series, never prices or returns, so it cannot peek at future data
    /// through anything but the averages themselves.
    #[test]
    fn signal_generator_takes_only_averages() {
        fn _check_signature(
            short: &indicators::SmaSeries,
            long: &indicators::SmaSeries,
        ) -> Result<Vec<domain::PositionPoint>, BacktestError> {
            signal::generate_positions(short, long)
        }
    }

    /// The price sources are usable as trait objects.
    #[test]
    fn price_source_is_object_safe() {
        let sources: Vec<Box<dyn data::PriceSource>> = vec![
            Box::new(data::SyntheticProvider::new()),
            Box::new(data::CsvCache::new(std::env::temp_dir())),
        ];
        let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["synthetic", "csv_cache"]);
    }
}
