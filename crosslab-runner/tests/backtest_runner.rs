//! End-to-end runs: cache on disk → loader → pipeline → report.
//!
//! Uses a linear price path (100, 101, ..., 159) whose crossover outcome is
//! known in closed form, so every headline number can be checked exactly.

use chrono::NaiveDate;
use crosslab_core::data::{CsvCache, DataSource, SyntheticProvider};
use crosslab_core::domain::{Position, PriceSeries};
use crosslab_runner::config::BacktestConfig;
use crosslab_runner::data_loader::{LoadError, LoadOptions};
use crosslab_runner::runner::{run_backtest, run_single_backtest, RunError};
use tempfile::TempDir;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn end() -> NaiveDate {
    // 60 consecutive days from Jan 1 in a leap year.
    NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
}

fn linear_closes() -> Vec<f64> {
    (0..60).map(|i| 100.0 + i as f64).collect()
}

fn linear_series() -> PriceSeries {
    PriceSeries::from_closes("LIN", start(), &linear_closes()).unwrap()
}

fn config() -> BacktestConfig {
    BacktestConfig::new("LIN", start(), end()).with_windows(5, 20)
}

fn opts() -> LoadOptions {
    LoadOptions {
        offline: true,
        ..LoadOptions::new(start(), end())
    }
}

#[test]
fn linear_rise_end_to_end_from_cache() {
    let dir = TempDir::new().unwrap();
    let cache = CsvCache::new(dir.path());
    cache.write(&linear_series()).unwrap();

    let report = run_single_backtest(&config(), &cache, None, &opts()).unwrap();

    assert_eq!(report.data_source, Some(DataSource::Cache));
    assert_eq!(report.prices.len(), 60);
    assert_eq!(report.positions.len(), 41);
    assert_eq!(report.positions[0].date, report.prices.points()[19].date);
    assert!(report
        .positions
        .iter()
        .all(|p| p.position == Position::Long));
    assert_eq!(report.crossovers, 0);

    // Long from the close of day 19: earns returns dated 20..=59.
    let expected_strategy = 159.0 / 119.0 - 1.0;
    let expected_buy_hold = 159.0 / 100.0 - 1.0;
    assert!((report.strategy.total_return - expected_strategy).abs() < 1e-9);
    assert!((report.buy_hold.total_return - expected_buy_hold).abs() < 1e-9);
    assert!(!report.strategy_outperformed());

    assert_eq!(report.strategy.number_of_days, 59);
    assert_eq!(report.buy_hold.number_of_days, 59);
    assert_eq!(report.strategy.max_drawdown, 0.0);
    assert_eq!(report.buy_hold.max_drawdown, 0.0);
    assert!((report.exposure - 40.0 / 59.0).abs() < 1e-12);
}

#[test]
fn cached_run_matches_in_memory_run() {
    let dir = TempDir::new().unwrap();
    let cache = CsvCache::new(dir.path());
    cache.write(&linear_series()).unwrap();

    let from_cache = run_single_backtest(&config(), &cache, None, &opts()).unwrap();
    let mut direct = run_backtest(&config(), &linear_series()).unwrap();
    direct.data_source = from_cache.data_source;
    assert_eq!(from_cache, direct);
}

#[test]
fn repeated_runs_are_bit_identical() {
    let a = run_backtest(&config(), &linear_series()).unwrap();
    let b = run_backtest(&config(), &linear_series()).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        a.strategy.total_return.to_bits(),
        b.strategy.total_return.to_bits()
    );
    assert_eq!(a.run_id, b.run_id);
    assert_eq!(a.dataset_hash, b.dataset_hash);
}

#[test]
fn synthetic_run_is_tagged_and_reproducible() {
    let dir = TempDir::new().unwrap();
    let cache = CsvCache::new(dir.path());
    let config = BacktestConfig::new(
        "SYN",
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
    )
    .with_windows(10, 50);
    let opts = LoadOptions {
        offline: true,
        synthetic: true,
        ..LoadOptions::new(config.start_date, config.end_date)
    };

    let a = run_single_backtest(&config, &cache, None, &opts).unwrap();
    let b = run_single_backtest(&config, &cache, None, &opts).unwrap();
    assert!(a.is_synthetic());
    assert_eq!(a, b);

    // Same series the provider generates on its own.
    let direct = SyntheticProvider::new().generate("SYN", config.start_date, config.end_date);
    assert_eq!(a.prices.points(), direct.as_slice());
}

#[test]
fn offline_without_cache_is_a_data_error() {
    let dir = TempDir::new().unwrap();
    let cache = CsvCache::new(dir.path());
    let err = run_single_backtest(&config(), &cache, None, &opts()).unwrap_err();
    assert!(matches!(
        err,
        RunError::Data(LoadError::NoCachedDataOffline { .. })
    ));
}

#[test]
fn invalid_config_fails_before_loading() {
    let dir = TempDir::new().unwrap();
    let cache = CsvCache::new(dir.path());
    let bad = config().with_windows(20, 5);
    let err = run_single_backtest(&bad, &cache, None, &opts()).unwrap_err();
    assert!(matches!(err, RunError::Config(_)));
}

#[test]
fn config_file_drives_a_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("crosslab.toml");
    std::fs::write(
        &path,
        r#"
[backtest]
ticker = "lin"
start_date = "2024-01-01"
end_date = "2024-02-29"
short_window = 5
long_window = 20
"#,
    )
    .unwrap();

    let from_file = BacktestConfig::from_file(&path).unwrap();
    assert_eq!(from_file, config());

    let report = run_backtest(&from_file, &linear_series()).unwrap();
    assert!((report.strategy.total_return - (159.0 / 119.0 - 1.0)).abs() < 1e-9);
}
