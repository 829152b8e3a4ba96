//! CrossLab Runner: backtest orchestration, metrics, sweeps, reports.
//!
//! This crate builds on `crosslab-core` to provide:
//! - Configuration loading (TOML) and validation
//! - Data loading with cache/download/synthetic fallback
//! - Single-backtest runner producing a `BacktestReport`
//! - Performance evaluation for both equity curves
//! - Parallel (short, long) window sweeps
//! - Text summaries and JSON/CSV artifacts

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod sweep;

pub use config::{is_valid_ticker, BacktestConfig, ConfigError, RunId};
pub use data_loader::{load_prices, LoadError, LoadOptions, LoadedPrices};
pub use export::{
    export_curves_csv, export_json, export_sweep_csv, import_json, load_artifacts,
    save_artifacts,
};
pub use metrics::{evaluate, EvaluationParams, PerformanceSummary};
pub use report::{render_summary, render_sweep_table, verdict, Verdict, Winner};
pub use runner::{run_backtest, run_single_backtest, BacktestReport, RunError, SCHEMA_VERSION};
pub use sweep::{run_sweep, ParamGrid, SweepEntry, SweepFailure, SweepResults};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn performance_summary_is_send_sync() {
        assert_send::<PerformanceSummary>();
        assert_sync::<PerformanceSummary>();
    }

    #[test]
    fn backtest_report_is_send_sync() {
        assert_send::<BacktestReport>();
        assert_sync::<BacktestReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }

    #[test]
    fn sweep_types_are_send_sync() {
        assert_send::<ParamGrid>();
        assert_sync::<ParamGrid>();
        assert_send::<SweepResults>();
        assert_sync::<SweepResults>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
