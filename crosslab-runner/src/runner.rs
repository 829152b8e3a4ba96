//! Backtest runner: wires together the SMA pair, signals, simulator,
//! equity curves and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads prices through the fallback policy, then runs. Used by CLI.
//! - `run_backtest()`: takes an already-loaded series, no I/O. Used by sweeps and tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crosslab_core::data::{CsvCache, DataSource, PriceSource};
use crosslab_core::domain::{PositionPoint, PriceSeries};
use crosslab_core::engine::{simulate_strategy, EquityCurve};
use crosslab_core::indicators::{Sma, SmaSeries};
use crosslab_core::signal::{crossover_count, generate_positions};
use crosslab_core::BacktestError;

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_prices, LoadError, LoadOptions};
use crate::metrics::{evaluate, EvaluationParams, PerformanceSummary};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("backtest error: {0}")]
    Backtest(#[from] BacktestError),
    #[error("prices span {first} to {last}, outside the configured window {start} to {end}")]
    OutsideWindow {
        first: NaiveDate,
        last: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Complete result of a single backtest run: both curves, both summaries,
/// and the intermediate series needed to chart them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub prices: PriceSeries,
    pub short_sma: SmaSeries,
    pub long_sma: SmaSeries,
    pub positions: Vec<PositionPoint>,
    pub strategy_curve: EquityCurve,
    pub buy_hold_curve: EquityCurve,
    pub strategy: PerformanceSummary,
    pub buy_hold: PerformanceSummary,
    /// Fraction of return days the strategy held Long.
    pub exposure: f64,
    pub crossovers: usize,
    pub dataset_hash: String,
    /// `None` when prices were passed in directly.
    pub data_source: Option<DataSource>,
}

impl BacktestReport {
    pub fn ticker(&self) -> &str {
        &self.config.ticker
    }

    pub fn is_synthetic(&self) -> bool {
        self.data_source == Some(DataSource::Synthetic)
    }

    /// True when the strategy beat buy-and-hold on total return.
    pub fn strategy_outperformed(&self) -> bool {
        self.strategy.total_return > self.buy_hold.total_return
    }
}

/// Run a backtest from a config, loading prices through the cache/provider/synthetic policy.
pub fn run_single_backtest(
    config: &BacktestConfig,
    cache: &CsvCache,
    provider: Option<&dyn PriceSource>,
    opts: &LoadOptions,
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let loaded = load_prices(&config.ticker, cache, provider, opts)?;
    let mut report = run_backtest(config, &loaded.series)?;
    report.data_source = Some(loaded.source);
    Ok(report)
}

/// Reject a series with any price outside `[start_date, end_date]`.
pub(crate) fn check_window(config: &BacktestConfig, prices: &PriceSeries) -> Result<(), RunError> {
    if let (Some(first), Some(last)) = (prices.first_date(), prices.last_date()) {
        if first < config.start_date || last > config.end_date {
            return Err(RunError::OutsideWindow {
                first,
                last,
                start: config.start_date,
                end: config.end_date,
            });
        }
    }
    Ok(())
}

/// Run the full pipeline on an already-loaded series. No I/O.
///
/// Stages run in order, each consuming the previous stage's output:
/// SMA pair → positions → lagged strategy returns → both equity curves →
/// both summaries. The first stage to observe a violation stops the run.
pub fn run_backtest(
    config: &BacktestConfig,
    prices: &PriceSeries,
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    check_window(config, prices)?;
    let run_id = config.run_id()?;

    // One point past the long window so at least one lagged return exists.
    let required = config.long_window + 1;
    if prices.len() < required {
        return Err(BacktestError::InsufficientData {
            context: "SMA crossover backtest",
            required,
            available: prices.len(),
        }
        .into());
    }

    let short_sma = Sma::new(config.short_window)?.compute(prices)?;
    let long_sma = Sma::new(config.long_window)?.compute(prices)?;
    let positions = generate_positions(&short_sma, &long_sma)?;
    debug!(
        ticker = %config.ticker,
        positions = positions.len(),
        crossovers = crossover_count(&positions),
        "signals generated"
    );

    let market = prices.daily_returns();
    let simulated = simulate_strategy(&positions, &market)?;

    let anchor = prices.first_date().ok_or(BacktestError::InsufficientData {
        context: "equity curve",
        required: 1,
        available: 0,
    })?;
    let strategy_curve = EquityCurve::build(anchor, &simulated.returns, config.initial_capital)?;
    let buy_hold_curve = EquityCurve::buy_and_hold(prices, config.initial_capital)?;
    if !strategy_curve.shares_index_with(&buy_hold_curve) {
        return Err(BacktestError::gap(
            0,
            "strategy and buy-and-hold curves do not share a date index",
        )
        .into());
    }

    let params = EvaluationParams {
        annualization_factor: config.annualization_factor,
        risk_free_rate: config.risk_free_rate,
    };
    let strategy = evaluate(&strategy_curve, &params)?;
    let buy_hold = evaluate(&buy_hold_curve, &params)?;

    info!(
        ticker = %config.ticker,
        short = config.short_window,
        long = config.long_window,
        strategy_return = strategy.total_return,
        buy_hold_return = buy_hold.total_return,
        "backtest complete"
    );

    Ok(BacktestReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        dataset_hash: prices.content_hash(),
        prices: prices.clone(),
        crossovers: crossover_count(&positions),
        short_sma,
        long_sma,
        positions,
        strategy_curve,
        buy_hold_curve,
        strategy,
        buy_hold,
        exposure: simulated.exposure,
        data_source: None,
    })
}
