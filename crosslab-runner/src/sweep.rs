//! Parameter sweep over (short, long) SMA window pairs.
//!
//! Every pair runs the full pipeline against the same read-only price series.
//! Results are sorted by (short, long) so a parallel sweep and a sequential
//! sweep produce identical output.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crosslab_core::domain::PriceSeries;

use crate::config::BacktestConfig;
use crate::metrics::PerformanceSummary;
use crate::runner::{check_window, run_backtest, RunError};

/// Window pairs to sweep over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub short_windows: Vec<usize>,
    pub long_windows: Vec<usize>,
}

impl ParamGrid {
    pub fn new(short_windows: Vec<usize>, long_windows: Vec<usize>) -> Self {
        Self {
            short_windows,
            long_windows,
        }
    }

    /// Short windows 10, 20, 50 against long windows 100, 150, 200.
    pub fn ma_crossover_default() -> Self {
        Self::new(vec![10, 20, 50], vec![100, 150, 200])
    }

    /// Valid pairs in (short, long) order. Pairs with short >= long are skipped.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs: Vec<(usize, usize)> = self
            .short_windows
            .iter()
            .flat_map(|&s| self.long_windows.iter().map(move |&l| (s, l)))
            .filter(|&(s, l)| s > 0 && s < l)
            .collect();
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    pub fn size(&self) -> usize {
        self.pairs().len()
    }

    /// One config per valid pair, everything else taken from `base`.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        self.pairs()
            .into_iter()
            .map(|(s, l)| base.clone().with_windows(s, l))
            .collect()
    }
}

/// Outcome of one window pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub short_window: usize,
    pub long_window: usize,
    pub strategy: PerformanceSummary,
    pub buy_hold: PerformanceSummary,
    pub exposure: f64,
    pub crossovers: usize,
}

impl SweepEntry {
    pub fn excess_return(&self) -> f64 {
        self.strategy.total_return - self.buy_hold.total_return
    }
}

/// A pair the pipeline rejected, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub short_window: usize,
    pub long_window: usize,
    pub reason: String,
}

/// All entries from a sweep, sorted by (short, long).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepResults {
    pub ticker: String,
    pub entries: Vec<SweepEntry>,
    pub failures: Vec<SweepFailure>,
}

impl SweepResults {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, short_window: usize, long_window: usize) -> Option<&SweepEntry> {
        self.entries
            .binary_search_by_key(&(short_window, long_window), |e| {
                (e.short_window, e.long_window)
            })
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Entries sorted by strategy Sharpe, descending. Undefined Sharpe sorts last.
    pub fn sorted_by_sharpe(&self) -> Vec<&SweepEntry> {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by(|a, b| {
            let key = |e: &SweepEntry| e.strategy.sharpe_ratio.unwrap_or(f64::NEG_INFINITY);
            key(b)
                .partial_cmp(&key(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }

    pub fn best_by_sharpe(&self) -> Option<&SweepEntry> {
        self.sorted_by_sharpe()
            .into_iter()
            .find(|e| e.strategy.sharpe_ratio.is_some())
    }

    pub fn best_by_total_return(&self) -> Option<&SweepEntry> {
        self.entries.iter().max_by(|a, b| {
            a.strategy
                .total_return
                .partial_cmp(&b.strategy.total_return)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

/// Run every pair in `grid` against `prices`.
///
/// The base config and the price window are checked up front; per-pair pipeline errors (for
/// example a long window longer than the series) are recorded as failures
/// rather than aborting the sweep.
pub fn run_sweep(
    base: &BacktestConfig,
    prices: &PriceSeries,
    grid: &ParamGrid,
    parallel: bool,
) -> Result<SweepResults, RunError> {
    base.validate()?;
    check_window(base, prices)?;
    let configs = grid.generate_configs(base);
    info!(
        ticker = %base.ticker,
        pairs = configs.len(),
        parallel,
        "starting sweep"
    );

    let run_one = |config: &BacktestConfig| {
        let outcome = run_backtest(config, prices);
        (config.short_window, config.long_window, outcome)
    };

    let outcomes: Vec<_> = if parallel {
        configs.par_iter().map(run_one).collect()
    } else {
        configs.iter().map(run_one).collect()
    };

    let mut results = SweepResults {
        ticker: base.ticker.clone(),
        ..SweepResults::default()
    };
    for (short_window, long_window, outcome) in outcomes {
        match outcome {
            Ok(report) => results.entries.push(SweepEntry {
                short_window,
                long_window,
                strategy: report.strategy,
                buy_hold: report.buy_hold,
                exposure: report.exposure,
                crossovers: report.crossovers,
            }),
            Err(e) => {
                warn!(short_window, long_window, error = %e, "sweep pair failed");
                results.failures.push(SweepFailure {
                    short_window,
                    long_window,
                    reason: e.to_string(),
                });
            }
        }
    }
    // collect() keeps input order for both iterators; sort anyway so the
    // ordering does not depend on that.
    results
        .entries
        .sort_by_key(|e| (e.short_window, e.long_window));
    results
        .failures
        .sort_by_key(|f| (f.short_window, f.long_window));

    info!(
        ticker = %base.ticker,
        succeeded = results.entries.len(),
        failed = results.failures.len(),
        "sweep complete"
    );
    Ok(results)
}
