//! Plain-text reports for the terminal.
//!
//! - `render_summary`: both performance summaries side by side plus a verdict
//! - `render_sweep_table`: one row per window pair from a sweep

use serde::{Deserialize, Serialize};

use crate::metrics::PerformanceSummary;
use crate::runner::BacktestReport;
use crate::sweep::SweepResults;

/// Which side won a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Strategy,
    BuyAndHold,
    Tie,
}

impl Winner {
    fn compare(strategy: f64, buy_hold: f64) -> Self {
        if strategy > buy_hold {
            Winner::Strategy
        } else if buy_hold > strategy {
            Winner::BuyAndHold
        } else {
            Winner::Tie
        }
    }
}

/// Head-to-head outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub total_return: Winner,
    /// `None` when either Sharpe ratio is undefined.
    pub sharpe_ratio: Option<Winner>,
}

pub fn verdict(report: &BacktestReport) -> Verdict {
    let (s, b) = (&report.strategy, &report.buy_hold);
    Verdict {
        total_return: Winner::compare(s.total_return, b.total_return),
        sharpe_ratio: match (s.sharpe_ratio, b.sharpe_ratio) {
            (Some(s), Some(b)) => Some(Winner::compare(s, b)),
            _ => None,
        },
    }
}

const STRATEGY_LABEL: &str = "SMA Crossover";
const BUY_HOLD_LABEL: &str = "Buy & Hold";

fn pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

fn ratio(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |s| format!("{s:.2}"))
}

fn label(w: Winner) -> &'static str {
    match w {
        Winner::Strategy => STRATEGY_LABEL,
        Winner::BuyAndHold => BUY_HOLD_LABEL,
        Winner::Tie => "tie",
    }
}

/// Text table of both summaries followed by the verdict.
pub fn render_summary(report: &BacktestReport) -> String {
    let cfg = &report.config;
    let (s, b) = (&report.strategy, &report.buy_hold);
    let mut out = String::with_capacity(1024);

    out.push_str(&format!(
        "{}  {} to {}  SMA {}/{}",
        cfg.ticker, cfg.start_date, cfg.end_date, cfg.short_window, cfg.long_window
    ));
    if report.is_synthetic() {
        out.push_str("  [SYNTHETIC DATA]");
    }
    out.push('\n');
    out.push_str(&format!(
        "Prices: {}   Crossovers: {}   Exposure: {}\n\n",
        report.prices.len(),
        report.crossovers,
        pct(report.exposure)
    ));

    out.push_str(&format!(
        "{:<24}{:>16}{:>16}\n",
        "Metric", STRATEGY_LABEL, BUY_HOLD_LABEL
    ));
    out.push_str(&format!("{}\n", "-".repeat(56)));
    let rows: [(&str, fn(&PerformanceSummary) -> String); 6] = [
        ("Total Return", |m| pct(m.total_return)),
        ("Annualized Return", |m| pct(m.annualized_return)),
        ("Annualized Volatility", |m| pct(m.annualized_volatility)),
        ("Sharpe Ratio", |m| ratio(m.sharpe_ratio)),
        ("Max Drawdown", |m| pct(m.max_drawdown)),
        ("Number Of Days", |m| m.number_of_days.to_string()),
    ];
    for (name, fmt) in rows {
        out.push_str(&format!("{:<24}{:>16}{:>16}\n", name, fmt(s), fmt(b)));
    }
    out.push('\n');

    let v = verdict(report);
    match v.total_return {
        Winner::Tie => out.push_str(&format!(
            "Total return: tie ({})\n",
            pct(s.total_return)
        )),
        w => out.push_str(&format!(
            "Total return: {} wins ({} vs {})\n",
            label(w),
            pct(s.total_return),
            pct(b.total_return)
        )),
    }
    match v.sharpe_ratio {
        None => out.push_str("Sharpe ratio: not comparable (zero volatility)\n"),
        Some(Winner::Tie) => out.push_str(&format!(
            "Sharpe ratio: tie ({})\n",
            ratio(s.sharpe_ratio)
        )),
        Some(w) => out.push_str(&format!(
            "Sharpe ratio: {} wins ({} vs {})\n",
            label(w),
            ratio(s.sharpe_ratio),
            ratio(b.sharpe_ratio)
        )),
    }

    out
}

/// One row per window pair, sorted by (short, long).
pub fn render_sweep_table(results: &SweepResults) -> String {
    let mut out = String::with_capacity(128 + results.len() * 80);
    out.push_str(&format!(
        "{:>6}{:>6}{:>12}{:>12}{:>10}{:>10}{:>8}\n",
        "short", "long", "return", "excess", "sharpe", "max_dd", "xovers"
    ));
    for e in &results.entries {
        out.push_str(&format!(
            "{:>6}{:>6}{:>12}{:>12}{:>10}{:>10}{:>8}\n",
            e.short_window,
            e.long_window,
            pct(e.strategy.total_return),
            pct(e.excess_return()),
            ratio(e.strategy.sharpe_ratio),
            pct(e.strategy.max_drawdown),
            e.crossovers
        ));
    }
    for f in &results.failures {
        out.push_str(&format!(
            "{:>6}{:>6}  skipped: {}\n",
            f.short_window, f.long_window, f.reason
        ));
    }
    if let Some(best) = results.best_by_sharpe() {
        out.push_str(&format!(
            "\nBest Sharpe: SMA {}/{} ({})\n",
            best.short_window,
            best.long_window,
            ratio(best.strategy.sharpe_ratio)
        ));
    }
    out
}
