//! Artifact export: JSON, CSV, and the per-run artifact bundle.
//!
//! - **JSON**: full round-trip serialization of a `BacktestReport` with schema versioning
//! - **CSV**: date-aligned curves for charting, and sweep results
//! - **Bundle**: `manifest.json`, `curves.csv` and `summary.txt` in one directory
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::config::is_valid_ticker;
use crate::report::render_summary;
use crate::runner::{BacktestReport, SCHEMA_VERSION};
use crate::sweep::SweepResults;

/// Run-id characters used in artifact directory names.
const RUN_ID_PREFIX_LEN: usize = 12;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestReport` to pretty JSON.
pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a `BacktestReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.6}")).unwrap_or_default()
}

/// Export every series of a run on the shared price index.
///
/// Columns: date, price, short_sma, long_sma, position, event,
/// strategy_value, buy_hold_value. SMA cells are empty during warm-up;
/// position and event cells are empty before the long SMA is defined.
pub fn export_curves_csv(report: &BacktestReport) -> Result<String> {
    let prices = report.prices.points();
    let n = prices.len();
    if report.short_sma.len() != n
        || report.long_sma.len() != n
        || report.strategy_curve.len() != n
        || report.buy_hold_curve.len() != n
        || report.positions.len() > n
    {
        bail!("report series are not aligned to the price index ({n} prices)");
    }
    let offset = n - report.positions.len();

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "price",
        "short_sma",
        "long_sma",
        "position",
        "event",
        "strategy_value",
        "buy_hold_value",
    ])?;

    for (i, p) in prices.iter().enumerate() {
        let signal = i.checked_sub(offset).map(|j| &report.positions[j]);
        wtr.write_record([
            &p.date.to_string(),
            &format!("{:.6}", p.adjusted_close),
            &opt(report.short_sma.value_at(i)),
            &opt(report.long_sma.value_at(i)),
            &signal.map(|s| s.position.to_string()).unwrap_or_default(),
            &signal
                .and_then(|s| s.crossover)
                .map(|c| c.to_string())
                .unwrap_or_default(),
            &format!("{:.6}", report.strategy_curve.points[i].value),
            &format!("{:.6}", report.buy_hold_curve.points[i].value),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export sweep entries as CSV, one row per window pair.
pub fn export_sweep_csv(results: &SweepResults) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "ticker",
        "short_window",
        "long_window",
        "total_return",
        "annualized_return",
        "annualized_volatility",
        "sharpe_ratio",
        "max_drawdown",
        "buy_hold_total_return",
        "buy_hold_sharpe_ratio",
        "exposure",
        "crossovers",
    ])?;
    for e in &results.entries {
        let s = &e.strategy;
        wtr.write_record([
            &results.ticker,
            &e.short_window.to_string(),
            &e.long_window.to_string(),
            &format!("{:.6}", s.total_return),
            &format!("{:.6}", s.annualized_return),
            &format!("{:.6}", s.annualized_volatility),
            &opt(s.sharpe_ratio),
            &format!("{:.6}", s.max_drawdown),
            &format!("{:.6}", e.buy_hold.total_return),
            &opt(e.buy_hold.sharpe_ratio),
            &format!("{:.4}", e.exposure),
            &e.crossovers.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Directory name for a run's artifacts: `{TICKER}_{run id prefix}`.
pub fn artifact_dir_name(report: &BacktestReport) -> String {
    let prefix: String = report.run_id.chars().take(RUN_ID_PREFIX_LEN).collect();
    format!("{}_{}", report.ticker(), prefix)
}

/// Save the full artifact set for a single backtest run.
///
/// Creates `{TICKER}_{run id prefix}/` under `output_dir` containing:
/// - `manifest.json`: the full `BacktestReport`
/// - `curves.csv`: prices, both SMAs, positions and both equity curves
/// - `summary.txt`: the rendered text summary
///
/// Re-running an identical config overwrites the same directory.
/// Returns the path to the directory.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    if !is_valid_ticker(report.ticker()) {
        bail!("refusing to name an artifact directory after ticker '{}'", report.ticker());
    }
    let run_dir = output_dir.join(artifact_dir_name(report));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(report)?;
    std::fs::write(run_dir.join("manifest.json"), json)?;

    let curves = export_curves_csv(report)?;
    std::fs::write(run_dir.join("curves.csv"), curves)?;

    std::fs::write(run_dir.join("summary.txt"), render_summary(report))?;

    Ok(run_dir)
}

/// Load a `BacktestReport` from an artifact directory's manifest.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestReport> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}
