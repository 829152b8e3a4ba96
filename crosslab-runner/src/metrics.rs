//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity values and/or daily returns in,
//! scalar out. [`evaluate`] bundles them into a [`PerformanceSummary`] for one
//! equity curve.

use serde::{Deserialize, Serialize};

use crosslab_core::engine::EquityCurve;
use crosslab_core::BacktestError;

/// Daily standard deviations below this count as zero volatility.
pub const VOLATILITY_FLOOR: f64 = 1e-12;

/// Summary statistics for one equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    /// `None` when volatility is zero.
    pub sharpe_ratio: Option<f64>,
    /// Non-positive fraction, e.g. -0.15 for a 15% drawdown.
    pub max_drawdown: f64,
    /// Number of daily return observations.
    pub number_of_days: usize,
}

/// Annualization and risk-free inputs for [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationParams {
    pub annualization_factor: f64,
    /// Annualized.
    pub risk_free_rate: f64,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            annualization_factor: 252.0,
            risk_free_rate: 0.0,
        }
    }
}

/// Compute the summary for an equity curve.
///
/// Fails with `InsufficientData` below two return observations and with
/// `DataGap` if any statistic comes out non-finite.
pub fn evaluate(
    curve: &EquityCurve,
    params: &EvaluationParams,
) -> Result<PerformanceSummary, BacktestError> {
    if !params.annualization_factor.is_finite() || params.annualization_factor <= 0.0 {
        return Err(BacktestError::config(format!(
            "annualization factor must be positive, got {}",
            params.annualization_factor
        )));
    }
    if !params.risk_free_rate.is_finite() {
        return Err(BacktestError::config("risk-free rate must be finite"));
    }

    let returns = curve.daily_returns();
    if returns.len() < 2 {
        return Err(BacktestError::InsufficientData {
            context: "performance metrics",
            required: 2,
            available: returns.len(),
        });
    }

    let values = curve.values();
    let af = params.annualization_factor;
    let tr = total_return(&values);
    let summary = PerformanceSummary {
        total_return: tr,
        annualized_return: annualized_return(tr, returns.len(), af),
        annualized_volatility: annualized_volatility(&returns, af),
        sharpe_ratio: sharpe_ratio(&returns, af, params.risk_free_rate),
        max_drawdown: max_drawdown(&values),
        number_of_days: returns.len(),
    };

    let fields = [
        ("total_return", summary.total_return),
        ("annualized_return", summary.annualized_return),
        ("annualized_volatility", summary.annualized_volatility),
        ("sharpe_ratio", summary.sharpe_ratio.unwrap_or(0.0)),
        ("max_drawdown", summary.max_drawdown),
    ];
    if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
        return Err(BacktestError::gap(
            returns.len(),
            format!("{name} is not finite ({value})"),
        ));
    }

    Ok(summary)
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: final / initial - 1.
pub fn total_return(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

/// Geometric annualization: (1 + total_return)^(af / days) - 1.
pub fn annualized_return(total_return: f64, days: usize, annualization_factor: f64) -> f64 {
    if days == 0 {
        return 0.0;
    }
    (1.0 + total_return).powf(annualization_factor / days as f64) - 1.0
}

/// Sample standard deviation of daily returns scaled by sqrt(af).
pub fn annualized_volatility(returns: &[f64], annualization_factor: f64) -> f64 {
    std_dev(returns) * annualization_factor.sqrt()
}

/// (mean daily return * af - rf) / annualized volatility.
///
/// `None` when the daily standard deviation is below [`VOLATILITY_FLOOR`].
pub fn sharpe_ratio(returns: &[f64], annualization_factor: f64, risk_free_rate: f64) -> Option<f64> {
    let daily_std = std_dev(returns);
    if returns.len() < 2 || daily_std < VOLATILITY_FLOOR {
        return None;
    }
    let excess = mean_f64(returns) * annualization_factor - risk_free_rate;
    Some(excess / (daily_std * annualization_factor.sqrt()))
}

/// Maximum drawdown as a non-positive fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if equity never falls below a prior peak.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            let dd = v / peak - 1.0;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
