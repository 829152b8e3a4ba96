//! Equity curve builder: compounds daily returns into cumulative value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{PriceSeries, ReturnPoint};
use crate::error::BacktestError;

/// One point on an equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
    /// Return compounded into this point. 0.0 for the anchor point.
    pub daily_return: f64,
}

/// Cumulative value over time, starting at the initial value on the anchor date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    pub points: Vec<EquityPoint>,
}

impl EquityCurve {
    /// `value[0] = initial` on `anchor`, then `value[t] = value[t-1] * (1 + r[t])`.
    pub fn build(
        anchor: NaiveDate,
        returns: &[ReturnPoint],
        initial: f64,
    ) -> Result<Self, BacktestError> {
        if !initial.is_finite() || initial <= 0.0 {
            return Err(BacktestError::config(format!(
                "initial value must be positive and finite, got {initial}"
            )));
        }

        let mut points = Vec::with_capacity(returns.len() + 1);
        points.push(EquityPoint {
            date: anchor,
            value: initial,
            daily_return: 0.0,
        });

        let mut prev_date = anchor;
        let mut value = initial;
        for (i, r) in returns.iter().enumerate() {
            if r.date <= prev_date {
                return Err(BacktestError::gap(
                    i + 1,
                    format!("return dated {} does not follow {}", r.date, prev_date),
                ));
            }
            value *= 1.0 + r.value;
            if !value.is_finite() {
                return Err(BacktestError::gap(
                    i + 1,
                    format!("equity became non-finite on {}", r.date),
                ));
            }
            points.push(EquityPoint {
                date: r.date,
                value,
                daily_return: r.value,
            });
            prev_date = r.date;
        }

        Ok(Self { points })
    }

    /// Continuous exposure from the first price date to the last.
    pub fn buy_and_hold(series: &PriceSeries, initial: f64) -> Result<Self, BacktestError> {
        let anchor = series.first_date().ok_or(BacktestError::InsufficientData {
            context: "buy-and-hold curve",
            required: 1,
            available: 0,
        })?;
        Self::build(anchor, &series.daily_returns(), initial)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn initial_value(&self) -> Option<f64> {
        self.points.first().map(|p| p.value)
    }

    pub fn final_value(&self) -> Option<f64> {
        self.points.last().map(|p| p.value)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// The compounded returns, excluding the anchor point.
    pub fn daily_returns(&self) -> Vec<f64> {
        self.points.iter().skip(1).map(|p| p.daily_return).collect()
    }

    /// True when both curves cover exactly the same dates.
    pub fn shares_index_with(&self, other: &EquityCurve) -> bool {
        self.points.len() == other.points.len()
            && self
                .points
                .iter()
                .zip(&other.points)
                .all(|(a, b)| a.date == b.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(i: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap() + chrono::Duration::days(i)
    }

    fn returns(values: &[f64]) -> Vec<ReturnPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| ReturnPoint {
                date: day(i as i64 + 1),
                value,
            })
            .collect()
    }

    #[test]
    fn compounds_multiplicatively() {
        let curve = EquityCurve::build(day(0), &returns(&[0.10, -0.10, 0.05]), 1.0).unwrap();
        assert_eq!(curve.len(), 4);
        assert_eq!(curve.initial_value(), Some(1.0));
        let expected = 1.0 * 1.10 * 0.90 * 1.05;
        assert!((curve.final_value().unwrap() - expected).abs() < 1e-12);
        assert_eq!(curve.daily_returns(), vec![0.10, -0.10, 0.05]);
        assert_eq!(curve.points[0].daily_return, 0.0);
    }

    #[test]
    fn initial_capital_scales_curve() {
        let curve = EquityCurve::build(day(0), &returns(&[0.5]), 10_000.0).unwrap();
        assert!((curve.final_value().unwrap() - 15_000.0).abs() < 1e-9);
    }

    #[test]
    fn order_matters_for_path() {
        let a = EquityCurve::build(day(0), &returns(&[0.5, -0.5]), 1.0).unwrap();
        let b = EquityCurve::build(day(0), &returns(&[-0.5, 0.5]), 1.0).unwrap();
        assert_ne!(a.values()[1], b.values()[1]);
    }

    #[test]
    fn buy_and_hold_tracks_price_ratio() {
        let series =
            PriceSeries::from_closes("SPY", day(0), &[100.0, 105.0, 103.0, 120.0]).unwrap();
        let curve = EquityCurve::buy_and_hold(&series, 1.0).unwrap();
        assert_eq!(curve.len(), series.len());
        for (point, price) in curve.points.iter().zip(series.points()) {
            assert_eq!(point.date, price.date);
            assert!((point.value - price.adjusted_close / 100.0).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_non_positive_initial() {
        assert!(matches!(
            EquityCurve::build(day(0), &[], 0.0),
            Err(BacktestError::Config(_))
        ));
        assert!(matches!(
            EquityCurve::build(day(0), &[], f64::INFINITY),
            Err(BacktestError::Config(_))
        ));
    }

    #[test]
    fn rejects_return_not_after_anchor() {
        let r = vec![ReturnPoint {
            date: day(0),
            value: 0.01,
        }];
        assert!(matches!(
            EquityCurve::build(day(0), &r, 1.0),
            Err(BacktestError::DataGap { index: 1, .. })
        ));
    }

    #[test]
    fn non_finite_return_is_gap() {
        assert!(matches!(
            EquityCurve::build(day(0), &returns(&[f64::NAN]), 1.0),
            Err(BacktestError::DataGap { .. })
        ));
    }

    #[test]
    fn shared_index() {
        let a = EquityCurve::build(day(0), &returns(&[0.1, 0.2]), 1.0).unwrap();
        let b = EquityCurve::build(day(0), &returns(&[0.0, 0.0]), 1.0).unwrap();
        let c = EquityCurve::build(day(0), &returns(&[0.1]), 1.0).unwrap();
        assert!(a.shares_index_with(&b));
        assert!(!a.shares_index_with(&c));
    }
}
