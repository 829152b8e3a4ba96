//! Simple Moving Average (SMA).
//!
//! Rolling mean of adjusted closes over a lookback window.
//! Lookback: window - 1 (first defined value at index window-1).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;
use crate::error::BacktestError;

/// SMA value for one date. `None` during warm-up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmaPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// SMA output aligned 1:1 with the input price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmaSeries {
    pub window: usize,
    pub points: Vec<SmaPoint>,
}

impl SmaSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.points.get(index).and_then(|p| p.value)
    }

    /// Index of the first defined value, if any.
    pub fn first_defined(&self) -> Option<usize> {
        self.points.iter().position(|p| p.value.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sma {
    window: usize,
}

impl Sma {
    pub fn new(window: usize) -> Result<Self, BacktestError> {
        if window == 0 {
            return Err(BacktestError::config("SMA window must be >= 1"));
        }
        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn lookback(&self) -> usize {
        self.window - 1
    }

    /// Compute the SMA over the whole series in one pass.
    ///
    /// The running sum is re-anchored from scratch once per window so that
    /// subtract/add drift cannot accumulate over long histories; total work
    /// stays linear in the series length.
    pub fn compute(&self, series: &PriceSeries) -> Result<SmaSeries, BacktestError> {
        let n = series.len();
        if self.window > n {
            return Err(BacktestError::config(format!(
                "SMA window {} exceeds series length {n}",
                self.window
            )));
        }

        let closes: Vec<f64> = series.closes().collect();
        let w = self.window;
        let mut points: Vec<SmaPoint> = series
            .points()
            .iter()
            .map(|p| SmaPoint {
                date: p.date,
                value: None,
            })
            .collect();

        let mut sum: f64 = closes[..w].iter().sum();
        points[w - 1].value = Some(sum / w as f64);

        for i in w..n {
            if (i + 1) % w == 0 {
                sum = closes[(i + 1 - w)..=i].iter().sum();
            } else {
                sum += closes[i] - closes[i - w];
            }
            points[i].value = Some(sum / w as f64);
        }

        Ok(SmaSeries { window: w, points })
    }
}
