//! Price points and validated price series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::BacktestError;

/// One trading day's adjusted close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub adjusted_close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, adjusted_close: f64) -> Self {
        Self {
            date,
            adjusted_close,
        }
    }
}

/// Simple percentage change from the previous trading day, dated on the later day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Time-ordered daily adjusted closes for one ticker.
///
/// Construction validates the series: dates strictly increasing (no duplicates)
/// and every price finite and positive. Gaps between dates are fine, market
/// holidays are simply absent. Deserialization goes through the same checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PriceSeriesRecord")]
pub struct PriceSeries {
    ticker: String,
    points: Vec<PricePoint>,
}

#[derive(Deserialize)]
struct PriceSeriesRecord {
    ticker: String,
    points: Vec<PricePoint>,
}

impl TryFrom<PriceSeriesRecord> for PriceSeries {
    type Error = BacktestError;

    fn try_from(record: PriceSeriesRecord) -> Result<Self, Self::Error> {
        PriceSeries::new(record.ticker, record.points)
    }
}

impl PriceSeries {
    /// Validate and wrap a list of price points.
    pub fn new(ticker: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, BacktestError> {
        for (i, point) in points.iter().enumerate() {
            if !point.adjusted_close.is_finite() || point.adjusted_close <= 0.0 {
                return Err(BacktestError::gap(
                    i,
                    format!(
                        "adjusted close on {} must be finite and positive, got {}",
                        point.date, point.adjusted_close
                    ),
                ));
            }
            if i > 0 {
                let prev = points[i - 1].date;
                if point.date == prev {
                    return Err(BacktestError::gap(i, format!("duplicate date {}", point.date)));
                }
                if point.date < prev {
                    return Err(BacktestError::gap(
                        i,
                        format!("date {} is earlier than preceding {}", point.date, prev),
                    ));
                }
            }
        }
        Ok(Self {
            ticker: ticker.into(),
            points,
        })
    }

    /// Build a series on consecutive calendar days starting at `start`.
    pub fn from_closes(
        ticker: impl Into<String>,
        start: NaiveDate,
        closes: &[f64],
    ) -> Result<Self, BacktestError> {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint::new(start + chrono::Duration::days(i as i64), close))
            .collect();
        Self::new(ticker, points)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.adjusted_close)
    }

    /// Points with `start <= date <= end`. The result is still a valid series.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        let points = self
            .points
            .iter()
            .filter(|p| p.date >= start && p.date <= end)
            .copied()
            .collect();
        PriceSeries {
            ticker: self.ticker.clone(),
            points,
        }
    }

    /// Market returns, one per day after the first.
    pub fn daily_returns(&self) -> Vec<ReturnPoint> {
        self.points
            .windows(2)
            .map(|w| ReturnPoint {
                date: w[1].date,
                value: w[1].adjusted_close / w[0].adjusted_close - 1.0,
            })
            .collect()
    }

    /// BLAKE3 over ticker, dates and price bits. Identical input, identical hash.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.ticker.as_bytes());
        for point in &self.points {
            hasher.update(point.date.to_string().as_bytes());
            hasher.update(&point.adjusted_close.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}
