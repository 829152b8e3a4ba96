//! Synthetic price source for offline development.
//!
//! Produces a weekday-only random walk from 100.0, seeded from the ticker so
//! the same ticker always yields the same series. Results produced on
//! synthetic data are tagged as such by the runner.

use super::provider::{DataError, DataSource, PriceSource};
use crate::domain::{PricePoint, PriceSeries};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic random-walk price source.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    start_price: f64,
    max_daily_move: f64,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            max_daily_move: 0.03,
        }
    }
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// The walk itself. Empty when `[start, end]` holds no weekday.
    pub fn generate(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<PricePoint> {
        let seed: [u8; 32] = *blake3::hash(ticker.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut points = Vec::new();
        let mut price = self.start_price;
        let mut current = start;

        while current <= end {
            if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                let daily_return: f64 = rng.gen_range(-self.max_daily_move..self.max_daily_move);
                price *= 1.0 + daily_return;
                points.push(PricePoint::new(current, price));
            }
            current += chrono::Duration::days(1);
        }

        points
    }
}

impl PriceSource for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        Ok(PriceSeries::new(ticker, self.generate(ticker, start, end))?)
    }
}
