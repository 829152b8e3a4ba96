//! Moving-average indicators over a price series.
//!
//! Indicators are precomputed once over the full series. Warm-up entries are
//! `None`, never a numeric placeholder.

pub mod sma;

pub use sma::{Sma, SmaPoint, SmaSeries};

/// Create a price series on consecutive days from closes, for tests.
#[cfg(test)]
pub fn make_series(closes: &[f64]) -> crate::domain::PriceSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    crate::domain::PriceSeries::from_closes("TEST", base_date, closes).unwrap()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
