//! Pipeline error kinds.
//!
//! Every stage reports the first violation it observes and stops. Nothing is
//! clamped, repaired, or defaulted on the way through.

use thiserror::Error;

/// Errors raised by the computational pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    /// Invalid parameters: window sizes, short >= long, non-positive values.
    #[error("config error: {0}")]
    Config(String),

    /// Not enough observations for the requested computation.
    #[error("insufficient data for {context}: need {required}, have {available}")]
    InsufficientData {
        context: &'static str,
        required: usize,
        available: usize,
    },

    /// Non-monotonic or duplicate dates, invalid prices, misaligned series,
    /// or a non-finite intermediate result.
    #[error("data gap at position {index}: {reason}")]
    DataGap { index: usize, reason: String },
}

impl BacktestError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn gap(index: usize, reason: impl Into<String>) -> Self {
        Self::DataGap {
            index,
            reason: reason.into(),
        }
    }
}
