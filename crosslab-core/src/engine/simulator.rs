//! Position simulator: turns positions into realized strategy returns.
//!
//! A position is decided from a day's close, so it can only earn the *next*
//! trading day's return. The return dated `t` is therefore realized iff the
//! position decided at the close of the trading day before `t` was Long.
//! Days before the first position (indicator warm-up) are Flat.

use serde::{Deserialize, Serialize};

use crate::domain::{Position, PositionPoint, ReturnPoint};
use crate::error::BacktestError;

/// Strategy returns aligned 1:1 with the market returns they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedReturns {
    pub returns: Vec<ReturnPoint>,
    /// Fraction of return days on which the strategy was exposed (held Long).
    pub exposure: f64,
}

/// Apply yesterday's position to today's market return.
///
/// `positions` must be strictly increasing by date and every position date
/// must be a trading day of the market series: either the day before the
/// first return (the series' first date) or the date of some return. Once the
/// first position is reached, every later trading day needs one.
pub fn simulate_strategy(
    positions: &[PositionPoint],
    market: &[ReturnPoint],
) -> Result<SimulatedReturns, BacktestError> {
    for i in 1..positions.len() {
        if positions[i].date <= positions[i - 1].date {
            return Err(BacktestError::gap(
                i,
                format!(
                    "position dates not increasing: {} follows {}",
                    positions[i].date,
                    positions[i - 1].date
                ),
            ));
        }
    }
    for i in 1..market.len() {
        if market[i].date <= market[i - 1].date {
            return Err(BacktestError::gap(
                i,
                format!(
                    "return dates not increasing: {} follows {}",
                    market[i].date,
                    market[i - 1].date
                ),
            ));
        }
    }

    let mut held = Position::Flat;
    let mut next = 0;

    // Only the series' first day may precede the first return.
    if let Some(first) = market.first() {
        while next < positions.len() && positions[next].date < first.date {
            if next > 0 {
                return Err(BacktestError::gap(
                    next,
                    format!(
                        "position on {} has no matching trading day",
                        positions[next - 1].date
                    ),
                ));
            }
            held = positions[next].position;
            next += 1;
        }
    }

    let mut returns = Vec::with_capacity(market.len());
    let mut long_days = 0usize;

    for r in market {
        if next < positions.len() && positions[next].date < r.date {
            return Err(BacktestError::gap(
                next,
                format!("position on {} has no matching trading day", positions[next].date),
            ));
        }

        let value = if held.is_long() {
            long_days += 1;
            r.value
        } else {
            0.0
        };
        returns.push(ReturnPoint {
            date: r.date,
            value,
        });

        // Decided at today's close; takes effect for tomorrow's return.
        if next < positions.len() && positions[next].date == r.date {
            held = positions[next].position;
            next += 1;
        } else if next > 0 {
            return Err(BacktestError::gap(
                next,
                format!("no position for trading day {} after signals started", r.date),
            ));
        }
    }

    if next < positions.len() {
        return Err(BacktestError::gap(
            next,
            format!(
                "position on {} is outside the return series",
                positions[next].date
            ),
        ));
    }

    let exposure = if market.is_empty() {
        0.0
    } else {
        long_days as f64 / market.len() as f64
    };

    Ok(SimulatedReturns { returns, exposure })
}
