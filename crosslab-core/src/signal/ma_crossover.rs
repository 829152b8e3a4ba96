//! Moving average crossover: golden cross and death cross detection.
//!
//! Goes Long when the short SMA crosses above the long SMA (golden cross).
//! Goes Flat when the short SMA crosses below the long SMA (death cross).
//! Between crossovers the previous position persists.

use crate::domain::{Crossover, Position, PositionPoint};
use crate::error::BacktestError;
use crate::indicators::SmaSeries;

/// Derive one position per date on which both SMAs are defined.
///
/// The first defined date has no prior state, so it starts Long when
/// `short >= long` and Flat otherwise. After that a crossover requires a
/// strict inequality today against a non-strict one yesterday; a day where the
/// averages are exactly equal never fires and keeps the current position.
///
/// Returns an empty vector when no date has both averages defined.
pub fn generate_positions(
    short: &SmaSeries,
    long: &SmaSeries,
) -> Result<Vec<PositionPoint>, BacktestError> {
    if short.window >= long.window {
        return Err(BacktestError::config(format!(
            "short window ({}) must be shorter than long window ({})",
            short.window, long.window
        )));
    }
    if short.len() != long.len() {
        return Err(BacktestError::gap(
            short.len().min(long.len()),
            format!(
                "SMA series length mismatch: short has {}, long has {}",
                short.len(),
                long.len()
            ),
        ));
    }
    if let Some(i) = short
        .points
        .iter()
        .zip(&long.points)
        .position(|(s, l)| s.date != l.date)
    {
        return Err(BacktestError::gap(
            i,
            format!(
                "SMA dates disagree: short {} vs long {}",
                short.points[i].date, long.points[i].date
            ),
        ));
    }

    let Some(first) = (0..short.len())
        .find(|&i| short.points[i].value.is_some() && long.points[i].value.is_some())
    else {
        return Ok(Vec::new());
    };

    let pair = |i: usize| -> Result<(f64, f64), BacktestError> {
        match (short.points[i].value, long.points[i].value) {
            (Some(s), Some(l)) => Ok((s, l)),
            _ => Err(BacktestError::gap(
                i,
                format!("SMA undefined on {} after warm-up", short.points[i].date),
            )),
        }
    };

    let mut positions = Vec::with_capacity(short.len() - first);
    let (s0, l0) = pair(first)?;
    let mut current = if s0 >= l0 {
        Position::Long
    } else {
        Position::Flat
    };
    positions.push(PositionPoint {
        date: short.points[first].date,
        position: current,
        crossover: None,
    });

    let (mut s_prev, mut l_prev) = (s0, l0);
    for i in (first + 1)..short.len() {
        let (s, l) = pair(i)?;

        let crossover = if s > l && s_prev <= l_prev {
            Some(Crossover::Golden)
        } else if s < l && s_prev >= l_prev {
            Some(Crossover::Death)
        } else {
            None
        };

        match crossover {
            Some(Crossover::Golden) => current = Position::Long,
            Some(Crossover::Death) => current = Position::Flat,
            None => {}
        }

        positions.push(PositionPoint {
            date: short.points[i].date,
            position: current,
            crossover,
        });
        s_prev = s;
        l_prev = l;
    }

    Ok(positions)
}

/// Number of crossover events in a position sequence.
pub fn crossover_count(positions: &[PositionPoint]) -> usize {
    positions.iter().filter(|p| p.crossover.is_some()).count()
}
