use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Holding state decided at a day's close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    Long,
    Flat,
}

impl Position {
    pub fn is_long(&self) -> bool {
        matches!(self, Position::Long)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Long => write!(f, "LONG"),
            Position::Flat => write!(f, "FLAT"),
        }
    }
}

/// A crossover of the short SMA through the long SMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossover {
    /// Short rises above long.
    Golden,
    /// Short falls below long.
    Death,
}

impl fmt::Display for Crossover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crossover::Golden => write!(f, "golden_cross"),
            Crossover::Death => write!(f, "death_cross"),
        }
    }
}

/// Position for one date in the signal region, with the crossover that set it (if any).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionPoint {
    pub date: NaiveDate,
    pub position: Position,
    pub crossover: Option<Crossover>,
}
