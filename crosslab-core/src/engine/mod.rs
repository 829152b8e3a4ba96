//! Backtest engine: lagged position simulation and equity compounding.
//!
//! Everything here is a pure function over complete, already-validated
//! inputs. Stages run in a fixed order and never mutate their inputs.

pub mod equity;
pub mod simulator;

pub use equity::{EquityCurve, EquityPoint};
pub use simulator::{simulate_strategy, SimulatedReturns};
