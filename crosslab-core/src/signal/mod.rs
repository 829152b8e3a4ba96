//! Signal generation from moving-average crossovers.

pub mod ma_crossover;

pub use ma_crossover::{crossover_count, generate_positions};
