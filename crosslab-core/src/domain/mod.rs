//! Domain types for CrossLab

pub mod position;
pub mod price;

pub use position::{Crossover, Position, PositionPoint};
pub use price::{PricePoint, PriceSeries, ReturnPoint};
