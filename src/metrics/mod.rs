//! Metrics module: channel statistics and counter-derived rates.

pub mod rate;
pub mod statistics;

pub use rate::{RevolutionDelta, RevolutionSample, DEFAULT_WHEEL_CIRCUMFERENCE_MM};
pub use statistics::{Metric, Statistics};
