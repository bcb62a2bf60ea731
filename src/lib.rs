//! RideHud - sensor core for a cycling heads-up display.
//!
//! Turns decoded BLE sensor reports (heart rate, crank/wheel revolutions, power) into live
//! workout statistics. Each measurement channel is bound to one source device; reports from
//! anything else are dropped. Cadence and speed are derived from wrapping hardware counters.
//! Consumers subscribe to device and snapshot notifications on the [`Model`].

pub mod metrics;
pub mod model;
pub mod sensors;
pub mod storage;

// Re-export commonly used types
pub use metrics::statistics::Statistics;
pub use model::{Model, WorkoutData};
pub use sensors::types::{Device, GattService, MeasurementEvent, SensorRole};
pub use storage::config::AppConfig;
