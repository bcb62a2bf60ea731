//! Point-in-time workout snapshot published after every accepted measurement.

use crate::metrics::statistics::{Metric, Statistics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest value and running mean of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aggregate<T> {
    pub latest: T,
    pub average: f64,
    /// Samples behind `average`; 0 means the channel has not produced anything yet
    pub count: u64,
}

impl<T: Metric> From<&Statistics<T>> for Aggregate<T> {
    fn from(stats: &Statistics<T>) -> Self {
        Self {
            latest: stats.latest(),
            average: stats.average(),
            count: stats.count(),
        }
    }
}

/// Aggregates of all four channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutData {
    pub timestamp: DateTime<Utc>,
    /// BPM
    pub heart_rate: Aggregate<i32>,
    /// RPM
    pub cadence: Aggregate<i32>,
    /// km/h
    pub speed: Aggregate<f64>,
    /// Watts
    pub power: Aggregate<i32>,
}
