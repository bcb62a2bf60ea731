//! Running statistics for a single measurement channel.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

mod sealed {
    pub trait Sealed {}

    impl Sealed for i32 {}
    impl Sealed for f64 {}
}

/// Numeric kinds a channel can aggregate: whole units (BPM, RPM, W) or real units (km/h).
pub trait Metric:
    sealed::Sealed + Copy + PartialOrd + Default + Debug + Into<f64> + Send + Sync + 'static
{
}

impl Metric for i32 {}
impl Metric for f64 {}

/// Latest, min, max and running mean of a channel.
///
/// The mean is updated incrementally, so nothing but the five fields is kept. Before the
/// first sample every field holds its zero default and `count` is 0; check
/// [`Statistics::is_empty`] before treating the values as measurements.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Statistics<T> {
    latest: T,
    min: T,
    max: T,
    average: f64,
    count: u64,
}

impl<T: Metric> Statistics<T> {
    /// Empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one value in.
    pub fn aggregate(&mut self, value: T) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            if value < self.min {
                self.min = value;
            }
            if value > self.max {
                self.max = value;
            }
        }

        let count = self.count as f64;
        let sample: f64 = value.into();
        self.average = (self.average * count + sample) / (count + 1.0);
        self.latest = value;
        self.count += 1;
    }

    /// Most recent value.
    pub fn latest(&self) -> T {
        self.latest
    }

    /// Smallest value seen.
    pub fn min(&self) -> T {
        self.min
    }

    /// Largest value seen.
    pub fn max(&self) -> T {
        self.max
    }

    /// Running mean.
    pub fn average(&self) -> f64 {
        self.average
    }

    /// Number of aggregated values.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// True until the first value arrives.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
