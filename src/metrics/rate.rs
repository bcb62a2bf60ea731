//! Rate-of-change from wrapping revolution counters.
//!
//! CSC sensors report a cumulative revolution count and the time of the last revolution
//! event in 1/1024 s ticks. Both fields wrap, so the rate comes from the difference between
//! two consecutive reports with the event time corrected for at most one rollover.

use serde::{Deserialize, Serialize};

/// Modulus of the 16-bit event time field.
pub const EVENT_TIME_MODULUS: u32 = 0x10000;

/// Event time resolution.
pub const TICKS_PER_SECOND: f64 = 1024.0;

/// Fallback wheel circumference (700x25c road tyre).
pub const DEFAULT_WHEEL_CIRCUMFERENCE_MM: u32 = 2168;

const SECONDS_PER_MINUTE: f64 = 60.0;
const SECONDS_PER_HOUR: f64 = 3600.0;
const MM_PER_KM: f64 = 1_000_000.0;

/// One raw counter report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevolutionSample {
    /// Cumulative revolutions
    pub revolutions: u32,
    /// Last event time in ticks
    pub event_time: u16,
}

impl RevolutionSample {
    /// Create a sample.
    pub fn new(revolutions: u32, event_time: u16) -> Self {
        Self {
            revolutions,
            event_time,
        }
    }
}

/// Revolutions and elapsed ticks between two reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevolutionDelta {
    /// Revolutions counted between the reports.
    ///
    /// The counter itself is not rollover-corrected: a counter wrap between two reports
    /// shows up as a negative delta.
    pub revolutions: i64,
    /// Elapsed ticks, rollover-corrected
    pub elapsed_ticks: u32,
}

impl RevolutionDelta {
    /// Delta from `previous` to `current`.
    ///
    /// Returns `None` when both reports carry the same event time: no revolution happened
    /// since the last report, which is not the same as a zero rate.
    pub fn between(previous: &RevolutionSample, current: &RevolutionSample) -> Option<Self> {
        if current.event_time == previous.event_time {
            return None;
        }

        Some(Self {
            revolutions: i64::from(current.revolutions) - i64::from(previous.revolutions),
            elapsed_ticks: elapsed_ticks(previous.event_time, current.event_time),
        })
    }

    /// Elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f64 {
        f64::from(self.elapsed_ticks) / TICKS_PER_SECOND
    }

    /// Revolutions per minute.
    pub fn cadence_rpm(&self) -> f64 {
        self.revolutions as f64 / (self.elapsed_seconds() / SECONDS_PER_MINUTE)
    }

    /// Ground speed in km/h for the given wheel circumference.
    pub fn speed_kmh(&self, wheel_circumference_mm: u32) -> f64 {
        let distance_km = self.revolutions as f64 * f64::from(wheel_circumference_mm) / MM_PER_KM;
        distance_km / (self.elapsed_seconds() / SECONDS_PER_HOUR)
    }
}

/// Ticks from `previous` to `current`, assuming at most one wrap in between.
///
/// A current time that is not greater than the previous one means the field wrapped.
pub fn elapsed_ticks(previous: u16, current: u16) -> u32 {
    let previous = u32::from(previous);
    let current = u32::from(current);

    if current > previous {
        current - previous
    } else {
        current + EVENT_TIME_MODULUS - previous
    }
}
