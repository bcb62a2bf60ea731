//! Per-channel state: bound device, sample window and statistics.

use crate::metrics::statistics::{Metric, Statistics};
use crate::sensors::types::Device;
use std::collections::VecDeque;
use std::sync::Arc;

/// Samples kept per channel. Two is exactly enough for one derivative.
pub const WINDOW_CAPACITY: usize = 2;

/// State of one measurement channel.
///
/// `S` is the raw sample stored in the window, `M` the derived metric aggregated into
/// the statistics.
#[derive(Debug, Clone)]
pub struct ChannelState<S, M> {
    /// Currently selected source
    device: Option<Arc<Device>>,
    /// Last samples, oldest first
    window: VecDeque<S>,
    stats: Statistics<M>,
}

impl<S, M: Metric> Default for ChannelState<S, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, M: Metric> ChannelState<S, M> {
    /// Unbound channel with an empty window.
    pub fn new() -> Self {
        Self {
            device: None,
            window: VecDeque::with_capacity(WINDOW_CAPACITY),
            stats: Statistics::new(),
        }
    }

    /// The bound device, if any.
    pub fn device(&self) -> Option<&Arc<Device>> {
        self.device.as_ref()
    }

    /// Bind `device` to this channel.
    ///
    /// Returns `false` without touching anything when a device with the same identity is
    /// already bound. A new identity starts with an empty window; statistics carry over.
    pub fn bind(&mut self, device: Arc<Device>) -> bool {
        if self.is_bound_to(&device) {
            return false;
        }
        self.device = Some(device);
        self.window.clear();
        true
    }

    /// Whether `device` is the bound source. An unbound channel matches nothing.
    pub fn is_bound_to(&self, device: &Device) -> bool {
        self.device.as_deref().is_some_and(|bound| bound == device)
    }

    /// Push a sample, evicting the oldest one when the window is full.
    pub fn record_metric(&mut self, value: S) {
        if self.window.len() == WINDOW_CAPACITY {
            self.window.pop_front();
        }
        self.window.push_back(value);
    }

    /// Drop the most recent sample. No-op on an empty window.
    pub fn unrecord_metric(&mut self) {
        self.window.pop_back();
    }

    /// Last `n` samples, oldest first, and whether there were enough of them.
    ///
    /// With fewer than `n` samples the returned values are defaults and the flag is
    /// `false`; callers must check it before using the values.
    pub fn get_last_n(&self, n: usize) -> (Vec<S>, bool)
    where
        S: Clone + Default,
    {
        if n > self.window.len() {
            return (vec![S::default(); n], false);
        }

        let skip = self.window.len() - n;
        (self.window.iter().skip(skip).cloned().collect(), true)
    }

    /// Fold a derived value into the statistics.
    pub fn aggregate_metric(&mut self, value: M) {
        self.stats.aggregate(value);
    }

    /// Current statistics.
    pub fn statistics(&self) -> &Statistics<M> {
        &self.stats
    }

    /// Samples currently in the window, oldest first.
    pub fn window(&self) -> impl Iterator<Item = &S> {
        self.window.iter()
    }

    /// Number of samples in the window.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}
