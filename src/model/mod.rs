//! Model module: measurement channels, device table, notifications and the coordinator.

pub mod channel;
pub mod coordinator;
pub mod notifications;
pub mod registry;
pub mod snapshot;

pub use channel::ChannelState;
pub use coordinator::Model;
pub use notifications::{DeviceDiscovered, DeviceSelected, Notifications, SubscriptionId, Topic};
pub use registry::DeviceRegistry;
pub use snapshot::{Aggregate, WorkoutData};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock `mutex`, recovering the data if a panicking thread poisoned it.
///
/// Telemetry keeps flowing after a subscriber panics.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
