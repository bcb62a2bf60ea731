//! Synchronous publish/subscribe for model events.
//!
//! `publish` runs every handler on the calling thread, in subscription order, before it
//! returns. Handlers are snapshotted before delivery, so a handler may subscribe or
//! unsubscribe without deadlocking; the change applies from the next publish.

use crate::model::lock;
use crate::model::snapshot::WorkoutData;
use crate::sensors::types::{Device, SensorRole};
use crossbeam::channel::{Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by [`Topic::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// One event kind and its subscribers.
pub struct Topic<T> {
    handlers: Mutex<Vec<(SubscriptionId, Handler<T>)>>,
    senders: Mutex<Vec<Sender<T>>>,
    next_id: AtomicU64,
}

impl<T> Default for Topic<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Topic<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topic")
            .field("handlers", &lock(&self.handlers).len())
            .field("receivers", &lock(&self.senders).len())
            .finish()
    }
}

impl<T> Topic<T> {
    /// Topic without subscribers.
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
            senders: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a handler for the lifetime of the topic.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.handlers).push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = lock(&self.handlers);
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    /// Number of registered handlers.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.handlers).len()
    }
}

impl<T: Clone> Topic<T> {
    /// Get a receiver fed by every subsequent publish.
    ///
    /// Sending happens synchronously inside `publish`; the receiver can be drained on any
    /// thread. Dropped receivers are pruned on the next publish.
    pub fn receiver(&self) -> Receiver<T> {
        let (tx, rx) = crossbeam::channel::unbounded();
        lock(&self.senders).push(tx);
        rx
    }

    /// Deliver `event` to every handler, then to every receiver.
    pub fn publish(&self, event: &T) {
        let handlers: Vec<Handler<T>> = lock(&self.handlers)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in handlers {
            handler(event);
        }

        lock(&self.senders).retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// A device was seen for the first time, or with new services.
#[derive(Debug, Clone)]
pub struct DeviceDiscovered {
    pub device: Arc<Device>,
}

/// A device was bound to a measurement channel.
#[derive(Debug, Clone)]
pub struct DeviceSelected {
    pub role: SensorRole,
    pub device: Arc<Device>,
}

/// All topics the model publishes on.
#[derive(Debug, Default)]
pub struct Notifications {
    pub device_discovered: Topic<DeviceDiscovered>,
    pub device_selected: Topic<DeviceSelected>,
    pub measurements: Topic<WorkoutData>,
}
