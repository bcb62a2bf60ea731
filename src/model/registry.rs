//! Table of known devices keyed by identity.

use crate::model::lock;
use crate::sensors::types::{Device, DeviceId, GattService};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Every device seen by the scanner.
///
/// A single mutex serializes discovery updates against read-side queries.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Mutex<HashMap<DeviceId, Arc<Device>>>,
}

impl DeviceRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or merge a discovered device.
    ///
    /// A rediscovered device is merged into the existing record. Returns the stored
    /// record when something changed, `None` when the discovery added nothing new.
    pub fn add(&self, device: Arc<Device>) -> Option<Arc<Device>> {
        let mut devices = lock(&self.devices);

        let record = match devices.get(&device.id) {
            Some(known) => {
                let merged = known.merge(&device);
                if merged.same_snapshot(known) {
                    return None;
                }
                Arc::new(merged)
            }
            None => device,
        };

        devices.insert(record.id.clone(), Arc::clone(&record));
        Some(record)
    }

    /// Look a device up by identity.
    pub fn get(&self, id: &DeviceId) -> Option<Arc<Device>> {
        lock(&self.devices).get(id).cloned()
    }

    /// All devices, optionally only those offering `service`, ordered by identity.
    pub fn devices(&self, service: Option<GattService>) -> Vec<Arc<Device>> {
        let mut devices: Vec<Arc<Device>> = lock(&self.devices)
            .values()
            .filter(|device| service.map_or(true, |service| device.supports(service)))
            .cloned()
            .collect();
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        devices
    }

    /// Number of known devices.
    pub fn len(&self) -> usize {
        lock(&self.devices).len()
    }

    /// True when nothing has been discovered.
    pub fn is_empty(&self) -> bool {
        lock(&self.devices).is_empty()
    }
}
