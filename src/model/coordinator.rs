//! The model: routes measurement events to channels and publishes snapshots.
//!
//! Every `record_*` call runs the same pipeline: check the event's device against the
//! channel binding, push the raw sample into the window, derive a rate where needed,
//! aggregate, publish a [`WorkoutData`] snapshot. Unusable events are dropped silently;
//! the only visible signal is the absence of a snapshot.

use crate::metrics::rate::{RevolutionDelta, RevolutionSample, DEFAULT_WHEEL_CIRCUMFERENCE_MM};
use crate::metrics::statistics::{Metric, Statistics};
use crate::model::channel::ChannelState;
use crate::model::lock;
use crate::model::notifications::{DeviceDiscovered, DeviceSelected, Notifications};
use crate::model::registry::DeviceRegistry;
use crate::model::snapshot::{Aggregate, WorkoutData};
use crate::sensors::fec::TrainerData;
use crate::sensors::gatt::{
    decode_csc_measurement, decode_cycling_power_measurement, decode_fec_message,
    decode_heart_rate_measurement,
};
use crate::sensors::types::{
    CadenceEvent, Device, DeviceId, GattService, HrmEvent, MeasurementEvent, PowerEvent,
    SensorError, SensorRole, SpeedEvent, TrainerEvent,
};
use crate::storage::config::SensorSettings;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type RevolutionChannel<M> = ChannelState<RevolutionSample, M>;

/// Coordinator owning the device table and the four measurement channels.
///
/// Notifications are always published after internal locks are released, so handlers may
/// call read operations (`get_devices`, `snapshot`, the statistics accessors). Handlers
/// must not feed measurements back into the model.
///
/// The published snapshot is taken after the channel lock is dropped. With several
/// reporting threads, snapshots can therefore reach subscribers out of order: a later
/// delivery may carry an older `count` for some channel than an earlier one.
#[derive(Debug)]
pub struct Model {
    registry: DeviceRegistry,
    hrm: Mutex<ChannelState<i32, i32>>,
    cadence: Mutex<RevolutionChannel<i32>>,
    speed: Mutex<RevolutionChannel<f64>>,
    power: Mutex<ChannelState<i32, i32>>,
    wheel_circumference_mm: u32,
    notifications: Notifications,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Model with the default wheel circumference.
    pub fn new() -> Self {
        Self::with_wheel_circumference(DEFAULT_WHEEL_CIRCUMFERENCE_MM)
    }

    /// Model configured from sensor settings.
    pub fn with_settings(settings: &SensorSettings) -> Self {
        Self::with_wheel_circumference(settings.wheel_circumference_mm)
    }

    /// Model with an explicit wheel circumference in millimeters.
    pub fn with_wheel_circumference(wheel_circumference_mm: u32) -> Self {
        Self {
            registry: DeviceRegistry::new(),
            hrm: Mutex::new(ChannelState::new()),
            cadence: Mutex::new(ChannelState::new()),
            speed: Mutex::new(ChannelState::new()),
            power: Mutex::new(ChannelState::new()),
            wheel_circumference_mm,
            notifications: Notifications::default(),
        }
    }

    /// Topics to subscribe to.
    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// Wheel circumference used for speed.
    pub fn wheel_circumference_mm(&self) -> u32 {
        self.wheel_circumference_mm
    }

    // ---- device table ----

    /// Record a discovered device, merging it into any known record with the same id.
    ///
    /// Publishes `device_discovered` only when the stored record changed.
    pub fn add_device(&self, device: Arc<Device>) {
        let Some(record) = self.registry.add(device) else {
            tracing::trace!("Rediscovered known device, nothing new");
            return;
        };

        tracing::info!("Device discovered: {}", record);
        self.notifications
            .device_discovered
            .publish(&DeviceDiscovered { device: record });
    }

    /// Known devices, optionally filtered by supported service.
    pub fn get_devices(&self, service: Option<GattService>) -> Vec<Arc<Device>> {
        self.registry.devices(service)
    }

    /// Look up a known device.
    pub fn get_device(&self, id: &DeviceId) -> Option<Arc<Device>> {
        self.registry.get(id)
    }

    // ---- bindings ----

    /// Bind `device` to every role its services can fill.
    pub fn set_device(&self, device: &Arc<Device>) {
        for service in &device.services {
            if *service == GattService::FecBikeTrainer {
                self.set_bike_trainer(device);
            }
            for role in service.roles() {
                self.set_role(*role, Arc::clone(device));
            }
        }
    }

    /// Select the source for `role`.
    pub fn set_role(&self, role: SensorRole, device: Arc<Device>) {
        match role {
            SensorRole::HeartRate => self.set_heart_rate_monitor(device),
            SensorRole::Cadence => self.set_cadence_sensor(device),
            SensorRole::Speed => self.set_speed_sensor(device),
            SensorRole::Power => self.set_power_meter(device),
        }
    }

    /// Select the heart rate source.
    pub fn set_heart_rate_monitor(&self, device: Arc<Device>) {
        self.select(SensorRole::HeartRate, &self.hrm, device);
    }

    /// Select the cadence source.
    pub fn set_cadence_sensor(&self, device: Arc<Device>) {
        self.select(SensorRole::Cadence, &self.cadence, device);
    }

    /// Select the speed source.
    pub fn set_speed_sensor(&self, device: Arc<Device>) {
        self.select(SensorRole::Speed, &self.speed, device);
    }

    /// Select the power source.
    pub fn set_power_meter(&self, device: Arc<Device>) {
        self.select(SensorRole::Power, &self.power, device);
    }

    /// Trainer data is pass-through, so selecting a trainer only gets logged.
    pub fn set_bike_trainer(&self, device: &Device) {
        tracing::info!("Bike trainer selected: {}", device);
    }

    /// The device currently bound to `role`.
    pub fn bound_device(&self, role: SensorRole) -> Option<Arc<Device>> {
        match role {
            SensorRole::HeartRate => lock(&self.hrm).device().cloned(),
            SensorRole::Cadence => lock(&self.cadence).device().cloned(),
            SensorRole::Speed => lock(&self.speed).device().cloned(),
            SensorRole::Power => lock(&self.power).device().cloned(),
        }
    }

    fn select<S, M: Metric>(
        &self,
        role: SensorRole,
        channel: &Mutex<ChannelState<S, M>>,
        device: Arc<Device>,
    ) {
        if !lock(channel).bind(Arc::clone(&device)) {
            tracing::trace!("{} already bound to {}", role, device.id);
            return;
        }

        tracing::info!("{} source selected: {}", role, device);
        self.notifications
            .device_selected
            .publish(&DeviceSelected { role, device });
    }

    // ---- measurements ----

    /// Record a heart rate report.
    pub fn record_heart_data(&self, event: &HrmEvent) {
        {
            let mut hrm = lock(&self.hrm);
            if !accepts(&hrm, SensorRole::HeartRate, &event.device) {
                return;
            }

            let bpm = i32::from(event.measurement.hrm);
            hrm.record_metric(bpm);
            hrm.aggregate_metric(bpm);
        }

        self.publish_update();
    }

    /// Record a crank revolution report.
    pub fn record_cadence_data(&self, event: &CadenceEvent) {
        {
            let mut cadence = lock(&self.cadence);
            if !accepts(&cadence, SensorRole::Cadence, &event.device) {
                return;
            }

            cadence.record_metric(RevolutionSample::new(
                u32::from(event.measurement.ccr),
                event.measurement.lcet,
            ));
            let Some(delta) = latest_delta(&mut cadence, SensorRole::Cadence) else {
                return;
            };

            let rpm = delta.cadence_rpm().trunc() as i32;
            tracing::trace!(?delta, rpm, "Cadence computed");
            cadence.aggregate_metric(rpm);
        }

        self.publish_update();
    }

    /// Record a wheel revolution report.
    pub fn record_speed_data(&self, event: &SpeedEvent) {
        {
            let mut speed = lock(&self.speed);
            if !accepts(&speed, SensorRole::Speed, &event.device) {
                return;
            }

            speed.record_metric(RevolutionSample::new(
                event.measurement.cwr,
                event.measurement.lwet,
            ));
            let Some(delta) = latest_delta(&mut speed, SensorRole::Speed) else {
                return;
            };

            let kmh = delta.speed_kmh(self.wheel_circumference_mm);
            tracing::trace!(?delta, kmh, "Speed computed");
            speed.aggregate_metric(kmh);
        }

        self.publish_update();
    }

    /// Record a power report.
    pub fn record_power_data(&self, event: &PowerEvent) {
        {
            let mut power = lock(&self.power);
            if !accepts(&power, SensorRole::Power, &event.device) {
                return;
            }

            let watts = i32::from(event.measurement.power);
            power.record_metric(watts);
            power.aggregate_metric(watts);
        }

        self.publish_update();
    }

    /// Record an FE-C trainer page.
    ///
    /// Only the specific trainer data page triggers a snapshot; the general pages are
    /// accepted and ignored.
    pub fn record_trainer_data(&self, event: &TrainerEvent) {
        match event.measurement {
            TrainerData::SpecificTrainerData(_) => self.publish_update(),
            TrainerData::GeneralData(_) | TrainerData::GeneralSettings(_) => {
                tracing::trace!("Ignoring general FE-C page from {}", event.device.id);
            }
        }
    }

    /// Decode a raw notification from `device` and record it.
    ///
    /// Decoding errors are returned; everything after decoding follows the silent-skip
    /// rules of the `record_*` operations.
    pub fn ingest(
        &self,
        device: &Arc<Device>,
        service: GattService,
        payload: &[u8],
    ) -> Result<(), SensorError> {
        let device = Arc::clone(device);

        match service {
            GattService::HeartRate => {
                let hrm = decode_heart_rate_measurement(payload)?;
                self.record_heart_data(&MeasurementEvent::new(device, hrm));
            }
            GattService::CyclingSpeedCadence => {
                let csc = decode_csc_measurement(payload)?;
                if let Some(speed) = csc.speed {
                    self.record_speed_data(&MeasurementEvent::new(Arc::clone(&device), speed));
                }
                if let Some(cadence) = csc.cadence {
                    self.record_cadence_data(&MeasurementEvent::new(device, cadence));
                }
            }
            GattService::CyclingPower => {
                let power = decode_cycling_power_measurement(payload)?;
                self.record_power_data(&MeasurementEvent::new(device, power));
            }
            GattService::FecBikeTrainer => {
                let page = decode_fec_message(payload)?;
                self.record_trainer_data(&MeasurementEvent::new(device, page));
            }
        }

        Ok(())
    }

    /// Route a notification by the characteristic it arrived on, then [`Model::ingest`] it.
    pub fn ingest_notification(
        &self,
        device: &Arc<Device>,
        characteristic: Uuid,
        payload: &[u8],
    ) -> Result<(), SensorError> {
        let service = GattService::from_measurement_uuid(&characteristic)
            .ok_or(SensorError::UnsupportedService(characteristic))?;
        self.ingest(device, service, payload)
    }

    // ---- read side ----

    /// Heart rate statistics (BPM).
    pub fn heart_rate_statistics(&self) -> Statistics<i32> {
        *lock(&self.hrm).statistics()
    }

    /// Cadence statistics (RPM).
    pub fn cadence_statistics(&self) -> Statistics<i32> {
        *lock(&self.cadence).statistics()
    }

    /// Speed statistics (km/h).
    pub fn speed_statistics(&self) -> Statistics<f64> {
        *lock(&self.speed).statistics()
    }

    /// Power statistics (W).
    pub fn power_statistics(&self) -> Statistics<i32> {
        *lock(&self.power).statistics()
    }

    /// Current aggregate of all channels.
    pub fn snapshot(&self) -> WorkoutData {
        WorkoutData {
            timestamp: chrono::Utc::now(),
            heart_rate: Aggregate::from(&self.heart_rate_statistics()),
            cadence: Aggregate::from(&self.cadence_statistics()),
            speed: Aggregate::from(&self.speed_statistics()),
            power: Aggregate::from(&self.power_statistics()),
        }
    }

    fn publish_update(&self) {
        self.notifications.measurements.publish(&self.snapshot());
    }
}

/// Whether `channel` takes events from `device`.
fn accepts<S, M: Metric>(channel: &ChannelState<S, M>, role: SensorRole, device: &Device) -> bool {
    if channel.is_bound_to(device) {
        return true;
    }

    match channel.device() {
        Some(bound) => tracing::debug!(
            "{} device mismatch: expected {} but got {}",
            role,
            bound.id,
            device.id
        ),
        None => tracing::debug!("{} has no device bound, dropping event from {}", role, device.id),
    }
    false
}

/// Delta between the two newest samples of a revolution channel.
///
/// A report repeating the previous event time is removed from the window again so the
/// window keeps one authoritative latest sample.
fn latest_delta<M: Metric>(
    channel: &mut RevolutionChannel<M>,
    role: SensorRole,
) -> Option<RevolutionDelta> {
    let (samples, sufficient) = channel.get_last_n(2);
    if !sufficient {
        tracing::debug!("{}: waiting for a second sample", role);
        return None;
    }

    let delta = RevolutionDelta::between(&samples[0], &samples[1]);
    if delta.is_none() {
        tracing::debug!("{}: same event time, skipping", role);
        channel.unrecord_metric();
    }
    delta
}
