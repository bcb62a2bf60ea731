//! Sensor identity, service roles and measurement payloads.
//!
//! Everything here is a plain value type. Devices are shared behind `Arc` between the
//! device table, the channel bindings and in-flight measurement events.

use crate::sensors::fec::TrainerData;
use crate::sensors::gatt::{
    CSC_MEASUREMENT_UUID, CSC_SERVICE_UUID, CYCLING_POWER_MEASUREMENT_UUID,
    CYCLING_POWER_SERVICE_UUID, FEC_BIKE_TRAINER_SERVICE_UUID, FEC_BIKE_TRAINER_TX_UUID,
    HEART_RATE_MEASUREMENT_UUID, HEART_RATE_SERVICE_UUID,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Stable device identity, typically the BLE hardware address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// GATT services the core knows how to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GattService {
    /// Heart Rate Service (0x180D)
    HeartRate,
    /// Cycling Speed and Cadence Service (0x1816)
    CyclingSpeedCadence,
    /// Cycling Power Service (0x1818)
    CyclingPower,
    /// ANT+ FE-C tunnelled over BLE
    FecBikeTrainer,
}

impl GattService {
    /// Every supported service, in scan-filter order.
    pub const ALL: [GattService; 4] = [
        GattService::HeartRate,
        GattService::CyclingSpeedCadence,
        GattService::CyclingPower,
        GattService::FecBikeTrainer,
    ];

    /// Advertised service UUID.
    pub fn service_uuid(&self) -> Uuid {
        match self {
            GattService::HeartRate => HEART_RATE_SERVICE_UUID,
            GattService::CyclingSpeedCadence => CSC_SERVICE_UUID,
            GattService::CyclingPower => CYCLING_POWER_SERVICE_UUID,
            GattService::FecBikeTrainer => FEC_BIKE_TRAINER_SERVICE_UUID,
        }
    }

    /// UUID of the characteristic whose notifications carry measurements.
    pub fn measurement_uuid(&self) -> Uuid {
        match self {
            GattService::HeartRate => HEART_RATE_MEASUREMENT_UUID,
            GattService::CyclingSpeedCadence => CSC_MEASUREMENT_UUID,
            GattService::CyclingPower => CYCLING_POWER_MEASUREMENT_UUID,
            GattService::FecBikeTrainer => FEC_BIKE_TRAINER_TX_UUID,
        }
    }

    /// Classify an advertised service UUID.
    pub fn from_service_uuid(uuid: &Uuid) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|service| service.service_uuid() == *uuid)
    }

    /// Classify the characteristic a notification arrived on.
    pub fn from_measurement_uuid(uuid: &Uuid) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|service| service.measurement_uuid() == *uuid)
    }

    /// Measurement channels a device offering this service can feed.
    pub fn roles(&self) -> &'static [SensorRole] {
        match self {
            GattService::HeartRate => &[SensorRole::HeartRate],
            GattService::CyclingSpeedCadence => &[SensorRole::Cadence, SensorRole::Speed],
            GattService::CyclingPower => &[SensorRole::Power],
            GattService::FecBikeTrainer => &[],
        }
    }
}

impl std::fmt::Display for GattService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GattService::HeartRate => write!(f, "Heart Rate Monitor"),
            GattService::CyclingSpeedCadence => write!(f, "Cadence & Speed Sensor"),
            GattService::CyclingPower => write!(f, "Power Meter"),
            GattService::FecBikeTrainer => write!(f, "Bike Trainer (FE-C over Bluetooth)"),
        }
    }
}

/// An independently tracked measurement channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorRole {
    /// Heart rate in BPM
    HeartRate,
    /// Crank cadence in RPM
    Cadence,
    /// Wheel speed in km/h
    Speed,
    /// Power in watts
    Power,
}

impl SensorRole {
    /// The service a device needs to fill this role.
    pub fn service(&self) -> GattService {
        match self {
            SensorRole::HeartRate => GattService::HeartRate,
            SensorRole::Cadence | SensorRole::Speed => GattService::CyclingSpeedCadence,
            SensorRole::Power => GattService::CyclingPower,
        }
    }
}

impl std::fmt::Display for SensorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorRole::HeartRate => write!(f, "Heart Rate"),
            SensorRole::Cadence => write!(f, "Cadence"),
            SensorRole::Speed => write!(f, "Speed"),
            SensorRole::Power => write!(f, "Power"),
        }
    }
}

/// A discovered BLE device.
///
/// Equality and hashing only look at [`DeviceId`]: two snapshots of the same hardware
/// compare equal even when the name or service set differs. Use
/// [`Device::same_snapshot`] to compare contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Hardware identity
    pub id: DeviceId,
    /// Advertised name
    pub name: String,
    /// Supported services seen so far
    pub services: BTreeSet<GattService>,
}

impl Device {
    /// Create a device snapshot.
    pub fn new(
        id: impl Into<DeviceId>,
        name: impl Into<String>,
        services: impl IntoIterator<Item = GattService>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            services: services.into_iter().collect(),
        }
    }

    /// Whether the device advertises `service`.
    pub fn supports(&self, service: GattService) -> bool {
        self.services.contains(&service)
    }

    /// Combine two snapshots of the same device.
    ///
    /// Services are unioned. The newer name wins unless it is empty.
    pub fn merge(&self, newer: &Device) -> Device {
        let name = if newer.name.is_empty() {
            self.name.clone()
        } else {
            newer.name.clone()
        };

        Device {
            id: self.id.clone(),
            name,
            services: self.services.union(&newer.services).copied().collect(),
        }
    }

    /// Field-by-field comparison, unlike `==`.
    pub fn same_snapshot(&self, other: &Device) -> bool {
        self.id == other.id && self.name == other.name && self.services == other.services
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Device {}

impl Hash for Device {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.name, self.id)
    }
}

/// Heart Rate Measurement payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HrmMeasurement {
    /// Heart rate in BPM
    pub hrm: u16,
}

/// Crank half of a CSC Measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CadenceMeasurement {
    /// Cumulative crank revolutions
    pub ccr: u16,
    /// Last crank event time (1/1024 s)
    pub lcet: u16,
}

/// Wheel half of a CSC Measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpeedMeasurement {
    /// Cumulative wheel revolutions
    pub cwr: u32,
    /// Last wheel event time (1/1024 s)
    pub lwet: u16,
}

/// Cycling Power Measurement payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PowerMeasurement {
    /// Instantaneous power in watts
    pub power: i16,
}

/// One decoded notification together with the device it came from.
#[derive(Debug, Clone)]
pub struct MeasurementEvent<T> {
    /// Originating device
    pub device: Arc<Device>,
    /// Decoded payload
    pub measurement: T,
}

impl<T> MeasurementEvent<T> {
    /// Create an event.
    pub fn new(device: Arc<Device>, measurement: T) -> Self {
        Self {
            device,
            measurement,
        }
    }
}

/// Heart rate event.
pub type HrmEvent = MeasurementEvent<HrmMeasurement>;
/// Crank event.
pub type CadenceEvent = MeasurementEvent<CadenceMeasurement>;
/// Wheel event.
pub type SpeedEvent = MeasurementEvent<SpeedMeasurement>;
/// Power event.
pub type PowerEvent = MeasurementEvent<PowerMeasurement>;
/// FE-C trainer event.
pub type TrainerEvent = MeasurementEvent<TrainerData>;

/// Errors raised while turning raw notifications into measurements.
#[derive(Debug, Error)]
pub enum SensorError {
    /// Payload shorter than its flags announce
    #[error("Malformed {service} payload ({len} bytes)")]
    MalformedPayload { service: GattService, len: usize },

    /// Service or characteristic UUID not handled by this core
    #[error("Unsupported service: {0}")]
    UnsupportedService(Uuid),

    /// FE-C data page without a model here
    #[error("Unknown FE-C data page: {0}")]
    UnknownTrainerPage(u8),
}
