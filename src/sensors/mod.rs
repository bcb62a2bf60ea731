//! Sensor module: device identity, GATT decoding and measurement payloads.

pub mod fec;
pub mod gatt;
pub mod types;

pub use fec::{FeState, GeneralData, GeneralSettings, SpecificTrainerData, TrainerData};
pub use gatt::{
    decode_csc_measurement, decode_cycling_power_measurement, decode_fec_message,
    decode_heart_rate_measurement, CscData,
};
pub use types::{
    CadenceMeasurement, Device, DeviceId, GattService, HrmMeasurement, MeasurementEvent,
    PowerMeasurement, SensorError, SensorRole, SpeedMeasurement,
};
