//! Mock sensor devices and notification payloads.
//!
//! Generates raw GATT payloads the way real straps, pods and trainers send them so the
//! integration tests can drive the model through `Model::ingest`.

use ridehud::sensors::gatt::{
    decode_csc_measurement, decode_cycling_power_measurement, decode_fec_message,
    decode_heart_rate_measurement, encode_fec_message,
};
use ridehud::sensors::fec::TrainerData;
use ridehud::sensors::types::{Device, GattService};
use std::sync::Arc;

/// Heart rate strap.
pub fn heart_rate_monitor(id: &str) -> Arc<Device> {
    Arc::new(Device::new(id, "Mock HRM", [GattService::HeartRate]))
}

/// Combined speed/cadence pod.
pub fn speed_cadence_sensor(id: &str) -> Arc<Device> {
    Arc::new(Device::new(id, "Mock CSC", [GattService::CyclingSpeedCadence]))
}

/// Standalone power meter.
pub fn power_meter(id: &str) -> Arc<Device> {
    Arc::new(Device::new(id, "Mock PM", [GattService::CyclingPower]))
}

/// Smart trainer exposing FE-C and cycling power.
pub fn smart_trainer(id: &str) -> Arc<Device> {
    Arc::new(Device::new(
        id,
        "Mock Trainer",
        [GattService::FecBikeTrainer, GattService::CyclingPower],
    ))
}

/// Mock sensor state; every `tick` advances the counters by one second.
pub struct MockSensorData {
    /// Current heart rate
    pub heart_rate: u8,
    /// Current power
    pub power: i16,
    /// Cumulative crank revolutions
    pub crank_revolutions: u16,
    /// Last crank event time (1/1024 s)
    pub crank_event_time: u16,
    /// Cumulative wheel revolutions
    pub wheel_revolutions: u32,
    /// Last wheel event time (1/1024 s)
    pub wheel_event_time: u16,
    /// FE-C event counter
    pub trainer_events: u8,
}

impl Default for MockSensorData {
    fn default() -> Self {
        Self {
            heart_rate: 145,
            power: 200,
            crank_revolutions: 0,
            crank_event_time: 0,
            wheel_revolutions: 0,
            wheel_event_time: 0,
            trainer_events: 0,
        }
    }
}

impl MockSensorData {
    /// Advance one second: `crank` and `wheel` revolutions completed exactly on the second.
    pub fn tick(&mut self, crank: u16, wheel: u32) {
        self.crank_revolutions = self.crank_revolutions.wrapping_add(crank);
        self.crank_event_time = self.crank_event_time.wrapping_add(1024);
        self.wheel_revolutions = self.wheel_revolutions.wrapping_add(wheel);
        self.wheel_event_time = self.wheel_event_time.wrapping_add(1024);
        self.trainer_events = self.trainer_events.wrapping_add(1);
    }

    /// Heart Rate Measurement packet (8-bit format).
    pub fn generate_heart_rate(&self) -> Vec<u8> {
        vec![0x00, self.heart_rate]
    }

    /// CSC Measurement packet with crank data only.
    pub fn generate_crank(&self) -> Vec<u8> {
        let mut data = vec![0x02];
        data.extend_from_slice(&self.crank_revolutions.to_le_bytes());
        data.extend_from_slice(&self.crank_event_time.to_le_bytes());
        data
    }

    /// CSC Measurement packet with wheel and crank data.
    pub fn generate_csc(&self) -> Vec<u8> {
        let mut data = vec![0x03];
        data.extend_from_slice(&self.wheel_revolutions.to_le_bytes());
        data.extend_from_slice(&self.wheel_event_time.to_le_bytes());
        data.extend_from_slice(&self.crank_revolutions.to_le_bytes());
        data.extend_from_slice(&self.crank_event_time.to_le_bytes());
        data
    }

    /// Cycling Power Measurement packet without optional fields.
    pub fn generate_power(&self) -> Vec<u8> {
        let mut data = vec![0x00, 0x00];
        data.extend_from_slice(&self.power.to_le_bytes());
        data
    }

    /// FE-C specific trainer data page (25) in an ANT broadcast message.
    pub fn generate_trainer_data(&self) -> Vec<u8> {
        let watts = self.power.max(0) as u16;
        let page = [
            0x19,
            self.trainer_events,
            0x5A,
            0x00,
            0x00,
            (watts & 0xFF) as u8,
            ((watts >> 8) & 0x0F) as u8,
            0x30,
        ];
        encode_fec_message(0, &page)
    }

    /// FE-C general data page (16) in an ANT broadcast message.
    pub fn generate_general_data(&self) -> Vec<u8> {
        encode_fec_message(
            0,
            &[0x10, 0x19, self.trainer_events, 0x00, 0x10, 0x27, 0xFF, 0x30],
        )
    }
}

#[test]
fn test_mock_heart_rate_decodes() {
    let mock = MockSensorData::default();
    let hrm = decode_heart_rate_measurement(&mock.generate_heart_rate()).unwrap();
    assert_eq!(hrm.hrm, 145);
}

#[test]
fn test_mock_csc_decodes() {
    let mut mock = MockSensorData::default();
    mock.tick(1, 4);

    let csc = decode_csc_measurement(&mock.generate_csc()).unwrap();
    let speed = csc.speed.unwrap();
    let cadence = csc.cadence.unwrap();

    assert_eq!(speed.cwr, 4);
    assert_eq!(speed.lwet, 1024);
    assert_eq!(cadence.ccr, 1);
    assert_eq!(cadence.lcet, 1024);

    let crank_only = decode_csc_measurement(&mock.generate_crank()).unwrap();
    assert!(crank_only.speed.is_none());
    assert_eq!(crank_only.cadence, Some(cadence));
}

#[test]
fn test_mock_power_decodes() {
    let mock = MockSensorData {
        power: 250,
        ..Default::default()
    };
    let power = decode_cycling_power_measurement(&mock.generate_power()).unwrap();
    assert_eq!(power.power, 250);
}

#[test]
fn test_mock_trainer_pages_decode() {
    let mock = MockSensorData {
        power: 1234,
        ..Default::default()
    };

    match decode_fec_message(&mock.generate_trainer_data()).unwrap() {
        TrainerData::SpecificTrainerData(data) => {
            assert_eq!(data.instantaneous_power, Some(1234));
            assert_eq!(data.cadence_rpm, Some(90));
        }
        other => panic!("Unexpected page: {:?}", other),
    }

    assert!(matches!(
        decode_fec_message(&mock.generate_general_data()).unwrap(),
        TrainerData::GeneralData(_)
    ));
}
