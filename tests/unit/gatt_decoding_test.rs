//! Unit tests for GATT payload decoding.

use ridehud::sensors::fec::{FeState, TrainerData};
use ridehud::sensors::gatt::{
    decode_csc_measurement, decode_cycling_power_measurement, decode_fec_message,
    decode_heart_rate_measurement, encode_fec_message, CSC_MEASUREMENT_UUID,
    FEC_BIKE_TRAINER_SERVICE_UUID,
};
use ridehud::sensors::types::{GattService, SensorError};
use uuid::Uuid;

#[test]
fn test_heart_rate_ignores_trailing_rr_intervals() {
    // Flags: 0x10 (RR present, 8-bit HR), HR: 72, RR: 0x0340
    let data = [0x10, 0x48, 0x40, 0x03];
    assert_eq!(decode_heart_rate_measurement(&data).unwrap().hrm, 72);
}

#[test]
fn test_heart_rate_error_names_service() {
    let err = decode_heart_rate_measurement(&[]).unwrap_err();
    assert!(matches!(
        err,
        SensorError::MalformedPayload {
            service: GattService::HeartRate,
            len: 0
        }
    ));
    assert_eq!(err.to_string(), "Malformed Heart Rate Monitor payload (0 bytes)");
}

#[test]
fn test_csc_wheel_only() {
    let data = [0x01, 0xE8, 0x03, 0x00, 0x00, 0x00, 0x10];
    let csc = decode_csc_measurement(&data).unwrap();

    let speed = csc.speed.unwrap();
    assert_eq!(speed.cwr, 1000);
    assert_eq!(speed.lwet, 0x1000);
    assert!(csc.cadence.is_none());
}

#[test]
fn test_csc_no_flags() {
    let csc = decode_csc_measurement(&[0x00]).unwrap();
    assert!(csc.speed.is_none());
    assert!(csc.cadence.is_none());
}

#[test]
fn test_csc_crank_truncated() {
    // Wheel data complete, crank data cut short
    let data = [0x03, 0xE8, 0x03, 0x00, 0x00, 0x00, 0x10, 0x05];
    assert!(decode_csc_measurement(&data).is_err());
}

#[test]
fn test_negative_power_is_preserved() {
    let data = [0x00, 0x00, 0xF6, 0xFF];
    assert_eq!(decode_cycling_power_measurement(&data).unwrap().power, -10);
}

#[test]
fn test_power_too_short() {
    assert!(decode_cycling_power_measurement(&[0x00, 0x00, 0xC8]).is_err());
}

#[test]
fn test_fec_general_settings_through_framing() {
    // Cycle length 2.10 m, incline 1.50 %, resistance 25 %, ready
    let page = [0x11, 0xFF, 0xFF, 0xD2, 0x96, 0x00, 0x32, 0x20];
    let message = encode_fec_message(1, &page);

    let TrainerData::GeneralSettings(settings) = decode_fec_message(&message).unwrap() else {
        panic!("expected general settings");
    };
    assert!((settings.cycle_length_m - 2.1).abs() < 1e-6);
    assert!((settings.incline_pct.unwrap() - 1.5).abs() < 1e-6);
    assert!((settings.resistance_pct - 25.0).abs() < 1e-6);
    assert_eq!(settings.status.state, FeState::Ready);
}

#[test]
fn test_fec_unknown_page() {
    let message = encode_fec_message(0, &[0x30, 0, 0, 0, 0, 0, 0, 0]);
    assert!(matches!(
        decode_fec_message(&message),
        Err(SensorError::UnknownTrainerPage(0x30))
    ));
}

#[test]
fn test_fec_corrupted_page_fails_checksum() {
    let page = [0x19, 0x01, 0x5A, 0x00, 0x00, 0xC8, 0x00, 0x30];
    let mut message = encode_fec_message(0, &page);
    // Power byte flipped in transit
    message[9] ^= 0x01;

    assert!(matches!(
        decode_fec_message(&message),
        Err(SensorError::MalformedPayload {
            service: GattService::FecBikeTrainer,
            len: 13
        })
    ));
}

#[test]
fn test_fec_short_message() {
    assert!(decode_fec_message(&[0xA4, 0x09, 0x4E]).is_err());
}

#[test]
fn test_service_classification() {
    assert_eq!(
        GattService::from_service_uuid(&FEC_BIKE_TRAINER_SERVICE_UUID),
        Some(GattService::FecBikeTrainer)
    );
    assert_eq!(
        GattService::CyclingSpeedCadence.measurement_uuid(),
        CSC_MEASUREMENT_UUID
    );
    assert_eq!(
        CSC_MEASUREMENT_UUID,
        Uuid::from_u128(0x00002a5b_0000_1000_8000_00805f9b34fb)
    );
}
