//! GATT identifiers and measurement payload decoding.
//!
//! Decoders take the raw notification value and return the typed measurement the model
//! consumes. They never look at device state.

use crate::sensors::fec::TrainerData;
use crate::sensors::types::{
    CadenceMeasurement, GattService, HrmMeasurement, PowerMeasurement, SensorError,
    SpeedMeasurement,
};
use uuid::Uuid;

/// Heart Rate Service UUID (0x180D)
pub const HEART_RATE_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000_180d_0000_1000_8000_0080_5f9b_34fb);

/// Heart Rate Measurement UUID (0x2A37)
pub const HEART_RATE_MEASUREMENT_UUID: Uuid =
    Uuid::from_u128(0x0000_2a37_0000_1000_8000_0080_5f9b_34fb);

/// Cycling Speed and Cadence Service UUID (0x1816)
pub const CSC_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_1816_0000_1000_8000_0080_5f9b_34fb);

/// CSC Measurement UUID (0x2A5B)
pub const CSC_MEASUREMENT_UUID: Uuid = Uuid::from_u128(0x0000_2a5b_0000_1000_8000_0080_5f9b_34fb);

/// Cycling Power Service UUID (0x1818)
pub const CYCLING_POWER_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000_1818_0000_1000_8000_0080_5f9b_34fb);

/// Cycling Power Measurement UUID (0x2A63)
pub const CYCLING_POWER_MEASUREMENT_UUID: Uuid =
    Uuid::from_u128(0x0000_2a63_0000_1000_8000_0080_5f9b_34fb);

/// FE-C over BLE service UUID
pub const FEC_BIKE_TRAINER_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x6e40_fec1_b5a3_f393_e0a9_e50e_24dc_ca9e);

/// FE-C over BLE trainer-to-host characteristic UUID
pub const FEC_BIKE_TRAINER_TX_UUID: Uuid =
    Uuid::from_u128(0x6e40_fec2_b5a3_f393_e0a9_e50e_24dc_ca9e);

/// ANT message sync byte.
pub const ANT_SYNC: u8 = 0xA4;

/// ANT broadcast data message id.
pub const ANT_BROADCAST_DATA: u8 = 0x4E;

fn malformed(service: GattService, data: &[u8]) -> SensorError {
    SensorError::MalformedPayload {
        service,
        len: data.len(),
    }
}

/// Decode a Heart Rate Measurement notification.
///
/// Bit 0 of the flags selects an 8-bit or 16-bit heart rate value. Energy expended and
/// RR intervals that may follow are ignored.
pub fn decode_heart_rate_measurement(data: &[u8]) -> Result<HrmMeasurement, SensorError> {
    let service = GattService::HeartRate;
    let flags = *data.first().ok_or_else(|| malformed(service, data))?;

    let hrm = if (flags & 0x01) != 0 {
        if data.len() < 3 {
            return Err(malformed(service, data));
        }
        u16::from_le_bytes([data[1], data[2]])
    } else {
        if data.len() < 2 {
            return Err(malformed(service, data));
        }
        u16::from(data[1])
    };

    Ok(HrmMeasurement { hrm })
}

/// Wheel and crank data carried by one CSC Measurement notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CscData {
    /// Present when flag bit 0 is set
    pub speed: Option<SpeedMeasurement>,
    /// Present when flag bit 1 is set
    pub cadence: Option<CadenceMeasurement>,
}

/// Decode a CSC Measurement notification.
///
/// The data format is:
/// - Byte 0: Flags
/// - Wheel revolution data (bit 0): u32 cumulative revolutions, u16 last event time
/// - Crank revolution data (bit 1): u16 cumulative revolutions, u16 last event time
pub fn decode_csc_measurement(data: &[u8]) -> Result<CscData, SensorError> {
    let service = GattService::CyclingSpeedCadence;
    let flags = *data.first().ok_or_else(|| malformed(service, data))?;
    let mut result = CscData::default();
    let mut offset = 1usize;

    if (flags & 0x01) != 0 {
        if offset + 6 > data.len() {
            return Err(malformed(service, data));
        }
        result.speed = Some(SpeedMeasurement {
            cwr: u32::from_le_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ]),
            lwet: u16::from_le_bytes([data[offset + 4], data[offset + 5]]),
        });
        offset += 6;
    }

    if (flags & 0x02) != 0 {
        if offset + 4 > data.len() {
            return Err(malformed(service, data));
        }
        result.cadence = Some(CadenceMeasurement {
            ccr: u16::from_le_bytes([data[offset], data[offset + 1]]),
            lcet: u16::from_le_bytes([data[offset + 2], data[offset + 3]]),
        });
    }

    Ok(result)
}

/// Decode a Cycling Power Measurement notification.
///
/// Only the mandatory instantaneous power field (bytes 2-3, signed) is read.
pub fn decode_cycling_power_measurement(data: &[u8]) -> Result<PowerMeasurement, SensorError> {
    if data.len() < 4 {
        return Err(malformed(GattService::CyclingPower, data));
    }

    Ok(PowerMeasurement {
        power: i16::from_le_bytes([data[2], data[3]]),
    })
}

/// Decode an ANT FE-C message tunnelled through the trainer characteristic.
///
/// Framing: sync, length, message id, channel, 8-byte data page, checksum.
pub fn decode_fec_message(data: &[u8]) -> Result<TrainerData, SensorError> {
    let service = GattService::FecBikeTrainer;
    if data.len() < 4 || data[0] != ANT_SYNC || data[2] != ANT_BROADCAST_DATA {
        return Err(malformed(service, data));
    }

    // The length byte counts the channel number plus the page
    let payload_len = usize::from(data[1]);
    if payload_len < 9 || data.len() < 4 + payload_len {
        return Err(malformed(service, data));
    }

    let checksum_at = 3 + payload_len;
    if checksum(&data[..checksum_at]) != data[checksum_at] {
        tracing::debug!("FE-C checksum mismatch");
        return Err(malformed(service, data));
    }

    TrainerData::parse_page(&data[4..checksum_at])
}

/// Wrap an FE-C data page in an ANT broadcast message.
pub fn encode_fec_message(channel: u8, page: &[u8; 8]) -> Vec<u8> {
    let mut message = vec![ANT_SYNC, 9, ANT_BROADCAST_DATA, channel];
    message.extend_from_slice(page);
    message.push(checksum(&message));
    message
}

/// XOR of every byte, as ANT checksums are computed.
fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, byte| acc ^ byte)
}
