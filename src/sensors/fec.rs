//! ANT+ FE-C (Fitness Equipment Control) data pages carried over BLE.
//!
//! Legacy smart trainers tunnel ANT messages through a vendor GATT characteristic.
//! Only the three pages the HUD cares about are modelled.

use crate::sensors::types::SensorError;
use serde::{Deserialize, Serialize};

/// General FE data page number.
pub const GENERAL_DATA_PAGE: u8 = 0x10;
/// General settings page number.
pub const GENERAL_SETTINGS_PAGE: u8 = 0x11;
/// Specific trainer data page number.
pub const SPECIFIC_TRAINER_DATA_PAGE: u8 = 0x19;

/// Fitness equipment state (bits 4-6 of the last page byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeState {
    Asleep,
    Ready,
    InUse,
    Finished,
    #[default]
    Unknown,
}

/// State byte shared by every FE page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeStatus {
    pub state: FeState,
    pub lap_toggle: bool,
}

impl From<u8> for FeStatus {
    fn from(value: u8) -> Self {
        let state = match (value >> 4) & 0x07 {
            1 => FeState::Asleep,
            2 => FeState::Ready,
            3 => FeState::InUse,
            4 => FeState::Finished,
            _ => FeState::Unknown,
        };

        Self {
            state,
            lap_toggle: (value & 0x80) != 0,
        }
    }
}

/// General FE data page (16).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneralData {
    /// Elapsed time in seconds (rolls over at 64 s)
    pub elapsed_time_s: f32,
    /// Distance traveled in meters (rolls over at 256 m)
    pub distance_m: u8,
    /// Speed in m/s, if reported
    pub speed_mps: Option<f32>,
    /// Heart rate picked up by the equipment, if any
    pub heart_rate: Option<u8>,
    pub status: FeStatus,
}

/// General settings page (17).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Cycle length in meters
    pub cycle_length_m: f32,
    /// Incline in percent (-100..=100), if valid
    pub incline_pct: Option<f32>,
    /// Resistance as a percentage of maximum
    pub resistance_pct: f32,
    pub status: FeStatus,
}

/// Specific trainer/stationary bike data page (25).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpecificTrainerData {
    /// Increments with every new page
    pub event_count: u8,
    /// Instantaneous cadence in RPM
    pub cadence_rpm: Option<u8>,
    /// Accumulated power in watts (rolls over at 65536)
    pub accumulated_power: Option<u16>,
    /// Instantaneous power in watts (12 bits)
    pub instantaneous_power: Option<u16>,
    pub status: FeStatus,
}

/// Any FE-C page the core understands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum TrainerData {
    GeneralData(GeneralData),
    GeneralSettings(GeneralSettings),
    SpecificTrainerData(SpecificTrainerData),
}

impl TrainerData {
    /// Parse an 8-byte FE-C data page.
    pub fn parse_page(page: &[u8]) -> Result<Self, SensorError> {
        if page.len() < 8 {
            return Err(SensorError::MalformedPayload {
                service: crate::sensors::types::GattService::FecBikeTrainer,
                len: page.len(),
            });
        }

        match page[0] {
            GENERAL_DATA_PAGE => Ok(TrainerData::GeneralData(parse_general_data(page))),
            GENERAL_SETTINGS_PAGE => Ok(TrainerData::GeneralSettings(parse_general_settings(page))),
            SPECIFIC_TRAINER_DATA_PAGE => Ok(TrainerData::SpecificTrainerData(
                parse_specific_trainer_data(page),
            )),
            other => Err(SensorError::UnknownTrainerPage(other)),
        }
    }
}

fn parse_general_data(page: &[u8]) -> GeneralData {
    let speed_raw = u16::from_le_bytes([page[4], page[5]]);

    GeneralData {
        elapsed_time_s: page[2] as f32 * 0.25,
        distance_m: page[3],
        // 0.001 m/s units, 0xFFFF = invalid
        speed_mps: (speed_raw != 0xFFFF).then(|| speed_raw as f32 * 0.001),
        heart_rate: (page[6] != 0xFF).then_some(page[6]),
        status: page[7].into(),
    }
}

fn parse_general_settings(page: &[u8]) -> GeneralSettings {
    let incline_raw = i16::from_le_bytes([page[4], page[5]]);
    // 0.01 % units, 0x7FFF = invalid
    let incline_pct = if incline_raw == i16::MAX {
        None
    } else {
        Some(incline_raw as f32 * 0.01).filter(|pct| (-100.0..=100.0).contains(pct))
    };

    GeneralSettings {
        cycle_length_m: page[3] as f32 * 0.01,
        incline_pct,
        resistance_pct: page[6] as f32 * 0.5,
        status: page[7].into(),
    }
}

fn parse_specific_trainer_data(page: &[u8]) -> SpecificTrainerData {
    // Instantaneous power is 12 bits: byte 5 plus the low nibble of byte 6
    let instantaneous = u16::from(page[5]) | (u16::from(page[6] & 0x0F) << 8);
    let (instantaneous_power, accumulated_power) = if instantaneous == 0x0FFF {
        (None, None)
    } else {
        (
            Some(instantaneous),
            Some(u16::from_le_bytes([page[3], page[4]])),
        )
    };

    SpecificTrainerData {
        event_count: page[1],
        cadence_rpm: (page[2] != 0xFF).then_some(page[2]),
        accumulated_power,
        instantaneous_power,
        status: page[7].into(),
    }
}
