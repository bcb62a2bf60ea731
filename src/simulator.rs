//! Synthetic ride used by the binary.
//!
//! Produces raw GATT notification payloads for a heart rate strap, a speed/cadence sensor
//! and a power meter, and feeds each stream into the model from its own thread the way
//! independent BLE notification callbacks would.

use ridehud::metrics::rate::{EVENT_TIME_MODULUS, TICKS_PER_SECOND};
use ridehud::model::Model;
use ridehud::sensors::types::{Device, GattService, SensorError};
use std::sync::Arc;

/// Event time the CSC counters start from, close enough to the top to wrap early.
const CSC_START_TICKS: u32 = 64_000;

/// A steady ride with a little variation on every channel.
#[derive(Debug, Clone)]
pub struct SimulatedRide {
    /// Reports per stream, one per second
    pub seconds: u32,
    pub heart_rate_bpm: u16,
    pub cadence_rpm: f64,
    pub speed_kmh: f64,
    pub power_watts: i16,
    pub wheel_circumference_mm: u32,
    pub heart_rate_monitor: Arc<Device>,
    pub speed_cadence_sensor: Arc<Device>,
    pub power_meter: Arc<Device>,
}

impl SimulatedRide {
    /// A ride of `seconds` reports per sensor.
    pub fn new(seconds: u32, wheel_circumference_mm: u32) -> Self {
        Self {
            seconds,
            heart_rate_bpm: 138,
            cadence_rpm: 90.0,
            speed_kmh: 32.0,
            power_watts: 210,
            wheel_circumference_mm,
            heart_rate_monitor: Arc::new(Device::new(
                "E4:11:5B:20:71:0C",
                "HRM-Pro",
                [GattService::HeartRate],
            )),
            speed_cadence_sensor: Arc::new(Device::new(
                "C8:3A:91:04:5E:2B",
                "CSC Duo",
                [GattService::CyclingSpeedCadence],
            )),
            power_meter: Arc::new(Device::new(
                "F1:07:33:9A:12:C4",
                "Power Pedals",
                [GattService::CyclingPower],
            )),
        }
    }

    /// Devices the scanner would report.
    pub fn devices(&self) -> [Arc<Device>; 3] {
        [
            Arc::clone(&self.heart_rate_monitor),
            Arc::clone(&self.speed_cadence_sensor),
            Arc::clone(&self.power_meter),
        ]
    }

    /// Heart Rate Measurement payloads (8-bit format).
    pub fn heart_rate_payloads(&self) -> Vec<Vec<u8>> {
        (0..self.seconds)
            .map(|second| {
                let bpm = self.heart_rate_bpm + (second % 5) as u16;
                vec![0x00, bpm.min(255) as u8]
            })
            .collect()
    }

    /// CSC Measurement payloads carrying both wheel and crank data.
    ///
    /// Every other report repeats the previous event times, as a sensor does when no
    /// revolution completed since its last notification.
    pub fn csc_payloads(&self) -> Vec<Vec<u8>> {
        let crank_hz = self.cadence_rpm / 60.0;
        let wheel_hz = self.speed_kmh / 3.6 / (f64::from(self.wheel_circumference_mm) / 1000.0);

        (0..self.seconds)
            .map(|second| {
                let elapsed = f64::from(second - second % 2);

                let crank_revs = (crank_hz * elapsed).floor();
                let wheel_revs = (wheel_hz * elapsed).floor();
                let lcet = event_ticks(crank_revs / crank_hz);
                let lwet = event_ticks(wheel_revs / wheel_hz);

                let mut payload = vec![0x03];
                payload.extend_from_slice(&(wheel_revs as u32).to_le_bytes());
                payload.extend_from_slice(&lwet.to_le_bytes());
                payload.extend_from_slice(&(crank_revs as u16).to_le_bytes());
                payload.extend_from_slice(&lcet.to_le_bytes());
                payload
            })
            .collect()
    }

    /// Cycling Power Measurement payloads without optional fields.
    pub fn power_payloads(&self) -> Vec<Vec<u8>> {
        (0..self.seconds)
            .map(|second| {
                let watts = self.power_watts + ((second % 7) as i16 - 3) * 5;
                let mut payload = vec![0x00, 0x00];
                payload.extend_from_slice(&watts.to_le_bytes());
                payload
            })
            .collect()
    }

    /// Feed all three streams into `model` concurrently.
    pub fn run(&self, model: &Model) -> Result<(), SensorError> {
        let streams = [
            (
                &self.heart_rate_monitor,
                GattService::HeartRate,
                self.heart_rate_payloads(),
            ),
            (
                &self.speed_cadence_sensor,
                GattService::CyclingSpeedCadence,
                self.csc_payloads(),
            ),
            (
                &self.power_meter,
                GattService::CyclingPower,
                self.power_payloads(),
            ),
        ];

        std::thread::scope(|scope| {
            let handles: Vec<_> = streams
                .into_iter()
                .map(|(device, service, payloads)| {
                    scope.spawn(move || -> Result<(), SensorError> {
                        let characteristic = service.measurement_uuid();
                        for payload in &payloads {
                            model.ingest_notification(device, characteristic, payload)?;
                        }
                        tracing::debug!("{} stream finished", service);
                        Ok(())
                    })
                })
                .collect();

            handles.into_iter().try_for_each(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
        })
    }
}

/// Seconds since the start of the ride as a wrapped 1/1024 s event time.
fn event_ticks(seconds: f64) -> u16 {
    let ticks = CSC_START_TICKS + (seconds * TICKS_PER_SECOND).round() as u32;
    (ticks % EVENT_TIME_MODULUS) as u16
}
