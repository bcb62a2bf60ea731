//! RideHud - replay a synthetic ride through the sensor core.
//!
//! Loads the configuration, discovers three simulated sensors, streams their notifications
//! from separate threads and prints the final workout snapshot as JSON.

use anyhow::Context;
use ridehud::model::Model;
use ridehud::sensors::types::SensorRole;
use ridehud::storage::config;
use std::sync::{Arc, Weak};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod simulator;

const RIDE_SECONDS: u32 = 120;

fn main() -> anyhow::Result<()> {
    let config = config::load_config().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting RideHud v{}", env!("CARGO_PKG_VERSION"));

    let model = Arc::new(Model::with_settings(&config.sensors));
    let notifications = model.notifications();

    notifications.device_selected.subscribe(|selected| {
        tracing::info!("{} -> {}", selected.role, selected.device);
    });

    if config.sensors.auto_select {
        // Binding only touches channel state, never the device table
        let weak: Weak<Model> = Arc::downgrade(&model);
        notifications.device_discovered.subscribe(move |discovered| {
            if let Some(model) = weak.upgrade() {
                model.set_device(&discovered.device);
            }
        });
    }

    let snapshots = notifications.measurements.receiver();

    let ride = simulator::SimulatedRide::new(RIDE_SECONDS, model.wheel_circumference_mm());
    for device in ride.devices() {
        model.add_device(device);
    }

    if !config.sensors.auto_select {
        model.set_heart_rate_monitor(Arc::clone(&ride.heart_rate_monitor));
        model.set_cadence_sensor(Arc::clone(&ride.speed_cadence_sensor));
        model.set_speed_sensor(Arc::clone(&ride.speed_cadence_sensor));
        model.set_power_meter(Arc::clone(&ride.power_meter));
    }

    for role in [
        SensorRole::HeartRate,
        SensorRole::Cadence,
        SensorRole::Speed,
        SensorRole::Power,
    ] {
        if model.bound_device(role).is_none() {
            tracing::warn!("No {} source bound, no {} selected", role, role.service());
        }
    }

    ride.run(&model).context("Simulated ride failed")?;

    let published = snapshots.try_iter().count();
    tracing::info!("Ride finished, {} snapshots published", published);

    let summary = model.snapshot();
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to serialize snapshot")?
    );

    Ok(())
}
