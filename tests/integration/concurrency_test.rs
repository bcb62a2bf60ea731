//! Concurrent producers and re-entrant subscribers.

use super::sensor_mock::{heart_rate_monitor, power_meter, speed_cadence_sensor, MockSensorData};
use ridehud::sensors::types::GattService;
use ridehud::Model;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

const REPORTS: usize = 500;

#[test]
fn test_parallel_streams() {
    let model = Arc::new(Model::with_wheel_circumference(2000));
    let hrm = heart_rate_monitor("HRM-1");
    let csc = speed_cadence_sensor("CSC-1");
    let pm = power_meter("PM-1");
    for device in [&hrm, &csc, &pm] {
        model.add_device(Arc::clone(device));
        model.set_device(device);
    }

    let snapshots = model.notifications().measurements.receiver();

    let handles = vec![
        {
            let model = Arc::clone(&model);
            thread::spawn(move || {
                let mock = MockSensorData::default();
                for _ in 0..REPORTS {
                    model
                        .ingest(&hrm, GattService::HeartRate, &mock.generate_heart_rate())
                        .unwrap();
                }
            })
        },
        {
            let model = Arc::clone(&model);
            thread::spawn(move || {
                let mut mock = MockSensorData::default();
                for _ in 0..REPORTS {
                    model
                        .ingest(&csc, GattService::CyclingSpeedCadence, &mock.generate_csc())
                        .unwrap();
                    mock.tick(1, 4);
                }
            })
        },
        {
            let model = Arc::clone(&model);
            thread::spawn(move || {
                let mock = MockSensorData::default();
                for _ in 0..REPORTS {
                    model
                        .ingest(&pm, GattService::CyclingPower, &mock.generate_power())
                        .unwrap();
                }
            })
        },
    ];

    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = model.snapshot();
    assert_eq!(snapshot.heart_rate.count, REPORTS as u64);
    assert_eq!(snapshot.power.count, REPORTS as u64);
    assert_eq!(snapshot.cadence.count, (REPORTS - 1) as u64);
    assert_eq!(snapshot.speed.count, (REPORTS - 1) as u64);
    assert_eq!(snapshot.cadence.latest, 60);
    assert!((snapshot.power.average - 200.0).abs() < 1e-9);

    // One snapshot per accepted event, speed and cadence counted separately
    assert_eq!(snapshots.try_iter().count(), 4 * REPORTS - 2);
}

#[test]
fn test_handlers_can_read_the_model() {
    let model = Arc::new(Model::new());
    let pm = power_meter("PM-1");
    model.add_device(Arc::clone(&pm));
    model.set_power_meter(Arc::clone(&pm));

    let reads = Arc::new(AtomicUsize::new(0));
    {
        let weak = Arc::downgrade(&model);
        let reads = Arc::clone(&reads);
        model.notifications().measurements.subscribe(move |published| {
            let Some(model) = weak.upgrade() else {
                return;
            };
            assert_eq!(model.get_devices(None).len(), 1);
            assert_eq!(model.snapshot().power.count, published.power.count);
            assert_eq!(model.power_statistics().latest(), published.power.latest);
            reads.fetch_add(1, Ordering::SeqCst);
        });
    }

    let mock = MockSensorData::default();
    for _ in 0..3 {
        model
            .ingest(&pm, GattService::CyclingPower, &mock.generate_power())
            .unwrap();
    }

    assert_eq!(reads.load(Ordering::SeqCst), 3);
}

#[test]
fn test_discovery_handler_selects_device() {
    let model = Arc::new(Model::new());
    {
        let weak = Arc::downgrade(&model);
        model.notifications().device_discovered.subscribe(move |discovered| {
            if let Some(model) = weak.upgrade() {
                model.set_device(&discovered.device);
            }
        });
    }

    let selected = Arc::new(AtomicUsize::new(0));
    {
        let selected = Arc::clone(&selected);
        model.notifications().device_selected.subscribe(move |_| {
            selected.fetch_add(1, Ordering::SeqCst);
        });
    }

    model.add_device(speed_cadence_sensor("CSC-1"));
    model.add_device(power_meter("PM-1"));

    // Cadence + speed, then power
    assert_eq!(selected.load(Ordering::SeqCst), 3);
    assert!(model
        .bound_device(ridehud::SensorRole::Speed)
        .is_some_and(|device| device.id.as_str() == "CSC-1"));
}

#[test]
fn test_panicking_handler_does_not_poison_model() {
    let model = Arc::new(Model::new());
    let pm = power_meter("PM-1");
    model.set_power_meter(Arc::clone(&pm));

    model.notifications().measurements.subscribe(|published| {
        if published.power.count == 1 {
            panic!("subscriber failure");
        }
    });

    let mock = MockSensorData::default();
    let worker = {
        let model = Arc::clone(&model);
        let pm = Arc::clone(&pm);
        let payload = mock.generate_power();
        thread::spawn(move || model.ingest(&pm, GattService::CyclingPower, &payload))
    };
    assert!(worker.join().is_err());

    model
        .ingest(&pm, GattService::CyclingPower, &mock.generate_power())
        .unwrap();
    assert_eq!(model.power_statistics().count(), 2);
}
