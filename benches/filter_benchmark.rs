// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

use criterion::{criterion_group, criterion_main, Criterion};
use garmin_harvest::devices::profiles::FORERUNNER_235;
use garmin_harvest::devices::CapabilityRegistry;
use garmin_harvest::filter::{filter_by_device, filter_value};
use garmin_harvest::models::{Device, MetricKind};
use serde_json::{json, Value};
use std::hint::black_box;

fn minute_samples(device_id: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "deviceId": device_id,
                "timestamp": 1_712_000_000_u64 + (i as u64) * 60,
                "value": 60 + (i % 40) as u64,
                "heartRate": 60 + (i % 40) as u64,
                "hrvStatus": "BALANCED",
                "bodyBattery": 70,
                "pulseOx": 96
            })
        })
        .collect()
}

fn benchmark_capability_filter(c: &mut Criterion) {
    let registry = CapabilityRegistry::standard();
    let profile = registry.lookup(FORERUNNER_235);

    // A day of per-minute heart-rate samples from one watch.
    let single_day = Value::Array(minute_samples("3991784102", 1440));

    // The same day split across a profiled watch and an unprofiled one.
    let fleet = vec![
        Device {
            device_id: "3991784102".to_string(),
            model_name: FORERUNNER_235.to_string(),
            device_type: "wearable".to_string(),
        },
        Device {
            device_id: "venu-9".to_string(),
            model_name: "Venu 3".to_string(),
            device_type: "wearable".to_string(),
        },
    ];
    let mut mixed_samples = minute_samples("3991784102", 720);
    mixed_samples.extend(minute_samples("venu-9", 720));
    let mixed_day = Value::Array(mixed_samples);

    let mut group = c.benchmark_group("capability_filter");

    group.bench_function("profiled_day_of_heart_rate", |b| {
        b.iter(|| filter_value(black_box(&single_day), MetricKind::HeartRate, profile))
    });

    group.bench_function("mixed_fleet_day_of_heart_rate", |b| {
        b.iter(|| {
            filter_by_device(
                black_box(&mixed_day),
                MetricKind::HeartRate,
                &registry,
                &fleet,
            )
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_capability_filter);
criterion_main!(benches);
