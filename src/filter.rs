// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Capability filtering of raw telemetry payloads.
//!
//! Pure functions from (record, profile) to a filtered record. Fields a
//! profile marks unsupported are dropped; identity fields and everything
//! the profile does not mention pass through untouched. The filter never
//! fabricates data, it only suppresses fields known to be meaningless for
//! the hardware that produced the record.

use crate::devices::{CapabilityProfile, CapabilityRegistry};
use crate::models::metrics::record_device_id;
use crate::models::{Device, MetricKind};
use serde_json::{Map, Value};

/// Filter a single record against a device profile.
///
/// Identity fields survive regardless of what the profile says about them;
/// the record's key and its date anchor must never be filtered away.
pub fn filter_record(
    record: &Map<String, Value>,
    kind: MetricKind,
    profile: &CapabilityProfile,
) -> Map<String, Value> {
    let identity = kind.identity_fields();
    record
        .iter()
        .filter(|(key, _)| identity.contains(&key.as_str()) || profile.retains(kind, key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Filter an arbitrary payload against one profile.
///
/// Arrays are filtered element-wise, objects as records, and scalar
/// payloads pass through unchanged.
pub fn filter_value(payload: &Value, kind: MetricKind, profile: &CapabilityProfile) -> Value {
    match payload {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| filter_value(item, kind, profile))
                .collect(),
        ),
        Value::Object(record) => Value::Object(filter_record(record, kind, profile)),
        other => other.clone(),
    }
}

/// Filter a payload, resolving the profile per record from the record's own
/// `deviceId` and the discovered device list.
///
/// Records with no `deviceId`, or one that matches no discovered device,
/// pass through unfiltered.
pub fn filter_by_device(
    payload: &Value,
    kind: MetricKind,
    registry: &CapabilityRegistry,
    devices: &[Device],
) -> Value {
    match payload {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| filter_by_device(item, kind, registry, devices))
                .collect(),
        ),
        Value::Object(record) => {
            let profile = record_device_id(record)
                .and_then(|id| devices.iter().find(|d| d.device_id == id))
                .map(|device| registry.lookup(&device.model_name));
            match profile {
                Some(profile) => Value::Object(filter_record(record, kind, profile)),
                None => payload.clone(),
            }
        }
        other => other.clone(),
    }
}
