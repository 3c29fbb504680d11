// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Metric kinds and helpers for working with raw provider payloads.
//!
//! Payloads are kept as `serde_json::Value` end to end: beyond the identity
//! fields the core treats every provider field as opaque passthrough data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One of the four telemetry streams extracted per date.
///
/// Serializes as its artifact slug so stored documents and run summaries
/// use the same names as the files on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    #[serde(rename = "activities")]
    Activity,
    #[serde(rename = "heart-rate")]
    HeartRate,
    #[serde(rename = "sleep")]
    Sleep,
    #[serde(rename = "steps")]
    Steps,
}

impl MetricKind {
    /// All kinds, in extraction order.
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Activity,
        MetricKind::HeartRate,
        MetricKind::Sleep,
        MetricKind::Steps,
    ];

    /// Artifact-name slug; part of the persisted naming convention, do not
    /// change without migrating stored documents.
    pub fn slug(&self) -> &'static str {
        match self {
            MetricKind::Activity => "activities",
            MetricKind::HeartRate => "heart-rate",
            MetricKind::Sleep => "sleep",
            MetricKind::Steps => "steps",
        }
    }

    /// Fields the capability filter must keep even when a profile marks them
    /// unsupported: record identity plus the kind's required key.
    pub fn identity_fields(&self) -> &'static [&'static str] {
        match self {
            MetricKind::Activity => &["deviceId", "activityId", "startTimeLocal"],
            MetricKind::HeartRate => &["deviceId", "timestamp", "value"],
            MetricKind::Sleep => &["deviceId", "calendarDate"],
            MetricKind::Steps => &["deviceId", "timestamp", "value"],
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Read a record's `deviceId`, tolerating the numeric form Garmin uses in
/// activity payloads.
pub fn record_device_id(record: &Map<String, Value>) -> Option<String> {
    match record.get("deviceId") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether an activity record started on the given calendar date, judged by
/// the `startTimeLocal` prefix (format `YYYY-MM-DD HH:MM:SS`).
pub fn activity_on_date(record: &Map<String, Value>, date: NaiveDate) -> bool {
    record
        .get("startTimeLocal")
        .and_then(Value::as_str)
        .is_some_and(|start| start.starts_with(&date.format("%Y-%m-%d").to_string()))
}

/// Number of records in a payload: array length, zero for null, one for
/// anything else.
pub fn record_count(payload: &Value) -> usize {
    match payload {
        Value::Array(items) => items.len(),
        Value::Null => 0,
        _ => 1,
    }
}
