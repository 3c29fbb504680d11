// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Registered wearable device as enumerated by the provider.

use serde::{Deserialize, Deserializer, Serialize};

/// A device registered to the account.
///
/// Enumerated fresh on every run; never cached across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Provider device ID. Garmin serves this as a number in some payloads
    /// and a string in others.
    #[serde(rename = "deviceId", deserialize_with = "string_or_number")]
    pub device_id: String,
    /// Marketing model name (e.g. "Forerunner 235")
    #[serde(rename = "productDisplayName", default)]
    pub model_name: String,
    /// Device category (e.g. "wearable")
    #[serde(rename = "deviceTypePk", alias = "deviceType", default)]
    pub device_type: String,
}

impl Device {
    /// Whether a user-supplied device filter selects this device.
    /// Matches the exact device ID or the model name (case-insensitive).
    pub fn matches_filter(&self, filter: &str) -> bool {
        self.device_id == filter || self.model_name.eq_ignore_ascii_case(filter)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for device ID, got {}",
            other
        ))),
    }
}
