// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Application configuration loaded from environment variables.
//!
//! The Garmin password is a secret: it lives in the environment (or a .env
//! file locally) and is redacted from Debug output.

use crate::services::ExtractMode;
use crate::time_utils::DateRange;
use chrono::NaiveDate;
use std::env;
use std::fmt;

/// Application configuration, loaded once at startup.
#[derive(Clone)]
pub struct Config {
    /// Stable user identifier the credentials and telemetry are keyed by.
    pub user_id: String,
    /// Garmin Connect login email.
    pub garmin_username: String,
    /// Garmin Connect password.
    pub garmin_password: String,
    /// History window for mode-driven runs.
    pub extract_mode: ExtractMode,
    /// Explicit date range; overrides the mode window when set.
    pub range: Option<DateRange>,
    /// Restrict extraction to one device (ID or model name).
    pub device_filter: Option<String>,
    /// Directory the file sink writes into.
    pub output_dir: String,
    /// GCP project ID for Firestore.
    pub gcp_project_id: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            user_id: "test-user".to_string(),
            garmin_username: "test@example.com".to_string(),
            garmin_password: "test_password".to_string(),
            extract_mode: ExtractMode::Default,
            range: None,
            device_filter: None,
            output_dir: "data".to_string(),
            gcp_project_id: "test-project".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let start = parse_date_var("EXTRACT_START_DATE")?;
        let end = parse_date_var("EXTRACT_END_DATE")?;
        let range = match (start, end) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end).ok_or_else(|| {
                ConfigError::Invalid(
                    "EXTRACT_START_DATE",
                    format!("start {} is after end {}", start, end),
                )
            })?),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid(
                    "EXTRACT_START_DATE",
                    "EXTRACT_START_DATE and EXTRACT_END_DATE must be set together".to_string(),
                ))
            }
        };

        Ok(Self {
            user_id: env::var("GARMIN_USER_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GARMIN_USER_ID"))?,
            garmin_username: env::var("GARMIN_USERNAME")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GARMIN_USERNAME"))?,
            garmin_password: env::var("GARMIN_PASSWORD")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GARMIN_PASSWORD"))?,
            extract_mode: ExtractMode::parse(
                &env::var("EXTRACT_MODE").unwrap_or_else(|_| "default".to_string()),
            ),
            range,
            device_filter: env::var("DEVICE_FILTER")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            output_dir: env::var("OUTPUT_DIR").unwrap_or_else(|_| "data".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("user_id", &self.user_id)
            .field("garmin_username", &self.garmin_username)
            .field("garmin_password", &"<redacted>")
            .field("extract_mode", &self.extract_mode)
            .field("range", &self.range)
            .field("device_filter", &self.device_filter)
            .field("output_dir", &self.output_dir)
            .field("gcp_project_id", &self.gcp_project_id)
            .finish()
    }
}

/// Parse an optional `YYYY-MM-DD` environment variable.
fn parse_date_var(name: &'static str) -> Result<Option<NaiveDate>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid(name, e.to_string())),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
