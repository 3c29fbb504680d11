// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Extraction orchestrator.
//!
//! Walks (date, metric kind) units across a range, fetches raw telemetry
//! through an authenticated session, applies capability filtering, and
//! writes each unit to both sinks. One unit's failure never aborts the
//! run; authentication expiry mid-run is absorbed by exactly one
//! transparent re-login.

use crate::db::{TelemetryDocument, TelemetrySink};
use crate::devices::CapabilityRegistry;
use crate::error::{HarvestError, Result};
use crate::filter;
use crate::models::metrics::{activity_on_date, record_count, record_device_id};
use crate::models::report::{ExtractionReport, ExtractionUnit, UnitStatus};
use crate::models::{Device, MetricKind};
use crate::services::auth::{AuthService, Session};
use crate::services::files::FileSink;
use crate::time_utils::{format_utc_rfc3339, DateRange};
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Activity window fetched per date before narrowing to the calendar day.
const DAILY_ACTIVITY_WINDOW: usize = 100;
/// Activities captured by the recent-activities snapshot.
const RECENT_ACTIVITY_LIMIT: usize = 10;

/// How much history an extract-all run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractMode {
    /// Last two days, for frequent incremental runs.
    Recent,
    /// Last week.
    #[default]
    Default,
    /// Last 30 days, for an initial backfill.
    Historic,
}

impl ExtractMode {
    /// Parse the EXTRACT_MODE configuration value. Unknown values fall back
    /// to the default window.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "recent" => Self::Recent,
            "historic" => Self::Historic,
            _ => Self::Default,
        }
    }

    pub fn days(&self) -> u32 {
        match self {
            Self::Recent => 2,
            Self::Default => 7,
            Self::Historic => 30,
        }
    }
}

/// Drives a full extraction run against the provider and both sinks.
pub struct Extractor {
    auth: AuthService,
    registry: CapabilityRegistry,
    files: FileSink,
    remote: Arc<dyn TelemetrySink>,
}

impl Extractor {
    pub fn new(
        auth: AuthService,
        registry: CapabilityRegistry,
        files: FileSink,
        remote: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            auth,
            registry,
            files,
            remote,
        }
    }

    /// Extract every metric kind for every date in the range.
    ///
    /// Fatal errors (no session, unknown device filter, re-login failure)
    /// abort the run; everything else is recorded per unit and the run
    /// continues. The report is produced even when every unit failed.
    pub async fn extract(
        &self,
        user_id: &str,
        range: &DateRange,
        device_filter: Option<&str>,
    ) -> Result<ExtractionReport> {
        let session = self.auth.session(user_id).await?;

        let devices = session.devices().await?;
        let scoped = match device_filter {
            Some(wanted) => Some(
                devices
                    .iter()
                    .find(|d| d.matches_filter(wanted))
                    .ok_or_else(|| HarvestError::DeviceNotFound(wanted.to_string()))?,
            ),
            None => None,
        };

        if let Err(err) = self.files.ensure_dir().await {
            // File writes will fail per unit; the remote sink may still work.
            tracing::warn!(error = %err, "Could not create output directory");
        }

        tracing::info!(
            user_id,
            start = %range.start(),
            end = %range.end(),
            days = range.len(),
            devices = devices.len(),
            device_filter,
            "Starting extraction run"
        );

        let mut report = ExtractionReport::new();
        // One transparent re-login per run; a second expiry is fatal.
        let mut reauthed = false;

        for date in range.days() {
            for kind in MetricKind::ALL {
                let unit = match scoped {
                    Some(device) => {
                        ExtractionUnit::for_device(date, kind, device.device_id.clone())
                    }
                    None => ExtractionUnit::new(date, kind),
                };
                self.run_unit(
                    user_id,
                    &session,
                    &devices,
                    scoped,
                    unit,
                    &mut report,
                    &mut reauthed,
                )
                .await?;
            }
        }

        tracing::info!(
            user_id,
            total = report.total(),
            succeeded = report.succeeded(),
            degraded = report.degraded(),
            failed = report.failed(),
            "Extraction run complete"
        );

        Ok(report)
    }

    /// Snapshot the account profile to `user-profile.json`.
    pub async fn extract_user_profile(&self, user_id: &str) -> Result<PathBuf> {
        let session = self.auth.session(user_id).await?;
        self.files.ensure_dir().await?;
        let profile = session.user_profile().await?;
        self.files.write("user-profile.json", &profile).await
    }

    /// Snapshot the newest activities to `recent-activities.json`.
    pub async fn extract_recent_activities(&self, user_id: &str) -> Result<PathBuf> {
        let session = self.auth.session(user_id).await?;
        self.files.ensure_dir().await?;
        let activities = session.activities(0, RECENT_ACTIVITY_LIMIT).await?;
        self.files.write("recent-activities.json", &activities).await
    }

    /// Full run: profile and recent-activity snapshots, then the dated
    /// range the mode selects (ending today).
    ///
    /// Snapshots are best effort; only the dated range decides the
    /// run's outcome.
    pub async fn extract_all(
        &self,
        user_id: &str,
        mode: ExtractMode,
        device_filter: Option<&str>,
    ) -> Result<ExtractionReport> {
        if let Err(err) = self.extract_user_profile(user_id).await {
            tracing::warn!(error = %err, "User profile snapshot failed");
        }
        if let Err(err) = self.extract_recent_activities(user_id).await {
            tracing::warn!(error = %err, "Recent activities snapshot failed");
        }

        let range = DateRange::last_n_days(mode.days(), Utc::now().date_naive());
        self.extract(user_id, &range, device_filter).await
    }

    /// Fetch, filter, and persist a single unit, recording its outcome.
    ///
    /// Returns Err only for failures that are fatal to the whole run.
    #[allow(clippy::too_many_arguments)]
    async fn run_unit(
        &self,
        user_id: &str,
        session: &Session,
        devices: &[Device],
        scoped: Option<&Device>,
        unit: ExtractionUnit,
        report: &mut ExtractionReport,
        reauthed: &mut bool,
    ) -> Result<()> {
        let raw = match self.fetch_unit(session, &unit).await {
            Ok(payload) => payload,
            Err(err) if err.is_auth_expired() && !*reauthed => {
                tracing::warn!(
                    unit = %unit.artifact_stem(),
                    "Session expired mid-run, re-authenticating"
                );
                *reauthed = true;
                self.auth.refresh(user_id).await?;

                match self.fetch_unit(session, &unit).await {
                    Ok(payload) => payload,
                    // Expired again right after a fresh login: give up on
                    // the whole run rather than thrash the provider.
                    Err(err) if err.is_auth_expired() => return Err(err),
                    Err(err) => {
                        self.record_failure(&unit, err, report);
                        return Ok(());
                    }
                }
            }
            Err(err) if err.is_auth_expired() => return Err(err),
            Err(err) => {
                self.record_failure(&unit, err, report);
                return Ok(());
            }
        };

        let filtered = match scoped {
            Some(device) => {
                let narrowed = narrow_to_device(&raw, &device.device_id);
                filter::filter_value(&narrowed, unit.kind, self.registry.lookup(&device.model_name))
            }
            None => filter::filter_by_device(&raw, unit.kind, &self.registry, devices),
        };

        self.persist_unit(user_id, unit, filtered, report).await;
        Ok(())
    }

    async fn fetch_unit(&self, session: &Session, unit: &ExtractionUnit) -> Result<Value> {
        match unit.kind {
            MetricKind::Activity => {
                // No per-date endpoint; fetch a window and narrow it.
                let window = session.activities(0, DAILY_ACTIVITY_WINDOW).await?;
                Ok(narrow_activities(&window, unit.date))
            }
            MetricKind::HeartRate => session.heart_rate(unit.date).await,
            MetricKind::Sleep => session.sleep_data(unit.date).await,
            MetricKind::Steps => session.steps(unit.date).await,
        }
    }

    /// Write one filtered payload to both sinks, independently.
    async fn persist_unit(
        &self,
        user_id: &str,
        unit: ExtractionUnit,
        payload: Value,
        report: &mut ExtractionReport,
    ) {
        let records = record_count(&payload);
        let document = TelemetryDocument::new(
            user_id,
            &unit,
            payload.clone(),
            records,
            format_utc_rfc3339(Utc::now()),
        );

        let file_name = unit.file_name();
        let (file_result, remote_result) = tokio::join!(
            self.files.write(&file_name, &payload),
            self.remote.write(&document),
        );

        let file_ok = match file_result {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(unit = %unit.artifact_stem(), error = %err, "File write failed");
                report.note_error(&err);
                false
            }
        };
        let remote_ok = match remote_result {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(unit = %unit.artifact_stem(), error = %err, "Remote write failed");
                report.note_error(&err);
                false
            }
        };

        let status = match (file_ok, remote_ok) {
            (true, true) => UnitStatus::Persisted,
            (false, false) => UnitStatus::Failed,
            _ => UnitStatus::Degraded { file_ok, remote_ok },
        };

        tracing::debug!(unit = %unit.artifact_stem(), records, status = ?status, "Unit persisted");
        report.record(unit, status, records);
    }

    fn record_failure(&self, unit: &ExtractionUnit, err: HarvestError, report: &mut ExtractionReport) {
        tracing::warn!(unit = %unit.artifact_stem(), error = %err, "Unit fetch failed");
        report.note_error(&err);
        report.record(unit.clone(), UnitStatus::Failed, 0);
    }
}

/// Keep only the activities that started on the given calendar date.
///
/// Non-array windows pass through; the shape surprise surfaces at the sink
/// rather than silently dropping data.
fn narrow_activities(window: &Value, date: NaiveDate) -> Value {
    match window {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|item| {
                    item.as_object()
                        .is_some_and(|record| activity_on_date(record, date))
                })
                .cloned()
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Keep only the records tagged with the given device, for device-scoped
/// runs. Records with no `deviceId` and non-array payloads pass through:
/// account-level wellness data has no per-device variant to narrow to.
fn narrow_to_device(payload: &Value, device_id: &str) -> Value {
    match payload {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|item| match item.as_object().and_then(record_device_id) {
                    Some(id) => id == device_id,
                    None => true,
                })
                .cloned()
                .collect(),
        ),
        other => other.clone(),
    }
}
