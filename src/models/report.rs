// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Per-run extraction accounting.
//!
//! A run is broken into units (one date, one metric kind, optionally one
//! device) and each unit's persistence outcome is recorded independently so
//! a single bad day never aborts the rest of the run.

use crate::error::HarvestError;
use crate::models::metrics::MetricKind;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// The smallest unit of extraction work: one metric kind on one date,
/// optionally scoped to a single device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionUnit {
    pub date: NaiveDate,
    pub kind: MetricKind,
    pub device_id: Option<String>,
}

impl ExtractionUnit {
    pub fn new(date: NaiveDate, kind: MetricKind) -> Self {
        Self {
            date,
            kind,
            device_id: None,
        }
    }

    pub fn for_device(date: NaiveDate, kind: MetricKind, device_id: impl Into<String>) -> Self {
        Self {
            date,
            kind,
            device_id: Some(device_id.into()),
        }
    }

    /// Artifact name without extension: `{slug}-{date}` or
    /// `{slug}-{date}-device-{deviceId}` when device-scoped.
    pub fn artifact_stem(&self) -> String {
        match &self.device_id {
            Some(device_id) => format!("{}-{}-device-{}", self.kind.slug(), self.date, device_id),
            None => format!("{}-{}", self.kind.slug(), self.date),
        }
    }

    /// File name for the local sink.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.artifact_stem())
    }
}

/// Where a unit's payload ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitStatus {
    /// Both sinks accepted the payload (or there was nothing to write).
    Persisted,
    /// Exactly one sink accepted the payload.
    Degraded { file_ok: bool, remote_ok: bool },
    /// Fetch failed or both sinks rejected the payload.
    Failed,
}

/// One unit's recorded outcome.
#[derive(Debug, Clone, Serialize)]
pub struct UnitOutcome {
    pub unit: ExtractionUnit,
    pub status: UnitStatus,
    pub records: usize,
}

/// Summary of one extraction run.
///
/// `first_errors` keeps the first error message seen per category so the
/// run-end log line stays bounded no matter how many units failed.
#[derive(Debug, Default, Serialize)]
pub struct ExtractionReport {
    pub units: Vec<UnitOutcome>,
    pub first_errors: BTreeMap<&'static str, String>,
}

impl ExtractionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, unit: ExtractionUnit, status: UnitStatus, records: usize) {
        self.units.push(UnitOutcome {
            unit,
            status,
            records,
        });
    }

    /// Remember the first error seen for this error's category.
    pub fn note_error(&mut self, err: &HarvestError) {
        self.first_errors
            .entry(err.category())
            .or_insert_with(|| err.to_string());
    }

    pub fn succeeded(&self) -> usize {
        self.units
            .iter()
            .filter(|o| o.status == UnitStatus::Persisted)
            .count()
    }

    pub fn degraded(&self) -> usize {
        self.units
            .iter()
            .filter(|o| matches!(o.status, UnitStatus::Degraded { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.units
            .iter()
            .filter(|o| o.status == UnitStatus::Failed)
            .count()
    }

    pub fn total(&self) -> usize {
        self.units.len()
    }

    /// Every unit persisted to both sinks.
    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0 && self.degraded() == 0
    }

    /// Nothing persisted anywhere.
    pub fn is_complete_failure(&self) -> bool {
        !self.units.is_empty() && self.failed() == self.total()
    }

    pub fn is_partial(&self) -> bool {
        !self.is_complete_success() && !self.is_complete_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_artifact_stem_unscoped() {
        let unit = ExtractionUnit::new(date("2024-04-01"), MetricKind::HeartRate);
        assert_eq!(unit.artifact_stem(), "heart-rate-2024-04-01");
        assert_eq!(unit.file_name(), "heart-rate-2024-04-01.json");
    }

    #[test]
    fn test_artifact_stem_device_scoped() {
        let unit = ExtractionUnit::for_device(date("2024-04-01"), MetricKind::Sleep, "3991784102");
        assert_eq!(unit.artifact_stem(), "sleep-2024-04-01-device-3991784102");
        assert_eq!(
            unit.file_name(),
            "sleep-2024-04-01-device-3991784102.json"
        );
    }

    #[test]
    fn test_report_counts_and_predicates() {
        let mut report = ExtractionReport::new();
        assert!(report.is_complete_success());
        assert!(!report.is_complete_failure());

        report.record(
            ExtractionUnit::new(date("2024-04-01"), MetricKind::Steps),
            UnitStatus::Persisted,
            24,
        );
        report.record(
            ExtractionUnit::new(date("2024-04-01"), MetricKind::Sleep),
            UnitStatus::Degraded {
                file_ok: true,
                remote_ok: false,
            },
            1,
        );
        report.record(
            ExtractionUnit::new(date("2024-04-02"), MetricKind::Sleep),
            UnitStatus::Failed,
            0,
        );

        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.degraded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.is_partial());
        assert!(!report.is_complete_success());
        assert!(!report.is_complete_failure());
    }

    #[test]
    fn test_all_failed_is_complete_failure() {
        let mut report = ExtractionReport::new();
        report.record(
            ExtractionUnit::new(date("2024-04-01"), MetricKind::Activity),
            UnitStatus::Failed,
            0,
        );
        report.record(
            ExtractionUnit::new(date("2024-04-02"), MetricKind::Activity),
            UnitStatus::Failed,
            0,
        );

        assert!(report.is_complete_failure());
        assert!(!report.is_partial());
    }

    #[test]
    fn test_note_error_keeps_first_per_category() {
        let mut report = ExtractionReport::new();
        report.note_error(&HarvestError::RateLimited);
        report.note_error(&HarvestError::Provider("first provider error".to_string()));
        report.note_error(&HarvestError::Provider("second provider error".to_string()));

        assert_eq!(report.first_errors.len(), 2);
        assert!(report.first_errors["provider"].contains("first provider error"));
    }
}
