// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Storage layer (Firestore) and the persistence seams the extractor
//! writes through.

pub mod firestore;

pub use firestore::FirestoreDb;

use crate::error::Result;
use crate::models::report::ExtractionUnit;
use crate::models::Credentials;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Collection names as constants.
pub mod collections {
    /// Garmin login credentials, keyed by user ID.
    pub const GARMIN_AUTH: &str = "garmin_auth";
    /// Extracted telemetry documents, keyed by user + unit.
    pub const TELEMETRY: &str = "telemetry";
}

/// Persistent store for Garmin login credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<Credentials>>;
    async fn put(&self, user_id: &str, credentials: &Credentials) -> Result<()>;
}

/// Remote half of the dual sink.
///
/// Writes must be upserts: storing the same unit twice replaces the
/// document rather than duplicating it.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn write(&self, document: &TelemetryDocument) -> Result<()>;
}

/// Stored shape of one extraction unit's filtered payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryDocument {
    pub user_id: String,
    pub metric_kind: String,
    /// ISO calendar date the records belong to.
    pub date: String,
    pub device_id: Option<String>,
    pub record_count: usize,
    pub records: Value,
    /// RFC3339 timestamp of the run that produced this document.
    pub extracted_at: String,
}

impl TelemetryDocument {
    pub fn new(
        user_id: &str,
        unit: &ExtractionUnit,
        records: Value,
        record_count: usize,
        extracted_at: String,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            metric_kind: unit.kind.slug().to_string(),
            date: unit.date.to_string(),
            device_id: unit.device_id.clone(),
            record_count,
            records,
            extracted_at,
        }
    }

    /// Document ID keyed on (user, date, metric kind, device) so repeat runs
    /// upsert instead of piling up duplicates.
    pub fn doc_id(&self) -> String {
        let safe_user = urlencoding::encode(&self.user_id);
        match &self.device_id {
            Some(device_id) => format!(
                "{}_{}-{}-device-{}",
                safe_user, self.metric_kind, self.date, device_id
            ),
            None => format!("{}_{}-{}", safe_user, self.metric_kind, self.date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricKind;
    use serde_json::json;

    fn unit() -> ExtractionUnit {
        ExtractionUnit::new("2024-04-01".parse().unwrap(), MetricKind::Sleep)
    }

    #[test]
    fn test_doc_id_matches_artifact_stem() {
        let unit = unit();
        let doc = TelemetryDocument::new("user1", &unit, json!([]), 0, "now".to_string());
        assert_eq!(doc.doc_id(), format!("user1_{}", unit.artifact_stem()));
    }

    #[test]
    fn test_doc_id_encodes_user_id() {
        let doc = TelemetryDocument::new(
            "user with spaces",
            &unit(),
            json!([]),
            0,
            "now".to_string(),
        );
        assert_eq!(doc.doc_id(), "user%20with%20spaces_sleep-2024-04-01");
    }

    #[test]
    fn test_doc_id_device_scoped() {
        let unit = ExtractionUnit::for_device(
            "2024-04-01".parse().unwrap(),
            MetricKind::HeartRate,
            "3991784102",
        );
        let doc = TelemetryDocument::new("u", &unit, json!([]), 0, "now".to_string());
        assert_eq!(doc.doc_id(), "u_heart-rate-2024-04-01-device-3991784102");
    }
}
