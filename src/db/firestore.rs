// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Firestore client wrapper with typed operations.
//!
//! Backs both persistence seams:
//! - Credentials (`garmin_auth` collection, keyed by user ID)
//! - Telemetry documents (`telemetry` collection, upserted per unit)

use crate::db::{collections, CredentialStore, TelemetryDocument, TelemetrySink};
use crate::error::{HarvestError, Result, SinkTarget};
use crate::models::credentials::clean_user_id;
use crate::models::Credentials;
use async_trait::async_trait;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            HarvestError::Storage(
                SinkTarget::Remote,
                format!("Failed to connect to Firestore: {}", e),
            )
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            HarvestError::Storage(
                SinkTarget::Remote,
                format!("Failed to connect to Firestore Emulator: {}", e),
            )
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client.as_ref().ok_or_else(|| {
            HarvestError::Storage(
                SinkTarget::Remote,
                "Database not connected (offline mode)".to_string(),
            )
        })
    }

    /// Read back a stored telemetry document by its unit-derived ID.
    pub async fn get_telemetry(&self, doc_id: &str) -> Result<Option<TelemetryDocument>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TELEMETRY)
            .obj()
            .one(doc_id)
            .await
            .map_err(|e| HarvestError::Storage(SinkTarget::Remote, e.to_string()))
    }
}

#[async_trait]
impl CredentialStore for FirestoreDb {
    /// Get stored credentials for a user.
    async fn get(&self, user_id: &str) -> Result<Option<Credentials>> {
        let user_id = clean_user_id(user_id);
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::GARMIN_AUTH)
            .obj()
            .one(&user_id)
            .await
            .map_err(|e| HarvestError::Storage(SinkTarget::Remote, e.to_string()))
    }

    /// Create or update credentials for a user (last write wins).
    async fn put(&self, user_id: &str, credentials: &Credentials) -> Result<()> {
        let user_id = clean_user_id(user_id);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::GARMIN_AUTH)
            .document_id(&user_id)
            .object(credentials)
            .execute()
            .await
            .map_err(|e| HarvestError::Storage(SinkTarget::Remote, e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl TelemetrySink for FirestoreDb {
    /// Upsert one unit's telemetry document.
    ///
    /// The document ID is derived from (user, date, metric kind, device), so
    /// re-running a range rewrites documents in place.
    async fn write(&self, document: &TelemetryDocument) -> Result<()> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TELEMETRY)
            .document_id(document.doc_id())
            .object(document)
            .execute()
            .await
            .map_err(|e| HarvestError::Storage(SinkTarget::Remote, e.to_string()))?;

        tracing::debug!(
            doc_id = %document.doc_id(),
            records = document.record_count,
            "Stored telemetry document"
        );

        Ok(())
    }
}
