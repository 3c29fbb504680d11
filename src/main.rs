// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Garmin-Harvest extraction runner
//!
//! One-shot batch process: authenticate against Garmin Connect, extract the
//! configured date range, and exit non-zero if the run produced nothing.

use garmin_harvest::{
    config::Config,
    db::{CredentialStore, FirestoreDb},
    devices::CapabilityRegistry,
    error::Result,
    models::ExtractionReport,
    services::{AuthService, Extractor, FileSink, GarminClient, TelemetryProvider},
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        user_id = %config.user_id,
        mode = ?config.extract_mode,
        output_dir = %config.output_dir,
        "Starting Garmin-Harvest"
    );

    match run(&config).await {
        Ok(report) if report.is_complete_failure() => {
            tracing::error!(
                failed = report.failed(),
                first_errors = ?report.first_errors,
                "Run completed but every unit failed"
            );
            ExitCode::FAILURE
        }
        Ok(report) => {
            if report.is_partial() {
                tracing::warn!(
                    degraded = report.degraded(),
                    failed = report.failed(),
                    "Run completed with degraded units"
                );
            }
            tracing::info!(
                total = report.total(),
                succeeded = report.succeeded(),
                "Garmin-Harvest finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, category = err.category(), "Extraction run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> Result<ExtractionReport> {
    // Initialize Firestore: credential store and remote telemetry sink
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    let provider: Arc<dyn TelemetryProvider> = Arc::new(GarminClient::new()?);
    let store: Arc<dyn CredentialStore> = Arc::new(db.clone());
    let auth = AuthService::new(provider, store);

    auth.authenticate(
        &config.user_id,
        &config.garmin_username,
        &config.garmin_password,
    )
    .await?;

    let extractor = Extractor::new(
        auth,
        CapabilityRegistry::standard(),
        FileSink::new(&config.output_dir),
        Arc::new(db),
    );

    match config.range {
        // Explicit ranges skip the account-level snapshots; they are part
        // of the mode-driven full run.
        Some(range) => {
            extractor
                .extract(&config.user_id, &range, config.device_filter.as_deref())
                .await
        }
        None => {
            extractor
                .extract_all(
                    &config.user_id,
                    config.extract_mode,
                    config.device_filter.as_deref(),
                )
                .await
        }
    }
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("garmin_harvest=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
