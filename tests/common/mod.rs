// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

use async_trait::async_trait;
use chrono::NaiveDate;
use garmin_harvest::db::{CredentialStore, FirestoreDb, TelemetryDocument, TelemetrySink};
use garmin_harvest::error::{HarvestError, Result, SinkTarget};
use garmin_harvest::models::{Credentials, Device, MetricKind};
use garmin_harvest::services::{AuthService, TelemetryProvider};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// A registered Forerunner 235, matching the standard capability profile.
#[allow(dead_code)]
pub fn fr235() -> Device {
    Device {
        device_id: "3991784102".to_string(),
        model_name: "Forerunner 235".to_string(),
        device_type: "wearable".to_string(),
    }
}

#[allow(dead_code)]
pub fn date(s: &str) -> NaiveDate {
    s.parse().expect("valid test date")
}

/// Scripted stand-in for Garmin Connect.
///
/// Serves canned payloads per metric kind, counts logins and fetches, and
/// can be told to fail logins, fail specific dates, or expire sessions.
#[derive(Default)]
pub struct MockProvider {
    /// Login attempts seen, successful or not.
    pub login_count: AtomicUsize,
    /// Data fetches seen (profile, activities, daily metrics).
    pub fetch_count: AtomicUsize,
    login_error: Mutex<Option<String>>,
    devices: Mutex<Vec<Device>>,
    profile: Mutex<Option<Value>>,
    payloads: Mutex<HashMap<MetricKind, Value>>,
    fail_dates: Mutex<HashSet<NaiveDate>>,
    expired_fetches: AtomicUsize,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&self, device: Device) {
        self.devices.lock().unwrap().push(device);
    }

    pub fn set_payload(&self, kind: MetricKind, payload: Value) {
        self.payloads.lock().unwrap().insert(kind, payload);
    }

    pub fn set_profile(&self, profile: Value) {
        *self.profile.lock().unwrap() = Some(profile);
    }

    /// Make every login fail with a provider error carrying this message.
    pub fn set_login_error(&self, message: &str) {
        *self.login_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn clear_login_error(&self) {
        *self.login_error.lock().unwrap() = None;
    }

    /// Make daily fetches for this date fail with a provider error.
    pub fn fail_date(&self, date: NaiveDate) {
        self.fail_dates.lock().unwrap().insert(date);
    }

    /// Make the next `count` fetches fail as an expired session.
    pub fn expire_next_fetches(&self, count: usize) {
        self.expired_fetches.store(count, Ordering::SeqCst);
    }

    pub fn logins(&self) -> usize {
        self.login_count.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    fn gate(&self, date: Option<NaiveDate>) -> Result<()> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if self.expired_fetches.load(Ordering::SeqCst) > 0 {
            self.expired_fetches.fetch_sub(1, Ordering::SeqCst);
            return Err(HarvestError::AuthExpired);
        }
        if let Some(date) = date {
            if self.fail_dates.lock().unwrap().contains(&date) {
                return Err(HarvestError::Provider(format!(
                    "scripted failure for {date}"
                )));
            }
        }
        Ok(())
    }

    fn payload_for(&self, kind: MetricKind) -> Value {
        self.payloads
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| json!([]))
    }
}

#[async_trait]
impl TelemetryProvider for MockProvider {
    async fn login(&self, _email: &str, _password: &str) -> Result<()> {
        self.login_count.fetch_add(1, Ordering::SeqCst);
        match self.login_error.lock().unwrap().as_ref() {
            Some(message) => Err(HarvestError::Provider(message.clone())),
            None => Ok(()),
        }
    }

    async fn user_profile(&self) -> Result<Value> {
        self.gate(None)?;
        self.profile
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| HarvestError::Provider("profile not available".to_string()))
    }

    async fn activities(&self, _offset: usize, _limit: usize) -> Result<Value> {
        self.gate(None)?;
        Ok(self.payload_for(MetricKind::Activity))
    }

    async fn heart_rate(&self, date: NaiveDate) -> Result<Value> {
        self.gate(Some(date))?;
        Ok(self.payload_for(MetricKind::HeartRate))
    }

    async fn sleep_data(&self, date: NaiveDate) -> Result<Value> {
        self.gate(Some(date))?;
        Ok(self.payload_for(MetricKind::Sleep))
    }

    async fn steps(&self, date: NaiveDate) -> Result<Value> {
        self.gate(Some(date))?;
        Ok(self.payload_for(MetricKind::Steps))
    }

    async fn devices(&self) -> Result<Vec<Device>> {
        Ok(self.devices.lock().unwrap().clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// In-memory credential store, seedable and inspectable from tests.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, Credentials>>,
    pub put_count: AtomicUsize,
}

#[allow(dead_code)]
impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stored(&self, user_id: &str) -> Option<Credentials> {
        self.entries.lock().unwrap().get(user_id).cloned()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, user_id: &str) -> Result<Option<Credentials>> {
        Ok(self.entries.lock().unwrap().get(user_id).cloned())
    }

    async fn put(&self, user_id: &str, credentials: &Credentials) -> Result<()> {
        self.put_count.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .unwrap()
            .insert(user_id.to_string(), credentials.clone());
        Ok(())
    }
}

/// In-memory remote sink with the same upsert-by-ID semantics as Firestore.
#[derive(Default)]
pub struct MemorySink {
    documents: Mutex<HashMap<String, TelemetryDocument>>,
}

#[allow(dead_code)]
impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, doc_id: &str) -> Option<TelemetryDocument> {
        self.documents.lock().unwrap().get(doc_id).cloned()
    }

    pub fn doc_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.documents.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl TelemetrySink for MemorySink {
    async fn write(&self, document: &TelemetryDocument) -> Result<()> {
        self.documents
            .lock()
            .unwrap()
            .insert(document.doc_id(), document.clone());
        Ok(())
    }
}

/// Remote sink that always fails, simulating an unreachable store.
pub struct FailingSink;

#[async_trait]
impl TelemetrySink for FailingSink {
    async fn write(&self, _document: &TelemetryDocument) -> Result<()> {
        Err(HarvestError::Storage(
            SinkTarget::Remote,
            "remote store unreachable".to_string(),
        ))
    }
}

/// Scripted provider, seedable store, and the auth service wired over them.
#[allow(dead_code)]
pub fn test_auth() -> (Arc<MockProvider>, Arc<MemoryCredentialStore>, AuthService) {
    let provider = Arc::new(MockProvider::new());
    let store = Arc::new(MemoryCredentialStore::new());
    let auth = AuthService::new(provider.clone(), store.clone());
    (provider, store, auth)
}
