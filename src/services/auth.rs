// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Session and credential lifecycle for Garmin Connect.
//!
//! Owns the login state machine: NoSession -> Authenticated, with the
//! terminal Unrecoverable state for accounts that demand an MFA challenge
//! we cannot complete headlessly. Stored credentials are the source of
//! truth for session expiry; every successful login rewrites them.

use crate::db::CredentialStore;
use crate::error::{HarvestError, Result};
use crate::models::credentials::clean_user_id;
use crate::models::Credentials;
use crate::services::garmin::TelemetryProvider;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Process-level auth state for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No successful authenticate yet in this process.
    NoSession,
    Authenticated,
    /// Login hit a permanent failure (MFA). Never retried.
    Unrecoverable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionSlot {
    Authenticated,
    Unrecoverable,
}

/// An authenticated handle to the provider, scoped to one user.
///
/// Obtained from [`AuthService::session`]; all fetches ride on the provider
/// session established by the last successful login.
#[derive(Clone)]
pub struct Session {
    provider: Arc<dyn TelemetryProvider>,
    user_id: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub async fn user_profile(&self) -> Result<Value> {
        self.provider.user_profile().await
    }

    pub async fn activities(&self, offset: usize, limit: usize) -> Result<Value> {
        self.provider.activities(offset, limit).await
    }

    pub async fn heart_rate(&self, date: chrono::NaiveDate) -> Result<Value> {
        self.provider.heart_rate(date).await
    }

    pub async fn sleep_data(&self, date: chrono::NaiveDate) -> Result<Value> {
        self.provider.sleep_data(date).await
    }

    pub async fn steps(&self, date: chrono::NaiveDate) -> Result<Value> {
        self.provider.steps(date).await
    }

    pub async fn devices(&self) -> Result<Vec<crate::models::Device>> {
        self.provider.devices().await
    }
}

/// High-level auth service that manages the Garmin login lifecycle.
///
/// This service encapsulates:
/// - Login against the provider with error classification
/// - Credential persistence (rewritten on every successful login)
/// - Transparent re-authentication when the stored expiry has passed
/// - Per-user locking so concurrent expiry discoveries share one refresh
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn TelemetryProvider>,
    store: Arc<dyn CredentialStore>,
    /// Per-user process state (has this user authenticated; is it hopeless).
    sessions: Arc<DashMap<String, SessionSlot>>,
    /// Per-user mutex to serialize re-authentication.
    refresh_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn TelemetryProvider>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            provider,
            store,
            sessions: Arc::new(DashMap::new()),
            refresh_locks: Arc::new(DashMap::new()),
        }
    }

    /// Current auth state for a user.
    pub fn state(&self, user_id: &str) -> AuthState {
        match self.sessions.get(&clean_user_id(user_id)).map(|s| *s) {
            None => AuthState::NoSession,
            Some(SessionSlot::Authenticated) => AuthState::Authenticated,
            Some(SessionSlot::Unrecoverable) => AuthState::Unrecoverable,
        }
    }

    /// Log in with explicit credentials and persist them on success.
    ///
    /// On failure nothing is written; the error is classified into the
    /// taxonomy (rate limit, bad credentials, CSRF, MFA).
    pub async fn authenticate(
        &self,
        user_id: &str,
        email: &str,
        password: &str,
    ) -> Result<Credentials> {
        let user_id = clean_user_id(user_id);
        self.check_recoverable(&user_id)?;

        self.attempt_login(&user_id, email, password).await?;

        let credentials = Credentials::authenticated_at(&user_id, email, password, Utc::now());
        self.store.put(&user_id, &credentials).await?;
        self.sessions
            .insert(user_id.clone(), SessionSlot::Authenticated);

        tracing::info!(user_id = %user_id, "Authenticated with Garmin Connect");
        Ok(credentials)
    }

    /// Re-run the login flow from stored credentials and rewrite the expiry.
    pub async fn refresh(&self, user_id: &str) -> Result<Credentials> {
        let user_id = clean_user_id(user_id);
        self.check_recoverable(&user_id)?;

        let stored = self
            .store
            .get(&user_id)
            .await?
            .ok_or_else(|| HarvestError::NoCredentialsFound(user_id.clone()))?;

        self.attempt_login(&user_id, &stored.garmin_email, &stored.garmin_password)
            .await?;

        let refreshed = stored.refreshed_at(Utc::now());
        self.store.put(&user_id, &refreshed).await?;
        self.sessions
            .insert(user_id.clone(), SessionSlot::Authenticated);

        tracing::info!(user_id = %user_id, "Garmin session refreshed");
        Ok(refreshed)
    }

    /// Probe whether the stored credentials still log in. Never errors and
    /// never writes; purely a boolean check.
    pub async fn validate(&self, user_id: &str) -> bool {
        let user_id = clean_user_id(user_id);
        let stored = match self.store.get(&user_id).await {
            Ok(Some(credentials)) => credentials,
            _ => return false,
        };

        self.attempt_login(&user_id, &stored.garmin_email, &stored.garmin_password)
            .await
            .is_ok()
    }

    /// Get a live session for the user, re-authenticating transparently if
    /// the stored expiry has passed.
    ///
    /// Fails with `NotAuthenticated` if the user has never successfully
    /// authenticated in this process.
    pub async fn session(&self, user_id: &str) -> Result<Session> {
        let user_id = clean_user_id(user_id);

        match self.sessions.get(&user_id).map(|s| *s) {
            None => return Err(HarvestError::NotAuthenticated),
            Some(SessionSlot::Unrecoverable) => return Err(Self::unrecoverable_error()),
            Some(SessionSlot::Authenticated) => {}
        }

        // Fast path: stored expiry still in the future.
        let now = Utc::now();
        let stored = self
            .store
            .get(&user_id)
            .await?
            .ok_or_else(|| HarvestError::NoCredentialsFound(user_id.clone()))?;
        if stored.is_fresh(now) {
            return Ok(self.handle(&user_id));
        }

        // Expired: take the per-user lock so exactly one task re-logs-in and
        // any concurrent callers share the result.
        let lock = self
            .refresh_locks
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Re-check after acquiring the lock: another task may have
        // refreshed while we were waiting.
        let stored = self
            .store
            .get(&user_id)
            .await?
            .ok_or_else(|| HarvestError::NoCredentialsFound(user_id.clone()))?;
        if stored.is_fresh(Utc::now()) {
            return Ok(self.handle(&user_id));
        }

        tracing::info!(user_id = %user_id, "Stored session expired, re-authenticating");
        self.attempt_login(&user_id, &stored.garmin_email, &stored.garmin_password)
            .await?;

        let refreshed = stored.refreshed_at(Utc::now());
        self.store.put(&user_id, &refreshed).await?;

        Ok(self.handle(&user_id))
    }

    fn handle(&self, user_id: &str) -> Session {
        Session {
            provider: self.provider.clone(),
            user_id: user_id.to_string(),
        }
    }

    fn check_recoverable(&self, user_id: &str) -> Result<()> {
        if let Some(slot) = self.sessions.get(user_id) {
            if *slot == SessionSlot::Unrecoverable {
                return Err(Self::unrecoverable_error());
            }
        }
        Ok(())
    }

    fn unrecoverable_error() -> HarvestError {
        HarvestError::MfaUnsupported(
            "account requires an MFA challenge that cannot be completed headlessly; \
             disable MFA for this account and re-run"
                .to_string(),
        )
    }

    /// Login against the provider, classifying failures into the taxonomy.
    /// A permanent failure parks the user in the Unrecoverable state.
    async fn attempt_login(&self, user_id: &str, email: &str, password: &str) -> Result<()> {
        tracing::debug!(user_id = %user_id, provider = self.provider.provider_name(), "Attempting login");
        match self.provider.login(email, password).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let err = classify_login_error(err);
                if err.is_permanent_auth_failure() {
                    self.sessions
                        .insert(user_id.to_string(), SessionSlot::Unrecoverable);
                }
                tracing::warn!(
                    user_id = %user_id,
                    category = err.category(),
                    error = %err,
                    "Garmin login failed"
                );
                Err(err)
            }
        }
    }
}

/// Map a raw login error onto the taxonomy by the substrings the provider
/// surfaces. Anything unmatched stays a wrapped provider error.
fn classify_login_error(err: HarvestError) -> HarvestError {
    match err {
        HarvestError::Provider(msg) => {
            if msg.contains("CSRF token") {
                HarvestError::TokenValidationFailed(msg)
            } else if msg.to_lowercase().contains("rate limit") {
                HarvestError::RateLimited
            } else if msg.contains("credentials") {
                HarvestError::InvalidCredentials
            } else if msg.contains("MFA") || msg.contains("mfa") {
                HarvestError::MfaUnsupported(
                    "complete the MFA challenge in a browser or disable MFA, then retry"
                        .to_string(),
                )
            } else {
                HarvestError::Provider(msg)
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_csrf_failure() {
        let err = classify_login_error(HarvestError::Provider(
            "CSRF token not found in signin page".to_string(),
        ));
        assert!(matches!(err, HarvestError::TokenValidationFailed(_)));
    }

    #[test]
    fn test_classify_rate_limit_message() {
        let err = classify_login_error(HarvestError::Provider(
            "Rate limit reached. Please wait before trying again.".to_string(),
        ));
        assert!(matches!(err, HarvestError::RateLimited));
    }

    #[test]
    fn test_classify_bad_credentials() {
        let err = classify_login_error(HarvestError::Provider(
            "signin returned no service ticket, check credentials".to_string(),
        ));
        assert!(matches!(err, HarvestError::InvalidCredentials));
    }

    #[test]
    fn test_classify_mfa_is_permanent() {
        let err = classify_login_error(HarvestError::Provider(
            "MFA verification required to complete signin".to_string(),
        ));
        assert!(err.is_permanent_auth_failure());
    }

    #[test]
    fn test_classify_passes_through_typed_errors() {
        assert!(matches!(
            classify_login_error(HarvestError::RateLimited),
            HarvestError::RateLimited
        ));
        assert!(matches!(
            classify_login_error(HarvestError::ProviderUnavailable("503".to_string())),
            HarvestError::ProviderUnavailable(_)
        ));
    }

    #[test]
    fn test_unmatched_error_stays_wrapped() {
        let err = classify_login_error(HarvestError::Provider("something odd".to_string()));
        assert!(matches!(err, HarvestError::Provider(_)));
    }
}
