// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Garmin Connect API client.
//!
//! Handles:
//! - SSO ticket login (CSRF token dance against sso.garmin.com)
//! - Wellness and activity endpoints, keyed by the account's display name
//! - Rate limit and session-expiry detection

use crate::error::{HarvestError, Result};
use crate::models::Device;
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

/// Abstraction over the remote telemetry provider.
///
/// Everything the extractor needs from Garmin Connect, so tests can swap in
/// a scripted provider without touching the network.
#[async_trait::async_trait]
pub trait TelemetryProvider: Send + Sync {
    /// Authenticate with the provider. Replaces any previous session.
    async fn login(&self, email: &str, password: &str) -> Result<()>;

    async fn user_profile(&self) -> Result<Value>;

    /// Activity summaries, newest first, paginated by (offset, limit).
    async fn activities(&self, offset: usize, limit: usize) -> Result<Value>;

    async fn heart_rate(&self, date: NaiveDate) -> Result<Value>;

    async fn sleep_data(&self, date: NaiveDate) -> Result<Value>;

    async fn steps(&self, date: NaiveDate) -> Result<Value>;

    /// Devices registered to the account.
    async fn devices(&self) -> Result<Vec<Device>>;

    fn provider_name(&self) -> &'static str;
}

/// User agent the Connect endpoints accept without bot challenges.
const USER_AGENT: &str = "com.garmin.android.apps.connectmobile";

/// Session state established by a successful login.
struct SessionState {
    /// Account display name; path component of the wellness endpoints.
    display_name: String,
}

/// Garmin Connect client.
pub struct GarminClient {
    http: reqwest::Client,
    sso_url: String,
    api_url: String,
    csrf_re: Regex,
    ticket_re: Regex,
    session: RwLock<Option<SessionState>>,
}

impl GarminClient {
    /// Create a new Garmin Connect client with a cookie-backed session.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                HarvestError::ProviderUnavailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            sso_url: "https://sso.garmin.com/sso".to_string(),
            api_url: "https://connect.garmin.com".to_string(),
            csrf_re: Regex::new(r#"name="_csrf"\s+value="([^"]+)""#)
                .map_err(|e| HarvestError::Internal(anyhow::anyhow!("CSRF regex: {}", e)))?,
            ticket_re: Regex::new(r#"embed\?ticket=([^"]+)""#)
                .map_err(|e| HarvestError::Internal(anyhow::anyhow!("ticket regex: {}", e)))?,
            session: RwLock::new(None),
        })
    }

    /// SSO embed widget query shared by the GET and POST legs of the login.
    fn sso_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("service", format!("{}/modern", self.api_url)),
            ("webhost", self.api_url.clone()),
            ("gauthHost", self.sso_url.clone()),
            ("clientId", "GarminConnect".to_string()),
            ("consumeServiceTicket", "false".to_string()),
            ("embedWidget", "true".to_string()),
            ("generateExtraServiceTicket", "true".to_string()),
        ]
    }

    /// Run the three-legged SSO flow and leave the session cookies behind.
    ///
    /// Returns the service ticket on success. Error messages carry the
    /// provider's failure mode so the auth layer can classify them.
    async fn sso_login(&self, email: &str, password: &str) -> Result<String> {
        let signin_url = format!("{}/signin", self.sso_url);
        let params = self.sso_params();

        // Leg 1: fetch the signin widget to pick up cookies and CSRF token.
        let response = self
            .http
            .get(&signin_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| HarvestError::ProviderUnavailable(format!("SSO request failed: {}", e)))?;
        let page = Self::check_response_text(response).await?;

        let csrf = self
            .csrf_re
            .captures(&page)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                HarvestError::Provider("CSRF token not found in signin page".to_string())
            })?;

        // Leg 2: submit credentials. A successful response embeds a service
        // ticket; failure responses keep the ticket out and describe why.
        let response = self
            .http
            .post(&signin_url)
            .query(&params)
            .header(reqwest::header::REFERER, signin_url.clone())
            .form(&[
                ("username", email),
                ("password", password),
                ("embed", "true"),
                ("_csrf", csrf.as_str()),
            ])
            .send()
            .await
            .map_err(|e| HarvestError::ProviderUnavailable(format!("SSO signin failed: {}", e)))?;
        let body = Self::check_response_text(response).await?;

        match self.ticket_re.captures(&body).and_then(|c| c.get(1)) {
            Some(ticket) => Ok(ticket.as_str().to_string()),
            None if body.contains("MFA") => Err(HarvestError::Provider(
                "MFA verification required to complete signin".to_string(),
            )),
            None => Err(HarvestError::Provider(
                "signin returned no service ticket, check credentials".to_string(),
            )),
        }
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| HarvestError::ProviderUnavailable(format!("Request failed: {}", e)))?;

        Self::check_response_json(response).await
    }

    /// GET with a `date=YYYY-MM-DD` query parameter.
    async fn get_json_for_date<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        date: NaiveDate,
    ) -> Result<T> {
        let response = self
            .http
            .get(url)
            .query(&[("date", date.to_string())])
            .send()
            .await
            .map_err(|e| HarvestError::ProviderUnavailable(format!("Request failed: {}", e)))?;

        Self::check_response_json(response).await
    }

    /// Display name of the logged-in account, or NotAuthenticated.
    async fn display_name(&self) -> Result<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.display_name.clone())
            .ok_or(HarvestError::NotAuthenticated)
    }

    /// Check response status and return error if not successful.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        // Throttling - caller should back off before retrying
        if status.as_u16() == 429 {
            tracing::warn!("Garmin rate limit hit (429)");
            return Err(HarvestError::RateLimited);
        }

        // Session cookies rejected - worth one re-login
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(HarvestError::AuthExpired);
        }

        if status.is_server_error() {
            return Err(HarvestError::ProviderUnavailable(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        Err(HarvestError::Provider(format!("HTTP {}: {}", status, body)))
    }

    /// Check response and return the text body.
    async fn check_response_text(response: reqwest::Response) -> Result<String> {
        Self::check_response(response)
            .await?
            .text()
            .await
            .map_err(|e| HarvestError::Provider(format!("Failed to read response body: {}", e)))
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T> {
        Self::check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| HarvestError::Provider(format!("JSON parse error: {}", e)))
    }
}

#[async_trait::async_trait]
impl TelemetryProvider for GarminClient {
    async fn login(&self, email: &str, password: &str) -> Result<()> {
        // Drop any previous session before the cookie jar is rebuilt.
        *self.session.write().await = None;

        let ticket = self.sso_login(email, password).await?;

        // Leg 3: redeem the ticket against the Connect frontend, which sets
        // the session cookies every API call below rides on.
        let response = self
            .http
            .get(format!("{}/modern", self.api_url))
            .query(&[("ticket", ticket.as_str())])
            .send()
            .await
            .map_err(|e| {
                HarvestError::ProviderUnavailable(format!("Ticket exchange failed: {}", e))
            })?;
        Self::check_response(response).await?;

        let profile: Value = self
            .get_json(&format!(
                "{}/modern/currentuser-service/user/info",
                self.api_url
            ))
            .await?;
        let display_name = profile
            .get("displayName")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                HarvestError::Provider("login succeeded but user info had no displayName".to_string())
            })?
            .to_string();

        *self.session.write().await = Some(SessionState { display_name });
        tracing::info!("Garmin Connect login successful");
        Ok(())
    }

    async fn user_profile(&self) -> Result<Value> {
        // Touch the session so a stale client fails with NotAuthenticated
        // instead of a confusing provider error.
        self.display_name().await?;
        self.get_json(&format!(
            "{}/modern/proxy/userprofile-service/socialProfile",
            self.api_url
        ))
        .await
    }

    async fn activities(&self, offset: usize, limit: usize) -> Result<Value> {
        self.display_name().await?;
        let url = format!(
            "{}/modern/proxy/activitylist-service/activities/search/activities",
            self.api_url
        );
        let response = self
            .http
            .get(&url)
            .query(&[("start", offset.to_string()), ("limit", limit.to_string())])
            .send()
            .await
            .map_err(|e| HarvestError::ProviderUnavailable(format!("Request failed: {}", e)))?;

        Self::check_response_json(response).await
    }

    async fn heart_rate(&self, date: NaiveDate) -> Result<Value> {
        let display_name = self.display_name().await?;
        self.get_json_for_date(
            &format!(
                "{}/modern/proxy/wellness-service/wellness/dailyHeartRate/{}",
                self.api_url, display_name
            ),
            date,
        )
        .await
    }

    async fn sleep_data(&self, date: NaiveDate) -> Result<Value> {
        let display_name = self.display_name().await?;
        self.get_json_for_date(
            &format!(
                "{}/modern/proxy/wellness-service/wellness/dailySleepData/{}",
                self.api_url, display_name
            ),
            date,
        )
        .await
    }

    async fn steps(&self, date: NaiveDate) -> Result<Value> {
        let display_name = self.display_name().await?;
        self.get_json_for_date(
            &format!(
                "{}/modern/proxy/wellness-service/wellness/dailySummaryChart/{}",
                self.api_url, display_name
            ),
            date,
        )
        .await
    }

    async fn devices(&self) -> Result<Vec<Device>> {
        self.display_name().await?;
        self.get_json(&format!(
            "{}/modern/proxy/device-service/deviceregistration/devices",
            self.api_url
        ))
        .await
    }

    fn provider_name(&self) -> &'static str {
        "garmin"
    }
}
