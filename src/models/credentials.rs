// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Garmin login credentials stored in the credential store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How long a login is trusted before the next run re-authenticates.
const TOKEN_TTL_SECS: i64 = 3600;

/// Long-lived login credentials plus refreshed token metadata.
///
/// Overwritten in the store on every successful (re)login. The password is
/// redacted from `Debug` output so the struct can appear in logs safely.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Application user ID (also used as document ID)
    pub user_id: String,
    /// Garmin Connect account email
    pub garmin_email: String,
    /// Garmin Connect account password
    pub garmin_password: String,
    /// When the current login stops being trusted (RFC 3339)
    pub token_expires_at: Option<String>,
    /// Last store write (RFC 3339)
    pub updated_at: String,
}

impl Credentials {
    /// Build credentials freshly authenticated at `now`, trusted for one hour.
    pub fn authenticated_at(
        user_id: &str,
        garmin_email: &str,
        garmin_password: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            garmin_email: garmin_email.to_string(),
            garmin_password: garmin_password.to_string(),
            token_expires_at: Some(crate::time_utils::format_utc_rfc3339(
                now + Duration::seconds(TOKEN_TTL_SECS),
            )),
            updated_at: crate::time_utils::format_utc_rfc3339(now),
        }
    }

    /// Rewrite the expiry after a successful refresh at `now`.
    pub fn refreshed_at(&self, now: DateTime<Utc>) -> Self {
        let mut refreshed = self.clone();
        refreshed.token_expires_at = Some(crate::time_utils::format_utc_rfc3339(
            now + Duration::seconds(TOKEN_TTL_SECS),
        ));
        refreshed.updated_at = crate::time_utils::format_utc_rfc3339(now);
        refreshed
    }

    /// Parse the stored expiry. `None` when absent or unparseable; both are
    /// treated as "expired" by callers.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.token_expires_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Whether the stored login is still trusted at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expires| now < expires)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("garmin_email", &self.garmin_email)
            .field("garmin_password", &"<redacted>")
            .field("token_expires_at", &self.token_expires_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Strip stray whitespace and quote characters from a user ID before it is
/// used as a store key. CI secrets are prone to both.
pub fn clean_user_id(user_id: &str) -> String {
    user_id.trim().replace(['\'', '"'], "")
}
