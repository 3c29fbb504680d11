// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Application error types with a single classification taxonomy.
//!
//! Provider errors are classified once, at the auth/client boundary, into
//! these variants; everything downstream matches on the variant instead of
//! re-parsing message strings.

use std::fmt;

/// Which half of the dual sink a storage error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkTarget {
    /// Local filesystem writer.
    File,
    /// Remote document store.
    Remote,
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkTarget::File => write!(f, "file"),
            SinkTarget::Remote => write!(f, "remote"),
        }
    }
}

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// The provider rejected a call with an authentication error after a
    /// previously successful login. Recoverable by re-authenticating once.
    #[error("session expired, re-authentication required")]
    AuthExpired,

    /// Login failed because the provider's CSRF/token handshake did not
    /// validate. Usually transient.
    #[error("token validation failed: {0}")]
    TokenValidationFailed(String),

    /// The provider throttled us.
    #[error("rate limit reached, wait before trying again")]
    RateLimited,

    /// The provider rejected the supplied username/password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The account demands an MFA challenge that cannot be completed
    /// headlessly. Permanent for this account; never retried.
    #[error("account requires multi-factor sign-in: {0}")]
    MfaUnsupported(String),

    /// `refresh`/`validate` was asked for a user the store has never seen.
    #[error("no credentials found for user {0}")]
    NoCredentialsFound(String),

    /// A session was requested before any successful `authenticate` in this
    /// process.
    #[error("not authenticated, call authenticate() first")]
    NotAuthenticated,

    /// A device filter named a device the provider did not enumerate.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// One half of the dual sink failed. Non-fatal for the run.
    #[error("{0} sink error: {1}")]
    Storage(SinkTarget, String),

    /// The provider could not be reached at all. Fatal during session
    /// acquisition, recorded per-unit otherwise.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider error that matched no known category, wrapped with context.
    #[error("provider error: {0}")]
    Provider(String),

    /// Internal error (JSON shape surprises and other bugs).
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HarvestError {
    /// True for errors that invalidate the live session and are worth one
    /// transparent re-authentication.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, HarvestError::AuthExpired)
    }

    /// True for login failures that must never be retried.
    pub fn is_permanent_auth_failure(&self) -> bool {
        matches!(self, HarvestError::MfaUnsupported(_))
    }

    /// Stable category label, used to key the first-error-per-category map
    /// in the extraction report.
    pub fn category(&self) -> &'static str {
        match self {
            HarvestError::AuthExpired => "auth_expired",
            HarvestError::TokenValidationFailed(_) => "token_validation",
            HarvestError::RateLimited => "rate_limited",
            HarvestError::InvalidCredentials => "invalid_credentials",
            HarvestError::MfaUnsupported(_) => "mfa_unsupported",
            HarvestError::NoCredentialsFound(_) => "no_credentials",
            HarvestError::NotAuthenticated => "not_authenticated",
            HarvestError::DeviceNotFound(_) => "device_not_found",
            HarvestError::Storage(SinkTarget::File, _) => "file_storage",
            HarvestError::Storage(SinkTarget::Remote, _) => "remote_storage",
            HarvestError::ProviderUnavailable(_) => "provider_unavailable",
            HarvestError::Provider(_) => "provider",
            HarvestError::Internal(_) => "internal",
        }
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HarvestError>;
