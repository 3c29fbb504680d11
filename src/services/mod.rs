// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Services module - business logic layer.

pub mod auth;
pub mod extractor;
pub mod files;
pub mod garmin;

pub use auth::{AuthService, AuthState, Session};
pub use extractor::{ExtractMode, Extractor};
pub use files::FileSink;
pub use garmin::{GarminClient, TelemetryProvider};
