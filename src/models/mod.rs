// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Data models for the application.

pub mod credentials;
pub mod device;
pub mod metrics;
pub mod report;

pub use credentials::Credentials;
pub use device::Device;
pub use metrics::MetricKind;
pub use report::{ExtractionReport, ExtractionUnit, UnitOutcome, UnitStatus};
