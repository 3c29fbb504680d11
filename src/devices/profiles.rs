// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Capability tables for the device models we know about.
//!
//! Field names match the keys Garmin Connect uses in its JSON payloads.

use super::{CapabilityProfile, FieldSupport};
use crate::models::MetricKind;

pub const FORERUNNER_235: &str = "Forerunner 235";

/// Forerunner 235: optical HR and accelerometer only. No HRV, pulse ox,
/// body battery, or running-dynamics pod support; barometer-free altitude
/// makes elevation and stride length approximate.
pub fn forerunner_235() -> CapabilityProfile {
    use FieldSupport::{Partial, Supported, Unsupported};

    CapabilityProfile::passthrough(FORERUNNER_235)
        .with_fields(
            MetricKind::Sleep,
            &[
                ("deepSleepSeconds", Supported),
                ("lightSleepSeconds", Supported),
                ("awakeSleepSeconds", Supported),
                ("sleepMovement", Supported),
                ("remSleepSeconds", Unsupported),
                ("sleepQualityTypePK", Unsupported),
                ("sleepResultTypePK", Unsupported),
                ("respirationRate", Unsupported),
                ("pulseOx", Unsupported),
                ("sleepScore", Unsupported),
                ("stressLevel", Unsupported),
            ],
        )
        .with_fields(
            MetricKind::Activity,
            &[
                ("activityId", Supported),
                ("activityName", Supported),
                ("startTimeLocal", Supported),
                ("startTimeGMT", Supported),
                ("distance", Supported),
                ("duration", Supported),
                ("averageHR", Supported),
                ("maxHR", Supported),
                ("calories", Supported),
                ("steps", Supported),
                ("averageSpeed", Supported),
                ("maxSpeed", Supported),
                ("averageRunningCadenceInStepsPerMinute", Supported),
                ("maxRunningCadenceInStepsPerMinute", Supported),
                ("elevationGain", Partial),
                ("elevationLoss", Partial),
                ("strideLength", Partial),
                ("groundContactTime", Unsupported),
                ("groundContactBalanceLeft", Unsupported),
                ("verticalOscillation", Unsupported),
                ("runningPower", Unsupported),
                ("trainingEffect", Unsupported),
                ("trainingEffectAnaerobic", Unsupported),
                ("recoveryTime", Unsupported),
                ("performanceCondition", Unsupported),
            ],
        )
        .with_fields(
            MetricKind::HeartRate,
            &[
                ("heartRate", Supported),
                ("timestamp", Supported),
                ("hrvStatus", Unsupported),
                ("hrvValueInMs", Unsupported),
                ("stressLevel", Unsupported),
                ("bodyBattery", Unsupported),
                ("pulseOx", Unsupported),
            ],
        )
        .with_fields(
            MetricKind::Steps,
            &[("steps", Supported), ("timestamp", Supported)],
        )
}
