// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Device capability registry.
//!
//! Profiles are data, not code: adding support for a new watch model means
//! adding a table entry in [`profiles`], never new filtering logic. Unknown
//! models resolve to a pass-through profile so filtering stays opt-in per
//! model and never silently drops data for unrecognized hardware.

pub mod profiles;

use crate::models::MetricKind;
use std::collections::HashMap;

/// Declared support for one field on one device model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSupport {
    Supported,
    /// Hardware reports the field but with reduced accuracy; values are
    /// retained and callers treat them as approximate.
    Partial,
    Unsupported,
}

/// Per-model table of field support, keyed by metric kind.
#[derive(Debug, Clone)]
pub struct CapabilityProfile {
    model_name: String,
    fields: HashMap<MetricKind, HashMap<&'static str, FieldSupport>>,
}

impl CapabilityProfile {
    /// A profile with no field entries: every field passes through.
    pub fn passthrough(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_fields(
        mut self,
        kind: MetricKind,
        entries: &[(&'static str, FieldSupport)],
    ) -> Self {
        self.fields
            .entry(kind)
            .or_default()
            .extend(entries.iter().copied());
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Declared support level, if the profile mentions the field at all.
    pub fn support(&self, kind: MetricKind, field: &str) -> Option<FieldSupport> {
        self.fields.get(&kind).and_then(|m| m.get(field)).copied()
    }

    /// Whether the filter keeps this field. Unmentioned fields pass through:
    /// the table narrows known-bad fields, it is not a whitelist.
    pub fn retains(&self, kind: MetricKind, field: &str) -> bool {
        !matches!(self.support(kind, field), Some(FieldSupport::Unsupported))
    }
}

/// Lookup table from device model name to capability profile.
///
/// Lookups are case-insensitive on the model name. Unrecognized models get
/// the pass-through profile.
#[derive(Debug)]
pub struct CapabilityRegistry {
    profiles: HashMap<String, CapabilityProfile>,
    passthrough: CapabilityProfile,
}

impl CapabilityRegistry {
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
            passthrough: CapabilityProfile::passthrough("unknown"),
        }
    }

    /// Registry preloaded with every model we carry a profile for.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(profiles::forerunner_235());
        registry
    }

    pub fn register(&mut self, profile: CapabilityProfile) {
        self.profiles
            .insert(profile.model_name.to_lowercase(), profile);
    }

    pub fn lookup(&self, model_name: &str) -> &CapabilityProfile {
        self.profiles
            .get(&model_name.to_lowercase())
            .unwrap_or(&self.passthrough)
    }

    pub fn is_known(&self, model_name: &str) -> bool {
        self.profiles.contains_key(&model_name.to_lowercase())
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = CapabilityRegistry::standard();
        assert!(registry.is_known("Forerunner 235"));
        assert!(registry.is_known("forerunner 235"));
        assert!(registry.is_known("FORERUNNER 235"));
        assert_eq!(
            registry.lookup("forerunner 235").model_name(),
            "Forerunner 235"
        );
    }

    #[test]
    fn test_unknown_model_gets_passthrough() {
        let registry = CapabilityRegistry::standard();
        let profile = registry.lookup("Fenix 99");
        assert!(profile.retains(MetricKind::Sleep, "remSleepSeconds"));
        assert!(profile.retains(MetricKind::HeartRate, "hrvStatus"));
        assert!(profile.support(MetricKind::Sleep, "remSleepSeconds").is_none());
    }

    #[test]
    fn test_unmentioned_fields_pass_through() {
        let registry = CapabilityRegistry::standard();
        let profile = registry.lookup("Forerunner 235");
        // Not in the table at all, so it is retained.
        assert!(profile.retains(MetricKind::Sleep, "someFutureField"));
        assert!(profile.support(MetricKind::Sleep, "someFutureField").is_none());
    }

    #[test]
    fn test_registered_profile_overrides_passthrough() {
        let mut registry = CapabilityRegistry::empty();
        assert!(registry.lookup("Vivoactive").retains(MetricKind::Steps, "steps"));

        registry.register(
            CapabilityProfile::passthrough("Vivoactive")
                .with_fields(MetricKind::Steps, &[("steps", FieldSupport::Unsupported)]),
        );
        assert!(!registry.lookup("Vivoactive").retains(MetricKind::Steps, "steps"));
    }
}
