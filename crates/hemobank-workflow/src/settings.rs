// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Workflow tuning derived from the loaded configuration.

use std::time::Duration;

use hemobank_config::HemobankConfig;
use hemobank_core::ShelfLifePolicy;

/// Everything the workflows read from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub shelf_life: ShelfLifePolicy,
    /// Volume pre-filled into new intake rows.
    pub default_volume_ml: u32,
    pub lookup_debounce: Duration,
    /// Upper bound on every registry call made by a workflow.
    pub request_timeout: Duration,
    /// When set, every release destination field except the request
    /// reference must be filled before confirming.
    pub require_release_details: bool,
}

impl WorkflowSettings {
    pub fn from_config(config: &HemobankConfig) -> Self {
        Self {
            shelf_life: ShelfLifePolicy {
                rbc_days: config.lifecycle.rbc_shelf_life_days,
                plasma_days: config.lifecycle.plasma_shelf_life_days,
                platelet_days: config.lifecycle.platelet_shelf_life_days,
            },
            default_volume_ml: config.lifecycle.default_volume_ml,
            lookup_debounce: Duration::from_millis(config.workflow.lookup_debounce_ms),
            request_timeout: Duration::from_secs(config.registry.request_timeout_secs),
            require_release_details: config.workflow.require_release_details,
        }
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from_config(&HemobankConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use hemobank_core::ComponentType;

    use super::*;

    #[test]
    fn defaults_follow_config_defaults() {
        let settings = WorkflowSettings::default();
        assert_eq!(settings.default_volume_ml, 100);
        assert_eq!(settings.lookup_debounce, Duration::from_millis(300));
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert!(settings.require_release_details);
        assert_eq!(settings.shelf_life.shelf_life_days(ComponentType::Platelet), 5);
    }

    #[test]
    fn shelf_life_overrides_are_carried() {
        let mut config = HemobankConfig::default();
        config.lifecycle.platelet_shelf_life_days = 7;
        config.registry.request_timeout_secs = 2;
        let settings = WorkflowSettings::from_config(&config);
        assert_eq!(settings.shelf_life.platelet_days, 7);
        assert_eq!(settings.request_timeout, Duration::from_secs(2));
    }
}
