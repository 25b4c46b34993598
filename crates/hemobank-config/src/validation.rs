// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde attributes cannot express. All problems
//! are collected; validation does not stop at the first one.

use crate::diagnostic::ConfigError;
use crate::model::HemobankConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Longest debounce that still feels interactive.
const MAX_DEBOUNCE_MS: u64 = 5_000;

pub fn validate_config(config: &HemobankConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.app.operator.trim().is_empty() {
        fail("app.operator must not be empty".to_string());
    }

    let level = config.app.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "app.log_level `{}` is not one of {}",
            config.app.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.registry.database_path.trim().is_empty() {
        fail("registry.database_path must not be empty".to_string());
    }

    if config.registry.request_timeout_secs == 0 {
        fail("registry.request_timeout_secs must be at least 1".to_string());
    }

    let shelf_lives = [
        ("lifecycle.rbc_shelf_life_days", config.lifecycle.rbc_shelf_life_days),
        ("lifecycle.plasma_shelf_life_days", config.lifecycle.plasma_shelf_life_days),
        ("lifecycle.platelet_shelf_life_days", config.lifecycle.platelet_shelf_life_days),
    ];
    for (key, days) in shelf_lives {
        if days == 0 {
            fail(format!("{key} must be at least 1 day"));
        }
    }

    if config.lifecycle.default_volume_ml == 0 {
        fail("lifecycle.default_volume_ml must be greater than zero".to_string());
    }

    if config.workflow.lookup_debounce_ms > MAX_DEBOUNCE_MS {
        fail(format!(
            "workflow.lookup_debounce_ms must be at most {MAX_DEBOUNCE_MS}, got {}",
            config.workflow.lookup_debounce_ms
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
