// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Hemobank configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HemobankConfig {
    /// Operator identity and logging.
    #[serde(default)]
    pub app: AppConfig,

    /// Unit registry (SQLite) settings.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Shelf life and intake defaults per component.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Workflow behavior (lookup debounce, release strictness).
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

/// Operator identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Name recorded on activity log entries when the CLI is not given `--operator`.
    #[serde(default = "default_operator")]
    pub operator: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            operator: default_operator(),
            log_level: default_log_level(),
        }
    }
}

fn default_operator() -> String {
    "operator".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Unit registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Upper bound on any single registry call made by a workflow.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("hemobank").join("hemobank.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "hemobank.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Shelf life per blood component and intake defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LifecycleConfig {
    #[serde(default = "default_long_shelf_life")]
    pub rbc_shelf_life_days: u32,

    #[serde(default = "default_long_shelf_life")]
    pub plasma_shelf_life_days: u32,

    #[serde(default = "default_platelet_shelf_life")]
    pub platelet_shelf_life_days: u32,

    /// Volume pre-filled on a new intake row.
    #[serde(default = "default_volume_ml")]
    pub default_volume_ml: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            rbc_shelf_life_days: default_long_shelf_life(),
            plasma_shelf_life_days: default_long_shelf_life(),
            platelet_shelf_life_days: default_platelet_shelf_life(),
            default_volume_ml: default_volume_ml(),
        }
    }
}

fn default_long_shelf_life() -> u32 {
    365
}

fn default_platelet_shelf_life() -> u32 {
    5
}

fn default_volume_ml() -> u32 {
    100
}

/// Workflow behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Quiet period after the last keystroke before a serial is looked up.
    #[serde(default = "default_lookup_debounce_ms")]
    pub lookup_debounce_ms: u64,

    /// Require every release destination field before committing a release.
    #[serde(default = "default_require_release_details")]
    pub require_release_details: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            lookup_debounce_ms: default_lookup_debounce_ms(),
            require_release_details: default_require_release_details(),
        }
    }
}

fn default_lookup_debounce_ms() -> u64 {
    300
}

fn default_require_release_details() -> bool {
    true
}
