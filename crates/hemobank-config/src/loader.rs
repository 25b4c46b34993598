// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./hemobank.toml` > `~/.config/hemobank/hemobank.toml` > `/etc/hemobank/hemobank.toml`
//! with environment variable overrides via `HEMOBANK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::HemobankConfig;

const SYSTEM_CONFIG: &str = "/etc/hemobank/hemobank.toml";
const LOCAL_CONFIG: &str = "hemobank.toml";

/// Top-level sections that environment keys are split on.
const SECTIONS: [&str; 4] = ["app", "registry", "lifecycle", "workflow"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/hemobank/hemobank.toml` (system-wide)
/// 3. `~/.config/hemobank/hemobank.toml` (user XDG config)
/// 4. `./hemobank.toml` (local directory)
/// 5. `HEMOBANK_*` environment variables
pub fn load_config() -> Result<HemobankConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<HemobankConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HemobankConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HemobankConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HemobankConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(HemobankConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// `~/.config/hemobank/hemobank.toml`, when a config dir exists.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("hemobank").join(LOCAL_CONFIG))
}

/// Candidate config files in merge order, for diagnostics.
pub fn config_file_candidates() -> Vec<std::path::PathBuf> {
    let mut paths = vec![std::path::PathBuf::from(SYSTEM_CONFIG)];
    if let Some(user) = user_config_path() {
        paths.push(user);
    }
    paths.push(std::path::PathBuf::from(LOCAL_CONFIG));
    paths
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `HEMOBANK_REGISTRY_DATABASE_PATH` must map to
/// `registry.database_path`, not `registry.database.path`.
fn env_provider() -> Env {
    Env::prefixed("HEMOBANK_").map(|key| {
        let key = key.as_str();
        for section in SECTIONS {
            if let Some(rest) = key
                .strip_prefix(section)
                .and_then(|r| r.strip_prefix('_'))
            {
                return format!("{section}.{rest}").into();
            }
        }
        key.to_string().into()
    })
}
