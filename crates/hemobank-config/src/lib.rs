// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Hemobank inventory engine.
//!
//! TOML configuration with strict validation (`deny_unknown_fields`), XDG file
//! hierarchy lookup, `HEMOBANK_*` environment overrides, and miette
//! diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use hemobank_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("database: {}", config.registry.database_path);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError, SourceIndex};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::HemobankConfig;

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<HemobankConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load configuration from a specific file (plus env overrides) and validate it.
///
/// Unlike the search path, an explicit file must exist.
pub fn load_and_validate_path(path: &std::path::Path) -> Result<HemobankConfig, Vec<ConfigError>> {
    if !path.is_file() {
        return Err(vec![ConfigError::FileNotFound {
            path: path.display().to_string(),
        }]);
    }
    finish(loader::load_config_from_path(path), || {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        SourceIndex::new(vec![(path.display().to_string(), content)])
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<HemobankConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        SourceIndex::inline(toml_content)
    })
}

fn finish(
    loaded: Result<HemobankConfig, figment::Error>,
    sources: impl FnOnce() -> SourceIndex,
) -> Result<HemobankConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            tracing::debug!(database = %config.registry.database_path, "configuration loaded");
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Read every config file that exists, for error span resolution.
fn collect_toml_sources() -> SourceIndex {
    let files = loader::config_file_candidates()
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let display = std::fs::canonicalize(&path)
                .unwrap_or(path)
                .display()
                .to_string();
            Some((display, content))
        })
        .collect();
    SourceIndex::new(files)
}
