// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with "did you mean" suggestions.
//!
//! Deserialization failures are turned into [`ConfigError`] diagnostics that
//! point at the offending key inside the TOML file it came from.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with enough context for miette to render it.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(hemobank::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest valid key, if any is similar enough.
        suggestion: Option<String>,
        /// Comma-separated valid keys for the section.
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(hemobank::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(hemobank::config::missing_key),
        help("add `{key} = <value>` to your hemobank.toml")
    )]
    MissingKey { key: String },

    /// A config file named explicitly does not exist.
    #[error("configuration file not found: {path}")]
    #[diagnostic(
        code(hemobank::config::file_not_found),
        help("check the path passed to --config")
    )]
    FileNotFound { path: String },

    /// A value deserialized fine but violates a semantic constraint.
    #[error("validation error: {message}")]
    #[diagnostic(code(hemobank::config::validation))]
    Validation { message: String },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(hemobank::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// TOML files that were read during loading, keyed by display path.
#[derive(Debug, Default)]
pub struct SourceIndex {
    files: Vec<(String, String)>,
}

impl SourceIndex {
    pub fn new(files: Vec<(String, String)>) -> Self {
        Self { files }
    }

    /// An index holding a single in-memory document.
    pub fn inline(content: &str) -> Self {
        Self::new(vec![("<inline>".to_string(), content.to_string())])
    }

    fn get(&self, path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, content)| content.as_str())
    }

    /// Locate `field` within `section` of the file the error came from.
    fn locate(
        &self,
        error: &figment::error::Error,
        field: &str,
    ) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
        let origin = match error.metadata.as_ref().and_then(|m| m.source.as_ref()) {
            Some(figment::Source::File(path)) => path.display().to_string(),
            // Inline strings carry no file metadata; fall back to the single inline document.
            _ if self.files.len() == 1 && self.files[0].0 == "<inline>" => "<inline>".to_string(),
            _ => return (None, None),
        };
        let Some(content) = self.get(&origin) else {
            return (None, None);
        };
        let section: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
        match find_key_offset(content, &section, field) {
            Some(offset) => (
                Some(SourceSpan::new(offset.into(), field.len())),
                Some(NamedSource::new(origin, content.to_string())),
            ),
            None => (None, None),
        }
    }
}

/// Convert a `figment::Error` (which may hold several errors) into diagnostics.
pub fn figment_to_config_errors(err: figment::Error, sources: &SourceIndex) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let valid: Vec<&str> = expected.to_vec();
                let (span, src) = sources.locate(&error, field);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, &valid),
                    valid_keys: valid.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.clone().into_owned(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: dotted_path(&error),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

fn dotted_path(error: &figment::error::Error) -> String {
    error
        .path
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Byte offset of `field` at the start of a line, after the `[section]` header.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path.first() {
        None => 0,
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
    };

    let mut line_start = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            // Next section reached.
            return None;
        }
        let is_key = trimmed
            .strip_prefix(field)
            .is_some_and(|after| after.trim_start().starts_with('='));
        if is_key {
            return Some(line_start + (line.len() - trimmed.len()));
        }
        line_start += line.len();
    }
    None
}

/// Best Jaro-Winkler match above the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|&key| (key, strsim::jaro_winkler(unknown, key)))
        .filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key.to_string())
}

/// Render diagnostics to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        if handler.render_report(&mut buf, error).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_wal_mode_for_transposed_letters() {
        let valid = &["database_path", "wal_mode", "request_timeout_secs"];
        assert_eq!(suggest_key("wal_mdoe", valid), Some("wal_mode".to_string()));
    }

    #[test]
    fn suggests_platelet_shelf_life() {
        let valid = &[
            "rbc_shelf_life_days",
            "plasma_shelf_life_days",
            "platelet_shelf_life_days",
            "default_volume_ml",
        ];
        assert_eq!(
            suggest_key("platelet_shelf_live_days", valid),
            Some("platelet_shelf_life_days".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["operator", "log_level"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_in_section() {
        let content = "[app]\noperator = \"x\"\n[registry]\nwal_mdoe = true\n";
        let path = vec!["registry".to_string()];
        let o = find_key_offset(content, &path, "wal_mdoe").expect("key should be located");
        assert_eq!(&content[o..o + 8], "wal_mdoe");
    }

    #[test]
    fn find_key_offset_stops_at_next_section() {
        let content = "[app]\nlog_level = \"x\"\n[registry]\noperator = \"y\"\n";
        let path = vec!["app".to_string()];
        assert_eq!(find_key_offset(content, &path, "operator"), None);
    }

    #[test]
    fn find_key_offset_missing_section() {
        let content = "[app]\noperator = \"x\"\n";
        let path = vec!["workflow".to_string()];
        assert_eq!(find_key_offset(content, &path, "operator"), None);
    }
}
