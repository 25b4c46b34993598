// SPDX-FileCopyrightText: 2026 Hemobank Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Hemobank configuration system.

use hemobank_config::diagnostic::ConfigError;
use hemobank_config::model::HemobankConfig;
use hemobank_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[app]
operator = "nurse.ana"
log_level = "debug"

[registry]
database_path = "/tmp/bank.db"
wal_mode = false
request_timeout_secs = 5

[lifecycle]
rbc_shelf_life_days = 42
plasma_shelf_life_days = 365
platelet_shelf_life_days = 7
default_volume_ml = 450

[workflow]
lookup_debounce_ms = 150
require_release_details = false
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.operator, "nurse.ana");
    assert_eq!(config.app.log_level, "debug");
    assert_eq!(config.registry.database_path, "/tmp/bank.db");
    assert!(!config.registry.wal_mode);
    assert_eq!(config.registry.request_timeout_secs, 5);
    assert_eq!(config.lifecycle.rbc_shelf_life_days, 42);
    assert_eq!(config.lifecycle.platelet_shelf_life_days, 7);
    assert_eq!(config.lifecycle.default_volume_ml, 450);
    assert_eq!(config.workflow.lookup_debounce_ms, 150);
    assert!(!config.workflow.require_release_details);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.app.operator, "operator");
    assert_eq!(config.app.log_level, "info");
    assert!(config.registry.database_path.ends_with("hemobank.db"));
    assert!(config.registry.wal_mode);
    assert_eq!(config.registry.request_timeout_secs, 30);
    assert_eq!(config.lifecycle.rbc_shelf_life_days, 365);
    assert_eq!(config.lifecycle.plasma_shelf_life_days, 365);
    assert_eq!(config.lifecycle.platelet_shelf_life_days, 5);
    assert_eq!(config.lifecycle.default_volume_ml, 100);
    assert_eq!(config.workflow.lookup_debounce_ms, 300);
    assert!(config.workflow.require_release_details);
}

#[test]
fn unknown_field_in_registry_is_rejected() {
    let toml = r#"
[registry]
wal_mdoe = true
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("wal_mdoe"),
        "error should mention unknown field, got: {err_str}"
    );
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let toml = r#"
[cloud]
endpoint = "https://example.org"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("cloud"),
        "got: {err_str}"
    );
}

/// `HEMOBANK_REGISTRY_DATABASE_PATH` maps to `registry.database_path`, not `registry.database.path`.
#[test]
fn env_vars_map_underscored_keys() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("HEMOBANK_REGISTRY_DATABASE_PATH", "/srv/bank.db");
        jail.set_env("HEMOBANK_LIFECYCLE_PLATELET_SHELF_LIFE_DAYS", "7");
        jail.set_env("HEMOBANK_WORKFLOW_REQUIRE_RELEASE_DETAILS", "false");
        jail.create_file("hemobank.toml", "[app]\noperator = \"from-file\"\n")?;

        let config = hemobank_config::load_config_from_path(std::path::Path::new("hemobank.toml"))?;
        assert_eq!(config.app.operator, "from-file");
        assert_eq!(config.registry.database_path, "/srv/bank.db");
        assert_eq!(config.lifecycle.platelet_shelf_life_days, 7);
        assert!(!config.workflow.require_release_details);
        Ok(())
    });
}

#[test]
fn env_overrides_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("hemobank.toml", "[app]\noperator = \"from-file\"\n")?;
        jail.set_env("HEMOBANK_APP_OPERATOR", "from-env");

        let config = hemobank_config::load_config_from_path(std::path::Path::new("hemobank.toml"))?;
        assert_eq!(config.app.operator, "from-env");
        Ok(())
    });
}

#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: HemobankConfig = Figment::new()
        .merge(Serialized::defaults(HemobankConfig::default()))
        .merge(Toml::file("/nonexistent/path/hemobank.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.lifecycle.rbc_shelf_life_days, 365);
}

#[test]
fn diagnostic_unknown_key_carries_suggestion_and_valid_keys() {
    let toml = r#"
[registry]
wal_mdoe = true
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "wal_mdoe"
                && suggestion.as_deref() == Some("wal_mode")
                && valid_keys.contains("database_path")
        })
    });
    assert!(found, "expected UnknownKey for wal_mdoe, got: {errors:?}");
}

#[test]
fn diagnostic_invalid_type_names_the_key() {
    let toml = r#"
[workflow]
lookup_debounce_ms = "fast"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::InvalidType { key, .. } if key.contains("lookup_debounce_ms"))
    });
    assert!(found, "got: {errors:?}");
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "wal_mdoe".to_string(),
        suggestion: Some("wal_mode".to_string()),
        valid_keys: "database_path, wal_mode, request_timeout_secs".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some(), "should have diagnostic code");
    let help = error.help().expect("should have help text").to_string();
    assert!(help.contains("did you mean `wal_mode`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("wal_mdoe"));
}

#[test]
fn validation_catches_zero_shelf_life() {
    let toml = r#"
[lifecycle]
rbc_shelf_life_days = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero shelf life should fail");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("rbc_shelf_life_days"))
    });
    assert!(found, "got: {errors:?}");
}

#[test]
fn load_and_validate_valid_toml() {
    let config = load_and_validate_str("[app]\noperator = \"tech.lee\"\n")
        .expect("valid TOML should validate");
    assert_eq!(config.app.operator, "tech.lee");
}

#[test]
fn explicit_config_path_must_exist() {
    let errors = load_and_validate_path(std::path::Path::new("/nonexistent/typo-hemobank.toml"))
        .expect_err("a missing explicit file is an error");
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        ConfigError::FileNotFound { path } if path.contains("typo-hemobank.toml")
    ));
}

#[test]
fn explicit_config_path_is_loaded() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("bank.toml", "[app]\noperator = \"tech.lee\"\n")?;
        let config = load_and_validate_path(std::path::Path::new("bank.toml"))
            .map_err(|e| format!("{e:?}"))?;
        assert_eq!(config.app.operator, "tech.lee");
        Ok(())
    });
}
