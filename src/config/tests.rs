//! Integration tests for Config loading, resolution and validation.

use super::*;
use crate::error::ConfigError;
use std::io::Write;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

// ============================================================
// Config Loading Tests
// ============================================================

#[test]
fn load_valid_config() {
    let config = Config::load(&fixture_path("config_valid.yaml")).unwrap();

    assert_eq!(config.app_name(), "Acme Rooms");
    assert_eq!(config.listen_port(), Some(3010));
    assert_eq!(config.timezone(), chrono_tz::Europe::Rome);

    let email = &config.integrations.email;
    assert!(email.alert);
    assert!(email.notify);
    assert_eq!(email.host.as_deref(), Some("smtp.example.com"));
    assert_eq!(email.port, 587);
    assert_eq!(email.send_to.as_deref(), Some("ops@example.com"));

    assert!(config.validate().is_ok());
}

#[test]
fn load_valid_config_resolves_settings() {
    let config = Config::load(&fixture_path("config_valid.yaml")).unwrap();
    let settings = config.email_settings();

    assert!(settings.alert_ready());
    assert!(settings.notify_ready());
    assert_eq!(settings.from, "Acme Rooms <rooms@example.com>");
    assert_eq!(settings.send_to, "ops@example.com");
    assert_eq!(settings.password.expose(), "not-a-real-password");
}

#[test]
fn load_missing_file_fails() {
    let result = Config::load(&fixture_path("does_not_exist.yaml"));
    match result {
        Err(ConfigError::LoadError(message)) => assert!(message.contains("does_not_exist.yaml")),
        other => panic!("Expected LoadError, got {:?}", other),
    }
}

#[test]
fn load_malformed_yaml_fails() {
    let result = Config::load(&fixture_path("config_malformed.yaml"));
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn load_disabled_config_never_dispatches() {
    let config = Config::load(&fixture_path("config_disabled.yaml")).unwrap();
    let settings = config.email_settings();

    assert!(settings.has_base_config());
    assert!(settings.implicit_tls());
    assert!(!settings.alert_ready());
    assert!(!settings.notify_ready());
}

#[test]
fn load_from_temp_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "ui:\n  brand:\n    app:\n      name: Temp").unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.app_name(), "Temp");
}

// ============================================================
// Defaults
// ============================================================

#[test]
fn empty_document_uses_defaults() {
    let config = Config::parse("").unwrap();

    assert_eq!(config.app_name(), DEFAULT_APP_NAME);
    assert_eq!(config.listen_port(), None);
    assert_eq!(config.timezone(), chrono_tz::UTC);
    assert!(!config.email_settings().has_base_config());
    assert!(config.validate().is_ok());
}

#[test]
fn blank_app_name_falls_back_to_default() {
    let config = Config::parse("ui:\n  brand:\n    app:\n      name: \"   \"").unwrap();
    assert_eq!(config.app_name(), DEFAULT_APP_NAME);
}

#[test]
fn invalid_timezone_falls_back_to_utc() {
    let config = Config::parse("logging:\n  timezone: Nowhere/Special").unwrap();
    assert_eq!(config.timezone(), chrono_tz::UTC);
}

#[test]
fn listen_port_accepts_string() {
    let config = Config::parse("server:\n  listen:\n    port: \"8443\"").unwrap();
    assert_eq!(config.listen_port(), Some(8443));
}

// ============================================================
// Validation
// ============================================================

#[test]
fn validate_reports_every_problem() {
    let config = Config::load(&fixture_path("config_invalid.yaml")).unwrap();
    let errors = config.validate().unwrap_err();
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();

    assert_eq!(errors.len(), 3, "unexpected errors: {:?}", messages);
    assert!(messages.iter().any(|m| m.contains("Mars/Olympus")));
    assert!(messages.iter().any(|m| m.contains("port")));
    assert!(messages.iter().any(|m| m.contains("not-an-email")));
}

#[test]
fn invalid_config_still_loads_and_stays_silent() {
    let config = Config::load(&fixture_path("config_invalid.yaml")).unwrap();
    let settings = config.email_settings();

    assert_eq!(settings.port, 0);
    assert!(!settings.alert_ready());
}
