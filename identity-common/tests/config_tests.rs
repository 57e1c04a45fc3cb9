//! Unit tests for bootstrap configuration and graceful degradation
//!
//! Covers:
//! - Missing TOML files SHALL NOT cause termination
//! - Partial TOML files fill remaining fields from defaults
//! - Malformed TOML files are reported, not ignored

use identity_common::config::{
    default_database_path, load_or_default, load_toml_config, validate, TomlConfig,
};
use identity_common::Error;
use std::io::Write;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("identity.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn test_defaults() {
    let config = TomlConfig::default();

    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 3000);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.store.max_connections, 10);
    assert_eq!(config.store.busy_timeout_ms, 5000);
    assert_eq!(config.store.max_conflict_wait_ms, 5000);
    assert!(config.database_path.is_none());
    assert!(validate(&config).is_ok());
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    let config = load_or_default(Some(missing.as_path())).expect("missing config must not be fatal");
    assert_eq!(config.port, 3000);
}

#[test]
fn test_partial_file_merges_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
port = 8080
database_path = "/var/lib/identity/contacts.db"

[store]
max_conflict_wait_ms = 250
"#,
    );

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.port, 8080);
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(
        config.database_path.as_deref(),
        Some(std::path::Path::new("/var/lib/identity/contacts.db"))
    );
    assert_eq!(config.store.max_conflict_wait_ms, 250);
    assert_eq!(config.store.max_connections, 10);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_logging_section() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[logging]\nlevel = \"debug\"\n");

    let config = load_or_default(Some(path.as_path())).unwrap();
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "port = \"not a number\"\n");

    let result = load_or_default(Some(path.as_path()));
    assert!(matches!(result, Err(Error::Toml(_))));
}

#[test]
fn test_validate_rejects_zero_values() {
    let mut config = TomlConfig::default();
    config.port = 0;
    assert!(matches!(validate(&config), Err(Error::Config(_))));

    let mut config = TomlConfig::default();
    config.store.max_connections = 0;
    assert!(matches!(validate(&config), Err(Error::Config(_))));
}

#[test]
fn test_default_database_path_names_contacts_db() {
    let path = default_database_path();
    assert_eq!(path.file_name().unwrap(), "contacts.db");
}
