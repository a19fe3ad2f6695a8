//! Configuration resolution tests
//!
//! Tests the implementation of:
//! - Priority order: CLI path → FILING_CONFIG → default location
//! - Environment overrides for database, backend URL, log level, port
//! - Missing config files degrade to defaults
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.

use filing_common::config::{
    resolve_config_path, ServiceConfig, ENV_BACKEND_URL, ENV_CONFIG_PATH, ENV_DATABASE_PATH,
    ENV_LOG_LEVEL, ENV_PORT,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

fn clear_env() {
    for var in [ENV_CONFIG_PATH, ENV_DATABASE_PATH, ENV_BACKEND_URL, ENV_LOG_LEVEL, ENV_PORT] {
        env::remove_var(var);
    }
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_cli_path_wins_over_env() {
    clear_env();
    env::set_var(ENV_CONFIG_PATH, "/from/env.toml");

    let resolved = resolve_config_path(Some(std::path::Path::new("/from/cli.toml")));
    assert_eq!(resolved, Some(PathBuf::from("/from/cli.toml")));

    clear_env();
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    clear_env();
    env::set_var(ENV_CONFIG_PATH, "/from/env.toml");

    assert_eq!(resolve_config_path(None), Some(PathBuf::from("/from/env.toml")));

    clear_env();
}

#[test]
#[serial]
fn test_load_reads_toml_file() {
    clear_env();
    let file = write_config(
        r#"
        [poller]
        max_attempts = 12

        [progress]
        tau_seconds = 60.0
        max_percent = 90
        "#,
    );

    let cfg = ServiceConfig::load(Some(file.path())).unwrap();
    assert_eq!(cfg.poller.max_attempts, 12);
    assert_eq!(cfg.progress.tau_seconds, 60.0);
    assert_eq!(cfg.progress.max_percent, 90);
    assert_eq!(cfg.poller.error_base_ms, 5000);
}

#[test]
#[serial]
fn test_env_overrides_toml_values() {
    clear_env();
    let file = write_config(
        r#"
        [backend]
        base_url = "http://from-toml:9000"

        [logging]
        level = "warn"
        "#,
    );
    env::set_var(ENV_BACKEND_URL, "http://from-env:9100");
    env::set_var(ENV_LOG_LEVEL, "debug");
    env::set_var(ENV_DATABASE_PATH, "/tmp/filing-env.db");
    env::set_var(ENV_PORT, "6123");

    let cfg = ServiceConfig::load(Some(file.path())).unwrap();
    assert_eq!(cfg.backend.base_url, "http://from-env:9100");
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.database.path, PathBuf::from("/tmp/filing-env.db"));
    assert_eq!(cfg.server.port, 6123);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_port_env_ignored() {
    clear_env();
    env::set_var(ENV_PORT, "not-a-port");

    let mut cfg = ServiceConfig::default();
    cfg.apply_env_overrides();
    assert_eq!(cfg.server.port, ServiceConfig::default().server.port);

    clear_env();
}

#[test]
#[serial]
fn test_missing_config_file_uses_defaults() {
    clear_env();
    let cfg = ServiceConfig::load(Some(std::path::Path::new("/definitely/missing.toml"))).unwrap();
    assert_eq!(cfg.poller, ServiceConfig::default().poller);
}

#[test]
#[serial]
fn test_invalid_values_fail_validation() {
    clear_env();
    let file = write_config(
        r#"
        [poller]
        max_attempts = 0
        "#,
    );

    assert!(ServiceConfig::load(Some(file.path())).is_err());
}
