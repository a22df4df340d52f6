//! Unit tests for configuration loading and graceful degradation
//!
//! Tests cover:
//! - Missing config file SHALL NOT cause termination
//! - Partial config files fill the rest from compiled defaults
//! - Unparsable config files are reported as errors
//! - Priority order for config file resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate QSYNC_CONFIG are marked with #[serial].

use qsync_common::config::{resolve_config_path, SyncTimings, TomlConfig, CONFIG_ENV_VAR};
use qsync_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Should create temp file");
    file.write_all(content.as_bytes()).expect("Should write config");
    file
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let missing = PathBuf::from("/tmp/qsync-test-does-not-exist/config.toml");
    let config = TomlConfig::load(Some(&missing)).expect("Missing file must not be an error");

    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.addr, "0.0.0.0");
    assert_eq!(config.oracle.graphql_server, "http://localhost:4000");
    assert_eq!(config.timings, SyncTimings::default());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_no_config_path_uses_defaults() {
    let config = TomlConfig::load(None).expect("Defaults should load");
    assert_eq!(config.oracle.request_timeout(), Duration::from_secs(30));
}

#[test]
fn test_partial_config_keeps_other_defaults() {
    let file = write_config(
        r#"
[server]
port = 9090

[timings]
device_ceiling_secs = 180
"#,
    );

    let config = TomlConfig::load(Some(file.path())).expect("Should parse partial config");

    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.addr, "0.0.0.0");
    assert_eq!(config.timings.device_ceiling(), Duration::from_secs(180));
    assert_eq!(config.timings.status_interval(), Duration::from_secs(10));
    assert_eq!(config.timings.resume_ceiling(), Duration::from_secs(900));
}

#[test]
fn test_full_config_file() {
    let file = write_config(
        r#"
[server]
addr = "127.0.0.1"
port = 5800

[oracle]
graphql_server = "http://queue.internal:4000/graphql"
request_timeout_secs = 5

[timings]
status_interval_secs = 15
status_arm_delay_secs = 3
paused_interval_secs = 20
resume_ceiling_secs = 600
device_interval_ms = 500
device_ceiling_secs = 120

[logging]
level = "debug"
"#,
    );

    let config = TomlConfig::load(Some(file.path())).expect("Should parse full config");

    assert_eq!(config.server.addr, "127.0.0.1");
    assert_eq!(config.oracle.graphql_server, "http://queue.internal:4000/graphql");
    assert_eq!(config.oracle.request_timeout(), Duration::from_secs(5));
    assert_eq!(config.timings.status_arm_delay(), Duration::from_secs(3));
    assert_eq!(config.timings.device_interval(), Duration::from_millis(500));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_unparsable_config_is_an_error() {
    let file = write_config("[server]\nport = \"not a number\"\n");
    let result = TomlConfig::load(Some(file.path()));
    assert!(matches!(result, Err(Error::TomlParse(_))));
}

#[test]
fn test_zero_interval_in_file_is_rejected() {
    let file = write_config("[timings]\ndevice_interval_ms = 0\n");
    let result = TomlConfig::load(Some(file.path()));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_cli_path_takes_precedence_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/qsync-from-env.toml");

    let resolved = resolve_config_path(Some(Path::new("/tmp/qsync-from-cli.toml")));
    assert_eq!(resolved, Some(PathBuf::from("/tmp/qsync-from-cli.toml")));

    // Cleanup
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_arg() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/qsync-from-env.toml");

    let resolved = resolve_config_path(None);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/qsync-from-env.toml")));

    // Cleanup
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_empty_env_var_is_ignored() {
    env::set_var(CONFIG_ENV_VAR, "");

    let resolved = resolve_config_path(None);
    assert_ne!(resolved, Some(PathBuf::from("")));

    // Cleanup
    env::remove_var(CONFIG_ENV_VAR);
}
