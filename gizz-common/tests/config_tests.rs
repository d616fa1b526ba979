//! Tests for config file resolution and graceful degradation
//!
//! Uses serial_test: tests manipulating GIZZ_QUIZ_CONFIG run sequentially.

use gizz_common::config::{
    load_or_default, load_toml_config, resolve_config_path, TomlConfig, CONFIG_ENV_VAR,
};
use gizz_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
#[serial]
fn test_env_var_used_when_no_cli_arg() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/gizz-env-config.toml");

    let resolved = resolve_config_path(None);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/gizz-env-config.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_arg_beats_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/gizz-env-config.toml");

    let cli = PathBuf::from("/tmp/gizz-cli-config.toml");
    let resolved = resolve_config_path(Some(&cli));
    assert_eq!(resolved, Some(cli));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_missing_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    let config = load_or_default(Some(&missing)).unwrap();
    assert_eq!(config.port, TomlConfig::default().port);
    assert_eq!(config.catalog.base_url, "https://kglw.net/api/v2");
}

#[test]
fn test_file_values_override_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
port = 6000

[logging]
level = "debug"

[archive]
min_tracks = 8

[playback]
clip_start_secs = 45
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.port, 6000);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.archive.min_tracks, 8);
    assert_eq!(config.archive.candidate_count, 6);
    assert_eq!(config.playback.clip_start_secs, 45);
    assert_eq!(config.playback.clip_duration_secs, 30);
}

#[test]
fn test_malformed_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "port = \"not a number\"").unwrap();

    let err = load_or_default(Some(&path)).unwrap_err();
    assert!(matches!(err, Error::Parse { ref path, .. } if path.ends_with("config.toml")));
}

#[test]
fn test_invalid_values_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[archive]\ncandidate_count = 0\n").unwrap();

    let err = load_toml_config(&path).unwrap_err();
    assert!(err.to_string().contains("candidate_count"));
}
