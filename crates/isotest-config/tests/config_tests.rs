//! Configuration loading and precedence tests

use isotest_config::{ConfigError, ConfigLoader, ProjectConfig, RunnerSettings};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn create_config_file(dir: &Path, content: &str) -> PathBuf {
    let config_path = dir.join("isotest.toml");
    fs::write(&config_path, content).unwrap();
    config_path
}

/// Loader with no global config and no inherited overrides from the environment
fn loader_for(dir: &Path) -> ConfigLoader {
    for var in [
        "ISOTEST_TIMEOUT",
        "ISOTEST_POLL_INTERVAL_US",
        "ISOTEST_COLOR",
        "NO_COLOR",
    ] {
        env::remove_var(var);
    }
    ConfigLoader::new().with_global_config_path(dir.join("global.toml"))
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
#[serial]
fn test_load_full_runner_table() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[runner]
default_timeout = 15
poll_interval_us = 1000
color = false
"#,
    );

    let config = loader_for(temp_dir.path())
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert_eq!(
        config.runner(),
        RunnerSettings {
            default_timeout: 15,
            poll_interval_us: 1000,
            color: false,
        }
    );
}

#[test]
#[serial]
fn test_load_with_empty_config() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "");

    let config = loader_for(temp_dir.path())
        .load_from_directory(temp_dir.path())
        .unwrap();

    // Empty config is valid (all fields optional)
    assert!(config.is_project());
    assert_eq!(config.runner(), RunnerSettings::default());
}

#[test]
#[serial]
fn test_load_from_specific_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(temp_dir.path(), "[runner]\ndefault_timeout = 1\n");

    let config = loader_for(temp_dir.path()).load_from_file(&path).unwrap();

    assert_eq!(config.runner().default_timeout, 1);
    assert_eq!(config.project_root(), Some(temp_dir.path()));
}

#[test]
fn test_invalid_toml_reports_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(temp_dir.path(), "[runner\n");

    match ProjectConfig::load_from_file(&path) {
        Err(ConfigError::TomlParseError { file, .. }) => assert_eq!(file, path),
        other => panic!("expected parse error, got {:?}", other),
    }
}

// ============================================================================
// Environment Override Tests
// ============================================================================

#[rstest]
#[case("true", true)]
#[case("1", true)]
#[case("YES", true)]
#[case("false", false)]
#[case("0", false)]
#[case("no", false)]
#[serial]
fn test_color_env_values(#[case] value: &str, #[case] expected: bool) {
    let temp_dir = TempDir::new().unwrap();
    let mut loader = loader_for(temp_dir.path());
    env::set_var("ISOTEST_COLOR", value);

    let config = loader.load_from_directory(temp_dir.path());

    env::remove_var("ISOTEST_COLOR");

    assert_eq!(config.unwrap().runner().color, expected);
}

#[test]
#[serial]
fn test_env_overrides_project_file() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        "[runner]\ndefault_timeout = 100\npoll_interval_us = 100\n",
    );

    let mut loader = loader_for(temp_dir.path());
    env::set_var("ISOTEST_POLL_INTERVAL_US", "2000");

    let config = loader.load_from_directory(temp_dir.path());

    env::remove_var("ISOTEST_POLL_INTERVAL_US");

    let settings = config.unwrap().runner();
    assert_eq!(settings.default_timeout, 100);
    assert_eq!(settings.poll_interval_us, 2000);
}

#[test]
#[serial]
fn test_broken_global_config_is_ignored() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("global.toml"), "not toml at all [").unwrap();

    let config = loader_for(temp_dir.path())
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert_eq!(config.runner(), RunnerSettings::default());
}
