//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::ProjectConfig;
use crate::settings::{RunnerSection, RunnerSettings};
use crate::{ConfigError, ConfigResult, PROJECT_CONFIG_FILE};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.isotest/config.toml) - lowest priority
/// 2. Project config (./isotest.toml) - overrides global
/// 3. Environment variables (ISOTEST_*, NO_COLOR) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration, environment overrides already applied
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where isotest.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use a specific file as the global configuration
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find isotest.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;

        // Global config is optional; a broken one must not block a test run
        let global_config = self.load_global_config().unwrap_or_default();

        let project_config = self.apply_env_overrides(project_config)?;

        let config = Config {
            project: project_config,
            global: global_config,
            project_root,
        };
        config.merged_runner().validate("runner")?;
        Ok(config)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = self.load_global_config().unwrap_or_default();
        let project_config = self.apply_env_overrides(project_config)?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());

        let config = Config {
            project: project_config,
            global: global_config,
            project_root,
        };
        config.merged_runner().validate("runner")?;
        Ok(config)
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); default config when nothing is found
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.isotest/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to project config
    ///
    /// - ISOTEST_TIMEOUT=<seconds>
    /// - ISOTEST_POLL_INTERVAL_US=<microseconds>
    /// - ISOTEST_COLOR=true|false
    /// - NO_COLOR=<anything> (wins over ISOTEST_COLOR)
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(timeout) = env::var("ISOTEST_TIMEOUT") {
            config.runner_mut().default_timeout = Some(parse_u64("ISOTEST_TIMEOUT", &timeout)?);
        }

        if let Ok(interval) = env::var("ISOTEST_POLL_INTERVAL_US") {
            config.runner_mut().poll_interval_us =
                Some(parse_u64("ISOTEST_POLL_INTERVAL_US", &interval)?);
        }

        if let Ok(color) = env::var("ISOTEST_COLOR") {
            config.runner_mut().color = Some(parse_bool("ISOTEST_COLOR", &color)?);
        }

        if env::var_os("NO_COLOR").is_some() {
            config.runner_mut().color = Some(false);
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_u64(field: &str, value: &str) -> ConfigResult<u64> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        reason: format!("expected a positive integer, got '{}'", value),
    })
}

fn parse_bool(field: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected true or false, got '{}'", value),
        }),
    }
}

impl Config {
    /// Runner table with project values layered over global ones
    fn merged_runner(&self) -> RunnerSection {
        let mut runner = self.global.runner.clone().unwrap_or_default();
        if let Some(project) = &self.project.runner {
            runner.merge(project);
        }
        runner
    }

    /// Get the effective runner settings (env > project > global > default)
    pub fn runner(&self) -> RunnerSettings {
        RunnerSettings::from(&self.merged_runner())
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has isotest.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    fn isolated_loader(dir: &Path) -> ConfigLoader {
        ConfigLoader::new().with_global_config_path(dir.join("no-global.toml"))
    }

    #[test]
    #[serial]
    fn test_load_project_config() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(
            temp_dir.path(),
            r#"
[runner]
default_timeout = 42
"#,
        );

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_directory(temp_dir.path()).unwrap();

        assert!(config.is_project());
        assert_eq!(config.runner().default_timeout, 42);
    }

    #[test]
    #[serial]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[runner]\ncolor = false\n");

        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_directory(&sub_dir).unwrap();

        assert_eq!(config.project_root(), Some(temp_dir.path()));
        assert!(!config.runner().color);
    }

    #[test]
    #[serial]
    fn test_env_override_timeout() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[runner]\ndefault_timeout = 10\n");

        env::set_var("ISOTEST_TIMEOUT", "3");

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_directory(temp_dir.path());

        env::remove_var("ISOTEST_TIMEOUT");

        assert_eq!(config.unwrap().runner().default_timeout, 3);
    }

    #[test]
    #[serial]
    fn test_env_override_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();

        env::set_var("ISOTEST_POLL_INTERVAL_US", "soon");

        let mut loader = isolated_loader(temp_dir.path());
        let result = loader.load_from_directory(temp_dir.path());

        env::remove_var("ISOTEST_POLL_INTERVAL_US");

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    #[serial]
    fn test_env_zero_timeout_rejected() {
        let temp_dir = TempDir::new().unwrap();

        env::set_var("ISOTEST_TIMEOUT", "0");

        let mut loader = isolated_loader(temp_dir.path());
        let result = loader.load_from_directory(temp_dir.path());

        env::remove_var("ISOTEST_TIMEOUT");

        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_no_color_wins() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[runner]\ncolor = true\n");

        env::set_var("ISOTEST_COLOR", "yes");
        env::set_var("NO_COLOR", "1");

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_directory(temp_dir.path());

        env::remove_var("ISOTEST_COLOR");
        env::remove_var("NO_COLOR");

        assert!(!config.unwrap().runner().color);
    }

    #[test]
    #[serial]
    fn test_global_config_layered_under_project() {
        let temp_dir = TempDir::new().unwrap();
        let global_path = temp_dir.path().join("global.toml");
        fs::write(
            &global_path,
            "[runner]\ndefault_timeout = 99\npoll_interval_us = 500\n",
        )
        .unwrap();

        let project_dir = temp_dir.path().join("project");
        fs::create_dir(&project_dir).unwrap();
        create_config_file(&project_dir, "[runner]\ndefault_timeout = 7\n");

        let mut loader = ConfigLoader::new().with_global_config_path(&global_path);
        let settings = loader.load_from_directory(&project_dir).unwrap().runner();

        assert_eq!(settings.default_timeout, 7);
        assert_eq!(settings.poll_interval_us, 500);
    }

    #[test]
    fn test_default_settings() {
        let config = Config::default();
        assert_eq!(config.runner(), RunnerSettings::default());
        assert!(!config.is_project());
    }
}
