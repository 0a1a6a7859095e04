//! Project Configuration (isotest.toml)
//!
//! Handles project-level configuration stored in `isotest.toml` at the project root.

use crate::settings::RunnerSection;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Project configuration from isotest.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Runner configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<RunnerSection>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(runner) = &self.runner {
            runner.validate("runner")?;
        }
        Ok(())
    }

    /// Get the runner table, inserting an empty one if missing
    pub fn runner_mut(&mut self) -> &mut RunnerSection {
        self.runner.get_or_insert_with(RunnerSection::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_project_config() {
        let config: ProjectConfig = toml::from_str("").unwrap();
        assert!(config.runner.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_project_config() {
        let toml = r#"
[runner]
default_timeout = 5
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.runner.as_ref().and_then(|r| r.default_timeout),
            Some(5)
        );
    }

    #[test]
    fn test_unknown_table_rejected() {
        let toml = r#"
[package]
name = "demo"
"#;

        let result: Result<ProjectConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_runner_mut_inserts_table() {
        let mut config = ProjectConfig::default();
        config.runner_mut().color = Some(false);
        assert_eq!(config.runner.unwrap().color, Some(false));
    }
}
