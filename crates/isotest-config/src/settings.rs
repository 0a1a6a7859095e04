//! Runner settings
//!
//! The `[runner]` table shared by project and global configuration files, and
//! the fully-resolved settings handed to the runner.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Default per-test timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Default child poll interval in microseconds
pub const DEFAULT_POLL_INTERVAL_US: u64 = 100;

/// `[runner]` table as written in a configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunnerSection {
    /// Timeout in seconds for tests that don't declare their own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_timeout: Option<u64>,

    /// How often the parent checks on a running test, in microseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_us: Option<u64>,

    /// Colorize result labels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

impl RunnerSection {
    /// Validate the values that are present
    pub fn validate(&self, table: &str) -> ConfigResult<()> {
        if self.default_timeout == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.default_timeout", table),
                reason: "timeout must be greater than zero".to_string(),
            });
        }

        if self.poll_interval_us == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.poll_interval_us", table),
                reason: "poll interval must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Merge another section into this one
    /// Other section takes precedence for non-None values
    pub fn merge(&mut self, other: &RunnerSection) {
        if other.default_timeout.is_some() {
            self.default_timeout = other.default_timeout;
        }
        if other.poll_interval_us.is_some() {
            self.poll_interval_us = other.poll_interval_us;
        }
        if other.color.is_some() {
            self.color = other.color;
        }
    }
}

/// Effective runner settings after merging every source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunnerSettings {
    /// Timeout in seconds for tests without their own
    pub default_timeout: u64,
    /// Child poll interval in microseconds
    pub poll_interval_us: u64,
    /// Colorize result labels
    pub color: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT_SECS,
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
            color: true,
        }
    }
}

impl From<&RunnerSection> for RunnerSettings {
    fn from(section: &RunnerSection) -> Self {
        let defaults = Self::default();
        Self {
            default_timeout: section.default_timeout.unwrap_or(defaults.default_timeout),
            poll_interval_us: section
                .poll_interval_us
                .unwrap_or(defaults.poll_interval_us),
            color: section.color.unwrap_or(defaults.color),
        }
    }
}
