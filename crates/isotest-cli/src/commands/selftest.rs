//! Selftest command - run the built-in suite behind a fork

use anyhow::{bail, Context as _, Result};
use colored::*;
use isotest::{selftest, Execution, Runner};
use isotest_config::{ConfigLoader, RunnerSettings};
use std::path::PathBuf;

/// Arguments for the selftest command
pub struct SelftestArgs {
    /// Disable colored output
    pub no_color: bool,
    /// Default timeout override, in seconds
    pub timeout: Option<u64>,
    /// Poll interval override, in microseconds
    pub poll_interval_us: Option<u64>,
    /// Directory the configuration is looked up from
    pub dir: PathBuf,
}

impl Default for SelftestArgs {
    fn default() -> Self {
        Self {
            no_color: false,
            timeout: None,
            poll_interval_us: None,
            dir: PathBuf::from("."),
        }
    }
}

/// Configuration values with command line flags applied on top
pub fn resolve_settings(args: &SelftestArgs) -> Result<RunnerSettings> {
    let config = ConfigLoader::new()
        .load_from_directory(&args.dir)
        .context("failed to load configuration")?;
    let mut settings = config.runner();

    if args.no_color {
        settings.color = false;
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            bail!("--timeout must be greater than zero");
        }
        settings.default_timeout = timeout;
    }
    if let Some(interval) = args.poll_interval_us {
        if interval == 0 {
            bail!("--poll-interval-us must be greater than zero");
        }
        settings.poll_interval_us = interval;
    }

    Ok(settings)
}

/// Run the selftest command
pub fn run(args: SelftestArgs) -> Result<()> {
    let settings = resolve_settings(&args)?;
    if !settings.color {
        colored::control::set_override(false);
    }
    tracing::debug!(?settings, "running self-test suite");

    let runner = Runner::from_settings(&settings);
    let execution = selftest::run_isolated(&runner)?;

    match execution {
        Execution::Exited(code) => {
            println!(
                "\n{} suite process exited with status {}",
                "Self-test complete:".green().bold(),
                code
            );
            Ok(())
        }
        Execution::Signaled(signal) => bail!("self-test process killed by {}", signal),
        Execution::TimedOut | Execution::Vanished => {
            bail!("self-test process ended without an exit status")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args_in(dir: &TempDir) -> SelftestArgs {
        SelftestArgs {
            dir: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_flags_override_project_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("isotest.toml"),
            "[runner]\ndefault_timeout = 30\npoll_interval_us = 500\n",
        )
        .unwrap();

        let mut args = args_in(&dir);
        args.no_color = true;
        args.timeout = Some(4);

        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.default_timeout, 4);
        assert_eq!(settings.poll_interval_us, 500);
        assert!(!settings.color);
    }

    #[test]
    fn test_zero_timeout_flag_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut args = args_in(&dir);
        args.timeout = Some(0);

        assert!(resolve_settings(&args).is_err());
    }
}
