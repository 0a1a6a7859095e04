//! Suite orchestrator
//!
//! Owns the suite-level hooks, feeds every test to the [`Executor`] in order,
//! and turns the final counters into a [`Verdict`].

use crate::context::Context;
use crate::error::{RunnerError, RunnerResult};
use crate::executor::Executor;
use crate::reporter::{Reporter, ResultKind};
use crate::session::{Counters, Session};
use crate::suite::{Phase, Suite};
use isotest_config::{ConfigLoader, RunnerSettings};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use std::env;
use std::fmt;
use std::io::{self, Write};
use std::process;
use std::time::Duration;

/// Aggregate outcome of a suite run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
    Skipped,
    /// The runner itself could not complete
    Error,
}

impl Verdict {
    /// Verdict of a finished run. Errors and failures outrank skips.
    pub fn from_counters(counters: &Counters) -> Self {
        if counters.errors > 0 || counters.failed > 0 {
            Verdict::Failed
        } else if counters.skipped > 0 {
            Verdict::Skipped
        } else {
            Verdict::Passed
        }
    }

    /// Process exit status carrying this verdict
    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Passed => 0,
            Verdict::Failed => 1,
            Verdict::Skipped => 2,
            Verdict::Error => -1,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Verdict::Passed => "PASSED",
            Verdict::Failed => "FAILED",
            Verdict::Skipped => "SKIPPED",
            Verdict::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Counters and verdict of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Counters after the suite teardown
    pub counters: Counters,
    /// Decided before the suite teardown ran
    pub verdict: Verdict,
}

/// Runs suites, one forked process per test
#[derive(Debug, Clone, Default)]
pub struct Runner {
    executor: Executor,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner configured from resolved settings
    pub fn from_settings(settings: &RunnerSettings) -> Self {
        Self::new()
            .with_color(settings.color)
            .with_default_timeout(Duration::from_secs(settings.default_timeout))
            .with_poll_interval(Duration::from_micros(settings.poll_interval_us))
    }

    /// Runner configured from `isotest.toml`, the global config and the
    /// environment, as seen from the working directory
    pub fn from_environment() -> Self {
        Self::from_settings(&load_settings())
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.executor.set_reporter(Reporter::new(color));
        self
    }

    /// Timeout for tests that do not declare one
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.executor.set_default_timeout(timeout);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.executor.set_poll_interval(interval);
        self
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Run every test of `suite` and print the summary.
    ///
    /// An `error` reported from a suite hook ends the calling process, as
    /// suite hooks run un-isolated.
    pub fn run(&self, suite: &Suite) -> RunnerResult<Summary> {
        let session = Session::new(suite)?;
        let reporter = self.executor.reporter();
        let ctx = Context::new(&session, reporter);

        if let Some(setup) = suite.setup {
            ctx.enter(Phase::SuiteSetup, setup);
            session.set_phase(Phase::Idle);
        }

        for (index, test) in suite.iter().enumerate() {
            session.set_current(Some(index));
            let execution = self.executor.execute(&session, test)?;
            tracing::debug!(index, ?execution, "test finished");
            session.set_phase(Phase::Idle);
        }
        session.set_current(None);
        reap_remaining()?;

        let verdict = Verdict::from_counters(&session.counters());

        if let Some(teardown) = suite.teardown {
            ctx.enter(Phase::SuiteTeardown, teardown);
            session.set_phase(Phase::Idle);
        }

        let counters = session.counters();
        println!("{}", reporter.format_summary(&counters));
        let _ = io::stdout().flush();

        tracing::debug!(%verdict, "suite finished");
        Ok(Summary { counters, verdict })
    }

    /// Run `suite` and exit with its verdict
    pub fn run_and_exit(&self, suite: &Suite) -> ! {
        let verdict = match self.run(suite) {
            Ok(summary) => summary.verdict,
            Err(e) => {
                self.report_failure(&e);
                Verdict::Error
            }
        };
        process::exit(verdict.exit_code())
    }

    fn report_failure(&self, error: &RunnerError) {
        tracing::warn!(%error, "runner failed");
        self.executor
            .reporter()
            .print_event(file!(), line!(), ResultKind::Error, error);
    }
}

/// Run `suite` with settings from the environment and exit with its verdict:
/// 0 passed, 1 failed, 2 skipped, -1 when the runner itself failed.
pub fn run_suite(suite: &Suite) -> ! {
    Runner::from_environment().run_and_exit(suite)
}

/// Settings for the working directory; a broken configuration falls back to
/// the defaults rather than blocking the run.
pub fn load_settings() -> RunnerSettings {
    let dir = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(error = %e, "cannot read working directory, using default settings");
            return RunnerSettings::default();
        }
    };

    match ConfigLoader::new().load_from_directory(&dir) {
        Ok(config) => config.runner(),
        Err(e) => {
            tracing::warn!(error = %e, "invalid configuration, using default settings");
            RunnerSettings::default()
        }
    }
}

/// Collect children that already ended without blocking on live ones
///
/// The wait is not limited to test processes. A child the suite setup spawned
/// itself (a helper server started with `std::process::Command`, say) is
/// reaped here as well if it has already exited, and a later
/// `Child::wait()` on it in the suite teardown fails with `ECHILD`. Children
/// still running are left alone.
fn reap_remaining() -> RunnerResult<()> {
    let any = Pid::from_raw(-1);
    loop {
        match waitpid(any, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => return Ok(()),
            Ok(status) => tracing::trace!(?status, "reaped leftover child"),
            Err(Errno::EINTR) => {}
            Err(source) => return Err(RunnerError::Wait { pid: any, source }),
        }
    }
}
