//! Isolated executor
//!
//! Runs one test in a forked child while the parent polls for its end, killing
//! it once its timeout has elapsed.

use crate::context::Context;
use crate::error::{RunnerError, RunnerResult};
use crate::reporter::{Reporter, ResultKind};
use crate::session::Session;
use crate::suite::{Phase, Test};
use isotest_config::settings::{DEFAULT_POLL_INTERVAL_US, DEFAULT_TIMEOUT_SECS};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};
use std::io::{self, Write};
use std::process;
use std::thread;
use std::time::{Duration, Instant};

/// Info line printed before a timed out child is killed
pub const TIMEOUT_NOTICE: &str = "Test timed out. Kill the process.";

/// How a test process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// Exited on its own with this status
    Exited(i32),
    /// Terminated by a signal the executor did not send
    Signaled(Signal),
    /// Killed after running past its timeout
    TimedOut,
    /// Reaped by someone else before its status was read
    Vanished,
}

/// Forks and supervises test processes
#[derive(Debug, Clone)]
pub struct Executor {
    reporter: Reporter,
    default_timeout: Duration,
    poll_interval: Duration,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(
            Reporter::default(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Duration::from_micros(DEFAULT_POLL_INTERVAL_US),
        )
    }
}

impl Executor {
    pub fn new(reporter: Reporter, default_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            reporter,
            default_timeout,
            poll_interval,
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub(crate) fn set_reporter(&mut self, reporter: Reporter) {
        self.reporter = reporter;
    }

    pub(crate) fn set_default_timeout(&mut self, timeout: Duration) {
        self.default_timeout = timeout;
    }

    pub(crate) fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    /// Run `test` in a new process and wait for it, at most for its timeout.
    ///
    /// The caller marks `test` as current in `session` beforehand. Only the
    /// parent returns; the child always ends with `process::exit`.
    pub fn execute(&self, session: &Session<'_>, test: &Test) -> RunnerResult<Execution> {
        // Anything still buffered would be written twice once the child exits
        let _ = io::stdout().flush();

        // SAFETY: the child only runs the test callbacks and then exits,
        // without returning into the caller's stack.
        match unsafe { fork() }.map_err(RunnerError::Fork)? {
            ForkResult::Child => self.run_child(session, test),
            ForkResult::Parent { child } => {
                tracing::debug!(pid = %child, name = test.name.unwrap_or("-"), "forked test process");
                self.supervise(session, test, child)
            }
        }
    }

    fn run_child(&self, session: &Session<'_>, test: &Test) -> ! {
        let ctx = Context::new(session, &self.reporter);

        if let Some(setup) = test.setup {
            ctx.enter(Phase::TestSetup, setup);
        }
        if let Some(run) = test.run {
            ctx.enter(Phase::TestRun, run);
        }
        if let Some(teardown) = test.teardown {
            ctx.enter(Phase::TestTeardown, teardown);
        }

        let _ = io::stdout().flush();
        process::exit(0)
    }

    fn supervise(&self, session: &Session<'_>, test: &Test, child: Pid) -> RunnerResult<Execution> {
        let timeout = test.timeout().unwrap_or(self.default_timeout);
        let start = Instant::now();
        let mut killed = false;
        let mut status = None;

        loop {
            if start.elapsed() >= timeout {
                self.reporter.emit(
                    session,
                    file!(),
                    line!(),
                    ResultKind::Info,
                    &TIMEOUT_NOTICE,
                );
                match kill(child, Signal::SIGKILL) {
                    Ok(()) | Err(Errno::ESRCH) => {}
                    Err(source) => return Err(RunnerError::Kill { pid: child, source }),
                }
                tracing::debug!(pid = %child, ?timeout, "killed test process");
                killed = true;
                break;
            }

            match waitpid(child, Some(WaitPidFlag::WNOHANG)) {
                Ok(done @ (WaitStatus::Exited(..) | WaitStatus::Signaled(..))) => {
                    status = Some(done);
                    break;
                }
                Ok(_) | Err(Errno::EINTR) => {}
                Err(Errno::ECHILD) => break,
                Err(source) => return Err(RunnerError::Wait { pid: child, source }),
            }

            thread::sleep(self.poll_interval);
        }

        if status.is_none() {
            status = reap(child)?;
        }
        tracing::trace!(pid = %child, ?status, elapsed = ?start.elapsed(), "reaped test process");

        let execution = match status {
            _ if killed => Execution::TimedOut,
            Some(WaitStatus::Exited(_, code)) => Execution::Exited(code),
            Some(WaitStatus::Signaled(_, signal, _)) => {
                self.reporter.emit(
                    session,
                    file!(),
                    line!(),
                    ResultKind::Error,
                    &format_args!("Test child killed with signal {}", signal as i32),
                );
                Execution::Signaled(signal)
            }
            _ => Execution::Vanished,
        };
        Ok(execution)
    }
}

/// Blocking wait for `child`; a child that is already gone is not an error
fn reap(child: Pid) -> RunnerResult<Option<WaitStatus>> {
    loop {
        match waitpid(child, None) {
            Ok(status) => return Ok(Some(status)),
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => return Ok(None),
            Err(source) => return Err(RunnerError::Wait { pid: child, source }),
        }
    }
}
