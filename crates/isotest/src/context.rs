//! Reporting handle passed to every setup, run and teardown callback

use crate::reporter::{Reporter, ResultKind};
use crate::session::Session;
use crate::suite::{Hook, Phase};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe, Location};
use std::process;
use std::sync::Once;

thread_local! {
    static PANIC_LOCATION: RefCell<Option<(String, u32)>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Remember where the last panic happened, then defer to the previous hook
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if let Some(location) = info.location() {
                let location = (location.file().to_string(), location.line());
                PANIC_LOCATION.with(|slot| *slot.borrow_mut() = Some(location));
            }
            previous(info);
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// The only sanctioned way for test code to influence the session counters.
///
/// Every reporting method is `#[track_caller]`: the printed location is the
/// line in the test that reported, not a line inside the framework.
pub struct Context<'a> {
    session: &'a Session<'a>,
    reporter: &'a Reporter,
    last: Cell<Option<ResultKind>>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(session: &'a Session<'a>, reporter: &'a Reporter) -> Self {
        install_panic_hook();
        Self {
            session,
            reporter,
            last: Cell::new(None),
        }
    }

    /// Shared state of the running suite
    pub fn session(&self) -> &Session<'a> {
        self.session
    }

    /// Last non-info result reported from this process
    pub fn last_result(&self) -> Option<ResultKind> {
        self.last.get()
    }

    /// Report an event. `ResultKind::Error` behaves exactly like [`Context::error`].
    #[track_caller]
    pub fn report(&self, kind: ResultKind, message: impl fmt::Display) {
        if kind == ResultKind::Error {
            self.error(message);
        }
        let location = Location::caller();
        self.report_at(location.file(), location.line(), kind, &message);
    }

    #[track_caller]
    pub fn info(&self, message: impl fmt::Display) {
        self.report(ResultKind::Info, message);
    }

    #[track_caller]
    pub fn pass(&self, message: impl fmt::Display) {
        self.report(ResultKind::Pass, message);
    }

    #[track_caller]
    pub fn fail(&self, message: impl fmt::Display) {
        self.report(ResultKind::Fail, message);
    }

    #[track_caller]
    pub fn skip(&self, message: impl fmt::Display) {
        self.report(ResultKind::Skip, message);
    }

    /// Report an error, run the teardown the current phase still owes, and
    /// end this process with the error status.
    ///
    /// Inside a test this ends only the test's own process. From a suite hook
    /// it ends the runner.
    #[track_caller]
    pub fn error(&self, message: impl fmt::Display) -> ! {
        let location = Location::caller();
        self.abort_at(location.file(), location.line(), &message)
    }

    fn report_at(&self, file: &str, line: u32, kind: ResultKind, message: &dyn fmt::Display) {
        if kind != ResultKind::Info {
            self.last.set(Some(kind));
        }
        self.reporter.emit(self.session, file, line, kind, message);
    }

    fn abort_at(&self, file: &str, line: u32, message: &dyn fmt::Display) -> ! {
        self.report_at(file, line, ResultKind::Error, message);
        self.unwind();
        tracing::debug!(pid = process::id(), "exiting after error");
        process::exit(ResultKind::Error.code())
    }

    /// Run the teardown matching the phase that raised the error.
    ///
    /// The phase moves to the teardown first, so an error raised by that
    /// teardown finds nothing left to unwind.
    fn unwind(&self) {
        match self.session.phase() {
            Phase::SuiteSetup => {
                if let Some(teardown) = self.session.suite().teardown {
                    self.enter(Phase::SuiteTeardown, teardown);
                }
            }
            Phase::TestSetup | Phase::TestRun => {
                let teardown = self.session.current_test().and_then(|test| test.teardown);
                if let Some(teardown) = teardown {
                    self.enter(Phase::TestTeardown, teardown);
                }
            }
            Phase::SuiteTeardown | Phase::TestTeardown | Phase::Idle => {}
        }
    }

    /// Set the phase and run `hook` under it. A panic is turned into an error.
    pub(crate) fn enter(&self, phase: Phase, hook: Hook) {
        self.session.set_phase(phase);
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| hook(self))) {
            let (file, line) = PANIC_LOCATION
                .with(|slot| slot.borrow_mut().take())
                .unwrap_or_else(|| (file!().to_string(), line!()));
            let message = format!("panicked: {}", panic_message(payload.as_ref()));
            self.abort_at(&file, line, &message);
        }
    }
}
