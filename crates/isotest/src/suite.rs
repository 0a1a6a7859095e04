//! Test and suite declarations
//!
//! Everything here is `const`-constructible so a suite can live in a `static`:
//!
//! ```
//! use isotest::{Context, Suite, Test};
//!
//! fn addition(ctx: &Context) {
//!     isotest::check_eq!(ctx, 2 + 2, 4);
//! }
//!
//! fn slow(ctx: &Context) {
//!     ctx.info("still going");
//! }
//!
//! static TESTS: [Test; 3] = [
//!     Test::new(addition).named("addition"),
//!     Test::new(slow).with_timeout(5),
//!     Test::END,
//! ];
//! static SUITE: Suite = Suite::new(&TESTS);
//!
//! assert_eq!(SUITE.iter().count(), 2);
//! ```

use crate::context::Context;
use std::fmt;
use std::time::Duration;

/// Callback slot for setup, run and teardown phases
pub type Hook = fn(&Context<'_>);

/// A single test: optional setup, run and teardown plus a timeout
#[derive(Clone, Copy)]
pub struct Test {
    /// Display name, used in diagnostics only
    pub name: Option<&'static str>,
    /// Runs before `run`
    pub setup: Option<Hook>,
    /// The test body; `None` marks the end of a suite's list
    pub run: Option<Hook>,
    /// Runs after `run`, and on `error` raised from setup or run
    pub teardown: Option<Hook>,
    /// Timeout in seconds, 0 means the runner default
    pub timeout: u32,
}

impl Test {
    /// Sentinel entry; iteration over a suite stops here
    pub const END: Test = Test {
        name: None,
        setup: None,
        run: None,
        teardown: None,
        timeout: 0,
    };

    /// Create a test with only a run callback
    pub const fn new(run: Hook) -> Self {
        Self {
            run: Some(run),
            ..Self::END
        }
    }

    /// Set the display name
    pub const fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Set the setup callback
    pub const fn with_setup(mut self, setup: Hook) -> Self {
        self.setup = Some(setup);
        self
    }

    /// Set the teardown callback
    pub const fn with_teardown(mut self, teardown: Hook) -> Self {
        self.teardown = Some(teardown);
        self
    }

    /// Set the timeout in seconds
    pub const fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout = seconds;
        self
    }

    /// Declared timeout, `None` when the runner default applies
    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout {
            0 => None,
            secs => Some(Duration::from_secs(u64::from(secs))),
        }
    }

    /// Whether this entry terminates the test list
    pub fn is_end(&self) -> bool {
        self.run.is_none()
    }
}

impl fmt::Debug for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Test")
            .field("name", &self.name)
            .field("setup", &self.setup.is_some())
            .field("run", &self.run.is_some())
            .field("teardown", &self.teardown.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A testing suite: suite-level hooks around an ordered list of tests
#[derive(Clone, Copy)]
pub struct Suite {
    /// Runs once in the runner process before any test
    pub setup: Option<Hook>,
    /// Runs once in the runner process after every test
    pub teardown: Option<Hook>,
    /// Tests, in execution order
    pub tests: &'static [Test],
}

impl Suite {
    /// Create a suite without suite-level hooks
    pub const fn new(tests: &'static [Test]) -> Self {
        Self {
            setup: None,
            teardown: None,
            tests,
        }
    }

    /// Set the suite setup callback
    pub const fn with_setup(mut self, setup: Hook) -> Self {
        self.setup = Some(setup);
        self
    }

    /// Set the suite teardown callback
    pub const fn with_teardown(mut self, teardown: Hook) -> Self {
        self.teardown = Some(teardown);
        self
    }

    /// Tests up to, not including, the first entry without a run callback
    pub fn iter(&self) -> impl Iterator<Item = &Test> + '_ {
        self.tests.iter().take_while(|test| !test.is_end())
    }

    /// Look up a test by its position in the list
    pub fn test(&self, index: usize) -> Option<&Test> {
        self.iter().nth(index)
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("setup", &self.setup.is_some())
            .field("teardown", &self.teardown.is_some())
            .field("tests", &self.iter().count())
            .finish()
    }
}

/// Lifecycle stage currently executing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    /// No callback is running
    Idle = 0,
    SuiteSetup,
    SuiteTeardown,
    TestSetup,
    TestRun,
    TestTeardown,
}

impl Phase {
    pub(crate) fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Phase::SuiteSetup,
            2 => Phase::SuiteTeardown,
            3 => Phase::TestSetup,
            4 => Phase::TestRun,
            5 => Phase::TestTeardown,
            _ => Phase::Idle,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::SuiteSetup => "suite setup",
            Phase::SuiteTeardown => "suite teardown",
            Phase::TestSetup => "test setup",
            Phase::TestRun => "test run",
            Phase::TestTeardown => "test teardown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &Context) {}

    static TESTS: [Test; 4] = [
        Test::new(noop).named("first"),
        Test::new(noop).with_timeout(3),
        Test::END,
        Test::new(noop).named("unreachable"),
    ];

    #[test]
    fn test_iteration_stops_at_sentinel() {
        let suite = Suite::new(&TESTS);
        let names: Vec<_> = suite.iter().map(|t| t.name).collect();
        assert_eq!(names, vec![Some("first"), None]);
    }

    #[test]
    fn test_iteration_without_sentinel_uses_whole_slice() {
        let suite = Suite::new(&TESTS[..2]);
        assert_eq!(suite.iter().count(), 2);
    }

    #[test]
    fn test_lookup_by_index() {
        let suite = Suite::new(&TESTS);
        assert_eq!(suite.test(0).and_then(|t| t.name), Some("first"));
        assert!(suite.test(2).is_none());
        assert!(suite.test(3).is_none());
    }

    #[test]
    fn test_timeout_zero_means_default() {
        assert_eq!(Test::new(noop).timeout(), None);
        assert_eq!(TESTS[1].timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_builder_sets_hooks() {
        let test = Test::new(noop).with_setup(noop).with_teardown(noop);
        assert!(test.setup.is_some());
        assert!(test.teardown.is_some());
        assert!(!test.is_end());
        assert!(Test::END.is_end());
    }

    #[test]
    fn test_phase_round_trips_through_raw() {
        for phase in [
            Phase::Idle,
            Phase::SuiteSetup,
            Phase::SuiteTeardown,
            Phase::TestSetup,
            Phase::TestRun,
            Phase::TestTeardown,
        ] {
            assert_eq!(Phase::from_raw(phase as u8), phase);
        }
    }
}
