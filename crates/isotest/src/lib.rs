//! isotest - unit tests, each in its own process
//!
//! A suite is a static list of [`Test`]s with optional setup and teardown
//! hooks. The [`Runner`] forks one child per test, so a test that crashes,
//! hangs or corrupts its memory cannot take the suite down with it. Results
//! reported from any child land in counters shared with the runner.
//!
//! # Example
//!
//! ```no_run
//! use isotest::{check, check_eq, check_str_eq, Context, Suite, Test};
//!
//! fn arithmetic(ctx: &Context) {
//!     check_eq!(ctx, 6 * 7, 42);
//!     check!(ctx, 1 < 2);
//! }
//!
//! fn strings(ctx: &Context) {
//!     check_str_eq!(ctx, "ciao", "ciao", 4);
//! }
//!
//! fn hangs(ctx: &Context) {
//!     ctx.info("about to loop forever");
//!     loop {
//!         std::thread::park();
//!     }
//! }
//!
//! static TESTS: [Test; 4] = [
//!     Test::new(arithmetic),
//!     Test::new(strings),
//!     Test::new(hangs).with_timeout(1),
//!     Test::END,
//! ];
//! static SUITE: Suite = Suite::new(&TESTS);
//!
//! isotest::main!(SUITE);
//! ```
//!
//! # Exit status
//!
//! | verdict | status |
//! |---|---|
//! | passed | 0 |
//! | failed (any fail or error) | 1 |
//! | skipped (skips, no fails) | 2 |
//! | runner error | -1 |

pub mod check;
pub mod context;
pub mod error;
pub mod executor;
pub mod logging;
pub mod reporter;
pub mod runner;
pub mod selftest;
pub mod session;
pub mod suite;

pub use context::Context;
pub use error::{RunnerError, RunnerResult};
pub use executor::{Execution, Executor};
pub use logging::init_logging;
pub use reporter::{Reporter, ResultKind};
pub use runner::{run_suite, Runner, Summary, Verdict};
pub use session::{Counters, Session};
pub use suite::{Hook, Phase, Suite, Test};

/// Report a formatted event: `report!(ctx, ResultKind::Info, "step {}", n)`
#[macro_export]
macro_rules! report {
    ($ctx:expr, $kind:expr, $($arg:tt)+) => {
        $ctx.report($kind, ::std::format_args!($($arg)+))
    };
}

/// Report a formatted error and end the current process
#[macro_export]
macro_rules! fatal {
    ($ctx:expr, $($arg:tt)+) => {
        $ctx.error(::std::format_args!($($arg)+))
    };
}

/// Pass when the boolean expression holds
#[macro_export]
macro_rules! check {
    ($ctx:expr, $e:expr $(,)?) => {
        $crate::check::expr($ctx, $e, ::std::stringify!($e))
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __check_numeric {
    ($op:ident, $ctx:expr, $a:expr, $b:expr) => {
        $crate::check::numeric(
            $ctx,
            $crate::check::Comparison::$op,
            $a,
            $b,
            ::std::stringify!($a),
            ::std::stringify!($b),
        )
    };
}

/// `a == b` for any two primitive numbers
#[macro_export]
macro_rules! check_eq {
    ($ctx:expr, $a:expr, $b:expr $(,)?) => {
        $crate::__check_numeric!(Eq, $ctx, $a, $b)
    };
}

#[macro_export]
macro_rules! check_ne {
    ($ctx:expr, $a:expr, $b:expr $(,)?) => {
        $crate::__check_numeric!(Ne, $ctx, $a, $b)
    };
}

#[macro_export]
macro_rules! check_gt {
    ($ctx:expr, $a:expr, $b:expr $(,)?) => {
        $crate::__check_numeric!(Gt, $ctx, $a, $b)
    };
}

#[macro_export]
macro_rules! check_ge {
    ($ctx:expr, $a:expr, $b:expr $(,)?) => {
        $crate::__check_numeric!(Ge, $ctx, $a, $b)
    };
}

#[macro_export]
macro_rules! check_lt {
    ($ctx:expr, $a:expr, $b:expr $(,)?) => {
        $crate::__check_numeric!(Lt, $ctx, $a, $b)
    };
}

#[macro_export]
macro_rules! check_le {
    ($ctx:expr, $a:expr, $b:expr $(,)?) => {
        $crate::__check_numeric!(Le, $ctx, $a, $b)
    };
}

/// Pass when the pointer is null
#[macro_export]
macro_rules! check_ptr_null {
    ($ctx:expr, $p:expr $(,)?) => {
        $crate::check::ptr_null($ctx, $p as *const _, ::std::stringify!($p))
    };
}

#[macro_export]
macro_rules! check_ptr_not_null {
    ($ctx:expr, $p:expr $(,)?) => {
        $crate::check::ptr_not_null($ctx, $p as *const _, ::std::stringify!($p))
    };
}

/// Pass when both pointers hold the same address
#[macro_export]
macro_rules! check_ptr_eq {
    ($ctx:expr, $a:expr, $b:expr $(,)?) => {
        $crate::check::ptr_cmp(
            $ctx,
            true,
            $a as *const _,
            $b as *const _,
            ::std::stringify!($a),
            ::std::stringify!($b),
        )
    };
}

#[macro_export]
macro_rules! check_ptr_ne {
    ($ctx:expr, $a:expr, $b:expr $(,)?) => {
        $crate::check::ptr_cmp(
            $ctx,
            false,
            $a as *const _,
            $b as *const _,
            ::std::stringify!($a),
            ::std::stringify!($b),
        )
    };
}

/// Pass when the first `n` bytes of both buffers are equal
#[macro_export]
macro_rules! check_mem_eq {
    ($ctx:expr, $a:expr, $b:expr, $n:expr $(,)?) => {
        $crate::check::mem_cmp(
            $ctx,
            true,
            &$a,
            &$b,
            $n,
            ::std::stringify!($a),
            ::std::stringify!($b),
        )
    };
}

#[macro_export]
macro_rules! check_mem_ne {
    ($ctx:expr, $a:expr, $b:expr, $n:expr $(,)?) => {
        $crate::check::mem_cmp(
            $ctx,
            false,
            &$a,
            &$b,
            $n,
            ::std::stringify!($a),
            ::std::stringify!($b),
        )
    };
}

/// Like [`check_mem_eq!`], rendering both operands as text on failure
#[macro_export]
macro_rules! check_str_eq {
    ($ctx:expr, $a:expr, $b:expr, $n:expr $(,)?) => {
        $crate::check::str_cmp(
            $ctx,
            true,
            &$a,
            &$b,
            $n,
            ::std::stringify!($a),
            ::std::stringify!($b),
        )
    };
}

#[macro_export]
macro_rules! check_str_ne {
    ($ctx:expr, $a:expr, $b:expr, $n:expr $(,)?) => {
        $crate::check::str_cmp(
            $ctx,
            false,
            &$a,
            &$b,
            $n,
            ::std::stringify!($a),
            ::std::stringify!($b),
        )
    };
}

/// Generate `fn main` running `$suite` with configuration and logging
/// installed, exiting with the suite verdict.
#[macro_export]
macro_rules! main {
    ($suite:expr $(,)?) => {
        fn main() {
            $crate::init_logging();
            $crate::run_suite(&$suite)
        }
    };
}
