//! Built-in self-test suite
//!
//! Exercises every reporting path and assertion against the framework itself.
//! Each check is followed by a second check on [`Context::last_result`], so a
//! misreported result shows up as an extra failure.

use crate::context::Context;
use crate::error::{RunnerError, RunnerResult};
use crate::executor::Execution;
use crate::reporter::ResultKind;
use crate::runner::Runner;
use crate::suite::{Suite, Test};
use crate::{
    check, check_eq, check_ge, check_gt, check_le, check_lt, check_mem_eq, check_mem_ne,
    check_ne, check_ptr_eq, check_ptr_ne, check_ptr_not_null, check_ptr_null, check_str_eq,
    check_str_ne,
};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult};
use std::io::{self, Write};

#[track_caller]
fn expect_last(ctx: &Context, kind: ResultKind) {
    let last = ctx.last_result();
    check!(ctx, last == Some(kind));
}

fn setup_suite(ctx: &Context) {
    ctx.info("Setup suite");
}

fn teardown_suite(ctx: &Context) {
    ctx.info("Teardown suite");
}

fn setup_test(ctx: &Context) {
    ctx.info("Setup test");
}

fn teardown_test(ctx: &Context) {
    ctx.info("Teardown test");
}

fn setup_error(ctx: &Context) {
    ctx.error("Setup error");
}

fn teardown_error(ctx: &Context) {
    ctx.error("Teardown error");
}

fn test_pass(ctx: &Context) {
    ctx.pass("Test passed");
    expect_last(ctx, ResultKind::Pass);
}

fn test_fail(ctx: &Context) {
    ctx.fail("Test fail");
    expect_last(ctx, ResultKind::Fail);
}

fn test_skip(ctx: &Context) {
    ctx.skip("Test skip");
    expect_last(ctx, ResultKind::Skip);
}

fn test_error(ctx: &Context) {
    ctx.error("Test error");
}

fn test_check_expr(ctx: &Context) {
    check!(ctx, 10 < 12);
    expect_last(ctx, ResultKind::Pass);

    check!(ctx, 10 > 12);
    expect_last(ctx, ResultKind::Fail);
}

fn test_check_eq(ctx: &Context) {
    let (a, b, c) = (10, 10, 20);

    check_eq!(ctx, a, b);
    expect_last(ctx, ResultKind::Pass);

    check_eq!(ctx, a, c);
    expect_last(ctx, ResultKind::Fail);
}

fn test_check_ne(ctx: &Context) {
    let (a, b, c) = (10, 10, 20);

    check_ne!(ctx, a, c);
    expect_last(ctx, ResultKind::Pass);

    check_ne!(ctx, a, b);
    expect_last(ctx, ResultKind::Fail);
}

fn test_check_gt(ctx: &Context) {
    let (a, b, c) = (10, 0, 20);

    check_gt!(ctx, a, b);
    expect_last(ctx, ResultKind::Pass);

    check_gt!(ctx, a, c);
    expect_last(ctx, ResultKind::Fail);
}

fn test_check_ge(ctx: &Context) {
    let (a, b, c) = (10, 10, 20);

    check_ge!(ctx, a, b);
    expect_last(ctx, ResultKind::Pass);

    check_ge!(ctx, a, c);
    expect_last(ctx, ResultKind::Fail);
}

fn test_check_lt(ctx: &Context) {
    let (a, b, c) = (10, 20, 0);

    check_lt!(ctx, a, b);
    expect_last(ctx, ResultKind::Pass);

    check_lt!(ctx, a, c);
    expect_last(ctx, ResultKind::Fail);
}

fn test_check_le(ctx: &Context) {
    let (a, b, c) = (10, 10, 0);

    check_le!(ctx, a, b);
    expect_last(ctx, ResultKind::Pass);

    check_le!(ctx, a, c);
    expect_last(ctx, ResultKind::Fail);
}

fn test_check_ptr_null(ctx: &Context) {
    let values = [1];

    check_ptr_null!(ctx, std::ptr::null::<i32>());
    expect_last(ctx, ResultKind::Pass);

    check_ptr_null!(ctx, values.as_ptr());
    expect_last(ctx, ResultKind::Fail);
}

fn test_check_ptr_not_null(ctx: &Context) {
    let values = [1];

    check_ptr_not_null!(ctx, values.as_ptr());
    expect_last(ctx, ResultKind::Pass);

    check_ptr_not_null!(ctx, std::ptr::null::<i32>());
    expect_last(ctx, ResultKind::Fail);
}

fn test_check_mem_eq(ctx: &Context) {
    let (s1, s2, s3) = (b"ciao", b"ciao", b"cia0");

    check_mem_eq!(ctx, s1, s2, 4);
    expect_last(ctx, ResultKind::Pass);

    check_mem_eq!(ctx, s1, s3, 4);
    expect_last(ctx, ResultKind::Fail);
}

fn test_check_mem_ne(ctx: &Context) {
    let (s1, s2, s3) = (b"ciao", b"cia0", b"ciao");

    check_mem_ne!(ctx, s1, s2, 4);
    expect_last(ctx, ResultKind::Pass);

    check_mem_ne!(ctx, s1, s3, 4);
    expect_last(ctx, ResultKind::Fail);
}

fn test_check_str_eq(ctx: &Context) {
    let (s1, s2, s3) = ("ciao", "ciao", "cia0");

    check_str_eq!(ctx, s1, s2, 4);
    expect_last(ctx, ResultKind::Pass);

    check_str_eq!(ctx, s1, s3, 4);
    expect_last(ctx, ResultKind::Fail);
}

fn test_check_str_ne(ctx: &Context) {
    let (s1, s2, s3) = ("ciao", "cia0", "ciao");

    check_str_ne!(ctx, s1, s2, 4);
    expect_last(ctx, ResultKind::Pass);

    check_str_ne!(ctx, s1, s3, 4);
    expect_last(ctx, ResultKind::Fail);
}

fn test_check_ptr_eq(ctx: &Context) {
    let s1 = "ciao";
    let s2 = s1;

    check_ptr_eq!(ctx, s1.as_ptr(), s2.as_ptr());
    expect_last(ctx, ResultKind::Pass);
}

fn test_check_ptr_ne(ctx: &Context) {
    let s1 = String::from("ciao");
    let s2 = String::from("ciao1");

    check_ptr_ne!(ctx, s1.as_ptr(), s2.as_ptr());
    expect_last(ctx, ResultKind::Pass);
}

fn test_operands_evaluated_once(ctx: &Context) {
    let a = 10;
    let mut evaluations = 0;

    check_eq!(ctx, a, {
        evaluations += 1;
        11
    });
    expect_last(ctx, ResultKind::Fail);
    check_eq!(ctx, evaluations, 1);
}

fn test_timeout(ctx: &Context) {
    ctx.info("Waiting for timeout..");
    std::thread::sleep(std::time::Duration::from_secs(3));
}

static TESTS: [Test; 25] = [
    Test::new(test_pass)
        .with_setup(setup_test)
        .with_teardown(teardown_test),
    Test::new(test_pass)
        .with_setup(setup_error)
        .with_teardown(teardown_test),
    Test::new(test_error)
        .with_setup(setup_test)
        .with_teardown(teardown_test),
    Test::new(test_pass)
        .with_setup(setup_test)
        .with_teardown(teardown_error),
    Test::new(test_pass),
    Test::new(test_fail),
    Test::new(test_skip),
    Test::new(test_check_expr).named("check"),
    Test::new(test_check_eq).named("check_eq"),
    Test::new(test_check_ne).named("check_ne"),
    Test::new(test_check_gt).named("check_gt"),
    Test::new(test_check_ge).named("check_ge"),
    Test::new(test_check_lt).named("check_lt"),
    Test::new(test_check_le).named("check_le"),
    Test::new(test_check_ptr_null).named("check_ptr_null"),
    Test::new(test_check_ptr_not_null).named("check_ptr_not_null"),
    Test::new(test_check_mem_eq).named("check_mem_eq"),
    Test::new(test_check_mem_ne).named("check_mem_ne"),
    Test::new(test_check_str_eq).named("check_str_eq"),
    Test::new(test_check_str_ne).named("check_str_ne"),
    Test::new(test_check_ptr_eq).named("check_ptr_eq"),
    Test::new(test_check_ptr_ne).named("check_ptr_ne"),
    Test::new(test_timeout).named("timeout").with_timeout(1),
    Test::new(test_operands_evaluated_once),
    Test::END,
];

/// The self-test suite
pub static SUITE: Suite = Suite::new(&TESTS)
    .with_setup(setup_suite)
    .with_teardown(teardown_suite);

/// Run [`SUITE`] with `runner` in a forked child and report how it ended.
///
/// The suite deliberately fails and errors; the self-test is healthy when the
/// child exits on its own.
pub fn run_isolated(runner: &Runner) -> RunnerResult<Execution> {
    let _ = io::stdout().flush();

    // SAFETY: the child runs the suite and exits without returning.
    match unsafe { fork() }.map_err(RunnerError::Fork)? {
        ForkResult::Child => runner.run_and_exit(&SUITE),
        ForkResult::Parent { child } => loop {
            match waitpid(child, None) {
                Ok(WaitStatus::Exited(_, code)) => return Ok(Execution::Exited(code)),
                Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(Execution::Signaled(signal)),
                Ok(_) | Err(Errno::EINTR) => {}
                Err(Errno::ECHILD) => return Ok(Execution::Vanished),
                Err(source) => return Err(RunnerError::Wait { pid: child, source }),
            }
        },
    }
}
