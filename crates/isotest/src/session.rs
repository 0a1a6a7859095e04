//! Shared session state
//!
//! One [`Session`] exists per suite run. Its counters, current test and phase
//! live in an anonymous `MAP_SHARED` mapping, so a forked test process writes
//! into the same block the runner reads back after reaping it. Only one
//! process runs a callback at a time, which keeps the block single-writer;
//! atomics make the cross-process accesses well defined.

use crate::error::{RunnerError, RunnerResult};
use crate::reporter::ResultKind;
use crate::suite::{Phase, Suite, Test};
use nix::sys::mman::{mmap_anonymous, munmap, MapFlags, ProtFlags};
use std::mem;
use std::num::NonZeroUsize;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};

const NO_TEST: usize = usize::MAX;

#[repr(C)]
struct SessionBlock {
    passed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    errors: AtomicU64,
    phase: AtomicU8,
    current: AtomicUsize,
}

impl SessionBlock {
    const fn new() -> Self {
        Self {
            passed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            phase: AtomicU8::new(Phase::Idle as u8),
            current: AtomicUsize::new(NO_TEST),
        }
    }
}

/// Snapshot of the result counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub errors: u64,
}

/// Run-time state of one suite execution, visible to every test process
pub struct Session<'s> {
    block: NonNull<SessionBlock>,
    suite: &'s Suite,
}

impl<'s> Session<'s> {
    /// Map a fresh shared block for `suite`
    pub fn new(suite: &'s Suite) -> RunnerResult<Self> {
        let len = NonZeroUsize::new(mem::size_of::<SessionBlock>())
            .unwrap_or(NonZeroUsize::MIN);

        // SAFETY: a new anonymous mapping aliases no existing memory.
        let addr = unsafe {
            mmap_anonymous(
                None,
                len,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
            )
        }
        .map_err(RunnerError::SharedMemory)?;

        let block = addr.cast::<SessionBlock>();
        // SAFETY: the mapping is page aligned, writable and large enough.
        unsafe { block.as_ptr().write(SessionBlock::new()) };

        tracing::debug!(bytes = len.get(), "mapped shared session");
        Ok(Self { block, suite })
    }

    fn block(&self) -> &SessionBlock {
        // SAFETY: the mapping lives until `self` is dropped.
        unsafe { self.block.as_ref() }
    }

    /// The suite this session runs
    pub fn suite(&self) -> &'s Suite {
        self.suite
    }

    /// Count a reported result; info results are not counted
    pub fn record(&self, kind: ResultKind) {
        let block = self.block();
        let counter = match kind {
            ResultKind::Pass => &block.passed,
            ResultKind::Fail => &block.failed,
            ResultKind::Skip => &block.skipped,
            ResultKind::Error => &block.errors,
            ResultKind::Info => return,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Current counter values
    pub fn counters(&self) -> Counters {
        let block = self.block();
        Counters {
            passed: block.passed.load(Ordering::SeqCst),
            failed: block.failed.load(Ordering::SeqCst),
            skipped: block.skipped.load(Ordering::SeqCst),
            errors: block.errors.load(Ordering::SeqCst),
        }
    }

    pub fn phase(&self) -> Phase {
        Phase::from_raw(self.block().phase.load(Ordering::SeqCst))
    }

    pub fn set_phase(&self, phase: Phase) {
        tracing::trace!(%phase, "phase change");
        self.block().phase.store(phase as u8, Ordering::SeqCst);
    }

    /// Index of the running test in the suite list
    pub fn current_index(&self) -> Option<usize> {
        match self.block().current.load(Ordering::SeqCst) {
            NO_TEST => None,
            index => Some(index),
        }
    }

    /// The running test, if any
    pub fn current_test(&self) -> Option<&'s Test> {
        self.current_index().and_then(|index| self.suite.test(index))
    }

    pub fn set_current(&self, index: Option<usize>) {
        self.block()
            .current
            .store(index.unwrap_or(NO_TEST), Ordering::SeqCst);
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        // SAFETY: `block` came from `mmap_anonymous` with this length and is
        // not referenced past this point.
        let result = unsafe { munmap(self.block.cast(), mem::size_of::<SessionBlock>()) };
        if let Err(e) = result {
            tracing::warn!(error = %e, "munmap() of shared session failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::Test;
    use crate::Context;

    fn noop(_: &Context) {}

    static TESTS: [Test; 2] = [Test::new(noop).named("only"), Test::END];
    static SUITE: Suite = Suite::new(&TESTS);

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new(&SUITE).unwrap();
        assert_eq!(session.counters(), Counters::default());
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.current_test().is_none());
    }

    #[test]
    fn test_record_counts_by_kind() {
        let session = Session::new(&SUITE).unwrap();
        session.record(ResultKind::Pass);
        session.record(ResultKind::Pass);
        session.record(ResultKind::Fail);
        session.record(ResultKind::Skip);
        session.record(ResultKind::Error);
        session.record(ResultKind::Info);

        assert_eq!(
            session.counters(),
            Counters {
                passed: 2,
                failed: 1,
                skipped: 1,
                errors: 1,
            }
        );
    }

    #[test]
    fn test_current_test_tracking() {
        let session = Session::new(&SUITE).unwrap();
        session.set_current(Some(0));
        assert_eq!(session.current_test().and_then(|t| t.name), Some("only"));

        session.set_current(Some(1));
        assert!(session.current_test().is_none());

        session.set_current(None);
        assert_eq!(session.current_index(), None);
    }

    #[test]
    fn test_phase_is_stored() {
        let session = Session::new(&SUITE).unwrap();
        session.set_phase(Phase::TestRun);
        assert_eq!(session.phase(), Phase::TestRun);
    }
}
