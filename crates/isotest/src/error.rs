//! Runner errors
//!
//! Only infrastructure failures live here. Test outcomes (fail, skip, error)
//! are reported through the session counters, never as Rust errors.

use nix::unistd::Pid;
use thiserror::Error;

/// Failures of the process machinery around the tests
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("mmap() error: {0}")]
    SharedMemory(#[source] nix::Error),

    #[error("fork() error: {0}")]
    Fork(#[source] nix::Error),

    #[error("waitpid({pid}) error: {source}")]
    Wait {
        pid: Pid,
        #[source]
        source: nix::Error,
    },

    #[error("kill({pid}) error: {source}")]
    Kill {
        pid: Pid,
        #[source]
        source: nix::Error,
    },
}

/// Result type for runner operations
pub type RunnerResult<T> = Result<T, RunnerError>;
