//! Evaluator exceptions
//!
//! The single non-local error channel of the evaluator. Where the reference
//! behavior is a longjmp, here it is a `Result` error that unwinds through
//! `?`; every frame that swaps shared state catches, restores, and
//! re-raises.
//!
//! Exceptions are distinct from the skip latch (`skip.rs`): an exception
//! unwinds regardless of node kind, while a skip is observed and consumed
//! only by designated compound evaluators.

use thiserror::Error;

/// Exit status conventions.
pub const EXIT_NOTFOUND: i32 = 127;
pub const EXIT_NOEXEC: i32 = 126;
/// Generic failure from a builtin that raised a recoverable error.
pub const EXIT_ERROR: i32 = 2;
/// Offset added to a signal number for a signal-terminated child.
pub const EXIT_SIGNAL_BASE: i32 = 128;
pub const SIGINT: i32 = 2;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ShellException {
    /// Recoverable error from utility code; unwinds to the nearest frame
    /// that converts it into an exit status.
    #[error("{0}")]
    Error(String),
    /// Command execution failed with a prescribed status (127 not found,
    /// 126 not executable).
    #[error("{message}")]
    Exec { status: i32, message: String },
    /// Signal-induced interrupt.
    #[error("interrupted")]
    Interrupt,
    /// The shell should terminate with the given status.
    #[error("exit {0}")]
    Exit(i32),
}

impl ShellException {
    pub fn error(msg: impl Into<String>) -> Self {
        ShellException::Error(msg.into())
    }

    pub fn not_found(name: &str) -> Self {
        ShellException::Exec { status: EXIT_NOTFOUND, message: format!("{}: not found", name) }
    }

    pub fn not_executable(name: &str, reason: &str) -> Self {
        ShellException::Exec { status: EXIT_NOEXEC, message: format!("{}: {}", name, reason) }
    }
}

pub type EvalResult<T = ()> = Result<T, ShellException>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_statuses() {
        match ShellException::not_found("frob") {
            ShellException::Exec { status, message } => {
                assert_eq!(status, EXIT_NOTFOUND);
                assert!(message.contains("frob"));
            }
            other => panic!("unexpected {:?}", other),
        }
        match ShellException::not_executable("x", "Permission denied") {
            ShellException::Exec { status, .. } => assert_eq!(status, EXIT_NOEXEC),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ShellException::error("boom").to_string(), "boom");
        assert_eq!(ShellException::Exit(3).to_string(), "exit 3");
    }
}
