//! Job bookkeeping
//!
//! Child "processes" are cloned interpreter states; this module holds the
//! virtual pid allocator, the job records the evaluator creates before
//! forking, and the helper that runs a child to completion and converts
//! its terminal exception into an exit status.

use crate::interpreter::errors::{EvalResult, ShellException, EXIT_ERROR, EXIT_SIGNAL_BASE, SIGINT};
use crate::interpreter::types::ShellState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkMode {
    Fg,
    Bg,
    /// Capture child (command substitution); not entered in the job list.
    NoJob,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub pid: u32,
    pub status: i32,
    pub nprocs: usize,
}

#[derive(Debug, Clone)]
pub struct JobSet {
    next_pid: u32,
    pub last_background_pid: u32,
}

impl Default for JobSet {
    fn default() -> Self {
        // Virtual pids live well away from the shell's own.
        Self { next_pid: 1000, last_background_pid: 0 }
    }
}

impl JobSet {
    /// Allocate a job record for `nprocs` children.
    pub fn make_job(&mut self, nprocs: usize) -> Job {
        let pid = self.next_pid;
        self.next_pid += nprocs.max(1) as u32;
        Job { pid, status: 0, nprocs }
    }

    pub fn record_background(&mut self, job: &Job) {
        self.last_background_pid = job.pid;
    }
}

/// Block until the job is done and return its status. Children run
/// eagerly in the sandbox, so this simply reads the recorded status.
pub fn wait_for_job(job: &Job) -> i32 {
    job.status
}

/// Run a child state to completion. The closure is the child's whole
/// life; its terminal exception becomes the exit status, diagnostics
/// landing on the child's stderr the way a dying process would print
/// them.
pub fn run_child<F>(child: &mut ShellState, f: F) -> i32
where
    F: FnOnce(&mut ShellState) -> EvalResult,
{
    match f(child) {
        Ok(()) => child.exit_status,
        Err(ShellException::Exit(status)) => status,
        Err(ShellException::Interrupt) => EXIT_SIGNAL_BASE + SIGINT,
        Err(ShellException::Error(msg)) => {
            let diag = format!("{}: {}\n", child.command_name, msg);
            child.io.stderr.push_str(&diag);
            EXIT_ERROR
        }
        Err(ShellException::Exec { status, message }) => {
            let diag = format!("{}: {}\n", child.command_name, message);
            child.io.stderr.push_str(&diag);
            status
        }
    }
}
