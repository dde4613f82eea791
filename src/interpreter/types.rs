//! Interpreter Types
//!
//! The shell's process-wide mutable state and the small value types that
//! travel the evaluator: option flags, evaluation flags, and execution
//! limits. Everything here is `Clone` because forking a child is cloning
//! the state.

use crate::interpreter::command_resolution::CommandHash;
use crate::interpreter::functions::FuncTable;
use crate::interpreter::jobs::JobSet;
use crate::interpreter::redirections::ShellIo;
use crate::interpreter::skip::SkipState;
use crate::interpreter::trap::TrapTable;
use crate::interpreter::variables::{LocalFrame, ShellParam, VarTable};

/// Single-letter shell options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShellOptions {
    /// -e: exit on a failing untested command
    pub errexit: bool,
    /// -x: trace commands with a PS4 prefix
    pub xtrace: bool,
    /// -n: read commands but do not execute them
    pub noexec: bool,
    /// -v: echo input lines as they are read
    pub verbose: bool,
    /// -u: expansion of an unset variable is an error
    pub nounset: bool,
    /// -f: disable pathname expansion
    pub noglob: bool,
    /// -C: do not truncate existing files with `>`
    pub noclobber: bool,
    /// -i: interactive shell
    pub interactive: bool,
    /// -m: job control
    pub monitor: bool,
}

impl ShellOptions {
    /// The string `$-` expands to.
    pub fn flag_string(&self) -> String {
        let mut out = String::new();
        for (on, c) in [
            (self.errexit, 'e'),
            (self.noglob, 'f'),
            (self.interactive, 'i'),
            (self.monitor, 'm'),
            (self.noexec, 'n'),
            (self.nounset, 'u'),
            (self.verbose, 'v'),
            (self.xtrace, 'x'),
            (self.noclobber, 'C'),
        ] {
            if on {
                out.push(c);
            }
        }
        out
    }

    /// Apply one option letter; returns false for an unknown letter.
    pub fn apply(&mut self, letter: char, on: bool) -> bool {
        match letter {
            'e' => self.errexit = on,
            'f' => self.noglob = on,
            'i' => self.interactive = on,
            'm' => self.monitor = on,
            'n' => self.noexec = on,
            'u' => self.nounset = on,
            'v' => self.verbose = on,
            'x' => self.xtrace = on,
            'C' => self.noclobber = on,
            _ => return false,
        }
        true
    }

    /// `set -o` / `set +o` long names.
    pub fn apply_long(&mut self, name: &str, on: bool) -> bool {
        let letter = match name {
            "errexit" => 'e',
            "noglob" => 'f',
            "monitor" => 'm',
            "noexec" => 'n',
            "nounset" => 'u',
            "verbose" => 'v',
            "xtrace" => 'x',
            "noclobber" => 'C',
            _ => return false,
        };
        self.apply(letter, on)
    }
}

/// Flags threaded down the evaluation tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalFlags {
    /// This evaluation is the last thing the process will do; the final
    /// fork can be elided and the tree ends by raising the exit exception.
    pub exit: bool,
    /// The result feeds a conditional, so `-e` must not trigger.
    pub tested: bool,
}

impl EvalFlags {
    pub const NONE: EvalFlags = EvalFlags { exit: false, tested: false };
    pub const TESTED: EvalFlags = EvalFlags { exit: false, tested: true };

    pub fn without_exit(self) -> Self {
        Self { exit: false, ..self }
    }

    pub fn with_exit(self) -> Self {
        Self { exit: true, ..self }
    }

    /// Strip everything but the tested bit (loop bodies, case bodies).
    pub fn tested_only(self) -> Self {
        Self { exit: false, tested: self.tested }
    }
}

/// Backstops that keep a sandboxed script from running away.
#[derive(Debug, Clone)]
pub struct ExecutionLimits {
    /// Function nesting cap; exceeding it is a fatal error.
    pub max_func_nest: u32,
    pub max_commands: u64,
    pub max_loop_iterations: u64,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self { max_func_nest: 1000, max_commands: 500_000, max_loop_iterations: 1_000_000 }
    }
}

/// Result of one top-level run: the captured streams plus the final
/// status.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// The process-wide mutable state of one shell. Forking a child clones
/// it; every evaluator that swaps a piece (positional parameters, local
/// frames, command name) saves and restores it on all exit paths.
#[derive(Debug, Clone)]
pub struct ShellState {
    pub vars: VarTable,
    pub param: ShellParam,
    pub options: ShellOptions,
    pub functions: FuncTable,
    pub traps: TrapTable,
    pub skip: SkipState,

    pub loop_nest: u32,
    pub func_nest: u32,
    /// `func_nest + 1` captured on entering a dot script; 0 outside any.
    pub dot_func_nest: u32,
    /// Base line subtracted from function-relative line reporting.
    pub func_line_base: u32,

    pub exit_status: i32,
    pub back_exit_status: i32,

    /// `$0` and the prefix on diagnostics.
    pub command_name: String,
    /// Flags of the builtin currently executing (consumed by `eval`).
    pub builtin_flags: EvalFlags,
    /// Assignment prefix of the command currently executing (consumed by
    /// `exec`).
    pub cmd_environ: Vec<String>,

    pub cwd: String,
    pub line_number: u32,
    pub io: ShellIo,
    pub locals: Vec<LocalFrame>,
    pub jobs: JobSet,
    pub cmd_hash: CommandHash,
    pub pid: u32,
    pub command_count: u64,
}

impl ShellState {
    pub fn new() -> Self {
        Self {
            vars: VarTable::default(),
            param: ShellParam::default(),
            options: ShellOptions::default(),
            functions: FuncTable::default(),
            traps: TrapTable::default(),
            skip: SkipState::default(),
            loop_nest: 0,
            func_nest: 0,
            dot_func_nest: 0,
            func_line_base: 0,
            exit_status: 0,
            back_exit_status: 0,
            command_name: "minsh".to_string(),
            builtin_flags: EvalFlags::NONE,
            cmd_environ: Vec::new(),
            cwd: "/".to_string(),
            line_number: 1,
            io: ShellIo::default(),
            locals: Vec::new(),
            jobs: JobSet::default(),
            cmd_hash: CommandHash::default(),
            pid: std::process::id(),
            command_count: 0,
        }
    }

    /// Clone the state for a forked child: fresh capture buffers, the
    /// given virtual pid, and inherited traps marked invalid so the child
    /// zeroes them before running anything but `trap`.
    pub fn fork_child(&self, pid: u32) -> ShellState {
        let mut child = self.clone();
        child.io = self.io.child_view();
        child.pid = pid;
        child.traps.mark_invalid();
        child
    }

    /// Reset the non-local control state (top-level exception recovery).
    pub fn reset_eval(&mut self) {
        self.skip.stop();
        self.loop_nest = 0;
        self.func_nest = 0;
        self.dot_func_nest = 0;
    }

    pub fn pathval(&self) -> String {
        self.vars.get("PATH").unwrap_or("/usr/bin:/bin").to_string()
    }

    pub fn ps4val(&self) -> String {
        self.vars.get("PS4").unwrap_or("+ ").to_string()
    }

    pub fn ifsval(&self) -> String {
        self.vars.get("IFS").unwrap_or(" \t\n").to_string()
    }
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new()
    }
}
