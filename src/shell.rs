//! Shell Environment
//!
//! Main entry point: ties together the parser, the evaluator, the
//! virtual file system, and the external-command registry. One `Shell`
//! is one shell process; `run` executes a script in it and returns the
//! captured streams plus the exit status.

use crate::commands::CommandRegistry;
use crate::fs::MemFs;
use crate::interpreter::errors::{ShellException, EXIT_SIGNAL_BASE, SIGINT};
use crate::interpreter::types::{EvalFlags, ExecResult, ExecutionLimits, ShellState};
use crate::interpreter::Evaluator;

/// Options for creating a shell.
#[derive(Default)]
pub struct ShellConfig {
    /// Extra exported variables layered over the defaults.
    pub env: Vec<(String, String)>,
    /// Working directory (created if missing).
    pub cwd: Option<String>,
    /// Positional parameters.
    pub args: Vec<String>,
    /// `$0`.
    pub name: Option<String>,
    pub limits: Option<ExecutionLimits>,
}

pub struct Shell {
    fs: MemFs,
    registry: CommandRegistry,
    limits: ExecutionLimits,
    state: ShellState,
}

impl Shell {
    pub fn new(config: ShellConfig) -> Self {
        let fs = MemFs::new();
        for dir in ["/home/user", "/tmp", "/bin", "/usr/bin"] {
            fs.add_dir(dir);
        }

        let cwd = config.cwd.unwrap_or_else(|| "/home/user".to_string());
        fs.add_dir(&cwd);

        let mut state = ShellState::new();
        state.cwd = cwd.clone();
        let defaults =
            [("HOME", "/home/user"), ("PATH", "/usr/bin:/bin"), ("PWD", cwd.as_str())];
        for (name, value) in defaults {
            let _ = state.vars.set_exported(name, value);
        }
        for (name, value) in &config.env {
            let _ = state.vars.set_exported(name, value);
        }
        state.param.params = config.args;
        if let Some(name) = config.name {
            state.command_name = name;
        }

        Self {
            fs,
            registry: CommandRegistry::with_defaults(),
            limits: config.limits.unwrap_or_default(),
            state,
        }
    }

    pub fn fs(&self) -> &MemFs {
        &self.fs
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ShellState {
        &mut self.state
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    /// Execute a script. The captured output is what reached the
    /// unredirected standard streams; the exit code follows the shell
    /// conventions (127 not found, 126 not executable, 128+n signal).
    pub fn run(&mut self, src: &str) -> ExecResult {
        let ev = Evaluator::new(&self.fs, &self.registry, &self.limits);
        let redir_depth = self.state.io.redir.depth();

        let mut status = match ev.eval_string(&mut self.state, src, EvalFlags::NONE) {
            Ok(()) => self.state.exit_status,
            Err(ShellException::Exit(status)) => status,
            Err(ShellException::Interrupt) => EXIT_SIGNAL_BASE + SIGINT,
            Err(ShellException::Error(msg)) => {
                let diag = format!("{}: {}\n", self.state.command_name, msg);
                self.state.io.stderr.push_str(&diag);
                2
            }
            Err(ShellException::Exec { status, message }) => {
                let diag = format!("{}: {}\n", self.state.command_name, message);
                self.state.io.stderr.push_str(&diag);
                status
            }
        };

        // Exception recovery: whatever unwound past every frame is reset
        // here, the way the top of the read-eval loop resets after a
        // caught exception.
        self.state.io.redir.unwind_to(redir_depth);
        self.state.reset_eval();

        // The EXIT trap runs once, as the script ends; its own exit
        // status is ignored unless it exits the shell itself.
        if let Some(action) = self.state.traps.take_exit_trap() {
            self.state.exit_status = status;
            match ev.eval_string(&mut self.state, &action, EvalFlags::NONE) {
                Ok(()) => {}
                Err(ShellException::Exit(trap_status)) => status = trap_status,
                Err(_) => {}
            }
            self.state.io.redir.unwind_to(redir_depth);
            self.state.reset_eval();
        }

        self.state.exit_status = status;
        ExecResult {
            stdout: std::mem::take(&mut self.state.io.stdout),
            stderr: std::mem::take(&mut self.state.io.stderr),
            exit_code: status,
        }
    }
}
