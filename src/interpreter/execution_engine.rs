//! Execution Engine
//!
//! The tree dispatcher at the center of the evaluator. `eval_tree` walks
//! one command tree, updating the process-wide exit status and honoring
//! the skip latch, the `-n`/`-e`/`-x` options, and the evaluation flags;
//! `eval_string` is the re-entry point `eval` and `.` use to run freshly
//! parsed text.
//!
//! The dispatcher's epilogue runs on every normal return: pending trap
//! actions are delivered, `-e` exits the shell when an untested command
//! failed, and `EV_EXIT` turns the finished evaluation into the exit
//! exception. Exceptions skip the epilogue and unwind to the nearest
//! converting frame.

use crate::ast::types::Node;
use crate::commands::CommandRegistry;
use crate::fs::Fs;
use crate::interpreter::errors::{EvalResult, ShellException};
use crate::interpreter::redirections::write_fd;
use crate::interpreter::types::{EvalFlags, ExecutionLimits, ShellState};

pub struct Evaluator<'a> {
    pub fs: &'a dyn Fs,
    pub registry: &'a CommandRegistry,
    pub limits: &'a ExecutionLimits,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        fs: &'a dyn Fs,
        registry: &'a CommandRegistry,
        limits: &'a ExecutionLimits,
    ) -> Self {
        Self { fs, registry, limits }
    }

    /// Write to the standard output stream.
    pub fn out1(&self, state: &mut ShellState, text: &str) -> EvalResult {
        let io = &mut state.io;
        write_fd(self.fs, io, 1, text)
    }

    /// Write to the standard error stream.
    pub fn out2(&self, state: &mut ShellState, text: &str) -> EvalResult {
        let io = &mut state.io;
        write_fd(self.fs, io, 2, text)
    }

    /// Write to the trace stream (`-x` output).
    pub fn outx(&self, state: &mut ShellState, text: &str) -> EvalResult {
        self.out2(state, text)
    }

    /// Evaluate a parse tree, leaving the result in the process-wide exit
    /// status. `None` is a no-op that reports success.
    pub fn eval_tree(
        &self,
        state: &mut ShellState,
        node: Option<&Node>,
        flags: EvalFlags,
    ) -> EvalResult {
        let mut do_etest = false;
        self.eval_tree_inner(state, node, flags, &mut do_etest)?;

        // Epilogue: runs on every normal return, skipped by unwinding
        // exceptions.
        if state.traps.has_pending() {
            self.do_trap(state)?;
        }
        if state.options.errexit && state.exit_status != 0 && do_etest {
            return Err(ShellException::Exit(state.exit_status));
        }
        if flags.exit {
            return Err(ShellException::Exit(state.exit_status));
        }
        Ok(())
    }

    fn eval_tree_inner(
        &self,
        state: &mut ShellState,
        node: Option<&Node>,
        flags: EvalFlags,
        do_etest: &mut bool,
    ) -> EvalResult {
        let mut n = match node {
            None => {
                if !state.options.noexec {
                    state.exit_status = 0;
                }
                return Ok(());
            }
            Some(n) if state.options.noexec => {
                // -n executes nothing, but definitions still register.
                if let Node::DefFun(d) = n {
                    state.functions.defun(&d.name, &d.body, d.lineno);
                }
                state.exit_status = 0;
                return Ok(());
            }
            Some(n) => n,
        };

        loop {
            // A forked child that has not yet observed its inherited traps
            // must zero them before running anything but a simple command
            // (those get the finer-grained check in the command evaluator).
            if !matches!(n, Node::Cmd(_)) && state.traps.is_invalid() {
                state.traps.free_traps();
            }

            let next: Option<&Node> = match n {
                Node::Semi(b) => {
                    self.eval_tree(state, Some(&b.left), flags.without_exit())?;
                    if state.options.noexec || state.skip.is_skipping() {
                        return Ok(());
                    }
                    Some(&b.right)
                }
                Node::And(b) => {
                    self.eval_tree(state, Some(&b.left), EvalFlags::TESTED)?;
                    if state.options.noexec
                        || state.skip.is_skipping()
                        || state.exit_status != 0
                    {
                        return Ok(());
                    }
                    Some(&b.right)
                }
                Node::Or(b) => {
                    self.eval_tree(state, Some(&b.left), EvalFlags::TESTED)?;
                    if state.options.noexec
                        || state.skip.is_skipping()
                        || state.exit_status == 0
                    {
                        return Ok(());
                    }
                    Some(&b.right)
                }
                Node::Not(u) => {
                    self.eval_tree(state, Some(&u.body), EvalFlags::TESTED)?;
                    state.exit_status = if state.exit_status == 0 { 1 } else { 0 };
                    None
                }
                Node::DNot(u) => {
                    self.eval_tree(state, Some(&u.body), EvalFlags::TESTED)?;
                    if state.exit_status != 0 {
                        state.exit_status = 1;
                    }
                    None
                }
                Node::If(i) => {
                    self.eval_tree(state, Some(&i.test), EvalFlags::TESTED)?;
                    if state.options.noexec || state.skip.is_skipping() {
                        return Ok(());
                    }
                    if state.exit_status == 0 {
                        Some(&i.then_part)
                    } else if let Some(else_part) = &i.else_part {
                        Some(else_part)
                    } else {
                        state.exit_status = 0;
                        None
                    }
                }
                Node::While(_) | Node::Until(_) => {
                    self.eval_loop(state, n, flags.without_exit())?;
                    None
                }
                Node::For(f) => {
                    self.eval_for(state, f, flags.without_exit())?;
                    None
                }
                Node::Case(c) => {
                    self.eval_case(state, c, flags.without_exit())?;
                    None
                }
                Node::DefFun(d) => {
                    state.functions.defun(&d.name, &d.body, d.lineno);
                    state.exit_status = 0;
                    None
                }
                Node::Pipe(p) => {
                    self.eval_pipe(state, p)?;
                    *do_etest = !flags.tested;
                    None
                }
                Node::Redir(r) => {
                    self.eval_redir(state, r, flags)?;
                    None
                }
                Node::Subshell(r) => {
                    self.eval_subshell(state, r, flags, false)?;
                    *do_etest = !flags.tested;
                    None
                }
                Node::Background(r) => {
                    self.eval_subshell(state, r, flags, true)?;
                    None
                }
                Node::Cmd(c) => {
                    self.eval_command(state, c, flags)?;
                    *do_etest = !flags.tested;
                    None
                }
            };
            match next {
                Some(t) => n = t,
                None => return Ok(()),
            }
        }
    }

    /// Deliver queued trap actions. The exit status is preserved across
    /// the handlers.
    pub fn do_trap(&self, state: &mut ShellState) -> EvalResult {
        for (_, action) in state.traps.take_pending() {
            if let Some(action) = action {
                let saved_status = state.exit_status;
                self.eval_string(state, &action, EvalFlags::NONE)?;
                state.exit_status = saved_status;
            }
        }
        Ok(())
    }

    /// Execute commands contained in a string. With `exit` set in the
    /// flags, the final parsed command inherits it so the last fork can be
    /// elided, and the call ends by raising the exit exception.
    pub fn eval_string(&self, state: &mut ShellState, s: &str, flags: EvalFlags) -> EvalResult {
        let last = flags.exit;
        let flags = flags.without_exit();

        let trees = crate::parser::parse_all(s)
            .map_err(|e| ShellException::error(e.to_string()))?;

        let mut any = false;
        for (i, tree) in trees.iter().enumerate() {
            let tree_flags =
                if last && i + 1 == trees.len() { flags.with_exit() } else { flags };
            if !state.options.noexec {
                any = true;
            }
            self.eval_tree(state, Some(tree), tree_flags)?;
            if state.skip.is_skipping() {
                break;
            }
        }
        if !any {
            state.exit_status = 0;
        }
        if last {
            return Err(ShellException::Exit(state.exit_status));
        }
        Ok(())
    }

    /// Run a file's worth of commands, stopping at the skip latch (the
    /// command-loop contract the dot builtin and script execution rely
    /// on).
    pub fn eval_file_contents(&self, state: &mut ShellState, content: &str) -> EvalResult {
        let trees = crate::parser::parse_all(content)
            .map_err(|e| ShellException::error(e.to_string()))?;
        for tree in &trees {
            self.eval_tree(state, Some(tree), EvalFlags::NONE)?;
            if state.skip.is_skipping() {
                break;
            }
        }
        Ok(())
    }
}
