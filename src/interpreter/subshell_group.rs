//! Subshell and compound-redirection execution
//!
//! `( ... )`, `... &`, and `{ ...; } > file`. Forking is cloning the
//! state: the child gets the parent's descriptor table and fresh capture
//! buffers, and the parent routes whatever the child captured through its
//! own descriptors after the wait. A foreground subshell whose result is
//! the last thing this process will do skips the fork entirely.

use crate::ast::types::RedirNode;
use crate::interpreter::errors::{EvalResult, ShellException};
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::jobs::{run_child, wait_for_job};
use crate::interpreter::redirections::{
    format_redir, pop_redir, redirect, write_fd, REDIR_KEEP, REDIR_PUSH,
};
use crate::interpreter::types::{EvalFlags, ShellState};
use crate::interpreter::word_expansion::expand_string;

impl Evaluator<'_> {
    /// `( ... )` and backgrounded compounds.
    pub fn eval_subshell(
        &self,
        state: &mut ShellState,
        n: &RedirNode,
        flags: EvalFlags,
        background: bool,
    ) -> EvalResult {
        let redirs = self.expredir(state, &n.redirect)?;

        if state.options.xtrace && !n.redirect.is_empty() {
            let ps4val = state.ps4val();
            let mut line = expand_string(self, state, &ps4val);
            line.push_str("using redirections:");
            for r in &n.redirect {
                line.push(' ');
                line.push_str(&format_redir(r));
            }
            line.push_str(" do subshell (");
            if background {
                line.push_str(") &");
            }
            line.push('\n');
            self.outx(state, &line)?;
        }

        // Fork elision: a foreground subshell that is the process's last
        // act needs no child as long as no traps could observe the
        // difference.
        if !background && flags.exit && !state.traps.have_traps() {
            redirect(
                self.fs,
                &mut state.io,
                state.options.noclobber,
                &state.cwd,
                &redirs,
                REDIR_KEEP,
            )?;
            // Never returns: the tree ends in the exit exception.
            return self.eval_tree(state, Some(&n.body), flags.with_exit());
        }

        let mut job = state.jobs.make_job(1);
        let mut child = state.fork_child(job.pid);
        let mut child_flags = flags;
        if background {
            child_flags.tested = false;
        }
        let status = run_child(&mut child, |st| {
            redirect(self.fs, &mut st.io, st.options.noclobber, &st.cwd, &redirs, REDIR_KEEP)?;
            self.eval_tree(st, Some(&n.body), child_flags.with_exit())
        });
        job.status = status;

        let out = std::mem::take(&mut child.io.stdout);
        let err = std::mem::take(&mut child.io.stderr);
        write_fd(self.fs, &mut state.io, 1, &out)?;
        write_fd(self.fs, &mut state.io, 2, &err)?;

        if background {
            state.jobs.record_background(&job);
            state.exit_status = 0;
        } else {
            state.exit_status = wait_for_job(&job);
        }

        if !background && state.options.xtrace && !n.redirect.is_empty() {
            let ps4val = state.ps4val();
            let line = format!("{}) done subshell\n", expand_string(self, state, &ps4val));
            self.outx(state, &line)?;
        }
        Ok(())
    }

    /// Compound command with attached redirections: `{ ...; } > file`.
    /// A failure while installing the redirections becomes exit status 2;
    /// a failure in the body unwinds past this frame after the stack is
    /// popped.
    pub fn eval_redir(&self, state: &mut ShellState, n: &RedirNode, flags: EvalFlags) -> EvalResult {
        let traced = state.options.xtrace && !n.redirect.is_empty();
        if traced {
            let ps4val = state.ps4val();
            let mut line = expand_string(self, state, &ps4val);
            line.push_str("using redirections:");
            for r in &n.redirect {
                line.push(' ');
                line.push_str(&format_redir(r));
            }
            line.push_str(" do {\n");
            self.outx(state, &line)?;
        }

        // Install phase: expansion and open errors are recoverable here.
        let install = self.expredir(state, &n.redirect).and_then(|redirs| {
            redirect(
                self.fs,
                &mut state.io,
                state.options.noclobber,
                &state.cwd,
                &redirs,
                REDIR_PUSH,
            )
            .map_err(|e| {
                // The failed install left its frame pushed.
                pop_redir(&mut state.io);
                e
            })
        });
        if let Err(e) = install {
            match e {
                ShellException::Error(msg) | ShellException::Exec { message: msg, .. } => {
                    let diag = format!("{}: {}\n", state.command_name, msg);
                    self.out2(state, &diag)?;
                    if traced {
                        let ps4val = state.ps4val();
                        let line = format!("{}}} failed\n", expand_string(self, state, &ps4val));
                        self.outx(state, &line)?;
                    }
                    state.exit_status = 2;
                    return Ok(());
                }
                other => return Err(other),
            }
        }

        let result = self.eval_tree(state, Some(&n.body), flags);
        pop_redir(&mut state.io);
        result?;

        if traced {
            let ps4val = state.ps4val();
            let line = format!("{}}} done\n", expand_string(self, state, &ps4val));
            self.outx(state, &line)?;
        }
        Ok(())
    }
}
