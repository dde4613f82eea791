//! Pipeline Execution
//!
//! `cmd1 | cmd2 | cmd3` and back-tick capture. Every stage is a forked
//! child of the shell creating the pipeline; the parent makes the pipes
//! left to right and forks left to right, each stage reading the previous
//! stage's output. A foreground pipeline's status is the status of its
//! last stage.

use crate::ast::types::{Node, PipeNode};
use crate::interpreter::command_resolution::prehash;
use crate::interpreter::errors::EvalResult;
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::jobs::{run_child, wait_for_job};
use crate::interpreter::redirections::{write_fd, FdTarget};
use crate::interpreter::types::{EvalFlags, ShellState};

impl Evaluator<'_> {
    pub fn eval_pipe(&self, state: &mut ShellState, pipe: &PipeNode) -> EvalResult {
        let pipelen = pipe.commands.len();
        let mut job = state.jobs.make_job(pipelen);
        let mut carried: Option<String> = None;
        let mut last_status = 0;

        for (i, cmd) in pipe.commands.iter().enumerate() {
            prehash(self, state, cmd);
            let not_last = i + 1 < pipelen;
            if not_last {
                // Shell-internal pipes sit above the standard descriptors.
                let (rfd, wfd) = state.io.sh_pipe();
                debug_assert!(rfd >= 3 && wfd >= 3);
            }

            let mut child = state.fork_child(job.pid + i as u32);
            if let Some(data) = carried.take() {
                // The read end of the previous pipe becomes stdin.
                child.io.redir.set(0, FdTarget::Input(data), false);
            }
            if not_last {
                // The write end of the new pipe becomes stdout.
                child.io.redir.set(1, FdTarget::CaptureOut, false);
            }
            last_status = run_child(&mut child, |st| {
                self.eval_tree(st, Some(cmd), EvalFlags::NONE.with_exit())
            });

            if not_last {
                carried = Some(std::mem::take(&mut child.io.stdout));
            } else {
                let out = std::mem::take(&mut child.io.stdout);
                write_fd(self.fs, &mut state.io, 1, &out)?;
            }
            let err = std::mem::take(&mut child.io.stderr);
            write_fd(self.fs, &mut state.io, 2, &err)?;
        }

        job.status = last_status;
        if pipe.background {
            state.jobs.record_background(&job);
            state.exit_status = 0;
        } else {
            state.exit_status = wait_for_job(&job);
        }
        Ok(())
    }

    /// Capture the standard output of a command list (back-tick and
    /// `$(...)` substitution). The child runs with `-e` disabled and its
    /// stdout tied to an in-memory buffer; the captured text is returned
    /// and the job's status recorded as the back-quote exit status.
    pub fn eval_backcmd(&self, state: &mut ShellState, cmds: &[Node]) -> EvalResult<String> {
        if state.options.noexec || cmds.is_empty() {
            return Ok(String::new());
        }

        let (rfd, wfd) = state.io.sh_pipe();
        debug_assert!(rfd >= 3 && wfd >= 3);
        let mut job = state.jobs.make_job(1);
        let mut child = state.fork_child(job.pid);
        child.options.errexit = false;
        child.io.redir.set(1, FdTarget::CaptureOut, false);

        let status = run_child(&mut child, |st| {
            for (i, cmd) in cmds.iter().enumerate() {
                let flags = if i + 1 == cmds.len() {
                    EvalFlags::NONE.with_exit()
                } else {
                    EvalFlags::NONE
                };
                self.eval_tree(st, Some(cmd), flags)?;
            }
            Ok(())
        });
        job.status = status;

        let err = std::mem::take(&mut child.io.stderr);
        write_fd(self.fs, &mut state.io, 2, &err)?;
        state.back_exit_status = wait_for_job(&job);
        Ok(std::mem::take(&mut child.io.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::test_support::harness;

    fn eval(state: &mut ShellState, src: &str) -> EvalResult {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        for tree in crate::parser::parse_all(src).expect("parse") {
            ev.eval_tree(state, Some(&tree), EvalFlags::NONE)?;
        }
        Ok(())
    }

    #[test]
    fn test_pipe_threads_stdout_to_stdin() {
        let mut st = ShellState::new();
        eval(&mut st, "echo hello | cat").unwrap();
        assert_eq!(st.io.stdout, "hello\n");
        assert_eq!(st.exit_status, 0);
    }

    #[test]
    fn test_three_stage_pipeline() {
        let mut st = ShellState::new();
        eval(&mut st, "echo one | cat | cat").unwrap();
        assert_eq!(st.io.stdout, "one\n");
    }

    #[test]
    fn test_pipeline_status_is_last_stage() {
        let mut st = ShellState::new();
        eval(&mut st, "false | true").unwrap();
        assert_eq!(st.exit_status, 0);
        eval(&mut st, "true | false").unwrap();
        assert_eq!(st.exit_status, 1);
    }

    #[test]
    fn test_middle_stage_death_does_not_change_status() {
        let (fs, reg, limits) = harness();
        // A stage that dies the way a signal-terminated child would.
        fs.add_executable("/usr/bin/die", "exit 143\n");
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        for tree in crate::parser::parse_all("echo x | die | cat").expect("parse") {
            ev.eval_tree(&mut st, Some(&tree), EvalFlags::NONE).unwrap();
        }
        assert_eq!(st.exit_status, 0);
    }

    #[test]
    fn test_background_pipeline_reports_zero() {
        let mut st = ShellState::new();
        eval(&mut st, "true | false &").unwrap();
        assert_eq!(st.exit_status, 0);
        assert!(st.jobs.last_background_pid != 0);
    }

    #[test]
    fn test_pipeline_stage_isolation() {
        let mut st = ShellState::new();
        st.vars.set("x", "outer").unwrap();
        eval(&mut st, "x=inner | true; echo $x").unwrap();
        assert_eq!(st.io.stdout, "outer\n");
    }

    #[test]
    fn test_backcmd_captures_output_and_status() {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        let trees = crate::parser::parse_all("echo captured; false").expect("parse");
        let out = ev.eval_backcmd(&mut st, &trees).unwrap();
        assert_eq!(out, "captured\n");
        assert_eq!(st.back_exit_status, 1);
    }

    #[test]
    fn test_backcmd_disables_errexit_in_child() {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        st.options.errexit = true;
        let trees = crate::parser::parse_all("false; echo survived").expect("parse");
        let out = ev.eval_backcmd(&mut st, &trees).unwrap();
        assert_eq!(out, "survived\n");
    }

    #[test]
    fn test_backcmd_empty_under_noexec() {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        st.options.noexec = true;
        let trees = crate::parser::parse_all("echo hi").expect("parse");
        assert_eq!(ev.eval_backcmd(&mut st, &trees).unwrap(), "");
    }
}
