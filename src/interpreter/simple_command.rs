//! Simple-command evaluation
//!
//! The ten-phase pipeline behind every simple command: expand the
//! argument words (assignment prefix deferred to a second pass), expand
//! the redirections, trace, look the command up (letting the `command`
//! builtin rewrite the search), zero stale traps, decide whether to fork,
//! then dispatch to a function, a builtin, or an external program.

use std::rc::Rc;

use crate::ast::types::CmdNode;
use crate::interpreter::builtins::{run_builtin, BuiltinKind};
use crate::interpreter::command_resolution::{
    environment, find_command, syspath, CmdEntry, DO_NOFUNC,
};
use crate::interpreter::errors::{
    EvalResult, ShellException, EXIT_ERROR, EXIT_SIGNAL_BASE, SIGINT,
};
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::functions::FuncDef;
use crate::interpreter::jobs::{run_child, wait_for_job};
use crate::interpreter::redirections::{
    format_redir, pop_redir, redirect, write_fd, ExpandedRedir, REDIR_KEEP, REDIR_PUSH,
};
use crate::interpreter::skip::SkipKind;
use crate::interpreter::types::{EvalFlags, ShellState};
use crate::interpreter::variables::{
    list_mk_local, list_set_var, mk_local, pop_local_vars, set_var_eq, split_assignment,
    LocalFrame, ShellParam,
};
use crate::interpreter::word_expansion::{
    expand_arg, expand_string, expand_to_field, is_assignment_word, sh_quote, EXP_FULL,
    EXP_TILDE, EXP_VARTILDE,
};

/// Consume the `command` word and its options from the front of argv.
/// Returns (words consumed, use the system path, delegate to `type`).
fn parse_command_args(argv: &[String]) -> (usize, bool, bool) {
    let mut used = 1; // the `command` word itself
    let mut use_syspath = false;
    for arg in &argv[1..] {
        if !arg.starts_with('-') || arg == "-" {
            break;
        }
        used += 1;
        if arg == "--" {
            break;
        }
        for c in arg[1..].chars() {
            match c {
                'p' => use_syspath = true,
                // -v / -V (and anything unrecognized) delegate to `type`.
                _ => return (used, use_syspath, true),
            }
        }
    }
    (used, use_syspath, false)
}

impl Evaluator<'_> {
    pub fn eval_command(
        &self,
        state: &mut ShellState,
        cmd: &CmdNode,
        flags: EvalFlags,
    ) -> EvalResult {
        state.command_count += 1;
        if state.command_count > self.limits.max_commands {
            return Err(ShellException::error("maximum command count exceeded"));
        }

        state.line_number = cmd.lineno;
        state.back_exit_status = 0;

        // Phase 1: expand arguments, skipping the leading assignments.
        let mut arglist: Vec<String> = Vec::new();
        let mut assignment_words = Vec::new();
        let mut varflag = true;
        for word in &cmd.args {
            if varflag && is_assignment_word(word) {
                assignment_words.push(word);
                continue;
            }
            varflag = false;
            state.line_number = word.lineno;
            arglist.extend(expand_arg(self, state, word, EXP_FULL | EXP_TILDE)?);
        }

        // Phase 2: redirection targets.
        let redirs = self.expredir(state, &cmd.redirect)?;

        // Phase 1b: now the assignments we skipped, in assignment context.
        let mut varlist: Vec<String> = Vec::new();
        for word in &assignment_words {
            state.line_number = word.lineno;
            varlist.push(expand_to_field(self, state, word, EXP_VARTILDE)?);
        }

        let argc = arglist.len();
        let lastarg = if state.options.interactive && state.func_nest == 0 && argc > 0 {
            Some(arglist[argc - 1].clone())
        } else {
            None
        };

        // Phase 3: trace.
        if state.options.xtrace {
            let ps4val = state.ps4val();
            let mut line = expand_string(self, state, &ps4val);
            let mut sep = false;
            for text in &varlist {
                if sep {
                    line.push(' ');
                }
                match split_assignment(text) {
                    // The name= part stays unquoted or it would not read
                    // back as an assignment.
                    Some((name, value)) => {
                        line.push_str(name);
                        line.push('=');
                        line.push_str(&sh_quote(value));
                    }
                    None => line.push_str(&sh_quote(text)),
                }
                sep = true;
            }
            for arg in &arglist {
                if sep {
                    line.push(' ');
                }
                line.push_str(&sh_quote(arg));
                sep = true;
            }
            for redir in &cmd.redirect {
                if sep {
                    line.push(' ');
                }
                line.push_str(&format_redir(redir));
                sep = true;
            }
            line.push('\n');
            self.outx(state, &line)?;
        }

        // Phase 4: locate the command.
        let default_path = state.pathval();
        let mut path = default_path.clone();
        let mut cmd_flags = 0u8;
        let mut argv = arglist;
        let mut entry = if argc == 0 {
            CmdEntry::Builtin(BuiltinKind::Empty)
        } else {
            // A PATH= prefix assignment changes this lookup only.
            for text in &varlist {
                if let Some(rest) = text.strip_prefix("PATH=") {
                    path = rest.to_string();
                }
            }
            loop {
                let found = find_command(self, state, &argv[0], cmd_flags, &path);
                if found.builtin_kind() != Some(BuiltinKind::Command) {
                    break found;
                }
                // The `command` builtin is implemented here: consume its
                // options and look up whatever is left.
                cmd_flags |= DO_NOFUNC;
                let (used, use_syspath, to_type) = parse_command_args(&argv);
                if to_type {
                    // `command -v name` is `type` wearing a disguise.
                    let mut rest: Vec<String> =
                        argv.drain(used..).collect();
                    argv = vec!["type".to_string()];
                    argv.append(&mut rest);
                    break CmdEntry::Builtin(BuiltinKind::Type);
                }
                argv.drain(..used);
                if use_syspath {
                    path = syspath().to_string();
                }
                if argv.is_empty() {
                    break CmdEntry::Builtin(BuiltinKind::Command);
                }
            }
        };
        if let CmdEntry::SpecialBuiltin(kind) = entry {
            if cmd_flags & DO_NOFUNC != 0 {
                // `command <special>` acts as if it were a regular builtin.
                entry = CmdEntry::Builtin(kind);
            }
        }

        // Phase 5: a forked child zeroes inherited traps now, unless this
        // command is `trap` or a wrapper (`eval`, `command`, `.`) that may
        // still lead to one.
        if state.traps.is_invalid()
            && !matches!(
                entry.builtin_kind(),
                Some(BuiltinKind::Trap | BuiltinKind::Eval | BuiltinKind::Dot)
            )
        {
            state.traps.free_traps();
        }

        // Phase 6: fork decision.
        let is_external = matches!(entry, CmdEntry::Normal { .. } | CmdEntry::Unknown);
        let need_fork =
            cmd.background || (is_external && (state.traps.have_traps() || !flags.exit));

        if need_fork {
            let mut job = state.jobs.make_job(1);
            let mut child = state.fork_child(job.pid);
            let status = run_child(&mut child, |st| {
                self.dispatch_command(
                    st,
                    entry,
                    &argv,
                    &varlist,
                    &redirs,
                    flags.with_exit(),
                    cmd_flags,
                    &path,
                    &default_path,
                )
            });
            job.status = status;

            let out = std::mem::take(&mut child.io.stdout);
            let err = std::mem::take(&mut child.io.stderr);
            write_fd(self.fs, &mut state.io, 1, &out)?;
            write_fd(self.fs, &mut state.io, 2, &err)?;

            if cmd.background {
                state.jobs.record_background(&job);
                state.exit_status = 0;
            } else {
                state.exit_status = wait_for_job(&job);
            }
        } else {
            self.dispatch_command(
                state,
                entry,
                &argv,
                &varlist,
                &redirs,
                flags,
                cmd_flags,
                &path,
                &default_path,
            )?;
        }

        // Phase 10: remember `$_` for interactive use.
        if let Some(lastarg) = lastarg {
            let _ = state.vars.set("_", &lastarg);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch_command(
        &self,
        state: &mut ShellState,
        entry: CmdEntry,
        argv: &[String],
        varlist: &[String],
        redirs: &[ExpandedRedir],
        flags: EvalFlags,
        cmd_flags: u8,
        path: &str,
        default_path: &str,
    ) -> EvalResult {
        match entry {
            CmdEntry::Function(func) => {
                self.run_function(state, func, argv, varlist, redirs, flags)
            }
            CmdEntry::Builtin(kind) => self.run_builtin_frame(
                state,
                kind,
                false,
                argv,
                varlist,
                redirs,
                flags,
                cmd_flags,
                path,
                default_path,
            ),
            CmdEntry::SpecialBuiltin(kind) => self.run_builtin_frame(
                state,
                kind,
                true,
                argv,
                varlist,
                redirs,
                flags,
                cmd_flags,
                path,
                default_path,
            ),
            CmdEntry::Normal { .. } | CmdEntry::Unknown => {
                redirect(
                    self.fs,
                    &mut state.io,
                    state.options.noclobber,
                    &state.cwd,
                    redirs,
                    REDIR_KEEP,
                )?;
                for text in varlist {
                    set_var_eq(&mut state.vars, text, true)?;
                }
                let env = environment(state);
                // Does not return: the command's life is this child's.
                Err(self.shellexec(state, argv, env, path))
            }
        }
    }

    /// Shell function call: fresh positional parameters, a fresh local
    /// frame with the assignment prefix made local-and-exported, nesting
    /// capped, and everything restored on every way out.
    fn run_function(
        &self,
        state: &mut ShellState,
        func: Rc<FuncDef>,
        argv: &[String],
        varlist: &[String],
        redirs: &[ExpandedRedir],
        flags: EvalFlags,
    ) -> EvalResult {
        if state.func_nest >= self.limits.max_func_nest {
            return Err(ShellException::error("too many nested function calls"));
        }

        let push_redirs = !flags.exit || state.traps.have_traps();
        redirect(
            self.fs,
            &mut state.io,
            state.options.noclobber,
            &state.cwd,
            redirs,
            if push_redirs { REDIR_PUSH } else { REDIR_KEEP },
        )?;

        let saved_param = std::mem::replace(
            &mut state.param,
            ShellParam::new(argv.iter().skip(1).cloned().collect()),
        );
        let saved_locals = std::mem::take(&mut state.locals);
        state.locals.push(LocalFrame::new());
        let saved_line_base = state.func_line_base;

        let body_result = self.run_function_body(state, &func, varlist, flags);

        // Restore on every exit path, then surface whatever the body did.
        if let Some(frame) = state.locals.pop() {
            pop_local_vars(&mut state.vars, frame);
        }
        state.locals = saved_locals;
        state.func_line_base = saved_line_base;
        state.param = saved_param;
        if push_redirs {
            pop_redir(&mut state.io);
        }
        body_result?;

        // A `return` terminates exactly one function level.
        if state.skip.current() == SkipKind::FuncReturn {
            state.skip.stop();
        }
        Ok(())
    }

    fn run_function_body(
        &self,
        state: &mut ShellState,
        func: &Rc<FuncDef>,
        varlist: &[String],
        flags: EvalFlags,
    ) -> EvalResult {
        {
            let mut frame = state.locals.pop().unwrap_or_default();
            let applied = list_mk_local(&mut state.vars, &mut frame, varlist, true);
            state.locals.push(frame);
            applied?;
        }
        state.func_nest += 1;
        state.func_line_base = func.lineno.saturating_sub(1);
        let result = self.eval_tree(
            state,
            Some(&func.body),
            EvalFlags { exit: flags.exit, tested: flags.tested },
        );
        state.func_nest -= 1;
        result
    }

    /// Builtin invocation inside its exception-converting frame.
    #[allow(clippy::too_many_arguments)]
    fn run_builtin_frame(
        &self,
        state: &mut ShellState,
        kind: BuiltinKind,
        special: bool,
        argv: &[String],
        varlist: &[String],
        redirs: &[ExpandedRedir],
        flags: EvalFlags,
        cmd_flags: u8,
        path: &str,
        default_path: &str,
    ) -> EvalResult {
        // The empty command is a normal builtin while redirections are
        // processed but special for the variable assignments.
        let special =
            special || (argv.is_empty() && cmd_flags & DO_NOFUNC == 0);

        // Keep the command hash intact under a temporary PATH.
        let mut temp_path_frame: Option<LocalFrame> = None;
        if path != default_path && matches!(kind, BuiltinKind::Hash | BuiltinKind::Type) {
            let mut frame = LocalFrame::new();
            mk_local(&mut state.vars, &mut frame, &format!("PATH={}", path), false)?;
            temp_path_frame = Some(frame);
        }

        let saved_command_name = state.command_name.clone();
        let mode = if kind == BuiltinKind::Exec { 0 } else { REDIR_PUSH };

        let result = (|| -> EvalResult<i32> {
            redirect(self.fs, &mut state.io, state.options.noclobber, &state.cwd, redirs, mode)?;
            state.cmd_environ = varlist.to_vec();
            list_set_var(&mut state.vars, varlist, special)?;
            if let Some(name) = argv.first() {
                state.command_name = name.clone();
            }
            state.builtin_flags = flags;
            run_builtin(kind, self, state, argv)
        })();

        // Unwind the frame's state swaps.
        if let Some(frame) = temp_path_frame {
            pop_local_vars(&mut state.vars, frame);
        }
        state.cmd_environ.clear();
        state.command_name = saved_command_name;

        // Translate the exception into an exit status; special builtins
        // surface recoverable errors to their caller.
        let reraise: Option<ShellException> = match result {
            Ok(status) => {
                state.exit_status = status;
                None
            }
            Err(ShellException::Exit(status)) => {
                state.exit_status = status;
                Some(ShellException::Exit(status))
            }
            Err(ShellException::Interrupt) => {
                state.exit_status = EXIT_SIGNAL_BASE + SIGINT;
                Some(ShellException::Interrupt)
            }
            Err(ShellException::Exec { status, message }) => {
                state.exit_status = status;
                if special {
                    Some(ShellException::Exec { status, message })
                } else {
                    let diag = format!("{}: {}\n", builtin_diag_name(argv, kind), message);
                    let _ = self.out2(state, &diag);
                    None
                }
            }
            Err(ShellException::Error(message)) => {
                state.exit_status = EXIT_ERROR;
                if special {
                    Some(ShellException::Error(message))
                } else {
                    let diag = format!("{}: {}\n", builtin_diag_name(argv, kind), message);
                    let _ = self.out2(state, &diag);
                    None
                }
            }
        };

        if flags.exit {
            // The process is done either way; its last status stands.
            return Err(ShellException::Exit(state.exit_status));
        }
        match reraise {
            // The redirection frame is deliberately left for the outer
            // handler to unwind.
            Some(e) => Err(e),
            None => {
                // `exec` leaves its redirections installed on purpose.
                if kind != BuiltinKind::Exec {
                    pop_redir(&mut state.io);
                }
                Ok(())
            }
        }
    }
}

fn builtin_diag_name(argv: &[String], kind: BuiltinKind) -> String {
    argv.first().cloned().unwrap_or_else(|| format!("{:?}", kind).to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::types::Fs;
    use crate::interpreter::test_support::harness;

    fn eval(state: &mut ShellState, src: &str) -> EvalResult {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        for tree in crate::parser::parse_all(src).expect("parse") {
            ev.eval_tree(state, Some(&tree), EvalFlags::NONE)?;
        }
        Ok(())
    }

    fn eval_with(fs: &crate::fs::MemFs, state: &mut ShellState, src: &str) -> EvalResult {
        let reg = crate::commands::CommandRegistry::with_defaults();
        let limits = crate::interpreter::types::ExecutionLimits::default();
        let ev = Evaluator::new(fs, &reg, &limits);
        for tree in crate::parser::parse_all(src).expect("parse") {
            ev.eval_tree(state, Some(&tree), EvalFlags::NONE)?;
        }
        Ok(())
    }

    #[test]
    fn test_parse_command_args() {
        let argv: Vec<String> =
            ["command", "-p", "ls"].iter().map(|s| s.to_string()).collect();
        assert_eq!(parse_command_args(&argv), (2, true, false));
        let argv: Vec<String> =
            ["command", "-v", "ls"].iter().map(|s| s.to_string()).collect();
        assert_eq!(parse_command_args(&argv), (2, false, true));
        let argv: Vec<String> = ["command", "ls"].iter().map(|s| s.to_string()).collect();
        assert_eq!(parse_command_args(&argv), (1, false, false));
    }

    #[test]
    fn test_assignment_only_command_persists() {
        let mut st = ShellState::new();
        eval(&mut st, "x=1 y=2").unwrap();
        assert_eq!(st.vars.get("x"), Some("1"));
        assert_eq!(st.vars.get("y"), Some("2"));
        assert_eq!(st.exit_status, 0);
    }

    #[test]
    fn test_prefix_assignment_does_not_leak_for_regular_builtin() {
        let mut st = ShellState::new();
        eval(&mut st, "x=tmp echo hi").unwrap();
        assert_eq!(st.vars.get("x"), None);
    }

    #[test]
    fn test_prefix_assignment_persists_for_special_builtin() {
        let mut st = ShellState::new();
        eval(&mut st, "x=kept :").unwrap();
        assert_eq!(st.vars.get("x"), Some("kept"));
    }

    #[test]
    fn test_prefix_assignment_exported_to_external() {
        let (fs, _, _) = harness();
        let mut st = ShellState::new();
        eval_with(&fs, &mut st, "x=1 y=2 env | grep '^[xy]='").unwrap();
        assert_eq!(st.io.stdout, "x=1\ny=2\n");
        assert_eq!(st.exit_status, 0);
        assert_eq!(st.vars.get("x"), None);
        assert_eq!(st.vars.get("y"), None);
    }

    #[test]
    fn test_function_call_and_return() {
        let mut st = ShellState::new();
        eval(&mut st, "f() { return 3; }; f").unwrap();
        assert_eq!(st.exit_status, 3);
        assert!(!st.skip.is_skipping());
        assert_eq!(st.func_nest, 0);
    }

    #[test]
    fn test_function_positional_params_restored() {
        let mut st = ShellState::new();
        st.param.params = vec!["outer".into()];
        eval(&mut st, "f() { echo $1 $#; }; f a b").unwrap();
        assert_eq!(st.io.stdout, "a 2\n");
        assert_eq!(st.param.params, vec!["outer"]);
    }

    #[test]
    fn test_function_locals_restored() {
        let mut st = ShellState::new();
        st.vars.set("x", "outer").unwrap();
        eval(&mut st, "f() { local x=inner; echo $x; }; f; echo $x").unwrap();
        assert_eq!(st.io.stdout, "inner\nouter\n");
    }

    #[test]
    fn test_function_prefix_assignment_is_local() {
        let mut st = ShellState::new();
        eval(&mut st, "f() { echo $tmp; }; tmp=v f; echo end$tmp").unwrap();
        assert_eq!(st.io.stdout, "v\nend\n");
    }

    #[test]
    fn test_function_nesting_cap() {
        let (fs, reg, _) = harness();
        let limits = crate::interpreter::types::ExecutionLimits {
            max_func_nest: 10,
            ..Default::default()
        };
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        let trees = crate::parser::parse_all("f() { f; }; f").expect("parse");
        let mut result = Ok(());
        for tree in &trees {
            result = ev.eval_tree(&mut st, Some(tree), EvalFlags::NONE);
            if result.is_err() {
                break;
            }
        }
        match result {
            Err(ShellException::Error(msg)) => assert!(msg.contains("nested function")),
            other => panic!("expected nesting error, got {:?}", other),
        }
        assert_eq!(st.func_nest, 0);
    }

    #[test]
    fn test_unknown_command_is_127() {
        let mut st = ShellState::new();
        eval(&mut st, "no-such-thing").unwrap();
        assert_eq!(st.exit_status, 127);
        assert!(st.io.stderr.contains("not found"));
    }

    #[test]
    fn test_non_executable_is_126() {
        let (fs, _, _) = harness();
        fs.add_file("/usr/bin/plain", "not a script");
        let mut st = ShellState::new();
        eval_with(&fs, &mut st, "/usr/bin/plain").unwrap();
        assert_eq!(st.exit_status, 126);
    }

    #[test]
    fn test_special_builtin_error_propagates() {
        let mut st = ShellState::new();
        let err = eval(&mut st, "shift 5").unwrap_err();
        assert!(matches!(err, ShellException::Error(_)));
    }

    #[test]
    fn test_regular_builtin_error_becomes_status_2() {
        let (fs, _, _) = harness();
        let mut st = ShellState::new();
        // cd to a missing directory: a regular builtin failing.
        eval_with(&fs, &mut st, "cd /missing-dir").unwrap();
        assert_eq!(st.exit_status, 2);
        assert!(st.io.stderr.contains("missing-dir"));
    }

    #[test]
    fn test_empty_command_with_redirect_creates_file() {
        let (fs, _, _) = harness();
        fs.add_file("/f", "old");
        let mut st = ShellState::new();
        eval_with(&fs, &mut st, "> /f").unwrap();
        assert_eq!(fs.read_file("/f").unwrap(), "");
        assert_eq!(st.exit_status, 0);
        assert_eq!(st.io.redir.depth(), 0);
    }

    #[test]
    fn test_empty_command_carries_backtick_status() {
        let (fs, _, _) = harness();
        let mut st = ShellState::new();
        eval_with(&fs, &mut st, "x=$(false)").unwrap();
        assert_eq!(st.exit_status, 1);
    }

    #[test]
    fn test_exec_redirections_persist() {
        let (fs, _, _) = harness();
        let mut st = ShellState::new();
        eval_with(&fs, &mut st, "exec > /log; echo captured").unwrap();
        assert_eq!(fs.read_file("/log").unwrap(), "captured\n");
        assert_eq!(st.io.stdout, "");
    }

    #[test]
    fn test_builtin_redirections_are_popped() {
        let (fs, _, _) = harness();
        let mut st = ShellState::new();
        eval_with(&fs, &mut st, "echo one > /f; echo two").unwrap();
        assert_eq!(fs.read_file("/f").unwrap(), "one\n");
        assert_eq!(st.io.stdout, "two\n");
        assert_eq!(st.io.redir.depth(), 0);
    }

    #[test]
    fn test_command_builtin_skips_functions() {
        let mut st = ShellState::new();
        eval(&mut st, "echo() { :; }; command echo real").unwrap();
        assert_eq!(st.io.stdout, "real\n");
    }

    #[test]
    fn test_command_v_reports_path() {
        let (fs, _, _) = harness();
        fs.add_executable("/usr/bin/tool", "exit 0\n");
        let mut st = ShellState::new();
        eval_with(&fs, &mut st, "command -v tool").unwrap();
        assert!(st.io.stdout.contains("/usr/bin/tool"));
    }

    #[test]
    fn test_command_special_builtin_demoted() {
        // Through `command`, a special builtin's assignment prefix no
        // longer persists.
        let mut st = ShellState::new();
        eval(&mut st, "x=gone command :").unwrap();
        assert_eq!(st.vars.get("x"), None);
    }

    #[test]
    fn test_temporary_path_assignment_scopes_to_command() {
        let (fs, _, _) = harness();
        fs.add_executable("/opt/tool", "echo from-opt\n");
        let mut st = ShellState::new();
        eval_with(&fs, &mut st, "PATH=/opt tool").unwrap();
        assert_eq!(st.io.stdout, "from-opt\n");
        assert_eq!(st.pathval(), "/usr/bin:/bin");
    }

    #[test]
    fn test_background_simple_command() {
        let mut st = ShellState::new();
        st.exit_status = 9;
        eval(&mut st, "false &").unwrap();
        assert_eq!(st.exit_status, 0);
        assert!(st.jobs.last_background_pid != 0);
    }

    #[test]
    fn test_xtrace_output() {
        let mut st = ShellState::new();
        st.options.xtrace = true;
        eval(&mut st, "x=1 echo hello 'two words'").unwrap();
        assert!(st.io.stderr.contains("+ x=1 echo hello 'two words'"));
    }

    #[test]
    fn test_script_on_path_runs_in_fresh_shell() {
        let (fs, _, _) = harness();
        fs.add_executable("/usr/bin/greet", "echo hi $1\n");
        let mut st = ShellState::new();
        st.vars.set("secret", "x").unwrap();
        eval_with(&fs, &mut st, "greet there").unwrap();
        assert_eq!(st.io.stdout, "hi there\n");
        assert_eq!(st.exit_status, 0);
    }
}
