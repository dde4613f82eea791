//! exec - replace the shell with a command
//!
//! With operands, the command replaces the shell: interactive and
//! job-control flags are dropped, the assignment prefix is exported, and
//! execution never returns. Without operands the builtin only reports
//! success; the redirections it carried stay installed because the
//! dispatcher deliberately skips the redirection pop for `exec`.

use crate::interpreter::command_resolution::environment;
use crate::interpreter::errors::EvalResult;
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::types::ShellState;
use crate::interpreter::variables::set_var_eq;

pub fn exec_cmd(ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    let mut operands = &argv[1..];
    if operands.first().map(|s| s.as_str()) == Some("--") {
        operands = &operands[1..];
    }
    if operands.is_empty() {
        return Ok(0);
    }

    state.options.interactive = false;
    state.options.monitor = false;
    for assignment in state.cmd_environ.clone() {
        set_var_eq(&mut state.vars, &assignment, true)?;
    }
    let env = environment(state);
    let path = state.pathval();
    let operands: Vec<String> = operands.to_vec();
    Err(ev.shellexec(state, &operands, env, &path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::errors::ShellException;
    use crate::interpreter::test_support::harness;

    #[test]
    fn test_exec_without_operands() {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        let argv = vec!["exec".to_string()];
        assert_eq!(exec_cmd(&ev, &mut st, &argv).unwrap(), 0);
    }

    #[test]
    fn test_exec_never_returns() {
        let (fs, reg, limits) = harness();
        fs.add_executable("/usr/bin/seven", "exit 7\n");
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        st.options.interactive = true;
        let argv: Vec<String> = ["exec", "seven"].iter().map(|s| s.to_string()).collect();
        match exec_cmd(&ev, &mut st, &argv) {
            Err(ShellException::Exit(7)) => {}
            other => panic!("expected exit 7, got {:?}", other),
        }
        assert!(!st.options.interactive);
    }

    #[test]
    fn test_exec_missing_command() {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        let argv: Vec<String> = ["exec", "ghost"].iter().map(|s| s.to_string()).collect();
        match exec_cmd(&ev, &mut st, &argv) {
            Err(ShellException::Exec { status: 127, .. }) => {}
            other => panic!("expected exec failure, got {:?}", other),
        }
    }

    #[test]
    fn test_exec_exports_command_environment() {
        let (fs, reg, limits) = harness();
        fs.add_executable("/usr/bin/show", "exit 0\n");
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        st.cmd_environ = vec!["MARK=yes".to_string()];
        let argv: Vec<String> = ["exec", "show"].iter().map(|s| s.to_string()).collect();
        let _ = exec_cmd(&ev, &mut st, &argv);
        assert_eq!(st.vars.get("MARK"), Some("yes"));
        assert!(st.vars.get_var("MARK").map(|v| v.exported).unwrap_or(false));
    }
}
