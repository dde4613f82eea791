//! Builtin commands
//!
//! Commands implemented inside the shell process. Special builtins make
//! their assignment prefixes persist and propagate recoverable errors out
//! of the command; regular builtins do neither. The trivial ones live
//! here; everything with real behavior has its own file.

use crate::interpreter::errors::{EvalResult, ShellException};
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::types::ShellState;

pub mod break_cmd;
pub mod cd_cmd;
pub mod echo_cmd;
pub mod eval_cmd;
pub mod exec_cmd;
pub mod exit_cmd;
pub mod export_cmd;
pub mod local_cmd;
pub mod return_cmd;
pub mod set_cmd;
pub mod shift_cmd;
pub mod source_cmd;
pub mod times_cmd;
pub mod trap_cmd;
pub mod type_cmd;
pub mod unset_cmd;

/// Identity of a builtin, carried in the command-search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    /// The empty command (`>file` alone); also what `command` resolves to.
    Empty,
    Command,
    Break,
    Continue,
    Return,
    Eval,
    Dot,
    Exec,
    Exit,
    Set,
    Shift,
    Export,
    Readonly,
    Unset,
    Local,
    Trap,
    Times,
    Colon,
    True,
    False,
    Echo,
    Pwd,
    Cd,
    Type,
    Hash,
    Wait,
}

/// Look a name up in the builtin tables. The bool is the special-builtin
/// attribute.
pub fn lookup_builtin(name: &str) -> Option<(BuiltinKind, bool)> {
    use BuiltinKind::*;
    Some(match name {
        "command" => (Command, false),
        "break" => (Break, true),
        "continue" => (Continue, true),
        "return" => (Return, true),
        "eval" => (Eval, true),
        "." => (Dot, true),
        "exec" => (Exec, true),
        "exit" => (Exit, true),
        "set" => (Set, true),
        "shift" => (Shift, true),
        "export" => (Export, true),
        "readonly" => (Readonly, true),
        "unset" => (Unset, true),
        "local" => (Local, true),
        "trap" => (Trap, true),
        "times" => (Times, true),
        ":" => (Colon, true),
        "true" => (True, false),
        "false" => (False, false),
        "echo" => (Echo, false),
        "pwd" => (Pwd, false),
        "cd" => (Cd, false),
        "type" => (Type, false),
        "hash" => (Hash, false),
        "wait" => (Wait, false),
        _ => return None,
    })
}

/// Invoke a builtin. `argv[0]` is the name it was invoked under, which
/// the shared implementations (break/continue, export/readonly) inspect.
pub fn run_builtin(
    kind: BuiltinKind,
    ev: &Evaluator,
    state: &mut ShellState,
    argv: &[String],
) -> EvalResult<i32> {
    use BuiltinKind::*;
    match kind {
        // The empty command preserves the exit status of any command
        // substitution run while expanding its redirections.
        Empty | Command => Ok(state.back_exit_status),
        Break | Continue => break_cmd::break_cmd(ev, state, argv),
        Return => return_cmd::return_cmd(ev, state, argv),
        Eval => eval_cmd::eval_cmd(ev, state, argv),
        Dot => source_cmd::dot_cmd(ev, state, argv),
        Exec => exec_cmd::exec_cmd(ev, state, argv),
        Exit => exit_cmd::exit_cmd(ev, state, argv),
        Set => set_cmd::set_cmd(ev, state, argv),
        Shift => shift_cmd::shift_cmd(ev, state, argv),
        Export | Readonly => export_cmd::export_cmd(ev, state, argv),
        Unset => unset_cmd::unset_cmd(ev, state, argv),
        Local => local_cmd::local_cmd(ev, state, argv),
        Trap => trap_cmd::trap_cmd(ev, state, argv),
        Times => times_cmd::times_cmd(ev, state, argv),
        Colon | True => Ok(0),
        False => Ok(1),
        Echo => echo_cmd::echo_cmd(ev, state, argv),
        Pwd => cd_cmd::pwd_cmd(ev, state, argv),
        Cd => cd_cmd::cd_cmd(ev, state, argv),
        Type => type_cmd::type_cmd(ev, state, argv),
        Hash => type_cmd::hash_cmd(ev, state, argv),
        // Children are reaped eagerly; nothing is ever left to wait for.
        Wait => Ok(0),
    }
}

/// Numeric argument parsing shared by the control builtins.
pub fn number(text: &str) -> EvalResult<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| ShellException::error(format!("Illegal number: {}", text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::test_support::harness;

    #[test]
    fn test_lookup_tables() {
        assert_eq!(lookup_builtin("break"), Some((BuiltinKind::Break, true)));
        assert_eq!(lookup_builtin("true"), Some((BuiltinKind::True, false)));
        assert_eq!(lookup_builtin("."), Some((BuiltinKind::Dot, true)));
        assert_eq!(lookup_builtin("command"), Some((BuiltinKind::Command, false)));
        assert_eq!(lookup_builtin("ls"), None);
    }

    #[test]
    fn test_trivial_builtins() {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        let argv = vec!["x".to_string()];
        assert_eq!(run_builtin(BuiltinKind::True, &ev, &mut st, &argv).unwrap(), 0);
        assert_eq!(run_builtin(BuiltinKind::Colon, &ev, &mut st, &argv).unwrap(), 0);
        assert_eq!(run_builtin(BuiltinKind::False, &ev, &mut st, &argv).unwrap(), 1);
        assert_eq!(run_builtin(BuiltinKind::Wait, &ev, &mut st, &argv).unwrap(), 0);
    }

    #[test]
    fn test_empty_command_reports_back_status() {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        st.back_exit_status = 3;
        let argv = Vec::new();
        assert_eq!(run_builtin(BuiltinKind::Empty, &ev, &mut st, &argv).unwrap(), 3);
    }

    #[test]
    fn test_number() {
        assert_eq!(number("42").unwrap(), 42);
        assert_eq!(number(" 7 ").unwrap(), 7);
        assert!(number("abc").is_err());
        assert!(number("").is_err());
    }
}
