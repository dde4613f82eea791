//! exit - terminate the shell

use crate::interpreter::builtins::number;
use crate::interpreter::errors::{EvalResult, ShellException};
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::types::ShellState;

pub fn exit_cmd(_ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    let status = match argv.get(1) {
        Some(arg) => (number(arg)? % 256).rem_euclid(256) as i32,
        None => state.exit_status,
    };
    Err(ShellException::Exit(status))
}
