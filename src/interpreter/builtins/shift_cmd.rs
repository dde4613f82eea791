//! shift - discard leading positional parameters

use crate::interpreter::builtins::number;
use crate::interpreter::errors::{EvalResult, ShellException};
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::types::ShellState;

pub fn shift_cmd(_ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    let n = match argv.get(1) {
        Some(arg) => number(arg)?,
        None => 1,
    };
    if n < 0 {
        return Err(ShellException::error(format!("invalid count: {}", n)));
    }
    if !state.param.shift(n as usize) {
        return Err(ShellException::error("can't shift that many"));
    }
    Ok(0)
}
