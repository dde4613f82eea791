//! local - function-scope variables

use crate::interpreter::errors::{EvalResult, ShellException};
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::types::ShellState;
use crate::interpreter::variables::mk_local;

pub fn local_cmd(_ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    if state.func_nest == 0 {
        return Err(ShellException::error("not in a function"));
    }
    let mut frame = match state.locals.pop() {
        Some(frame) => frame,
        None => return Err(ShellException::error("not in a function")),
    };
    let mut result = Ok(0);
    for operand in &argv[1..] {
        if let Err(e) = mk_local(&mut state.vars, &mut frame, operand, false) {
            result = Err(e);
            break;
        }
    }
    state.locals.push(frame);
    result
}
