//! eval - run its arguments as shell input
//!
//! Concatenates the arguments with single spaces and feeds the result
//! back through the string evaluator in the current shell environment.
//! The tested bit of the invoking context is inherited so that
//! `if eval false; then ...` does not trip `-e`.

use crate::interpreter::errors::EvalResult;
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::types::{EvalFlags, ShellState};

pub fn eval_cmd(ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    if argv.len() <= 1 {
        state.exit_status = 0;
        return Ok(0);
    }
    let src = argv[1..].join(" ");
    let flags = EvalFlags { exit: false, tested: state.builtin_flags.tested };
    ev.eval_string(state, &src, flags)?;
    Ok(state.exit_status)
}
