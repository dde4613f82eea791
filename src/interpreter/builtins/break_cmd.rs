//! break / continue - loop control builtins
//!
//! Both set the skip latch; the loop evaluators observe it and unwind.
//! The count is clamped to the current loop nesting, so `break 10` inside
//! one loop leaves exactly that loop. Breaking out of more loops than
//! exist is not an error, matching the standard shell; a non-positive
//! count is.

use crate::interpreter::builtins::number;
use crate::interpreter::errors::{EvalResult, ShellException};
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::skip::SkipKind;
use crate::interpreter::types::ShellState;

/// Handles both `break` and `continue`; which one is decided by the name
/// the command was invoked under.
pub fn break_cmd(_ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    let n = match argv.get(1) {
        Some(arg) => number(arg)?,
        None => 1,
    };
    if n <= 0 {
        return Err(ShellException::error(format!("invalid count: {}", n)));
    }
    let mut n = n as u32;
    if n > state.loop_nest {
        n = state.loop_nest;
    }
    if n > 0 {
        let kind = if argv[0].starts_with('c') { SkipKind::Continue } else { SkipKind::Break };
        state.skip.begin(kind, n);
    }
    Ok(0)
}
