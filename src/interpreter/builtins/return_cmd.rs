//! return - stop the current function or dot script
//!
//! Inside a function, pops exactly one function level. Inside a dot
//! script the behavior depends on where the `return` sits: nested in a
//! function defined there it still returns from the function; at the
//! script's own level it aborts the file. At top level the return is
//! silently ignored and reports success.

use crate::interpreter::builtins::number;
use crate::interpreter::errors::EvalResult;
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::skip::SkipKind;
use crate::interpreter::types::ShellState;

pub fn return_cmd(_ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    let mut ret = match argv.get(1) {
        Some(arg) => number(arg)? as i32,
        None => state.exit_status,
    };

    let in_function = state.dot_func_nest == 0 && state.func_nest > 0;
    let in_dot_function =
        state.dot_func_nest > 0 && state.func_nest > state.dot_func_nest.saturating_sub(1);

    if in_function || in_dot_function {
        state.skip.begin(SkipKind::FuncReturn, 1);
    } else if state.dot_func_nest > 0 {
        state.skip.begin(SkipKind::FileAbort, 1);
    } else {
        ret = 0;
    }
    Ok(ret)
}
