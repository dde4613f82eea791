//! unset - remove variables or functions

use crate::interpreter::errors::EvalResult;
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::types::ShellState;

pub fn unset_cmd(_ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    let mut functions = false;
    let mut operands: Vec<&String> = Vec::new();
    for arg in &argv[1..] {
        match arg.as_str() {
            "-f" => functions = true,
            "-v" => functions = false,
            _ => operands.push(arg),
        }
    }
    for name in operands {
        if functions {
            state.functions.unset(name);
        } else {
            state.vars.unset(name)?;
        }
    }
    Ok(0)
}
