//! trap - set or list signal actions
//!
//! Running `trap` is also the one command allowed to touch a forked
//! child's inherited-but-invalid traps: modifying the table revalidates
//! it (the table zeroes the stale entries itself).

use crate::interpreter::errors::{EvalResult, ShellException};
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::trap::trap_condition;
use crate::interpreter::types::ShellState;

pub fn trap_cmd(ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    let mut operands = &argv[1..];
    if operands.first().map(|s| s.as_str()) == Some("--") {
        operands = &operands[1..];
    }

    if operands.is_empty() {
        let listing = state.traps.listing();
        ev.out1(state, &listing)?;
        return Ok(0);
    }

    // A numeric first operand makes every operand a condition to reset;
    // `-` resets the conditions that follow; anything else is the action.
    let first = &operands[0];
    let (action, conds): (Option<String>, &[String]) =
        if !first.is_empty() && first.chars().all(|c| c.is_ascii_digit()) {
            (None, operands)
        } else if first == "-" {
            (None, &operands[1..])
        } else {
            (Some(first.clone()), &operands[1..])
        };

    if conds.is_empty() {
        return Err(ShellException::error("trap: condition expected"));
    }
    for cond in conds {
        let cond = trap_condition(cond)
            .ok_or_else(|| ShellException::error(format!("{}: bad trap", cond)))?;
        state.traps.set_action(&cond, action.clone());
    }
    Ok(0)
}
