//! export / readonly - variable attribute builtins
//!
//! One implementation for both: the attribute set depends on the name
//! the command was invoked under. `-p` prints the marked variables in a
//! form that can be re-read.

use crate::interpreter::errors::{EvalResult, ShellException};
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::types::ShellState;
use crate::interpreter::variables::split_assignment;
use crate::interpreter::word_expansion::{good_name, sh_quote};

pub fn export_cmd(ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    let readonly = argv[0].starts_with('r');
    let mut operands = &argv[1..];
    let print_only = operands.first().map(|s| s.as_str()) == Some("-p");
    if print_only {
        operands = &operands[1..];
    }

    if operands.is_empty() || print_only {
        let mut out = String::new();
        for (name, value) in state.vars.all_pairs() {
            let var = match state.vars.get_var(&name) {
                Some(v) => v,
                None => continue,
            };
            let marked = if readonly { var.readonly } else { var.exported };
            if marked {
                out.push_str(&format!("{} {}={}\n", argv[0], name, sh_quote(&value)));
            }
        }
        ev.out1(state, &out)?;
        return Ok(0);
    }

    for operand in operands {
        match split_assignment(operand) {
            Some((name, value)) => {
                state.vars.set(name, value)?;
                if readonly {
                    state.vars.make_readonly(name);
                } else {
                    state.vars.export(name);
                }
            }
            None => {
                if !good_name(operand) {
                    return Err(ShellException::error(format!(
                        "{}: bad variable name",
                        operand
                    )));
                }
                if readonly {
                    state.vars.make_readonly(operand);
                } else {
                    state.vars.export(operand);
                }
            }
        }
    }
    Ok(0)
}
