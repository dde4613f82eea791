//! cd / pwd - working directory builtins

use crate::fs::resolve_path;
use crate::interpreter::errors::{EvalResult, ShellException};
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::types::ShellState;

pub fn cd_cmd(ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    let operand = argv.get(1).map(|s| s.as_str());
    let mut print_target = false;
    let target = match operand {
        None => state
            .vars
            .get("HOME")
            .map(|s| s.to_string())
            .ok_or_else(|| ShellException::error("HOME not set"))?,
        Some("-") => {
            print_target = true;
            state
                .vars
                .get("OLDPWD")
                .map(|s| s.to_string())
                .ok_or_else(|| ShellException::error("OLDPWD not set"))?
        }
        Some(dir) => dir.to_string(),
    };

    let new_cwd = resolve_path(&state.cwd, &target);
    match ev.fs.metadata(&new_cwd) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(ShellException::error(format!("{}: Not a directory", target))),
        Err(_) => {
            return Err(ShellException::error(format!(
                "{}: No such file or directory",
                target
            )))
        }
    }

    let old = state.cwd.clone();
    state.cwd = new_cwd.clone();
    let _ = state.vars.set("OLDPWD", &old);
    let _ = state.vars.set("PWD", &new_cwd);
    if print_target {
        ev.out1(state, &format!("{}\n", new_cwd))?;
    }
    Ok(0)
}

pub fn pwd_cmd(ev: &Evaluator, state: &mut ShellState, _argv: &[String]) -> EvalResult<i32> {
    let cwd = format!("{}\n", state.cwd);
    ev.out1(state, &cwd)?;
    Ok(0)
}
