//! . (dot) - read commands from a file in the current environment
//!
//! The operand is searched for on `PATH` unless it contains a slash;
//! directories and block devices are rejected. While the file runs,
//! `dot_func_nest` records the function nesting level at entry so that
//! `return` can tell a function return from a file abort.

use crate::fs::resolve_path;
use crate::interpreter::errors::{EvalResult, ShellException};
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::skip::SkipKind;
use crate::interpreter::types::ShellState;

pub fn dot_cmd(ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    state.exit_status = 0;

    let mut operands = &argv[1..];
    if operands.first().map(|s| s.as_str()) == Some("--") {
        operands = &operands[1..];
    }
    let name = match operands.first() {
        Some(name) => name,
        None => return Ok(0),
    };

    let fullname = find_dot_file(ev, state, name)?;
    let content = ev
        .fs
        .read_file(&fullname)
        .map_err(|e| ShellException::error(format!("{}: {}", fullname, e)))?;

    let saved_command_name = state.command_name.clone();
    let saved_dot_funcnest = state.dot_func_nest;
    state.command_name = fullname;
    state.dot_func_nest = state.func_nest + 1;

    let result = ev.eval_file_contents(state, &content);

    state.dot_func_nest = saved_dot_funcnest;
    state.command_name = saved_command_name;
    result?;

    // `return` at the file's own level lands here.
    if state.skip.current() == SkipKind::FileAbort {
        state.skip.stop();
    }
    Ok(state.exit_status)
}

/// Locate a dot-script operand. Names with a slash are used directly
/// (after the directory and block-device checks); bare names are searched
/// for on `PATH` with the same checks applied to each hit.
pub fn find_dot_file(ev: &Evaluator, state: &ShellState, basename: &str) -> EvalResult<String> {
    if basename.contains('/') {
        let path = resolve_path(&state.cwd, basename);
        if let Ok(meta) = ev.fs.metadata(&path) {
            if meta.is_dir() {
                return Err(ShellException::error(format!("{}: is a directory", basename)));
            }
            if meta.is_block_device() {
                return Err(ShellException::error(format!("{}: is a block device", basename)));
            }
            return Ok(path);
        }
    } else {
        for dir in state.pathval().split(':').filter(|d| !d.is_empty()) {
            let full = format!("{}/{}", dir.trim_end_matches('/'), basename);
            let full = resolve_path(&state.cwd, &full);
            if let Ok(meta) = ev.fs.metadata(&full) {
                if meta.is_dir() || meta.is_block_device() {
                    continue;
                }
                return Ok(full);
            }
        }
    }
    Err(ShellException::error(format!("{}: not found", basename)))
}
