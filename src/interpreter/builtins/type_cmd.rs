//! type / hash - command classification and the location cache

use crate::interpreter::command_resolution::{find_command, CmdEntry, DO_NOFUNC};
use crate::interpreter::errors::EvalResult;
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::types::ShellState;

pub fn type_cmd(ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    let mut status = 0;
    let mut out = String::new();
    let path = state.pathval();
    for name in &argv[1..] {
        let entry = find_command(ev, state, name, 0, &path);
        match entry {
            CmdEntry::SpecialBuiltin(_) => {
                out.push_str(&format!("{} is a special shell builtin\n", name))
            }
            CmdEntry::Builtin(_) => out.push_str(&format!("{} is a shell builtin\n", name)),
            CmdEntry::Function(_) => out.push_str(&format!("{} is a shell function\n", name)),
            CmdEntry::Normal { path } => out.push_str(&format!("{} is {}\n", name, path)),
            CmdEntry::Unknown => {
                out.push_str(&format!("{}: not found\n", name));
                status = 127;
            }
        }
    }
    ev.out1(state, &out)?;
    Ok(status)
}

pub fn hash_cmd(ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    let mut operands: Vec<&String> = Vec::new();
    let mut clear = false;
    for arg in &argv[1..] {
        match arg.as_str() {
            "-r" => clear = true,
            _ => operands.push(arg),
        }
    }
    if clear {
        state.cmd_hash.clear();
    }
    if operands.is_empty() && !clear {
        let mut out = String::new();
        for (_, path) in state.cmd_hash.entries() {
            out.push_str(&format!("{}\n", path));
        }
        ev.out1(state, &out)?;
        return Ok(0);
    }
    let path = state.pathval();
    let mut status = 0;
    for name in operands {
        // Re-locating through the normal search primes the cache.
        match find_command(ev, state, name, DO_NOFUNC, &path) {
            CmdEntry::Unknown => {
                ev.out2(state, &format!("hash: {}: not found\n", name))?;
                status = 1;
            }
            _ => {}
        }
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::test_support::harness;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_type_classifications() {
        let (fs, reg, limits) = harness();
        fs.add_executable("/usr/bin/tool", "exit 0\n");
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        let status =
            type_cmd(&ev, &mut st, &argv(&["type", "break", "true", "tool", "ghost"])).unwrap();
        assert_eq!(status, 127);
        assert!(st.io.stdout.contains("break is a special shell builtin"));
        assert!(st.io.stdout.contains("true is a shell builtin"));
        assert!(st.io.stdout.contains("tool is /usr/bin/tool"));
        assert!(st.io.stdout.contains("ghost: not found"));
    }

    #[test]
    fn test_hash_primes_and_clears() {
        let (fs, reg, limits) = harness();
        fs.add_executable("/usr/bin/tool", "exit 0\n");
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        hash_cmd(&ev, &mut st, &argv(&["hash", "tool"])).unwrap();
        assert_eq!(st.cmd_hash.get("tool"), Some("/usr/bin/tool"));
        hash_cmd(&ev, &mut st, &argv(&["hash", "-r"])).unwrap();
        assert_eq!(st.cmd_hash.get("tool"), None);
    }

    #[test]
    fn test_hash_missing_command() {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        assert_eq!(hash_cmd(&ev, &mut st, &argv(&["hash", "ghost"])).unwrap(), 1);
        assert!(st.io.stderr.contains("ghost"));
    }
}
