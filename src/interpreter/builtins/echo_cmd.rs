//! echo - write arguments to standard output

use crate::interpreter::errors::EvalResult;
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::types::ShellState;

pub fn echo_cmd(ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    let mut args = &argv[1..];
    let newline = if args.first().map(|s| s.as_str()) == Some("-n") {
        args = &args[1..];
        false
    } else {
        true
    };
    let mut out = args.join(" ");
    if newline {
        out.push('\n');
    }
    ev.out1(state, &out)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::test_support::harness;

    fn run(st: &mut ShellState, args: &[&str]) -> i32 {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        let argv: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        echo_cmd(&ev, st, &argv).unwrap()
    }

    #[test]
    fn test_echo() {
        let mut st = ShellState::new();
        assert_eq!(run(&mut st, &["echo", "a", "b"]), 0);
        assert_eq!(st.io.stdout, "a b\n");
    }

    #[test]
    fn test_echo_n() {
        let mut st = ShellState::new();
        run(&mut st, &["echo", "-n", "x"]);
        assert_eq!(st.io.stdout, "x");
    }

    #[test]
    fn test_echo_empty() {
        let mut st = ShellState::new();
        run(&mut st, &["echo"]);
        assert_eq!(st.io.stdout, "\n");
    }
}
