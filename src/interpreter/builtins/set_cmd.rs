//! set - change option flags or positional parameters

use crate::interpreter::errors::{EvalResult, ShellException};
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::types::ShellState;

pub fn set_cmd(ev: &Evaluator, state: &mut ShellState, argv: &[String]) -> EvalResult<i32> {
    if argv.len() == 1 {
        let mut out = String::new();
        for (name, value) in state.vars.all_pairs() {
            out.push_str(&format!(
                "{}={}\n",
                name,
                crate::interpreter::word_expansion::sh_quote(&value)
            ));
        }
        ev.out1(state, &out)?;
        return Ok(0);
    }

    let mut i = 1;
    let mut set_params: Option<usize> = None;
    while i < argv.len() {
        let arg = &argv[i];
        let (on, letters) = match arg.as_str() {
            "--" => {
                set_params = Some(i + 1);
                break;
            }
            s if s.starts_with('-') && s.len() > 1 => (true, &s[1..]),
            s if s.starts_with('+') && s.len() > 1 => (false, &s[1..]),
            _ => {
                set_params = Some(i);
                break;
            }
        };
        let mut chars = letters.chars();
        while let Some(c) = chars.next() {
            if c == 'o' {
                // Long-form option; the name is the rest of this argument
                // or the next one.
                let rest: String = chars.collect();
                let name = if !rest.is_empty() {
                    rest
                } else {
                    i += 1;
                    match argv.get(i) {
                        Some(n) => n.clone(),
                        None => {
                            return Err(ShellException::error("set: -o requires an argument"))
                        }
                    }
                };
                if !state.options.apply_long(&name, on) {
                    return Err(ShellException::error(format!("Illegal option -o {}", name)));
                }
                break;
            }
            if !state.options.apply(c, on) {
                return Err(ShellException::error(format!(
                    "Illegal option {}{}",
                    if on { '-' } else { '+' },
                    c
                )));
            }
        }
        i += 1;
    }

    if let Some(start) = set_params {
        state.param.params = argv[start..].to_vec();
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::test_support::harness;

    fn run(st: &mut ShellState, args: &[&str]) -> EvalResult<i32> {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        let argv: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        set_cmd(&ev, st, &argv)
    }

    #[test]
    fn test_set_flags() {
        let mut st = ShellState::new();
        run(&mut st, &["set", "-ex"]).unwrap();
        assert!(st.options.errexit && st.options.xtrace);
        run(&mut st, &["set", "+e"]).unwrap();
        assert!(!st.options.errexit && st.options.xtrace);
    }

    #[test]
    fn test_set_long_option() {
        let mut st = ShellState::new();
        run(&mut st, &["set", "-o", "nounset"]).unwrap();
        assert!(st.options.nounset);
        run(&mut st, &["set", "+o", "nounset"]).unwrap();
        assert!(!st.options.nounset);
    }

    #[test]
    fn test_set_positional_params() {
        let mut st = ShellState::new();
        run(&mut st, &["set", "--", "a", "b"]).unwrap();
        assert_eq!(st.param.params, vec!["a", "b"]);
        run(&mut st, &["set", "c"]).unwrap();
        assert_eq!(st.param.params, vec!["c"]);
    }

    #[test]
    fn test_set_unknown_option() {
        let mut st = ShellState::new();
        assert!(run(&mut st, &["set", "-Q"]).is_err());
    }

    #[test]
    fn test_set_prints_variables() {
        let mut st = ShellState::new();
        st.vars.set("greeting", "hello world").unwrap();
        run(&mut st, &["set"]).unwrap();
        assert!(st.io.stdout.contains("greeting='hello world'"));
    }
}
