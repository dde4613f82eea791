//! grep - print lines matching a pattern

use regex_lite::Regex;

use crate::commands::{Command, CommandContext, CommandResult};
use crate::fs::resolve_path;

pub struct GrepCommand;

impl Command for GrepCommand {
    fn name(&self) -> &str {
        "grep"
    }

    fn execute(&self, ctx: &CommandContext, args: &[String]) -> CommandResult {
        let mut invert = false;
        let mut operands: Vec<&String> = Vec::new();
        for arg in args {
            match arg.as_str() {
                "-v" => invert = true,
                _ => operands.push(arg),
            }
        }
        let pattern = match operands.first() {
            Some(p) => p.as_str(),
            None => return CommandResult::failure("usage: grep [-v] pattern [file...]\n", 2),
        };
        let re = match Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => return CommandResult::failure(format!("grep: bad pattern: {}\n", e), 2),
        };

        let mut input = String::new();
        let mut err = String::new();
        if operands.len() > 1 {
            for file in &operands[1..] {
                match ctx.fs.read_file(&resolve_path(&ctx.cwd, file)) {
                    Ok(content) => input.push_str(&content),
                    Err(e) => err.push_str(&format!("grep: {}: {}\n", file, e)),
                }
            }
        } else {
            input = ctx.stdin.clone();
        }

        let mut out = String::new();
        let mut matched = false;
        for line in input.lines() {
            if re.is_match(line) != invert {
                matched = true;
                out.push_str(line);
                out.push('\n');
            }
        }
        CommandResult { stdout: out, stderr: err, exit_code: if matched { 0 } else { 1 } }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemFs;

    fn run(stdin: &str, args: &[&str]) -> CommandResult {
        let fs = MemFs::new();
        let ctx = CommandContext {
            fs: &fs,
            cwd: "/".to_string(),
            env: vec![],
            stdin: stdin.to_string(),
        };
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        GrepCommand.execute(&ctx, &args)
    }

    #[test]
    fn test_match_lines() {
        let res = run("x=1\ny=2\nz=3\n", &["^[xy]="]);
        assert_eq!(res.stdout, "x=1\ny=2\n");
        assert_eq!(res.exit_code, 0);
    }

    #[test]
    fn test_no_match_status() {
        let res = run("abc\n", &["zzz"]);
        assert_eq!(res.exit_code, 1);
        assert!(res.stdout.is_empty());
    }

    #[test]
    fn test_invert() {
        let res = run("a\nb\n", &["-v", "a"]);
        assert_eq!(res.stdout, "b\n");
    }
}
