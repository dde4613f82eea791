//! cat - concatenate files to standard output

use crate::commands::{Command, CommandContext, CommandResult};
use crate::fs::resolve_path;

pub struct CatCommand;

impl Command for CatCommand {
    fn name(&self) -> &str {
        "cat"
    }

    fn execute(&self, ctx: &CommandContext, args: &[String]) -> CommandResult {
        if args.is_empty() {
            return CommandResult::ok(ctx.stdin.clone());
        }
        let mut out = String::new();
        let mut status = 0;
        let mut err = String::new();
        for arg in args {
            if arg == "-" {
                out.push_str(&ctx.stdin);
                continue;
            }
            let path = resolve_path(&ctx.cwd, arg);
            match ctx.fs.read_file(&path) {
                Ok(content) => out.push_str(&content),
                Err(e) => {
                    err.push_str(&format!("cat: {}: {}\n", arg, e));
                    status = 1;
                }
            }
        }
        CommandResult { stdout: out, stderr: err, exit_code: status }
    }
}
