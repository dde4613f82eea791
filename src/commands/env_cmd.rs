//! env - print the environment

use crate::commands::{Command, CommandContext, CommandResult};

pub struct EnvCommand;

impl Command for EnvCommand {
    fn name(&self) -> &str {
        "env"
    }

    fn execute(&self, ctx: &CommandContext, args: &[String]) -> CommandResult {
        if !args.is_empty() {
            return CommandResult::failure("env: running a command is not supported\n", 125);
        }
        let mut out = String::new();
        for (name, value) in &ctx.env {
            out.push_str(&format!("{}={}\n", name, value));
        }
        CommandResult::ok(out)
    }
}
