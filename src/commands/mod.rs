//! External commands
//!
//! Registry of in-process implementations standing in for the binaries a
//! real shell would `execve`. They are reached only through `PATH` search
//! (conceptually they live in `/bin` and `/usr/bin`) and run with an
//! explicit environment, working directory, and stdin, exactly like a
//! spawned process.

pub mod cat_cmd;
pub mod env_cmd;
pub mod grep_cmd;
pub mod registry;

pub use registry::CommandRegistry;

use crate::fs::Fs;

/// What a command sees when it runs: its environment, not the shell's.
pub struct CommandContext<'a> {
    pub fs: &'a dyn Fs,
    pub cwd: String,
    /// Exported environment, sorted by name.
    pub env: Vec<(String, String)>,
    pub stdin: String,
}

impl CommandContext<'_> {
    pub fn env_get(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Result of running an external command.
#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self { stdout: stdout.into(), stderr: String::new(), exit_code: 0 }
    }

    pub fn failure(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self { stdout: String::new(), stderr: stderr.into(), exit_code }
    }
}

/// An external command implementation.
pub trait Command: Send + Sync {
    fn name(&self) -> &str;
    fn execute(&self, ctx: &CommandContext, args: &[String]) -> CommandResult;
}
