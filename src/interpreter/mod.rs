//! Interpreter module
//!
//! The command evaluator and its collaborators.

pub mod builtins;
pub mod command_resolution;
pub mod control_flow;
pub mod errors;
pub mod execution_engine;
pub mod functions;
pub mod jobs;
pub mod pipeline_execution;
pub mod redirections;
pub mod simple_command;
pub mod skip;
pub mod subshell_group;
pub mod trap;
pub mod types;
pub mod variables;
pub mod word_expansion;

pub use errors::{EvalResult, ShellException};
pub use execution_engine::Evaluator;
pub use skip::{SkipKind, SkipState};
pub use types::{EvalFlags, ExecResult, ExecutionLimits, ShellOptions, ShellState};

#[cfg(test)]
pub mod test_support {
    use crate::commands::CommandRegistry;
    use crate::fs::MemFs;
    use crate::interpreter::types::ExecutionLimits;

    /// The pieces an `Evaluator` borrows, with the default command set.
    pub fn harness() -> (MemFs, CommandRegistry, ExecutionLimits) {
        (MemFs::new(), CommandRegistry::with_defaults(), ExecutionLimits::default())
    }
}
