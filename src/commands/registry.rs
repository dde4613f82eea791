//! Command registry
//!
//! Name-to-implementation table for external commands. Iteration order is
//! insertion order, which keeps listings and tests deterministic.

use indexmap::IndexMap;

use crate::commands::{cat_cmd::CatCommand, env_cmd::EnvCommand, grep_cmd::GrepCommand, Command};

pub struct CommandRegistry {
    commands: IndexMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self { commands: IndexMap::new() }
    }

    /// The standard complement of commands every sandbox gets.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(EnvCommand));
        registry.register(Box::new(CatCommand));
        registry.register(Box::new(GrepCommand));
        registry
    }

    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_registered() {
        let registry = CommandRegistry::with_defaults();
        assert!(registry.contains("env"));
        assert!(registry.contains("cat"));
        assert!(registry.contains("grep"));
        assert!(!registry.contains("frobnicate"));
    }

    #[test]
    fn test_names_in_insertion_order() {
        let registry = CommandRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["env", "cat", "grep"]);
    }
}
