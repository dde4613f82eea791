//! Command Resolution
//!
//! Command search over builtins, functions, and `PATH`, with the location
//! cache behind the `hash` builtin, plus `shellexec`, which actually runs
//! an external command and never returns: its result is always the
//! terminal exception of the calling child.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::commands::CommandContext;
use crate::fs::{resolve_path, FileKind};
use crate::interpreter::builtins::{lookup_builtin, BuiltinKind};
use crate::interpreter::errors::ShellException;
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::functions::FuncDef;
use crate::interpreter::redirections::{read_fd, write_fd};
use crate::interpreter::types::ShellState;

/// Suppress function lookup (the `command` builtin's doing).
pub const DO_NOFUNC: u8 = 1;

/// Result of command search.
#[derive(Debug, Clone)]
pub enum CmdEntry {
    Function(Rc<FuncDef>),
    Builtin(BuiltinKind),
    SpecialBuiltin(BuiltinKind),
    Normal { path: String },
    Unknown,
}

impl CmdEntry {
    pub fn builtin_kind(&self) -> Option<BuiltinKind> {
        match self {
            CmdEntry::Builtin(kind) | CmdEntry::SpecialBuiltin(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// Location cache for external commands, keyed by bare name.
#[derive(Debug, Clone, Default)]
pub struct CommandHash {
    table: BTreeMap<String, String>,
}

impl CommandHash {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.table.get(name).map(|s| s.as_str())
    }

    pub fn insert(&mut self, name: &str, path: &str) {
        self.table.insert(name.to_string(), path.to_string());
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.table.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Directories whose contents include the registered commands.
fn is_system_dir(dir: &str) -> bool {
    matches!(dir.trim_end_matches('/'), "/bin" | "/usr/bin")
}

/// The fixed path `command -p` searches.
pub fn syspath() -> &'static str {
    "/bin:/usr/bin"
}

/// Locate a command. The search order is special builtins, functions
/// (unless suppressed), regular builtins, then `PATH`; hits on the
/// default path are cached.
pub fn find_command(
    ev: &Evaluator,
    state: &mut ShellState,
    name: &str,
    cmd_flags: u8,
    path: &str,
) -> CmdEntry {
    if name.contains('/') {
        return CmdEntry::Normal { path: name.to_string() };
    }

    if let Some((kind, special)) = lookup_builtin(name) {
        if special {
            return CmdEntry::SpecialBuiltin(kind);
        }
        if cmd_flags & DO_NOFUNC == 0 {
            if let Some(func) = state.functions.get(name) {
                return CmdEntry::Function(func);
            }
        }
        return CmdEntry::Builtin(kind);
    }
    if cmd_flags & DO_NOFUNC == 0 {
        if let Some(func) = state.functions.get(name) {
            return CmdEntry::Function(func);
        }
    }

    let cacheable = path == state.pathval();
    if cacheable {
        if let Some(hit) = state.cmd_hash.get(name) {
            return CmdEntry::Normal { path: hit.to_string() };
        }
    }

    for dir in path.split(':').filter(|d| !d.is_empty()) {
        let full = format!("{}/{}", dir.trim_end_matches('/'), name);
        let found = (is_system_dir(dir) && ev.registry.contains(name))
            || matches!(
                ev.fs.metadata(&resolve_path(&state.cwd, &full)),
                Ok(meta) if meta.kind == FileKind::File && meta.executable
            );
        if found {
            if cacheable {
                state.cmd_hash.insert(name, &full);
            }
            return CmdEntry::Normal { path: full };
        }
    }
    CmdEntry::Unknown
}

/// Pre-locate a pipeline stage's command before forking, so the location
/// lands in the parent's cache too.
pub fn prehash(ev: &Evaluator, state: &mut ShellState, node: &crate::ast::types::Node) {
    if let crate::ast::types::Node::Cmd(cmd) = node {
        if let Some(name) = cmd.args.first().and_then(|w| w.as_literal()) {
            if crate::interpreter::word_expansion::good_name(name) {
                let path = state.pathval();
                let _ = find_command(ev, state, name, 0, &path);
            }
        }
    }
}

/// The environment an external command receives: exported variables with
/// the command's assignment prefix layered on top, sorted.
pub fn environment(state: &ShellState) -> Vec<(String, String)> {
    let mut env: BTreeMap<String, String> = state.vars.exported_pairs().into_iter().collect();
    for text in &state.cmd_environ {
        if let Some((name, value)) = crate::interpreter::variables::split_assignment(text) {
            env.insert(name.to_string(), value.to_string());
        }
    }
    env.into_iter().collect()
}

impl Evaluator<'_> {
    /// Execute an external command in the current (child) state. Never
    /// returns normally: a registered command or script runs to completion
    /// and the result is an exit exception; failure to execute is an exec
    /// exception with the prescribed 126/127 status.
    pub fn shellexec(
        &self,
        state: &mut ShellState,
        argv: &[String],
        env: Vec<(String, String)>,
        path: &str,
    ) -> ShellException {
        let name = &argv[0];

        if name.contains('/') {
            let full = resolve_path(&state.cwd, name);
            return self.exec_candidate(state, &full, name, argv, env);
        }

        for dir in path.split(':').filter(|d| !d.is_empty()) {
            if is_system_dir(dir) && self.registry.contains(name) {
                return self.exec_registered(state, name, argv, env);
            }
            let full = format!("{}/{}", dir.trim_end_matches('/'), name);
            let full = resolve_path(&state.cwd, &full);
            if self.fs.exists(&full) {
                return self.exec_candidate(state, &full, name, argv, env);
            }
        }
        ShellException::not_found(name)
    }

    fn exec_candidate(
        &self,
        state: &mut ShellState,
        full: &str,
        name: &str,
        argv: &[String],
        env: Vec<(String, String)>,
    ) -> ShellException {
        match self.fs.metadata(full) {
            Ok(meta) if meta.kind == FileKind::File && meta.executable => {
                self.exec_script(state, full, argv, env)
            }
            Ok(meta) if meta.kind == FileKind::Dir => {
                ShellException::not_executable(name, "Is a directory")
            }
            Ok(_) => ShellException::not_executable(name, "Permission denied"),
            Err(_) => ShellException::not_found(name),
        }
    }

    /// Run a registered command with the child's descriptors.
    fn exec_registered(
        &self,
        state: &mut ShellState,
        name: &str,
        argv: &[String],
        env: Vec<(String, String)>,
    ) -> ShellException {
        let stdin = match read_fd(self.fs, &state.io, 0) {
            Ok(s) => s,
            Err(e) => return e,
        };
        let ctx = CommandContext { fs: self.fs, cwd: state.cwd.clone(), env, stdin };
        let command = match self.registry.get(name) {
            Some(c) => c,
            None => return ShellException::not_found(name),
        };
        let result = command.execute(&ctx, &argv[1..]);
        if let Err(e) = write_fd(self.fs, &mut state.io, 1, &result.stdout) {
            return e;
        }
        if let Err(e) = write_fd(self.fs, &mut state.io, 2, &result.stderr) {
            return e;
        }
        ShellException::Exit(result.exit_code)
    }

    /// Execute a script file the way an interpreter line would: a fresh
    /// shell over the same descriptors, seeing only the exported
    /// environment.
    fn exec_script(
        &self,
        state: &mut ShellState,
        full: &str,
        argv: &[String],
        env: Vec<(String, String)>,
    ) -> ShellException {
        let content = match self.fs.read_file(full) {
            Ok(c) => c,
            Err(_) => return ShellException::not_executable(&argv[0], "Permission denied"),
        };
        let mut script_state = ShellState::new();
        script_state.command_name = full.to_string();
        script_state.param.params = argv[1..].to_vec();
        script_state.cwd = state.cwd.clone();
        script_state.io = std::mem::take(&mut state.io);
        for (name, value) in env {
            let _ = script_state.vars.set_exported(&name, &value);
        }

        let result = self.eval_file_contents(&mut script_state, &content);
        let status = match result {
            Ok(()) => script_state.exit_status,
            Err(ShellException::Exit(s)) => s,
            Err(e) => {
                let diag = format!("{}: {}\n", script_state.command_name, e);
                script_state.io.stderr.push_str(&diag);
                2
            }
        };
        state.io = std::mem::take(&mut script_state.io);
        ShellException::Exit(status)
    }
}
