//! Variable store
//!
//! Flat variable table with export and readonly attributes, the positional
//! parameter block, and the local-variable frames used by function calls.
//! Assignments that must not survive a command (`FOO=bar cmd` in front of a
//! regular builtin) never reach the table; the caller keeps them in the
//! command environment instead.

use std::collections::HashMap;

use crate::interpreter::errors::{EvalResult, ShellException};

#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    pub value: String,
    pub exported: bool,
    pub readonly: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VarTable {
    map: HashMap<String, Var>,
}

impl VarTable {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(|v| v.value.as_str())
    }

    pub fn get_var(&self, name: &str) -> Option<&Var> {
        self.map.get(name)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn is_readonly(&self, name: &str) -> bool {
        self.map.get(name).map(|v| v.readonly).unwrap_or(false)
    }

    /// Set a variable, preserving its attributes.
    pub fn set(&mut self, name: &str, value: &str) -> EvalResult {
        match self.map.get_mut(name) {
            Some(var) => {
                if var.readonly {
                    return Err(ShellException::error(format!("{}: is read only", name)));
                }
                var.value = value.to_string();
            }
            None => {
                self.map.insert(
                    name.to_string(),
                    Var { value: value.to_string(), exported: false, readonly: false },
                );
            }
        }
        Ok(())
    }

    pub fn set_exported(&mut self, name: &str, value: &str) -> EvalResult {
        self.set(name, value)?;
        self.export(name);
        Ok(())
    }

    /// Mark a variable exported, creating it empty if needed.
    pub fn export(&mut self, name: &str) {
        self.map
            .entry(name.to_string())
            .or_insert_with(|| Var { value: String::new(), exported: false, readonly: false })
            .exported = true;
    }

    pub fn make_readonly(&mut self, name: &str) {
        self.map
            .entry(name.to_string())
            .or_insert_with(|| Var { value: String::new(), exported: false, readonly: false })
            .readonly = true;
    }

    pub fn unset(&mut self, name: &str) -> EvalResult {
        if self.is_readonly(name) {
            return Err(ShellException::error(format!("{}: is read only", name)));
        }
        self.map.remove(name);
        Ok(())
    }

    /// Raw replacement used by local-scope restore; bypasses readonly.
    pub fn put_var(&mut self, name: &str, var: Option<Var>) {
        match var {
            Some(v) => {
                self.map.insert(name.to_string(), v);
            }
            None => {
                self.map.remove(name);
            }
        }
    }

    /// `name=value` pairs of exported variables, sorted by name.
    pub fn exported_pairs(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .map
            .iter()
            .filter(|(_, v)| v.exported)
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect();
        out.sort();
        out
    }

    /// All `name=value` pairs, sorted by name.
    pub fn all_pairs(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> =
            self.map.iter().map(|(k, v)| (k.clone(), v.value.clone())).collect();
        out.sort();
        out
    }
}

/// Split `NAME=value` text; `None` when the text is not an assignment.
pub fn split_assignment(text: &str) -> Option<(&str, &str)> {
    let eq = text.find('=')?;
    let name = &text[..eq];
    if crate::interpreter::word_expansion::good_name(name) {
        Some((name, &text[eq + 1..]))
    } else {
        None
    }
}

/// Apply a `name=value` string to the table.
pub fn set_var_eq(table: &mut VarTable, text: &str, export: bool) -> EvalResult {
    match split_assignment(text) {
        Some((name, value)) => {
            if export {
                table.set_exported(name, value)
            } else {
                table.set(name, value)
            }
        }
        None => Err(ShellException::error(format!("{}: bad variable name", text))),
    }
}

/// Apply a command's assignment prefix. Special builtins persist the
/// assignments; for regular builtins the caller passes `persist = false`
/// and the values live only in the command environment.
pub fn list_set_var(table: &mut VarTable, list: &[String], persist: bool) -> EvalResult {
    if !persist {
        // Readonly violations are still diagnosed even when nothing is set.
        for text in list {
            if let Some((name, _)) = split_assignment(text) {
                if table.is_readonly(name) {
                    return Err(ShellException::error(format!("{}: is read only", name)));
                }
            }
        }
        return Ok(());
    }
    for text in list {
        set_var_eq(table, text, false)?;
    }
    Ok(())
}

// =============================================================================
// Positional parameters
// =============================================================================

/// The positional parameter block. Saved and restored wholesale around
/// function calls and `set --`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShellParam {
    pub params: Vec<String>,
}

impl ShellParam {
    pub fn new(params: Vec<String>) -> Self {
        Self { params }
    }

    pub fn count(&self) -> usize {
        self.params.len()
    }

    /// `$1` is index 1.
    pub fn get(&self, n: usize) -> Option<&str> {
        if n == 0 {
            return None;
        }
        self.params.get(n - 1).map(|s| s.as_str())
    }

    pub fn shift(&mut self, n: usize) -> bool {
        if n > self.params.len() {
            return false;
        }
        self.params.drain(..n);
        true
    }
}

// =============================================================================
// Local variables
// =============================================================================

#[derive(Debug, Clone)]
pub struct SavedLocal {
    pub name: String,
    pub prior: Option<Var>,
}

/// One function call's worth of local saves.
pub type LocalFrame = Vec<SavedLocal>;

/// Make `text` (`NAME` or `NAME=value`) local to the given frame, saving
/// the prior binding for restore.
pub fn mk_local(
    table: &mut VarTable,
    frame: &mut LocalFrame,
    text: &str,
    export: bool,
) -> EvalResult {
    let (name, value) = match split_assignment(text) {
        Some((name, value)) => (name, Some(value)),
        None => {
            if !crate::interpreter::word_expansion::good_name(text) {
                return Err(ShellException::error(format!("{}: bad variable name", text)));
            }
            (text, None)
        }
    };
    // Save only the outermost binding per frame.
    if !frame.iter().any(|s| s.name == name) {
        frame.push(SavedLocal { name: name.to_string(), prior: table.get_var(name).cloned() });
    }
    if let Some(value) = value {
        table.set(name, value)?;
    }
    if export {
        table.export(name);
    }
    Ok(())
}

/// Make every assignment in `list` local to the frame (function-call
/// variable prefix).
pub fn list_mk_local(
    table: &mut VarTable,
    frame: &mut LocalFrame,
    list: &[String],
    export: bool,
) -> EvalResult {
    for text in list {
        mk_local(table, frame, text, export)?;
    }
    Ok(())
}

/// Restore the bindings a frame shadowed.
pub fn pop_local_vars(table: &mut VarTable, frame: LocalFrame) {
    for saved in frame.into_iter().rev() {
        table.put_var(&saved.name, saved.prior);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_unset() {
        let mut t = VarTable::default();
        t.set("x", "1").unwrap();
        assert_eq!(t.get("x"), Some("1"));
        t.unset("x").unwrap();
        assert_eq!(t.get("x"), None);
    }

    #[test]
    fn test_readonly() {
        let mut t = VarTable::default();
        t.set("x", "1").unwrap();
        t.make_readonly("x");
        assert!(t.set("x", "2").is_err());
        assert!(t.unset("x").is_err());
        assert_eq!(t.get("x"), Some("1"));
    }

    #[test]
    fn test_exported_pairs_sorted() {
        let mut t = VarTable::default();
        t.set_exported("b", "2").unwrap();
        t.set_exported("a", "1").unwrap();
        t.set("c", "3").unwrap();
        assert_eq!(
            t.exported_pairs(),
            vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_split_assignment() {
        assert_eq!(split_assignment("x=1"), Some(("x", "1")));
        assert_eq!(split_assignment("_a=b=c"), Some(("_a", "b=c")));
        assert_eq!(split_assignment("1x=2"), None);
        assert_eq!(split_assignment("noeq"), None);
        assert_eq!(split_assignment("=v"), None);
    }

    #[test]
    fn test_list_set_var_persist_modes() {
        let mut t = VarTable::default();
        list_set_var(&mut t, &["x=1".to_string()], true).unwrap();
        assert_eq!(t.get("x"), Some("1"));
        list_set_var(&mut t, &["y=2".to_string()], false).unwrap();
        assert_eq!(t.get("y"), None);
    }

    #[test]
    fn test_shell_param() {
        let mut p = ShellParam::new(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(p.get(1), Some("a"));
        assert_eq!(p.get(0), None);
        assert!(p.shift(2));
        assert_eq!(p.get(1), Some("c"));
        assert!(!p.shift(5));
    }

    #[test]
    fn test_locals_restore() {
        let mut t = VarTable::default();
        t.set("x", "outer").unwrap();
        let mut frame = LocalFrame::new();
        mk_local(&mut t, &mut frame, "x=inner", false).unwrap();
        mk_local(&mut t, &mut frame, "y=local", false).unwrap();
        assert_eq!(t.get("x"), Some("inner"));
        assert_eq!(t.get("y"), Some("local"));
        pop_local_vars(&mut t, frame);
        assert_eq!(t.get("x"), Some("outer"));
        assert_eq!(t.get("y"), None);
    }

    #[test]
    fn test_local_without_value_keeps_visible_value() {
        let mut t = VarTable::default();
        t.set("x", "outer").unwrap();
        let mut frame = LocalFrame::new();
        mk_local(&mut t, &mut frame, "x", false).unwrap();
        assert_eq!(t.get("x"), Some("outer"));
        t.set("x", "changed").unwrap();
        pop_local_vars(&mut t, frame);
        assert_eq!(t.get("x"), Some("outer"));
    }
}
