//! Function table
//!
//! Shell function definitions keyed by name. Bodies are reference-counted
//! so that a running function survives being redefined or unset mid-call;
//! the evaluator holds its own reference for the duration of the call.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::types::Node;

#[derive(Debug, PartialEq)]
pub struct FuncDef {
    pub name: String,
    pub body: Node,
    /// Line the definition appeared on; functions report line numbers
    /// relative to it.
    pub lineno: u32,
}

#[derive(Debug, Clone, Default)]
pub struct FuncTable {
    map: HashMap<String, Rc<FuncDef>>,
}

impl FuncTable {
    /// Register (or replace) a function definition.
    pub fn defun(&mut self, name: &str, body: &Node, lineno: u32) {
        self.map.insert(
            name.to_string(),
            Rc::new(FuncDef { name: name.to_string(), body: body.clone(), lineno }),
        );
    }

    /// A reference the caller may hold across the call; redefinition only
    /// drops the table's reference.
    pub fn get(&self, name: &str) -> Option<Rc<FuncDef>> {
        self.map.get(name).map(Rc::clone)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn unset(&mut self, name: &str) -> bool {
        self.map.remove(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.map.keys().cloned().collect();
        names.sort();
        names
    }
}
