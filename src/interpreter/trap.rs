//! Trap subsystem
//!
//! Trap action table plus the invalidation flag a forked child carries:
//! the child inherits the parent's trap strings but must drop them before
//! running anything other than `trap` itself (possibly wrapped in layers
//! of `eval` / `command`). The evaluator performs that zeroing lazily via
//! `free_traps`.
//!
//! There is no asynchronous signal delivery in the sandbox; `pending`
//! holds conditions raised programmatically and is drained at evaluator
//! exit, and the EXIT trap runs when the shell terminates.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct TrapTable {
    actions: BTreeMap<String, String>,
    invalid: bool,
    pending: Vec<String>,
}

/// Normalize a trap condition: names with or without the `SIG` prefix and
/// the conventional numbers.
pub fn trap_condition(spec: &str) -> Option<String> {
    let upper = spec.to_ascii_uppercase();
    let name = upper.strip_prefix("SIG").unwrap_or(&upper);
    let known = match name {
        "EXIT" | "0" => "EXIT",
        "HUP" | "1" => "HUP",
        "INT" | "2" => "INT",
        "QUIT" | "3" => "QUIT",
        "USR1" | "10" => "USR1",
        "USR2" | "12" => "USR2",
        "PIPE" | "13" => "PIPE",
        "ALRM" | "14" => "ALRM",
        "TERM" | "15" => "TERM",
        _ => return None,
    };
    Some(known.to_string())
}

impl TrapTable {
    /// True when trap actions exist and are valid in this process.
    pub fn have_traps(&self) -> bool {
        !self.invalid && self.actions.values().any(|a| !a.is_empty())
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// Called in a forked child: inherited traps must not fire here.
    pub fn mark_invalid(&mut self) {
        if !self.actions.is_empty() {
            self.invalid = true;
        }
    }

    /// Zero inherited traps (the lazy half of fork-time invalidation).
    pub fn free_traps(&mut self) {
        self.actions.clear();
        self.invalid = false;
    }

    pub fn set_action(&mut self, cond: &str, action: Option<String>) {
        // Modifying traps re-validates them: whatever survives is ours.
        if self.invalid {
            self.free_traps();
        }
        match action {
            Some(a) => {
                self.actions.insert(cond.to_string(), a);
            }
            None => {
                self.actions.remove(cond);
            }
        }
    }

    pub fn get_action(&self, cond: &str) -> Option<&str> {
        self.actions.get(cond).map(|s| s.as_str())
    }

    /// `trap` with no operands: reproducible listing.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for (cond, action) in &self.actions {
            out.push_str(&format!("trap -- '{}' {}\n", action, cond));
        }
        out
    }

    /// Queue a condition for delivery at the next evaluator exit.
    pub fn raise(&mut self, cond: &str) {
        self.pending.push(cond.to_string());
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain pending conditions, pairing each with its action (if any).
    pub fn take_pending(&mut self) -> Vec<(String, Option<String>)> {
        let pending = std::mem::take(&mut self.pending);
        pending
            .into_iter()
            .map(|cond| {
                let action = if self.invalid { None } else { self.actions.get(&cond).cloned() };
                (cond, action)
            })
            .collect()
    }

    /// Remove and return the EXIT action (run once, at shell exit).
    pub fn take_exit_trap(&mut self) -> Option<String> {
        if self.invalid {
            return None;
        }
        self.actions.remove("EXIT").filter(|a| !a.is_empty())
    }
}
