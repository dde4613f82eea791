//! Skip controller
//!
//! Process-wide latch implementing `break`, `continue`, `return`, and
//! dot-script abort. Control builtins set it; compound evaluators observe
//! it and either propagate (return without running more of their body) or,
//! when they are the designated consumer, decrement the count and clear it.
//!
//! Invariant: `count > 0` exactly when `kind != None`.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipKind {
    #[default]
    None,
    Break,
    Continue,
    FuncReturn,
    FileAbort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkipState {
    kind: SkipKind,
    count: u32,
}

impl SkipState {
    pub fn current(&self) -> SkipKind {
        self.kind
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_skipping(&self) -> bool {
        self.kind != SkipKind::None
    }

    /// Begin skipping. `count` levels for break/continue; always 1 for
    /// function return and file abort.
    pub fn begin(&mut self, kind: SkipKind, count: u32) {
        debug_assert!(kind != SkipKind::None && count > 0);
        self.kind = kind;
        self.count = count;
    }

    /// Reset to the no-skip state.
    pub fn stop(&mut self) {
        self.kind = SkipKind::None;
        self.count = 0;
    }

    /// Consume one level if the latch holds `kind`. Returns true when this
    /// call cleared the latch (the consumer is the final destination).
    pub fn consume_level(&mut self, kind: SkipKind) -> bool {
        if self.kind != kind {
            return false;
        }
        self.count = self.count.saturating_sub(1);
        if self.count == 0 {
            self.kind = SkipKind::None;
            true
        } else {
            false
        }
    }

    /// Snapshot for save/restore around nested evaluation contexts.
    pub fn save(&self) -> SkipState {
        *self
    }

    pub fn restore(&mut self, saved: SkipState) {
        *self = saved;
    }
}
