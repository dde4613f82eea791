//! Control Flow Execution
//!
//! The loop and case evaluators: `while`/`until`, `for`, and `case`.
//! These are the designated consumers of the skip latch: a `break` or
//! `continue` raised anywhere in a body unwinds to the innermost loop,
//! which decrements the count and either iterates or terminates; function
//! returns and file aborts pass through untouched.

use crate::ast::types::{CaseNode, ForNode, LoopNode, Node};
use crate::interpreter::errors::{EvalResult, ShellException};
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::skip::SkipKind;
use crate::interpreter::types::{EvalFlags, ShellState};
use crate::interpreter::word_expansion::{
    case_match, expand_arg, expand_pattern, expand_string, expand_to_field, sh_quote, EXP_FULL,
    EXP_TILDE,
};

impl Evaluator<'_> {
    /// `while` / `until`.
    pub fn eval_loop(&self, state: &mut ShellState, node: &Node, flags: EvalFlags) -> EvalResult {
        let (loop_node, is_while) = match node {
            Node::While(l) => (l, true),
            Node::Until(l) => (l, false),
            _ => return Ok(()),
        };
        state.loop_nest += 1;
        let result = self.loop_iterations(state, loop_node, is_while, flags);
        state.loop_nest -= 1;
        let status = result?;
        state.exit_status = status;
        Ok(())
    }

    fn loop_iterations(
        &self,
        state: &mut ShellState,
        l: &LoopNode,
        is_while: bool,
        flags: EvalFlags,
    ) -> EvalResult<i32> {
        let mut status = 0;
        let mut iterations = 0u64;
        loop {
            iterations += 1;
            if iterations > self.limits.max_loop_iterations {
                return Err(ShellException::error("maximum loop iterations exceeded"));
            }
            self.eval_tree(state, Some(&l.cond), EvalFlags::TESTED)?;
            if state.options.noexec {
                break;
            }
            if state.skip.is_skipping() {
                if self.loop_skip(state, &mut status) {
                    continue;
                }
                break;
            }
            if is_while {
                if state.exit_status != 0 {
                    break;
                }
            } else if state.exit_status == 0 {
                break;
            }
            self.eval_tree(state, Some(&l.body), flags.tested_only())?;
            status = state.exit_status;
            if state.skip.is_skipping() && !self.loop_skip(state, &mut status) {
                break;
            }
        }
        Ok(status)
    }

    /// Observe the skip latch from inside a loop. Returns true when the
    /// latch was a `continue` targeted at this loop and iteration should
    /// resume; on false the loop terminates (with the latch cleared if
    /// this loop consumed the last level, intact if it must propagate).
    fn loop_skip(&self, state: &mut ShellState, status: &mut i32) -> bool {
        match state.skip.current() {
            SkipKind::Continue => state.skip.consume_level(SkipKind::Continue),
            SkipKind::Break => {
                state.skip.consume_level(SkipKind::Break);
                false
            }
            SkipKind::FuncReturn | SkipKind::FileAbort => {
                *status = state.exit_status;
                false
            }
            SkipKind::None => false,
        }
    }

    /// `for name in words; do body; done`.
    pub fn eval_for(&self, state: &mut ShellState, f: &ForNode, flags: EvalFlags) -> EvalResult {
        let mut words: Vec<String> = Vec::new();
        for arg in &f.args {
            state.line_number = arg.lineno;
            words.extend(expand_arg(self, state, arg, EXP_FULL | EXP_TILDE)?);
            if state.skip.is_skipping() {
                // A command substitution in the word list hit a control
                // builtin; abandon the loop before it starts.
                return Ok(());
            }
        }

        state.loop_nest += 1;
        let result = self.for_iterations(state, f, &words, flags);
        state.loop_nest -= 1;
        let status = result?;
        state.exit_status = status;
        Ok(())
    }

    fn for_iterations(
        &self,
        state: &mut ShellState,
        f: &ForNode,
        words: &[String],
        flags: EvalFlags,
    ) -> EvalResult<i32> {
        let mut status = if state.options.noexec { state.exit_status } else { 0 };
        let mut iterations = 0u64;
        for word in words {
            iterations += 1;
            if iterations > self.limits.max_loop_iterations {
                return Err(ShellException::error("maximum loop iterations exceeded"));
            }
            if state.options.xtrace {
                let ps4val = state.ps4val();
                let ps4 = expand_string(self, state, &ps4val);
                let line = format!("{}for {}={}\n", ps4, f.var, sh_quote(word));
                self.outx(state, &line)?;
            }
            state.vars.set(&f.var, word)?;
            self.eval_tree(state, Some(&f.body), flags.tested_only())?;
            status = state.exit_status;
            if state.options.noexec {
                break;
            }
            if state.skip.is_skipping() && !self.loop_skip(state, &mut status) {
                break;
            }
        }
        Ok(status)
    }

    /// `case word in pattern) ... esac`.
    pub fn eval_case(&self, state: &mut ShellState, c: &CaseNode, flags: EvalFlags) -> EvalResult {
        state.line_number = c.lineno;
        let word = expand_to_field(self, state, &c.expr, EXP_TILDE)?;
        let mut status = 0;

        'items: for (idx, item) in c.items.iter().enumerate() {
            if state.skip.is_skipping() {
                break;
            }
            for pattern_word in &item.patterns {
                state.line_number = pattern_word.lineno;
                let pattern = expand_pattern(self, state, pattern_word)?;
                if case_match(&pattern, &word) {
                    // Run the matched arm; `;&` arms fall into the next
                    // body without re-matching.
                    let mut i = idx;
                    loop {
                        if state.skip.is_skipping() || state.options.noexec {
                            break;
                        }
                        let arm = &c.items[i];
                        state.line_number = arm.lineno;
                        self.eval_tree(state, arm.body.as_deref(), flags)?;
                        status = state.exit_status;
                        if arm.fallthrough && i + 1 < c.items.len() {
                            i += 1;
                        } else {
                            break;
                        }
                    }
                    break 'items;
                }
            }
        }
        state.exit_status = status;
        Ok(())
    }
}
