//! Word expansion
//!
//! Turns AST words into fields: parameter expansion, command
//! substitution, tilde expansion, field splitting, pathname expansion,
//! and quote removal, gated by the flag word the evaluator passes down.
//! One word may expand to zero, one, or many fields; the evaluator
//! depends on that (`x=""; set -- $x` has no arguments).

use glob::Pattern;
use lazy_static::lazy_static;
use rand::Rng;
use regex_lite::Regex;

use crate::ast::types::{ParamExp, ParamOp, Word, WordPart};
use crate::fs::Fs;
use crate::interpreter::errors::{EvalResult, ShellException};
use crate::interpreter::execution_engine::Evaluator;
use crate::interpreter::types::ShellState;

/// Perform field splitting and pathname expansion on the result.
pub const EXP_FULL: u8 = 1;
/// Expand a leading tilde.
pub const EXP_TILDE: u8 = 2;
/// Assignment context: tilde also expands after `=` and `:`.
pub const EXP_VARTILDE: u8 = 4;
/// Redirection filename: single field, no splitting or globbing.
pub const EXP_REDIR: u8 = 8;

lazy_static! {
    static ref NAME_RE: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
}

/// Identifier predicate: names safe to use without expansion.
pub fn good_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// Does the raw text look like `NAME=...`?
pub fn is_assignment(text: &str) -> bool {
    crate::interpreter::variables::split_assignment(text).is_some()
}

/// Assignment detection on an unexpanded word: the name and `=` must be
/// literal source text.
pub fn is_assignment_word(word: &Word) -> bool {
    match word.parts.first() {
        Some(WordPart::Literal(s)) => match s.find('=') {
            Some(eq) if eq > 0 => good_name(&s[..eq]),
            _ => false,
        },
        _ => false,
    }
}

// =============================================================================
// Piece stream
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Text { text: String, quoted: bool },
    /// Whitespace separator: delimits only non-empty fields.
    Soft,
    /// Non-whitespace separator or `"$@"` boundary: always ends a field.
    Hard,
}

/// One field before quote removal: runs of text with their quoting.
#[derive(Debug, Clone, Default)]
struct Field {
    runs: Vec<(String, bool)>,
}

impl Field {
    fn has_content(&self) -> bool {
        self.runs.iter().any(|(text, quoted)| *quoted || !text.is_empty())
    }

    fn plain_text(&self) -> String {
        self.runs.iter().map(|(t, _)| t.as_str()).collect()
    }

    fn glob_pattern(&self) -> String {
        let mut out = String::new();
        for (text, quoted) in &self.runs {
            if *quoted {
                out.push_str(&Pattern::escape(text));
            } else {
                out.push_str(text);
            }
        }
        out
    }

    fn has_unquoted_magic(&self) -> bool {
        self.runs.iter().any(|(t, q)| !*q && t.contains(['*', '?', '[']))
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Expand one word into fields.
pub fn expand_arg(
    ev: &Evaluator,
    state: &mut ShellState,
    word: &Word,
    flags: u8,
) -> EvalResult<Vec<String>> {
    let pieces = expand_parts(ev, state, &word.parts, flags, false)?;
    let fields = assemble_fields(pieces);
    let mut out = Vec::new();
    for field in fields {
        if flags & EXP_FULL != 0 && !state.options.noglob && field.has_unquoted_magic() {
            let matches = expand_pathname(ev.fs, &state.cwd, &field.glob_pattern());
            if !matches.is_empty() {
                out.extend(matches);
                continue;
            }
        }
        out.push(field.plain_text());
    }
    Ok(out)
}

/// Expand a word that must produce exactly one field (redirection
/// filenames, case expressions, assignment values).
pub fn expand_to_field(
    ev: &Evaluator,
    state: &mut ShellState,
    word: &Word,
    flags: u8,
) -> EvalResult<String> {
    let pieces = expand_parts(ev, state, &word.parts, flags & !EXP_FULL, false)?;
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Text { text, .. } => out.push_str(&text),
            Piece::Soft => {}
            Piece::Hard => out.push(' '),
        }
    }
    Ok(out)
}

/// Expand a word into a match pattern: quoted characters lose their
/// special meaning, unquoted glob characters keep it.
pub fn expand_pattern(ev: &Evaluator, state: &mut ShellState, word: &Word) -> EvalResult<String> {
    let pieces = expand_parts(ev, state, &word.parts, EXP_TILDE, false)?;
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Text { text, quoted: true } => out.push_str(&Pattern::escape(&text)),
            Piece::Text { text, quoted: false } => out.push_str(&text),
            _ => {}
        }
    }
    Ok(out)
}

/// Expand a raw string the way `PS4` is expanded at each trace point.
/// Errors fall back to the unexpanded text.
pub fn expand_string(ev: &Evaluator, state: &mut ShellState, s: &str) -> String {
    let word = match crate::parser::Lexer::lex_heredoc_content(s, state.line_number) {
        Ok(w) => w,
        Err(_) => return s.to_string(),
    };
    expand_to_field(ev, state, &word, 0).unwrap_or_else(|_| s.to_string())
}

/// Pattern match for `case` (and prefix/suffix trimming).
pub fn case_match(pattern: &str, word: &str) -> bool {
    match Pattern::new(pattern) {
        Ok(p) => p.matches(word),
        Err(_) => pattern == word,
    }
}

// =============================================================================
// Part expansion
// =============================================================================

fn expand_parts(
    ev: &Evaluator,
    state: &mut ShellState,
    parts: &[WordPart],
    flags: u8,
    in_quotes: bool,
) -> EvalResult<Vec<Piece>> {
    let mut pieces = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        match part {
            WordPart::Literal(text) => {
                let text = if i == 0 && !in_quotes && flags & (EXP_TILDE | EXP_VARTILDE) != 0 {
                    expand_tilde(state, text, flags & EXP_VARTILDE != 0)
                } else {
                    text.clone()
                };
                pieces.push(Piece::Text { text, quoted: false });
            }
            WordPart::SingleQuoted(text) => {
                pieces.push(Piece::Text { text: text.clone(), quoted: true });
            }
            WordPart::Escaped(c) => {
                pieces.push(Piece::Text { text: c.to_string(), quoted: true });
            }
            WordPart::DoubleQuoted(inner) => {
                if inner.is_empty() {
                    pieces.push(Piece::Text { text: String::new(), quoted: true });
                } else {
                    pieces.extend(expand_parts(ev, state, inner, flags, true)?);
                }
            }
            WordPart::Param(param) => {
                expand_param(ev, state, param, flags, in_quotes, &mut pieces)?;
            }
            WordPart::CommandSubst(cmds) => {
                let output = ev.eval_backcmd(state, cmds)?;
                let trimmed = output.trim_end_matches('\n').to_string();
                push_expansion_text(&mut pieces, trimmed, in_quotes, flags, state);
            }
        }
    }
    Ok(pieces)
}

/// Append expansion output, field-splitting it when unquoted and the
/// caller asked for full expansion.
fn push_expansion_text(
    pieces: &mut Vec<Piece>,
    text: String,
    in_quotes: bool,
    flags: u8,
    state: &ShellState,
) {
    if in_quotes || flags & EXP_FULL == 0 {
        pieces.push(Piece::Text { text, quoted: in_quotes });
        return;
    }
    let ifs = state.ifsval();
    if ifs.is_empty() {
        pieces.push(Piece::Text { text, quoted: false });
        return;
    }
    let mut current = String::new();
    let mut sep_seen = false;
    let mut sep_hard = false;
    for c in text.chars() {
        if ifs.contains(c) {
            if !current.is_empty() {
                pieces.push(Piece::Text { text: std::mem::take(&mut current), quoted: false });
            }
            sep_seen = true;
            if !c.is_ascii_whitespace() {
                if sep_hard {
                    // Two non-whitespace separators: an empty field between.
                    pieces.push(Piece::Hard);
                } else {
                    sep_hard = true;
                }
            }
        } else {
            if sep_seen {
                pieces.push(if sep_hard { Piece::Hard } else { Piece::Soft });
                sep_seen = false;
                sep_hard = false;
            }
            current.push(c);
        }
    }
    if sep_seen {
        pieces.push(if sep_hard { Piece::Hard } else { Piece::Soft });
    }
    if !current.is_empty() {
        pieces.push(Piece::Text { text: current, quoted: false });
    }
}

fn expand_param(
    ev: &Evaluator,
    state: &mut ShellState,
    param: &ParamExp,
    flags: u8,
    in_quotes: bool,
    pieces: &mut Vec<Piece>,
) -> EvalResult {
    // The list-like parameters generate multiple fields themselves.
    if param.name == "@" || param.name == "*" {
        expand_at_star(state, &param.name, in_quotes, flags, pieces);
        return Ok(());
    }

    let value = lookup_param(state, &param.name);
    // An operator that supplies its own unset handling suppresses -u.
    if value.is_none() && param.op.is_none() && state.options.nounset {
        return Err(ShellException::error(format!("{}: parameter not set", param.name)));
    }
    let value = apply_param_op(ev, state, param, value, flags)?;
    match value {
        Some(text) => {
            push_expansion_text(pieces, text, in_quotes, flags, state);
        }
        None => {
            // Unset expands to nothing; an unquoted empty vanishes in
            // field assembly.
            if in_quotes {
                pieces.push(Piece::Text { text: String::new(), quoted: true });
            }
        }
    }
    Ok(())
}

fn expand_at_star(
    state: &ShellState,
    name: &str,
    in_quotes: bool,
    flags: u8,
    pieces: &mut Vec<Piece>,
) {
    let params = state.param.params.clone();
    if name == "@" && in_quotes {
        for (i, p) in params.iter().enumerate() {
            if i > 0 {
                pieces.push(Piece::Hard);
            }
            pieces.push(Piece::Text { text: p.clone(), quoted: true });
        }
        return;
    }
    if in_quotes {
        // "$*": one field, joined with the first IFS character.
        let sep = state.ifsval().chars().next().map(|c| c.to_string()).unwrap_or_default();
        pieces.push(Piece::Text { text: params.join(&sep), quoted: true });
        return;
    }
    // Unquoted, each parameter is split like any other expansion result.
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            pieces.push(Piece::Soft);
        }
        push_expansion_text(pieces, p.clone(), false, flags, state);
    }
}

/// Value of a parameter without any operation applied. `None` = unset.
fn lookup_param(state: &ShellState, name: &str) -> Option<String> {
    match name {
        "?" => Some(state.exit_status.to_string()),
        "#" => Some(state.param.count().to_string()),
        "$" => Some(state.pid.to_string()),
        "!" => {
            let pid = state.jobs.last_background_pid;
            if pid == 0 {
                None
            } else {
                Some(pid.to_string())
            }
        }
        "-" => Some(state.options.flag_string()),
        "0" => Some(state.command_name.clone()),
        _ if name.chars().all(|c| c.is_ascii_digit()) => {
            name.parse::<usize>().ok().and_then(|n| state.param.get(n)).map(|s| s.to_string())
        }
        "RANDOM" => Some(rand::thread_rng().gen_range(0..32768).to_string()),
        "LINENO" => {
            Some(state.line_number.saturating_sub(state.func_line_base).to_string())
        }
        _ => state.vars.get(name).map(|s| s.to_string()),
    }
}

fn apply_param_op(
    ev: &Evaluator,
    state: &mut ShellState,
    param: &ParamExp,
    value: Option<String>,
    flags: u8,
) -> EvalResult<Option<String>> {
    let op = match &param.op {
        None => return Ok(value),
        Some(op) => op,
    };
    let is_null = value.as_deref().map(|v| v.is_empty()).unwrap_or(true);
    match op {
        ParamOp::Length => {
            Ok(Some(value.unwrap_or_default().chars().count().to_string()))
        }
        ParamOp::Default { word, colon } => {
            let trigger = value.is_none() || (*colon && is_null);
            if trigger {
                Ok(Some(expand_to_field(ev, state, word, flags & (EXP_TILDE | EXP_VARTILDE))?))
            } else {
                Ok(value)
            }
        }
        ParamOp::Assign { word, colon } => {
            let trigger = value.is_none() || (*colon && is_null);
            if !trigger {
                return Ok(value);
            }
            if !good_name(&param.name) {
                return Err(ShellException::error(format!(
                    "{}: bad variable name",
                    param.name
                )));
            }
            let new = expand_to_field(ev, state, word, flags & (EXP_TILDE | EXP_VARTILDE))?;
            state.vars.set(&param.name, &new)?;
            Ok(Some(new))
        }
        ParamOp::Alternative { word, colon } => {
            let trigger = value.is_none() || (*colon && is_null);
            if trigger {
                Ok(None)
            } else {
                Ok(Some(expand_to_field(ev, state, word, flags & (EXP_TILDE | EXP_VARTILDE))?))
            }
        }
        ParamOp::Error { word, colon } => {
            let trigger = value.is_none() || (*colon && is_null);
            if trigger {
                let msg = expand_to_field(ev, state, word, 0)?;
                let msg = if msg.is_empty() { "parameter null or not set".to_string() } else { msg };
                Err(ShellException::error(format!("{}: {}", param.name, msg)))
            } else {
                Ok(value)
            }
        }
        ParamOp::RemovePrefix { pattern, longest } => {
            let value = value.unwrap_or_default();
            let pat = expand_pattern(ev, state, pattern)?;
            Ok(Some(remove_prefix(&value, &pat, *longest)))
        }
        ParamOp::RemoveSuffix { pattern, longest } => {
            let value = value.unwrap_or_default();
            let pat = expand_pattern(ev, state, pattern)?;
            Ok(Some(remove_suffix(&value, &pat, *longest)))
        }
    }
}

fn remove_prefix(value: &str, pattern: &str, longest: bool) -> String {
    let boundaries: Vec<usize> = value
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(value.len()))
        .collect();
    let iter: Box<dyn Iterator<Item = &usize>> =
        if longest { Box::new(boundaries.iter().rev()) } else { Box::new(boundaries.iter()) };
    for &end in iter {
        if case_match(pattern, &value[..end]) {
            return value[end..].to_string();
        }
    }
    value.to_string()
}

fn remove_suffix(value: &str, pattern: &str, longest: bool) -> String {
    let boundaries: Vec<usize> = value
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(value.len()))
        .collect();
    let iter: Box<dyn Iterator<Item = &usize>> =
        if longest { Box::new(boundaries.iter()) } else { Box::new(boundaries.iter().rev()) };
    for &start in iter {
        if case_match(pattern, &value[start..]) {
            return value[..start].to_string();
        }
    }
    value.to_string()
}

/// Tilde expansion on a literal run. Only `~` and `~/...` expand (there
/// is no passwd database in the sandbox); in assignment context the
/// expansion also applies after `=` and `:`.
fn expand_tilde(state: &ShellState, text: &str, assign: bool) -> String {
    let expand_one = |seg: &str| -> String {
        if let Some(rest) = seg.strip_prefix('~') {
            if rest.is_empty() || rest.starts_with('/') {
                if let Some(home) = state.vars.get("HOME") {
                    return format!("{}{}", home, rest);
                }
            }
        }
        seg.to_string()
    };
    if !assign {
        return expand_one(text);
    }
    match text.split_once('=') {
        Some((name, value)) => {
            let expanded: Vec<String> = value.split(':').map(|seg| expand_one(seg)).collect();
            format!("{}={}", name, expanded.join(":"))
        }
        None => {
            let expanded: Vec<String> = text.split(':').map(|seg| expand_one(seg)).collect();
            expanded.join(":")
        }
    }
}

// =============================================================================
// Field assembly
// =============================================================================

fn assemble_fields(pieces: Vec<Piece>) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut current = Field::default();
    let mut pending_soft = false;
    for piece in pieces {
        match piece {
            Piece::Text { text, quoted } => {
                if pending_soft {
                    if current.has_content() {
                        fields.push(std::mem::take(&mut current));
                    }
                    pending_soft = false;
                }
                current.runs.push((text, quoted));
            }
            Piece::Hard => {
                fields.push(std::mem::take(&mut current));
                pending_soft = false;
            }
            Piece::Soft => pending_soft = true,
        }
    }
    if current.has_content() {
        fields.push(current);
    }
    fields
}

// =============================================================================
// Pathname expansion
// =============================================================================

/// Expand a glob pattern against the virtual fs. Returned names are
/// written the way the pattern was (relative patterns give relative
/// names), sorted.
pub fn expand_pathname(fs: &dyn Fs, cwd: &str, pattern: &str) -> Vec<String> {
    let absolute = pattern.starts_with('/');
    let comps: Vec<&str> = pattern.split('/').filter(|c| !c.is_empty()).collect();
    if comps.is_empty() {
        return Vec::new();
    }
    // (absolute path, display path) pairs.
    let mut candidates: Vec<(String, String)> = if absolute {
        vec![("/".to_string(), "/".to_string())]
    } else {
        vec![(cwd.to_string(), String::new())]
    };
    for comp in comps {
        let mut next = Vec::new();
        let magic = comp.contains(['*', '?', '[']);
        for (abs, display) in &candidates {
            let join_abs = |name: &str| crate::fs::resolve_path(abs, name);
            let join_display = |name: &str| {
                if display.is_empty() {
                    name.to_string()
                } else if display.ends_with('/') {
                    format!("{}{}", display, name)
                } else {
                    format!("{}/{}", display, name)
                }
            };
            if !magic {
                let abs_path = join_abs(comp);
                if fs.exists(&abs_path) {
                    next.push((abs_path, join_display(comp)));
                }
                continue;
            }
            let pat = match Pattern::new(comp) {
                Ok(p) => p,
                Err(_) => continue,
            };
            if let Ok(names) = fs.read_dir(abs) {
                for name in names {
                    if name.starts_with('.') && !comp.starts_with('.') {
                        continue;
                    }
                    if pat.matches(&name) {
                        next.push((join_abs(&name), join_display(&name)));
                    }
                }
            }
        }
        candidates = next;
    }
    let mut out: Vec<String> = candidates.into_iter().map(|(_, d)| d).collect();
    out.sort();
    out
}

/// Quote a string for `-x` trace output the way the shell would write it
/// back.
pub fn sh_quote(s: &str) -> String {
    if !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || "_-./=:%+,@^".contains(c))
    {
        return s.to_string();
    }
    let mut out = String::from("'");
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::test_support::harness;

    fn word(src: &str) -> Word {
        use crate::parser::{Lexer, Token};
        let mut lx = Lexer::new(src);
        match lx.next_token().unwrap() {
            (Token::Word(w), _) => w,
            (other, _) => panic!("expected word, got {:?}", other),
        }
    }

    fn expand(state: &mut ShellState, src: &str, flags: u8) -> Vec<String> {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        expand_arg(&ev, state, &word(src), flags).unwrap()
    }

    #[test]
    fn test_good_name() {
        assert!(good_name("foo"));
        assert!(good_name("_x9"));
        assert!(!good_name("9x"));
        assert!(!good_name("a-b"));
        assert!(!good_name(""));
    }

    #[test]
    fn test_is_assignment_word() {
        assert!(is_assignment_word(&word("x=1")));
        assert!(is_assignment_word(&word("x=$y")));
        assert!(!is_assignment_word(&word("=x")));
        assert!(!is_assignment_word(&word("echo")));
        assert!(!is_assignment_word(&word("'x'=1")));
    }

    #[test]
    fn test_literal_not_split() {
        let mut st = ShellState::new();
        assert_eq!(expand(&mut st, "plain", EXP_FULL), vec!["plain"]);
    }

    #[test]
    fn test_var_expansion_and_splitting() {
        let mut st = ShellState::new();
        st.vars.set("v", "a b  c").unwrap();
        assert_eq!(expand(&mut st, "$v", EXP_FULL), vec!["a", "b", "c"]);
        assert_eq!(expand(&mut st, "\"$v\"", EXP_FULL), vec!["a b  c"]);
    }

    #[test]
    fn test_unset_unquoted_vanishes() {
        let mut st = ShellState::new();
        assert!(expand(&mut st, "$unset", EXP_FULL).is_empty());
        assert_eq!(expand(&mut st, "\"$unset\"", EXP_FULL), vec![""]);
    }

    #[test]
    fn test_nounset() {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        st.options.nounset = true;
        assert!(expand_arg(&ev, &mut st, &word("$nope"), EXP_FULL).is_err());
    }

    #[test]
    fn test_ifs_nonwhitespace_separators() {
        let mut st = ShellState::new();
        st.vars.set("IFS", ":").unwrap();
        st.vars.set("v", "a::b:").unwrap();
        assert_eq!(expand(&mut st, "$v", EXP_FULL), vec!["a", "", "b"]);
    }

    #[test]
    fn test_quoted_at_expands_per_param() {
        let mut st = ShellState::new();
        st.param.params = vec!["a a".into(), "b".into()];
        assert_eq!(expand(&mut st, "\"$@\"", EXP_FULL), vec!["a a", "b"]);
        assert_eq!(expand(&mut st, "\"$*\"", EXP_FULL), vec!["a a b"]);
        assert_eq!(expand(&mut st, "$@", EXP_FULL), vec!["a", "a", "b"]);
    }

    #[test]
    fn test_quoted_at_with_no_params_is_no_field() {
        let mut st = ShellState::new();
        assert!(expand(&mut st, "\"$@\"", EXP_FULL).is_empty());
    }

    #[test]
    fn test_special_params() {
        let mut st = ShellState::new();
        st.exit_status = 42;
        st.param.params = vec!["one".into(), "two".into()];
        assert_eq!(expand(&mut st, "$?", EXP_FULL), vec!["42"]);
        assert_eq!(expand(&mut st, "$#", EXP_FULL), vec!["2"]);
        assert_eq!(expand(&mut st, "$1", EXP_FULL), vec!["one"]);
        st.options.xtrace = true;
        assert_eq!(expand(&mut st, "$-", EXP_FULL), vec!["x"]);
    }

    #[test]
    fn test_param_default_ops() {
        let mut st = ShellState::new();
        st.vars.set("empty", "").unwrap();
        assert_eq!(expand(&mut st, "${unset:-fb}", EXP_FULL), vec!["fb"]);
        assert_eq!(expand(&mut st, "${empty:-fb}", EXP_FULL), vec!["fb"]);
        assert!(expand(&mut st, "${empty-fb}", EXP_FULL).is_empty());
        assert_eq!(expand(&mut st, "${unset:=as}", EXP_FULL), vec!["as"]);
        assert_eq!(st.vars.get("unset"), Some("as"));
        assert_eq!(expand(&mut st, "${unset:+alt}", EXP_FULL), vec!["alt"]);
    }

    #[test]
    fn test_param_error_op() {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        let err = expand_arg(&ev, &mut st, &word("${nope:?custom}"), EXP_FULL).unwrap_err();
        assert_eq!(err, ShellException::error("nope: custom"));
    }

    #[test]
    fn test_length_and_trim_ops() {
        let mut st = ShellState::new();
        st.vars.set("v", "abc.tar.gz").unwrap();
        assert_eq!(expand(&mut st, "${#v}", EXP_FULL), vec!["10"]);
        assert_eq!(expand(&mut st, "${v%.*}", EXP_FULL), vec!["abc.tar"]);
        assert_eq!(expand(&mut st, "${v%%.*}", EXP_FULL), vec!["abc"]);
        assert_eq!(expand(&mut st, "${v#*.}", EXP_FULL), vec!["tar.gz"]);
        assert_eq!(expand(&mut st, "${v##*.}", EXP_FULL), vec!["gz"]);
    }

    #[test]
    fn test_tilde() {
        let mut st = ShellState::new();
        st.vars.set("HOME", "/home/me").unwrap();
        assert_eq!(expand(&mut st, "~/x", EXP_FULL | EXP_TILDE), vec!["/home/me/x"]);
        assert_eq!(expand(&mut st, "~", EXP_FULL | EXP_TILDE), vec!["/home/me"]);
        // Quoted tilde stays literal.
        assert_eq!(expand(&mut st, "\"~\"", EXP_FULL | EXP_TILDE), vec!["~"]);
    }

    #[test]
    fn test_pathname_expansion() {
        let (fs, reg, limits) = harness();
        fs.add_file("/work/a.txt", "");
        fs.add_file("/work/b.txt", "");
        fs.add_file("/work/c.log", "");
        fs.add_file("/work/.hidden.txt", "");
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        st.cwd = "/work".to_string();
        let fields = expand_arg(&ev, &mut st, &word("*.txt"), EXP_FULL).unwrap();
        assert_eq!(fields, vec!["a.txt", "b.txt"]);
        // Quoted glob characters do not match.
        let fields = expand_arg(&ev, &mut st, &word("'*.txt'"), EXP_FULL).unwrap();
        assert_eq!(fields, vec!["*.txt"]);
        // No match leaves the pattern as-is.
        let fields = expand_arg(&ev, &mut st, &word("*.none"), EXP_FULL).unwrap();
        assert_eq!(fields, vec!["*.none"]);
    }

    #[test]
    fn test_case_match() {
        assert!(case_match("a*", "abc"));
        assert!(case_match("?.txt", "a.txt"));
        assert!(case_match("[ab]x", "bx"));
        assert!(!case_match("a*", "xa"));
    }

    #[test]
    fn test_sh_quote() {
        assert_eq!(sh_quote("plain"), "plain");
        assert_eq!(sh_quote("has space"), "'has space'");
        assert_eq!(sh_quote("it's"), "'it'\\''s'");
        assert_eq!(sh_quote(""), "''");
    }

    #[test]
    fn test_expand_to_field_keeps_spaces() {
        let (fs, reg, limits) = harness();
        let ev = Evaluator::new(&fs, &reg, &limits);
        let mut st = ShellState::new();
        st.vars.set("v", "a b").unwrap();
        assert_eq!(expand_to_field(&ev, &mut st, &word("$v"), EXP_TILDE).unwrap(), "a b");
    }
}
