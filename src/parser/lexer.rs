//! Lexer for shell source
//!
//! Tokenizes input into operators and words. Word reading happens here
//! because shell words carry their quoting and expansion structure: the
//! lexer emits a fully analyzed `Word` (parts for quotes, parameter
//! expansions, and command substitutions) rather than raw text.
//!
//! Here-document bodies are not tokens; when the parser sees a `<<`
//! operator and its delimiter it calls `steal_heredoc_body`, which lifts
//! the body out of the lines that follow. The stolen region is skipped when
//! ordinary tokenizing reaches it.

use crate::ast::types::{ParamExp, ParamOp, RedirKind, Word, WordPart};
use crate::parser::ParseError;

/// Tokens handed to the parser. Reserved words arrive as plain `Word`s and
/// are recognized positionally by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Eof,
    Newline,
    Semi,
    Amp,
    AndAnd,
    OrOr,
    Pipe,
    LParen,
    RParen,
    /// `;;` ends a case arm
    DSemi,
    /// `;&` ends a case arm with fall-through
    SemiAnd,
    Redir {
        fd: Option<i32>,
        kind: RedirKind,
        strip_tabs: bool,
    },
    Word(Word),
}

impl Token {
    /// The literal text of an unquoted word token, if that is what this is.
    pub fn keyword(&self) -> Option<&str> {
        match self {
            Token::Word(w) => w.as_literal(),
            _ => None,
        }
    }
}

/// Characters that end an unquoted word.
fn is_meta(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | ';' | '&' | '|' | '(' | ')' | '<' | '>')
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A region of source lifted out by `steal_heredoc_body`: byte range plus
/// the number of newlines it spans (for line accounting when skipped).
#[derive(Debug, Clone, Copy)]
struct StolenRegion {
    start: usize,
    end: usize,
    newlines: u32,
}

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    stolen: Vec<StolenRegion>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src: src.as_bytes(), pos: 0, line: 1, stolen: Vec::new() }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Jump over any stolen here-document region starting at the cursor.
    fn skip_stolen(&mut self) {
        while let Some(region) = self.stolen.iter().find(|r| r.start == self.pos).copied() {
            self.pos = region.end;
            self.line += region.newlines;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_stolen();
        self.src.get(self.pos).map(|&b| b as char)
    }

    fn peek_at(&mut self, off: usize) -> Option<char> {
        self.skip_stolen();
        self.src.get(self.pos + off).map(|&b| b as char)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, msg: impl Into<String>) -> ParseError {
        ParseError::new(msg, self.line)
    }

    /// Skip blanks, comments, and escaped newlines (line continuations).
    fn skip_blanks(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') => {
                    self.bump();
                }
                Some('\\') if self.peek_at(1) == Some('\n') => {
                    self.bump();
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    /// Read the next token. Returns the token and the line it started on.
    pub fn next_token(&mut self) -> Result<(Token, u32), ParseError> {
        self.skip_blanks();
        let line = self.line;
        let c = match self.peek() {
            None => return Ok((Token::Eof, line)),
            Some(c) => c,
        };

        // Descriptor prefix on a redirection, e.g. `2>` or `10<&`.
        if c.is_ascii_digit() {
            let mut end = self.pos;
            while end < self.src.len() && (self.src[end] as char).is_ascii_digit() {
                end += 1;
            }
            if let Some(&next) = self.src.get(end) {
                if next == b'<' || next == b'>' {
                    let text = std::str::from_utf8(&self.src[self.pos..end]).unwrap_or("0");
                    let fd: i32 = text
                        .parse()
                        .map_err(|_| self.error(format!("file descriptor out of range: {}", text)))?;
                    self.pos = end;
                    let (kind, strip_tabs) = self.read_redir_op()?;
                    return Ok((Token::Redir { fd: Some(fd), kind, strip_tabs }, line));
                }
            }
        }

        match c {
            '\n' => {
                self.bump();
                Ok((Token::Newline, line))
            }
            ';' => {
                self.bump();
                if self.peek() == Some(';') {
                    self.bump();
                    Ok((Token::DSemi, line))
                } else if self.peek() == Some('&') {
                    self.bump();
                    Ok((Token::SemiAnd, line))
                } else {
                    Ok((Token::Semi, line))
                }
            }
            '&' => {
                self.bump();
                if self.peek() == Some('&') {
                    self.bump();
                    Ok((Token::AndAnd, line))
                } else {
                    Ok((Token::Amp, line))
                }
            }
            '|' => {
                self.bump();
                if self.peek() == Some('|') {
                    self.bump();
                    Ok((Token::OrOr, line))
                } else {
                    Ok((Token::Pipe, line))
                }
            }
            '(' => {
                self.bump();
                Ok((Token::LParen, line))
            }
            ')' => {
                self.bump();
                Ok((Token::RParen, line))
            }
            '<' | '>' => {
                let (kind, strip_tabs) = self.read_redir_op()?;
                Ok((Token::Redir { fd: None, kind, strip_tabs }, line))
            }
            _ => {
                let word = self.read_word()?;
                Ok((Token::Word(word), line))
            }
        }
    }

    fn read_redir_op(&mut self) -> Result<(RedirKind, bool), ParseError> {
        let c = self.bump().ok_or_else(|| self.error("unexpected end of input"))?;
        let kind = if c == '<' {
            match self.peek() {
                Some('<') => {
                    self.bump();
                    if self.peek() == Some('-') {
                        self.bump();
                        return Ok((RedirKind::HereDoc, true));
                    }
                    return Ok((RedirKind::HereDoc, false));
                }
                Some('&') => {
                    self.bump();
                    RedirKind::FromFd
                }
                Some('>') => {
                    self.bump();
                    RedirKind::FromTo
                }
                _ => RedirKind::From,
            }
        } else {
            match self.peek() {
                Some('>') => {
                    self.bump();
                    RedirKind::Append
                }
                Some('&') => {
                    self.bump();
                    RedirKind::ToFd
                }
                Some('|') => {
                    self.bump();
                    RedirKind::Clobber
                }
                _ => RedirKind::To,
            }
        };
        Ok((kind, false))
    }

    // =========================================================================
    // Words
    // =========================================================================

    fn read_word(&mut self) -> Result<Word, ParseError> {
        let line = self.line;
        let mut parts: Vec<WordPart> = Vec::new();
        let mut lit = String::new();

        macro_rules! flush {
            () => {
                if !lit.is_empty() {
                    parts.push(WordPart::Literal(std::mem::take(&mut lit)));
                }
            };
        }

        while let Some(c) = self.peek() {
            if is_meta(c) {
                break;
            }
            match c {
                '\'' => {
                    self.bump();
                    flush!();
                    parts.push(WordPart::SingleQuoted(self.read_single_quoted()?));
                }
                '"' => {
                    self.bump();
                    flush!();
                    parts.push(WordPart::DoubleQuoted(self.read_double_quoted()?));
                }
                '\\' => {
                    self.bump();
                    match self.bump() {
                        Some('\n') => {} // line continuation
                        Some(esc) => {
                            flush!();
                            parts.push(WordPart::Escaped(esc));
                        }
                        None => return Err(self.error("trailing backslash")),
                    }
                }
                '$' => {
                    flush!();
                    parts.push(self.read_dollar()?);
                }
                '`' => {
                    self.bump();
                    flush!();
                    parts.push(self.read_backquoted()?);
                }
                _ => {
                    self.bump();
                    lit.push(c);
                }
            }
        }
        if !lit.is_empty() {
            parts.push(WordPart::Literal(lit));
        }
        if parts.is_empty() {
            return Err(self.error("expected word"));
        }
        Ok(Word::new(parts, line))
    }

    fn read_single_quoted(&mut self) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\'') => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated single quote")),
            }
        }
    }

    fn read_double_quoted(&mut self) -> Result<Vec<WordPart>, ParseError> {
        let mut parts = Vec::new();
        let mut lit = String::new();
        loop {
            let c = self.peek().ok_or_else(|| self.error("unterminated double quote"))?;
            match c {
                '"' => {
                    self.bump();
                    break;
                }
                '\\' => {
                    self.bump();
                    match self.bump() {
                        // Inside double quotes only these four stay special.
                        Some(esc @ ('$' | '`' | '"' | '\\')) => {
                            if !lit.is_empty() {
                                parts.push(WordPart::Literal(std::mem::take(&mut lit)));
                            }
                            parts.push(WordPart::Escaped(esc));
                        }
                        Some('\n') => {}
                        Some(other) => {
                            lit.push('\\');
                            lit.push(other);
                        }
                        None => return Err(self.error("unterminated double quote")),
                    }
                }
                '$' => {
                    if !lit.is_empty() {
                        parts.push(WordPart::Literal(std::mem::take(&mut lit)));
                    }
                    parts.push(self.read_dollar()?);
                }
                '`' => {
                    self.bump();
                    if !lit.is_empty() {
                        parts.push(WordPart::Literal(std::mem::take(&mut lit)));
                    }
                    parts.push(self.read_backquoted()?);
                }
                _ => {
                    self.bump();
                    lit.push(c);
                }
            }
        }
        if !lit.is_empty() {
            parts.push(WordPart::Literal(lit));
        }
        Ok(parts)
    }

    /// Parse `$name`, `${...}`, or `$( ... )` with the cursor on the `$`.
    fn read_dollar(&mut self) -> Result<WordPart, ParseError> {
        self.bump(); // consume '$'
        match self.peek() {
            Some('(') => {
                if self.peek_at(1) == Some('(') {
                    return Err(self.error("arithmetic expansion is not supported"));
                }
                self.bump();
                let inner = self.take_balanced('(', ')')?;
                let cmds = crate::parser::parse_all(&inner)
                    .map_err(|e| self.error(format!("in command substitution: {}", e.message)))?;
                Ok(WordPart::CommandSubst(cmds))
            }
            Some('{') => {
                self.bump();
                self.read_braced_param()
            }
            Some(c) if is_name_start(c) => {
                let mut name = String::new();
                while let Some(c) = self.peek() {
                    if !is_name_char(c) {
                        break;
                    }
                    name.push(c);
                    self.bump();
                }
                Ok(WordPart::Param(ParamExp { name, op: None }))
            }
            Some(c) if c.is_ascii_digit() || matches!(c, '?' | '#' | '@' | '*' | '$' | '!' | '-') => {
                self.bump();
                Ok(WordPart::Param(ParamExp { name: c.to_string(), op: None }))
            }
            // A lone dollar is literal.
            _ => Ok(WordPart::Literal("$".to_string())),
        }
    }

    fn read_braced_param(&mut self) -> Result<WordPart, ParseError> {
        // ${#name} is length; read it before the general name.
        if self.peek() == Some('#') && self.peek_at(1).map(|c| is_name_char(c)).unwrap_or(false) {
            self.bump();
            let name = self.read_param_name()?;
            if self.bump() != Some('}') {
                return Err(self.error("bad substitution"));
            }
            return Ok(WordPart::Param(ParamExp { name, op: Some(ParamOp::Length) }));
        }

        let name = self.read_param_name()?;
        let op = match self.peek() {
            Some('}') => {
                self.bump();
                None
            }
            Some(_) => {
                let op = self.read_param_op()?;
                Some(op)
            }
            None => return Err(self.error("unterminated parameter expansion")),
        };
        Ok(WordPart::Param(ParamExp { name, op }))
    }

    fn read_param_name(&mut self) -> Result<String, ParseError> {
        let mut name = String::new();
        match self.peek() {
            Some(c) if is_name_start(c) => {
                while let Some(c) = self.peek() {
                    if !is_name_char(c) {
                        break;
                    }
                    name.push(c);
                    self.bump();
                }
            }
            Some(c) if c.is_ascii_digit() || matches!(c, '?' | '#' | '@' | '*' | '$' | '!' | '-') => {
                name.push(c);
                self.bump();
            }
            _ => return Err(self.error("bad substitution")),
        }
        Ok(name)
    }

    fn read_param_op(&mut self) -> Result<ParamOp, ParseError> {
        let colon = self.peek() == Some(':');
        if colon {
            self.bump();
        }
        let opc = self.bump().ok_or_else(|| self.error("unterminated parameter expansion"))?;
        match opc {
            '-' | '=' | '+' | '?' => {
                let word = self.read_param_word()?;
                Ok(match opc {
                    '-' => ParamOp::Default { word, colon },
                    '=' => ParamOp::Assign { word, colon },
                    '+' => ParamOp::Alternative { word, colon },
                    _ => ParamOp::Error { word, colon },
                })
            }
            '#' | '%' if !colon => {
                let longest = self.peek() == Some(opc);
                if longest {
                    self.bump();
                }
                let pattern = self.read_param_word()?;
                Ok(if opc == '#' {
                    ParamOp::RemovePrefix { pattern, longest }
                } else {
                    ParamOp::RemoveSuffix { pattern, longest }
                })
            }
            _ => Err(self.error("bad substitution")),
        }
    }

    /// Word following a parameter operator, up to the closing `}`.
    fn read_param_word(&mut self) -> Result<Word, ParseError> {
        let line = self.line;
        let mut parts = Vec::new();
        let mut lit = String::new();
        loop {
            let c = self.peek().ok_or_else(|| self.error("unterminated parameter expansion"))?;
            match c {
                '}' => {
                    self.bump();
                    break;
                }
                '\'' => {
                    self.bump();
                    if !lit.is_empty() {
                        parts.push(WordPart::Literal(std::mem::take(&mut lit)));
                    }
                    parts.push(WordPart::SingleQuoted(self.read_single_quoted()?));
                }
                '"' => {
                    self.bump();
                    if !lit.is_empty() {
                        parts.push(WordPart::Literal(std::mem::take(&mut lit)));
                    }
                    parts.push(WordPart::DoubleQuoted(self.read_double_quoted()?));
                }
                '\\' => {
                    self.bump();
                    match self.bump() {
                        Some('\n') => {}
                        Some(esc) => {
                            if !lit.is_empty() {
                                parts.push(WordPart::Literal(std::mem::take(&mut lit)));
                            }
                            parts.push(WordPart::Escaped(esc));
                        }
                        None => return Err(self.error("unterminated parameter expansion")),
                    }
                }
                '$' => {
                    if !lit.is_empty() {
                        parts.push(WordPart::Literal(std::mem::take(&mut lit)));
                    }
                    parts.push(self.read_dollar()?);
                }
                _ => {
                    self.bump();
                    lit.push(c);
                }
            }
        }
        if !lit.is_empty() {
            parts.push(WordPart::Literal(lit));
        }
        Ok(Word::new(parts, line))
    }

    fn read_backquoted(&mut self) -> Result<WordPart, ParseError> {
        let mut inner = String::new();
        loop {
            match self.bump() {
                Some('`') => break,
                Some('\\') => match self.bump() {
                    // Backslash is removed only before these inside backquotes.
                    Some(esc @ ('$' | '`' | '\\')) => inner.push(esc),
                    Some(other) => {
                        inner.push('\\');
                        inner.push(other);
                    }
                    None => return Err(self.error("unterminated backquote")),
                },
                Some(c) => inner.push(c),
                None => return Err(self.error("unterminated backquote")),
            }
        }
        let cmds = crate::parser::parse_all(&inner)
            .map_err(|e| self.error(format!("in command substitution: {}", e.message)))?;
        Ok(WordPart::CommandSubst(cmds))
    }

    /// Consume text up to the matching close delimiter, honoring quoting
    /// and nesting. The cursor sits just past the open delimiter on entry.
    fn take_balanced(&mut self, open: char, close: char) -> Result<String, ParseError> {
        let mut depth = 1usize;
        let mut out = String::new();
        loop {
            let c = self.bump().ok_or_else(|| self.error("unterminated command substitution"))?;
            match c {
                c if c == open => {
                    depth += 1;
                    out.push(c);
                }
                c if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push(c);
                }
                '\'' => {
                    out.push('\'');
                    loop {
                        let q = self
                            .bump()
                            .ok_or_else(|| self.error("unterminated single quote"))?;
                        out.push(q);
                        if q == '\'' {
                            break;
                        }
                    }
                }
                '"' => {
                    out.push('"');
                    loop {
                        let q = self
                            .bump()
                            .ok_or_else(|| self.error("unterminated double quote"))?;
                        out.push(q);
                        if q == '\\' {
                            if let Some(n) = self.bump() {
                                out.push(n);
                            }
                        } else if q == '"' {
                            break;
                        }
                    }
                }
                '\\' => {
                    out.push('\\');
                    if let Some(n) = self.bump() {
                        out.push(n);
                    }
                }
                _ => out.push(c),
            }
        }
    }

    // =========================================================================
    // Here-documents
    // =========================================================================

    /// Lift the body of a here-document out of the upcoming lines. Called
    /// by the parser as soon as it has read the delimiter word; the body
    /// begins on the line after the one currently being tokenized (or after
    /// any body already stolen from that point).
    pub fn steal_heredoc_body(
        &mut self,
        delim: &str,
        strip_tabs: bool,
    ) -> Result<String, ParseError> {
        // Locate the start of the next line, past regions already stolen.
        let mut scan = self.pos;
        while scan < self.src.len() && self.src[scan] != b'\n' {
            scan += 1;
        }
        if scan < self.src.len() {
            scan += 1; // past the newline
        }
        loop {
            match self.stolen.iter().find(|r| r.start == scan) {
                Some(r) => scan = r.end,
                None => break,
            }
        }

        let start = scan;
        let mut body = String::new();
        let mut newlines = 0u32;
        loop {
            if scan >= self.src.len() {
                return Err(self.error(format!(
                    "here-document delimited by end-of-file (wanted `{}')",
                    delim
                )));
            }
            let line_start = scan;
            while scan < self.src.len() && self.src[scan] != b'\n' {
                scan += 1;
            }
            let line = std::str::from_utf8(&self.src[line_start..scan]).unwrap_or("");
            if scan < self.src.len() {
                scan += 1;
                newlines += 1;
            }
            let check: &str = if strip_tabs { line.trim_start_matches('\t') } else { line };
            if check == delim {
                self.stolen.push(StolenRegion { start, end: scan, newlines });
                return Ok(body);
            }
            if strip_tabs {
                body.push_str(line.trim_start_matches('\t'));
            } else {
                body.push_str(line);
            }
            body.push('\n');
        }
    }

    /// Re-scan here-document content for expansions (used when the delimiter
    /// was unquoted). Only `$`, backquote, and backslash stay special.
    pub fn lex_heredoc_content(content: &str, lineno: u32) -> Result<Word, ParseError> {
        let mut lx = Lexer::new(content);
        let mut parts = Vec::new();
        let mut lit = String::new();
        while let Some(c) = lx.peek() {
            match c {
                '\\' => {
                    lx.bump();
                    match lx.bump() {
                        Some(esc @ ('$' | '`' | '\\')) => {
                            if !lit.is_empty() {
                                parts.push(WordPart::Literal(std::mem::take(&mut lit)));
                            }
                            parts.push(WordPart::Escaped(esc));
                        }
                        Some('\n') => {}
                        Some(other) => {
                            lit.push('\\');
                            lit.push(other);
                        }
                        None => lit.push('\\'),
                    }
                }
                '$' => {
                    if !lit.is_empty() {
                        parts.push(WordPart::Literal(std::mem::take(&mut lit)));
                    }
                    parts.push(lx.read_dollar()?);
                }
                '`' => {
                    lx.bump();
                    if !lit.is_empty() {
                        parts.push(WordPart::Literal(std::mem::take(&mut lit)));
                    }
                    parts.push(lx.read_backquoted()?);
                }
                _ => {
                    lx.bump();
                    lit.push(c);
                }
            }
        }
        if !lit.is_empty() {
            parts.push(WordPart::Literal(lit));
        }
        Ok(Word::new(parts, lineno))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        let mut lx = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let (tok, _) = lx.next_token().unwrap();
            let done = tok == Token::Eof;
            out.push(tok);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn test_operators() {
        let toks = tokens("a && b || c ; d & e | f");
        let ops: Vec<&Token> = toks.iter().filter(|t| !matches!(t, Token::Word(_))).collect();
        assert_eq!(
            ops,
            vec![&Token::AndAnd, &Token::OrOr, &Token::Semi, &Token::Amp, &Token::Pipe, &Token::Eof]
        );
    }

    #[test]
    fn test_case_terminators() {
        assert!(tokens("a ;; b").contains(&Token::DSemi));
        assert!(tokens("a ;& b").contains(&Token::SemiAnd));
    }

    #[test]
    fn test_redir_with_fd() {
        let toks = tokens("cmd 2>err");
        assert!(toks.iter().any(|t| matches!(
            t,
            Token::Redir { fd: Some(2), kind: RedirKind::To, .. }
        )));
    }

    #[test]
    fn test_heredoc_operator() {
        let toks = tokens("cat <<-EOF");
        assert!(toks.iter().any(|t| matches!(
            t,
            Token::Redir { kind: RedirKind::HereDoc, strip_tabs: true, .. }
        )));
    }

    #[test]
    fn test_word_quoting() {
        let toks = tokens(r#"a'b c'"d $e"f"#);
        match &toks[0] {
            Token::Word(w) => {
                assert_eq!(w.parts.len(), 4);
                assert!(matches!(&w.parts[0], WordPart::Literal(s) if s == "a"));
                assert!(matches!(&w.parts[1], WordPart::SingleQuoted(s) if s == "b c"));
                assert!(matches!(&w.parts[2], WordPart::DoubleQuoted(_)));
                assert!(matches!(&w.parts[3], WordPart::Literal(s) if s == "f"));
            }
            other => panic!("expected word, got {:?}", other),
        }
    }

    #[test]
    fn test_param_ops() {
        let toks = tokens("${x:-fallback} ${#y} ${z%%.txt}");
        let words: Vec<&Word> = toks
            .iter()
            .filter_map(|t| match t {
                Token::Word(w) => Some(w),
                _ => None,
            })
            .collect();
        assert!(matches!(
            &words[0].parts[0],
            WordPart::Param(ParamExp { op: Some(ParamOp::Default { colon: true, .. }), .. })
        ));
        assert!(matches!(
            &words[1].parts[0],
            WordPart::Param(ParamExp { op: Some(ParamOp::Length), .. })
        ));
        assert!(matches!(
            &words[2].parts[0],
            WordPart::Param(ParamExp { op: Some(ParamOp::RemoveSuffix { longest: true, .. }), .. })
        ));
    }

    #[test]
    fn test_command_substitution() {
        let toks = tokens("echo $(echo hi)");
        let has_subst = toks.iter().any(|t| match t {
            Token::Word(w) => w.parts.iter().any(|p| matches!(p, WordPart::CommandSubst(_))),
            _ => false,
        });
        assert!(has_subst);
    }

    #[test]
    fn test_comment_skipped() {
        let toks = tokens("echo hi # trailing comment");
        assert_eq!(
            toks.iter().filter(|t| matches!(t, Token::Word(_))).count(),
            2
        );
    }

    #[test]
    fn test_steal_heredoc_body() {
        let mut lx = Lexer::new("cat <<-EOF\nline1\n\tline2\nEOF\nrest");
        // Position the cursor past the delimiter word, as the parser would.
        let _ = lx.next_token().unwrap(); // cat
        let _ = lx.next_token().unwrap(); // <<-
        let _ = lx.next_token().unwrap(); // EOF
        let body = lx.steal_heredoc_body("EOF", true).unwrap();
        assert_eq!(body, "line1\nline2\n");
        // Tokenizing resumes after the stolen region.
        let (tok, _) = lx.next_token().unwrap(); // newline ending the cat line
        assert_eq!(tok, Token::Newline);
        let (tok, _) = lx.next_token().unwrap();
        assert_eq!(tok.keyword(), Some("rest"));
    }

    #[test]
    fn test_two_heredocs_on_one_line() {
        let mut lx = Lexer::new("a <<X <<Y\nbody-x\nX\nbody-y\nY\ndone");
        let _ = lx.next_token().unwrap(); // a
        let _ = lx.next_token().unwrap(); // <<
        let _ = lx.next_token().unwrap(); // X
        assert_eq!(lx.steal_heredoc_body("X", false).unwrap(), "body-x\n");
        let _ = lx.next_token().unwrap(); // <<
        let _ = lx.next_token().unwrap(); // Y
        assert_eq!(lx.steal_heredoc_body("Y", false).unwrap(), "body-y\n");
        let (tok, _) = lx.next_token().unwrap();
        assert_eq!(tok, Token::Newline);
        let (tok, _) = lx.next_token().unwrap();
        assert_eq!(tok.keyword(), Some("done"));
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        let mut lx = Lexer::new("'oops");
        assert!(lx.next_token().is_err());
    }
}
