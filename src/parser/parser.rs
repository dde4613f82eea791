//! Recursive-descent parser
//!
//! Builds the command tree from the token stream. Reserved words are only
//! recognized in command position; everywhere else they are ordinary words.
//!
//! Grammar shape (POSIX subset):
//!   program   := linebreak (line linebreak)*
//!   line      := and_or ((';' | '&') and_or)* [';' | '&']
//!   and_or    := pipeline (('&&' | '||') linebreak pipeline)*
//!   pipeline  := '!'* command ('|' linebreak command)*
//!   command   := simple | compound [redirect...] | fundef

use crate::ast::types::*;
use crate::parser::lexer::{Lexer, Token};
use crate::parser::ParseError;

/// Parse a complete source text into a list of line-level commands. Each
/// element corresponds to one line of input (a `;`-separated list folds
/// into a single node), which is the unit the string evaluator hands to
/// the tree evaluator.
pub fn parse_all(src: &str) -> Result<Vec<Node>, ParseError> {
    Parser::new(src)?.parse_program()
}

/// Reserved words recognized in command position.
const RESERVED: &[&str] = &[
    "if", "then", "elif", "else", "fi", "while", "until", "for", "do", "done", "case", "esac",
    "in", "{", "}", "!",
];

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    tok: Token,
    tok_line: u32,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(src);
        let (tok, tok_line) = lexer.next_token()?;
        Ok(Self { lexer, tok, tok_line })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        let (tok, line) = self.lexer.next_token()?;
        self.tok = tok;
        self.tok_line = line;
        Ok(())
    }

    fn error(&self, msg: impl Into<String>) -> ParseError {
        ParseError::new(msg, self.tok_line)
    }

    fn at_keyword(&self, kw: &str) -> bool {
        self.tok.keyword() == Some(kw)
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<(), ParseError> {
        if !self.at_keyword(kw) {
            return Err(self.error(format!("expected `{}'", kw)));
        }
        self.advance()
    }

    fn skip_newlines(&mut self) -> Result<(), ParseError> {
        while self.tok == Token::Newline {
            self.advance()?;
        }
        Ok(())
    }

    // =========================================================================
    // Lists
    // =========================================================================

    pub fn parse_program(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut out = Vec::new();
        loop {
            self.skip_newlines()?;
            if self.tok == Token::Eof {
                return Ok(out);
            }
            if let Some(node) = self.parse_list(false)? {
                out.push(node);
            }
            match self.tok {
                Token::Newline => self.advance()?,
                Token::Eof => {}
                _ => return Err(self.error(format!("unexpected token {:?}", self.tok))),
            }
        }
    }

    /// True when the current token ends a list.
    fn at_list_end(&self, newline_ends: bool) -> bool {
        match &self.tok {
            Token::Eof | Token::RParen | Token::DSemi | Token::SemiAnd => true,
            Token::Newline => newline_ends,
            Token::Word(w) => matches!(
                w.as_literal(),
                Some("then") | Some("elif") | Some("else") | Some("fi") | Some("do")
                    | Some("done") | Some("esac") | Some("}")
            ),
            _ => false,
        }
    }

    /// Parse a `;`/`&`-separated list. With `in_compound` set, newlines are
    /// separators rather than terminators (bodies of `if`, loops, groups).
    fn parse_list(&mut self, in_compound: bool) -> Result<Option<Node>, ParseError> {
        let mut acc: Option<Node> = None;
        loop {
            if in_compound {
                self.skip_newlines()?;
            }
            if self.at_list_end(!in_compound) {
                break;
            }
            let mut node = self.parse_and_or()?;
            match self.tok {
                Token::Amp => {
                    self.advance()?;
                    node = make_background(node);
                }
                Token::Semi => {
                    self.advance()?;
                }
                _ => {
                    acc = Some(join_semi(acc, node));
                    break;
                }
            }
            acc = Some(join_semi(acc, node));
        }
        Ok(acc)
    }

    /// Like `parse_list` but a missing body is a syntax error.
    fn parse_compound_list(&mut self) -> Result<Node, ParseError> {
        match self.parse_list(true)? {
            Some(node) => Ok(node),
            None => Err(self.error("expected command")),
        }
    }

    fn parse_and_or(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_pipeline()?;
        loop {
            let and = match self.tok {
                Token::AndAnd => true,
                Token::OrOr => false,
                _ => return Ok(left),
            };
            self.advance()?;
            self.skip_newlines()?;
            let right = self.parse_pipeline()?;
            let bin = BinaryNode { left: Box::new(left), right: Box::new(right) };
            left = if and { Node::And(bin) } else { Node::Or(bin) };
        }
    }

    fn parse_pipeline(&mut self) -> Result<Node, ParseError> {
        let lineno = self.tok_line;
        let mut bangs = 0u32;
        while self.at_keyword("!") {
            bangs += 1;
            self.advance()?;
        }
        let first = self.parse_command()?;
        let mut commands = vec![first];
        while self.tok == Token::Pipe {
            self.advance()?;
            self.skip_newlines()?;
            commands.push(self.parse_command()?);
        }
        let mut node = if commands.len() == 1 {
            commands.pop().ok_or_else(|| self.error("expected command"))?
        } else {
            Node::Pipe(PipeNode { commands, background: false, lineno })
        };
        if bangs > 0 {
            let unary = UnaryNode { body: Box::new(node) };
            node = if bangs % 2 == 1 { Node::Not(unary) } else { Node::DNot(unary) };
        }
        Ok(node)
    }

    // =========================================================================
    // Commands
    // =========================================================================

    fn parse_command(&mut self) -> Result<Node, ParseError> {
        let lineno = self.tok_line;
        match &self.tok {
            Token::LParen => {
                self.advance()?;
                let body = self.parse_compound_list()?;
                if self.tok != Token::RParen {
                    return Err(self.error("expected `)'"));
                }
                self.advance()?;
                let redirect = self.parse_trailing_redirects()?;
                Ok(Node::Subshell(RedirNode { body: Box::new(body), redirect, lineno }))
            }
            Token::Word(_) if self.at_keyword("{") => {
                self.advance()?;
                let body = self.parse_compound_list()?;
                self.expect_keyword("}")?;
                let redirect = self.parse_trailing_redirects()?;
                if redirect.is_empty() {
                    Ok(body)
                } else {
                    Ok(Node::Redir(RedirNode { body: Box::new(body), redirect, lineno }))
                }
            }
            Token::Word(_) if self.at_keyword("if") => self.parse_if(),
            Token::Word(_) if self.at_keyword("while") => self.parse_loop(true),
            Token::Word(_) if self.at_keyword("until") => self.parse_loop(false),
            Token::Word(_) if self.at_keyword("for") => self.parse_for(),
            Token::Word(_) if self.at_keyword("case") => self.parse_case(),
            Token::Word(_) | Token::Redir { .. } => self.parse_simple(),
            other => Err(self.error(format!("unexpected token {:?}", other))),
        }
    }

    /// Redirections attached to a compound command.
    fn parse_trailing_redirects(&mut self) -> Result<Vec<Redir>, ParseError> {
        let mut redirect = Vec::new();
        while let Token::Redir { fd, kind, strip_tabs } = &self.tok {
            let (fd, kind, strip_tabs) = (*fd, *kind, *strip_tabs);
            self.advance()?;
            redirect.push(self.finish_redirect(fd, kind, strip_tabs)?);
        }
        Ok(redirect)
    }

    fn finish_redirect(
        &mut self,
        fd: Option<i32>,
        kind: RedirKind,
        strip_tabs: bool,
    ) -> Result<Redir, ParseError> {
        let lineno = self.tok_line;
        let word = match std::mem::replace(&mut self.tok, Token::Eof) {
            Token::Word(w) => w,
            other => {
                self.tok = other;
                return Err(self.error(format!("expected redirection target after `{}'", kind)));
            }
        };

        let target = if kind == RedirKind::HereDoc {
            // The body is stolen while the cursor still sits on the line
            // containing the operator; only then is the next token read.
            // Quote removal on the delimiter decides whether the body is
            // expanded.
            let quoted = !word.parts.iter().all(|p| matches!(p, WordPart::Literal(_)));
            let delim = delimiter_text(&word);
            let body = self.lexer.steal_heredoc_body(&delim, strip_tabs)?;
            self.advance()?;
            let content = if quoted {
                Word::new(vec![WordPart::SingleQuoted(body)], lineno)
            } else {
                Lexer::lex_heredoc_content(&body, lineno)?
            };
            RedirTarget::HereDoc { content, quoted }
        } else {
            self.advance()?;
            RedirTarget::Word(word)
        };
        Ok(Redir { fd, kind, target, lineno })
    }

    fn parse_simple(&mut self) -> Result<Node, ParseError> {
        let lineno = self.tok_line;
        let mut args: Vec<Word> = Vec::new();
        let mut redirect: Vec<Redir> = Vec::new();

        loop {
            match &self.tok {
                Token::Word(_) => {
                    // Function definition: NAME ( ) command
                    if args.is_empty() && redirect.is_empty() {
                        if let Some(name) = self.tok.keyword() {
                            if crate::interpreter::word_expansion::good_name(name) {
                                let name = name.to_string();
                                self.advance()?;
                                if self.tok == Token::LParen {
                                    self.advance()?;
                                    if self.tok != Token::RParen {
                                        return Err(self.error("expected `)' in function definition"));
                                    }
                                    self.advance()?;
                                    self.skip_newlines()?;
                                    let body = self.parse_command()?;
                                    return Ok(Node::DefFun(DefFunNode {
                                        name,
                                        body: Box::new(body),
                                        lineno,
                                    }));
                                }
                                args.push(Word::literal(&name, lineno));
                                continue;
                            }
                        }
                    }
                    let word = match std::mem::replace(&mut self.tok, Token::Eof) {
                        Token::Word(w) => w,
                        _ => unreachable!(),
                    };
                    args.push(word);
                    self.advance()?;
                }
                Token::Redir { fd, kind, strip_tabs } => {
                    let (fd, kind, strip_tabs) = (*fd, *kind, *strip_tabs);
                    self.advance()?;
                    redirect.push(self.finish_redirect(fd, kind, strip_tabs)?);
                }
                _ => break,
            }
        }
        if args.is_empty() && redirect.is_empty() {
            return Err(self.error("expected command"));
        }
        Ok(Node::Cmd(CmdNode { args, redirect, background: false, lineno }))
    }

    fn parse_if(&mut self) -> Result<Node, ParseError> {
        let lineno = self.tok_line;
        self.expect_keyword("if")?;
        let test = self.parse_compound_list()?;
        self.expect_keyword("then")?;
        let then_part = self.parse_compound_list()?;
        let else_part = self.parse_if_tail(lineno)?;
        Ok(Node::If(IfNode {
            test: Box::new(test),
            then_part: Box::new(then_part),
            else_part,
            lineno,
        }))
    }

    fn parse_if_tail(&mut self, lineno: u32) -> Result<Option<Box<Node>>, ParseError> {
        if self.at_keyword("elif") {
            self.advance()?;
            let test = self.parse_compound_list()?;
            self.expect_keyword("then")?;
            let then_part = self.parse_compound_list()?;
            let else_part = self.parse_if_tail(lineno)?;
            Ok(Some(Box::new(Node::If(IfNode {
                test: Box::new(test),
                then_part: Box::new(then_part),
                else_part,
                lineno,
            }))))
        } else if self.at_keyword("else") {
            self.advance()?;
            let body = self.parse_compound_list()?;
            self.expect_keyword("fi")?;
            Ok(Some(Box::new(body)))
        } else {
            self.expect_keyword("fi")?;
            Ok(None)
        }
    }

    fn parse_loop(&mut self, is_while: bool) -> Result<Node, ParseError> {
        let lineno = self.tok_line;
        self.advance()?; // while / until
        let cond = self.parse_compound_list()?;
        self.expect_keyword("do")?;
        let body = self.parse_compound_list()?;
        self.expect_keyword("done")?;
        let node = LoopNode { cond: Box::new(cond), body: Box::new(body), lineno };
        Ok(if is_while { Node::While(node) } else { Node::Until(node) })
    }

    fn parse_for(&mut self) -> Result<Node, ParseError> {
        let lineno = self.tok_line;
        self.expect_keyword("for")?;
        let var = match self.tok.keyword() {
            Some(name) if crate::interpreter::word_expansion::good_name(name) => name.to_string(),
            _ => return Err(self.error("bad for loop variable")),
        };
        self.advance()?;
        self.skip_newlines()?;

        let args = if self.at_keyword("in") {
            self.advance()?;
            let mut words = Vec::new();
            while let Token::Word(_) = &self.tok {
                let word = match std::mem::replace(&mut self.tok, Token::Eof) {
                    Token::Word(w) => w,
                    _ => unreachable!(),
                };
                words.push(word);
                self.advance()?;
            }
            if self.tok == Token::Semi {
                self.advance()?;
            }
            words
        } else {
            if self.tok == Token::Semi {
                self.advance()?;
            }
            // No `in` list: iterate "$@".
            vec![Word::new(
                vec![WordPart::DoubleQuoted(vec![WordPart::Param(ParamExp {
                    name: "@".to_string(),
                    op: None,
                })])],
                lineno,
            )]
        };

        self.skip_newlines()?;
        self.expect_keyword("do")?;
        let body = self.parse_compound_list()?;
        self.expect_keyword("done")?;
        Ok(Node::For(ForNode { var, args, body: Box::new(body), lineno }))
    }

    fn parse_case(&mut self) -> Result<Node, ParseError> {
        let lineno = self.tok_line;
        self.expect_keyword("case")?;
        let expr = match std::mem::replace(&mut self.tok, Token::Eof) {
            Token::Word(w) => w,
            other => {
                self.tok = other;
                return Err(self.error("expected word after `case'"));
            }
        };
        self.advance()?;
        self.skip_newlines()?;
        self.expect_keyword("in")?;

        let mut items = Vec::new();
        loop {
            self.skip_newlines()?;
            if self.at_keyword("esac") {
                self.advance()?;
                break;
            }
            if self.tok == Token::LParen {
                self.advance()?;
            }
            let item_line = self.tok_line;
            let mut patterns = Vec::new();
            loop {
                match std::mem::replace(&mut self.tok, Token::Eof) {
                    Token::Word(w) => {
                        patterns.push(w);
                        self.advance()?;
                    }
                    other => {
                        self.tok = other;
                        return Err(self.error("expected pattern in case item"));
                    }
                }
                if self.tok == Token::Pipe {
                    self.advance()?;
                } else {
                    break;
                }
            }
            if self.tok != Token::RParen {
                return Err(self.error("expected `)' after case pattern"));
            }
            self.advance()?;
            self.skip_newlines()?;

            let body = if self.tok == Token::DSemi
                || self.tok == Token::SemiAnd
                || self.at_keyword("esac")
            {
                None
            } else {
                Some(Box::new(self.parse_compound_list()?))
            };

            let fallthrough = match self.tok {
                Token::DSemi => {
                    self.advance()?;
                    false
                }
                Token::SemiAnd => {
                    self.advance()?;
                    true
                }
                _ => {
                    // Final arm may omit the terminator.
                    self.skip_newlines()?;
                    if !self.at_keyword("esac") {
                        return Err(self.error("expected `;;'"));
                    }
                    false
                }
            };
            items.push(CaseItem { patterns, body, fallthrough, lineno: item_line });
        }
        Ok(Node::Case(CaseNode { expr, items, lineno }))
    }
}

/// Fold `a ; b` lists left-associatively.
fn join_semi(acc: Option<Node>, node: Node) -> Node {
    match acc {
        None => node,
        Some(left) => Node::Semi(BinaryNode { left: Box::new(left), right: Box::new(node) }),
    }
}

/// Mark a command to run in the background. Simple commands and pipelines
/// carry the flag directly; anything else gets wrapped.
fn make_background(node: Node) -> Node {
    match node {
        Node::Cmd(mut cmd) => {
            cmd.background = true;
            Node::Cmd(cmd)
        }
        Node::Pipe(mut pipe) => {
            pipe.background = true;
            Node::Pipe(pipe)
        }
        other => {
            let lineno = other.lineno();
            Node::Background(RedirNode { body: Box::new(other), redirect: vec![], lineno })
        }
    }
}

/// Literal text of a here-document delimiter after quote removal.
fn delimiter_text(word: &Word) -> String {
    let mut out = String::new();
    for part in &word.parts {
        match part {
            WordPart::Literal(s) | WordPart::SingleQuoted(s) => out.push_str(s),
            WordPart::Escaped(c) => out.push(*c),
            WordPart::DoubleQuoted(inner) => {
                for p in inner {
                    if let WordPart::Literal(s) = p {
                        out.push_str(s);
                    }
                }
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(src: &str) -> Node {
        let mut nodes = parse_all(src).unwrap();
        assert_eq!(nodes.len(), 1, "expected one line from {:?}", src);
        nodes.pop().unwrap()
    }

    #[test]
    fn test_simple_command() {
        match parse_one("echo hello world") {
            Node::Cmd(cmd) => assert_eq!(cmd.args.len(), 3),
            other => panic!("expected cmd, got {:?}", other),
        }
    }

    #[test]
    fn test_semi_chain_folds_left() {
        match parse_one("a; b; c") {
            Node::Semi(bin) => assert!(matches!(*bin.left, Node::Semi(_))),
            other => panic!("expected semi, got {:?}", other),
        }
    }

    #[test]
    fn test_and_or() {
        match parse_one("true && echo yes || echo no") {
            Node::Or(bin) => assert!(matches!(*bin.left, Node::And(_))),
            other => panic!("expected or, got {:?}", other),
        }
    }

    #[test]
    fn test_negation() {
        assert!(matches!(parse_one("! true"), Node::Not(_)));
        assert!(matches!(parse_one("! ! true"), Node::DNot(_)));
    }

    #[test]
    fn test_pipeline() {
        match parse_one("a | b | c") {
            Node::Pipe(pipe) => {
                assert_eq!(pipe.commands.len(), 3);
                assert!(!pipe.background);
            }
            other => panic!("expected pipe, got {:?}", other),
        }
    }

    #[test]
    fn test_background_flags() {
        match parse_one("sleep 5 &") {
            Node::Cmd(cmd) => assert!(cmd.background),
            other => panic!("expected cmd, got {:?}", other),
        }
        match parse_one("a | b &") {
            Node::Pipe(pipe) => assert!(pipe.background),
            other => panic!("expected pipe, got {:?}", other),
        }
        assert!(matches!(parse_one("( a ) &"), Node::Background(_)));
    }

    #[test]
    fn test_if_elif_else() {
        match parse_one("if a; then b; elif c; then d; else e; fi") {
            Node::If(node) => {
                let elif = node.else_part.expect("elif arm");
                match *elif {
                    Node::If(inner) => assert!(inner.else_part.is_some()),
                    other => panic!("expected nested if, got {:?}", other),
                }
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_while_until() {
        assert!(matches!(parse_one("while a; do b; done"), Node::While(_)));
        assert!(matches!(parse_one("until a; do b; done"), Node::Until(_)));
    }

    #[test]
    fn test_for_with_and_without_in() {
        match parse_one("for i in a b c; do echo $i; done") {
            Node::For(node) => {
                assert_eq!(node.var, "i");
                assert_eq!(node.args.len(), 3);
            }
            other => panic!("expected for, got {:?}", other),
        }
        match parse_one("for i; do echo $i; done") {
            Node::For(node) => assert_eq!(node.args.len(), 1),
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_case_with_fallthrough() {
        let src = "case $x in a) echo a ;& b) echo b ;; *) echo other ;; esac";
        match parse_one(src) {
            Node::Case(node) => {
                assert_eq!(node.items.len(), 3);
                assert!(node.items[0].fallthrough);
                assert!(!node.items[1].fallthrough);
            }
            other => panic!("expected case, got {:?}", other),
        }
    }

    #[test]
    fn test_case_empty_arm_and_final_arm_without_terminator() {
        let src = "case x in a) ;; b) echo b\nesac";
        match parse_one(src) {
            Node::Case(node) => {
                assert!(node.items[0].body.is_none());
                assert!(node.items[1].body.is_some());
            }
            other => panic!("expected case, got {:?}", other),
        }
    }

    #[test]
    fn test_subshell_and_group() {
        match parse_one("( a; b ) > out") {
            Node::Subshell(node) => assert_eq!(node.redirect.len(), 1),
            other => panic!("expected subshell, got {:?}", other),
        }
        // A group without redirections is just its list.
        assert!(matches!(parse_one("{ a; b; }"), Node::Semi(_)));
        assert!(matches!(parse_one("{ a; } 2> err"), Node::Redir(_)));
    }

    #[test]
    fn test_function_definition() {
        match parse_one("greet() { echo hi; }") {
            Node::DefFun(def) => assert_eq!(def.name, "greet"),
            other => panic!("expected deffun, got {:?}", other),
        }
    }

    #[test]
    fn test_redirections_on_simple_command() {
        match parse_one("cmd < in > out 2>&1") {
            Node::Cmd(cmd) => {
                assert_eq!(cmd.redirect.len(), 3);
                assert_eq!(cmd.redirect[2].fd, Some(2));
                assert_eq!(cmd.redirect[2].kind, RedirKind::ToFd);
            }
            other => panic!("expected cmd, got {:?}", other),
        }
    }

    #[test]
    fn test_heredoc() {
        let nodes = parse_all("cat <<EOF\nhello $x\nEOF\necho after").unwrap();
        assert_eq!(nodes.len(), 2);
        match &nodes[0] {
            Node::Cmd(cmd) => match &cmd.redirect[0].target {
                RedirTarget::HereDoc { content, quoted } => {
                    assert!(!quoted);
                    assert!(content.parts.len() >= 2);
                }
                other => panic!("expected heredoc, got {:?}", other),
            },
            other => panic!("expected cmd, got {:?}", other),
        }
    }

    #[test]
    fn test_quoted_heredoc_is_literal() {
        let nodes = parse_all("cat <<'EOF'\nhello $x\nEOF").unwrap();
        match &nodes[0] {
            Node::Cmd(cmd) => match &cmd.redirect[0].target {
                RedirTarget::HereDoc { content, quoted } => {
                    assert!(quoted);
                    assert_eq!(content.parts.len(), 1);
                    assert!(matches!(&content.parts[0], WordPart::SingleQuoted(s) if s == "hello $x\n"));
                }
                other => panic!("expected heredoc, got {:?}", other),
            },
            other => panic!("expected cmd, got {:?}", other),
        }
    }

    #[test]
    fn test_reserved_word_only_in_command_position() {
        match parse_one("echo if then fi") {
            Node::Cmd(cmd) => assert_eq!(cmd.args.len(), 4),
            other => panic!("expected cmd, got {:?}", other),
        }
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse_all("if true; then echo hi").is_err());
        assert!(parse_all("while ; do done").is_err());
        assert!(parse_all("( a").is_err());
        assert!(parse_all("a &&").is_err());
    }

    #[test]
    fn test_lineno_tracking() {
        let nodes = parse_all("true\n\nfalse").unwrap();
        assert_eq!(nodes[0].lineno(), 1);
        assert_eq!(nodes[1].lineno(), 3);
    }
}
