//! Parser module
//!
//! Lexer and recursive-descent parser turning shell source into the AST
//! consumed by the evaluator.

use thiserror::Error;

pub mod lexer;
pub mod parser;

pub use lexer::{Lexer, Token};
pub use parser::{parse_all, Parser};

/// Syntax error with the source line it was detected on.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("syntax error: {message} (line {line})")]
pub struct ParseError {
    pub message: String,
    pub line: u32,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: u32) -> Self {
        Self { message: message.into(), line }
    }
}
