//! Abstract Syntax Tree (AST) Types
//!
//! This module defines the command tree handed from the parser to the
//! evaluator.
//!
//! Architecture:
//!   Input → Lexer → Parser → AST → Evaluator → Output

pub mod types;

pub use types::*;
