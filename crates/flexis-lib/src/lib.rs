//! flexis: parser support runtime for FlexibleSearch / ImpEx tooling.
//!
//! The crate provides the error-recovering recursive-descent machinery that
//! generated grammar rules call into: backtracking markers over an event
//! list, a frame-stack section protocol, expectation tracking for
//! `"X expected, got Y"` messages, bracket-aware recovery, balanced-tree
//! chunking for long repetitions, and code-completion candidate
//! collection. Grammars themselves live with their language plugins; this
//! crate ships the runtime plus the FlexibleSearch-flavored token
//! vocabulary its tests exercise.
//!
//! # Example
//!
//! ```
//! use flexis_lib::lexer::lex;
//! use flexis_lib::parser::Parser;
//! use flexis_lib::syntax::{LanguageConfig, SyntaxKind};
//!
//! let source = "SELECT code FROM products";
//! let consume_all = |p: &mut Parser<'_>, _level: u32| -> bool {
//!     while !p.eof() {
//!         p.advance();
//!     }
//!     true
//! };
//! let result = Parser::new(source, lex(source), LanguageConfig::flexible_search())
//!     .run(SyntaxKind::Root, &consume_all);
//! assert!(result.diagnostics.is_empty());
//! assert_eq!(result.parse.syntax().text(), source);
//! ```

pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod syntax;

#[cfg(test)]
mod syntax_tests;

pub use diagnostics::{DiagnosticKind, Diagnostics, DiagnosticsPrinter, Severity};
pub use parser::{Parse, ParseResult, Parser};
pub use syntax::{LanguageConfig, SyntaxKind, SyntaxNode, SyntaxToken};

/// Errors surfaced to hosts that treat diagnostics as failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("parsing failed with {} errors", .0.error_count())]
    Parse(Diagnostics),
}

/// Result type for parse operations.
pub type Result<T> = std::result::Result<T, Error>;
