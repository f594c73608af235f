//! Parser support runtime.
//!
//! # Architecture
//!
//! This is the generic machinery generated grammar rules call into: it
//! manages backtracking, error reporting, code-completion variant
//! collection and tree-shape normalization while walking a pre-lexed token
//! stream. Key design decisions borrowed from rust-analyzer and rowan-based
//! parsers:
//!
//! - Event-list tree building: markers are indices into a flat event list;
//!   rolling a speculative branch back truncates it, so backtracking is
//!   cheap and rolled-back diagnostics vanish with it
//! - Section protocol: rules bracket their body with
//!   [`Parser::enter_section`]/[`Parser::exit_section`]; a frame stack
//!   mirrors rule nesting and carries modifiers (left-recursion rewriting,
//!   predicate composition, collapsing)
//! - Expectation variants: every failed lookahead records what would have
//!   matched, feeding both `"X expected, got Y"` messages and completion
//!
//! # Recovery strategy
//!
//! The parser is resilient: it always produces a lossless tree. A rule
//! closed with an `eat_more` continuation skips unparsable tokens up to the
//! furthest position any rule expected something, honoring the primary
//! bracket pair, and wraps the skipped run into synthetic
//! [`SyntaxKind::DummyBlock`] chunks. On recursion-limit or empty-progress
//! faults the affected branch aborts with a located diagnostic instead of
//! looping or overflowing the stack.
//!
//! [`SyntaxKind::DummyBlock`]: crate::syntax::SyntaxKind::DummyBlock

mod balance;
mod builder;
mod completion;
mod core;
mod errors;
mod sections;
mod state;

pub mod dump;

#[cfg(test)]
mod tests;

use indexmap::IndexSet;

use crate::Diagnostics;
use crate::syntax::SyntaxNode;

pub use balance::ChunkPolicy;
pub use builder::{CompletedMarker, EdgeBind, Marker};
pub use completion::CompletionState;
pub use core::{Parser, Rule, token_advancer, true_condition};
pub use sections::Modifiers;
pub use state::{Expectation, Hook};

/// Parse result containing the green tree.
///
/// The tree is always complete and lossless—diagnostics are returned
/// separately. Error nodes in the tree represent recovery points.
#[derive(Debug, Clone)]
pub struct Parse {
    cst: rowan::GreenNode,
}

impl Parse {
    pub(crate) fn new(cst: rowan::GreenNode) -> Self {
        Self { cst }
    }

    pub fn as_cst(&self) -> &rowan::GreenNode {
        &self.cst
    }

    /// Creates a typed view over the immutable green tree.
    /// This is cheap—SyntaxNode is a thin wrapper with parent pointers.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.cst.clone())
    }
}

/// Everything one parse run produces.
#[derive(Debug)]
pub struct ParseResult {
    pub parse: Parse,
    pub diagnostics: Diagnostics,
    /// Completion candidates, present when the parser was configured with
    /// `with_completion_at`.
    pub completions: Option<IndexSet<String>>,
}

impl ParseResult {
    /// Treat accumulated error diagnostics as a failure.
    pub fn into_result(self) -> crate::Result<Parse> {
        if self.diagnostics.has_errors() {
            Err(crate::Error::Parse(self.diagnostics))
        } else {
            Ok(self.parse)
        }
    }
}
