//! Debug dump of syntax trees, used by tests and host tooling.

use std::fmt::Write;

use crate::syntax::{SyntaxElement, SyntaxNode};

/// Indented one-line-per-element rendering:
///
/// ```text
/// Root@0..8
///   Ident@0..3 "abc"
/// ```
pub fn dump_node(node: &SyntaxNode) -> String {
    let mut out = String::new();
    dump_into(&mut out, &SyntaxElement::Node(node.clone()), 0);
    out
}

fn dump_into(out: &mut String, element: &SyntaxElement, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    match element {
        SyntaxElement::Node(node) => {
            writeln!(out, "{:?}@{:?}", node.kind(), node.text_range())
                .expect("String write never fails");
            for child in node.children_with_tokens() {
                dump_into(out, &child, depth + 1);
            }
        }
        SyntaxElement::Token(token) => {
            writeln!(
                out,
                "{:?}@{:?} {:?}",
                token.kind(),
                token.text_range(),
                token.text()
            )
            .expect("String write never fails");
        }
    }
}
