use crate::lexer::lex;
use crate::parser::tests::grammar::{nodes_of, parse_with};
use crate::parser::{Parser, dump};
use crate::syntax::SyntaxKind::*;
use crate::syntax::LanguageConfig;

#[test]
fn done_produces_a_node_over_consumed_tokens() {
    let rule = |p: &mut Parser<'_>, _level: u32| -> bool {
        let marker = p.mark();
        p.advance();
        marker.done(p, Column);
        while !p.eof() {
            p.advance();
        }
        true
    };
    let source = "a b";
    let result = parse_with(source, &rule);

    let root = result.parse.syntax();
    let columns = nodes_of(&root, Column);
    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0].text(), "a");
    assert_eq!(root.text(), source);
}

#[test]
fn abandon_keeps_children_in_parent() {
    let rule = |p: &mut Parser<'_>, _level: u32| -> bool {
        let marker = p.mark();
        p.advance();
        marker.abandon(p);
        while !p.eof() {
            p.advance();
        }
        true
    };
    let result = parse_with("a b", &rule);

    let root = result.parse.syntax();
    assert_eq!(root.children().count(), 0, "no nodes expected");
    assert_eq!(root.text(), "a b");
}

#[test]
fn rollback_discards_consumption_and_nodes() {
    let positions = std::cell::Cell::new((0, 0));
    let rule = |p: &mut Parser<'_>, _level: u32| -> bool {
        let before = p.current_position();
        let marker = p.mark();
        p.advance();
        let inner = p.mark();
        p.advance();
        inner.done(p, Column);
        marker.rollback_to(p);
        positions.set((before, p.current_position()));
        while !p.eof() {
            p.advance();
        }
        true
    };
    let result = parse_with("a b c", &rule);

    let (before, after) = positions.get();
    assert_eq!(before, after);
    let root = result.parse.syntax();
    assert_eq!(nodes_of(&root, Column).len(), 0);
    assert_eq!(root.text(), "a b c");
}

#[test]
fn precede_wraps_an_earlier_node() {
    let rule = |p: &mut Parser<'_>, _level: u32| -> bool {
        let marker = p.mark();
        p.advance();
        let done = marker.done(p, Column);
        p.advance();
        let wrapper = done.precede(p);
        wrapper.done(p, Expression);
        while !p.eof() {
            p.advance();
        }
        true
    };
    let source = "a b c";
    let result = parse_with(source, &rule);

    let root = result.parse.syntax();
    let expr = &nodes_of(&root, Expression)[0];
    assert_eq!(expr.text(), "a b");
    let col = &nodes_of(expr, Column)[0];
    assert_eq!(col.text(), "a");
}

#[test]
fn dissolve_removes_shell_but_keeps_children() {
    let rule = |p: &mut Parser<'_>, _level: u32| -> bool {
        let marker = p.mark();
        p.advance();
        p.advance();
        let done = marker.done(p, Column);
        done.dissolve(p);
        while !p.eof() {
            p.advance();
        }
        true
    };
    let source = "a b c";
    let result = parse_with(source, &rule);

    let root = result.parse.syntax();
    assert_eq!(nodes_of(&root, Column).len(), 0);
    assert_eq!(root.text(), source);
}

#[test]
fn latest_done_tracks_rollback_and_dissolve() {
    let rule = |p: &mut Parser<'_>, _level: u32| -> bool {
        assert!(p.latest_done().is_none());
        let marker = p.mark();
        p.advance();
        let done = marker.done(p, Column);
        assert_eq!(p.latest_done().map(|m| m.kind()), Some(Column));

        let speculative = p.mark();
        p.advance();
        let inner = p.mark();
        p.advance();
        inner.done(p, TableRef);
        assert_eq!(p.latest_done().map(|m| m.kind()), Some(TableRef));
        speculative.rollback_to(p);
        assert_eq!(p.latest_done().map(|m| m.kind()), Some(Column));

        done.dissolve(p);
        assert!(p.latest_done().is_none());
        while !p.eof() {
            p.advance();
        }
        true
    };
    let result = parse_with("a b c d e", &rule);
    assert_eq!(result.parse.syntax().text(), "a b c d e");
}

#[test]
fn marker_error_wraps_tokens_into_error_node() {
    let rule = |p: &mut Parser<'_>, _level: u32| -> bool {
        let marker = p.mark();
        p.advance();
        marker.error(p, "stray token");
        while !p.eof() {
            p.advance();
        }
        true
    };
    let result = parse_with("a b", &rule);

    let root = result.parse.syntax();
    assert_eq!(nodes_of(&root, Error).len(), 1);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics.messages()[0].message, "stray token");
}

#[test]
fn tree_shape_dump_is_stable() {
    let rule = |p: &mut Parser<'_>, _level: u32| -> bool {
        let marker = p.mark();
        p.advance();
        marker.done(p, Column);
        true
    };
    let source = "a";
    let result = Parser::new(source, lex(source), LanguageConfig::flexible_search())
        .run(Root, &rule);

    let rendered = dump::dump_node(&result.parse.syntax());
    insta::assert_snapshot!(rendered, @r#"
    Root@0..1
      Column@0..1
        Ident@0..1 "a"
    "#);
}
