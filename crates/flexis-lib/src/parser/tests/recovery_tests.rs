use indoc::indoc;

use crate::parser::tests::grammar::{nodes_of, parse, parse_with};
use crate::parser::{Modifiers, Parser};
use crate::syntax::SyntaxKind::*;

#[test]
fn multi_line_statement_keeps_comments() {
    let source = indoc! {"
        SELECT code, name -- selected columns
        FROM products
    "};
    let result = parse(source);

    assert!(
        result.diagnostics.is_empty(),
        "unexpected: {:?}",
        result.diagnostics
    );
    assert_eq!(result.parse.syntax().text(), source);
}

#[test]
fn valid_statement_has_no_diagnostics() {
    let source = "SELECT code, name FROM products";
    let result = parse(source);
    assert!(
        result.diagnostics.is_empty(),
        "unexpected: {:?}",
        result.diagnostics
    );
    assert_eq!(result.parse.syntax().text(), source);

    let root = result.parse.syntax();
    assert_eq!(nodes_of(&root, Statement).len(), 1);
    assert_eq!(nodes_of(&root, SelectList).len(), 1);
    assert_eq!(nodes_of(&root, Column).len(), 2);
    assert_eq!(nodes_of(&root, TableRef).len(), 1);
}

#[test]
fn missing_column_reports_expected_set() {
    let source = "SELECT FROM products";
    let result = parse(source);

    assert_eq!(result.diagnostics.len(), 1);
    let message = &result.diagnostics.messages()[0].message;
    insta::assert_snapshot!(message, @"'*' or <identifier> expected, got 'FROM'");
    // the tree still covers the whole input
    assert_eq!(result.parse.syntax().text(), source);
}

#[test]
fn expected_set_is_deduplicated() {
    // two alternatives that both expect an identifier at the same position
    let alt_a = |p: &mut Parser<'_>, level: u32| -> bool {
        let marker = p.enter_section(level, Modifiers::NONE, None, None);
        let mut result = p.consume_token(Ident);
        result = result && p.consume_token(Comma);
        p.exit_section(level, marker, None, result, false, None);
        result
    };
    let alt_b = |p: &mut Parser<'_>, level: u32| -> bool {
        let marker = p.enter_section(level, Modifiers::NONE, None, None);
        let mut result = p.consume_token(Ident);
        result = result && p.consume_token(Semicolon);
        p.exit_section(level, marker, None, result, false, None);
        result
    };
    let both = move |p: &mut Parser<'_>, level: u32| -> bool {
        alt_a(p, level + 1) || alt_b(p, level + 1)
    };

    let result = parse_with("42", &both);
    assert_eq!(result.diagnostics.len(), 1);
    let message = &result.diagnostics.messages()[0].message;
    insta::assert_snapshot!(message, @"<identifier> expected, got '42'");
    assert_eq!(message.matches("<identifier>").count(), 1);
}

#[test]
fn failed_named_frame_collapses_variants_into_rule_name() {
    let named = |p: &mut Parser<'_>, level: u32| -> bool {
        let marker =
            p.enter_section(level, Modifiers::NONE, Some(Column), Some("<column reference>"));
        let result = p.consume_token(Ident) || p.consume_token(Star);
        p.exit_section(level, marker, None, result, false, None);
        result
    };
    let result = parse_with("42", &named);

    assert_eq!(result.diagnostics.len(), 1);
    let message = &result.diagnostics.messages()[0].message;
    insta::assert_snapshot!(message, @"<column reference> expected, got '42'");
}

#[test]
fn unexpected_end_of_file_message() {
    let source = "SELECT code FROM";
    let result = parse(source);

    assert_eq!(result.diagnostics.len(), 1);
    let message = &result.diagnostics.messages()[0].message;
    insta::assert_snapshot!(message, @"<identifier> expected, unexpected end of file");
    assert_eq!(result.parse.syntax().text(), source);
}

#[test]
fn recovery_consumes_unterminated_bracket_through_eof() {
    // "( a b": pinned on '(', the close paren never comes
    let paren_block = |p: &mut Parser<'_>, level: u32| -> bool {
        let marker =
            p.enter_section(level, Modifiers::NONE, Some(Expression), Some("<paren block>"));
        let result = p.consume_token(LParen);
        let pinned = result;
        let result = result && p.consume_token(Ident);
        let result = result && p.consume_token(RParen);
        let eat_more = |p: &mut Parser<'_>, _level: u32| -> bool { !p.eof() };
        p.exit_section(level, marker, None, result, pinned, Some(&eat_more));
        result || pinned
    };
    let source = "( a b";
    let result = parse_with(source, &paren_block);

    // everything was consumed, nothing was prematurely treated as balanced
    assert_eq!(result.parse.syntax().text(), source);
    assert!(result.diagnostics.has_errors());
    let message = &result.diagnostics.messages()[0].message;
    assert!(message.contains("')'"), "got: {message}");

    // the recovered garbage is wrapped, and the expression node extends
    // over it
    let root = result.parse.syntax();
    let expr = &nodes_of(&root, Expression)[0];
    assert_eq!(expr.text(), source);
    assert_eq!(nodes_of(&root, Error).len(), 1);
}

#[test]
fn trailing_garbage_is_wrapped_into_recovery_chunks() {
    let source = "SELECT code FROM products 12 34 56";
    let result = parse(source);

    assert!(result.diagnostics.has_errors());
    assert_eq!(result.parse.syntax().text(), source);
    // skipped tokens end up inside the statement, not dangling after it
    let root = result.parse.syntax();
    let statement = &nodes_of(&root, Statement)[0];
    assert_eq!(statement.text(), source);
}

#[test]
fn error_position_reported_once() {
    // the trailing comma fails the list; only one error is surfaced even
    // though several alternatives failed at the same spot
    let source = "SELECT code, FROM products";
    let result = parse(source);

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.parse.syntax().text(), source);
}

#[test]
fn unparsable_input_still_produces_lossless_tree() {
    let source = "{ ) 12 }";
    let result = parse(source);

    assert!(result.diagnostics.has_errors());
    assert_eq!(result.parse.syntax().text(), source);
}

#[test]
fn recursion_limit_reports_located_error() {
    let source = "SELECT a FROM t WHERE ((((((((x = 1))))))))";
    let result = Parser::new(
        source,
        crate::lexer::lex(source),
        crate::syntax::LanguageConfig::flexible_search(),
    )
    .with_recursion_limit(4)
    .run(Root, &crate::parser::tests::grammar::statement);

    assert!(result.diagnostics.has_errors());
    let rendered: Vec<_> = result
        .diagnostics
        .iter()
        .map(|d| d.kind)
        .collect();
    assert!(rendered.contains(&crate::diagnostics::DiagnosticKind::RecursionLimit));
    assert_eq!(result.parse.syntax().text(), source);
}
