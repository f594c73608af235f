use crate::lexer::lex;
use crate::parser::tests::grammar::statement;
use crate::parser::{Modifiers, Parser};
use crate::syntax::SyntaxKind::*;
use crate::syntax::{LanguageConfig, SyntaxKind};

fn complete(source: &str, offset: u32) -> indexmap::IndexSet<String> {
    Parser::new(source, lex(source), LanguageConfig::flexible_search())
        .with_completion_at(offset)
        .run(Root, &statement)
        .completions
        .expect("completion was requested")
}

#[test]
fn partial_keyword_offers_matching_candidate() {
    let items = complete("SEL", 3);
    assert!(items.contains("SELECT"), "got: {items:?}");
}

#[test]
fn lowercase_prefix_matches_too() {
    let items = complete("sel", 3);
    assert!(items.contains("SELECT"), "got: {items:?}");
}

#[test]
fn unrelated_prefix_offers_nothing() {
    let items = complete("xyz", 3);
    assert!(!items.contains("SELECT"), "got: {items:?}");
    assert!(items.is_empty(), "got: {items:?}");
}

#[test]
fn empty_source_offers_starting_keywords() {
    let items = complete("", 0);
    assert!(items.contains("SELECT"), "got: {items:?}");
}

#[test]
fn keyword_after_typed_clause_is_offered() {
    // cursor at end of "SELECT code " - the next expected keyword fits
    let source = "SELECT code ";
    let items = complete(source, source.len() as u32);
    assert!(items.contains("FROM"), "got: {items:?}");
}

#[test]
fn short_and_placeholder_candidates_are_filtered() {
    // at a position expecting ',' or an identifier, neither a 1-char
    // punctuation candidate nor a <placeholder> survives the filter
    let items = complete("SELECT code ", "SELECT code ".len() as u32);
    assert!(!items.iter().any(|i| i == ","), "got: {items:?}");
    assert!(!items.iter().any(|i| i.starts_with('<')), "got: {items:?}");
}

#[test]
fn candidates_are_deduplicated() {
    // two failing alternatives both expecting FROM produce one candidate
    let alt = |p: &mut Parser<'_>, level: u32| -> bool {
        let first = |p: &mut Parser<'_>, level: u32| -> bool {
            let marker = p.enter_section(level, Modifiers::NONE, None, None);
            let result = p.consume_token(KwFrom) && p.consume_token(Ident);
            p.exit_section(level, marker, None, result, false, None);
            result
        };
        let second = |p: &mut Parser<'_>, level: u32| -> bool {
            let marker = p.enter_section(level, Modifiers::NONE, None, None);
            let result = p.consume_token(KwFrom) && p.consume_token(Star);
            p.exit_section(level, marker, None, result, false, None);
            result
        };
        first(p, level + 1) || second(p, level + 1)
    };
    let source = "FR";
    let items = Parser::new(source, lex(source), LanguageConfig::flexible_search())
        .with_completion_at(2)
        .run(Root, &alt)
        .completions
        .expect("completion was requested");

    assert_eq!(items.iter().filter(|i| i.as_str() == "FROM").count(), 1);
}

#[test]
fn sequence_candidates_join_keyword_runs() {
    let rule = |p: &mut Parser<'_>, level: u32| -> bool {
        let marker = p.enter_section(level, Modifiers::NONE, Some(Expression), None);
        let result = p.consume_tokens(0, &[SyntaxKind::KwOrder, SyntaxKind::KwBy]);
        p.exit_section(level, marker, None, result, false, None);
        result
    };
    let source = "OR";
    let items = Parser::new(source, lex(source), LanguageConfig::flexible_search())
        .with_completion_at(2)
        .run(Root, &rule)
        .completions
        .expect("completion was requested");

    assert!(items.contains("ORDER BY"), "got: {items:?}");
}
