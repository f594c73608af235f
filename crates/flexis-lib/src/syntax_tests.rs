use rowan::Language;

use crate::syntax::{BracePair, FsLang, LanguageConfig, SyntaxKind::*, TokenSet};

#[test]
fn token_set_contains() {
    let set = TokenSet::new(&[LParen, RParen, Star]);
    assert!(set.contains(LParen));
    assert!(set.contains(RParen));
    assert!(set.contains(Star));
    assert!(!set.contains(Comma));
    assert!(!set.contains(Colon));
}

#[test]
fn token_set_union() {
    let a = TokenSet::new(&[LParen, RParen]);
    let b = TokenSet::new(&[Star, Comma]);
    let c = a.union(b);
    assert!(c.contains(LParen));
    assert!(c.contains(Star));
    assert!(!c.contains(Colon));
}

#[test]
fn token_set_single() {
    let set = TokenSet::single(Colon);
    assert!(set.contains(Colon));
    assert!(!set.contains(LParen));
}

#[test]
fn trivia_classification() {
    assert!(Whitespace.is_trivia());
    assert!(Newline.is_trivia());
    assert!(LineComment.is_trivia());
    assert!(BlockComment.is_trivia());
    assert!(!KwSelect.is_trivia());
    assert!(!Error.is_trivia());
}

#[test]
fn syntax_kind_count_under_64() {
    assert!(
        (__LAST as u16) < 64,
        "SyntaxKind has {} variants, exceeds TokenSet capacity of 64",
        __LAST as u16
    );
}

#[test]
fn error_classification() {
    assert!(Error.is_error());
    assert!(Garbage.is_error());
    assert!(!Ident.is_error());
    assert!(!Whitespace.is_error());
}

#[test]
fn lang_roundtrip() {
    for kind in [LParen, KwSelect, Ident, Root, DummyBlock] {
        let raw = FsLang::kind_to_raw(kind);
        assert_eq!(FsLang::kind_from_raw(raw), kind);
    }
}

#[test]
fn expected_names() {
    assert_eq!(KwSelect.expected_name(), "SELECT");
    assert_eq!(Comma.expected_name(), ",");
    assert_eq!(Ident.expected_name(), "<identifier>");
}

#[test]
fn flexible_search_config() {
    let config = LanguageConfig::flexible_search();
    assert!(!config.case_sensitive);
    assert_eq!(config.braces[0], BracePair::new(LParen, RParen));
}

#[test]
fn token_set_debug_lists_members() {
    let set = TokenSet::new(&[LParen, Star]);
    let debug = format!("{set:?}");
    assert!(debug.contains("LParen"));
    assert!(debug.contains("Star"));
}
