use crate::utils::{first_chars, is_ident_start, join, starts_with_ignore_case};

#[test]
fn first_chars_short_input_unchanged() {
    assert_eq!(first_chars("abc", 20), "abc");
    assert_eq!(first_chars("", 20), "");
}

#[test]
fn first_chars_truncates_with_ellipsis() {
    assert_eq!(first_chars("abcdefgh", 3), "abc...");
}

#[test]
fn first_chars_exact_length_unchanged() {
    assert_eq!(first_chars("abc", 3), "abc");
}

#[test]
fn first_chars_multibyte_safe() {
    assert_eq!(first_chars("äöüäöü", 2), "äö...");
}

#[test]
fn ident_start_classification() {
    assert!(is_ident_start('a'));
    assert!(is_ident_start('Z'));
    assert!(is_ident_start('_'));
    assert!(is_ident_start('$'));
    assert!(!is_ident_start('('));
    assert!(!is_ident_start('1'));
}

#[test]
fn starts_with_ignore_case_basics() {
    assert!(starts_with_ignore_case("SELECT", "sel"));
    assert!(starts_with_ignore_case("select", "SELECT"));
    assert!(!starts_with_ignore_case("FROM", "select"));
    assert!(starts_with_ignore_case("anything", ""));
}

#[test]
fn join_with_separator() {
    assert_eq!(join(["ORDER", "BY"], " "), "ORDER BY");
    assert_eq!(join(Vec::<&str>::new(), ", "), "");
    assert_eq!(join(["a"], ", "), "a");
}
