use crate::matcher::camel_hump_matches;

#[test]
fn empty_prefix_matches_everything() {
    assert!(camel_hump_matches("", "SELECT"));
    assert!(camel_hump_matches("", ""));
}

#[test]
fn plain_prefix_case_insensitive() {
    assert!(camel_hump_matches("SEL", "SELECT"));
    assert!(camel_hump_matches("sel", "SELECT"));
    assert!(camel_hump_matches("select", "SELECT"));
}

#[test]
fn prefix_longer_than_candidate_fails() {
    assert!(!camel_hump_matches("selects", "SELECT"));
}

#[test]
fn hump_jump_over_underscore() {
    assert!(camel_hump_matches("oB", "ORDER_BY"));
    assert!(camel_hump_matches("gB", "GROUP_BY"));
}

#[test]
fn hump_jump_camel_case() {
    assert!(camel_hump_matches("tR", "tableRef"));
    assert!(camel_hump_matches("seLi", "selectList"));
}

#[test]
fn unrelated_prefix_fails() {
    assert!(!camel_hump_matches("xyz", "SELECT"));
    assert!(!camel_hump_matches("zB", "ORDER_BY"));
}

#[test]
fn contiguous_run_after_jump() {
    assert!(camel_hump_matches("oBy", "ORDER_BY"));
    assert!(!camel_hump_matches("oByx", "ORDER_BY"));
}
