//! Camel-hump prefix matching for completion candidates.
//!
//! A prefix matches a candidate when its characters appear in order, each
//! run either continuing contiguously or jumping to the start of the next
//! "hump" (an uppercase letter, a digit run, or a word after `_`/`-`/space).
//! Plain case-insensitive prefixes are the degenerate contiguous case, so
//! `"sel"` matches `"SELECT"` and `"oB"` matches `"ORDER_BY"`.

use crate::utils::starts_with_ignore_case;

/// Whether `prefix` camel-hump-matches `candidate`.
///
/// # Examples
/// ```
/// use flexis_core::matcher::camel_hump_matches;
/// assert!(camel_hump_matches("sel", "SELECT"));
/// assert!(camel_hump_matches("oB", "ORDER_BY"));
/// assert!(!camel_hump_matches("xyz", "SELECT"));
/// ```
pub fn camel_hump_matches(prefix: &str, candidate: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    if starts_with_ignore_case(candidate, prefix) {
        return true;
    }
    let p: Vec<char> = prefix.chars().collect();
    let c: Vec<char> = candidate.chars().collect();
    hump_match(&p, &c, 0, 0)
}

fn hump_match(p: &[char], c: &[char], pi: usize, ci: usize) -> bool {
    if pi == p.len() {
        return true;
    }
    let mut j = ci;
    while j < c.len() {
        if chars_eq(p[pi], c[j]) && hump_match(p, c, pi + 1, j + 1) {
            return true;
        }
        match next_hump_start(c, j + 1) {
            Some(next) => j = next,
            None => return false,
        }
    }
    false
}

fn chars_eq(a: char, b: char) -> bool {
    a == b || a.eq_ignore_ascii_case(&b)
}

/// Position of the first hump boundary at or after `from`.
fn next_hump_start(c: &[char], from: usize) -> Option<usize> {
    (from..c.len()).find(|&i| is_hump_start(c, i))
}

fn is_hump_start(c: &[char], i: usize) -> bool {
    if i == 0 {
        return true;
    }
    let prev = c[i - 1];
    let cur = c[i];
    if matches!(prev, '_' | '-' | ' ') {
        return true;
    }
    if cur.is_ascii_uppercase() && !prev.is_ascii_uppercase() {
        return true;
    }
    cur.is_ascii_digit() && !prev.is_ascii_digit()
}
