//! Code-completion candidate collection.
//!
//! When a completion request is active, every lookahead that records an
//! "expected" variant also tests whether the candidate's literal text fits
//! the text already typed around the cursor. Candidates accumulate in a
//! deduplicated set scoped to one parse run.

use indexmap::IndexSet;
use rowan::TextSize;

use flexis_core::matcher::camel_hump_matches;
use flexis_core::utils::starts_with_ignore_case;

use super::core::Parser;
use super::state::Expectation;

/// One completion request: cursor offset plus the collected candidates.
#[derive(Debug)]
pub struct CompletionState {
    offset: TextSize,
    items: IndexSet<String>,
}

impl CompletionState {
    pub(crate) fn new(offset: TextSize) -> Self {
        Self {
            offset,
            items: IndexSet::new(),
        }
    }

    pub fn offset(&self) -> TextSize {
        self.offset
    }

    pub(crate) fn into_items(self) -> IndexSet<String> {
        self.items
    }
}

impl Parser<'_> {
    pub(crate) fn add_completion_variant(&mut self, item: &Expectation) {
        // zero-length token positions offer nothing to complete
        if !self.eof() && self.current_span().is_empty() {
            return;
        }
        let text = item.text();
        let length = text.len();
        let add = length > 1
            && self.completion_prefix_matches(&text)
            && !(text.starts_with('<') && text.ends_with('>'))
            && !(text.starts_with('\'') && text.ends_with('\'') && length < 5);
        if add && let Some(completion) = self.state.completion.as_mut() {
            completion.items.insert(text);
        }
    }

    /// Whether `text` is compatible with what is already typed around the
    /// cursor: nothing typed matches everything, a partially typed word is
    /// camel-hump matched, and a cursor inside earlier tokens re-checks the
    /// nearest word start behind it.
    fn completion_prefix_matches(&mut self, text: &str) -> bool {
        let Some(state) = self.state.completion.as_ref() else {
            return false;
        };
        let offset = u32::from(state.offset()) as i64;
        let builder_offset = u32::from(self.current_offset()) as i64;
        let length = text.len() as i64;
        let mut diff = offset - builder_offset;
        if diff == 0 {
            return true;
        }
        if diff > 0 && diff <= length {
            let Some(fragment) = self
                .builder
                .source
                .get(builder_offset as usize..offset as usize)
            else {
                return false;
            };
            return prefix_matches(fragment, text);
        }
        if diff < 0 {
            let mut i: isize = -1;
            loop {
                let kind = self.builder.raw_lookup(i);
                let token_start = u32::from(self.builder.raw_token_start(i)) as i64;
                match kind {
                    Some(k) if k.is_trivia() => {
                        diff = offset - token_start;
                    }
                    Some(_) if token_start < offset => {
                        if let Some(fragment) = self
                            .builder
                            .source
                            .get(token_start as usize..offset as usize)
                            && prefix_matches(fragment, text)
                        {
                            diff = offset - token_start;
                        }
                        break;
                    }
                    _ => break,
                }
                i -= 1;
            }
            return diff >= 0 && diff < length;
        }
        false
    }
}

/// Camel-hump match with a stricter rule once the user typed a trailing
/// space: the candidate must then start with the prefix verbatim.
pub(crate) fn prefix_matches(prefix: &str, variant: &str) -> bool {
    let matches = camel_hump_matches(prefix, &variant.replace(' ', "_"));
    if matches && prefix.chars().last().is_some_and(char::is_whitespace) {
        return starts_with_ignore_case(variant, prefix);
    }
    matches
}
