//! Parser context object and backtracking token-consumption primitives.
//!
//! Every primitive threads through the same [`Parser`] value: the token
//! stream and event sink ([`super::builder`]), the error-tracking state
//! ([`super::state`]) and the per-language configuration. Generated grammar
//! rules receive `&mut Parser` plus their nesting level and return success.

use rowan::{TextRange, TextSize};

use crate::diagnostics::DiagnosticKind;
use crate::lexer::Token;
use crate::syntax::{LanguageConfig, SyntaxKind};

use super::builder::{CompletedMarker, Marker, MarkerBuilder};
use super::completion::CompletionState;
use super::state::{ErrorState, Expectation, Hook, HookEntry};
use super::{Parse, ParseResult};

/// One grammar rule or continuation predicate.
///
/// Implemented for every `Fn(&mut Parser<'_>, u32) -> bool`, so plain
/// functions and closures both work.
pub trait Rule {
    fn parse(&self, p: &mut Parser<'_>, level: u32) -> bool;
}

impl<F: Fn(&mut Parser<'_>, u32) -> bool> Rule for F {
    fn parse(&self, p: &mut Parser<'_>, level: u32) -> bool {
        self(p, level)
    }
}

/// Consumes one token; fails at end of file. The element parser used by
/// recovery chunking.
pub fn token_advancer(p: &mut Parser<'_>, _level: u32) -> bool {
    if p.eof() {
        return false;
    }
    p.advance();
    true
}

/// Always-true continuation.
pub fn true_condition(_p: &mut Parser<'_>, _level: u32) -> bool {
    true
}

/// Parse context: exclusively owned by one parse run.
pub struct Parser<'s> {
    pub(crate) builder: MarkerBuilder<'s>,
    pub(crate) state: ErrorState,
    pub(crate) config: LanguageConfig,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str, tokens: Vec<Token>, config: LanguageConfig) -> Self {
        Self {
            builder: MarkerBuilder::new(source, tokens),
            state: ErrorState::new(),
            config,
        }
    }

    /// Override the default recursion ceiling.
    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.state.recursion_limit = limit;
        self
    }

    /// Collect completion candidates for the given cursor offset.
    pub fn with_completion_at(mut self, offset: u32) -> Self {
        self.state.completion = Some(CompletionState::new(TextSize::from(offset)));
        self
    }

    /// Run `rule` under a root section and build the tree.
    ///
    /// The root section closes pinned with an always-true continuation, so
    /// trailing unparsable input is consumed into recovery chunks instead of
    /// being dropped.
    pub fn run(mut self, root: SyntaxKind, rule: &dyn Rule) -> ParseResult {
        let marker = self.enter_section(0, super::Modifiers::COLLAPSE, Some(root), None);
        let result = rule.parse(&mut self, 0);
        self.exit_section(0, marker, None, result, true, Some(&true_condition));
        self.finish()
    }

    fn finish(mut self) -> ParseResult {
        if !self.state.frames.is_empty() {
            log::error!(
                "{} section frame(s) left open at end of parse",
                self.state.frames.len()
            );
        }
        let completions = self.state.completion.take().map(CompletionState::into_items);
        let (green, diagnostics) = self.builder.finish();
        ParseResult {
            parse: Parse::new(green),
            diagnostics,
            completions,
        }
    }

    // --- token stream ---

    pub fn eof(&mut self) -> bool {
        self.builder.eof()
    }

    pub fn current(&mut self) -> Option<SyntaxKind> {
        self.builder.current()
    }

    /// Raw index of the next non-trivia token.
    pub fn current_position(&mut self) -> i32 {
        self.builder.raw_pos() as i32
    }

    pub fn current_offset(&mut self) -> TextSize {
        self.builder.current_offset()
    }

    pub fn current_span(&mut self) -> TextRange {
        self.builder.current_span()
    }

    pub fn current_text(&mut self) -> &'s str {
        self.builder.current_text()
    }

    /// Consume the next token unconditionally.
    pub fn advance(&mut self) {
        self.builder.advance();
    }

    pub fn mark(&mut self) -> Marker {
        self.builder.mark()
    }

    pub fn latest_done(&self) -> Option<CompletedMarker> {
        self.builder.latest_done()
    }

    pub fn left_marker_is(&self, kind: SyntaxKind) -> bool {
        self.builder.latest_done().is_some_and(|m| m.kind() == kind)
    }

    // --- lookahead ---

    pub fn next_token_is_fast(&mut self, token: SyntaxKind) -> bool {
        self.current() == Some(token)
    }

    pub fn next_token_is_any_fast(&mut self, tokens: &[SyntaxKind]) -> bool {
        match self.current() {
            Some(kind) => tokens.contains(&kind),
            None => false,
        }
    }

    pub fn next_token_is(&mut self, token: SyntaxKind) -> bool {
        if !self.add_variant_smart(Expectation::Token(token), false) {
            return true;
        }
        self.next_token_is_fast(token)
    }

    /// Lookahead that is always true while completion is active, so rules
    /// past the cursor still get explored.
    pub fn next_token_is_smart(&mut self, token: SyntaxKind) -> bool {
        self.next_token_is_fast(token) || self.state.completion.is_some()
    }

    /// Multi-token lookahead recording either the rule's display name or the
    /// individual tokens as variants.
    pub fn next_token_is_named(
        &mut self,
        frame_name: &'static str,
        tokens: &'static [SyntaxKind],
    ) -> bool {
        if self.state.completion.is_some() {
            return true;
        }
        let track = !self.state.suppress_errors
            && self.state.predicate_count < 2
            && self.state.predicate_sign;
        if !track {
            return self.next_token_is_any_fast(tokens);
        }
        if !frame_name.is_empty() {
            let pos = self.current_position();
            self.state.add_variant_inner(pos, Expectation::Rule(frame_name));
        } else {
            for &token in tokens {
                self.add_variant(Expectation::Token(token));
            }
        }
        self.next_token_is_any_fast(tokens)
    }

    // --- consumption ---

    pub fn consume_token(&mut self, token: SyntaxKind) -> bool {
        self.add_variant_smart(Expectation::Token(token), true);
        self.consume_token_fast(token)
    }

    pub fn consume_token_fast(&mut self, token: SyntaxKind) -> bool {
        if self.next_token_is_fast(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn consume_token_smart(&mut self, token: SyntaxKind) -> bool {
        self.add_completion_variant_smart(&Expectation::Token(token));
        self.consume_token_fast(token)
    }

    /// Match a token sequence. Once the `pin` index has been reached, a
    /// mismatch past it is reported as this sequence's error instead of
    /// grounds to try another alternative; `pin < 0` reports on any
    /// mismatch.
    pub fn consume_tokens(&mut self, pin: i32, tokens: &'static [SyntaxKind]) -> bool {
        self.consume_tokens_inner(false, pin, tokens)
    }

    pub fn consume_tokens_smart(&mut self, pin: i32, tokens: &'static [SyntaxKind]) -> bool {
        self.consume_tokens_inner(true, pin, tokens)
    }

    fn consume_tokens_inner(
        &mut self,
        smart: bool,
        pin: i32,
        tokens: &'static [SyntaxKind],
    ) -> bool {
        if self.state.completion.is_some() && self.state.predicate_sign {
            self.add_completion_variant(&Expectation::Tokens(tokens));
        }
        // suppress single-token completion while matching the run
        let saved = self.state.completion.take();
        let mut result = true;
        let mut pinned = false;
        for (i, &token) in tokens.iter().enumerate() {
            if pin > 0 && i as i32 == pin {
                pinned = result;
            }
            if result || pinned {
                let fast = smart && i == 0;
                let ok = if fast {
                    self.consume_token_fast(token)
                } else {
                    self.consume_token(token)
                };
                if !ok {
                    result = false;
                    if pin < 0 || pinned {
                        self.report_error(false);
                    }
                }
            }
        }
        self.state.completion = saved;
        pinned || result
    }

    /// Sequence match that leaves no trace on failure.
    pub fn parse_tokens(&mut self, pin: i32, tokens: &'static [SyntaxKind]) -> bool {
        let marker = self.mark();
        let result = self.consume_tokens(pin, tokens);
        if result {
            marker.abandon(self);
        } else {
            marker.rollback_to(self);
        }
        result
    }

    // --- string-literal matching ---

    pub fn next_literal_is(&mut self, text: &'static str) -> bool {
        if !self.add_variant_smart(Expectation::Literal(text), false) {
            return true;
        }
        self.literal_match_len(text) > 0
    }

    pub fn next_literal_is_fast(&mut self, text: &str) -> bool {
        self.literal_match_len(text) > 0
    }

    pub fn consume_literal(&mut self, text: &'static str) -> bool {
        self.add_variant_smart(Expectation::Literal(text), true);
        self.consume_literal_inner(text)
    }

    pub fn consume_literal_fast(&mut self, text: &str) -> bool {
        self.consume_literal_inner(text)
    }

    pub fn consume_literal_smart(&mut self, text: &'static str) -> bool {
        self.add_completion_variant_smart(&Expectation::Literal(text));
        self.consume_literal_inner(text)
    }

    fn consume_literal_inner(&mut self, text: &str) -> bool {
        let count = self.literal_match_len(text);
        if count > 0 {
            self.builder.advance_raw(count as usize);
            true
        } else {
            false
        }
    }

    /// Number of raw tokens a literal match would span; 0 on mismatch, a
    /// negative sentinel when the literal ends inside a token.
    pub(crate) fn literal_match_len(&mut self, text: &str) -> i32 {
        let offset = usize::from(self.current_offset());
        let end = offset + text.len();
        let slice_end = end.min(self.builder.source.len());
        let Some(sub) = self.builder.source.get(offset..slice_end) else {
            return 0;
        };
        let matches = if self.config.case_sensitive {
            sub == text
        } else {
            sub.eq_ignore_ascii_case(text)
        };
        if !matches || sub.len() != text.len() {
            return 0;
        }
        let mut count: i32 = 0;
        loop {
            count += 1;
            let next_offset = usize::from(self.builder.raw_token_start(count as isize));
            if next_offset > end {
                return -count;
            }
            if next_offset == end {
                break;
            }
        }
        count
    }

    // --- variant recording ---

    pub(crate) fn add_variant(&mut self, item: Expectation) {
        let pos = self.current_position();
        self.state.add_variant_inner(pos, item);
        if self.state.completion.is_some() && self.state.predicate_sign {
            self.add_completion_variant(&item);
        }
    }

    /// Record a variant unless suppressed by recovery or predicate depth.
    /// Returns `false` only in completion mode without `force`, signalling
    /// the caller to treat the lookahead as matching.
    pub(crate) fn add_variant_smart(&mut self, item: Expectation, force: bool) -> bool {
        if self.state.completion.is_some() && !force {
            return false;
        }
        if !self.state.suppress_errors && self.state.predicate_count < 2 {
            self.add_variant(item);
        }
        true
    }

    pub(crate) fn add_completion_variant_smart(&mut self, item: &Expectation) {
        if self.state.completion.is_some() && self.state.predicate_sign {
            self.add_completion_variant(item);
        }
    }

    /// Record an expected rule/text by name, for hand-written lookaheads.
    pub fn add_expected_variant(&mut self, text: &'static str) {
        self.add_variant(Expectation::Rule(text));
    }

    // --- guards ---

    /// Bails out with a located error once nesting exceeds the ceiling.
    pub fn recursion_guard(&mut self, level: u32, func_name: &str) -> bool {
        if level > self.state.recursion_limit {
            let limit = self.state.recursion_limit;
            let range = TextRange::empty(self.current_offset());
            self.builder.error(
                DiagnosticKind::RecursionLimit,
                format!("maximum recursion level ({limit}) reached in '{func_name}'"),
                range,
            );
            return false;
        }
        true
    }

    /// Halts loops whose body consumed nothing; `pos` is the position
    /// captured before the iteration.
    pub fn empty_element_guard(&mut self, func_name: &str, pos: i32) -> bool {
        if pos == self.current_position() {
            let offset = u32::from(self.current_offset());
            let range = TextRange::empty(self.current_offset());
            self.builder.error(
                DiagnosticKind::EmptyElement,
                format!("empty element parsed in '{func_name}' at offset {offset}"),
                range,
            );
            return false;
        }
        true
    }

    /// Run `rule` without letting it move the furthest-expected position.
    pub fn with_protected_last_variant_pos(&mut self, level: u32, rule: &dyn Rule) -> bool {
        let backup = self.state.last_expected_variant_pos;
        let result = rule.parse(self, level);
        self.state.last_expected_variant_pos = backup;
        result
    }

    /// Defer an adjustment until the current section level closes
    /// successfully.
    pub fn register_hook(&mut self, hook: Hook) {
        let level = self.state.level;
        self.state.hooks.push(HookEntry { level, hook });
    }

    pub(crate) fn type_extends(&self, child: SyntaxKind, parent: SyntaxKind) -> bool {
        child == parent || self.config.type_extends.is_some_and(|f| f(child, parent))
    }
}
