//! Error reporting and recovery.
//!
//! Reporting is two-phase: primitives accumulate [`Expectation`] variants,
//! and a confirmed failure renders them into one
//! `"A, B or C expected, got 'x'"` message at the furthest failure
//! position. Recovery (an `eat_more` continuation on `exit_section`) skips
//! tokens up to the furthest position any rule expected something,
//! honoring the first configured bracket pair, and wraps the skipped run
//! into synthetic chunk nodes so the surrounding structure stays
//! parseable.
//!
//! [`Expectation`]: super::state::Expectation

use flexis_core::utils::first_chars;

use crate::diagnostics::DiagnosticKind;
use crate::syntax::SyntaxKind;

use super::core::{Parser, Rule, token_advancer};
use super::state::{Frame, MAX_ERROR_TOKEN_TEXT};

impl Parser<'_> {
    /// Report at the current position when `result` is false; returns
    /// `result` unchanged so call sites can chain it.
    pub fn report_error_if_failed(&mut self, result: bool) -> bool {
        if !result {
            self.report_error(false);
        }
        result
    }

    /// Report an error at the current position unless one was already
    /// reported here or a deeper expectation lies ahead.
    pub fn report_error(&mut self, advance: bool) {
        let position = self.current_position();
        let Some(frame) = self.state.frames.last() else {
            log::error!("unbalanced enter/exit section call: no current frame");
            return;
        };
        let reported_at = frame.error_reported_at;
        let frame_position = frame.position;
        if reported_at < position && self.state.last_variant_pos(position + 1) <= position {
            if let Some(at) = self.report_error_impl(frame_position, None, true, advance)
                && let Some(frame) = self.state.frames.last_mut()
            {
                frame.error_reported_at = at;
            }
        }
    }

    /// Synthesize and emit the expected/got message.
    ///
    /// `force` emits even with an empty expectation set; `advance` wraps the
    /// offending token into an error node. Without either, the nearest done
    /// node spanning the frame start is re-opened and extended over the
    /// reported region. Returns the raw position the error was recorded at.
    pub(crate) fn report_error_impl(
        &mut self,
        frame_position: i32,
        kind: Option<SyntaxKind>,
        force: bool,
        advance: bool,
    ) -> Option<i32> {
        let position = self.current_position();
        let expected = self.state.expected_text(position);
        let not_empty = !expected.is_empty();
        if !(force || not_empty || advance) {
            return None;
        }

        let eof = self.eof();
        let message = if eof {
            format!("{expected}unexpected end of file")
        } else {
            let actual = format!("'{}'", first_chars(self.current_text(), MAX_ERROR_TOKEN_TEXT));
            if not_empty {
                format!("{expected}got {actual}")
            } else {
                format!("{actual} unexpected")
            }
        };
        let range = self.current_span();

        if advance {
            if eof {
                self.builder
                    .error(DiagnosticKind::SyntaxError, message, range);
            } else {
                let marker = self.mark();
                self.advance();
                marker.error(self, message);
            }
        } else if !force {
            let latest = if kind.is_some() { self.latest_done() } else { None };
            let mut extension = None;
            if let Some(done) = latest
                && frame_position >= done.start_pos() as i32
                && frame_position <= done.end_pos() as i32
            {
                let wrapper = done.precede(self);
                extension = Some((wrapper, done.kind()));
                done.dissolve(self);
            }
            self.builder
                .error(DiagnosticKind::SyntaxError, message, range);
            if let Some((wrapper, done_kind)) = extension {
                wrapper.done(self, done_kind);
            }
        } else {
            self.builder
                .error(DiagnosticKind::SyntaxError, message, range);
        }
        Some(self.current_position())
    }

    fn report_and_mark(
        &mut self,
        frame: &mut Frame,
        kind: Option<SyntaxKind>,
        force: bool,
        advance: bool,
    ) -> bool {
        match self.report_error_impl(frame.position, kind, force, advance) {
            Some(at) => {
                frame.error_reported_at = at;
                true
            }
            None => false,
        }
    }

    /// The recovery half of `exit_section`.
    ///
    /// With an `eat_more` continuation, skips tokens up to the furthest
    /// expected position (bracket-aware), extends the nearest meaningful
    /// done node over the recovered region, and chunks longer skipped runs
    /// via tree balancing. Without one, decides whether a pinned failure
    /// reports here or defers to the recorded deeper failure. Finally
    /// bubbles the error position up to the parent frame.
    pub(crate) fn exit_with_recovery(
        &mut self,
        frame: &mut Frame,
        kind: Option<SyntaxKind>,
        result: bool,
        pinned: bool,
        eat_more: Option<&dyn Rule>,
    ) {
        let initial_pos = self.current_position();
        let will_fail = !result && !pinned;
        self.replace_variants_with_name(frame, result, pinned);
        let last_error_pos = self.state.last_variant_pos(initial_pos);

        if !self.state.suppress_errors
            && let Some(eat_more) = eat_more
        {
            self.state.suppress_errors = true;
            let eat_more_flag_once = !self.eof() && eat_more.parse(self, frame.level + 1);
            let mut eat_more_flag = eat_more_flag_once
                || (!result && frame.position == initial_pos && last_error_pos > frame.position);

            let latest_done = if (pinned || result) && kind.is_some() && eat_more_flag_once {
                self.latest_done()
            } else {
                None
            };
            let mut extension = None;
            if let Some(done) = latest_done
                && frame.position >= done.start_pos() as i32
                && frame.position <= done.end_pos() as i32
            {
                let wrapper = done.precede(self);
                extension = Some((wrapper, done.kind()));
                done.dissolve(self);
            }

            // skip up to the furthest expected position, never stopping
            // inside the primary bracket pair
            let brace = self.config.braces.first().copied();
            let mut paren_count = 0i32;
            while (eat_more_flag || paren_count > 0) && self.current_position() < last_error_pos {
                if let (Some(pair), Some(token)) = (brace, self.current()) {
                    if token == pair.left {
                        paren_count += 1;
                    } else if token == pair.right {
                        paren_count -= 1;
                    }
                }
                self.advance();
                eat_more_flag = eat_more.parse(self, frame.level + 1);
            }

            let mut error_reported = frame.error_reported_at == initial_pos
                || (!result && frame.error_reported_at >= frame.position);
            if error_reported {
                if eat_more_flag {
                    if !self.eof() {
                        self.advance();
                    }
                    self.parse_as_tree(
                        frame.level + 1,
                        SyntaxKind::DummyBlock,
                        true,
                        &token_advancer,
                        eat_more,
                    );
                }
            } else if eat_more_flag {
                error_reported = self.report_and_mark(frame, None, true, true);
                self.parse_as_tree(
                    frame.level + 1,
                    SyntaxKind::DummyBlock,
                    true,
                    &token_advancer,
                    eat_more,
                );
            } else if eat_more_flag_once
                || (!result && frame.position != self.current_position())
                || frame.error_reported_at > initial_pos
            {
                error_reported = self.report_and_mark(frame, None, true, false);
            } else if !result && pinned && frame.error_reported_at < 0 {
                error_reported = self.report_and_mark(frame, kind, false, false);
            }

            if let Some((wrapper, done_kind)) = extension {
                wrapper.done(self, done_kind);
            }
            self.state.suppress_errors = false;
            if error_reported || result {
                self.state.clear_variants(true, 0);
                self.state.clear_variants(false, 0);
                self.state.last_expected_variant_pos = -1;
            }
        } else if !result && pinned && frame.error_reported_at < 0 {
            if last_error_pos == initial_pos {
                // do not force, an inner recovery might have skipped tokens
                self.report_and_mark(frame, kind, false, false);
            } else if last_error_pos > initial_pos {
                // record the deeper failure position for future reference
                frame.error_reported_at = last_error_pos;
            }
        }

        // propagate the error position so outer frames do not re-report
        let propagate = !(will_fail && eat_more.is_none());
        if propagate
            && let Some(parent) = self.state.frames.last_mut()
            && parent.error_reported_at < frame.error_reported_at
        {
            parent.error_reported_at = frame.error_reported_at;
        }
    }
}
