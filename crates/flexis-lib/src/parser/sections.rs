//! Section protocol: the frame stack mirroring grammar-rule nesting, and
//! node finalization at rule exit.
//!
//! Generated rules bracket their body with
//! [`Parser::enter_section`]/[`Parser::exit_section`]. Entry pushes a
//! [`Frame`]; exit pops it, finalizes the marker according to the frame's
//! modifiers, drains hooks registered at the closing level and propagates
//! error positions to the parent frame.

use rowan::TextRange;

use crate::diagnostics::DiagnosticKind;
use crate::syntax::SyntaxKind;

use super::builder::{CompletedMarker, Marker};
use super::core::{Parser, Rule};
use super::state::{Expectation, Frame, Hook};

/// Rule modifiers, a bitset.
///
/// - `COLLAPSE`: merge a single-child node into this node's type when
///   compatible and nothing was skipped between them
/// - `LEFT` / `LEFT_INNER`: left-recursion rewriting against the previous
///   sibling node
/// - `AND` / `NOT`: lookahead predicates, never consume input
/// - `UPPER`: propagate the resolved type to the nearest typed ancestor
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const COLLAPSE: Modifiers = Modifiers(1 << 0);
    pub const LEFT: Modifiers = Modifiers(1 << 1);
    pub const LEFT_INNER: Modifiers = Modifiers(1 << 2);
    pub const AND: Modifiers = Modifiers(1 << 3);
    pub const NOT: Modifiers = Modifiers(1 << 4);
    pub const UPPER: Modifiers = Modifiers(1 << 5);

    #[inline]
    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    #[inline]
    pub const fn has(self, other: Modifiers) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 == 0 {
            return write!(f, "NONE");
        }
        let mut first = true;
        for (bit, name) in [
            (Modifiers::COLLAPSE, "COLLAPSE"),
            (Modifiers::LEFT, "LEFT"),
            (Modifiers::LEFT_INNER, "LEFT_INNER"),
            (Modifiers::AND, "AND"),
            (Modifiers::NOT, "NOT"),
            (Modifiers::UPPER, "UPPER"),
        ] {
            if self.has(bit) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// How a successful frame's node is finalized, resolved once at close time.
enum Finalize {
    Plain,
    /// Re-parent the captured left sibling under a new node of the frame's
    /// type.
    Left(CompletedMarker),
    /// Wrap left sibling and this node together under the left sibling's
    /// type.
    LeftInner(CompletedMarker),
    /// Hand the resolved type to the nearest typed ancestor frame.
    Upper,
}

fn finalize_strategy(frame: &Frame) -> Finalize {
    if frame.modifiers.has(Modifiers::UPPER) {
        Finalize::Upper
    } else if frame.modifiers.has(Modifiers::LEFT_INNER)
        && let Some(left) = frame.left
    {
        Finalize::LeftInner(left)
    } else if frame.modifiers.has(Modifiers::LEFT)
        && let Some(left) = frame.left
    {
        Finalize::Left(left)
    } else {
        Finalize::Plain
    }
}

impl Parser<'_> {
    /// Simple section pair without a frame record, for plain nodes that
    /// need no recovery bookkeeping.
    pub fn enter(&mut self) -> Marker {
        self.state.level += 1;
        self.mark()
    }

    /// Counterpart of [`Parser::enter`].
    pub fn exit(&mut self, marker: Marker, kind: Option<SyntaxKind>, result: bool) {
        self.close_marker_on_top_frame(marker, kind, result);
        self.run_hooks(if result { kind } else { None });
        self.state.level = self.state.level.saturating_sub(1);
    }

    /// Open a framed section. `level` must be passed unchanged to the
    /// matching [`Parser::exit_section`].
    pub fn enter_section(
        &mut self,
        level: u32,
        modifiers: Modifiers,
        kind: Option<SyntaxKind>,
        name: Option<&'static str>,
    ) -> Marker {
        let marker = self.mark();
        self.enter_section_impl(level, modifiers, kind, name);
        marker
    }

    fn enter_section_impl(
        &mut self,
        level: u32,
        modifiers: Modifiers,
        kind: Option<SyntaxKind>,
        name: Option<&'static str>,
    ) {
        self.state.level += 1;
        let mut frame = Frame {
            kind,
            offset: self.current_offset(),
            position: self.current_position(),
            level,
            modifiers,
            name,
            variant_count: self.state.variants.len(),
            error_reported_at: -1,
            left: None,
        };
        let stale_error = self
            .state
            .frames
            .last()
            .is_some_and(|prev| prev.error_reported_at > frame.position);
        if stale_error {
            // an abandoned frame recorded an error beyond our start;
            // finalize it before descending so it is not lost
            if let Some(at) = self.report_error_impl(frame.position, None, true, false) {
                frame.error_reported_at = at;
            }
        }
        if (modifiers.has(Modifiers::LEFT) || modifiers.has(Modifiers::LEFT_INNER))
            && let Some(left) = self.latest_done()
            && !self.state.frames.is_empty()
        {
            frame.left = Some(left);
        }
        self.state.frames.push(frame);
        if modifiers.has(Modifiers::AND) {
            if self.state.predicate_count == 0 && !self.state.predicate_sign {
                log::error!("incorrect false predicate sign");
                debug_assert!(false, "incorrect false predicate sign");
            }
            self.state.predicate_count += 1;
        } else if modifiers.has(Modifiers::NOT) {
            self.state.predicate_sign = self.state.predicate_count != 0 && !self.state.predicate_sign;
            self.state.predicate_count += 1;
        }
    }

    /// Close a framed section.
    ///
    /// A level mismatch against the popped frame is an internal defect: it
    /// is logged, the marker is still closed defensively, and parsing
    /// continues.
    pub fn exit_section(
        &mut self,
        level: u32,
        marker: Marker,
        kind: Option<SyntaxKind>,
        result: bool,
        pinned: bool,
        eat_more: Option<&dyn Rule>,
    ) {
        let Some(mut frame) = self.state.frames.pop() else {
            log::error!("unbalanced section exit at level {level}: no open frame");
            self.close_marker_detached(None, marker, kind, result);
            return;
        };
        let kind = frame.kind.or(kind);
        if level != frame.level {
            log::error!(
                "unbalanced section: got {frame:?}, expected level {level}"
            );
            self.close_marker_detached(Some(&mut frame), marker, kind, result);
            return;
        }
        if frame.modifiers.has(Modifiers::AND) || frame.modifiers.has(Modifiers::NOT) {
            // predicates never consume output
            self.close_marker_detached(Some(&mut frame), marker, None, false);
            self.replace_variants_with_name(&frame, result, pinned);
            self.state.predicate_count = self.state.predicate_count.saturating_sub(1);
            if frame.modifiers.has(Modifiers::NOT) {
                self.state.predicate_sign = !self.state.predicate_sign;
            }
        } else {
            self.close_frame(&mut frame, marker, kind, result, pinned);
            self.exit_with_recovery(&mut frame, kind, result, pinned, eat_more);
        }
        self.run_hooks(if pinned || result { kind } else { None });
        self.state.level = self.state.level.saturating_sub(1);
    }

    fn close_frame(
        &mut self,
        frame: &mut Frame,
        marker: Marker,
        kind: Option<SyntaxKind>,
        result: bool,
        pinned: bool,
    ) {
        if let Some(mut kind) = kind {
            if result || pinned {
                if frame.modifiers.has(Modifiers::COLLAPSE)
                    && let Some(last) = self.latest_done()
                    && last.start_pos() as i32 == frame.position
                    && self.type_extends(last.kind(), kind)
                    && self.builder.all_trivia_between(last.end_pos() as usize)
                {
                    kind = last.kind();
                    last.dissolve(self);
                }
                match finalize_strategy(frame) {
                    Finalize::Upper => {
                        marker.abandon(self);
                        for f in self.state.frames.iter_mut().rev() {
                            if f.kind.is_none() {
                                continue;
                            }
                            f.kind = Some(kind);
                            break;
                        }
                    }
                    Finalize::LeftInner(left) => {
                        marker.done(self, kind);
                        let wrapper = left.precede(self);
                        wrapper.done(self, left.kind());
                        left.dissolve(self);
                    }
                    Finalize::Left(left) => {
                        marker.abandon(self);
                        let wrapper = left.precede(self);
                        wrapper.done(self, kind);
                    }
                    Finalize::Plain => {
                        marker.done(self, kind);
                    }
                }
            } else {
                self.close_marker_detached(Some(frame), marker, None, false);
            }
        } else if result || pinned {
            marker.abandon(self);
            if frame.modifiers.has(Modifiers::LEFT_INNER)
                && let Some(left) = frame.left
            {
                let wrapper = left.precede(self);
                wrapper.done(self, left.kind());
                left.dissolve(self);
            }
        } else {
            self.close_marker_detached(Some(frame), marker, None, false);
        }
    }

    /// Close `marker` against the current top frame (simple sections).
    fn close_marker_on_top_frame(
        &mut self,
        marker: Marker,
        kind: Option<SyntaxKind>,
        result: bool,
    ) {
        if result {
            match kind {
                Some(k) => {
                    marker.done(self, k);
                }
                None => marker.abandon(self),
            }
            return;
        }
        let position = marker.pos() as i32;
        let len = self.state.frames.len();
        if len > 0 {
            let parent_reported_at = if len >= 2 {
                self.state.frames[len - 2].error_reported_at
            } else {
                -1
            };
            let frame = &mut self.state.frames[len - 1];
            if frame.error_reported_at > position && len >= 2 {
                frame.error_reported_at = parent_reported_at;
            }
        }
        marker.rollback_to(self);
    }

    /// Close `marker` against an already-popped frame.
    pub(crate) fn close_marker_detached(
        &mut self,
        frame: Option<&mut Frame>,
        marker: Marker,
        kind: Option<SyntaxKind>,
        result: bool,
    ) {
        if result {
            match kind {
                Some(k) => {
                    marker.done(self, k);
                }
                None => marker.abandon(self),
            }
            return;
        }
        if let Some(frame) = frame {
            let position = marker.pos() as i32;
            // errors recorded inside the rolled-back region are forgotten
            if frame.error_reported_at > position
                && let Some(parent) = self.state.frames.last()
            {
                frame.error_reported_at = parent.error_reported_at;
            }
        }
        marker.rollback_to(self);
    }

    /// A failed speculative frame that produced several expectations at its
    /// own start position collapses them into the rule's display name.
    pub(crate) fn replace_variants_with_name(
        &mut self,
        frame: &Frame,
        result: bool,
        pinned: bool,
    ) {
        let initial_pos = self.current_position();
        let will_fail = !result && !pinned;
        if will_fail
            && initial_pos == frame.position
            && self.state.last_expected_variant_pos == frame.position
            && let Some(name) = frame.name
            && self.state.variants.len() as i64 - frame.variant_count as i64 > 1
        {
            self.state.clear_variants(true, frame.variant_count);
            self.state
                .add_variant_inner(initial_pos, Expectation::Rule(name));
        }
    }

    /// Drain hooks registered at the closing level, most recent first.
    pub(crate) fn run_hooks(&mut self, kind: Option<SyntaxKind>) {
        if self.state.hooks.is_empty() {
            return;
        }
        let marker = if kind.is_some() { self.latest_done() } else { None };
        if kind.is_some() && marker.is_none() {
            let offset = u32::from(self.current_offset());
            let range = TextRange::empty(self.current_offset());
            self.builder.error(
                DiagnosticKind::Internal,
                format!("no expected done marker at offset {offset}"),
                range,
            );
        }
        loop {
            let Some(top_level) = self.state.hooks.last().map(|entry| entry.level) else {
                break;
            };
            if top_level < self.state.level {
                break;
            }
            if let Some(entry) = self.state.hooks.pop()
                && entry.level == self.state.level
            {
                self.apply_hook(entry.hook, marker);
            }
        }
    }

    fn apply_hook(&mut self, hook: Hook, marker: Option<CompletedMarker>) {
        match (hook, marker) {
            (Hook::LeftBinder(left), Some(m)) => {
                self.builder.set_completed_edges(m, Some(left), None);
            }
            (Hook::RightBinder(right), Some(m)) => {
                self.builder.set_completed_edges(m, None, Some(right));
            }
            (Hook::EdgeBinders(left, right), Some(m)) => {
                self.builder.set_completed_edges(m, Some(left), Some(right));
            }
            (Hook::Log(message), _) => {
                log::debug!(target: "flexis_parser", "{message}");
            }
            (_, None) => {}
        }
    }
}
