//! Marker-based adapter over rowan's green tree builder.
//!
//! The parse phase records a flat list of [`Event`]s (the rust-analyzer
//! event model); [`MarkerBuilder::finish`] replays them into a
//! `GreenNodeBuilder` once the parse completes. Deferring tree construction
//! is what makes backtracking cheap: discarding a speculative branch
//! truncates the event list, and diagnostics recorded inside the branch
//! disappear with it.
//!
//! Trivia never produces events. Token positions always name the next
//! non-trivia token; the replay pass re-interleaves skipped trivia, binding
//! it outside node boundaries unless an edge is marked greedy.

use rowan::{GreenNode, GreenNodeBuilder, TextRange, TextSize};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::lexer::{Token, token_text};
use crate::syntax::SyntaxKind;

use super::core::Parser;

/// How trivia adjacent to a node edge binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeBind {
    /// Trivia stays outside the node.
    Default,
    /// Trivia on this edge is pulled into the node.
    Greedy,
}

#[derive(Debug)]
pub(crate) enum Event {
    /// Opens a node. `kind` is `None` while the marker is unresolved and for
    /// tombstones of abandoned or dissolved markers. `forward_parent` chains
    /// to a wrapper start created by `precede`.
    Start {
        kind: Option<SyntaxKind>,
        forward_parent: Option<u32>,
        left: EdgeBind,
        right: EdgeBind,
    },
    /// Closes the innermost open node. `abandoned` finishes are leftovers of
    /// dissolved completed markers and are skipped.
    Finish { abandoned: bool, right: EdgeBind },
    /// One consumed (non-trivia) token.
    Token,
    /// A positioned message. Lives in the event list so that rolled-back
    /// speculative branches report nothing.
    Error {
        kind: DiagnosticKind,
        message: String,
        range: TextRange,
    },
}

impl Event {
    fn tombstone() -> Self {
        Event::Start {
            kind: None,
            forward_parent: None,
            left: EdgeBind::Default,
            right: EdgeBind::Default,
        }
    }
}

/// Handle for an open node. Resolved exactly once: [`Marker::done`],
/// [`Marker::abandon`], [`Marker::rollback_to`] and [`Marker::error`] all
/// take `self` by value.
#[must_use = "markers must be completed, abandoned or rolled back"]
#[derive(Debug)]
pub struct Marker {
    start: u32,
    pos: u32,
}

impl Marker {
    /// Raw index of the first token the marker would cover.
    pub(crate) fn pos(&self) -> u32 {
        self.pos
    }
}

/// Handle for a node that has been `done()`. Cheap to copy; supports
/// re-parenting via [`CompletedMarker::precede`] and shell removal via
/// [`CompletedMarker::dissolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedMarker {
    start: u32,
    finish: u32,
    kind: SyntaxKind,
    start_pos: u32,
    end_pos: u32,
}

impl CompletedMarker {
    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    /// Raw index of the first token covered by the node.
    pub fn start_pos(&self) -> u32 {
        self.start_pos
    }

    /// Raw index just past the last token covered by the node.
    pub fn end_pos(&self) -> u32 {
        self.end_pos
    }

    /// Insert a new unresolved marker immediately before this node.
    pub fn precede(self, p: &mut Parser<'_>) -> Marker {
        p.builder.precede(self)
    }

    /// Remove the node shell, re-attaching its children to the parent.
    pub fn dissolve(self, p: &mut Parser<'_>) {
        p.builder.dissolve(self);
    }

    pub fn set_edge_binders(&self, p: &mut Parser<'_>, left: EdgeBind, right: EdgeBind) {
        p.builder.set_completed_edges(*self, Some(left), Some(right));
    }
}

impl Marker {
    /// Commit the node with the given kind.
    pub fn done(self, p: &mut Parser<'_>, kind: SyntaxKind) -> CompletedMarker {
        p.builder.complete(self, kind)
    }

    /// Discard the wrapper; children (if any) keep their place in the parent.
    pub fn abandon(self, p: &mut Parser<'_>) {
        p.builder.abandon(self);
    }

    /// Discard everything recorded after this marker and rewind the token
    /// position.
    pub fn rollback_to(self, p: &mut Parser<'_>) {
        p.builder.rollback(self);
    }

    /// Commit as an error node carrying `message`.
    pub fn error(self, p: &mut Parser<'_>, message: impl Into<String>) -> CompletedMarker {
        let range = p.builder.span_from(self.pos);
        p.builder
            .error(DiagnosticKind::SyntaxError, message.into(), range);
        p.builder.complete(self, SyntaxKind::Error)
    }

    pub fn set_edge_binders(&self, p: &mut Parser<'_>, left: EdgeBind, right: EdgeBind) {
        p.builder.set_open_edges(self.start, left, right);
    }
}

/// Token stream plus event sink for one parse run.
pub(crate) struct MarkerBuilder<'s> {
    pub(crate) source: &'s str,
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    events: Vec<Event>,
    done_log: Vec<CompletedMarker>,
}

impl<'s> MarkerBuilder<'s> {
    pub(crate) fn new(source: &'s str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            events: Vec::with_capacity(tokens_capacity_hint(source)),
            done_log: Vec::with_capacity(16),
        }
    }

    fn skip_trivia(&mut self) {
        while self.pos < self.tokens.len() && self.tokens[self.pos].kind.is_trivia() {
            self.pos += 1;
        }
    }

    /// Raw index of the next non-trivia token.
    pub(crate) fn raw_pos(&mut self) -> usize {
        self.skip_trivia();
        self.pos
    }

    pub(crate) fn current(&mut self) -> Option<SyntaxKind> {
        self.skip_trivia();
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    pub(crate) fn eof(&mut self) -> bool {
        self.skip_trivia();
        self.pos >= self.tokens.len()
    }

    pub(crate) fn eof_offset(&self) -> TextSize {
        TextSize::from(self.source.len() as u32)
    }

    pub(crate) fn current_offset(&mut self) -> TextSize {
        self.skip_trivia();
        self.tokens
            .get(self.pos)
            .map_or_else(|| self.eof_offset(), |t| t.span.start())
    }

    pub(crate) fn current_span(&mut self) -> TextRange {
        self.skip_trivia();
        self.tokens
            .get(self.pos)
            .map_or_else(|| TextRange::empty(self.eof_offset()), |t| t.span)
    }

    pub(crate) fn current_text(&mut self) -> &'s str {
        self.skip_trivia();
        match self.tokens.get(self.pos) {
            Some(t) => token_text(self.source, t),
            None => "",
        }
    }

    /// Raw lookup relative to the current (trivia-skipped) position. Negative
    /// offsets see trivia.
    pub(crate) fn raw_lookup(&mut self, offset: isize) -> Option<SyntaxKind> {
        let base = self.raw_pos() as isize;
        let idx = base + offset;
        if idx < 0 {
            return None;
        }
        self.tokens.get(idx as usize).map(|t| t.kind)
    }

    /// Start offset of the token at `offset` raw steps from the current
    /// position; end-of-file offset when out of range.
    pub(crate) fn raw_token_start(&mut self, offset: isize) -> TextSize {
        let base = self.raw_pos() as isize;
        let idx = base + offset;
        if idx < 0 {
            return TextSize::from(0);
        }
        self.tokens
            .get(idx as usize)
            .map_or_else(|| self.eof_offset(), |t| t.span.start())
    }

    pub(crate) fn token_start_offset(&self, pos: u32) -> TextSize {
        self.tokens
            .get(pos as usize)
            .map_or_else(|| self.eof_offset(), |t| t.span.start())
    }

    /// Consume the next non-trivia token.
    pub(crate) fn advance(&mut self) {
        self.skip_trivia();
        if self.pos < self.tokens.len() {
            self.events.push(Event::Token);
            self.pos += 1;
        } else {
            log::error!("advance called at end of file");
        }
    }

    /// Consume `n` raw tokens (trivia included), as counted by multi-token
    /// literal matching.
    pub(crate) fn advance_raw(&mut self, n: usize) {
        for _ in 0..n {
            if self.pos >= self.tokens.len() {
                break;
            }
            if !self.tokens[self.pos].kind.is_trivia() {
                self.events.push(Event::Token);
            }
            self.pos += 1;
        }
    }

    pub(crate) fn mark(&mut self) -> Marker {
        self.skip_trivia();
        let start = self.events.len() as u32;
        self.events.push(Event::tombstone());
        Marker {
            start,
            pos: self.pos as u32,
        }
    }

    pub(crate) fn error(&mut self, kind: DiagnosticKind, message: String, range: TextRange) {
        self.events.push(Event::Error {
            kind,
            message,
            range,
        });
    }

    /// Span from the marker's first token to the last consumed one;
    /// zero-width when nothing was consumed.
    pub(crate) fn span_from(&mut self, from_pos: u32) -> TextRange {
        let from = from_pos as usize;
        if self.pos > from && from < self.tokens.len() {
            let start = self.tokens[from].span.start();
            let end = self.tokens[self.pos - 1].span.end();
            TextRange::new(start, end)
        } else {
            TextRange::empty(self.token_start_offset(from_pos))
        }
    }

    pub(crate) fn latest_done(&self) -> Option<CompletedMarker> {
        self.done_log.last().copied()
    }

    /// Whether every raw token from `from` up to the current position is
    /// trivia.
    pub(crate) fn all_trivia_between(&mut self, from: usize) -> bool {
        let to = self.raw_pos();
        self.tokens[from.min(to)..to].iter().all(|t| t.kind.is_trivia())
    }

    fn complete(&mut self, marker: Marker, kind: SyntaxKind) -> CompletedMarker {
        let right = match &mut self.events[marker.start as usize] {
            Event::Start { kind: slot, right, .. } => {
                debug_assert!(slot.is_none(), "marker completed twice");
                *slot = Some(kind);
                *right
            }
            _ => {
                log::error!("complete target is not a start event");
                EdgeBind::Default
            }
        };
        let finish = self.events.len() as u32;
        self.events.push(Event::Finish {
            abandoned: false,
            right,
        });
        let cm = CompletedMarker {
            start: marker.start,
            finish,
            kind,
            start_pos: marker.pos,
            end_pos: self.pos as u32,
        };
        self.done_log.push(cm);
        cm
    }

    fn abandon(&mut self, marker: Marker) {
        debug_assert!(
            matches!(
                self.events[marker.start as usize],
                Event::Start { kind: None, .. }
            ),
            "abandoned marker was already completed"
        );
        // the tombstone start is skipped during replay
        let _ = marker;
    }

    fn rollback(&mut self, marker: Marker) {
        let start = marker.start as usize;
        self.events.truncate(start);
        self.pos = marker.pos as usize;
        self.done_log.retain(|cm| (cm.finish as usize) < start);
        // a completed marker created before the rollback point may have been
        // preceded by a wrapper that just got truncated
        for event in &mut self.events {
            if let Event::Start { forward_parent, .. } = event
                && forward_parent.is_some_and(|idx| idx as usize >= start)
            {
                *forward_parent = None;
            }
        }
    }

    fn precede(&mut self, cm: CompletedMarker) -> Marker {
        let new_start = self.events.len() as u32;
        let inherited = match &mut self.events[cm.start as usize] {
            Event::Start { forward_parent, .. } => forward_parent.replace(new_start),
            _ => {
                log::error!("precede target is not a start event");
                None
            }
        };
        self.events.push(Event::Start {
            kind: None,
            forward_parent: inherited,
            left: EdgeBind::Default,
            right: EdgeBind::Default,
        });
        Marker {
            start: new_start,
            pos: cm.start_pos,
        }
    }

    fn dissolve(&mut self, cm: CompletedMarker) {
        if let Event::Start { kind, .. } = &mut self.events[cm.start as usize] {
            *kind = None;
        }
        if let Event::Finish { abandoned, .. } = &mut self.events[cm.finish as usize] {
            *abandoned = true;
        }
        if let Some(idx) = self.done_log.iter().rposition(|d| d.start == cm.start) {
            self.done_log.remove(idx);
        }
    }

    fn set_open_edges(&mut self, start: u32, left: EdgeBind, right: EdgeBind) {
        if let Event::Start {
            left: l, right: r, ..
        } = &mut self.events[start as usize]
        {
            *l = left;
            *r = right;
        }
    }

    pub(crate) fn set_completed_edges(
        &mut self,
        cm: CompletedMarker,
        left: Option<EdgeBind>,
        right: Option<EdgeBind>,
    ) {
        if let (Some(left), Event::Start { left: l, .. }) =
            (left, &mut self.events[cm.start as usize])
        {
            *l = left;
        }
        if let (Some(right), Event::Finish { right: r, .. }) =
            (right, &mut self.events[cm.finish as usize])
        {
            *r = right;
        }
    }

    /// Replay the event list into a green tree. Consumes the builder.
    pub(crate) fn finish(self) -> (GreenNode, Diagnostics) {
        let MarkerBuilder {
            source,
            tokens,
            mut events,
            ..
        } = self;
        let mut builder = GreenNodeBuilder::new();
        let mut diagnostics = Diagnostics::new();
        let mut last_reported: Option<TextSize> = None;
        let mut cursor = 0usize;
        let mut depth = 0i64;
        let last_finish = events
            .iter()
            .rposition(|e| matches!(e, Event::Finish { abandoned: false, .. }));

        let mut chain: Vec<(SyntaxKind, EdgeBind)> = Vec::new();
        for i in 0..events.len() {
            match std::mem::replace(&mut events[i], Event::tombstone()) {
                Event::Start {
                    kind,
                    forward_parent,
                    left,
                    ..
                } => {
                    chain.clear();
                    if let Some(k) = kind {
                        chain.push((k, left));
                    }
                    let mut fp = forward_parent;
                    while let Some(idx) = fp {
                        match std::mem::replace(&mut events[idx as usize], Event::tombstone()) {
                            Event::Start {
                                kind,
                                forward_parent,
                                left,
                                ..
                            } => {
                                if let Some(k) = kind {
                                    chain.push((k, left));
                                }
                                fp = forward_parent;
                            }
                            other => {
                                log::error!("forward parent is not a start event");
                                events[idx as usize] = other;
                                break;
                            }
                        }
                    }
                    for &(k, left) in chain.iter().rev() {
                        if depth > 0 && left == EdgeBind::Default {
                            flush_trivia(&mut builder, &tokens, source, &mut cursor);
                        }
                        builder.start_node(k.into());
                        depth += 1;
                    }
                }
                Event::Finish { abandoned, right } => {
                    if abandoned {
                        continue;
                    }
                    if right == EdgeBind::Greedy {
                        flush_trivia(&mut builder, &tokens, source, &mut cursor);
                    }
                    if last_finish == Some(i) {
                        // trailing tokens (normally just trivia) belong to the
                        // outermost node
                        while cursor < tokens.len() {
                            emit_token(&mut builder, &tokens[cursor], source);
                            cursor += 1;
                        }
                    }
                    if depth <= 0 {
                        log::error!("unbalanced finish event ignored");
                        continue;
                    }
                    builder.finish_node();
                    depth -= 1;
                }
                Event::Token => {
                    flush_trivia(&mut builder, &tokens, source, &mut cursor);
                    if cursor < tokens.len() {
                        emit_token(&mut builder, &tokens[cursor], source);
                        cursor += 1;
                    } else {
                        log::error!("token event past end of stream ignored");
                    }
                }
                Event::Error {
                    kind,
                    message,
                    range,
                } => {
                    if last_reported != Some(range.start()) {
                        last_reported = Some(range.start());
                        diagnostics.report(kind, range).message(message).emit();
                    }
                }
            }
        }
        while depth > 0 {
            log::error!("node left open at end of parse, closing defensively");
            builder.finish_node();
            depth -= 1;
        }
        (builder.finish(), diagnostics)
    }
}

fn flush_trivia(
    builder: &mut GreenNodeBuilder<'static>,
    tokens: &[Token],
    source: &str,
    cursor: &mut usize,
) {
    while *cursor < tokens.len() && tokens[*cursor].kind.is_trivia() {
        emit_token(builder, &tokens[*cursor], source);
        *cursor += 1;
    }
}

fn emit_token(builder: &mut GreenNodeBuilder<'static>, token: &Token, source: &str) {
    builder.token(token.kind.into(), token_text(source, token));
}

fn tokens_capacity_hint(source: &str) -> usize {
    (source.len() / 4).clamp(16, 4096)
}
