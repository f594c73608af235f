//! Tree balancing for flat repetitions (`parse_as_tree`).
//!
//! A rule shaped `item (separator item)*` over thousands of items would
//! otherwise nest one level per element. The balancer parses elements into
//! chunks of at most [`ChunkPolicy::chunk_size`] siblings under a synthetic
//! wrapper, and whenever [`ChunkPolicy::merge_at`] wrappers of the same
//! rating accumulate, combines them under one more wrapper, producing
//! O(log n) depth. Bracketed sub-regions are tracked on an explicit stack
//! and always balanced as a unit before a closing bracket is crossed.

use std::collections::VecDeque;

use crate::syntax::SyntaxKind;

use super::builder::{CompletedMarker, EdgeBind, Marker};
use super::core::{Parser, Rule};

/// Chunking knobs for [`Parser::parse_as_tree_with`].
#[derive(Debug, Clone, Copy)]
pub struct ChunkPolicy {
    /// Maximum siblings grouped under one synthetic wrapper.
    pub chunk_size: usize,
    /// Number of same-rating wrappers that triggers another merge level.
    pub merge_at: usize,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            chunk_size: 10,
            merge_at: 4,
        }
    }
}

impl Parser<'_> {
    /// Balanced repetition parse with the default policy.
    pub fn parse_as_tree(
        &mut self,
        level: u32,
        chunk_kind: SyntaxKind,
        check_braces: bool,
        element: &dyn Rule,
        eat_more: &dyn Rule,
    ) -> bool {
        self.parse_as_tree_with(
            ChunkPolicy::default(),
            level,
            chunk_kind,
            check_braces,
            element,
            eat_more,
        )
    }

    /// Parse `element` repeatedly, grouping results into a balanced tree of
    /// `chunk_kind` wrappers. Returns whether at least one element parsed.
    pub fn parse_as_tree_with(
        &mut self,
        policy: ChunkPolicy,
        level: u32,
        chunk_kind: SyntaxKind,
        check_braces: bool,
        element: &dyn Rule,
        eat_more: &dyn Rule,
    ) -> bool {
        // open bracket regions: wrapper marker plus the sibling that
        // delimits merging below this region
        let mut paren_stack: Vec<(Marker, Option<CompletedMarker>)> = Vec::new();
        // completed wrappers, most recent first, with their merge rating
        let mut siblings: VecDeque<(CompletedMarker, u32)> = VecDeque::new();
        let mut marker: Option<Marker> = None;

        let pair = self.config.braces.first().copied();
        let check_parens = check_braces && pair.is_some();
        let mut total_count = 0usize;
        let mut token_count = 0usize;

        if check_parens
            && let Some(pair) = pair
        {
            // an error node directly after a left bracket joins the bracket
            // region so the recovered run is balanced as a unit
            let mut idx: isize = -1;
            while self.builder.raw_lookup(idx).is_some_and(|k| k.is_trivia()) {
                idx -= 1;
            }
            if self.builder.raw_lookup(idx) == Some(pair.left)
                && let Some(done) = self.latest_done()
                && done.kind() == SyntaxKind::Error
                && self.builder.token_start_offset(done.start_pos())
                    == self.builder.raw_token_start(idx)
            {
                let wrapper = done.precede(self);
                paren_stack.push((wrapper, None));
            }
        }

        let mut checkpoint = self.current_position();
        loop {
            let token = self.current();
            let at_left = check_parens && pair.is_some_and(|p| token == Some(p.left));
            let at_right = check_parens
                && pair.is_some_and(|p| token == Some(p.right))
                && !paren_stack.is_empty();
            if at_left || at_right {
                if let Some(m) = marker.take() {
                    let done = m.done(self, chunk_kind);
                    siblings.push_front((done, 1));
                    token_count = 0;
                }
                if at_left {
                    let barrier = siblings.front().map(|(done, _)| *done);
                    let m = self.mark();
                    paren_stack.push((m, barrier));
                }
                merge_siblings(self, &mut siblings, &paren_stack, policy, chunk_kind);
                self.advance();
                if at_right {
                    let Some((m, barrier)) = paren_stack.pop() else {
                        break;
                    };
                    let done = m.done(self, chunk_kind);
                    while siblings
                        .front()
                        .is_some_and(|(front, _)| Some(*front) != barrier)
                    {
                        siblings.pop_front();
                    }
                    siblings.push_front((done, 1));
                    merge_siblings(self, &mut siblings, &paren_stack, policy, chunk_kind);
                }
            } else {
                if marker.is_none() {
                    let m = self.mark();
                    m.set_edge_binders(self, EdgeBind::Greedy, EdgeBind::Default);
                    marker = Some(m);
                }
                let parsed = (!paren_stack.is_empty() || eat_more.parse(self, level + 1))
                    && element.parse(self, level + 1);
                if !parsed {
                    break;
                }
                token_count += 1;
                total_count += 1;
            }

            if token_count >= policy.chunk_size
                && let Some(m) = marker.take()
            {
                let done = m.done(self, chunk_kind);
                siblings.push_front((done, 1));
                merge_siblings(self, &mut siblings, &paren_stack, policy, chunk_kind);
                token_count = 0;
            }
            if !self.empty_element_guard("parse_as_tree", checkpoint) {
                break;
            }
            checkpoint = self.current_position();
        }

        if let Some(m) = marker.take() {
            if token_count > 0 {
                m.done(self, chunk_kind);
            } else {
                m.abandon(self);
            }
        }
        for (m, _) in paren_stack {
            m.abandon(self);
        }
        total_count != 0
    }
}

/// Combine runs of `merge_at` same-rating wrappers under a new wrapper,
/// repeatedly, never across the current bracket region's barrier.
fn merge_siblings(
    p: &mut Parser<'_>,
    siblings: &mut VecDeque<(CompletedMarker, u32)>,
    paren_stack: &[(Marker, Option<CompletedMarker>)],
    policy: ChunkPolicy,
    chunk_kind: SyntaxKind,
) {
    let barrier = paren_stack.last().and_then(|(_, barrier)| *barrier);
    loop {
        let Some(&(_, rating)) = siblings.front() else {
            break;
        };
        let mut oldest = None;
        let mut count = 0usize;
        for &(done, r) in siblings.iter() {
            if r != rating || Some(done) == barrier {
                break;
            }
            count += 1;
            if count >= policy.merge_at {
                oldest = Some(done);
                break;
            }
        }
        let Some(oldest) = oldest else {
            break;
        };
        // the oldest wrapper of the window starts where the window starts
        let parent = oldest.precede(p);
        parent.set_edge_binders(p, EdgeBind::Greedy, EdgeBind::Default);
        for _ in 0..count {
            siblings.pop_front();
        }
        let parent_done = parent.done(p, chunk_kind);
        siblings.push_front((parent_done, rating + 1));
    }
}
