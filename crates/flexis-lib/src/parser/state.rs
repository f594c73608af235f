//! Per-parse error-tracking state: frames, expectation variants, hooks.
//!
//! One [`ErrorState`] exists per parse run, owned by the `Parser` context
//! and never shared. The frame stack mirrors the grammar's rule nesting;
//! variant lists are capacity-retaining arenas (alloc = push, speculative
//! rollback = truncate to a frame's snapshot).

use rowan::TextSize;

use flexis_core::utils::{is_ident_start, join};

use crate::syntax::SyntaxKind;

use super::builder::{CompletedMarker, EdgeBind};
use super::completion::CompletionState;
use super::sections::Modifiers;

/// Recursion ceiling applied unless overridden via
/// `Parser::with_recursion_limit`.
pub(crate) const MAX_RECURSION_LEVEL: u32 = 1000;
/// Hard cap on retained variants; the middle of the list is evicted beyond
/// it so the earliest and the furthest expectations survive.
const MAX_VARIANTS_SIZE: usize = 10_000;
const MAX_VARIANTS_TO_DISPLAY: usize = 50;
/// Shown token text is clipped to this many characters.
pub(crate) const MAX_ERROR_TOKEN_TEXT: usize = 20;
const INITIAL_VARIANTS_CAPACITY: usize = 1000;

/// One recorded "this was a valid continuation here".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    Token(SyntaxKind),
    /// A pinned token run offered as a unit, e.g. `ORDER BY`.
    Tokens(&'static [SyntaxKind]),
    /// A string-literal token match.
    Literal(&'static str),
    /// A whole rule, by its display name.
    Rule(&'static str),
}

impl Expectation {
    pub(crate) fn text(&self) -> String {
        match self {
            Expectation::Token(kind) => kind.expected_name().to_string(),
            Expectation::Tokens(kinds) => {
                join(kinds.iter().map(|k| k.expected_name()), " ")
            }
            Expectation::Literal(text) | Expectation::Rule(text) => (*text).to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Variant {
    pub position: i32,
    pub item: Expectation,
}

/// Variant arena with the original's mid-range eviction policy.
#[derive(Debug)]
pub(crate) struct VariantList {
    items: Vec<Variant>,
}

impl VariantList {
    fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn push(&mut self, variant: Variant) {
        let len = self.items.len();
        if len >= MAX_VARIANTS_SIZE {
            self.items
                .drain(MAX_VARIANTS_SIZE / 4..len - MAX_VARIANTS_SIZE / 4);
        }
        self.items.push(variant);
    }

    pub(crate) fn truncate(&mut self, start: usize) {
        if start < self.items.len() {
            self.items.truncate(start);
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Variant> {
        self.items.iter()
    }
}

/// One activation record per entered grammar rule.
#[derive(Debug)]
pub(crate) struct Frame {
    pub kind: Option<SyntaxKind>,
    pub offset: TextSize,
    /// Raw token index at entry.
    pub position: i32,
    pub level: u32,
    pub modifiers: Modifiers,
    pub name: Option<&'static str>,
    /// Variant-list length at entry, for speculative rollback.
    pub variant_count: usize,
    /// Raw token index the last error was reported at, -1 = unset.
    pub error_reported_at: i32,
    /// Left sibling node captured for LEFT / LEFT_INNER rewriting.
    pub left: Option<CompletedMarker>,
}

/// A deferred post-commit adjustment, run when the registering level closes.
#[derive(Debug, Clone, Copy)]
pub enum Hook {
    /// Rebind leading trivia of the produced node.
    LeftBinder(EdgeBind),
    /// Rebind trailing trivia of the produced node.
    RightBinder(EdgeBind),
    /// Rebind both edges.
    EdgeBinders(EdgeBind, EdgeBind),
    /// Emit a debug log line when the node closes.
    Log(&'static str),
}

#[derive(Debug)]
pub(crate) struct HookEntry {
    pub level: u32,
    pub hook: Hook,
}

pub(crate) struct ErrorState {
    pub frames: Vec<Frame>,
    pub variants: VariantList,
    pub unexpected: VariantList,
    pub hooks: Vec<HookEntry>,
    pub level: u32,
    pub predicate_count: u32,
    pub predicate_sign: bool,
    pub suppress_errors: bool,
    /// Furthest raw position any expected variant was recorded at, -1 = none.
    pub last_expected_variant_pos: i32,
    pub completion: Option<CompletionState>,
    pub recursion_limit: u32,
}

impl ErrorState {
    pub(crate) fn new() -> Self {
        Self {
            frames: Vec::with_capacity(32),
            variants: VariantList::new(INITIAL_VARIANTS_CAPACITY),
            unexpected: VariantList::new(INITIAL_VARIANTS_CAPACITY / 10),
            hooks: Vec::new(),
            level: 0,
            predicate_count: 0,
            predicate_sign: true,
            suppress_errors: false,
            last_expected_variant_pos: -1,
            completion: None,
            recursion_limit: MAX_RECURSION_LEVEL,
        }
    }

    pub(crate) fn add_variant_inner(&mut self, position: i32, item: Expectation) {
        let variant = Variant { position, item };
        if self.predicate_sign {
            self.variants.push(variant);
            if self.last_expected_variant_pos < position {
                self.last_expected_variant_pos = position;
            }
        } else {
            self.unexpected.push(variant);
        }
    }

    pub(crate) fn clear_variants(&mut self, expected: bool, start: usize) {
        if expected {
            self.variants.truncate(start);
        } else {
            self.unexpected.truncate(start);
        }
    }

    pub(crate) fn last_variant_pos(&self, default: i32) -> i32 {
        if self.last_expected_variant_pos < 0 {
            default
        } else {
            self.last_expected_variant_pos
        }
    }

    /// `"A, B or C expected, "` for the given position; empty when nothing
    /// was expected there.
    pub(crate) fn expected_text(&self, position: i32) -> String {
        let mut sb = String::new();
        if self.add_expected(&mut sb, position, true) {
            sb.push_str(" expected, ");
        }
        sb
    }

    fn add_expected(&self, sb: &mut String, position: i32, expected: bool) -> bool {
        let list = if expected { &self.variants } else { &self.unexpected };
        let mut hashes: Vec<u32> = Vec::new();
        let mut strings: Vec<String> = Vec::new();
        'variants: for variant in list.iter() {
            if variant.position != position {
                continue;
            }
            let text = variant.item.text();
            let hash = crc32fast::hash(text.as_bytes());
            for &seen in &hashes {
                if seen == hash {
                    continue 'variants;
                }
            }
            hashes.push(hash);
            strings.push(text);
        }
        strings.sort_unstable();
        let mut count = 0;
        for s in &strings {
            if s.is_empty() {
                continue;
            }
            count += 1;
            if count > 1 {
                if count > MAX_VARIANTS_TO_DISPLAY {
                    sb.push_str(" and ...");
                    break;
                }
                sb.push_str(", ");
            }
            let first = s.chars().next().unwrap();
            if first == '<' || is_ident_start(first) {
                sb.push_str(s);
            } else {
                sb.push('\'');
                sb.push_str(s);
                sb.push('\'');
            }
        }
        if count > 1 && count < MAX_VARIANTS_TO_DISPLAY {
            if let Some(idx) = sb.rfind(", ") {
                sb.replace_range(idx..idx + 1, " or");
            }
        }
        count > 0
    }
}
