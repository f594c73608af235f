//! Syntax kinds and per-language configuration.
//!
//! `SyntaxKind` serves dual roles: token kinds (from lexer) and node kinds
//! (from parser). Logos derives token recognition; node kinds lack
//! token/regex attributes. `FsLang` implements Rowan's `Language` trait for
//! tree construction.
//!
//! FlexibleSearch keywords are matched case-insensitively at the lexer
//! level; string-literal matching in the parser consults
//! [`LanguageConfig::case_sensitive`] instead.

use logos::Logos;
use rowan::Language;

/// All token and node kinds. Tokens first, then nodes, then `__LAST` sentinel.
/// `#[repr(u16)]` enables safe transmute in `kind_from_raw`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    /// `{{` opens a FlexibleSearch subquery. Defined before `LBrace` so the
    /// longer token wins.
    #[token("{{")]
    LDblBrace = 0,

    #[token("}}")]
    RDblBrace,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token("*")]
    Star,

    #[token("=")]
    Eq,

    #[token("<>")]
    #[token("!=")]
    NotEq,

    #[token("<=")]
    LtEq,

    #[token(">=")]
    GtEq,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("||")]
    Concat,

    #[token("select", ignore(ascii_case))]
    KwSelect,

    #[token("from", ignore(ascii_case))]
    KwFrom,

    #[token("where", ignore(ascii_case))]
    KwWhere,

    #[token("join", ignore(ascii_case))]
    KwJoin,

    #[token("left", ignore(ascii_case))]
    KwLeft,

    #[token("on", ignore(ascii_case))]
    KwOn,

    #[token("as", ignore(ascii_case))]
    KwAs,

    #[token("order", ignore(ascii_case))]
    KwOrder,

    #[token("group", ignore(ascii_case))]
    KwGroup,

    #[token("by", ignore(ascii_case))]
    KwBy,

    #[token("and", ignore(ascii_case))]
    KwAnd,

    #[token("or", ignore(ascii_case))]
    KwOr,

    #[token("not", ignore(ascii_case))]
    KwNot,

    #[token("null", ignore(ascii_case))]
    KwNull,

    #[token("in", ignore(ascii_case))]
    KwIn,

    #[token("is", ignore(ascii_case))]
    KwIs,

    #[token("union", ignore(ascii_case))]
    KwUnion,

    #[token("all", ignore(ascii_case))]
    KwAll,

    #[token("distinct", ignore(ascii_case))]
    KwDistinct,

    /// Identifier. Defined after keywords so they take precedence.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+(?:\.[0-9]+)?")]
    Number,

    /// SQL-style string literal, `''` escapes a quote.
    #[regex(r"'(?:[^']|'')*'")]
    QuotedString,

    /// Named query parameter: `?code`, `?session.user.uid`
    #[regex(r"\?[a-zA-Z_][a-zA-Z0-9_.]*")]
    NamedParam,

    #[regex(r"[ \t]+")]
    Whitespace,

    #[token("\n")]
    #[token("\r\n")]
    Newline,

    #[regex(r"--[^\n]*")]
    LineComment,

    #[regex(r"/\*(?:[^*]|\*[^/])*\*/")]
    BlockComment,

    /// Coalesced unrecognized characters
    Garbage,
    Error,

    // --- Node kinds (non-terminals) ---
    Root,
    Statement,
    SelectList,
    Column,
    TableRef,
    Expression,
    /// Synthetic wrapper emitted by tree balancing and recovery chunking.
    DummyBlock,

    // Must be last - used for bounds checking in `kind_from_raw`
    #[doc(hidden)]
    __LAST,
}

use SyntaxKind::*;

impl SyntaxKind {
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(self, Whitespace | Newline | LineComment | BlockComment)
    }

    #[inline]
    pub fn is_error(self) -> bool {
        matches!(self, Error | Garbage)
    }

    /// Display text used in expected-token lists and completion candidates.
    ///
    /// Keywords render as their canonical uppercase spelling, punctuation as
    /// itself, open-ended tokens as a `<placeholder>`. The error renderer
    /// wraps non-identifier entries in single quotes; the completion layer
    /// filters placeholders and 1-char candidates out.
    pub fn expected_name(self) -> &'static str {
        match self {
            LDblBrace => "{{",
            RDblBrace => "}}",
            LBrace => "{",
            RBrace => "}",
            LParen => "(",
            RParen => ")",
            Comma => ",",
            Dot => ".",
            Colon => ":",
            Semicolon => ";",
            Star => "*",
            Eq => "=",
            NotEq => "<>",
            LtEq => "<=",
            GtEq => ">=",
            Lt => "<",
            Gt => ">",
            Concat => "||",
            KwSelect => "SELECT",
            KwFrom => "FROM",
            KwWhere => "WHERE",
            KwJoin => "JOIN",
            KwLeft => "LEFT",
            KwOn => "ON",
            KwAs => "AS",
            KwOrder => "ORDER",
            KwGroup => "GROUP",
            KwBy => "BY",
            KwAnd => "AND",
            KwOr => "OR",
            KwNot => "NOT",
            KwNull => "NULL",
            KwIn => "IN",
            KwIs => "IS",
            KwUnion => "UNION",
            KwAll => "ALL",
            KwDistinct => "DISTINCT",
            Ident => "<identifier>",
            Number => "<number>",
            QuotedString => "<string>",
            NamedParam => "<parameter>",
            Whitespace => "<whitespace>",
            Newline => "<newline>",
            LineComment | BlockComment => "<comment>",
            Garbage | Error => "<error>",
            Root => "<root>",
            Statement => "<statement>",
            SelectList => "<select list>",
            Column => "<column>",
            TableRef => "<table reference>",
            Expression => "<expression>",
            DummyBlock => "<block>",
            __LAST => "<invalid>",
        }
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    #[inline]
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language tag for Rowan's tree types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FsLang {}

impl Language for FsLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 < __LAST as u16);
        // SAFETY: We've verified the value is in bounds, and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for Rowan types parameterized by our language.
pub type SyntaxNode = rowan::SyntaxNode<FsLang>;
pub type SyntaxToken = rowan::SyntaxToken<FsLang>;
pub type SyntaxElement = rowan::NodeOrToken<SyntaxNode, SyntaxToken>;

/// 64-bit bitset of `SyntaxKind`s for O(1) membership testing.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TokenSet(u64);

impl TokenSet {
    /// Creates an empty token set.
    pub const EMPTY: TokenSet = TokenSet(0);

    /// Panics at compile time if any kind's discriminant >= 64.
    #[inline]
    pub const fn new(kinds: &[SyntaxKind]) -> Self {
        let mut bits = 0u64;
        let mut i = 0;
        while i < kinds.len() {
            let kind = kinds[i] as u16;
            assert!(kind < 64, "SyntaxKind value exceeds TokenSet capacity");
            bits |= 1 << kind;
            i += 1;
        }
        TokenSet(bits)
    }

    #[inline]
    pub const fn single(kind: SyntaxKind) -> Self {
        let kind = kind as u16;
        assert!(kind < 64, "SyntaxKind value exceeds TokenSet capacity");
        TokenSet(1 << kind)
    }

    #[inline]
    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        let kind = kind as u16;
        if kind >= 64 {
            return false;
        }
        self.0 & (1 << kind) != 0
    }

    #[inline]
    pub const fn union(self, other: TokenSet) -> TokenSet {
        TokenSet(self.0 | other.0)
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_set();
        for i in 0..64u16 {
            if self.0 & (1 << i) != 0 && i < __LAST as u16 {
                let kind: SyntaxKind = unsafe { std::mem::transmute(i) };
                list.entry(&kind);
            }
        }
        list.finish()
    }
}

/// A matched pair of bracket tokens.
///
/// Recovery and tree balancing consult the *first* configured pair when
/// deciding whether skipped regions are bracket-balanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracePair {
    pub left: SyntaxKind,
    pub right: SyntaxKind,
}

impl BracePair {
    pub const fn new(left: SyntaxKind, right: SyntaxKind) -> Self {
        Self { left, right }
    }
}

/// Per-language knobs consumed by the parser runtime.
#[derive(Clone)]
pub struct LanguageConfig {
    /// Governs string-literal token matching (`consume_literal` etc).
    pub case_sensitive: bool,
    /// Bracket pairs, most significant first.
    pub braces: Vec<BracePair>,
    /// Optional "child type extends parent type" oracle, used by the
    /// COLLAPSE modifier and recovery bracket matching.
    pub type_extends: Option<fn(SyntaxKind, SyntaxKind) -> bool>,
}

impl LanguageConfig {
    /// FlexibleSearch: case-insensitive keywords, `()`/`{{}}`/`{}` pairs.
    pub fn flexible_search() -> Self {
        Self {
            case_sensitive: false,
            braces: vec![
                BracePair::new(LParen, RParen),
                BracePair::new(LDblBrace, RDblBrace),
                BracePair::new(LBrace, RBrace),
            ],
            type_extends: None,
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            braces: Vec::new(),
            type_extends: None,
        }
    }
}

impl std::fmt::Debug for LanguageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageConfig")
            .field("case_sensitive", &self.case_sensitive)
            .field("braces", &self.braces)
            .field("type_extends", &self.type_extends.map(|_| "fn"))
            .finish()
    }
}
