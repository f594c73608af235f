use rowan::TextRange;

/// Diagnostic kinds produced by the parser runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    /// Ordinary expected/got mismatch, message carries the rendered
    /// expectation set.
    SyntaxError,
    /// A grammar rule nested deeper than the configured ceiling.
    RecursionLimit,
    /// A rule or balancing loop consumed zero tokens on an iteration.
    EmptyElement,
    /// Internal consistency defect the runtime recovered from.
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl DiagnosticKind {
    pub fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Base message for this diagnostic kind, used when no custom message is
    /// provided.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::SyntaxError => "syntax error",
            Self::RecursionLimit => "maximum recursion level reached",
            Self::EmptyElement => "empty element parsed",
            Self::Internal => "internal parser defect",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub range: TextRange,
    pub message: String,
}

impl DiagnosticMessage {
    pub fn new(kind: DiagnosticKind, range: TextRange, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            range,
            message: message.into(),
        }
    }

    pub fn with_default_message(kind: DiagnosticKind, range: TextRange) -> Self {
        Self::new(kind, range, kind.fallback_message())
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sev = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{sev}[{:?}..{:?}]: {}",
            u32::from(self.range.start()),
            u32::from(self.range.end()),
            self.message
        )
    }
}
