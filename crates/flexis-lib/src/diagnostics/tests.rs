use rowan::TextRange;

use super::{DiagnosticKind, Diagnostics, Severity};

fn range(start: u32, end: u32) -> TextRange {
    TextRange::new(start.into(), end.into())
}

#[test]
fn report_with_default_message() {
    let mut diags = Diagnostics::new();
    diags.report(DiagnosticKind::EmptyElement, range(0, 1)).emit();

    assert_eq!(diags.len(), 1);
    assert!(diags.has_errors());
    assert_eq!(diags.messages()[0].message, "empty element parsed");
}

#[test]
fn report_with_custom_message() {
    let mut diags = Diagnostics::new();
    diags
        .report(DiagnosticKind::SyntaxError, range(3, 7))
        .message("SELECT expected, got 'frm'")
        .emit();

    assert_eq!(diags.messages()[0].message, "SELECT expected, got 'frm'");
    assert_eq!(diags.messages()[0].kind, DiagnosticKind::SyntaxError);
}

#[test]
fn unemitted_builder_records_nothing() {
    let mut diags = Diagnostics::new();
    let builder = diags.report(DiagnosticKind::SyntaxError, range(0, 1));
    drop(builder);
    assert!(diags.is_empty());
}

#[test]
fn severity_override() {
    let mut diags = Diagnostics::new();
    diags
        .report(DiagnosticKind::EmptyElement, range(0, 1))
        .severity(Severity::Warning)
        .emit();

    assert!(!diags.has_errors());
    assert_eq!(diags.error_count(), 0);
}

#[test]
fn render_includes_message_and_position() {
    let source = "SELECT frm t";
    let mut diags = Diagnostics::new();
    diags
        .report(DiagnosticKind::SyntaxError, range(7, 10))
        .message("FROM expected, got 'frm'")
        .emit();

    let rendered = diags.render(source);
    assert!(rendered.contains("FROM expected, got 'frm'"));
    assert!(rendered.contains("SELECT frm t"));
}

#[test]
fn render_empty_is_empty() {
    assert_eq!(Diagnostics::new().render("x"), "");
}
