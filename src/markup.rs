//! Malformed-markup diagnostics.

use crate::diagnostics::{Diagnostic, DiagnosticSource, Range};
use crate::document::Document;
use crate::parser::{SyntaxError, try_parse};

/// Report the first well-formedness violation in `document`, if any.
pub fn validate_markup(document: &Document) -> Vec<Diagnostic> {
    match try_parse(document.text()) {
        Ok(_) => Vec::new(),
        Err(err) => vec![syntax_error_diagnostic(document, &err)],
    }
}

/// Zero-width error diagnostic at the offset where parsing failed.
pub fn syntax_error_diagnostic(document: &Document, err: &SyntaxError) -> Diagnostic {
    Diagnostic::error(
        Range::point(document.position_at(err.offset)),
        format!("Malformed XML: {}", err.message),
        DiagnosticSource::Xml,
    )
}
