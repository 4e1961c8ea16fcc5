//! Diagnostic records produced by the validation passes.
//!
//! The serialized shape is consumed by editor integrations and the publish
//! gate, so field names are fixed: `severity`, `range`, `message`, `source`.
//! All positions are zero-based.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::Document;

/// A position in a text document, expressed as zero-based line and column.
///
/// Columns are measured in UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A half-open range in a text document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Range {
    /// The range's start position (inclusive).
    pub start: Position,
    /// The range's end position (exclusive).
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a range spanning a single position (zero-width).
    pub fn point(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Build a range from byte offsets into the document text.
    pub fn from_offsets(document: &Document, start: usize, end: usize) -> Self {
        Self {
            start: document.position_at(start),
            end: document.position_at(end),
        }
    }

    /// Check if this range is empty (zero-width).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Diagnostic severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "information",
            Severity::Hint => "hint",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The family a diagnostic belongs to.
///
/// The publish gate decides between blocking and confirming based on this
/// tag, so the serialized names must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticSource {
    /// Unresolved media references.
    ImagePath,
    /// Malformed markup.
    Xml,
    /// Findings of the stricter grammar check run outside this crate.
    Schema,
}

impl DiagnosticSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticSource::ImagePath => "image-path",
            DiagnosticSource::Xml => "xml",
            DiagnosticSource::Schema => "schema",
        }
    }
}

impl fmt::Display for DiagnosticSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positioned report of a problem in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub range: Range,
    pub message: String,
    pub source: DiagnosticSource,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        range: Range,
        message: impl Into<String>,
        source: DiagnosticSource,
    ) -> Self {
        Self {
            severity,
            range,
            message: message.into(),
            source,
        }
    }

    /// Create an error-severity diagnostic.
    pub fn error(range: Range, message: impl Into<String>, source: DiagnosticSource) -> Self {
        Self::new(Severity::Error, range, message, source)
    }

    /// Diagnostic for a media reference whose target file does not exist.
    ///
    /// `start` is the byte offset of `raw_path` in the document text; the
    /// range covers exactly the path string.
    pub fn missing_image(document: &Document, start: usize, raw_path: &str) -> Self {
        Self::error(
            Range::from_offsets(document, start, start + raw_path.len()),
            missing_image_message(raw_path),
            DiagnosticSource::ImagePath,
        )
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Message reported for an unresolved media reference.
pub fn missing_image_message(raw_path: &str) -> String {
    format!("Image file {} doesn't exist!", raw_path)
}
