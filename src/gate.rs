//! Publish gate.
//!
//! Decides whether a set of diagnostics should stop content from being
//! published. Malformed markup and broken media references block outright;
//! anything else only asks the author to confirm.

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, DiagnosticSource};

/// Outcome of evaluating diagnostics before a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateDecision {
    /// No diagnostics at all.
    Clear,
    /// Only advisory diagnostics; publishing needs confirmation.
    Confirm,
    /// At least one blocking diagnostic.
    Blocked,
}

impl GateDecision {
    pub fn is_blocked(&self) -> bool {
        matches!(self, GateDecision::Blocked)
    }
}

/// Classifies diagnostics by source family.
#[derive(Debug, Clone)]
pub struct PublishGate {
    blocking: Vec<DiagnosticSource>,
}

impl PublishGate {
    pub fn new() -> Self {
        Self {
            blocking: vec![DiagnosticSource::Xml, DiagnosticSource::ImagePath],
        }
    }

    /// Whether diagnostics from `source` block publishing.
    pub fn is_blocking(&self, source: DiagnosticSource) -> bool {
        self.blocking.contains(&source)
    }

    pub fn evaluate(&self, diagnostics: &[Diagnostic]) -> GateDecision {
        if diagnostics.is_empty() {
            GateDecision::Clear
        } else if diagnostics.iter().any(|d| self.is_blocking(d.source)) {
            GateDecision::Blocked
        } else {
            GateDecision::Confirm
        }
    }
}

impl Default for PublishGate {
    fn default() -> Self {
        Self::new()
    }
}
