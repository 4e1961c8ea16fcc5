//! Image reference validation.
//!
//! Every `<image src="...">` element in a parsed document names a media file
//! relative to the document's own directory. References whose target does
//! not exist are reported as `image-path` diagnostics covering the exact
//! path string in the original text.
//!
//! The parser records where each attribute value was written, so a span
//! normally covers the `src` value of its own element, and repeated paths get
//! their own spans. When the written value differs from the parsed one (for
//! example when it uses entity escapes) a plain substring search on the
//! original text takes the first occurrence instead, and failing that the
//! span is a zero-width range at the element.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use tracing::{debug, warn};

use crate::diagnostics::{Diagnostic, DiagnosticSource, Range, missing_image_message};
use crate::document::Document;
use crate::fs::FileSystem;
use crate::parser::{Element, XmlDocument};

/// Local name of the media reference element.
pub const IMAGE_ELEMENT: &str = "image";

/// Attribute carrying the referenced path.
pub const SOURCE_ATTRIBUTE: &str = "src";

/// A media reference extracted from a complete image element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateReference<'a> {
    /// The attribute value exactly as parsed.
    pub path: &'a str,
    /// Byte offset of the owning element in the source text.
    pub element_offset: usize,
    /// Byte offset of the attribute value as written, when known.
    pub value_offset: Option<usize>,
}

impl<'a> CandidateReference<'a> {
    /// Extract a reference from `element` if it is an image element that
    /// carries a source path. Image elements without one are still being
    /// written and are ignored.
    pub fn from_element(element: &'a Element) -> Option<Self> {
        if element.local_name() != IMAGE_ELEMENT {
            return None;
        }
        element
            .attribute_entry(SOURCE_ATTRIBUTE)
            .map(|attr| CandidateReference {
                path: &attr.value,
                element_offset: element.offset,
                value_offset: attr.value_offset,
            })
    }

    /// Absolute (or cwd-independent) location of the referenced file.
    pub fn resolve(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(self.path)
    }

    /// Byte offset of this reference's path string in `text`.
    pub fn locate(&self, text: &str) -> Option<usize> {
        if self.path.is_empty() {
            return None;
        }
        if let Some(offset) = self.value_offset
            && text
                .get(offset..)
                .is_some_and(|written| written.starts_with(self.path))
        {
            return Some(offset);
        }
        text.find(self.path)
    }
}

/// Collect all image references in document order (depth-first, pre-order).
pub fn collect_candidates(tree: &XmlDocument) -> Vec<CandidateReference<'_>> {
    tree.root
        .descendants()
        .filter_map(CandidateReference::from_element)
        .collect()
}

/// Report every image reference in `document` whose file does not exist.
///
/// `parsed` is the result of parsing the document's text; when parsing
/// failed there is nothing to check and the result is empty. Existence
/// checks for all references are issued together and awaited before any
/// diagnostic is built, and the diagnostics come back in document order.
pub async fn validate_image_paths(
    document: &Document,
    parsed: Option<&XmlDocument>,
    fs: &dyn FileSystem,
) -> Vec<Diagnostic> {
    let Some(tree) = parsed else {
        return Vec::new();
    };

    let candidates = collect_candidates(tree);
    if candidates.is_empty() {
        return Vec::new();
    }
    debug!(
        document = %document.location().display(),
        count = candidates.len(),
        "checking image references"
    );

    let base_dir = document.base_dir();
    let missing = join_all(
        candidates
            .iter()
            .map(|candidate| is_missing(fs, candidate.resolve(base_dir))),
    )
    .await;

    candidates
        .iter()
        .zip(missing)
        .filter(|(_, missing)| *missing)
        .map(|(candidate, _)| missing_image_diagnostic(document, candidate))
        .collect()
}

/// Existence check that never fails: an I/O error counts as missing so the
/// author still hears about the reference.
async fn is_missing(fs: &dyn FileSystem, path: PathBuf) -> bool {
    match fs.exists(&path).await {
        Ok(exists) => {
            debug!(path = %path.display(), exists, "resolved image reference");
            !exists
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "could not check image file, reporting it as missing"
            );
            true
        }
    }
}

fn missing_image_diagnostic(document: &Document, candidate: &CandidateReference<'_>) -> Diagnostic {
    match candidate.locate(document.text()) {
        Some(start) => Diagnostic::missing_image(document, start, candidate.path),
        None => Diagnostic::error(
            Range::point(document.position_at(candidate.element_offset)),
            missing_image_message(candidate.path),
            DiagnosticSource::ImagePath,
        ),
    }
}
