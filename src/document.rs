//! Document snapshots and text position mapping.
//!
//! A [`Document`] is an immutable view of one content file for a single
//! validation pass. Offsets inside the engine are UTF-8 byte offsets into
//! [`Document::text`]; [`LineIndex`] converts them to zero-based line and
//! column positions, with columns counted in UTF-16 code units to match
//! editor protocols.

use std::path::{Path, PathBuf};

use crate::diagnostics::Position;
use crate::error::{Error, Result};

/// Line start table for converting between byte offsets and positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset of the first character of every line.
    line_starts: Vec<usize>,
    /// Total length of the indexed text in bytes.
    len: usize,
}

impl LineIndex {
    /// Build the index for `text`.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );

        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Number of lines in the text. An empty text has one (empty) line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset into a position.
    ///
    /// Offsets past the end are clamped to the end of the text, and offsets
    /// that fall inside a multi-byte character are moved back to its start.
    pub fn position_at(&self, text: &str, offset: usize) -> Position {
        let mut offset = offset.min(self.len);
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }

        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line];
        let column = text[line_start..offset].encode_utf16().count();

        Position::new(line as u32, column as u32)
    }

    /// Convert a position back into a byte offset.
    ///
    /// Lines past the end map to the end of the text; columns past the end
    /// of a line map to the end of that line.
    pub fn offset_at(&self, text: &str, position: Position) -> usize {
        let line = position.line as usize;
        let Some(&line_start) = self.line_starts.get(line) else {
            return self.len;
        };
        let line_end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.len);

        let mut units = 0usize;
        for (idx, ch) in text[line_start..line_end].char_indices() {
            if units >= position.column as usize {
                return line_start + idx;
            }
            units += ch.len_utf16();
        }
        line_end
    }
}

/// An immutable snapshot of a content document for one validation pass.
#[derive(Debug, Clone)]
pub struct Document {
    location: PathBuf,
    base_dir: PathBuf,
    text: String,
    index: LineIndex,
}

impl Document {
    /// Create a document for the file at `location` with the given contents.
    ///
    /// Fails with [`Error::InvalidLocation`] when the location has no parent
    /// directory; image references cannot be resolved without one.
    pub fn new(location: impl Into<PathBuf>, text: impl Into<String>) -> Result<Self> {
        let location = location.into();
        let base_dir = location
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::InvalidLocation {
                path: location.clone(),
            })?;
        let text = text.into();
        let index = LineIndex::new(&text);

        Ok(Self {
            location,
            base_dir,
            text,
            index,
        })
    }

    /// Read a document from disk.
    pub async fn load(location: impl Into<PathBuf>) -> Result<Self> {
        let location = location.into();
        let text = tokio::fs::read_to_string(&location).await?;
        Self::new(location, text)
    }

    /// The logical location of the document.
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Directory that relative media references are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Full text of the document.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.index
    }

    /// Convert a byte offset in [`Document::text`] into a position.
    pub fn position_at(&self, offset: usize) -> Position {
        self.index.position_at(&self.text, offset)
    }

    /// Convert a position into a byte offset in [`Document::text`].
    pub fn offset_at(&self, position: Position) -> usize {
        self.index.offset_at(&self.text, position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_single_line() {
        let text = "<document/>";
        let index = LineIndex::new(text);

        assert_eq!(index.line_count(), 1);
        assert_eq!(index.position_at(text, 0), Position::new(0, 0));
        assert_eq!(index.position_at(text, 5), Position::new(0, 5));
        assert_eq!(index.position_at(text, text.len()), Position::new(0, 11));
    }

    #[test]
    fn test_line_index_multiple_lines() {
        let text = "<document>\n  <content>\n  </content>\n</document>";
        let index = LineIndex::new(text);

        assert_eq!(index.line_count(), 4);
        // First character after the first newline
        assert_eq!(index.position_at(text, 11), Position::new(1, 0));
        assert_eq!(index.position_at(text, 13), Position::new(1, 2));
        // The newline itself belongs to the line it terminates
        assert_eq!(index.position_at(text, 10), Position::new(0, 10));
    }

    #[test]
    fn test_line_index_clamps_past_end() {
        let text = "ab\ncd";
        let index = LineIndex::new(text);

        assert_eq!(index.position_at(text, 100), Position::new(1, 2));
        assert_eq!(index.offset_at(text, Position::new(9, 0)), text.len());
        assert_eq!(index.offset_at(text, Position::new(0, 40)), 2);
    }

    #[test]
    fn test_line_index_utf16_columns() {
        // 'é' is two UTF-8 bytes and one UTF-16 unit, '😀' is four bytes and two units
        let text = "é😀x";
        let index = LineIndex::new(text);

        let x_offset = text.find('x').unwrap();
        assert_eq!(x_offset, 6);
        assert_eq!(index.position_at(text, x_offset), Position::new(0, 3));
        assert_eq!(index.offset_at(text, Position::new(0, 3)), x_offset);

        // An offset inside a multi-byte character snaps back to its start
        assert_eq!(index.position_at(text, 1), Position::new(0, 0));
    }

    #[test]
    fn test_offset_position_round_trip() {
        let text = "<document>\n<image src=\"a.png\"/>\n</document>\n";
        let index = LineIndex::new(text);

        for (offset, _) in text.char_indices() {
            let position = index.position_at(text, offset);
            assert_eq!(index.offset_at(text, position), offset);
        }
    }

    #[test]
    fn test_document_base_dir() {
        let document = Document::new("/content/modules/m1/index.cnxml", "<document/>").unwrap();

        assert_eq!(document.base_dir(), Path::new("/content/modules/m1"));
        assert_eq!(
            document.location(),
            Path::new("/content/modules/m1/index.cnxml")
        );
        assert_eq!(document.text(), "<document/>");
    }

    #[test]
    fn test_document_without_parent_is_rejected() {
        let result = Document::new("/", "<document/>");

        assert!(matches!(result, Err(Error::InvalidLocation { .. })));
    }

    #[tokio::test]
    async fn test_document_load() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("index.cnxml");
        tokio::fs::write(&path, "<document>\n</document>")
            .await
            .unwrap();

        let document = Document::load(&path).await.unwrap();

        assert_eq!(document.base_dir(), temp_dir.path());
        assert_eq!(document.line_index().line_count(), 2);
    }

    #[tokio::test]
    async fn test_document_load_missing_file() {
        let result = Document::load("/nonexistent/module/index.cnxml").await;

        assert!(matches!(result, Err(Error::Io(_))));
    }
}
