//! Spans, content hashes and applied text edits.
//!
//! Every edit performed on a compilation unit is a [`TextEdit`]: a byte span of the
//! previous content and the text that replaced it. The editor keeps its tree in sync
//! with the text by shifting node spans according to each applied edit.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Hash type for content verification (SHA-256, stored as hex string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        ContentHash(hex::encode(result))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Span
// ============================================================================

/// Byte offsets into source content.
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span. An inverted range collapses to an empty span at `start`.
    pub fn new(start: usize, end: usize) -> Self {
        Span {
            start,
            end: end.max(start),
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Two spans overlap if they share any byte positions.
    /// Adjacent spans do NOT overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if this span contains another span entirely.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Check if `offset` lies inside `[start, end)`.
    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// The same span moved by `base` bytes.
    pub fn offset_by(&self, base: usize) -> Span {
        Span {
            start: self.start + base,
            end: self.end + base,
        }
    }

    /// Adjust this span for an edit that replaced `removed` bytes at `pos` with
    /// `inserted` bytes.
    ///
    /// Spans after the edit shift, spans enclosing the edit grow or shrink. For a pure
    /// insertion, a span starting exactly at `pos` shifts and a span strictly around
    /// `pos` grows. Spans partially covered by a removal are clamped to the edit.
    pub fn adjust(&mut self, pos: usize, removed: usize, inserted: usize) {
        let edit_end = pos + removed;
        let shift = |offset: usize| offset + inserted - removed;
        if removed == 0 {
            if self.start >= pos {
                self.start += inserted;
                self.end += inserted;
            } else if self.end > pos {
                self.end += inserted;
            }
            return;
        }
        if self.start >= edit_end {
            self.start = shift(self.start);
            self.end = shift(self.end);
        } else if self.start <= pos && self.end >= edit_end {
            self.end = shift(self.end);
        } else if self.start >= pos {
            // starts inside the replaced region
            self.start = pos;
            self.end = if self.end >= edit_end {
                shift(self.end)
            } else {
                pos + inserted.min(self.end - pos)
            };
        } else if self.end > pos {
            // ends inside the replaced region
            self.end = pos + inserted.min(self.end - pos);
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// ============================================================================
// Text edits
// ============================================================================

/// Errors from applying a [`TextEdit`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpanError {
    #[error("span {span} is out of bounds for content of length {len}")]
    OutOfBounds { span: Span, len: usize },

    #[error("span {span} does not fall on character boundaries")]
    NotCharBoundary { span: Span },
}

/// A single applied replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    /// Replaced range in the content before the edit.
    pub span: Span,
    /// Text that was in `span` before the edit.
    pub old_text: String,
    /// Text now occupying the range.
    pub new_text: String,
}

impl TextEdit {
    /// Apply a replacement to `content`, returning the recorded edit.
    pub fn apply(content: &mut String, span: Span, new_text: &str) -> Result<TextEdit, SpanError> {
        if span.end > content.len() {
            return Err(SpanError::OutOfBounds {
                span,
                len: content.len(),
            });
        }
        if !content.is_char_boundary(span.start) || !content.is_char_boundary(span.end) {
            return Err(SpanError::NotCharBoundary { span });
        }
        let old_text = content[span.start..span.end].to_string();
        content.replace_range(span.start..span.end, new_text);
        Ok(TextEdit {
            span,
            old_text,
            new_text: new_text.to_string(),
        })
    }

    /// Net change in content length.
    pub fn delta(&self) -> isize {
        self.new_text.len() as isize - self.old_text.len() as isize
    }
}

// ============================================================================
// Tests
// ============================================================================
