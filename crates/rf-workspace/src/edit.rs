//! Buffered text edits
//!
//! Commands never rewrite text directly. They queue [`TextEdit`]s against
//! the loaded text of a file; the edits are applied together when the
//! pending view of a snapshot is produced.

use std::ops::Range;

use crate::error::EditError;

/// Replace `range` of the loaded text with `text`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range<usize>,
    pub text: String,
}

impl TextEdit {
    /// Replace a byte range
    #[inline]
    #[must_use]
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    /// Insert text at a byte offset
    #[inline]
    #[must_use]
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::replace(offset..offset, text)
    }

    /// Remove a byte range
    #[inline]
    #[must_use]
    pub fn delete(range: Range<usize>) -> Self {
        Self::replace(range, String::new())
    }
}

/// Apply `edits` to `text`
///
/// Edits are ordered by position; insertions at the same offset keep the
/// order they were queued in.
///
/// # Errors
///
/// Returns error if two edits overlap or a range is out of bounds or does
/// not fall on character boundaries.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|e| (e.range.start, e.range.end));

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut previous: Option<&Range<usize>> = None;

    for edit in sorted {
        let range = &edit.range;
        if range.start > range.end || range.end > text.len() {
            return Err(EditError::OutOfBounds {
                range: range.clone(),
                len: text.len(),
            });
        }
        if !text.is_char_boundary(range.start) || !text.is_char_boundary(range.end) {
            return Err(EditError::NotCharBoundary {
                range: range.clone(),
            });
        }
        if let Some(prev) = previous {
            if range.start < prev.end {
                return Err(EditError::Overlap {
                    first: prev.clone(),
                    second: range.clone(),
                });
            }
        }

        out.push_str(&text[cursor..range.start]);
        out.push_str(&edit.text);
        cursor = range.end;
        previous = Some(range);
    }

    out.push_str(&text[cursor..]);
    Ok(out)
}
