//! Edit batches.
//!
//! An [`EditOperation`] is ephemeral: constructed by the caller, applied exactly once as
//! part of a batch, then discarded. All edits in a batch are expressed in coordinates of
//! the buffer **before** any edit in the batch is applied; the engine orders them
//! internally (descending by offset) so that applying one edit never invalidates the
//! ranges of the others. A batch with overlapping ranges is a caller error and is
//! rejected atomically.
//!
//! When requested, the engine also returns a batch of inverse edits, expressed in
//! post-batch coordinates and ascending, that exactly undoes the batch when handed back
//! to [`crate::TextBuffer::apply_edits`] unchanged.

use crate::buffer::{BufferError, Position, Range, TextBuffer};

/// The range addressed by an edit, in either coordinate system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditSpan {
    /// A character-offset range `[start, end)`.
    ///
    /// Offset spans may deliberately split a CRLF pair (e.g. when converting line
    /// endings); position spans cannot address the interior of a terminator.
    Chars {
        /// Start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
    },
    /// A position range.
    Positions(Range),
}

/// A single text mutation: a range and its replacement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOperation {
    /// The range to replace.
    pub span: EditSpan,
    /// Replacement text (empty for pure deletion).
    pub text: String,
}

impl EditOperation {
    /// Replace a position range with `text`.
    pub fn replace(range: Range, text: impl Into<String>) -> Self {
        Self {
            span: EditSpan::Positions(range),
            text: text.into(),
        }
    }

    /// Insert `text` at a position.
    pub fn insert(position: Position, text: impl Into<String>) -> Self {
        Self::replace(Range::at(position), text)
    }

    /// Delete a position range.
    pub fn delete(range: Range) -> Self {
        Self::replace(range, "")
    }

    /// Replace the character range `[start, end)` with `text`.
    pub fn replace_chars(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            span: EditSpan::Chars { start, end },
            text: text.into(),
        }
    }

    /// Insert `text` at a character offset.
    pub fn insert_at(offset: usize, text: impl Into<String>) -> Self {
        Self::replace_chars(offset, offset, text)
    }

    /// Delete the character range `[start, end)`.
    pub fn delete_chars(start: usize, end: usize) -> Self {
        Self::replace_chars(start, end, "")
    }
}

/// One edited span, in pre-batch character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSpan {
    /// Start character offset (pre-batch).
    pub start: usize,
    /// Number of characters removed.
    pub deleted_chars: usize,
    /// Number of characters inserted.
    pub inserted_chars: usize,
}

/// Result of a successful [`crate::TextBuffer::apply_edits`] call.
#[derive(Debug)]
pub struct AppliedEdits {
    /// Document version after the batch.
    pub version: u64,
    /// Edited spans in pre-batch coordinates, ascending.
    pub changes: Vec<ChangeSpan>,
    /// Inverse edits (post-batch coordinates, ascending), when requested.
    pub reverse: Option<Vec<EditOperation>>,
}

/// An edit resolved to validated character offsets.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedEdit {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub text_chars: usize,
}

/// Resolve, sort, and validate a batch against the current buffer state.
///
/// Returns edits in ascending offset order. Equal-offset inserts keep their input order,
/// so batch application is deterministic.
pub(crate) fn resolve_batch(
    buffer: &dyn TextBuffer,
    edits: &[EditOperation],
) -> Result<Vec<ResolvedEdit>, BufferError> {
    let char_count = buffer.char_count();
    let mut resolved = Vec::with_capacity(edits.len());

    for edit in edits {
        let (start, end) = match &edit.span {
            EditSpan::Chars { start, end } => {
                if *start > *end {
                    return Err(BufferError::InvertedRange {
                        start: *start,
                        end: *end,
                    });
                }
                if *end > char_count {
                    return Err(BufferError::OffsetOutOfRange {
                        offset: *end,
                        char_count,
                    });
                }
                (*start, *end)
            }
            EditSpan::Positions(range) => {
                let start = buffer.offset_at(range.start)?;
                let end = buffer.offset_at(range.end)?;
                if start > end {
                    return Err(BufferError::InvertedRange { start, end });
                }
                (start, end)
            }
        };
        resolved.push(ResolvedEdit {
            start,
            end,
            text: edit.text.clone(),
            text_chars: edit.text.chars().count(),
        });
    }

    // Tie-break by end so an empty range sorts before a non-empty range at the same
    // offset; otherwise the overlap check below would depend on input order.
    resolved.sort_by_key(|e| (e.start, e.end));

    for pair in resolved.windows(2) {
        if pair[0].end > pair[1].start {
            return Err(BufferError::OverlappingEdits {
                earlier_end: pair[0].end,
                later_start: pair[1].start,
            });
        }
    }

    Ok(resolved)
}

/// Edited spans in pre-batch coordinates for change notification.
pub(crate) fn change_spans(resolved: &[ResolvedEdit]) -> Vec<ChangeSpan> {
    resolved
        .iter()
        .map(|e| ChangeSpan {
            start: e.start,
            deleted_chars: e.end - e.start,
            inserted_chars: e.text_chars,
        })
        .collect()
}

/// Build the inverse batch from resolved edits and the texts they deleted.
///
/// `deleted` holds the pre-application content of each resolved range, in the same
/// (ascending) order. The returned edits are in post-batch coordinates.
pub(crate) fn reverse_edits(
    resolved: &[ResolvedEdit],
    deleted: Vec<String>,
) -> Vec<EditOperation> {
    debug_assert_eq!(resolved.len(), deleted.len());
    let mut reverse = Vec::with_capacity(resolved.len());
    let mut inserted_before = 0usize;
    let mut deleted_before = 0usize;

    for (edit, removed) in resolved.iter().zip(deleted) {
        let new_start = edit.start + inserted_before - deleted_before;
        reverse.push(EditOperation::replace_chars(
            new_start,
            new_start + edit.text_chars,
            removed,
        ));
        inserted_before += edit.text_chars;
        deleted_before += edit.end - edit.start;
    }

    reverse
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(start: usize, end: usize, text: &str) -> ResolvedEdit {
        ResolvedEdit {
            start,
            end,
            text: text.to_string(),
            text_chars: text.chars().count(),
        }
    }

    #[test]
    fn test_reverse_edits_offsets() {
        // "abcdef": replace [1,3) with "XYZ", delete [4,5).
        let batch = vec![resolved(1, 3, "XYZ"), resolved(4, 5, "")];
        let deleted = vec!["bc".to_string(), "e".to_string()];

        let reverse = reverse_edits(&batch, deleted);

        // Post-batch text is "aXYZdf": the first inverse covers [1,4), the second is an
        // insertion at 5.
        assert_eq!(reverse[0], EditOperation::replace_chars(1, 4, "bc"));
        assert_eq!(reverse[1], EditOperation::replace_chars(5, 5, "e"));
    }

    #[test]
    fn test_change_spans() {
        let batch = vec![resolved(2, 5, "x")];
        let spans = change_spans(&batch);
        assert_eq!(
            spans,
            vec![ChangeSpan {
                start: 2,
                deleted_chars: 3,
                inserted_chars: 1
            }]
        );
    }
}
