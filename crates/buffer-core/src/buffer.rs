//! The text buffer contract.
//!
//! Defines the coordinate types, the edit/batch types, the error taxonomy, and the
//! [`TextBuffer`] trait shared by the two buffer representations
//! ([`crate::PieceTreeBuffer`] and [`crate::LineArrayBuffer`]). Keeping both behind one
//! trait is what lets the benchmark harness compare them under identical workloads.
//!
//! # Coordinates
//!
//! - **Offsets** count Unicode scalar values (`char`s) from the start of the document.
//! - **Positions** are 1-based: line 1 is the first line, and column 1 is *before* the
//!   first character of the line (columns count the gaps between characters).
//! - An empty document has line count 1, and position (1, 1) is offset 0.
//! - The end-of-document position (after the last character) is valid.
//!
//! # Line-splitting policy
//!
//! Lines are split only on `'\n'`. A lone `'\r'` not followed by `'\n'` is an ordinary
//! character. [`TextBuffer::line_content`] excludes the terminator (`"\n"` or `"\r\n"`).
//! Text is stored verbatim: CRLF is never normalized away; the preferred EOL for saving
//! is metadata ([`EndOfLine`]).

use crate::edits::{AppliedEdits, EditOperation};
use crate::events::ChangeCallback;
use crate::snapshot::Snapshot;
use std::cmp::Ordering;
use thiserror::Error;

/// Position coordinates (1-based line and column numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column; column 1 is before the first character of the line.
    pub column: usize,
}

impl Position {
    /// Create a new position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// The first position of any document.
    pub fn document_start() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A half-open position range `[start, end)` in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    /// Inclusive start position.
    pub start: Position,
    /// Exclusive end position.
    pub end: Position,
}

impl Range {
    /// Create a range from two positions.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// An empty range at a single position.
    pub fn at(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Returns `true` if start and end coincide.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// The preferred newline sequence used when saving a document.
///
/// Detected at load time by majority vote between CRLF and bare LF; stored as metadata
/// rather than applied to the text, which stays verbatim in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfLine {
    /// Unix-style LF (`'\n'`).
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
}

impl EndOfLine {
    /// The literal terminator sequence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }

    /// Re-terminate `text` with this line ending.
    ///
    /// Existing CRLF sequences are recognized first so a CRLF document converted to CRLF
    /// round-trips unchanged.
    pub fn apply_to_text(self, text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        match self {
            Self::Lf => normalized,
            Self::Crlf => normalized.replace('\n', "\r\n"),
        }
    }
}

/// Errors surfaced by buffer operations.
///
/// Two classes: *out-of-range* coordinates (never silently clamped; clamping would hide
/// caller bugs and corrupt downstream coordinate math) and *invalid edits* (batches that
/// are rejected atomically, leaving content and version untouched).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BufferError {
    /// Line number outside `[1, line_count]`.
    #[error("line {line} out of range (document has {line_count} lines)")]
    LineOutOfRange {
        /// The offending 1-based line number.
        line: usize,
        /// Current document line count.
        line_count: usize,
    },

    /// Column outside `[1, line_length + 1]` for the given line.
    #[error("column {column} out of range on line {line} (line has {line_length} characters)")]
    ColumnOutOfRange {
        /// The line being addressed.
        line: usize,
        /// The offending 1-based column.
        column: usize,
        /// Length of the line content in characters.
        line_length: usize,
    },

    /// Character offset outside `[0, char_count]`.
    #[error("offset {offset} out of range (document has {char_count} characters)")]
    OffsetOutOfRange {
        /// The offending character offset.
        offset: usize,
        /// Current document length in characters.
        char_count: usize,
    },

    /// Character offset pointing between the `'\r'` and `'\n'` of a CRLF sequence.
    ///
    /// Such an offset corresponds to no position, so it is rejected rather than snapped
    /// to the nearest line boundary.
    #[error("offset {offset} points inside a CRLF line break")]
    OffsetInsideLineBreak {
        /// The offending character offset.
        offset: usize,
    },

    /// An edit range whose start lies after its end.
    #[error("edit range is inverted (start {start} > end {end})")]
    InvertedRange {
        /// Resolved start character offset.
        start: usize,
        /// Resolved end character offset.
        end: usize,
    },

    /// Two edits in one batch cover overlapping ranges.
    #[error("edit ranges overlap (one ends at {earlier_end}, the next starts at {later_start})")]
    OverlappingEdits {
        /// End offset of the earlier edit (in pre-batch coordinates).
        earlier_end: usize,
        /// Start offset of the later edit.
        later_start: usize,
    },
}

impl BufferError {
    /// Returns `true` for the out-of-range class of errors.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            Self::LineOutOfRange { .. }
                | Self::ColumnOutOfRange { .. }
                | Self::OffsetOutOfRange { .. }
                | Self::OffsetInsideLineBreak { .. }
        )
    }

    /// Returns `true` for the invalid-edit class of errors.
    pub fn is_invalid_edit(&self) -> bool {
        matches!(
            self,
            Self::InvertedRange { .. } | Self::OverlappingEdits { .. }
        )
    }
}

/// The mutable text buffer contract.
///
/// All methods assume single-threaded, caller-serialized access (the editor's model
/// thread). Long-running consumers must use [`TextBuffer::create_snapshot`] instead of
/// holding query results across suspension points.
pub trait TextBuffer {
    /// Total number of lines. At least 1, even for an empty document.
    fn line_count(&self) -> usize;

    /// Total document length in characters.
    fn char_count(&self) -> usize;

    /// Monotonically increasing version, bumped exactly once per successful
    /// [`TextBuffer::apply_edits`] call. Queries never bump it.
    fn version(&self) -> u64;

    /// Preferred line ending detected at load time.
    fn end_of_line(&self) -> EndOfLine;

    /// Content of 1-based line `line`, excluding its line terminator.
    fn line_content(&self, line: usize) -> Result<String, BufferError>;

    /// Length of 1-based line `line` in characters, excluding its terminator.
    fn line_length(&self, line: usize) -> Result<usize, BufferError> {
        Ok(self.line_content(line)?.chars().count())
    }

    /// Character offset of a position. Exact inverse of [`TextBuffer::position_at`]
    /// for all valid inputs, including line boundaries.
    fn offset_at(&self, position: Position) -> Result<usize, BufferError>;

    /// Position of a character offset. Offsets inside a CRLF pair are rejected with
    /// [`BufferError::OffsetInsideLineBreak`].
    fn position_at(&self, offset: usize) -> Result<Position, BufferError>;

    /// Text of the character range `[start, end)`.
    fn chars_in_range(&self, start: usize, end: usize) -> Result<String, BufferError>;

    /// Apply a batch of edits expressed in pre-batch coordinates.
    ///
    /// Overlapping ranges are a caller error: the batch is rejected atomically and the
    /// version is unchanged. On success the version increments exactly once, change
    /// subscribers are notified, and (if `compute_reverse` is set) a batch of inverse
    /// edits in post-batch coordinates is returned.
    fn apply_edits(
        &mut self,
        edits: &[EditOperation],
        compute_reverse: bool,
    ) -> Result<AppliedEdits, BufferError>;

    /// Immutable point-in-time view of the content; unaffected by later edits.
    fn create_snapshot(&self) -> Snapshot;

    /// Full document text.
    fn get_text(&self) -> String;

    /// Subscribe to change notifications emitted after each successful edit batch.
    fn subscribe(&mut self, callback: ChangeCallback);

    /// Text of a position range.
    fn range_content(&self, range: Range) -> Result<String, BufferError> {
        let start = self.offset_at(range.start)?;
        let end = self.offset_at(range.end)?;
        self.chars_in_range(start, end)
    }

    /// Returns `true` if the document contains no characters.
    fn is_empty(&self) -> bool {
        self.char_count() == 0
    }

    /// Full document text re-terminated with the preferred line ending.
    fn text_for_saving(&self) -> String {
        self.end_of_line().apply_to_text(&self.get_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(1, 5) < Position::new(2, 1));
        assert!(Position::new(3, 2) < Position::new(3, 4));
        assert_eq!(Position::new(2, 2), Position::new(2, 2));
    }

    #[test]
    fn test_range_empty() {
        assert!(Range::at(Position::new(1, 1)).is_empty());
        assert!(!Range::new(Position::new(1, 1), Position::new(1, 2)).is_empty());
    }

    #[test]
    fn test_end_of_line_apply() {
        assert_eq!(EndOfLine::Crlf.apply_to_text("a\nb\r\nc"), "a\r\nb\r\nc");
        assert_eq!(EndOfLine::Lf.apply_to_text("a\r\nb\nc"), "a\nb\nc");
    }

    #[test]
    fn test_error_classes() {
        assert!(
            BufferError::LineOutOfRange {
                line: 9,
                line_count: 1
            }
            .is_out_of_range()
        );
        assert!(
            BufferError::OverlappingEdits {
                earlier_end: 4,
                later_start: 2
            }
            .is_invalid_edit()
        );
    }
}
