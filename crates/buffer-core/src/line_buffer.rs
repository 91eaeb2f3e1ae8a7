//! Contiguous-string buffer representation.
//!
//! [`LineArrayBuffer`] keeps the whole document in one `String` plus a line-start table
//! rebuilt after every edit batch. Queries are simple and cache-friendly; edits are
//! `O(document)` because the tail of the string shifts and the table is rescanned. It
//! exists as the comparison baseline for the benchmark harness and as an oracle in
//! consistency tests; both representations implement [`TextBuffer`] and must agree on
//! every observable behavior.

use crate::buffer::{BufferError, EndOfLine, Position, TextBuffer};
use crate::builder::ChunkBuilder;
use crate::edits::{self, AppliedEdits, EditOperation};
use crate::events::{BufferChanged, ChangeCallback, ChangeDispatcher};
use crate::line_starts::LineStarts;
use crate::snapshot::{Snapshot, SnapshotChunk};

/// A text buffer backed by one contiguous string.
#[derive(Debug)]
pub struct LineArrayBuffer {
    text: String,
    line_starts: LineStarts,
    char_count: usize,
    version: u64,
    eol: EndOfLine,
    dispatcher: ChangeDispatcher,
}

impl LineArrayBuffer {
    /// Build a buffer directly from a string (single-chunk ingestion).
    pub fn from_text(text: &str) -> Self {
        let mut builder = ChunkBuilder::new();
        builder.accept_chunk(text);
        builder.finish().build_line_array()
    }

    pub(crate) fn from_parts(text: String, eol: EndOfLine) -> Self {
        let line_starts = LineStarts::scan(&text);
        let char_count = text.chars().count();
        Self {
            text,
            line_starts,
            char_count,
            version: 0,
            eol,
            dispatcher: ChangeDispatcher::new(),
        }
    }

    /// Byte offset of character `offset`.
    fn char_to_byte(&self, offset: usize) -> usize {
        if self.text.len() == self.char_count {
            return offset;
        }
        self.text
            .char_indices()
            .nth(offset)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    /// Character offset of byte offset `byte` (which must be a char boundary).
    fn byte_to_char(&self, byte: usize) -> usize {
        if self.text.len() == self.char_count {
            return byte;
        }
        self.text[..byte].chars().count()
    }

    /// Byte range of 1-based `line`'s content, terminator excluded.
    fn line_content_bytes(&self, line: usize) -> (usize, usize) {
        let start = self.line_starts.line_start(line - 1).unwrap_or(0);
        let mut end = self
            .line_starts
            .line_start(line)
            .unwrap_or(self.text.len());
        let slice = &self.text.as_bytes()[start..end];
        if slice.ends_with(b"\r\n") {
            end -= 2;
        } else if slice.ends_with(b"\n") {
            end -= 1;
        }
        (start, end)
    }

    fn check_line(&self, line: usize) -> Result<(), BufferError> {
        if line < 1 || line > self.line_count() {
            return Err(BufferError::LineOutOfRange {
                line,
                line_count: self.line_count(),
            });
        }
        Ok(())
    }
}

impl TextBuffer for LineArrayBuffer {
    fn line_count(&self) -> usize {
        self.line_starts.newline_count() + 1
    }

    fn char_count(&self) -> usize {
        self.char_count
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn end_of_line(&self) -> EndOfLine {
        self.eol
    }

    fn line_content(&self, line: usize) -> Result<String, BufferError> {
        self.check_line(line)?;
        let (start, end) = self.line_content_bytes(line);
        Ok(self.text[start..end].to_string())
    }

    fn offset_at(&self, position: Position) -> Result<usize, BufferError> {
        self.check_line(position.line)?;
        let (start, end) = self.line_content_bytes(position.line);
        let line_length = self.text[start..end].chars().count();
        if position.column < 1 || position.column > line_length + 1 {
            return Err(BufferError::ColumnOutOfRange {
                line: position.line,
                column: position.column,
                line_length,
            });
        }
        Ok(self.byte_to_char(start) + position.column - 1)
    }

    fn position_at(&self, offset: usize) -> Result<Position, BufferError> {
        if offset > self.char_count {
            return Err(BufferError::OffsetOutOfRange {
                offset,
                char_count: self.char_count,
            });
        }
        let byte = self.char_to_byte(offset);
        let bytes = self.text.as_bytes();
        if byte > 0 && byte < bytes.len() && bytes[byte] == b'\n' && bytes[byte - 1] == b'\r' {
            return Err(BufferError::OffsetInsideLineBreak { offset });
        }
        let line_index = self.line_starts.line_of_offset(byte);
        let line_start = self.line_starts.line_start(line_index).unwrap_or(0);
        Ok(Position::new(
            line_index + 1,
            offset - self.byte_to_char(line_start) + 1,
        ))
    }

    fn chars_in_range(&self, start: usize, end: usize) -> Result<String, BufferError> {
        if start > end {
            return Err(BufferError::InvertedRange { start, end });
        }
        if end > self.char_count {
            return Err(BufferError::OffsetOutOfRange {
                offset: end,
                char_count: self.char_count,
            });
        }
        let from = self.char_to_byte(start);
        let to = self.char_to_byte(end);
        Ok(self.text[from..to].to_string())
    }

    fn apply_edits(
        &mut self,
        edits: &[EditOperation],
        compute_reverse: bool,
    ) -> Result<AppliedEdits, BufferError> {
        let resolved = edits::resolve_batch(self, edits)?;

        let deleted = if compute_reverse {
            let mut texts = Vec::with_capacity(resolved.len());
            for edit in &resolved {
                texts.push(self.chars_in_range(edit.start, edit.end)?);
            }
            Some(texts)
        } else {
            None
        };

        // Highest offset first, so earlier byte positions stay valid.
        for edit in resolved.iter().rev() {
            let from = self.char_to_byte(edit.start);
            let to = self.char_to_byte(edit.end);
            self.text.replace_range(from..to, &edit.text);
            self.char_count = self.char_count - (edit.end - edit.start) + edit.text_chars;
        }
        self.line_starts = LineStarts::scan(&self.text);

        self.version += 1;
        let changes = edits::change_spans(&resolved);
        let reverse = deleted.map(|texts| edits::reverse_edits(&resolved, texts));
        self.dispatcher.emit(&BufferChanged {
            version: self.version,
            changes: changes.clone(),
        });

        Ok(AppliedEdits {
            version: self.version,
            changes,
            reverse,
        })
    }

    fn create_snapshot(&self) -> Snapshot {
        // Everything is mutable backing storage here, so a snapshot is a full copy.
        Snapshot::from_chunks(vec![SnapshotChunk::Owned(self.text.clone())], self.version)
    }

    fn get_text(&self) -> String {
        self.text.clone()
    }

    fn subscribe(&mut self, callback: ChangeCallback) {
        self.dispatcher.subscribe(callback);
    }
}
