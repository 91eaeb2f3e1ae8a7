//! Chunked buffer construction.
//!
//! A [`ChunkBuilder`] ingests raw text in arbitrarily sized chunks (e.g. as read from
//! disk) and produces a [`BufferFactory`]: frozen chunks with cached line-start tables
//! plus load-time metadata (detected line ending, mixed-EOL flag, line count, trailing
//! newline). The factory can then build either buffer representation.
//!
//! A CRLF pair split across two chunks is re-joined before scanning: a chunk-final
//! `'\r'` is held back and prepended to the next chunk, so the pair is never counted as
//! two line breaks or dropped.

use crate::buffer::EndOfLine;
use crate::line_buffer::LineArrayBuffer;
use crate::line_starts::{EolStats, LineStarts};
use crate::piece_tree::PieceTreeBuffer;
use std::sync::Arc;

/// A frozen original chunk: immutable text plus its line-start table.
#[derive(Debug, Clone)]
pub(crate) struct FrozenChunk {
    pub(crate) text: Arc<str>,
    pub(crate) line_starts: LineStarts,
}

/// Load-time metadata describing the ingested text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferMetadata {
    /// Line ending detected by majority vote between CRLF and bare LF (ties go to LF).
    pub end_of_line: EndOfLine,
    /// `true` if both CRLF and bare-LF terminators were seen. Surfaced for the caller to
    /// decide policy (e.g. prompt the user); the buffer itself never resolves it.
    pub mixed_line_endings: bool,
    /// Line count of the ingested text (at least 1).
    pub line_count: usize,
    /// `true` if the text ends with a line break.
    pub ends_with_newline: bool,
}

/// Accumulates text chunks until [`ChunkBuilder::finish`] freezes them.
#[derive(Debug, Default)]
pub struct ChunkBuilder {
    chunks: Vec<FrozenChunk>,
    stats: EolStats,
    pending_cr: bool,
    ends_with_newline: bool,
}

impl ChunkBuilder {
    /// Create a builder with no chunks (finishing immediately yields an empty buffer).
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one chunk of text.
    pub fn accept_chunk(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }

        let mut text = String::with_capacity(chunk.len() + 1);
        if self.pending_cr {
            text.push('\r');
            self.pending_cr = false;
        }
        text.push_str(chunk);

        // Hold back a chunk-final '\r': the next chunk may start with '\n'.
        if text.ends_with('\r') {
            text.pop();
            self.pending_cr = true;
        }

        if text.is_empty() {
            return;
        }

        let (line_starts, stats) = LineStarts::scan_with_stats(&text);
        self.stats.add(stats);
        self.ends_with_newline = text.ends_with('\n');
        self.chunks.push(FrozenChunk {
            text: Arc::from(text.as_str()),
            line_starts,
        });
    }

    /// Freeze the accumulated chunks into a factory.
    pub fn finish(mut self) -> BufferFactory {
        if self.pending_cr {
            // Trailing '\r' at end of input: a lone CR, stored as an ordinary character.
            self.chunks.push(FrozenChunk {
                text: Arc::from("\r"),
                line_starts: LineStarts::scan("\r"),
            });
            self.ends_with_newline = false;
        }

        let end_of_line = if self.stats.crlf > self.stats.lf {
            EndOfLine::Crlf
        } else {
            EndOfLine::Lf
        };
        let metadata = BufferMetadata {
            end_of_line,
            mixed_line_endings: self.stats.is_mixed(),
            line_count: self.stats.total() + 1,
            ends_with_newline: self.ends_with_newline,
        };

        BufferFactory {
            chunks: self.chunks,
            metadata,
        }
    }
}

/// Frozen chunks plus metadata; builds either buffer representation.
#[derive(Debug)]
pub struct BufferFactory {
    chunks: Vec<FrozenChunk>,
    metadata: BufferMetadata,
}

impl BufferFactory {
    /// Load-time metadata for the ingested text.
    pub fn metadata(&self) -> BufferMetadata {
        self.metadata
    }

    /// Build the piece-tree buffer (the primary representation).
    ///
    /// Cheap to call more than once: frozen chunks are shared, not copied.
    pub fn build(&self) -> PieceTreeBuffer {
        PieceTreeBuffer::from_parts(self.chunks.clone(), self.metadata.end_of_line)
    }

    /// Build the line-array buffer (the comparison representation).
    pub fn build_line_array(&self) -> LineArrayBuffer {
        let mut text = String::new();
        for chunk in &self.chunks {
            text.push_str(&chunk.text);
        }
        LineArrayBuffer::from_parts(text, self.metadata.end_of_line)
    }
}
