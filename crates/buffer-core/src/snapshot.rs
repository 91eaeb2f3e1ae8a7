//! Immutable point-in-time snapshots.
//!
//! A [`Snapshot`] lets a long-running consumer (e.g. streaming the document to disk)
//! read the full content in order without blocking further edits: once created, its
//! content is fixed even as the live buffer mutates. Pieces that reference frozen
//! original chunks are shared zero-copy via `Arc`; pieces referencing the growable add
//! buffer are copied at creation time.

use std::ops::Range;
use std::sync::Arc;

/// One contiguous run of snapshot text.
#[derive(Debug, Clone)]
pub(crate) enum SnapshotChunk {
    /// A slice of a frozen original chunk, shared with the live buffer.
    Shared(Arc<str>, Range<usize>),
    /// Text copied out of mutable backing storage at snapshot time.
    Owned(String),
}

impl SnapshotChunk {
    fn as_str(&self) -> &str {
        match self {
            Self::Shared(text, range) => &text[range.clone()],
            Self::Owned(text) => text,
        }
    }
}

/// An immutable, point-in-time view of a buffer's content.
///
/// Consumed by repeatedly calling [`Snapshot::read`] until it returns `None`. A snapshot
/// is read once; taking a fresh snapshot at the same version is cheap.
#[derive(Debug)]
pub struct Snapshot {
    chunks: Vec<SnapshotChunk>,
    cursor: usize,
    version: u64,
}

impl Snapshot {
    pub(crate) fn from_chunks(chunks: Vec<SnapshotChunk>, version: u64) -> Self {
        Self {
            chunks,
            cursor: 0,
            version,
        }
    }

    /// The buffer version this snapshot was taken at.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Next run of text, or `None` once the snapshot is exhausted.
    pub fn read(&mut self) -> Option<&str> {
        while self.cursor < self.chunks.len() {
            let chunk = &self.chunks[self.cursor];
            self.cursor += 1;
            let text = chunk.as_str();
            if !text.is_empty() {
                return Some(text);
            }
        }
        None
    }

    /// Drain the remaining content into a single string.
    pub fn text(mut self) -> String {
        let mut out = String::new();
        while let Some(chunk) = self.read() {
            out.push_str(chunk);
        }
        out
    }
}
