#![warn(missing_docs)]
//! Buffer Core - Headless Text Buffer Kernel
//!
//! # Overview
//!
//! `buffer-core` is the document model of a code editor with the editor stripped away:
//! text storage, line/offset coordinates, batched edits with undo material, snapshots,
//! and structural bracket scanning. It performs no rendering, layout, or syntax analysis;
//! hosts build those on top.
//!
//! # Core Features
//!
//! - **Piece-tree storage**: append-only backing buffers, edits splice piece references
//! - **Logarithmic coordinates**: offset ↔ position translation via cached subtree totals
//! - **Batched edits**: atomic validation, one version bump per batch, inverse edits on demand
//! - **Snapshots**: immutable point-in-time reads, zero-copy over frozen chunks
//! - **Bracket scanning**: configurable token sets, filtered by host-side context
//! - **Two representations**: the piece tree and a contiguous-string baseline behind one trait
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  TextBuffer trait (edits, queries, events)  │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Bracket Scanner (regex over lines)         │  ← Structural Queries
//! ├─────────────────────────────────────────────┤
//! │  Snapshots (shared / owned chunks)          │  ← Stable Reads
//! ├─────────────────────────────────────────────┤
//! │  Piece Tree │ Line Array                    │  ← Representations
//! ├─────────────────────────────────────────────┤
//! │  Chunk Builder & Line-Start Tables          │  ← Ingestion
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## Loading and editing
//!
//! ```rust
//! use buffer_core::{ChunkBuilder, EditOperation, Position, TextBuffer};
//!
//! // Ingest text in chunks, e.g. as read from disk.
//! let mut builder = ChunkBuilder::new();
//! builder.accept_chunk("fn main() {\n");
//! builder.accept_chunk("    println!(\"hi\");\n}\n");
//! let factory = builder.finish();
//!
//! let mut buffer = factory.build();
//! assert_eq!(buffer.line_count(), 4);
//!
//! buffer
//!     .apply_edits(
//!         &[EditOperation::insert(Position::new(2, 5), "let x = 1; ")],
//!         false,
//!     )
//!     .unwrap();
//! assert_eq!(buffer.line_content(2).unwrap(), "    let x = 1; println!(\"hi\");");
//! ```
//!
//! ## Undoing a batch
//!
//! ```rust
//! use buffer_core::{EditOperation, PieceTreeBuffer, TextBuffer};
//!
//! let mut buffer = PieceTreeBuffer::from_text("hello world");
//! let applied = buffer
//!     .apply_edits(&[EditOperation::replace_chars(0, 5, "goodbye")], true)
//!     .unwrap();
//! assert_eq!(buffer.get_text(), "goodbye world");
//!
//! // The inverse batch restores the previous content exactly.
//! let reverse = applied.reverse.unwrap();
//! buffer.apply_edits(&reverse, false).unwrap();
//! assert_eq!(buffer.get_text(), "hello world");
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - coordinate types, error taxonomy, the [`TextBuffer`] trait
//! - [`builder`] - chunked ingestion and load-time metadata
//! - [`piece_tree`] - the primary piece-tree representation
//! - [`line_buffer`] - the contiguous-string comparison representation
//! - [`edits`] - edit batches, change spans, inverse edits
//! - [`snapshot`] - immutable point-in-time content views
//! - [`brackets`] - structural bracket scanning
//! - [`events`] - change notification
//! - [`line_starts`] - line-start tables shared by the layers above
//!
//! # Coordinates
//!
//! Offsets count Unicode scalar values; positions are 1-based (line, column) with
//! column 1 sitting before the first character. Lines split only on `'\n'`; a lone
//! `'\r'` is ordinary content and CRLF is stored verbatim. The preferred line ending
//! for saving is metadata, detected at load time, never applied to stored text.

pub mod brackets;
pub mod buffer;
pub mod builder;
pub mod edits;
pub mod events;
pub mod line_buffer;
pub mod line_starts;
pub mod piece_tree;
pub mod snapshot;

pub use brackets::{AllStructural, BracketScanner, FoundBracket, ScanError, TokenFilter};
pub use buffer::{BufferError, EndOfLine, Position, Range, TextBuffer};
pub use builder::{BufferFactory, BufferMetadata, ChunkBuilder};
pub use edits::{AppliedEdits, ChangeSpan, EditOperation, EditSpan};
pub use events::{BufferChanged, ChangeCallback};
pub use line_buffer::LineArrayBuffer;
pub use line_starts::{EolStats, LineStarts};
pub use piece_tree::PieceTreeBuffer;
pub use snapshot::Snapshot;
