//! Piece-table text storage.
//!
//! The primary buffer representation: the document is the in-order concatenation of
//! *pieces*, each referencing a contiguous byte run in one of the backing buffers:
//! frozen original chunks (shared, immutable) or the append-only add buffer. Editing
//! never rewrites stored text: an insert appends to the add buffer and splices a piece,
//! a delete drops or truncates pieces. Deleted text stays in backing storage for the
//! lifetime of the buffer (only the piece referencing it is dropped), so backing storage
//! grows with edit history; [`PieceTreeBuffer::backing_len`] exposes the growth.
//!
//! Pieces live in an arena-allocated red-black tree ordered by document position. Each
//! node caches its subtree totals (bytes, characters, linefeeds), so locating the piece
//! containing a given offset or line is a tree descent, logarithmic in the number of
//! pieces and independent of document size. Each backing buffer caches a line-start table;
//! a piece's linefeed count is two binary searches into that table, never a rescan.
//!
//! Sequential typing hits an append fast path: when an insert lands exactly at the end
//! of the piece that ends at the current add-buffer tail, the piece is extended in place
//! and no tree surgery happens.

use crate::buffer::{BufferError, EndOfLine, Position, TextBuffer};
use crate::builder::{ChunkBuilder, FrozenChunk};
use crate::edits::{self, AppliedEdits, EditOperation};
use crate::events::{BufferChanged, ChangeCallback, ChangeDispatcher};
use crate::line_starts::LineStarts;
use crate::snapshot::{Snapshot, SnapshotChunk};

/// Arena index of a tree node. Index 0 is the shared sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(u32);

const NIL: NodeId = NodeId(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

/// A contiguous run of backing text.
///
/// `buffer` 0 is the add buffer; `buffer` i >= 1 is original chunk i - 1. Offsets and
/// lengths are in bytes; `len_chars` and `lf_count` are cached so tree descents never
/// touch the text.
#[derive(Debug, Clone, Copy)]
struct Piece {
    buffer: u32,
    start: usize,
    len_bytes: usize,
    len_chars: usize,
    lf_count: usize,
}

impl Piece {
    fn is_ascii(&self) -> bool {
        self.len_bytes == self.len_chars
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    parent: NodeId,
    left: NodeId,
    right: NodeId,
    color: Color,
    piece: Piece,
    /// Subtree totals, including this node's own piece.
    sub_bytes: usize,
    sub_chars: usize,
    sub_lfs: usize,
}

const EMPTY_PIECE: Piece = Piece {
    buffer: 0,
    start: 0,
    len_bytes: 0,
    len_chars: 0,
    lf_count: 0,
};

const SENTINEL: Node = Node {
    parent: NIL,
    left: NIL,
    right: NIL,
    color: Color::Black,
    piece: EMPTY_PIECE,
    sub_bytes: 0,
    sub_chars: 0,
    sub_lfs: 0,
};

/// The growable backing buffer for inserted text.
#[derive(Debug)]
struct AddBuffer {
    text: String,
    line_starts: LineStarts,
}

impl AddBuffer {
    fn new() -> Self {
        Self {
            text: String::new(),
            line_starts: LineStarts::empty(),
        }
    }

    /// Append `text`, returning the byte offset it starts at.
    fn append(&mut self, text: &str) -> usize {
        let start = self.text.len();
        self.text.push_str(text);
        self.line_starts.extend_for_append(start, text);
        start
    }
}

/// The piece-tree text buffer.
///
/// See the module docs for the storage design. All operations assume caller-serialized
/// access; the buffer is exclusively owned by one document model.
#[derive(Debug)]
pub struct PieceTreeBuffer {
    add: AddBuffer,
    originals: Vec<FrozenChunk>,
    nodes: Vec<Node>,
    free: Vec<u32>,
    root: NodeId,
    version: u64,
    eol: EndOfLine,
    dispatcher: ChangeDispatcher,
}

impl PieceTreeBuffer {
    /// Build a buffer directly from a string (single-chunk ingestion).
    pub fn from_text(text: &str) -> Self {
        let mut builder = ChunkBuilder::new();
        builder.accept_chunk(text);
        builder.finish().build()
    }

    pub(crate) fn from_parts(chunks: Vec<FrozenChunk>, eol: EndOfLine) -> Self {
        let mut buffer = Self {
            add: AddBuffer::new(),
            originals: Vec::new(),
            nodes: vec![SENTINEL],
            free: Vec::new(),
            root: NIL,
            version: 0,
            eol,
            dispatcher: ChangeDispatcher::new(),
        };

        for chunk in chunks {
            if chunk.text.is_empty() {
                continue;
            }
            let piece = Piece {
                buffer: buffer.originals.len() as u32 + 1,
                start: 0,
                len_bytes: chunk.text.len(),
                len_chars: chunk.text.chars().count(),
                lf_count: chunk.line_starts.newline_count(),
            };
            buffer.originals.push(chunk);
            let rightmost = if buffer.root == NIL {
                NIL
            } else {
                buffer.rightmost(buffer.root)
            };
            buffer.insert_after(rightmost, piece);
        }

        buffer
    }

    /// Number of live pieces.
    pub fn piece_count(&self) -> usize {
        self.nodes.len() - 1 - self.free.len()
    }

    /// Total bytes held in backing storage (original chunks plus the add buffer).
    ///
    /// Grows with edit history; callers worried about long-lived heavily edited
    /// documents can compare this against the live content size.
    pub fn backing_len(&self) -> usize {
        self.add.text.len() + self.originals.iter().map(|c| c.text.len()).sum::<usize>()
    }

    // ---- node plumbing -------------------------------------------------------------

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    fn left(&self, id: NodeId) -> NodeId {
        self.node(id).left
    }

    fn right(&self, id: NodeId) -> NodeId {
        self.node(id).right
    }

    fn parent(&self, id: NodeId) -> NodeId {
        self.node(id).parent
    }

    fn color(&self, id: NodeId) -> Color {
        self.node(id).color
    }

    fn piece(&self, id: NodeId) -> Piece {
        self.node(id).piece
    }

    fn sub_chars_of(&self, id: NodeId) -> usize {
        self.node(id).sub_chars
    }

    fn sub_lfs_of(&self, id: NodeId) -> usize {
        self.node(id).sub_lfs
    }

    fn alloc(&mut self, piece: Piece) -> NodeId {
        let node = Node {
            parent: NIL,
            left: NIL,
            right: NIL,
            color: Color::Red,
            piece,
            sub_bytes: piece.len_bytes,
            sub_chars: piece.len_chars,
            sub_lfs: piece.lf_count,
        };
        if let Some(index) = self.free.pop() {
            self.nodes[index as usize] = node;
            NodeId(index)
        } else {
            self.nodes.push(node);
            NodeId(self.nodes.len() as u32 - 1)
        }
    }

    fn release(&mut self, id: NodeId) {
        self.free.push(id.0);
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while self.left(id) != NIL {
            id = self.left(id);
        }
        id
    }

    fn rightmost(&self, mut id: NodeId) -> NodeId {
        while self.right(id) != NIL {
            id = self.right(id);
        }
        id
    }

    fn successor(&self, id: NodeId) -> Option<NodeId> {
        if self.right(id) != NIL {
            return Some(self.leftmost(self.right(id)));
        }
        let mut node = id;
        let mut up = self.parent(node);
        while up != NIL && node == self.right(up) {
            node = up;
            up = self.parent(up);
        }
        (up != NIL).then_some(up)
    }

    fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        if self.left(id) != NIL {
            return Some(self.rightmost(self.left(id)));
        }
        let mut node = id;
        let mut up = self.parent(node);
        while up != NIL && node == self.left(up) {
            node = up;
            up = self.parent(up);
        }
        (up != NIL).then_some(up)
    }

    /// Recompute one node's subtree totals from its children and piece.
    fn recompute(&mut self, id: NodeId) {
        if id == NIL {
            return;
        }
        let left = self.left(id);
        let right = self.right(id);
        let (lb, lc, ll) = {
            let n = self.node(left);
            (n.sub_bytes, n.sub_chars, n.sub_lfs)
        };
        let (rb, rc, rl) = {
            let n = self.node(right);
            (n.sub_bytes, n.sub_chars, n.sub_lfs)
        };
        let node = self.node_mut(id);
        node.sub_bytes = lb + rb + node.piece.len_bytes;
        node.sub_chars = lc + rc + node.piece.len_chars;
        node.sub_lfs = ll + rl + node.piece.lf_count;
    }

    fn recompute_to_root(&mut self, mut id: NodeId) {
        while id != NIL {
            self.recompute(id);
            id = self.parent(id);
        }
    }

    fn left_rotate(&mut self, x: NodeId) {
        let y = self.right(x);
        let y_left = self.left(y);
        self.node_mut(x).right = y_left;
        if y_left != NIL {
            self.node_mut(y_left).parent = x;
        }
        let x_parent = self.parent(x);
        self.node_mut(y).parent = x_parent;
        if x_parent == NIL {
            self.root = y;
        } else if self.left(x_parent) == x {
            self.node_mut(x_parent).left = y;
        } else {
            self.node_mut(x_parent).right = y;
        }
        self.node_mut(y).left = x;
        self.node_mut(x).parent = y;
        self.recompute(x);
        self.recompute(y);
    }

    fn right_rotate(&mut self, x: NodeId) {
        let y = self.left(x);
        let y_right = self.right(y);
        self.node_mut(x).left = y_right;
        if y_right != NIL {
            self.node_mut(y_right).parent = x;
        }
        let x_parent = self.parent(x);
        self.node_mut(y).parent = x_parent;
        if x_parent == NIL {
            self.root = y;
        } else if self.right(x_parent) == x {
            self.node_mut(x_parent).right = y;
        } else {
            self.node_mut(x_parent).left = y;
        }
        self.node_mut(y).right = x;
        self.node_mut(x).parent = y;
        self.recompute(x);
        self.recompute(y);
    }

    /// Attach a freshly allocated red node under `parent` and rebalance.
    fn attach(&mut self, z: NodeId, parent: NodeId, as_left: bool) {
        self.node_mut(z).parent = parent;
        if parent == NIL {
            self.root = z;
        } else if as_left {
            self.node_mut(parent).left = z;
        } else {
            self.node_mut(parent).right = z;
        }
        self.recompute_to_root(parent);
        self.insert_fixup(z);
    }

    /// Insert `piece` as the in-order successor of `node` (or as the root of an empty
    /// tree when `node` is NIL). Returns the new node.
    fn insert_after(&mut self, node: NodeId, piece: Piece) -> NodeId {
        let z = self.alloc(piece);
        if node == NIL {
            self.attach(z, NIL, false);
        } else if self.right(node) == NIL {
            self.attach(z, node, false);
        } else {
            let succ = self.leftmost(self.right(node));
            self.attach(z, succ, true);
        }
        z
    }

    /// Insert `piece` as the in-order predecessor of `node`. Returns the new node.
    fn insert_before(&mut self, node: NodeId, piece: Piece) -> NodeId {
        let z = self.alloc(piece);
        if self.left(node) == NIL {
            self.attach(z, node, true);
        } else {
            let pred = self.rightmost(self.left(node));
            self.attach(z, pred, false);
        }
        z
    }

    fn insert_fixup(&mut self, mut z: NodeId) {
        while self.color(self.parent(z)) == Color::Red {
            let p = self.parent(z);
            let g = self.parent(p);
            if p == self.left(g) {
                let u = self.right(g);
                if self.color(u) == Color::Red {
                    self.node_mut(p).color = Color::Black;
                    self.node_mut(u).color = Color::Black;
                    self.node_mut(g).color = Color::Red;
                    z = g;
                } else {
                    if z == self.right(p) {
                        z = p;
                        self.left_rotate(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.node_mut(p).color = Color::Black;
                    self.node_mut(g).color = Color::Red;
                    self.right_rotate(g);
                }
            } else {
                let u = self.left(g);
                if self.color(u) == Color::Red {
                    self.node_mut(p).color = Color::Black;
                    self.node_mut(u).color = Color::Black;
                    self.node_mut(g).color = Color::Red;
                    z = g;
                } else {
                    if z == self.left(p) {
                        z = p;
                        self.right_rotate(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.node_mut(p).color = Color::Black;
                    self.node_mut(g).color = Color::Red;
                    self.left_rotate(g);
                }
            }
        }
        let root = self.root;
        self.node_mut(root).color = Color::Black;
    }

    /// Replace the subtree rooted at `u` with the one rooted at `v`.
    ///
    /// Deliberately writes `v`'s parent even when `v` is the sentinel; the delete fixup
    /// relies on that parent link.
    fn transplant(&mut self, u: NodeId, v: NodeId) {
        let up = self.parent(u);
        if up == NIL {
            self.root = v;
        } else if u == self.left(up) {
            self.node_mut(up).left = v;
        } else {
            self.node_mut(up).right = v;
        }
        self.node_mut(v).parent = up;
    }

    fn remove_node(&mut self, z: NodeId) {
        let mut y = z;
        let mut y_color = self.color(y);
        let x: NodeId;

        if self.left(z) == NIL {
            x = self.right(z);
            self.transplant(z, x);
        } else if self.right(z) == NIL {
            x = self.left(z);
            self.transplant(z, x);
        } else {
            y = self.leftmost(self.right(z));
            y_color = self.color(y);
            x = self.right(y);
            if self.parent(y) == z {
                self.node_mut(x).parent = y;
            } else {
                self.transplant(y, x);
                let zr = self.right(z);
                self.node_mut(y).right = zr;
                self.node_mut(zr).parent = y;
            }
            self.transplant(z, y);
            let zl = self.left(z);
            self.node_mut(y).left = zl;
            self.node_mut(zl).parent = y;
            let z_color = self.color(z);
            self.node_mut(y).color = z_color;
        }

        let up = self.parent(x);
        self.recompute_to_root(up);
        if y_color == Color::Black {
            self.delete_fixup(x);
        }
        // Restore the sentinel in case the fixup wrote through it.
        self.nodes[0] = SENTINEL;
        self.release(z);
    }

    fn delete_fixup(&mut self, mut x: NodeId) {
        while x != self.root && self.color(x) == Color::Black {
            let p = self.parent(x);
            if x == self.left(p) {
                let mut w = self.right(p);
                if self.color(w) == Color::Red {
                    self.node_mut(w).color = Color::Black;
                    self.node_mut(p).color = Color::Red;
                    self.left_rotate(p);
                    w = self.right(self.parent(x));
                }
                if self.color(self.left(w)) == Color::Black
                    && self.color(self.right(w)) == Color::Black
                {
                    self.node_mut(w).color = Color::Red;
                    x = self.parent(x);
                } else {
                    if self.color(self.right(w)) == Color::Black {
                        let wl = self.left(w);
                        self.node_mut(wl).color = Color::Black;
                        self.node_mut(w).color = Color::Red;
                        self.right_rotate(w);
                        w = self.right(self.parent(x));
                    }
                    let p = self.parent(x);
                    let p_color = self.color(p);
                    self.node_mut(w).color = p_color;
                    self.node_mut(p).color = Color::Black;
                    let wr = self.right(w);
                    self.node_mut(wr).color = Color::Black;
                    self.left_rotate(p);
                    x = self.root;
                }
            } else {
                let mut w = self.left(p);
                if self.color(w) == Color::Red {
                    self.node_mut(w).color = Color::Black;
                    self.node_mut(p).color = Color::Red;
                    self.right_rotate(p);
                    w = self.left(self.parent(x));
                }
                if self.color(self.right(w)) == Color::Black
                    && self.color(self.left(w)) == Color::Black
                {
                    self.node_mut(w).color = Color::Red;
                    x = self.parent(x);
                } else {
                    if self.color(self.left(w)) == Color::Black {
                        let wr = self.right(w);
                        self.node_mut(wr).color = Color::Black;
                        self.node_mut(w).color = Color::Red;
                        self.left_rotate(w);
                        w = self.left(self.parent(x));
                    }
                    let p = self.parent(x);
                    let p_color = self.color(p);
                    self.node_mut(w).color = p_color;
                    self.node_mut(p).color = Color::Black;
                    let wl = self.left(w);
                    self.node_mut(wl).color = Color::Black;
                    self.right_rotate(p);
                    x = self.root;
                }
            }
        }
        self.node_mut(x).color = Color::Black;
    }

    // ---- piece plumbing ------------------------------------------------------------

    fn piece_str(&self, piece: &Piece) -> &str {
        let range = piece.start..piece.start + piece.len_bytes;
        match piece.buffer {
            0 => &self.add.text[range],
            b => &self.originals[b as usize - 1].text[range],
        }
    }

    fn buffer_line_starts(&self, buffer: u32) -> &LineStarts {
        match buffer {
            0 => &self.add.line_starts,
            b => &self.originals[b as usize - 1].line_starts,
        }
    }

    /// Byte offset within the piece of its `char_off`-th character.
    fn char_to_byte_in_piece(&self, piece: &Piece, char_off: usize) -> usize {
        if char_off >= piece.len_chars {
            return piece.len_bytes;
        }
        if piece.is_ascii() {
            return char_off;
        }
        self.piece_str(piece)
            .char_indices()
            .nth(char_off)
            .map(|(i, _)| i)
            .unwrap_or(piece.len_bytes)
    }

    fn chars_in_piece_prefix(&self, piece: &Piece, prefix_bytes: usize) -> usize {
        if piece.is_ascii() {
            prefix_bytes
        } else {
            self.piece_str(piece)[..prefix_bytes].chars().count()
        }
    }

    fn lf_in_piece_prefix(&self, piece: &Piece, prefix_bytes: usize) -> usize {
        self.buffer_line_starts(piece.buffer)
            .newlines_in(piece.start, piece.start + prefix_bytes)
    }

    /// Split a piece at a character offset strictly inside it.
    fn split_piece(&self, piece: Piece, char_off: usize) -> (Piece, Piece) {
        let prefix_bytes = self.char_to_byte_in_piece(&piece, char_off);
        let prefix_lfs = self.lf_in_piece_prefix(&piece, prefix_bytes);
        let left = Piece {
            buffer: piece.buffer,
            start: piece.start,
            len_bytes: prefix_bytes,
            len_chars: char_off,
            lf_count: prefix_lfs,
        };
        let right = Piece {
            buffer: piece.buffer,
            start: piece.start + prefix_bytes,
            len_bytes: piece.len_bytes - prefix_bytes,
            len_chars: piece.len_chars - char_off,
            lf_count: piece.lf_count - prefix_lfs,
        };
        (left, right)
    }

    // ---- tree descents -------------------------------------------------------------

    /// Node containing character `offset` plus the in-piece character offset.
    ///
    /// Requires `offset < char_count`.
    fn locate_char(&self, mut offset: usize) -> (NodeId, usize) {
        let mut node = self.root;
        while node != NIL {
            let left = self.left(node);
            let left_chars = self.sub_chars_of(left);
            if offset < left_chars {
                node = left;
                continue;
            }
            offset -= left_chars;
            let piece_chars = self.piece(node).len_chars;
            if offset < piece_chars {
                return (node, offset);
            }
            offset -= piece_chars;
            node = self.right(node);
        }
        (NIL, 0)
    }

    /// Number of linefeeds strictly before character `offset`.
    fn lf_before_char(&self, mut offset: usize) -> usize {
        let mut node = self.root;
        let mut lfs = 0;
        while node != NIL {
            let left = self.left(node);
            let left_chars = self.sub_chars_of(left);
            if offset < left_chars {
                node = left;
                continue;
            }
            lfs += self.sub_lfs_of(left);
            offset -= left_chars;
            let piece = self.piece(node);
            if offset < piece.len_chars {
                let prefix_bytes = self.char_to_byte_in_piece(&piece, offset);
                return lfs + self.lf_in_piece_prefix(&piece, prefix_bytes);
            }
            lfs += piece.lf_count;
            offset -= piece.len_chars;
            node = self.right(node);
        }
        lfs
    }

    /// Character offset of the start of 1-based `line`. Requires a valid line number.
    fn offset_of_line_start(&self, line: usize) -> usize {
        if line <= 1 {
            return 0;
        }
        let mut need = line - 1;
        let mut node = self.root;
        let mut chars_before = 0;
        while node != NIL {
            let left = self.left(node);
            if self.sub_lfs_of(left) >= need {
                node = left;
                continue;
            }
            need -= self.sub_lfs_of(left);
            chars_before += self.sub_chars_of(left);
            let piece = self.piece(node);
            if piece.lf_count >= need {
                if let Some(end) = self
                    .buffer_line_starts(piece.buffer)
                    .nth_newline_end_in(piece.start, piece.start + piece.len_bytes, need)
                {
                    let prefix_bytes = end - piece.start;
                    return chars_before + self.chars_in_piece_prefix(&piece, prefix_bytes);
                }
            }
            need -= piece.lf_count;
            chars_before += piece.len_chars;
            node = self.right(node);
        }
        chars_before
    }

    /// Character at `offset`, or `None` at end of document.
    fn char_at(&self, offset: usize) -> Option<char> {
        if offset >= self.char_count() {
            return None;
        }
        let (node, char_off) = self.locate_char(offset);
        if node == NIL {
            return None;
        }
        let piece = self.piece(node);
        let byte = self.char_to_byte_in_piece(&piece, char_off);
        self.piece_str(&piece)[byte..].chars().next()
    }

    /// Content length of 1-based `line` in characters, excluding the terminator.
    fn line_content_len(&self, line: usize) -> usize {
        let start = self.offset_of_line_start(line);
        if line < self.line_count() {
            let next = self.offset_of_line_start(line + 1);
            let raw = next - start;
            // The terminator is "\n" or "\r\n".
            if raw >= 2 && self.char_at(next - 2) == Some('\r') {
                raw - 2
            } else {
                raw - 1
            }
        } else {
            self.char_count() - start
        }
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

    // ---- mutation ------------------------------------------------------------------

    /// Can the piece of `node` be extended in place by text appended at `add_start`?
    fn is_add_tail(&self, node: NodeId, add_start: usize) -> bool {
        let piece = self.piece(node);
        piece.buffer == 0 && piece.start + piece.len_bytes == add_start
    }

    fn extend_piece(&mut self, node: NodeId, len_bytes: usize, len_chars: usize, lfs: usize) {
        let piece = &mut self.node_mut(node).piece;
        piece.len_bytes += len_bytes;
        piece.len_chars += len_chars;
        piece.lf_count += lfs;
        self.recompute_to_root(node);
    }

    fn insert_chars(&mut self, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let len_bytes = text.len();
        let len_chars = text.chars().count();
        let lfs = text.as_bytes().iter().filter(|&&b| b == b'\n').count();
        let add_start = self.add.append(text);
        let piece = Piece {
            buffer: 0,
            start: add_start,
            len_bytes,
            len_chars,
            lf_count: lfs,
        };

        if self.root == NIL {
            self.insert_after(NIL, piece);
            return;
        }

        if offset == self.char_count() {
            let last = self.rightmost(self.root);
            if self.is_add_tail(last, add_start) {
                self.extend_piece(last, len_bytes, len_chars, lfs);
            } else {
                self.insert_after(last, piece);
            }
            return;
        }

        let (node, char_off) = self.locate_char(offset);
        if char_off == 0 {
            match self.predecessor(node) {
                Some(pred) if self.is_add_tail(pred, add_start) => {
                    self.extend_piece(pred, len_bytes, len_chars, lfs);
                }
                _ => {
                    self.insert_before(node, piece);
                }
            }
        } else {
            let (left, right) = self.split_piece(self.piece(node), char_off);
            self.node_mut(node).piece = left;
            self.recompute_to_root(node);
            let mid = self.insert_after(node, piece);
            self.insert_after(mid, right);
        }
    }

    fn delete_chars(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let (first, char_off) = self.locate_char(start);
        let mut remaining = end - start;
        let mut cursor;

        if char_off > 0 {
            let piece = self.piece(first);
            let available = piece.len_chars - char_off;
            if remaining < available {
                // Deletion entirely inside one piece: keep prefix and suffix.
                let (left, rest) = self.split_piece(piece, char_off);
                let (_, right) = self.split_piece(rest, remaining);
                self.node_mut(first).piece = left;
                self.recompute_to_root(first);
                self.insert_after(first, right);
                return;
            }
            let (left, _) = self.split_piece(piece, char_off);
            self.node_mut(first).piece = left;
            self.recompute_to_root(first);
            remaining -= available;
            cursor = self.successor(first);
        } else {
            cursor = Some(first);
        }

        while remaining > 0 {
            let Some(node) = cursor else {
                break;
            };
            let piece = self.piece(node);
            if remaining >= piece.len_chars {
                let next = self.successor(node);
                remaining -= piece.len_chars;
                self.remove_node(node);
                cursor = next;
            } else {
                let (_, right) = self.split_piece(piece, remaining);
                self.node_mut(node).piece = right;
                self.recompute_to_root(node);
                remaining = 0;
            }
        }
    }

    fn replace_chars(&mut self, start: usize, end: usize, text: &str) {
        self.delete_chars(start, end);
        self.insert_chars(start, text);
    }
}

impl TextBuffer for PieceTreeBuffer {
    fn line_count(&self) -> usize {
        self.node(self.root).sub_lfs + 1
    }

    fn char_count(&self) -> usize {
        self.node(self.root).sub_chars
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn end_of_line(&self) -> EndOfLine {
        self.eol
    }

    fn line_content(&self, line: usize) -> Result<String, BufferError> {
        self.check_line(line)?;
        let start = self.offset_of_line_start(line);
        let len = self.line_content_len(line);
        self.chars_in_range(start, start + len)
    }

    fn line_length(&self, line: usize) -> Result<usize, BufferError> {
        self.check_line(line)?;
        Ok(self.line_content_len(line))
    }

    fn offset_at(&self, position: Position) -> Result<usize, BufferError> {
        self.check_line(position.line)?;
        let line_length = self.line_content_len(position.line);
        if position.column < 1 || position.column > line_length + 1 {
            return Err(BufferError::ColumnOutOfRange {
                line: position.line,
                column: position.column,
                line_length,
            });
        }
        Ok(self.offset_of_line_start(position.line) + position.column - 1)
    }

    fn position_at(&self, offset: usize) -> Result<Position, BufferError> {
        if offset > self.char_count() {
            return Err(BufferError::OffsetOutOfRange {
                offset,
                char_count: self.char_count(),
            });
        }
        if offset > 0
            && self.char_at(offset) == Some('\n')
            && self.char_at(offset - 1) == Some('\r')
        {
            return Err(BufferError::OffsetInsideLineBreak { offset });
        }
        let line = self.lf_before_char(offset) + 1;
        let line_start = self.offset_of_line_start(line);
        Ok(Position::new(line, offset - line_start + 1))
    }

    fn chars_in_range(&self, start: usize, end: usize) -> Result<String, BufferError> {
        if start > end {
            return Err(BufferError::InvertedRange { start, end });
        }
        if end > self.char_count() {
            return Err(BufferError::OffsetOutOfRange {
                offset: end,
                char_count: self.char_count(),
            });
        }
        if start == end {
            return Ok(String::new());
        }

        let (node, char_off) = self.locate_char(start);
        let mut out = String::with_capacity(end - start);
        let mut remaining = end - start;
        let mut cursor = Some(node);
        let mut skip = char_off;

        while remaining > 0 {
            let Some(node) = cursor else {
                break;
            };
            let piece = self.piece(node);
            let take = remaining.min(piece.len_chars - skip);
            let from = self.char_to_byte_in_piece(&piece, skip);
            let to = self.char_to_byte_in_piece(&piece, skip + take);
            out.push_str(&self.piece_str(&piece)[from..to]);
            remaining -= take;
            skip = 0;
            cursor = self.successor(node);
        }

        Ok(out)
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

        // Highest offset first: earlier ranges stay valid without re-translation.
        for edit in resolved.iter().rev() {
            self.replace_chars(edit.start, edit.end, &edit.text);
        }

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
        let mut chunks = Vec::with_capacity(self.piece_count());
        let mut cursor = (self.root != NIL).then(|| self.leftmost(self.root));
        while let Some(node) = cursor {
            let piece = self.piece(node);
            let range = piece.start..piece.start + piece.len_bytes;
            chunks.push(match piece.buffer {
                0 => SnapshotChunk::Owned(self.add.text[range].to_string()),
                b => SnapshotChunk::Shared(self.originals[b as usize - 1].text.clone(), range),
            });
            cursor = self.successor(node);
        }
        Snapshot::from_chunks(chunks, self.version)
    }

    fn get_text(&self) -> String {
        let mut out = String::with_capacity(self.node(self.root).sub_bytes);
        let mut cursor = (self.root != NIL).then(|| self.leftmost(self.root));
        while let Some(node) = cursor {
            let piece = self.piece(node);
            out.push_str(self.piece_str(&piece));
            cursor = self.successor(node);
        }
        out
    }

    fn subscribe(&mut self, callback: ChangeCallback) {
        self.dispatcher.subscribe(callback);
    }
}
