//! Line-start tables.
//!
//! A [`LineStarts`] records the byte offset of every line start in a scanned text: offset 0
//! first, then the offset just after every `'\n'`. The table is the primitive behind all
//! line ↔ offset translation: the builder caches one per ingested chunk, the piece tree
//! keeps one per backing buffer, and the line-array buffer maintains one for the whole
//! document.
//!
//! Line-splitting policy: lines are split **only on LF**. A lone `'\r'` that is not
//! followed by `'\n'` is an ordinary character, not a line terminator. CRLF sequences are
//! handled naturally because the `'\n'` is present; per-EOL statistics are tracked
//! separately in [`EolStats`].

/// Counts of line-terminator styles seen while scanning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EolStats {
    /// Number of `"\r\n"` sequences.
    pub crlf: usize,
    /// Number of `'\n'` characters not preceded by `'\r'`.
    pub lf: usize,
}

impl EolStats {
    /// Merge another set of counts into this one.
    pub fn add(&mut self, other: EolStats) {
        self.crlf += other.crlf;
        self.lf += other.lf;
    }

    /// Total number of line breaks (each CRLF counts once).
    pub fn total(&self) -> usize {
        self.crlf + self.lf
    }

    /// Returns `true` if both CRLF and bare-LF terminators were seen.
    pub fn is_mixed(&self) -> bool {
        self.crlf > 0 && self.lf > 0
    }
}

/// Byte offsets of line starts within one scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStarts {
    /// Sorted offsets; `starts[0] == 0`, every other entry is the offset just after a `'\n'`.
    starts: Vec<usize>,
}

impl LineStarts {
    /// Scan `text` and record every line start.
    pub fn scan(text: &str) -> Self {
        Self::scan_with_stats(text).0
    }

    /// Scan `text`, recording line starts and EOL statistics in a single pass.
    pub fn scan_with_stats(text: &str) -> (Self, EolStats) {
        let mut starts = vec![0];
        let mut stats = EolStats::default();
        let bytes = text.as_bytes();
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
                if i > 0 && bytes[i - 1] == b'\r' {
                    stats.crlf += 1;
                } else {
                    stats.lf += 1;
                }
            }
        }
        (Self { starts }, stats)
    }

    /// Create an empty table (a single line starting at offset 0).
    pub fn empty() -> Self {
        Self { starts: vec![0] }
    }

    /// Append line starts for `text` being appended to the scanned buffer.
    ///
    /// `base` is the byte length of the buffer before the append. The caller is
    /// responsible for CRLF statistics; this only patches the offsets table.
    pub fn extend_for_append(&mut self, base: usize, text: &str) {
        for (i, &b) in text.as_bytes().iter().enumerate() {
            if b == b'\n' {
                self.starts.push(base + i + 1);
            }
        }
    }

    /// Number of `'\n'` characters in the scanned text.
    pub fn newline_count(&self) -> usize {
        self.starts.len() - 1
    }

    /// Number of `'\n'` characters whose byte offset lies in `[start, end)`.
    pub fn newlines_in(&self, start: usize, end: usize) -> usize {
        // A newline at byte p is recorded as a line start at p + 1, so newlines inside
        // [start, end) correspond to recorded offsets inside (start, end].
        self.upper_bound(end) - self.upper_bound(start)
    }

    /// Byte offset just after the `n`-th (1-based) newline in `[start, end)`, if it exists.
    pub fn nth_newline_end_in(&self, start: usize, end: usize, n: usize) -> Option<usize> {
        debug_assert!(n >= 1);
        let idx = self.upper_bound(start) + (n - 1);
        match self.starts.get(idx) {
            Some(&v) if v <= end => Some(v),
            _ => None,
        }
    }

    /// Offset of the start of line `line` (0-based) in the scanned text.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.starts.get(line).copied()
    }

    /// Index of the line (0-based) containing byte offset `offset`.
    ///
    /// An offset exactly at a line start belongs to that line.
    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.upper_bound(offset).saturating_sub(1)
    }

    /// Number of recorded line starts (newline count + 1).
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    /// Always `false`: a table records at least the offset-0 line start.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of recorded offsets `v` with `v <= bound`.
    fn upper_bound(&self, bound: usize) -> usize {
        self.starts.partition_point(|&v| v <= bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_plain_lf() {
        let (starts, stats) = LineStarts::scan_with_stats("ab\ncd\ne");
        assert_eq!(starts.newline_count(), 2);
        assert_eq!(starts.line_start(0), Some(0));
        assert_eq!(starts.line_start(1), Some(3));
        assert_eq!(starts.line_start(2), Some(6));
        assert_eq!(stats, EolStats { crlf: 0, lf: 2 });
    }

    #[test]
    fn test_scan_crlf_and_mixed() {
        let (starts, stats) = LineStarts::scan_with_stats("ab\r\ncd\ne\r\n");
        assert_eq!(starts.newline_count(), 3);
        assert_eq!(stats, EolStats { crlf: 2, lf: 1 });
        assert!(stats.is_mixed());
    }

    #[test]
    fn test_lone_cr_is_not_a_line_break() {
        let (starts, stats) = LineStarts::scan_with_stats("ab\rcd");
        assert_eq!(starts.newline_count(), 0);
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_newlines_in_range() {
        let starts = LineStarts::scan("a\nb\nc\nd");
        // Newlines at bytes 1, 3, 5.
        assert_eq!(starts.newlines_in(0, 7), 3);
        assert_eq!(starts.newlines_in(0, 1), 0);
        assert_eq!(starts.newlines_in(0, 2), 1);
        assert_eq!(starts.newlines_in(2, 5), 1);
        assert_eq!(starts.newlines_in(2, 6), 2);
        assert_eq!(starts.newlines_in(6, 7), 0);
    }

    #[test]
    fn test_nth_newline_end_in() {
        let starts = LineStarts::scan("a\nb\nc\nd");
        assert_eq!(starts.nth_newline_end_in(0, 7, 1), Some(2));
        assert_eq!(starts.nth_newline_end_in(0, 7, 3), Some(6));
        assert_eq!(starts.nth_newline_end_in(0, 7, 4), None);
        assert_eq!(starts.nth_newline_end_in(2, 7, 1), Some(4));
        assert_eq!(starts.nth_newline_end_in(2, 4, 2), None);
    }

    #[test]
    fn test_line_of_offset() {
        let starts = LineStarts::scan("ab\ncd\ne");
        assert_eq!(starts.line_of_offset(0), 0);
        assert_eq!(starts.line_of_offset(2), 0);
        assert_eq!(starts.line_of_offset(3), 1);
        assert_eq!(starts.line_of_offset(5), 1);
        assert_eq!(starts.line_of_offset(6), 2);
        assert_eq!(starts.line_of_offset(7), 2);
    }

    #[test]
    fn test_extend_for_append() {
        let mut starts = LineStarts::scan("ab");
        starts.extend_for_append(2, "\ncd\n");
        assert_eq!(starts.newline_count(), 2);
        assert_eq!(starts.line_start(1), Some(3));
        assert_eq!(starts.line_start(2), Some(6));
    }
}
