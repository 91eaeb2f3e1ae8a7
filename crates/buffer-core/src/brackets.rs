//! Structural bracket scanning.
//!
//! A [`BracketScanner`] finds the nearest configured bracket token before or after a
//! position, scanning line by line through a [`TextBuffer`]. Which tokens count as
//! brackets is pure configuration ([`BracketPairs`], usually taken from a
//! [`buffer_core_lang::LanguageConfiguration`]); the scanner itself is language-blind.
//!
//! Tokens are matched with a single alternation compiled once per scanner, longest token
//! first so that multi-character brackets win over their prefixes (`<<` before `<`).
//! A [`TokenFilter`] lets the host reject matches that are not structural in context
//! (inside string literals or comments, per its syntax information); the scanner keeps
//! looking past rejected matches.

use crate::buffer::{BufferError, Position, Range, TextBuffer};
use buffer_core_lang::BracketPairs;
use regex::Regex;
use thiserror::Error;

/// Errors surfaced by bracket scanning.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The pair set is empty, so no token can ever match.
    #[error("no bracket pairs configured")]
    NoPairs,

    /// The configured tokens could not be compiled into a search pattern.
    #[error("bracket tokens do not form a valid search pattern")]
    InvalidTokenSet(#[from] regex::Error),

    /// The scan position was invalid for the buffer.
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// A bracket token located by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundBracket {
    /// The token's position range (single line; end column is exclusive).
    pub range: Range,
    /// The matched token text.
    pub text: String,
}

/// Contextual accept/reject hook for bracket matches.
///
/// The host implements this with whatever syntax information it has; a match rejected
/// here is skipped and the scan continues.
pub trait TokenFilter {
    /// Returns `true` if the token at `range` counts as a structural bracket.
    fn is_structural(&self, range: &Range, text: &str) -> bool;
}

/// The default filter: every match is structural.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllStructural;

impl TokenFilter for AllStructural {
    fn is_structural(&self, _range: &Range, _text: &str) -> bool {
        true
    }
}

/// Scans a buffer for configured bracket tokens.
pub struct BracketScanner<'a> {
    buffer: &'a dyn TextBuffer,
    filter: &'a dyn TokenFilter,
    pattern: Regex,
}

impl<'a> BracketScanner<'a> {
    /// Create a scanner that treats every configured token as structural.
    pub fn new(buffer: &'a dyn TextBuffer, pairs: &BracketPairs) -> Result<Self, ScanError> {
        Self::with_filter(buffer, pairs, &AllStructural)
    }

    /// Create a scanner with a contextual token filter.
    pub fn with_filter(
        buffer: &'a dyn TextBuffer,
        pairs: &BracketPairs,
        filter: &'a dyn TokenFilter,
    ) -> Result<Self, ScanError> {
        if pairs.is_empty() {
            return Err(ScanError::NoPairs);
        }
        // Longest token first, then lexicographic for a deterministic pattern.
        let mut tokens: Vec<&str> = pairs.tokens().collect();
        tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let pattern = Regex::new(
            &tokens
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|"),
        )?;
        Ok(Self {
            buffer,
            filter,
            pattern,
        })
    }

    /// Find the first structural bracket at or after `position`.
    ///
    /// A bracket counts when its start column is at or after the position's column (on
    /// the position's line; any column on later lines). Returns `None` when the rest of
    /// the document holds no structural bracket.
    pub fn find_next_bracket(&self, position: Position) -> Result<Option<FoundBracket>, ScanError> {
        self.buffer.offset_at(position)?;

        for line in position.line..=self.buffer.line_count() {
            let content = self.buffer.line_content(line)?;
            let min_column = if line == position.line {
                position.column
            } else {
                1
            };
            let mut byte_pos = 0;
            let mut char_pos = 0;
            for m in self.pattern.find_iter(&content) {
                char_pos += content[byte_pos..m.start()].chars().count();
                let start_column = char_pos + 1;
                char_pos += m.as_str().chars().count();
                byte_pos = m.end();
                let end_column = char_pos + 1;

                if start_column < min_column {
                    continue;
                }
                let range = Range::new(
                    Position::new(line, start_column),
                    Position::new(line, end_column),
                );
                if self.filter.is_structural(&range, m.as_str()) {
                    return Ok(Some(FoundBracket {
                        range,
                        text: m.as_str().to_string(),
                    }));
                }
            }
        }
        Ok(None)
    }

    /// Find the last structural bracket at or before `position`.
    ///
    /// A bracket counts when it ends at or before the position's column (on the
    /// position's line; any column on earlier lines). Returns `None` when nothing
    /// before the position is a structural bracket.
    pub fn find_prev_bracket(&self, position: Position) -> Result<Option<FoundBracket>, ScanError> {
        self.buffer.offset_at(position)?;

        for line in (1..=position.line).rev() {
            let content = self.buffer.line_content(line)?;
            let max_column = (line == position.line).then_some(position.column);
            let mut best = None;
            let mut byte_pos = 0;
            let mut char_pos = 0;
            for m in self.pattern.find_iter(&content) {
                char_pos += content[byte_pos..m.start()].chars().count();
                let start_column = char_pos + 1;
                char_pos += m.as_str().chars().count();
                byte_pos = m.end();
                let end_column = char_pos + 1;

                if let Some(max) = max_column {
                    if end_column > max {
                        break;
                    }
                }
                let range = Range::new(
                    Position::new(line, start_column),
                    Position::new(line, end_column),
                );
                if self.filter.is_structural(&range, m.as_str()) {
                    best = Some(FoundBracket {
                        range,
                        text: m.as_str().to_string(),
                    });
                }
            }
            if best.is_some() {
                return Ok(best);
            }
        }
        Ok(None)
    }
}
