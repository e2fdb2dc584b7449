use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A point in the source text.
///
/// `line` and `column` are 1-based and count characters, `offset` is the
/// 0-based byte offset. Two locations are equal when their line and column
/// agree; the byte offset only rides along so the reader can jump back to it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl SourceLocation {
    /// The start of any text: line 1, column 1, byte 0.
    pub const ZERO: SourceLocation = SourceLocation {
        line: 1,
        column: 1,
        offset: 0,
    };

    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Moves the location past one character.
    pub fn advance(&mut self, ch: char) {
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// Moves the location past every character of `text`.
    pub fn advance_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.advance(ch);
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialEq for SourceLocation {
    fn eq(&self, other: &Self) -> bool {
        self.line == other.line && self.column == other.column
    }
}

impl Eq for SourceLocation {}

impl Hash for SourceLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.line.hash(state);
        self.column.hash(state);
    }
}

impl PartialOrd for SourceLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SourceLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.line, self.column).cmp(&(other.line, other.column))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An ordered pair of locations. Zero-width ranges are legal and describe
/// matches that consumed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceRange {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// A zero-width range sitting at `at`.
    pub fn empty(at: SourceLocation) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    /// Converts to a miette span for diagnostic labels.
    pub fn to_source_span(&self) -> miette::SourceSpan {
        miette::SourceSpan::from(self.start.offset..self.end.offset)
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_byte_offset() {
        let a = SourceLocation::new(2, 3, 10);
        let b = SourceLocation::new(2, 3, 99);
        assert_eq!(a, b);
        assert_ne!(a, SourceLocation::new(2, 4, 10));
    }

    #[test]
    fn advance_tracks_lines_and_multibyte_chars() {
        let mut loc = SourceLocation::ZERO;
        loc.advance_str("aé\nb");
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 2);
        assert_eq!(loc.offset, 5);
    }

    #[test]
    fn zero_width_range() {
        let range = SourceRange::empty(SourceLocation::new(1, 4, 3));
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
    }
}
