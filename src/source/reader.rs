//! Cursor over an immutable source text.
//!
//! The reader owns the text and a current location. Reads past the end yield
//! `None` instead of failing; the only errors are misuse of the save stack or
//! a jump to a location that does not exist in the text.

use std::sync::Arc;

use crate::diagnostics::ReaderError;
use crate::source::SourceLocation;

#[derive(Debug, Clone)]
pub struct SourceReader {
    text: Arc<str>,
    location: SourceLocation,
    saves: Vec<SourceLocation>,
}

impl SourceReader {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            location: SourceLocation::ZERO,
            saves: Vec::new(),
        }
    }

    // ========================================================================
    // Boundary state
    // ========================================================================

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current byte offset. Always within `0..=len()`.
    pub fn position(&self) -> usize {
        self.location.offset
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }

    /// Length of the whole text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The unread part of the text.
    pub fn remaining(&self) -> &str {
        &self.text[self.location.offset..]
    }

    pub fn is_at_end(&self) -> bool {
        self.location.offset >= self.text.len()
    }

    pub fn has_content(&self) -> bool {
        !self.is_at_end()
    }

    /// Text between two byte offsets, if both fall on character boundaries.
    pub fn slice(&self, start: usize, end: usize) -> Option<&str> {
        self.text.get(start..end)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// The character `offset` characters ahead of the cursor.
    pub fn peek(&self, offset: usize) -> Option<char> {
        self.remaining().chars().nth(offset)
    }

    /// Returns the character `offset` characters ahead and moves past it.
    /// Nothing moves when that character does not exist.
    pub fn read(&mut self, offset: usize) -> Option<char> {
        let ch = self.peek(offset)?;
        self.advance(offset + 1);
        Some(ch)
    }

    /// The next `count` characters, or `None` if fewer remain.
    pub fn peek_string(&self, count: usize) -> Option<&str> {
        let rest = self.remaining();
        let mut chars = rest.char_indices();
        let end = match chars.nth(count) {
            Some((idx, _)) => idx,
            None if rest.chars().count() == count => rest.len(),
            None => return None,
        };
        Some(&rest[..end])
    }

    pub fn read_string(&mut self, count: usize) -> Option<String> {
        let text = self.peek_string(count)?.to_string();
        self.advance_bytes(text.len());
        Some(text)
    }

    pub fn is_next(&self, expected: &str) -> bool {
        self.remaining().starts_with(expected)
    }

    pub fn is_next_char(&self, expected: char) -> bool {
        self.peek(0) == Some(expected)
    }

    /// Distance in characters from the cursor to the next `target`.
    pub fn find_offset(&self, target: char) -> Option<usize> {
        self.remaining().chars().position(|ch| ch == target)
    }

    /// Moves forward by `count` characters, stopping at the end of the text.
    pub fn advance(&mut self, count: usize) {
        let rest = &self.text[self.location.offset..];
        for ch in rest.chars().take(count) {
            self.location.advance(ch);
        }
    }

    /// Moves forward over `bytes` bytes of text that the caller has already
    /// matched. `bytes` must end on a character boundary.
    pub(crate) fn advance_bytes(&mut self, bytes: usize) {
        let start = self.location.offset;
        let end = (start + bytes).min(self.text.len());
        if let Some(consumed) = self.text.get(start..end) {
            self.location.advance_str(consumed);
        }
    }

    // ========================================================================
    // Backtracking
    // ========================================================================

    /// Pushes the current location on the save stack.
    pub fn save(&mut self) {
        self.saves.push(self.location);
    }

    /// Pops the most recent save point and returns to it.
    pub fn load(&mut self) -> Result<SourceLocation, ReaderError> {
        let saved = self.saves.pop().ok_or(ReaderError::EmptySaveStack)?;
        self.location = saved;
        Ok(saved)
    }

    /// Pops the most recent save point without moving.
    pub fn discard_save(&mut self) -> Result<SourceLocation, ReaderError> {
        self.saves.pop().ok_or(ReaderError::EmptySaveStack)
    }

    pub fn save_depth(&self) -> usize {
        self.saves.len()
    }

    /// Jumps straight to `location`, which must have come from this reader.
    pub fn rewind(&mut self, location: SourceLocation) -> Result<(), ReaderError> {
        if location.offset > self.text.len() || !self.text.is_char_boundary(location.offset) {
            return Err(ReaderError::InvalidLocation {
                offset: location.offset,
                len: self.text.len(),
            });
        }
        self.location = location;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_does_not_move() {
        let reader = SourceReader::new("abc");
        assert_eq!(reader.peek(0), Some('a'));
        assert_eq!(reader.peek(2), Some('c'));
        assert_eq!(reader.peek(3), None);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn read_with_offset_skips_ahead() {
        let mut reader = SourceReader::new("abc");
        assert_eq!(reader.read(1), Some('b'));
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.read(5), None);
        assert_eq!(reader.position(), 2);
    }

    #[test]
    fn peek_string_requires_enough_characters() {
        let reader = SourceReader::new("héllo");
        assert_eq!(reader.peek_string(2), Some("hé"));
        assert_eq!(reader.peek_string(5), Some("héllo"));
        assert_eq!(reader.peek_string(6), None);
        assert_eq!(reader.peek_string(0), Some(""));
    }

    #[test]
    fn load_on_empty_stack_is_an_error() {
        let mut reader = SourceReader::new("x");
        assert_eq!(reader.load(), Err(ReaderError::EmptySaveStack));
        assert_eq!(reader.discard_save(), Err(ReaderError::EmptySaveStack));
    }

    #[test]
    fn rewind_rejects_offsets_inside_a_character() {
        let mut reader = SourceReader::new("é");
        let bogus = SourceLocation::new(1, 2, 1);
        assert!(matches!(
            reader.rewind(bogus),
            Err(ReaderError::InvalidLocation { offset: 1, len: 2 })
        ));
    }
}
