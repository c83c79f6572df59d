//! Payload stack for undo actions.
//!
//! The bytes of every insert and remove action are stored back to back in
//! action order. `current` sits at the end of the payload of the last applied
//! action: undo walks it back and redo walks it forward, so traversing the
//! history never copies text into the log again.
//!
//! Style bytes of removed text are kept in a second column indexed the same
//! way. The column stays empty until a styled payload arrives, so documents
//! without styles pay nothing for it.

use crate::error::{Error, Result};

#[derive(Clone, Debug, Default)]
pub struct ScrapStack {
    stack: Vec<u8>,
    // Empty, or exactly as long as `stack`.
    styles: Vec<u8>,
    current: usize,
}

impl ScrapStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure pushing `length` bytes at `current` cannot fail.
    pub fn reserve(&mut self, length: usize) -> Result<()> {
        let needed = self
            .current
            .checked_add(length)
            .ok_or_else(|| Error::capacity_overflow(length, self.current))?;
        if needed > self.stack.len() {
            let extra = needed - self.stack.len();
            self.stack
                .try_reserve(extra)
                .map_err(|e| Error::out_of_memory(extra, e))?;
        }
        Ok(())
    }

    fn keeps_styles(&self, styles: &[u8]) -> bool {
        !self.styles.is_empty() || styles.iter().any(|&style| style != 0)
    }

    /// Make sure pushing `length` bytes with `styles` at `current` cannot fail.
    pub fn reserve_styled(&mut self, length: usize, styles: &[u8]) -> Result<()> {
        self.reserve(length)?;
        if self.keeps_styles(styles) {
            let needed = self.current + length;
            if needed > self.styles.len() {
                let extra = needed - self.styles.len();
                self.styles
                    .try_reserve(extra)
                    .map_err(|e| Error::out_of_memory(extra, e))?;
            }
        }
        Ok(())
    }

    /// Store `text` at `current`, discarding any redo payload beyond it, and
    /// move past it. Returns the stored copy.
    pub fn push(&mut self, text: &[u8]) -> Result<&[u8]> {
        self.push_styled(text, &[])
    }

    /// Like [`push`](Self::push), also storing one style byte per text byte.
    /// An empty `styles` stands for all zero.
    pub fn push_styled(&mut self, text: &[u8], styles: &[u8]) -> Result<&[u8]> {
        debug_assert!(
            styles.is_empty() || styles.len() == text.len(),
            "styles must match the text"
        );
        self.reserve_styled(text.len(), styles)?;
        let start = self.current;
        if self.keeps_styles(styles) {
            self.styles.resize(start, 0);
            if styles.len() == text.len() {
                self.styles.extend_from_slice(styles);
            } else {
                self.styles.resize(start + text.len(), 0);
            }
        }
        self.stack.truncate(start);
        self.stack.extend_from_slice(text);
        self.current += text.len();
        Ok(&self.stack[start..self.current])
    }

    pub fn set_current(&mut self, position: usize) {
        self.current = position.min(self.stack.len());
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn move_forward(&mut self, length: usize) {
        self.current = (self.current + length).min(self.stack.len());
    }

    pub fn move_back(&mut self, length: usize) {
        self.current = self.current.saturating_sub(length);
    }

    /// The `length` bytes ending at `current`: the payload of the action to undo.
    #[must_use]
    pub fn text_before(&self, length: usize) -> &[u8] {
        let start = self.current.saturating_sub(length);
        &self.stack[start..self.current]
    }

    /// The `length` bytes starting at `current`: the payload of the action to redo.
    #[must_use]
    pub fn text_after(&self, length: usize) -> &[u8] {
        let end = (self.current + length).min(self.stack.len());
        &self.stack[self.current..end]
    }

    /// Styles matching [`text_before`](Self::text_before); empty when no
    /// styled payload has been stored.
    #[must_use]
    pub fn styles_before(&self, length: usize) -> &[u8] {
        if self.styles.is_empty() {
            return &[];
        }
        let start = self.current.saturating_sub(length);
        &self.styles[start..self.current]
    }

    /// Styles matching [`text_after`](Self::text_after).
    #[must_use]
    pub fn styles_after(&self, length: usize) -> &[u8] {
        if self.styles.is_empty() {
            return &[];
        }
        let end = (self.current + length).min(self.styles.len());
        &self.styles[self.current..end]
    }

    /// Total bytes of text held, including abandoned redo text not yet
    /// overwritten.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Bytes held by both columns.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.stack.len() + self.styles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
