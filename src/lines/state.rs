//! Integer state per line, used by lexers to resume mid-document.

use crate::error::Result;
use crate::gap::GapBuffer;

use super::PerLine;

#[derive(Clone, Debug, Default)]
pub struct LineState {
    line_states: GapBuffer<i32>,
}

impl LineState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the state of `line`, returning the previous state.
    pub fn set_line_state(&mut self, line: usize, state: i32) -> Result<i32> {
        self.line_states.ensure_length(line + 1)?;
        let old = self.line_states.value_at(line);
        self.line_states.set_value_at(line, state);
        Ok(old)
    }

    #[must_use]
    pub fn line_state(&self, line: usize) -> i32 {
        self.line_states.value_at(line)
    }

    /// Number of lines with storage allocated.
    #[must_use]
    pub fn max_line_state(&self) -> usize {
        self.line_states.len()
    }
}

impl PerLine for LineState {
    fn init(&mut self) {
        self.line_states.delete_all();
    }

    fn insert_line(&mut self, line: usize) -> Result<()> {
        if !self.line_states.is_empty() {
            self.line_states.ensure_length(line)?;
            let value = self.line_states.value_at(line);
            self.line_states.insert(line, value)?;
        }
        Ok(())
    }

    fn remove_line(&mut self, line: usize) {
        if self.line_states.len() > line {
            self.line_states.delete(line);
        }
    }

    fn reserve(&mut self, lines: usize, additional: usize) -> Result<()> {
        if self.line_states.is_empty() {
            return Ok(());
        }
        // Padding up to the inserted line, then one per insertion.
        let padding = lines.saturating_sub(self.line_states.len());
        self.line_states.reserve(padding + additional)
    }
}
