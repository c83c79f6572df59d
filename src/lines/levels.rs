//! Fold levels, one per line.

use crate::error::Result;
use crate::gap::GapBuffer;

use super::PerLine;

/// Level of a line that is not indented into any fold.
pub const FOLD_LEVEL_BASE: i32 = 0x400;
/// Flag for lines containing only whitespace.
pub const FOLD_LEVEL_WHITE_FLAG: i32 = 0x1000;
/// Flag for lines that start a fold.
pub const FOLD_LEVEL_HEADER_FLAG: i32 = 0x2000;
/// Bits holding the numeric level.
pub const FOLD_LEVEL_NUMBER_MASK: i32 = 0x0FFF;

/// Fold level per line. Storage is only allocated once a level is set.
#[derive(Clone, Debug, Default)]
pub struct LineLevels {
    levels: GapBuffer<i32>,
}

impl LineLevels {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow to `size_new` lines, new lines at [`FOLD_LEVEL_BASE`].
    pub fn expand_levels(&mut self, size_new: usize) -> Result<()> {
        let len = self.levels.len();
        if size_new > len {
            self.levels
                .insert_value(len, size_new - len, FOLD_LEVEL_BASE)?;
        }
        Ok(())
    }

    /// Forget every level.
    pub fn clear_levels(&mut self) {
        self.levels.delete_all();
    }

    /// Set the level of `line` in a document of `lines` lines, returning the
    /// previous level. Lines outside the document are ignored and report 0.
    pub fn set_level(&mut self, line: usize, level: i32, lines: usize) -> Result<i32> {
        let mut prev = 0;
        if line < lines {
            if self.levels.is_empty() {
                self.expand_levels(lines + 1)?;
            }
            prev = self.levels.value_at(line);
            if prev != level {
                self.levels.set_value_at(line, level);
            }
        }
        Ok(prev)
    }

    /// Level of `line`, [`FOLD_LEVEL_BASE`] when never set.
    #[must_use]
    pub fn level(&self, line: usize) -> i32 {
        if line < self.levels.len() {
            self.levels.value_at(line)
        } else {
            FOLD_LEVEL_BASE
        }
    }
}

impl PerLine for LineLevels {
    fn init(&mut self) {
        self.levels.delete_all();
    }

    fn insert_line(&mut self, line: usize) -> Result<()> {
        if !self.levels.is_empty() {
            let level = if line < self.levels.len() {
                self.levels.value_at(line)
            } else {
                FOLD_LEVEL_BASE
            };
            self.levels.insert(line, level)?;
        }
        Ok(())
    }

    fn reserve(&mut self, _lines: usize, additional: usize) -> Result<()> {
        if self.levels.is_empty() {
            return Ok(());
        }
        self.levels.reserve(additional)
    }

    fn remove_line(&mut self, line: usize) {
        if self.levels.is_empty() {
            return;
        }
        // Merge the header flag into the line before so a fold does not
        // briefly disappear.
        let first_header = self.levels.value_at(line) & FOLD_LEVEL_HEADER_FLAG;
        self.levels.delete(line);
        if line == 0 {
            return;
        }
        let prev = self.levels.value_at(line - 1);
        if line + 1 == self.levels.len() {
            // Last line loses the header flag
            self.levels
                .set_value_at(line - 1, prev & !FOLD_LEVEL_HEADER_FLAG);
        } else {
            self.levels.set_value_at(line - 1, prev | first_header);
        }
    }
}
