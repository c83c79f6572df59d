//! Line markers (bookmarks, breakpoints, ...), addressed by handle.
//!
//! Each marker added to a line gets a fresh handle so it can be found again
//! after lines move. When a line is removed its markers join the line above.

use crate::error::{Error, Result};

use super::PerLine;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct MarkerHandleNumber {
    handle: i32,
    number: i32,
}

/// The markers attached to one line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkerHandleSet {
    // Most recent first.
    marks: Vec<MarkerHandleNumber>,
}

impl MarkerHandleSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Bit set of the marker numbers present.
    #[must_use]
    pub fn mark_value(&self) -> u32 {
        self.marks
            .iter()
            .filter(|m| (0..32).contains(&m.number))
            .fold(0, |acc, m| acc | (1u32 << m.number))
    }

    #[must_use]
    pub fn contains(&self, handle: i32) -> bool {
        self.marks.iter().any(|m| m.handle == handle)
    }

    fn insert_handle(&mut self, handle: i32, number: i32) {
        self.marks.insert(0, MarkerHandleNumber { handle, number });
    }

    fn remove_handle(&mut self, handle: i32) {
        self.marks.retain(|m| m.handle != handle);
    }

    /// Remove markers with `number`; only the most recent unless `all`.
    fn remove_number(&mut self, number: i32, all: bool) -> bool {
        let mut performed_deletion = false;
        let mut index = 0;
        while index < self.marks.len() {
            if self.marks[index].number == number {
                self.marks.remove(index);
                performed_deletion = true;
                if !all {
                    break;
                }
            } else {
                index += 1;
            }
        }
        performed_deletion
    }

    fn combine_with(&mut self, mut other: Self) {
        other.marks.append(&mut self.marks);
        self.marks = other.marks;
    }
}

/// Marker sets per line. Storage is only allocated once a marker is added.
#[derive(Clone, Debug, Default)]
pub struct LineMarkers {
    markers: Vec<Option<MarkerHandleSet>>,
    // Handles are never reused.
    handle_current: i32,
}

impl LineMarkers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bit set of the marker numbers on `line`.
    #[must_use]
    pub fn mark_value(&self, line: usize) -> u32 {
        self.markers
            .get(line)
            .and_then(Option::as_ref)
            .map_or(0, MarkerHandleSet::mark_value)
    }

    /// First line at or after `line_start` with a marker in `mask`.
    #[must_use]
    pub fn marker_next(&self, line_start: usize, mask: u32) -> Option<usize> {
        (line_start..self.markers.len()).find(|&line| self.mark_value(line) & mask != 0)
    }

    /// Add marker `number` to `line` in a document of `lines` lines.
    ///
    /// Returns the new handle, or `None` when `line` is outside the document.
    pub fn add_mark(&mut self, line: usize, number: i32, lines: usize) -> Option<i32> {
        self.handle_current += 1;
        if self.markers.is_empty() {
            // No existing markers so allocate one element per line
            self.markers.resize_with(lines, || None);
        }
        let slot = self.markers.get_mut(line)?;
        slot.get_or_insert_with(MarkerHandleSet::default)
            .insert_handle(self.handle_current, number);
        Some(self.handle_current)
    }

    /// Move the markers of the line after `line` onto `line`.
    pub fn merge_markers(&mut self, line: usize) {
        let Some(next) = self.markers.get_mut(line + 1).and_then(Option::take) else {
            return;
        };
        if let Some(slot) = self.markers.get_mut(line) {
            slot.get_or_insert_with(MarkerHandleSet::default)
                .combine_with(next);
        }
    }

    /// Delete marker `number` from `line` (every marker when `number` is
    /// `None`). Returns whether anything was removed.
    pub fn delete_mark(&mut self, line: usize, number: Option<i32>, all: bool) -> bool {
        let Some(slot) = self.markers.get_mut(line) else {
            return false;
        };
        let Some(set) = slot.as_mut() else {
            return false;
        };
        let some_changes = match number {
            None => {
                *slot = None;
                return true;
            }
            Some(number) => set.remove_number(number, all),
        };
        if set.is_empty() {
            *slot = None;
        }
        some_changes
    }

    pub fn delete_mark_from_handle(&mut self, handle: i32) {
        let Some(line) = self.line_from_handle(handle) else {
            return;
        };
        if let Some(slot) = self.markers.get_mut(line) {
            if let Some(set) = slot.as_mut() {
                set.remove_handle(handle);
                if set.is_empty() {
                    *slot = None;
                }
            }
        }
    }

    /// Line currently holding the marker with `handle`.
    #[must_use]
    pub fn line_from_handle(&self, handle: i32) -> Option<usize> {
        self.markers
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|set| set.contains(handle)))
    }

    /// Marker set of `line`, if any.
    #[must_use]
    pub fn handles(&self, line: usize) -> Option<&MarkerHandleSet> {
        self.markers.get(line).and_then(Option::as_ref)
    }
}

impl PerLine for LineMarkers {
    fn init(&mut self) {
        self.markers.clear();
    }

    fn insert_line(&mut self, line: usize) -> Result<()> {
        if !self.markers.is_empty() && line <= self.markers.len() {
            self.markers.insert(line, None);
        }
        Ok(())
    }

    fn reserve(&mut self, _lines: usize, additional: usize) -> Result<()> {
        if self.markers.is_empty() {
            return Ok(());
        }
        self.markers
            .try_reserve(additional)
            .map_err(|e| Error::out_of_memory(additional, e))
    }

    fn remove_line(&mut self, line: usize) {
        if self.markers.is_empty() {
            return;
        }
        // Retain the markers from the deleted line by oring them into the previous line
        if line > 0 {
            self.merge_markers(line - 1);
        }
        if line < self.markers.len() {
            self.markers.remove(line);
        }
    }
}
