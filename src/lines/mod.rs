//! Line index and per-line observers.
//!
//! [`LineVector`] records where each line starts. Other per-line data
//! (fold levels, lexer state, markers) lives in observers implementing
//! [`PerLine`]; they are told about every line insertion and removal so their
//! arrays stay aligned with the line index.
//!
//! Observers are shared handles: the owner keeps its own `Rc` to query and
//! update the data, and the line vector keeps a clone to notify it.
//! Observers are notified in registration order while the line vector is
//! mutably borrowed, so they cannot reach back into the index. Callers check
//! [`LineVector::observers_available`] before editing: an observer that is
//! still borrowed means the edit is nested inside another one and is refused.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use gapcell::lines::{LineState, LineVector};
//!
//! let state = Rc::new(RefCell::new(LineState::new()));
//! let mut lines = LineVector::new();
//! lines.add_per_line(state.clone());
//!
//! lines.insert_text(0, 10);
//! state.borrow_mut().set_line_state(0, 7).unwrap();
//! lines.insert_line(1, 4, false).unwrap();
//! assert_eq!(lines.lines(), 2);
//! assert_eq!(state.borrow().line_state(0), 7);
//! ```

mod levels;
mod markers;
mod state;

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::partition::Partitioning;

pub use levels::{
    FOLD_LEVEL_BASE, FOLD_LEVEL_HEADER_FLAG, FOLD_LEVEL_NUMBER_MASK, FOLD_LEVEL_WHITE_FLAG,
    LineLevels,
};
pub use markers::{LineMarkers, MarkerHandleSet};
pub use state::LineState;

/// Per-line data that follows line insertions and removals.
pub trait PerLine {
    /// Discard all data; the document has been reset to one empty line.
    fn init(&mut self);
    /// A line was inserted at `line`.
    fn insert_line(&mut self, line: usize) -> Result<()>;
    /// The line at `line` was removed.
    fn remove_line(&mut self, line: usize);
    /// The document has `lines` lines and up to `additional` insertions are
    /// coming. After this returns `Ok`, those `insert_line` calls must not fail.
    fn reserve(&mut self, lines: usize, additional: usize) -> Result<()> {
        let _ = (lines, additional);
        Ok(())
    }
}

/// Shared handle to a registered per-line observer.
pub type PerLineRef = Rc<RefCell<dyn PerLine>>;

/// Line start positions plus the registered per-line observers.
pub struct LineVector {
    starts: Partitioning,
    per_line: Vec<PerLineRef>,
}

impl Default for LineVector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LineVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineVector")
            .field("starts", &self.starts)
            .field("per_line", &self.per_line.len())
            .finish()
    }
}

impl LineVector {
    /// Create an index holding one empty line.
    #[must_use]
    pub fn new() -> Self {
        Self {
            starts: Partitioning::new(256),
            per_line: Vec::new(),
        }
    }

    /// Reset to a single empty line and reset every observer.
    pub fn init(&mut self) {
        self.starts.delete_all();
        for observer in &self.per_line {
            observer.borrow_mut().init();
        }
    }

    /// Register an observer. Observers are notified in registration order.
    pub fn add_per_line(&mut self, observer: PerLineRef) {
        self.per_line.push(observer);
    }

    /// Number of registered observers.
    #[must_use]
    pub fn per_line_count(&self) -> usize {
        self.per_line.len()
    }

    /// Reserve room for `additional` more lines in the index and in every
    /// observer.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.starts.reserve(additional)?;
        let lines = self.lines();
        for observer in &self.per_line {
            observer.borrow_mut().reserve(lines, additional)?;
        }
        Ok(())
    }

    /// True when no observer is borrowed elsewhere. An edit arriving while
    /// one is borrowed is nested inside another use of it and notifying the
    /// observer would fail.
    #[must_use]
    pub fn observers_available(&self) -> bool {
        self.per_line
            .iter()
            .all(|observer| observer.try_borrow_mut().is_ok())
    }

    /// Shift the start of every line after `line` by `delta`.
    pub fn insert_text(&mut self, line: usize, delta: isize) {
        self.starts.insert_text(line, delta);
    }

    /// Insert a line starting at `position`.
    ///
    /// `line_start` tells observers that the insertion happened at the start
    /// of the previous line, so the data of that line moves down with it.
    pub fn insert_line(&mut self, line: usize, position: usize, line_start: bool) -> Result<()> {
        self.starts.insert_partition(line, position)?;
        let notify = if line > 0 && line_start { line - 1 } else { line };
        for observer in &self.per_line {
            observer.borrow_mut().insert_line(notify)?;
        }
        Ok(())
    }

    /// Move the start of `line`.
    pub fn set_line_start(&mut self, line: usize, position: usize) {
        self.starts.set_partition_start_position(line, position);
    }

    /// Remove `line`, joining it to the previous one.
    pub fn remove_line(&mut self, line: usize) {
        self.starts.remove_partition(line);
        for observer in &self.per_line {
            observer.borrow_mut().remove_line(line);
        }
    }

    /// Number of lines. An empty document has one line.
    #[must_use]
    pub fn lines(&self) -> usize {
        self.starts.partitions()
    }

    /// Line containing byte `position`.
    #[must_use]
    pub fn line_from_position(&self, position: usize) -> usize {
        self.starts.partition_from_position(position)
    }

    /// Start of `line`; `lines()` yields the document length.
    #[must_use]
    pub fn line_start(&self, line: usize) -> usize {
        if line > self.lines() {
            return self.line_start(self.lines());
        }
        self.starts.position_from_partition(line)
    }
}
