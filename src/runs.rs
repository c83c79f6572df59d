//! Sparse run store: one value per position, stored as runs.
//!
//! [`RunStyles`] maps every position in `0..length()` to a value while only
//! storing one entry per run of equal values. Run boundaries live in a
//! [`Partitioning`]; `values` holds one value per run plus a trailing
//! sentinel that always stays at `T::default()`.
//!
//! After every public mutation no two adjacent runs hold the same value and
//! no run is empty. [`RunStyles::check`] verifies this.

use std::ops::Range;

use crate::error::Result;
use crate::gap::GapBuffer;
use crate::partition::Partitioning;

/// Run-length encoded value store.
#[derive(Clone, Debug)]
pub struct RunStyles<T> {
    starts: Partitioning,
    values: GapBuffer<T>,
}

impl<T: Copy + Default + PartialEq> Default for RunStyles<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default + PartialEq> RunStyles<T> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            starts: Partitioning::new(8),
            values: GapBuffer::filled(2, T::default()),
        }
    }

    /// First run at `position`.
    fn run_from_position(&self, position: usize) -> usize {
        self.starts.partition_from_position(position)
    }

    /// Make sure a run starts at `position`, splitting the run containing it.
    fn split_run(&mut self, position: usize) -> Result<usize> {
        let mut run = self.run_from_position(position);
        let pos_run = self.starts.position_from_partition(run);
        if pos_run < position {
            let run_value = self.value_at(position);
            run += 1;
            self.starts.insert_partition(run, position)?;
            self.values.insert_value(run, 1, run_value)?;
        }
        Ok(run)
    }

    fn remove_run(&mut self, run: usize) {
        self.starts.remove_partition(run);
        self.values.delete_range(run, 1);
    }

    fn remove_run_if_empty(&mut self, run: usize) {
        if run < self.starts.partitions()
            && self.starts.partitions() > 1
            && self.starts.position_from_partition(run)
                == self.starts.position_from_partition(run + 1)
        {
            self.remove_run(run);
        }
    }

    fn remove_run_if_same_as_previous(&mut self, run: usize) {
        if run > 0
            && run < self.starts.partitions()
            && self.values.value_at(run - 1) == self.values.value_at(run)
        {
            self.remove_run(run);
        }
    }

    /// Total number of positions covered.
    #[must_use]
    pub fn length(&self) -> usize {
        self.starts.position_from_partition(self.starts.partitions())
    }

    /// Number of runs.
    #[must_use]
    pub fn runs(&self) -> usize {
        self.starts.partitions()
    }

    /// Value at `position`. Positions at or past the end report the last run.
    #[must_use]
    pub fn value_at(&self, position: usize) -> T {
        self.values
            .value_at(self.starts.partition_from_position(position))
    }

    /// Position of the next value change after `position`.
    ///
    /// Returns `end` when the run containing `position` extends past it and
    /// `end + 1` when `position` is already at or past `end`.
    #[must_use]
    pub fn find_next_change(&self, position: usize, end: usize) -> usize {
        let run = self.starts.partition_from_position(position);
        if run < self.starts.partitions() {
            let run_change = self.starts.position_from_partition(run);
            if run_change > position {
                return run_change;
            }
            let next_change = self.starts.position_from_partition(run + 1);
            if next_change > position {
                next_change
            } else if position < end {
                end
            } else {
                end + 1
            }
        } else {
            end + 1
        }
    }

    /// Start of the run containing `position`.
    #[must_use]
    pub fn start_run(&self, position: usize) -> usize {
        self.starts
            .position_from_partition(self.starts.partition_from_position(position))
    }

    /// End of the run containing `position`.
    #[must_use]
    pub fn end_run(&self, position: usize) -> usize {
        self.starts
            .position_from_partition(self.starts.partition_from_position(position) + 1)
    }

    /// Set `fill_length` positions from `position` to `value`.
    ///
    /// Returns the sub-range that actually changed, trimmed of leading and
    /// trailing positions that already held `value`, or `None` when nothing
    /// changed or the range extends past the end.
    pub fn fill_range(
        &mut self,
        position: usize,
        value: T,
        fill_length: usize,
    ) -> Result<Option<Range<usize>>> {
        if fill_length == 0 {
            return Ok(None);
        }
        let mut position = position;
        let mut end = match position.checked_add(fill_length) {
            Some(end) if end <= self.length() => end,
            _ => return Ok(None),
        };
        let mut run_end = self.run_from_position(end);
        if self.values.value_at(run_end) == value {
            // End already has value so trim range.
            end = self.starts.position_from_partition(run_end);
            if position >= end {
                return Ok(None);
            }
        } else {
            run_end = self.split_run(end)?;
        }
        let mut run_start = self.run_from_position(position);
        if self.values.value_at(run_start) == value {
            // Start already has value so trim range.
            run_start += 1;
            position = self.starts.position_from_partition(run_start);
        } else if self.starts.position_from_partition(run_start) < position {
            run_start = self.split_run(position)?;
            run_end += 1;
        }
        if run_start >= run_end {
            return Ok(None);
        }
        self.values.set_value_at(run_start, value);
        for _ in run_start + 1..run_end {
            self.remove_run(run_start + 1);
        }
        let run_end = self.run_from_position(end);
        self.remove_run_if_same_as_previous(run_end);
        self.remove_run_if_same_as_previous(run_start);
        let run_end = self.run_from_position(end);
        self.remove_run_if_empty(run_end);
        Ok(Some(position..end))
    }

    /// Set a single position to `value`.
    pub fn set_value_at(&mut self, position: usize, value: T) -> Result<()> {
        self.fill_range(position, value, 1).map(|_| ())
    }

    /// Open `insert_length` positions at `position`.
    ///
    /// Inserting inside a run extends it. At a run boundary the new space
    /// joins the previous run when the following run holds a non-default
    /// value, and the following run otherwise. The store always begins with
    /// a default-valued run so space inserted at 0 is default.
    pub fn insert_space(&mut self, position: usize, insert_length: usize) -> Result<()> {
        if insert_length == 0 {
            return Ok(());
        }
        let delta = to_delta(insert_length);
        let run_start = self.run_from_position(position);
        if self.starts.position_from_partition(run_start) == position {
            let run_value = self.value_at(position);
            if run_start == 0 {
                if run_value == T::default() {
                    self.starts.insert_text(run_start, delta);
                } else {
                    // Inserting at start of document so ensure default
                    self.values.set_value_at(0, T::default());
                    self.starts.insert_partition(1, 0)?;
                    self.values.insert_value(1, 1, run_value)?;
                    self.starts.insert_text(0, delta);
                }
            } else if run_value == T::default() {
                // Insert at end of run so do not extend style
                self.starts.insert_text(run_start, delta);
            } else {
                self.starts.insert_text(run_start - 1, delta);
            }
        } else {
            self.starts.insert_text(run_start, delta);
        }
        Ok(())
    }

    /// Reset to an empty store.
    pub fn delete_all(&mut self) {
        *self = Self::new();
    }

    /// Remove `delete_length` positions starting at `position`.
    pub fn delete_range(&mut self, position: usize, delete_length: usize) -> Result<()> {
        if delete_length == 0 {
            return Ok(());
        }
        if position == 0 && delete_length == self.length() {
            self.delete_all();
            return Ok(());
        }
        let end = position + delete_length;
        debug_assert!(end <= self.length(), "delete past end of run store");
        let delta = -to_delta(delete_length);
        let run_start = self.run_from_position(position);
        let run_end = self.run_from_position(end);
        if run_start == run_end {
            // Deleting from inside one run
            self.starts.insert_text(run_start, delta);
            self.remove_run_if_empty(run_start);
        } else {
            let run_start = self.split_run(position)?;
            let run_end = self.split_run(end)?;
            self.starts.insert_text(run_start, delta);
            for _ in run_start..run_end {
                self.remove_run(run_start);
            }
            self.remove_run_if_empty(run_start);
            self.remove_run_if_same_as_previous(run_start);
        }
        Ok(())
    }

    /// True when every position holds the same value.
    #[must_use]
    pub fn all_same(&self) -> bool {
        (1..self.starts.partitions())
            .all(|run| self.values.value_at(run) == self.values.value_at(run - 1))
    }

    /// True when every position holds `value`.
    #[must_use]
    pub fn all_same_as(&self, value: T) -> bool {
        self.all_same() && self.values.value_at(0) == value
    }

    /// First position at or after `start` holding `value`.
    #[must_use]
    pub fn find(&self, value: T, start: usize) -> Option<usize> {
        if start >= self.length() {
            return None;
        }
        let mut run = if start == 0 {
            0
        } else {
            self.run_from_position(start)
        };
        if self.values.value_at(run) == value {
            return Some(start);
        }
        run += 1;
        while run < self.starts.partitions() {
            if self.values.value_at(run) == value {
                return Some(self.starts.position_from_partition(run));
            }
            run += 1;
        }
        None
    }

    /// Iterate `(range, value)` for every run.
    pub fn iter_runs(&self) -> impl Iterator<Item = (Range<usize>, T)> + '_ {
        (0..self.starts.partitions()).map(|run| {
            (
                self.starts.position_from_partition(run)
                    ..self.starts.position_from_partition(run + 1),
                self.values.value_at(run),
            )
        })
    }

    /// Verify the structural invariants, describing the first violation.
    pub fn check(&self) -> std::result::Result<(), &'static str> {
        if self.starts.partitions() < 1 {
            return Err("must always have 1 or more partitions");
        }
        if self.starts.partitions() != self.values.len() - 1 {
            return Err("partitions and values have different lengths");
        }
        let mut start = 0;
        while start < self.length() {
            let end = self.end_run(start);
            if start >= end {
                return Err("partition is 0 length");
            }
            start = end;
        }
        if self.values.value_at(self.values.len() - 1) != T::default() {
            return Err("unused value at end changed");
        }
        for run in 1..self.values.len() - 1 {
            if self.values.value_at(run) == self.values.value_at(run - 1) {
                return Err("value of a partition same as previous");
            }
        }
        Ok(())
    }
}

fn to_delta(length: usize) -> isize {
    isize::try_from(length).unwrap_or(isize::MAX)
}
