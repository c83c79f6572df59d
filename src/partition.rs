//! Partitioning: ordered partition start positions over a linear range.
//!
//! A [`Partitioning`] divides `0..length` into `partitions()` consecutive
//! partitions. Partition 0 always starts at 0 and a sentinel entry at index
//! `partitions()` holds the total length.
//!
//! Text insertions usually happen repeatedly at one place, which would shift
//! every later start each time. Instead a single pending "step" records that
//! every partition after `step_partition` should be offset by `step_length`;
//! the step is folded into the stored values only when an operation needs
//! them to be exact.

use crate::error::Result;
use crate::gap::GapBuffer;

/// Sequence of non-decreasing partition start positions.
#[derive(Clone, Debug)]
pub struct Partitioning {
    step_partition: usize,
    step_length: isize,
    // Raw values may be stale by `step_length` past `step_partition`.
    body: GapBuffer<isize>,
}

impl Default for Partitioning {
    fn default() -> Self {
        Self::new(8)
    }
}

impl Partitioning {
    /// Create a partitioning holding one empty partition.
    #[must_use]
    pub fn new(grow_size: usize) -> Self {
        let mut body = GapBuffer::filled(2, 0);
        body.set_grow_size(grow_size);
        Self {
            step_partition: 0,
            step_length: 0,
            body,
        }
    }

    /// Fold the pending step into all partitions up to `partition_up_to`.
    fn apply_step(&mut self, partition_up_to: usize) {
        if self.step_length != 0 {
            self.body.range_add_delta(
                self.step_partition + 1,
                partition_up_to + 1,
                self.step_length,
            );
        }
        self.step_partition = partition_up_to;
        if self.step_partition + 1 >= self.body.len() {
            self.step_partition = self.partitions();
            self.step_length = 0;
        }
    }

    /// Move the step start back to `partition_down_to`.
    fn back_step(&mut self, partition_down_to: usize) {
        if self.step_length != 0 {
            self.body.range_add_delta(
                partition_down_to + 1,
                self.step_partition + 1,
                -self.step_length,
            );
        }
        self.step_partition = partition_down_to;
    }

    /// Number of partitions (the sentinel is not counted).
    #[must_use]
    pub fn partitions(&self) -> usize {
        self.body.len() - 1
    }

    /// Insert a partition boundary so that `partition` starts at `pos`.
    pub fn insert_partition(&mut self, partition: usize, pos: usize) -> Result<()> {
        if self.step_partition < partition {
            self.apply_step(partition);
        }
        self.body.insert(partition, to_raw(pos))?;
        self.step_partition += 1;
        Ok(())
    }

    /// Reserve room for `additional` more partitions.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.body.reserve(additional)
    }

    /// Move the start of an existing partition.
    pub fn set_partition_start_position(&mut self, partition: usize, pos: usize) {
        self.apply_step(partition + 1);
        if partition > self.body.len() {
            return;
        }
        self.body.set_value_at(partition, to_raw(pos));
    }

    /// Shift the start of every partition after `partition` by `delta`.
    pub fn insert_text(&mut self, partition: usize, delta: isize) {
        if self.step_length != 0 {
            if partition >= self.step_partition {
                // Fill in up to the new insertion point
                self.apply_step(partition);
                self.step_length += delta;
            } else if partition + self.body.len() / 10 >= self.step_partition {
                // Close to the step but before: move the step back
                self.back_step(partition);
                self.step_length += delta;
            } else {
                self.apply_step(self.partitions());
                self.step_partition = partition;
                self.step_length = delta;
            }
        } else {
            self.step_partition = partition;
            self.step_length = delta;
        }
    }

    /// Remove the boundary at the start of `partition`, merging it into the
    /// previous partition.
    pub fn remove_partition(&mut self, partition: usize) {
        if partition > self.step_partition {
            self.apply_step(partition);
        } else if partition == 0 && self.step_partition == 0 && self.step_length != 0 {
            // The next partition becomes the first and carries the pending shift
            self.apply_step(1);
        }
        self.step_partition = self.step_partition.saturating_sub(1);
        self.body.delete(partition);
    }

    fn raw_position(&self, partition: usize) -> isize {
        let pos = self.body.value_at(partition);
        if partition > self.step_partition {
            pos + self.step_length
        } else {
            pos
        }
    }

    /// Start position of `partition`; `partitions()` yields the total length.
    ///
    /// Out of range partitions return 0.
    #[must_use]
    pub fn position_from_partition(&self, partition: usize) -> usize {
        debug_assert!(partition < self.body.len(), "partition out of range");
        if partition >= self.body.len() {
            return 0;
        }
        from_raw(self.raw_position(partition))
    }

    /// Partition whose range contains `pos`.
    ///
    /// Always returns a value in `0..partitions()`; positions at or past the
    /// end map to the last partition. When `pos` is the start of several
    /// partitions (all but the last empty), the lowest index is returned.
    #[must_use]
    pub fn partition_from_position(&self, pos: usize) -> usize {
        if self.body.len() <= 1 {
            return 0;
        }
        let pos = to_raw(pos);
        let partitions = self.partitions();
        let mut lower = 0;
        if pos >= self.raw_position(partitions) {
            lower = partitions - 1;
        } else {
            let mut upper = partitions;
            while lower < upper {
                // Round high
                let middle = (upper + lower).div_ceil(2);
                if pos < self.raw_position(middle) {
                    upper = middle - 1;
                } else {
                    lower = middle;
                }
            }
        }
        let start = self.raw_position(lower);
        if pos != start {
            return lower;
        }
        // Lowest partition sharing this start.
        let mut low = 0;
        let mut high = lower;
        while low < high {
            let middle = (low + high) / 2;
            if self.raw_position(middle) < start {
                low = middle + 1;
            } else {
                high = middle;
            }
        }
        low
    }

    /// Reset to a single empty partition.
    pub fn delete_all(&mut self) {
        *self = Self::new(self.body.grow_size());
    }
}

fn to_raw(pos: usize) -> isize {
    isize::try_from(pos).unwrap_or(isize::MAX)
}

fn from_raw(pos: isize) -> usize {
    debug_assert!(pos >= 0, "partition position went negative");
    usize::try_from(pos).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(p: &Partitioning) -> Vec<usize> {
        (0..=p.partitions())
            .map(|i| p.position_from_partition(i))
            .collect()
    }

    #[test]
    fn test_new_single_partition() {
        let p = Partitioning::new(8);
        assert_eq!(p.partitions(), 1);
        assert_eq!(starts(&p), vec![0, 0]);
        assert_eq!(p.partition_from_position(0), 0);
        assert_eq!(p.partition_from_position(50), 0);
    }

    #[test]
    fn test_insert_text_and_partitions() {
        let mut p = Partitioning::new(8);
        p.insert_text(0, 10);
        p.insert_partition(1, 4).unwrap();
        p.insert_partition(2, 7).unwrap();
        assert_eq!(starts(&p), vec![0, 4, 7, 10]);
        assert_eq!(p.partition_from_position(0), 0);
        assert_eq!(p.partition_from_position(3), 0);
        assert_eq!(p.partition_from_position(4), 1);
        assert_eq!(p.partition_from_position(9), 2);
        assert_eq!(p.partition_from_position(10), 2);
    }

    #[test]
    fn test_step_is_applied_lazily() {
        let mut p = Partitioning::new(8);
        p.insert_text(0, 10);
        p.insert_partition(1, 5).unwrap();
        // Typing repeatedly in partition 0.
        for _ in 0..3 {
            p.insert_text(0, 1);
        }
        assert_eq!(starts(&p), vec![0, 8, 13]);
        // Step moves forward then back.
        p.insert_text(1, 2);
        p.insert_text(0, -1);
        assert_eq!(starts(&p), vec![0, 7, 14]);
    }

    #[test]
    fn test_remove_partition() {
        let mut p = Partitioning::new(8);
        p.insert_text(0, 9);
        p.insert_partition(1, 3).unwrap();
        p.insert_partition(2, 6).unwrap();
        p.remove_partition(1);
        assert_eq!(starts(&p), vec![0, 6, 9]);
        assert_eq!(p.partition_from_position(5), 0);
    }

    #[test]
    fn test_remove_first_partition_with_pending_shift() {
        let mut p = Partitioning::new(8);
        p.insert_text(0, 10);
        p.insert_partition(1, 4).unwrap();
        p.insert_partition(2, 7).unwrap();
        // Collapse partition 0; the shift is still pending on partition 1.
        p.insert_text(0, -4);
        assert_eq!(starts(&p), vec![0, 0, 3, 6]);
        p.remove_partition(0);
        assert_eq!(starts(&p), vec![0, 3, 6]);
        assert_eq!(p.partition_from_position(0), 0);
        assert_eq!(p.partition_from_position(4), 1);
    }

    #[test]
    fn test_set_partition_start() {
        let mut p = Partitioning::new(8);
        p.insert_text(0, 9);
        p.insert_partition(1, 3).unwrap();
        p.set_partition_start_position(1, 4);
        assert_eq!(starts(&p), vec![0, 4, 9]);
    }

    #[test]
    fn test_ties_resolve_to_lowest_partition() {
        let mut p = Partitioning::new(8);
        p.insert_text(0, 10);
        p.insert_partition(1, 5).unwrap();
        p.insert_partition(2, 5).unwrap();
        p.insert_partition(3, 5).unwrap();
        assert_eq!(p.partition_from_position(5), 1);
        assert_eq!(p.partition_from_position(6), 3);
        assert_eq!(p.partition_from_position(9), 3);
        assert_eq!(p.partition_from_position(4), 0);
    }

    #[test]
    fn test_delete_all() {
        let mut p = Partitioning::new(8);
        p.insert_text(0, 9);
        p.insert_partition(1, 3).unwrap();
        p.delete_all();
        assert_eq!(p.partitions(), 1);
        assert_eq!(starts(&p), vec![0, 0]);
    }
}
