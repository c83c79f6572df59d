//! Gap buffer: a growable sequence with a single relocatable gap.
//!
//! Elements live in one contiguous allocation laid out as
//! `[part 1 | gap | part 2]`. Insertions and deletions first move the gap to
//! the edit position, copying only the elements between the old and the new
//! gap position, so runs of nearby edits are cheap.
//!
//! # Invariants
//!
//! - `gap_length == body.len() - length_body`
//! - logical index `i < part1_length` lives at `body[i]`
//! - logical index `i >= part1_length` lives at `body[i + gap_length]`
//!
//! Reads outside the logical range return `T::default()` instead of failing,
//! which lets callers read one element before or after an edit without
//! bounds checks of their own.

use crate::error::{Error, Result};

/// Initial growth increment for a fresh buffer.
const DEFAULT_GROW_SIZE: usize = 8;

/// Growable sequence of `Copy` elements with a single movable gap.
#[derive(Clone, Debug)]
pub struct GapBuffer<T> {
    body: Vec<T>,
    length_body: usize,
    part1_length: usize,
    gap_length: usize,
    grow_size: usize,
}

impl<T: Copy + Default> Default for GapBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default> GapBuffer<T> {
    /// Create an empty buffer without allocating.
    #[must_use]
    pub fn new() -> Self {
        Self::with_grow_size(DEFAULT_GROW_SIZE)
    }

    /// Create an empty buffer with a custom growth increment.
    #[must_use]
    pub fn with_grow_size(grow_size: usize) -> Self {
        Self {
            body: Vec::new(),
            length_body: 0,
            part1_length: 0,
            gap_length: 0,
            grow_size: grow_size.max(1),
        }
    }

    /// Create an empty buffer with room for `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buffer = Self::new();
        buffer.body = vec![T::default(); capacity];
        buffer.gap_length = capacity;
        buffer
    }

    /// Create a buffer holding `len` copies of `value`.
    #[must_use]
    pub fn filled(len: usize, value: T) -> Self {
        let mut buffer = Self::new();
        buffer.body = vec![value; len];
        buffer.length_body = len;
        buffer.part1_length = len;
        buffer
    }

    /// Current growth increment.
    #[must_use]
    pub fn grow_size(&self) -> usize {
        self.grow_size
    }

    /// Set the growth increment used by the next reallocation.
    pub fn set_grow_size(&mut self, grow_size: usize) {
        self.grow_size = grow_size.max(1);
    }

    /// Number of elements stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length_body
    }

    /// True when no elements are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length_body == 0
    }

    /// Allocated size in elements, gap included.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.body.len()
    }

    /// Logical position of the gap.
    #[must_use]
    pub fn gap_position(&self) -> usize {
        self.part1_length
    }

    /// Move the gap so that it starts at logical `position`.
    ///
    /// This is the only place elements are relocated. Only the elements
    /// between the old and new gap position move.
    fn gap_to(&mut self, position: usize) {
        if position == self.part1_length {
            return;
        }
        if position < self.part1_length {
            // Slide [position, part1) up past the gap.
            self.body.copy_within(
                position..self.part1_length,
                position + self.gap_length,
            );
        } else {
            // Slide the first (position - part1) elements of part 2 down.
            let from = self.part1_length + self.gap_length;
            self.body
                .copy_within(from..position + self.gap_length, self.part1_length);
        }
        self.part1_length = position;
    }

    /// Make sure the gap can absorb `insertion_length` more elements.
    fn room_for(&mut self, insertion_length: usize) -> Result<()> {
        if self.gap_length <= insertion_length {
            let size = self.body.len();
            while self.grow_size < size / 6 {
                self.grow_size *= 2;
            }
            let new_size = size
                .checked_add(insertion_length)
                .and_then(|n| n.checked_add(self.grow_size))
                .ok_or_else(|| Error::capacity_overflow(insertion_length, size))?;
            self.reallocate(new_size)?;
        }
        Ok(())
    }

    /// Grow storage to `new_size` elements. Never shrinks.
    fn reallocate(&mut self, new_size: usize) -> Result<()> {
        let size = self.body.len();
        if new_size > size {
            let extra = new_size - size;
            self.body
                .try_reserve_exact(extra)
                .map_err(|e| Error::out_of_memory(extra, e))?;
            // With the gap at the end, new slots simply extend it.
            self.gap_to(self.length_body);
            self.body.resize(new_size, T::default());
            self.gap_length += extra;
        }
        Ok(())
    }

    /// Ensure storage for at least `new_size` elements.
    pub fn allocate(&mut self, new_size: usize) -> Result<()> {
        self.reallocate(new_size)
    }

    /// Ensure the next `additional` insertions cannot fail.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        if additional == 0 {
            return Ok(());
        }
        self.room_for(additional)
    }

    /// Element at `position`, or `T::default()` when out of range.
    #[must_use]
    pub fn value_at(&self, position: usize) -> T {
        if position < self.part1_length {
            self.body[position]
        } else if position < self.length_body {
            self.body[position + self.gap_length]
        } else {
            T::default()
        }
    }

    /// Overwrite the element at `position`. Out of range writes are ignored.
    pub fn set_value_at(&mut self, position: usize, value: T) {
        if position < self.part1_length {
            self.body[position] = value;
        } else if position < self.length_body {
            self.body[position + self.gap_length] = value;
        }
    }

    /// Insert one element. Positions past the end are ignored.
    pub fn insert(&mut self, position: usize, value: T) -> Result<()> {
        if position > self.length_body {
            return Ok(());
        }
        self.room_for(1)?;
        self.gap_to(position);
        self.body[self.part1_length] = value;
        self.length_body += 1;
        self.part1_length += 1;
        self.gap_length -= 1;
        Ok(())
    }

    /// Insert `insert_length` copies of `value`.
    pub fn insert_value(&mut self, position: usize, insert_length: usize, value: T) -> Result<()> {
        if insert_length == 0 || position > self.length_body {
            return Ok(());
        }
        self.room_for(insert_length)?;
        self.gap_to(position);
        self.body[self.part1_length..self.part1_length + insert_length].fill(value);
        self.length_body += insert_length;
        self.part1_length += insert_length;
        self.gap_length -= insert_length;
        Ok(())
    }

    /// Append default values until the buffer holds `wanted_length` elements.
    pub fn ensure_length(&mut self, wanted_length: usize) -> Result<()> {
        if self.length_body < wanted_length {
            self.insert_value(
                self.length_body,
                wanted_length - self.length_body,
                T::default(),
            )?;
        }
        Ok(())
    }

    /// Insert a copy of `values` at `position`.
    pub fn insert_from_slice(&mut self, position: usize, values: &[T]) -> Result<()> {
        if values.is_empty() || position > self.length_body {
            return Ok(());
        }
        self.room_for(values.len())?;
        self.gap_to(position);
        self.body[self.part1_length..self.part1_length + values.len()].copy_from_slice(values);
        self.length_body += values.len();
        self.part1_length += values.len();
        self.gap_length -= values.len();
        Ok(())
    }

    /// Delete one element.
    pub fn delete(&mut self, position: usize) {
        if position < self.length_body {
            self.delete_range(position, 1);
        }
    }

    /// Delete `delete_length` elements starting at `position`.
    ///
    /// Ranges extending past the end are ignored. Deleting everything
    /// releases the storage.
    pub fn delete_range(&mut self, position: usize, delete_length: usize) {
        let Some(end) = position.checked_add(delete_length) else {
            return;
        };
        if end > self.length_body {
            return;
        }
        if position == 0 && delete_length == self.length_body {
            self.body = Vec::new();
            self.length_body = 0;
            self.part1_length = 0;
            self.gap_length = 0;
        } else if delete_length > 0 {
            self.gap_to(position);
            self.length_body -= delete_length;
            self.gap_length += delete_length;
        }
    }

    /// Delete every element.
    pub fn delete_all(&mut self) {
        self.delete_range(0, self.length_body);
    }

    /// Copy `buffer.len()` elements starting at `position` into `buffer`.
    ///
    /// Slots beyond the stored range are filled with `T::default()`.
    pub fn get_range(&self, buffer: &mut [T], position: usize) {
        let available = self.length_body.saturating_sub(position).min(buffer.len());
        let (valid, rest) = buffer.split_at_mut(available);
        rest.fill(T::default());
        if available == 0 {
            return;
        }
        let range1_length = if position < self.part1_length {
            (self.part1_length - position).min(available)
        } else {
            0
        };
        valid[..range1_length].copy_from_slice(&self.body[position..position + range1_length]);
        let from = position + range1_length + self.gap_length;
        valid[range1_length..].copy_from_slice(&self.body[from..from + available - range1_length]);
    }

    /// Collect the stored elements into a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = vec![T::default(); self.length_body];
        self.get_range(&mut out, 0);
        out
    }

    /// Contiguous view of every element, moving the gap to the end.
    ///
    /// The view is invalidated by the next mutation.
    pub fn buffer_pointer(&mut self) -> &[T] {
        self.gap_to(self.length_body);
        &self.body[..self.length_body]
    }

    /// Contiguous view of `range_length` elements from `position`.
    ///
    /// The gap is only moved when it splits the requested range. The range
    /// is clamped to the stored elements.
    pub fn range_pointer(&mut self, position: usize, range_length: usize) -> &[T] {
        let position = position.min(self.length_body);
        let range_length = range_length.min(self.length_body - position);
        if position < self.part1_length {
            if position + range_length > self.part1_length {
                self.gap_to(position);
                let start = position + self.gap_length;
                &self.body[start..start + range_length]
            } else {
                &self.body[position..position + range_length]
            }
        } else {
            let start = position + self.gap_length;
            &self.body[start..start + range_length]
        }
    }
}

impl GapBuffer<isize> {
    /// Add `delta` to every element in `start..end` (clamped to the length).
    pub fn range_add_delta(&mut self, start: usize, end: usize, delta: isize) {
        let end = end.min(self.length_body);
        if start >= end || delta == 0 {
            return;
        }
        let split = self.part1_length.clamp(start, end);
        for value in &mut self.body[start..split] {
            *value += delta;
        }
        let gap = self.gap_length;
        for value in &mut self.body[split + gap..end + gap] {
            *value += delta;
        }
    }
}
