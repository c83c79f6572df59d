//! Vector of unsigned integers stored at the narrowest width that holds the
//! largest value written so far.
//!
//! Histories made of short edits keep their positions and lengths in one or
//! two bytes per entry. The width only ever grows.

use crate::error::{Error, Result};

#[derive(Clone, Debug)]
enum Storage {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
}

macro_rules! each_width {
    ($storage:expr, $v:ident => $body:expr) => {
        match $storage {
            Storage::U8($v) => $body,
            Storage::U16($v) => $body,
            Storage::U32($v) => $body,
            Storage::U64($v) => $body,
        }
    };
}

/// Unsigned integers with auto-widening element size (1, 2, 4 or 8 bytes).
#[derive(Clone, Debug)]
pub struct ScaledVector {
    storage: Storage,
}

impl Default for ScaledVector {
    fn default() -> Self {
        Self::new()
    }
}

fn widened<S: Copy, D: From<S>>(values: &[S]) -> Result<Vec<D>> {
    let mut out = Vec::new();
    out.try_reserve_exact(values.len())
        .map_err(|e| Error::out_of_memory(values.len(), e))?;
    out.extend(values.iter().map(|&v| D::from(v)));
    Ok(out)
}

impl ScaledVector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Storage::U8(Vec::new()),
        }
    }

    /// `length` zero elements at the narrowest width.
    #[must_use]
    pub fn zeroed(length: usize) -> Self {
        Self {
            storage: Storage::U8(vec![0; length]),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        each_width!(&self.storage, v => v.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes per element.
    #[must_use]
    pub fn element_size(&self) -> usize {
        match self.storage {
            Storage::U8(_) => 1,
            Storage::U16(_) => 2,
            Storage::U32(_) => 4,
            Storage::U64(_) => 8,
        }
    }

    /// Largest value the current width can hold.
    #[must_use]
    pub fn element_max(&self) -> u64 {
        match self.storage {
            Storage::U8(_) => u64::from(u8::MAX),
            Storage::U16(_) => u64::from(u16::MAX),
            Storage::U32(_) => u64::from(u32::MAX),
            Storage::U64(_) => u64::MAX,
        }
    }

    /// Bytes used by the stored elements.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.len() * self.element_size()
    }

    /// Value at `index`, 0 when out of range.
    #[must_use]
    pub fn value_at(&self, index: usize) -> usize {
        let value = each_width!(&self.storage, v => v.get(index).map_or(0, |&x| u64::from(x)));
        usize::try_from(value).unwrap_or(usize::MAX)
    }

    /// Widen the element size until `value` fits.
    pub fn widen_for(&mut self, value: usize) -> Result<()> {
        let value = value as u64;
        while value > self.element_max() {
            self.storage = match &self.storage {
                Storage::U8(v) => Storage::U16(widened(v)?),
                Storage::U16(v) => Storage::U32(widened(v)?),
                Storage::U32(v) => Storage::U64(widened(v)?),
                Storage::U64(_) => break,
            };
        }
        Ok(())
    }

    /// Store `value` at `index`, widening first if needed. Out of range
    /// indices are ignored.
    #[allow(clippy::cast_possible_truncation)]
    pub fn set_value_at(&mut self, index: usize, value: usize) -> Result<()> {
        self.widen_for(value)?;
        // The width now holds `value`, so the casts are lossless.
        match &mut self.storage {
            Storage::U8(v) => {
                if let Some(slot) = v.get_mut(index) {
                    *slot = value as u8;
                }
            }
            Storage::U16(v) => {
                if let Some(slot) = v.get_mut(index) {
                    *slot = value as u16;
                }
            }
            Storage::U32(v) => {
                if let Some(slot) = v.get_mut(index) {
                    *slot = value as u32;
                }
            }
            Storage::U64(v) => {
                if let Some(slot) = v.get_mut(index) {
                    *slot = value as u64;
                }
            }
        }
        Ok(())
    }

    pub fn clear_value_at(&mut self, index: usize) {
        each_width!(&mut self.storage, v => {
            if let Some(slot) = v.get_mut(index) {
                *slot = 0;
            }
        });
    }

    /// Remove every element, keeping the current width.
    pub fn clear(&mut self) {
        each_width!(&mut self.storage, v => v.clear());
    }

    pub fn truncate(&mut self, length: usize) {
        each_width!(&mut self.storage, v => v.truncate(length));
    }

    /// Resize to `length` elements, new elements 0.
    pub fn resize(&mut self, length: usize) -> Result<()> {
        each_width!(&mut self.storage, v => {
            if length > v.len() {
                let extra = length - v.len();
                v.try_reserve(extra).map_err(|e| Error::out_of_memory(extra, e))?;
            }
            v.resize(length, 0);
        });
        Ok(())
    }

    /// Append a 0 element.
    pub fn push_back(&mut self) -> Result<()> {
        self.resize(self.len() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_narrow() {
        let mut sv = ScaledVector::new();
        sv.resize(4).unwrap();
        assert_eq!(sv.len(), 4);
        assert_eq!(sv.element_size(), 1);
        assert_eq!(sv.size_in_bytes(), 4);
        sv.set_value_at(2, 255).unwrap();
        assert_eq!(sv.element_size(), 1);
        assert_eq!(sv.value_at(2), 255);
    }

    #[test]
    fn test_widens_and_keeps_values() {
        let mut sv = ScaledVector::new();
        sv.resize(3).unwrap();
        sv.set_value_at(0, 7).unwrap();
        sv.set_value_at(1, 256).unwrap();
        assert_eq!(sv.element_size(), 2);
        assert_eq!(sv.value_at(0), 7);
        assert_eq!(sv.value_at(1), 256);

        sv.set_value_at(2, 70_000).unwrap();
        assert_eq!(sv.element_size(), 4);
        assert_eq!(sv.size_in_bytes(), 12);
        assert_eq!(sv.value_at(0), 7);
        assert_eq!(sv.value_at(2), 70_000);
    }

    #[test]
    fn test_never_narrows() {
        let mut sv = ScaledVector::new();
        sv.resize(1).unwrap();
        sv.set_value_at(0, 1 << 20).unwrap();
        sv.set_value_at(0, 1).unwrap();
        sv.clear_value_at(0);
        sv.clear();
        assert_eq!(sv.element_size(), 4);
        assert!(sv.is_empty());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_widest() {
        let mut sv = ScaledVector::new();
        sv.push_back().unwrap();
        sv.set_value_at(0, 1 << 40).unwrap();
        assert_eq!(sv.element_size(), 8);
        assert_eq!(sv.value_at(0), 1 << 40);
    }

    #[test]
    fn test_out_of_range() {
        let mut sv = ScaledVector::new();
        sv.set_value_at(5, 1).unwrap();
        assert_eq!(sv.value_at(5), 0);
        sv.push_back().unwrap();
        sv.push_back().unwrap();
        sv.truncate(1);
        assert_eq!(sv.len(), 1);
    }
}
