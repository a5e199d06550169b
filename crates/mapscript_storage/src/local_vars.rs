//! The map's local variable array.
//!
//! Every script with local variables owns a contiguous window of this array.
//! Windows are appended on first use and removed by shifting everything after
//! them down; the registry fixes up the other scripts' offsets.

use mapscript_foundation::{Error, Result};

/// Contiguous storage for all scripts' local variables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalVars {
    values: Vec<i32>,
}

impl LocalVars {
    /// Creates an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps previously saved values.
    #[must_use]
    pub fn from_values(values: Vec<i32>) -> Self {
        Self { values }
    }

    /// Appends a zeroed window of `count` slots, returning its offset.
    ///
    /// # Errors
    ///
    /// Returns `AllocationExhausted` if the array cannot grow.
    pub fn allocate(&mut self, count: usize) -> Result<usize> {
        self.values
            .try_reserve(count)
            .map_err(|e| Error::allocation_exhausted(format!("local variables: {e}")))?;
        let offset = self.values.len();
        self.values.resize(offset + count, 0);
        Ok(offset)
    }

    /// Removes the window at `offset`, shifting later values down.
    ///
    /// Returns false if the window is not inside the array.
    pub fn release(&mut self, offset: usize, count: usize) -> bool {
        match offset.checked_add(count) {
            Some(end) if end <= self.values.len() => {
                self.values.drain(offset..end);
                true
            }
            _ => false,
        }
    }

    /// Reads one slot.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<i32> {
        self.values.get(index).copied()
    }

    /// Writes one slot. Returns false if out of range.
    pub fn set(&mut self, index: usize, value: i32) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no windows are allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All slots.
    #[must_use]
    pub fn as_slice(&self) -> &[i32] {
        &self.values
    }

    /// Frees everything.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}
