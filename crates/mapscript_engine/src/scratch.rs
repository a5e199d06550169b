//! Scratch arrays that live until the next request drain.

use mapscript_foundation::{Error, ErrorKind, Result, Value};

/// Arrays allocated by scripts during one tick.
#[derive(Clone, Debug, Default)]
pub struct TempArrays {
    arrays: Vec<Vec<Value>>,
}

impl TempArrays {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a null-filled array and returns its id.
    ///
    /// # Errors
    ///
    /// Fails for a negative length or when memory is exhausted.
    pub fn allocate(&mut self, len: i32) -> Result<i32> {
        let len = usize::try_from(len).map_err(|_| bad(format!("array length {len}")))?;
        let mut array = Vec::new();
        array
            .try_reserve_exact(len)
            .map_err(|_| Error::allocation_exhausted("temporary array"))?;
        array.resize(len, Value::NULL);
        let id = i32::try_from(self.arrays.len()).map_err(|_| bad("too many arrays".to_string()))?;
        self.arrays.push(array);
        Ok(id)
    }

    /// Reads an element.
    ///
    /// # Errors
    ///
    /// Fails for an unknown id or an out-of-range index.
    pub fn get(&self, id: i32, index: i32) -> Result<Value> {
        self.slot(id, index)
            .and_then(|(a, i)| self.arrays[a].get(i).cloned().ok_or_else(|| out_of_range(id, index)))
    }

    /// Writes an element.
    ///
    /// # Errors
    ///
    /// Fails for an unknown id or an out-of-range index.
    pub fn set(&mut self, id: i32, index: i32, value: Value) -> Result<()> {
        let (a, i) = self.slot(id, index)?;
        let cell = self.arrays[a]
            .get_mut(i)
            .ok_or_else(|| out_of_range(id, index))?;
        *cell = value;
        Ok(())
    }

    /// Frees every array.
    pub fn clear(&mut self) {
        self.arrays.clear();
    }

    /// Number of live arrays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// True if no arrays are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    fn slot(&self, id: i32, index: i32) -> Result<(usize, usize)> {
        let array = usize::try_from(id)
            .ok()
            .filter(|&a| a < self.arrays.len())
            .ok_or_else(|| bad(format!("no temporary array {id}")))?;
        let index = usize::try_from(index).map_err(|_| out_of_range(id, index))?;
        Ok((array, index))
    }
}

fn bad(message: String) -> Error {
    Error::new(ErrorKind::Internal(message))
}

fn out_of_range(id: i32, index: i32) -> Error {
    bad(format!("index {index} out of range for temporary array {id}"))
}
