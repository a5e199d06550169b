//! Weak handles to game objects.

use std::fmt;

/// Handle to a game object owned by the host, with a generation counter.
///
/// Scripts never own the objects they reference. The host bumps the
/// generation when an object slot is reused, so a handle kept past the
/// object's destruction no longer compares equal to the new occupant.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectHandle {
    /// Slot index in the host's object table.
    pub index: u32,
    /// Generation of the slot when the handle was issued.
    pub generation: u32,
}

impl ObjectHandle {
    /// Creates a handle with the given index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectHandle({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.index)
    }
}
