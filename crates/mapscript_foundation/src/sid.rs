//! Composite script identifiers.
//!
//! A script id packs the script's type into the top 8 bits and a sequential
//! index within that type into the low 24 bits. Ids are unique within their
//! type for the lifetime of the current map.

use std::fmt;

/// Number of bits reserved for the per-type index.
pub const INDEX_BITS: u32 = 24;

/// Mask selecting the per-type index.
pub const INDEX_MASK: i32 = (1 << INDEX_BITS) - 1;

/// The kind of trigger a script responds to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ScriptType {
    /// Map scripts and other scripts not attached to an object.
    System = 0,
    /// Tile-triggered scripts.
    Spatial = 1,
    /// Scripts with an absolute due time.
    Timed = 2,
    /// Scripts attached to items and scenery.
    Item = 3,
    /// Scripts attached to critters.
    Critter = 4,
}

impl ScriptType {
    /// All script types, in storage order.
    pub const ALL: [ScriptType; 5] = [
        ScriptType::System,
        ScriptType::Spatial,
        ScriptType::Timed,
        ScriptType::Item,
        ScriptType::Critter,
    ];

    /// Number of script types.
    pub const COUNT: usize = Self::ALL.len();

    /// Converts a raw type number.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::System),
            1 => Some(Self::Spatial),
            2 => Some(Self::Timed),
            3 => Some(Self::Item),
            4 => Some(Self::Critter),
            _ => None,
        }
    }

    /// Index of this type in per-type tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Spatial => "spatial",
            Self::Timed => "timed",
            Self::Item => "item",
            Self::Critter => "critter",
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Composite script identifier.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScriptId(i32);

impl ScriptId {
    /// Creates an id from a type and a per-type index.
    #[must_use]
    pub const fn new(script_type: ScriptType, index: i32) -> Self {
        Self(((script_type as i32) << INDEX_BITS) | (index & INDEX_MASK))
    }

    /// Wraps a raw id as stored on disk.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw packed id.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Returns the script type, or `None` for a corrupt id.
    #[must_use]
    pub const fn script_type(self) -> Option<ScriptType> {
        ScriptType::from_raw(self.0 >> INDEX_BITS)
    }

    /// Returns the per-type index.
    #[must_use]
    pub const fn index(self) -> i32 {
        self.0 & INDEX_MASK
    }
}

impl fmt::Debug for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.script_type() {
            Some(t) => write!(f, "ScriptId({t}:{})", self.index()),
            None => write!(f, "ScriptId({:#x})", self.0),
        }
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
