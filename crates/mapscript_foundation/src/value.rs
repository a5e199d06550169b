//! The interpreter's value type.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Fault, Result};
use crate::object::ObjectHandle;

/// A value on a program's stacks.
///
/// Integer zero doubles as the null object reference.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// 32-bit integer.
    Int(i32),
    /// 32-bit float.
    Float(f32),
    /// Immutable string.
    Str(Arc<str>),
    /// Reference to a game object.
    Object(ObjectHandle),
}

impl Value {
    /// The null object reference.
    pub const NULL: Value = Value::Int(0);

    /// Creates a string value.
    #[must_use]
    pub fn string(s: &str) -> Self {
        Self::Str(Arc::from(s))
    }

    /// Wraps an optional object, mapping `None` to the null reference.
    #[must_use]
    pub fn object(handle: Option<ObjectHandle>) -> Self {
        handle.map_or(Self::NULL, Self::Object)
    }

    /// Name of the value's type, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Object(_) => "object",
        }
    }

    /// Truthiness as tested by conditional jumps.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(_) | Self::Object(_) => true,
        }
    }

    /// Returns the value as an integer, truncating floats.
    ///
    /// # Errors
    ///
    /// Returns a fatal type mismatch for strings and objects.
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_int(&self) -> Result<i32> {
        match self {
            Self::Int(i) => Ok(*i),
            Self::Float(f) => Ok(*f as i32),
            other => Err(Error::fatal(Fault::TypeMismatch {
                expected: "int",
                actual: other.type_name(),
            })),
        }
    }

    /// Returns the referenced object, or `None` for the null reference.
    ///
    /// # Errors
    ///
    /// Returns a fatal type mismatch for anything other than an object or zero.
    pub fn as_object(&self) -> Result<Option<ObjectHandle>> {
        match self {
            Self::Object(h) => Ok(Some(*h)),
            Self::Int(0) => Ok(None),
            other => Err(Error::fatal(Fault::TypeMismatch {
                expected: "object",
                actual: other.type_name(),
            })),
        }
    }

    /// Returns the string contents.
    ///
    /// # Errors
    ///
    /// Returns a fatal type mismatch for non-strings.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(Error::fatal(Fault::TypeMismatch {
                expected: "string",
                actual: other.type_name(),
            })),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::NULL
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Int(i32::from(b))
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::Float(f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:.5}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Object(h) => write!(f, "{h}"),
        }
    }
}
