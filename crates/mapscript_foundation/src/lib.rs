//! Core identifiers, handles, values, and errors for the mapscript runtime.
//!
//! This crate provides:
//! - [`ScriptId`] / [`ScriptType`] - Composite script identifiers
//! - [`ObjectHandle`] - Generational weak references to game objects
//! - [`ProcKind`] - The well-known procedure entry points a script may implement
//! - [`BuiltTile`] - Tile + elevation packing and hex distances
//! - [`GameTime`] - In-game clock ticks and calendar helpers
//! - [`Value`] - The interpreter's value type
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod object;
pub mod proc_kind;
pub mod sid;
pub mod tile;
pub mod time;
pub mod value;

pub use error::{Error, ErrorContext, ErrorKind, Fault, Result};
pub use object::ObjectHandle;
pub use proc_kind::ProcKind;
pub use sid::{ScriptId, ScriptType};
pub use tile::{BuiltTile, HEX_GRID_WIDTH, MIN_TRIGGER_TILE, hex_distance};
pub use time::{Epoch, GameTime};
pub use value::Value;
