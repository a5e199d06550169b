//! Script registry, local variables, and script catalog for mapscript.
//!
//! This crate provides:
//! - [`Script`] - The per-script record: payload, flags, owner, program, call context
//! - [`ScriptRegistry`] - Per-type extent lists with O(1) append and swap-compaction
//! - [`LocalVars`] - The map-wide local variable array
//! - [`ScriptCatalog`] - Script index to image name and local variable count

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod local_vars;
pub mod registry;
pub mod script;

pub use catalog::{CatalogEntry, ScriptCatalog};
pub use local_vars::LocalVars;
pub use registry::{EXTENT_SIZE, Extent, ScriptRegistry};
pub use script::{ProcTable, Script, ScriptFlags, ScriptPayload};
