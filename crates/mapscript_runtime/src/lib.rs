//! Persistence and tooling for mapscript.
//!
//! This crate provides:
//! - [`save`] - Big-endian binary map saves (registry, local variables, events)
//! - [`snapshot`] - `MessagePack` snapshots of scheduler state
//! - The `mapscript` CLI (`disasm`, `inspect`, `state`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod save;
pub mod snapshot;

pub use save::{load_map, load_map_file, map_from_bytes, map_to_bytes, save_map, save_map_file};
