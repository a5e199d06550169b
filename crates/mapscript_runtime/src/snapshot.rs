//! Scheduler state snapshots using `MessagePack`.
//!
//! A snapshot captures what the binary map save does not: configuration,
//! the game clock, pending requests, exported variables, and the trigger
//! state. Timed events are included as well, so a snapshot alone can
//! restore the scheduler between maps.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use mapscript_engine::SchedulerState;
use mapscript_foundation::{Error, Result};

/// Serializes scheduler state to bytes using `MessagePack` format.
///
/// Uses named serialization to preserve struct field names.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(state: &SchedulerState) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(state).map_err(|e| Error::serialization(e.to_string()))
}

/// Deserializes scheduler state from `MessagePack` bytes.
///
/// # Errors
///
/// Returns an error if deserialization fails.
pub fn from_bytes(bytes: &[u8]) -> Result<SchedulerState> {
    rmp_serde::from_slice(bytes).map_err(|e| Error::serialization(e.to_string()))
}

/// Saves scheduler state to a file, replacing it if it exists.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to,
/// or if serialization fails.
pub fn save_to_file<P: AsRef<Path>>(state: &SchedulerState, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| Error::io(format!("failed to create file '{}': {e}", path.display())))?;

    let mut writer = BufWriter::new(file);
    let bytes = to_bytes(state)?;

    writer
        .write_all(&bytes)
        .map_err(|e| Error::io(format!("failed to write to file '{}': {e}", path.display())))?;
    writer
        .flush()
        .map_err(|e| Error::io(format!("failed to flush file '{}': {e}", path.display())))
}

/// Loads scheduler state from a `MessagePack` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or if deserialization fails.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<SchedulerState> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::io(format!("failed to open file '{}': {e}", path.display())))?;

    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io(format!("failed to read file '{}': {e}", path.display())))?;

    from_bytes(&bytes)
}
