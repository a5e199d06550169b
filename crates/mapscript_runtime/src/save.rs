//! Binary map saves.
//!
//! A map save holds three sections, each a sequence of big-endian `i32`s:
//!
//! 1. The registry. For every script type in storage order: the live count,
//!    then `ceil(count / 16)` extents. An extent is 16 fixed-size records
//!    (unused slots zeroed) followed by the number of used slots and a zero
//!    link word. Save-excluded scripts are left out.
//! 2. Local variables: the slot count, then every slot.
//! 3. Timed events: the event count, then per event its time, type code,
//!    owner object id (or -2), and payload.
//!
//! Transient state is never written: programs, object handles, and the
//! loaded and running flags. Loading leaves every script unloaded; owners
//! are rebound from their persistent ids.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use mapscript_engine::{Event, EventKind, EventQueue, Scheduler, World};
use mapscript_foundation::{BuiltTile, Error, GameTime, Result, ScriptId, ScriptType};
use mapscript_storage::{
    EXTENT_SIZE, Extent, LocalVars, Script, ScriptFlags, ScriptPayload, ScriptRegistry,
};

/// Flags that describe the live session and are dropped on save.
const TRANSIENT_FLAGS: ScriptFlags = ScriptFlags::LOADED.union(ScriptFlags::RUNNING);

/// Words in a record shared by every script type.
const RECORD_BASE_WORDS: usize = 16;

/// Upper bound on speculative preallocation while reading counts.
const PREALLOC_LIMIT: usize = 4_096;

// =============================================================================
// Whole map
// =============================================================================

/// Writes the scheduler's registry, local variables, and timed events.
///
/// # Errors
///
/// Returns an I/O error if the writer fails.
pub fn save_map<W: Write>(writer: &mut W, scheduler: &Scheduler) -> Result<()> {
    write_registry(writer, scheduler.registry())?;
    write_local_vars(writer, scheduler.registry().local_vars())?;
    write_events(writer, scheduler.events())
}

/// Replaces the scheduler's scripts, local variables, and timed events
/// with a saved map, then rebinds owners through `world`.
///
/// Background programs are dropped. Nothing is changed if the save is
/// malformed.
///
/// # Errors
///
/// Returns a serialization error for truncated or corrupt data.
pub fn load_map<R: Read>(
    reader: &mut R,
    scheduler: &mut Scheduler,
    world: &dyn World,
) -> Result<()> {
    let scripts = read_scripts(reader, true)?;
    let local_vars = read_local_vars(reader)?;
    let events = read_events(reader)?;

    scheduler.clear_programs();
    let registry = scheduler.registry_mut();
    restore(registry, scripts);
    registry.set_local_vars(local_vars);
    *scheduler.events_mut() = events;
    scheduler.rebind_owners(world);
    log::debug!(
        "loaded {} scripts, {} events",
        scheduler.registry().len(),
        scheduler.events().len()
    );
    Ok(())
}

/// Encodes a map save in memory.
///
/// # Errors
///
/// Fails only if encoding fails.
pub fn map_to_bytes(scheduler: &Scheduler) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    save_map(&mut bytes, scheduler)?;
    Ok(bytes)
}

/// Loads a map save from memory. See [`load_map`].
///
/// # Errors
///
/// Returns a serialization error for truncated or corrupt data.
pub fn map_from_bytes(bytes: &[u8], scheduler: &mut Scheduler, world: &dyn World) -> Result<()> {
    let mut reader = bytes;
    load_map(&mut reader, scheduler, world)?;
    if !reader.is_empty() {
        log::warn!("{} trailing bytes after map save", reader.len());
    }
    Ok(())
}

/// Writes a map save to a file, replacing it if it exists.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be created or written.
pub fn save_map_file<P: AsRef<Path>>(path: P, scheduler: &Scheduler) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| Error::io(format!("failed to create '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    save_map(&mut writer, scheduler)?;
    writer
        .flush()
        .map_err(|e| Error::io(format!("failed to flush '{}': {e}", path.display())))
}

/// Reads a map save from a file. See [`load_map`].
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened, or a serialization
/// error for corrupt data.
pub fn load_map_file<P: AsRef<Path>>(
    path: P,
    scheduler: &mut Scheduler,
    world: &dyn World,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::io(format!("failed to open '{}': {e}", path.display())))?;
    load_map(&mut BufReader::new(file), scheduler, world)
}

// =============================================================================
// Registry
// =============================================================================

/// Writes every script not flagged save-excluded.
///
/// Each excluded script trades places with the last live script behind it,
/// so the live scripts form a prefix that is saved in that order. The swap
/// happens on a copy; the in-memory extent order is untouched.
///
/// # Errors
///
/// Returns an I/O error if the writer fails.
pub fn write_registry<W: Write>(writer: &mut W, registry: &ScriptRegistry) -> Result<()> {
    for script_type in ScriptType::ALL {
        let live = save_order(registry.iter(script_type).collect());
        put(writer, word(live.len())?)?;
        for chunk in live.chunks(EXTENT_SIZE) {
            for script in chunk {
                write_script(writer, script)?;
            }
            for _ in chunk.len()..EXTENT_SIZE {
                write_blank(writer, script_type)?;
            }
            put(writer, word(chunk.len())?)?;
            put(writer, 0)?;
        }
    }
    Ok(())
}

/// Moves excluded scripts behind the live ones and drops them.
fn save_order(mut scripts: Vec<&Script>) -> Vec<&Script> {
    let excluded = |s: &Script| s.flags.contains(ScriptFlags::SAVE_EXCLUDED);
    let mut end = scripts.len();
    let mut i = 0;
    while i < end {
        if excluded(scripts[i]) {
            while end > i + 1 && excluded(scripts[end - 1]) {
                end -= 1;
            }
            end -= 1;
            scripts.swap(i, end);
        }
        if !excluded(scripts[i]) {
            i += 1;
        }
    }
    scripts.truncate(end);
    scripts
}

/// Replaces the registry's scripts with saved ones.
///
/// When `keep_local_vars` is false the map carries no local variables, and
/// every script's window is reset so it is allocated afresh on first use.
///
/// # Errors
///
/// Returns a serialization error for truncated or corrupt data; the
/// registry is untouched in that case.
pub fn read_registry<R: Read>(
    reader: &mut R,
    registry: &mut ScriptRegistry,
    keep_local_vars: bool,
) -> Result<()> {
    let scripts = read_scripts(reader, keep_local_vars)?;
    restore(registry, scripts);
    Ok(())
}

fn restore(registry: &mut ScriptRegistry, scripts: Vec<(ScriptType, Vec<Extent>)>) {
    for (script_type, extents) in scripts {
        registry.restore_extents(script_type, extents);
    }
}

fn read_scripts<R: Read>(
    reader: &mut R,
    keep_local_vars: bool,
) -> Result<Vec<(ScriptType, Vec<Extent>)>> {
    let mut types = Vec::with_capacity(ScriptType::COUNT);
    for script_type in ScriptType::ALL {
        let count = length(take(reader)?, "script count")?;
        let mut remaining = count;
        let mut extents = Vec::with_capacity(count.div_ceil(EXTENT_SIZE).min(PREALLOC_LIMIT));
        while remaining > 0 {
            let mut records = Vec::with_capacity(EXTENT_SIZE);
            for _ in 0..EXTENT_SIZE {
                records.push(read_script(reader, script_type)?);
            }
            let used = length(take(reader)?, "extent length")?;
            let _link = take(reader)?;
            if used == 0 || used > EXTENT_SIZE || used > remaining {
                return Err(corrupt(format!("{script_type} extent of {used} scripts")));
            }
            records.truncate(used);
            for script in &mut records {
                validate(script, script_type)?;
                if !keep_local_vars {
                    script.local_vars_offset = -1;
                    script.local_vars_count = 0;
                }
            }
            extents.push(Extent::from_scripts(records)?);
            remaining -= used;
        }
        log::trace!("read {count} {script_type} scripts");
        types.push((script_type, extents));
    }
    Ok(types)
}

fn validate(script: &Script, script_type: ScriptType) -> Result<()> {
    if script.script_type() == Some(script_type) {
        Ok(())
    } else {
        Err(corrupt(format!(
            "{:?} stored with {script_type} scripts",
            script.sid()
        )))
    }
}

fn write_script<W: Write>(writer: &mut W, script: &Script) -> Result<()> {
    put(writer, script.sid().raw())?;
    put(writer, 0)?;
    match script.payload {
        ScriptPayload::Spatial { built_tile, radius } => {
            put(writer, built_tile.raw())?;
            put(writer, radius)?;
        }
        ScriptPayload::Timed { time } => put(writer, time)?,
        ScriptPayload::None => {}
    }
    writer
        .write_u32::<BigEndian>(script.flags.difference(TRANSIENT_FLAGS).bits())
        .map_err(write_error)?;
    for value in [
        script.script_index,
        0,
        script.owner_id,
        script.local_vars_offset,
        script.local_vars_count,
        script.return_value,
        script.action,
        script.fixed_param,
        script.action_being_used,
        script.overrides,
        script.reserved,
        script.how_much,
        script.run_info_flags,
    ] {
        put(writer, value)?;
    }
    Ok(())
}

fn write_blank<W: Write>(writer: &mut W, script_type: ScriptType) -> Result<()> {
    for _ in 0..record_words(script_type) {
        put(writer, 0)?;
    }
    Ok(())
}

fn read_script<R: Read>(reader: &mut R, script_type: ScriptType) -> Result<Script> {
    let sid = ScriptId::from_raw(take(reader)?);
    let _link = take(reader)?;
    let payload = match script_type {
        ScriptType::Spatial => ScriptPayload::Spatial {
            built_tile: BuiltTile::from_raw(take(reader)?),
            radius: take(reader)?,
        },
        ScriptType::Timed => ScriptPayload::Timed {
            time: take(reader)?,
        },
        _ => ScriptPayload::None,
    };
    let flags = reader.read_u32::<BigEndian>().map_err(read_error)?;

    let mut script = Script::new(sid);
    script.payload = payload;
    script.flags = ScriptFlags::from_bits_retain(flags).difference(TRANSIENT_FLAGS);
    script.script_index = take(reader)?;
    let _program = take(reader)?;
    script.owner_id = take(reader)?;
    script.local_vars_offset = take(reader)?;
    script.local_vars_count = take(reader)?;
    script.return_value = take(reader)?;
    script.action = take(reader)?;
    script.fixed_param = take(reader)?;
    script.action_being_used = take(reader)?;
    script.overrides = take(reader)?;
    script.reserved = take(reader)?;
    script.how_much = take(reader)?;
    script.run_info_flags = take(reader)?;
    Ok(script)
}

/// Record size in words for a script type.
fn record_words(script_type: ScriptType) -> usize {
    RECORD_BASE_WORDS
        + match ScriptPayload::for_type(Some(script_type)) {
            ScriptPayload::Spatial { .. } => 2,
            ScriptPayload::Timed { .. } => 1,
            ScriptPayload::None => 0,
        }
}

// =============================================================================
// Local variables
// =============================================================================

/// Writes the local variable array.
///
/// # Errors
///
/// Returns an I/O error if the writer fails.
pub fn write_local_vars<W: Write>(writer: &mut W, local_vars: &LocalVars) -> Result<()> {
    put(writer, word(local_vars.len())?)?;
    for &value in local_vars.as_slice() {
        put(writer, value)?;
    }
    Ok(())
}

/// Reads a local variable array.
///
/// # Errors
///
/// Returns a serialization error for truncated data or a negative count.
pub fn read_local_vars<R: Read>(reader: &mut R) -> Result<LocalVars> {
    let count = length(take(reader)?, "local variable count")?;
    let mut values = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    for _ in 0..count {
        values.push(take(reader)?);
    }
    Ok(LocalVars::from_values(values))
}

// =============================================================================
// Events
// =============================================================================

/// Writes the timed event queue in due order.
///
/// # Errors
///
/// Returns an I/O error if the writer fails.
pub fn write_events<W: Write>(writer: &mut W, events: &EventQueue) -> Result<()> {
    put(writer, word(events.len())?)?;
    for event in events.iter() {
        writer
            .write_u32::<BigEndian>(event.time.0)
            .map_err(write_error)?;
        put(writer, event.kind.code())?;
        put(writer, event.owner_id)?;
        if let EventKind::Script { sid, fixed_param } = event.kind {
            put(writer, sid.raw())?;
            put(writer, fixed_param)?;
        }
    }
    Ok(())
}

/// Reads a timed event queue. Owners are left unbound.
///
/// # Errors
///
/// Returns a serialization error for truncated data or an unknown event type.
pub fn read_events<R: Read>(reader: &mut R) -> Result<EventQueue> {
    let count = length(take(reader)?, "event count")?;
    let mut queue = EventQueue::new();
    for _ in 0..count {
        let time = GameTime(reader.read_u32::<BigEndian>().map_err(read_error)?);
        let code = take(reader)?;
        let owner_id = take(reader)?;
        let kind = match code {
            EventKind::SCRIPT_CODE => EventKind::Script {
                sid: ScriptId::from_raw(take(reader)?),
                fixed_param: take(reader)?,
            },
            EventKind::MAP_UPDATE_CODE => EventKind::MapUpdate,
            other => return Err(corrupt(format!("unknown event type {other}"))),
        };
        let mut event = Event::new(time, kind);
        event.owner_id = owner_id;
        queue.push(event);
    }
    Ok(queue)
}

// =============================================================================
// Helpers
// =============================================================================

fn put<W: Write>(writer: &mut W, value: i32) -> Result<()> {
    writer.write_i32::<BigEndian>(value).map_err(write_error)
}

fn take<R: Read>(reader: &mut R) -> Result<i32> {
    reader.read_i32::<BigEndian>().map_err(read_error)
}

fn word(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::serialization(format!("{len} entries do not fit a save")))
}

fn length(value: i32, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| corrupt(format!("negative {what} {value}")))
}

fn corrupt(message: String) -> Error {
    Error::serialization(format!("corrupt map save: {message}"))
}

fn read_error(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::serialization("truncated map save")
    } else {
        Error::io(e.to_string())
    }
}

fn write_error(e: io::Error) -> Error {
    Error::io(e.to_string())
}
