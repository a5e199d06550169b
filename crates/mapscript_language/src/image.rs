//! Bytecode images.
//!
//! An image is a single big-endian blob:
//!
//! ```text
//! 0x00  prologue code (42 bytes), execution starts here
//! 0x2A  u32 procedure count, then 24-byte procedure entries:
//!       name offset, flags, time, condition address, body address, arg count
//!       u32 identifier block size, then NUL-terminated identifiers
//!       u32 string block size, then NUL-terminated static strings
//!       code
//! ```
//!
//! Name and string offsets are relative to the start of their block's data.
//! Code addresses are absolute offsets into the image.

use std::path::Path;

use bitflags::bitflags;
use byteorder::{BigEndian, ByteOrder};
use mapscript_foundation::{Error, Result};

/// Size of the prologue that precedes the procedure table.
pub const PROLOGUE_SIZE: usize = 42;

/// Size of one procedure table entry.
pub const PROCEDURE_ENTRY_SIZE: usize = 24;

bitflags! {
    /// Procedure attributes recorded in the table.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ProcedureFlags: u32 {
        /// Runs at a scheduled time.
        const TIMED = 0x01;
        /// Runs when its condition becomes true.
        const CONDITIONAL = 0x02;
        /// Defined in another program.
        const IMPORTED = 0x04;
        /// Visible to other programs.
        const EXPORTED = 0x08;
        /// Runs with the critical flag set.
        const CRITICAL = 0x10;
    }
}

/// A procedure table entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Procedure {
    /// Procedure name.
    pub name: String,
    /// Attributes.
    pub flags: ProcedureFlags,
    /// Scheduled time for timed procedures.
    pub time: u32,
    /// Condition code address for conditional procedures.
    pub condition_address: usize,
    /// Address of the first instruction of the body.
    pub body_address: usize,
    /// Declared number of arguments.
    pub arg_count: usize,
}

/// A parsed, immutable bytecode image shared by every program loaded from it.
#[derive(Clone, Debug)]
pub struct Image {
    name: String,
    data: Vec<u8>,
    procedures: Vec<Procedure>,
    strings: (usize, usize),
    code_start: usize,
}

impl Image {
    /// Parses an image.
    ///
    /// # Errors
    ///
    /// Returns a load error if any table runs past the end of the data or a
    /// procedure name cannot be resolved.
    pub fn parse(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let fail = |reason: &str| Error::load(name.clone(), reason);

        let count = read_len(&data, PROLOGUE_SIZE).ok_or_else(|| fail("truncated header"))?;
        let table = PROLOGUE_SIZE + 4;
        let table_end = count
            .checked_mul(PROCEDURE_ENTRY_SIZE)
            .and_then(|n| n.checked_add(table))
            .filter(|&end| end <= data.len())
            .ok_or_else(|| fail("procedure table overruns image"))?;

        let identifiers = block(&data, table_end).ok_or_else(|| fail("bad identifier block"))?;
        let strings = block(&data, identifiers.1).ok_or_else(|| fail("bad string block"))?;
        let code_start = strings.1;

        let mut procedures = Vec::with_capacity(count);
        for i in 0..count {
            let at = table + i * PROCEDURE_ENTRY_SIZE;
            let field = |n: usize| BigEndian::read_u32(&data[at + n * 4..at + n * 4 + 4]);
            let proc_name = cstr(&data, identifiers, field(0) as usize)
                .ok_or_else(|| fail(&format!("procedure {i} has no name")))?;
            let body_address = field(4) as usize;
            if body_address >= data.len() {
                return Err(fail(&format!("procedure '{proc_name}' starts past the end")));
            }
            procedures.push(Procedure {
                name: proc_name.to_string(),
                flags: ProcedureFlags::from_bits_truncate(field(1)),
                time: field(2),
                condition_address: field(3) as usize,
                body_address,
                arg_count: field(5) as usize,
            });
        }

        Ok(Self {
            name,
            data,
            procedures,
            strings,
            code_start,
        })
    }

    /// Reads and parses an image from disk.
    ///
    /// # Errors
    ///
    /// Returns a load error if the file cannot be read or is malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let data = std::fs::read(path).map_err(|e| Error::load(name.clone(), e.to_string()))?;
        Self::parse(name, data)
    }

    /// The image's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw image bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// The procedure table.
    #[must_use]
    pub fn procedures(&self) -> &[Procedure] {
        &self.procedures
    }

    /// A procedure by index.
    #[must_use]
    pub fn procedure(&self, index: usize) -> Option<&Procedure> {
        self.procedures.get(index)
    }

    /// Index of the procedure with the given name.
    #[must_use]
    pub fn find_procedure(&self, name: &str) -> Option<usize> {
        self.procedures.iter().position(|p| p.name == name)
    }

    /// A static string by offset.
    #[must_use]
    pub fn static_string(&self, offset: usize) -> Option<&str> {
        cstr(&self.data, self.strings, offset)
    }

    /// Address of the first byte after the tables.
    #[must_use]
    pub fn code_start(&self) -> usize {
        self.code_start
    }

    /// Reads the instruction word at `addr`.
    #[must_use]
    pub fn read_word(&self, addr: usize) -> Option<u16> {
        self.data.get(addr..addr + 2).map(BigEndian::read_u16)
    }

    /// Reads the literal operand at `addr`.
    #[must_use]
    pub fn read_operand(&self, addr: usize) -> Option<u32> {
        self.data.get(addr..addr + 4).map(BigEndian::read_u32)
    }
}

fn read_len(data: &[u8], at: usize) -> Option<usize> {
    data.get(at..at + 4).map(|b| BigEndian::read_u32(b) as usize)
}

/// Returns the `(start, end)` of the sized block whose length word is at `at`.
fn block(data: &[u8], at: usize) -> Option<(usize, usize)> {
    let size = read_len(data, at)?;
    let start = at + 4;
    let end = start.checked_add(size)?;
    (end <= data.len()).then_some((start, end))
}

fn cstr(data: &[u8], (start, end): (usize, usize), offset: usize) -> Option<&str> {
    let from = start.checked_add(offset)?;
    if from >= end {
        return None;
    }
    let bytes = &data[from..end];
    let len = bytes.iter().position(|&b| b == 0)?;
    std::str::from_utf8(&bytes[..len]).ok()
}
