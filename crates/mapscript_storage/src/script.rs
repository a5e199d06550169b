//! The per-script record.
//!
//! A [`Script`] binds a [`ScriptId`] to its owning object, its loaded
//! program, its local variable window, and the transient context of the
//! procedure currently being run for it.

use bitflags::bitflags;
use mapscript_foundation::{BuiltTile, ObjectHandle, ProcKind, ScriptId, ScriptType, Value};
use mapscript_language::{Image, Program};

bitflags! {
    /// Script state.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ScriptFlags: u32 {
        /// The program is loaded and its procedure table located.
        const LOADED = 0x01;
        /// Not yet materialized on the map; spatial scans skip it.
        const DORMANT = 0x02;
        /// At least one procedure has been run.
        const EXECUTED = 0x04;
        /// Left out of registry saves.
        const SAVE_EXCLUDED = 0x08;
        /// Survives map exit.
        const PERSISTENT = 0x10;
        /// The program is checked out by the dispatcher. Never persisted.
        const RUNNING = 0x20;
    }
}

/// Type-specific data.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScriptPayload {
    /// System, item, and critter scripts carry nothing.
    None,
    /// A trigger area.
    Spatial {
        /// Center tile and elevation.
        built_tile: BuiltTile,
        /// Hex radius; zero means the center tile only.
        radius: i32,
    },
    /// A one-shot due time.
    Timed {
        /// Game time in ticks.
        time: i32,
    },
}

impl ScriptPayload {
    /// The default payload for a script type.
    #[must_use]
    pub fn for_type(script_type: Option<ScriptType>) -> Self {
        match script_type {
            Some(ScriptType::Spatial) => Self::Spatial {
                built_tile: BuiltTile::from_raw(-1),
                radius: -1,
            },
            Some(ScriptType::Timed) => Self::Timed { time: 0 },
            _ => Self::None,
        }
    }
}

/// Maps each procedure kind to a procedure index in the loaded image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProcTable([Option<usize>; ProcKind::TABLE_SIZE]);

impl Default for ProcTable {
    fn default() -> Self {
        Self([None; ProcKind::TABLE_SIZE])
    }
}

impl ProcTable {
    /// Locates every well-known procedure by name.
    #[must_use]
    pub fn locate(image: &Image) -> Self {
        let mut table = Self::default();
        for kind in ProcKind::ALL {
            table.0[kind.slot()] = image.find_procedure(kind.procedure_name());
        }
        table
    }

    /// The procedure index implementing `kind`, if any.
    #[must_use]
    pub fn get(&self, kind: ProcKind) -> Option<usize> {
        self.0[kind.slot()]
    }

    /// True if `kind` is implemented.
    #[must_use]
    pub fn implements(&self, kind: ProcKind) -> bool {
        self.get(kind).is_some()
    }
}

/// A registered script.
#[derive(Debug)]
pub struct Script {
    sid: ScriptId,
    /// Type-specific data.
    pub payload: ScriptPayload,
    /// State flags.
    pub flags: ScriptFlags,
    /// Index into the script catalog.
    pub script_index: i32,
    /// The loaded program, absent until first use or while checked out.
    pub program: Option<Box<Program>>,
    /// Persistent id of the owning object, or -1.
    pub owner_id: i32,
    /// The owning object.
    pub owner: Option<ObjectHandle>,
    /// The object that caused the current procedure to run.
    pub source: Option<ObjectHandle>,
    /// The object the current procedure acts on.
    pub target: Option<ObjectHandle>,
    /// First slot of the local variable window, or -1 if not allocated.
    pub local_vars_offset: i32,
    /// Size of the local variable window.
    pub local_vars_count: i32,
    /// Value returned by the last completed procedure.
    pub return_value: i32,
    /// The procedure kind being run.
    pub action: i32,
    /// Parameter passed by the trigger.
    pub fixed_param: i32,
    /// Skill or item being used, or -1.
    pub action_being_used: i32,
    /// Set by the script to suppress the engine's default behavior.
    pub overrides: i32,
    /// Unused; kept for the save layout.
    pub reserved: i32,
    /// Quantity for barter and damage procedures.
    pub how_much: i32,
    /// Catalog run-info flags.
    pub run_info_flags: i32,
    /// Procedure table, valid while [`ScriptFlags::LOADED`] is set.
    pub procs: ProcTable,
}

impl Script {
    /// Creates a script with every field at its initial value.
    #[must_use]
    pub fn new(sid: ScriptId) -> Self {
        Self {
            sid,
            payload: ScriptPayload::for_type(sid.script_type()),
            flags: ScriptFlags::empty(),
            script_index: -1,
            program: None,
            owner_id: -1,
            owner: None,
            source: None,
            target: None,
            local_vars_offset: -1,
            local_vars_count: 0,
            return_value: 0,
            action: 0,
            fixed_param: 0,
            action_being_used: -1,
            overrides: 0,
            reserved: 0,
            how_much: 0,
            run_info_flags: 0,
            procs: ProcTable::default(),
        }
    }

    /// The script's id.
    #[must_use]
    pub fn sid(&self) -> ScriptId {
        self.sid
    }

    /// The script's type.
    #[must_use]
    pub fn script_type(&self) -> Option<ScriptType> {
        self.sid.script_type()
    }

    /// Center of a spatial script's trigger area.
    #[must_use]
    pub fn built_tile(&self) -> Option<BuiltTile> {
        match self.payload {
            ScriptPayload::Spatial { built_tile, .. } => Some(built_tile),
            _ => None,
        }
    }

    /// Radius of a spatial script's trigger area.
    #[must_use]
    pub fn radius(&self) -> Option<i32> {
        match self.payload {
            ScriptPayload::Spatial { radius, .. } => Some(radius),
            _ => None,
        }
    }

    /// Places a spatial script's trigger area. Ignored for other types.
    pub fn set_spatial(&mut self, built_tile: BuiltTile, radius: i32) {
        if let ScriptPayload::Spatial { .. } = self.payload {
            self.payload = ScriptPayload::Spatial { built_tile, radius };
        }
    }

    /// True if the program is loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.flags.contains(ScriptFlags::LOADED)
    }

    /// The procedure implementing `kind`, if the program is loaded and has one.
    #[must_use]
    pub fn procedure(&self, kind: ProcKind) -> Option<usize> {
        if self.is_loaded() {
            self.procs.get(kind)
        } else {
            None
        }
    }

    /// The owner as a script value.
    #[must_use]
    pub fn owner_value(&self) -> Value {
        Value::object(self.owner)
    }

    /// Drops the program and everything derived from it.
    pub fn unload(&mut self) {
        self.program = None;
        self.procs = ProcTable::default();
        self.flags.remove(ScriptFlags::LOADED | ScriptFlags::RUNNING);
    }
}
