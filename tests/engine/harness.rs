//! Shared fixtures: compiled scripts in a temporary directory and a game
//! that records the requests applied to it.

use std::collections::HashMap;

use mapscript_engine::{
    CombatRequest, DirectorySource, ElevatorRequest, ExplosionRequest, GameClock, RequestHandler,
    Scheduler, TransferRequest, World,
};
use mapscript_foundation::{BuiltTile, GameTime, ObjectHandle, ScriptId, ScriptType};
use mapscript_language::{HostOp, ImageBuilder, Opcode};
use mapscript_storage::{ScriptCatalog, ScriptRegistry};
use tempfile::TempDir;

/// A script directory and the catalog describing it.
pub struct Fixture {
    dir: TempDir,
    catalog: ScriptCatalog,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            catalog: ScriptCatalog::new(),
        }
    }

    /// Compiles a script to `<name>.int` and lists it, returning its index.
    pub fn script(
        &mut self,
        name: &str,
        local_vars: i32,
        build: impl FnOnce(&mut ImageBuilder),
    ) -> i32 {
        let file = format!("{name}.int");
        let mut b = ImageBuilder::new(file.clone());
        build(&mut b);
        std::fs::write(self.dir.path().join(file), b.finish().unwrap()).unwrap();
        self.catalog.push(name, local_vars)
    }

    /// Deletes a compiled script, leaving its catalog entry.
    pub fn forget(&self, name: &str) {
        std::fs::remove_file(self.dir.path().join(format!("{name}.int"))).unwrap();
    }

    /// A scheduler reading this directory, with the clock at zero.
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(DirectorySource::new(self.dir.path()))
            .with_registry(ScriptRegistry::new().with_catalog(self.catalog.clone()))
            .with_clock(GameClock::at(GameTime(0)))
    }
}

pub fn attach(s: &mut Scheduler, script_type: ScriptType, script_index: i32) -> ScriptId {
    let sid = s.add_script(script_type).unwrap();
    s.registry_mut().get_mut(sid).unwrap().script_index = script_index;
    sid
}

pub fn local(s: &mut Scheduler, sid: ScriptId, index: i32) -> i32 {
    s.registry_mut().get_local_var(sid, index).unwrap()
}

/// Emits `local_var(index) += 1`.
pub fn bump(b: &mut ImageBuilder, index: i32) {
    b.push_int(index)
        .push_int(index)
        .host(HostOp::LocalVar)
        .push_int(1)
        .op(Opcode::Add)
        .host(HostOp::SetLocalVar);
}

#[derive(Default)]
pub struct Game {
    pub locations: HashMap<ObjectHandle, BuiltTile>,
    pub dialog: bool,
    pub combat: bool,
    pub applied: Vec<&'static str>,
}

impl World for Game {
    fn object_location(&self, object: ObjectHandle) -> Option<BuiltTile> {
        self.locations.get(&object).copied()
    }

    fn in_combat(&self) -> bool {
        self.combat
    }

    fn dialog_active(&self) -> bool {
        self.dialog
    }
}

impl RequestHandler for Game {
    fn enter_combat(&mut self, _request: Option<CombatRequest>) -> bool {
        self.applied.push("combat");
        self.combat = true;
        true
    }
    fn town_map(&mut self) {
        self.applied.push("town");
    }
    fn world_map(&mut self) {
        self.applied.push("world");
    }
    fn elevator(&mut self, _request: ElevatorRequest) {
        self.applied.push("elevator");
    }
    fn explosion(&mut self, _request: ExplosionRequest) {
        self.applied.push("explosion");
    }
    fn dialog(&mut self, _with: Option<ObjectHandle>) {
        self.applied.push("dialog");
    }
    fn endgame(&mut self) {
        self.applied.push("endgame");
    }
    fn looting(&mut self, _request: TransferRequest) {
        self.applied.push("looting");
    }
    fn stealing(&mut self, _request: TransferRequest) {
        self.applied.push("stealing");
    }
}
