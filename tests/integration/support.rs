//! Fixtures shared by the cross-layer tests.

use std::collections::HashMap;
use std::path::Path;

use mapscript_engine::{DirectorySource, GameClock, Scheduler, World};
use mapscript_foundation::{BuiltTile, GameTime, ObjectHandle, ScriptId, ScriptType};
use mapscript_language::{HostOp, ImageBuilder, Opcode};
use mapscript_storage::{ScriptCatalog, ScriptRegistry};

/// Compiled scripts for a small town map, and their catalog.
pub struct Town {
    pub dir: tempfile::TempDir,
    pub catalog: ScriptCatalog,
}

/// Catalog indices in [`Town`].
pub const COUNTER: i32 = 0;
pub const BEACON: i32 = 1;
pub const TRAP: i32 = 2;
pub const GUARD: i32 = 3;

fn compile(dir: &Path, name: &str, build: impl FnOnce(&mut ImageBuilder)) {
    let file = format!("{name}.int");
    let mut b = ImageBuilder::new(file.clone());
    build(&mut b);
    std::fs::write(dir.join(file), b.finish().unwrap()).unwrap();
}

/// Emits `local_var(index) += 1`.
fn bump(b: &mut ImageBuilder, index: i32) {
    b.push_int(index)
        .push_int(index)
        .host(HostOp::LocalVar)
        .push_int(1)
        .op(Opcode::Add)
        .host(HostOp::SetLocalVar);
}

impl Town {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        compile(dir.path(), "counter", |b| {
            b.procedure("use_p_proc", 0);
            bump(b, 0);
            b.ret_int(0);
        });
        compile(dir.path(), "beacon", |b| {
            b.procedure("timed_event_p_proc", 0);
            bump(b, 0);
            b.push_int(1).host(HostOp::FixedParam).host(HostOp::SetLocalVar);
            b.ret_int(0);
        });
        compile(dir.path(), "trap", |b| {
            b.procedure("spatial_p_proc", 0);
            bump(b, 0);
            b.ret_int(0);
        });
        compile(dir.path(), "guard", |b| {
            b.procedure("start", 0).ret_int(0);
            b.procedure("map_exit_p_proc", 0);
            bump(b, 1);
            b.ret_int(0);
        });
        let catalog = ScriptCatalog::parse(
            "counter.int # local_vars=1\n\
             beacon.int # local_vars=2\n\
             trap.int # local_vars=1\n\
             guard.int # local_vars=2\n",
        );
        Self { dir, catalog }
    }

    /// A fresh scheduler for the town, with the clock at `time`.
    pub fn scheduler(&self, time: u32) -> Scheduler {
        Scheduler::new(DirectorySource::new(self.dir.path()))
            .with_registry(ScriptRegistry::new().with_catalog(self.catalog.clone()))
            .with_clock(GameClock::at(GameTime(time)))
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

/// Objects known by persistent id.
#[derive(Default)]
pub struct Objects {
    pub by_id: HashMap<i32, ObjectHandle>,
}

impl World for Objects {
    fn object_location(&self, _object: ObjectHandle) -> Option<BuiltTile> {
        None
    }

    fn object_by_id(&self, object_id: i32) -> Option<ObjectHandle> {
        self.by_id.get(&object_id).copied()
    }
}
