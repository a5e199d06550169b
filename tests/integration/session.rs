//! A session carried across a restart by a snapshot plus a map save

use mapscript_engine::{RequestFlags, RequestHandler, CombatRequest, ElevatorRequest, ExplosionRequest, TransferRequest, World};
use mapscript_foundation::{BuiltTile, GameTime, ObjectHandle, ProcKind, ScriptType};
use mapscript_runtime::{load_map_file, save_map_file, snapshot};

use crate::support::{BEACON, COUNTER, Objects, Town, attach, local};

#[derive(Default)]
struct Shell {
    objects: Objects,
    world_maps: usize,
}

impl World for Shell {
    fn object_location(&self, object: ObjectHandle) -> Option<BuiltTile> {
        self.objects.object_location(object)
    }

    fn object_by_id(&self, object_id: i32) -> Option<ObjectHandle> {
        self.objects.object_by_id(object_id)
    }
}

impl RequestHandler for Shell {
    fn enter_combat(&mut self, _request: Option<CombatRequest>) -> bool {
        false
    }
    fn town_map(&mut self) {}
    fn world_map(&mut self) {
        self.world_maps += 1;
    }
    fn elevator(&mut self, _request: ElevatorRequest) {}
    fn explosion(&mut self, _request: ExplosionRequest) {}
    fn dialog(&mut self, _with: Option<ObjectHandle>) {}
    fn endgame(&mut self) {}
    fn looting(&mut self, _request: TransferRequest) {}
    fn stealing(&mut self, _request: TransferRequest) {}
}

#[test]
fn restart_resumes_clock_requests_and_timers() {
    let town = Town::new();
    let mut shell = Shell::default();
    let state_path = town.dir.path().join("scheduler.msgpack");
    let map_path = town.dir.path().join("town.sav");

    let (counter, beacon) = {
        let mut s = town.scheduler(GameTime::START.0);
        let counter = attach(&mut s, ScriptType::Item, COUNTER);
        let beacon = attach(&mut s, ScriptType::Item, BEACON);
        s.exec_proc(&shell, counter, ProcKind::Use);
        s.add_timer_event(beacon, 2, 5).unwrap();
        s.requests_mut().request_world_map();
        s.clock_mut().advance(1);

        snapshot::save_to_file(&s.state(), &state_path).unwrap();
        save_map_file(&map_path, &s).unwrap();
        (counter, beacon)
    };

    let mut s = town.scheduler(0);
    s.restore_state(snapshot::load_from_file(&state_path).unwrap());
    load_map_file(&map_path, &mut s, &shell).unwrap();
    assert_eq!(s.game_time(), GameTime::START.plus(1));
    assert!(s.requests().is_pending(RequestFlags::WORLD_MAP));
    assert_eq!(local(&mut s, counter, 0), 1);

    // The first frame applies the carried-over request; the timer is due one
    // tick later.
    s.run_frame(&mut shell, 0);
    assert_eq!(shell.world_maps, 1);
    s.run_frame(&mut shell, 100);
    assert_eq!(local(&mut s, beacon, 1), 5);
    assert!(s.events().is_empty());
}
