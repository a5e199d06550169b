//! Map saves of a scheduler that has been running scripts

use mapscript_engine::Scheduler;
use mapscript_foundation::{BuiltTile, ErrorKind, GameTime, ObjectHandle, ProcKind, ScriptId, ScriptType};
use mapscript_runtime::{load_map_file, map_from_bytes, map_to_bytes, save_map_file};
use mapscript_storage::ScriptFlags;

use crate::support::{BEACON, COUNTER, GUARD, Objects, TRAP, Town, attach, local};

const NOW: u32 = 500_000;

struct Played {
    counter: ScriptId,
    beacon: ScriptId,
    trap: ScriptId,
}

/// Uses the counter twice, arms the beacon, and springs the trap.
fn play(s: &mut Scheduler) -> Played {
    let objects = Objects::default();
    let counter = attach(s, ScriptType::Item, COUNTER);
    s.registry_mut()
        .bind_owner(counter, ObjectHandle::new(3, 1), 100)
        .unwrap();
    let beacon = attach(s, ScriptType::Item, BEACON);
    let trap = attach(s, ScriptType::Spatial, TRAP);
    s.registry_mut()
        .get_mut(trap)
        .unwrap()
        .set_spatial(BuiltTile::new(4500, 0), 2);
    attach(s, ScriptType::Critter, GUARD);

    s.exec_proc(&objects, counter, ProcKind::Use);
    s.exec_proc(&objects, counter, ProcKind::Use);
    s.add_timer_event(beacon, 10, 7).unwrap();
    assert_eq!(
        s.exec_spatial(&objects, ObjectHandle::new(1, 1), BuiltTile::new(4502, 0)),
        1
    );
    Played {
        counter,
        beacon,
        trap,
    }
}

fn objects() -> Objects {
    let mut objects = Objects::default();
    objects.by_id.insert(100, ObjectHandle::new(8, 2));
    objects
}

#[test]
fn save_load_save_is_byte_identical() {
    let town = Town::new();
    let mut live = town.scheduler(NOW);
    play(&mut live);
    let first = map_to_bytes(&live).unwrap();

    let mut loaded = town.scheduler(NOW);
    map_from_bytes(&first, &mut loaded, &objects()).unwrap();
    assert_eq!(map_to_bytes(&loaded).unwrap(), first);
}

#[test]
fn reloaded_scripts_continue_where_they_left_off() {
    let town = Town::new();
    let mut live = town.scheduler(NOW);
    let played = play(&mut live);
    let bytes = map_to_bytes(&live).unwrap();

    let mut s = town.scheduler(NOW);
    let world = objects();
    map_from_bytes(&bytes, &mut s, &world).unwrap();

    let counter = s.get(played.counter).unwrap();
    assert!(!counter.is_loaded());
    assert!(counter.flags.contains(ScriptFlags::EXECUTED));
    assert_eq!(counter.owner, Some(ObjectHandle::new(8, 2)));
    assert_eq!(local(&mut s, played.counter, 0), 2);

    assert!(s.exec_proc(&world, played.counter, ProcKind::Use));
    assert_eq!(local(&mut s, played.counter, 0), 3);

    assert_eq!(s.events().len(), 1);
    s.clock_mut().set_time(GameTime(NOW + 10));
    assert_eq!(s.process_events(&world), 1);
    assert_eq!(local(&mut s, played.beacon, 0), 1);
    assert_eq!(local(&mut s, played.beacon, 1), 7);
}

#[test]
fn file_round_trip_keeps_spatial_triggers() {
    let town = Town::new();
    let mut live = town.scheduler(NOW);
    let played = play(&mut live);
    let path = town.dir.path().join("town.sav");
    save_map_file(&path, &live).unwrap();

    let mut s = town.scheduler(NOW);
    let world = objects();
    load_map_file(&path, &mut s, &world).unwrap();
    let trap = s.get(played.trap).unwrap();
    assert_eq!(trap.built_tile(), Some(BuiltTile::new(4500, 0)));
    assert_eq!(trap.radius(), Some(2));

    assert_eq!(
        s.exec_spatial(&world, ObjectHandle::new(1, 1), BuiltTile::new(4501, 0)),
        1
    );
    assert_eq!(local(&mut s, played.trap, 0), 2);
}

#[test]
fn only_persistent_scripts_survive_a_map_change() {
    let town = Town::new();
    let mut s = town.scheduler(NOW);
    let world = objects();
    let player = attach(&mut s, ScriptType::Critter, GUARD);
    s.registry_mut()
        .get_mut(player)
        .unwrap()
        .flags
        .insert(ScriptFlags::PERSISTENT);
    let guard = attach(&mut s, ScriptType::Critter, GUARD);
    s.exec_start_procs(&world);
    s.map_exit(&world);
    assert!(!s.registry().contains(guard));

    let bytes = map_to_bytes(&s).unwrap();
    let mut next = town.scheduler(NOW);
    map_from_bytes(&bytes, &mut next, &world).unwrap();
    assert_eq!(next.registry().len(), 1);
    assert_eq!(local(&mut next, player, 1), 1);
}

#[test]
fn corrupt_save_changes_nothing() {
    let town = Town::new();
    let mut live = town.scheduler(NOW);
    play(&mut live);
    let bytes = map_to_bytes(&live).unwrap();

    let mut s = town.scheduler(NOW);
    let keep = attach(&mut s, ScriptType::Item, COUNTER);
    let err = map_from_bytes(&bytes[..bytes.len() - 3], &mut s, &objects()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::SerializationError(_)));
    assert_eq!(s.registry().len(), 1);
    assert!(s.registry().contains(keep));
}
