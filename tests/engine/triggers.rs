//! Integration tests for spatial and critter triggers

use mapscript_foundation::{BuiltTile, ObjectHandle, ScriptId, ScriptType};
use mapscript_engine::Scheduler;

use crate::harness::{Fixture, Game, attach, bump, local};

fn trap_fixture() -> (Fixture, i32) {
    let mut fx = Fixture::new();
    let trap = fx.script("trap", 1, |b| {
        b.procedure("spatial_p_proc", 0);
        bump(b, 0);
        b.ret_int(0);
    });
    (fx, trap)
}

fn place(s: &mut Scheduler, index: i32, tile: i32, radius: i32) -> ScriptId {
    let sid = attach(s, ScriptType::Spatial, index);
    s.registry_mut()
        .get_mut(sid)
        .unwrap()
        .set_spatial(BuiltTile::new(tile, 0), radius);
    sid
}

#[test]
fn stepping_on_a_tile_fires_exact_and_radius_triggers() {
    let (fx, trap) = trap_fixture();
    let mut s = fx.scheduler();
    let exact = place(&mut s, trap, 4500, 0);
    let area = place(&mut s, trap, 4503, 3);
    let player = ObjectHandle::new(1, 1);
    let game = Game::default();

    assert_eq!(s.exec_spatial(&game, player, BuiltTile::new(4500, 0)), 2);
    assert_eq!(local(&mut s, exact, 0), 1);
    assert_eq!(local(&mut s, area, 0), 1);
    assert_eq!(s.get(area).unwrap().source, Some(player));

    // One step east is inside the area only.
    assert_eq!(s.exec_spatial(&game, player, BuiltTile::new(4501, 0)), 1);
    assert_eq!(local(&mut s, exact, 0), 1);
    assert_eq!(local(&mut s, area, 0), 2);

    // Another elevation is out of reach.
    assert_eq!(s.exec_spatial(&game, player, BuiltTile::new(4500, 1)), 0);
}

#[test]
fn spatial_scripts_without_a_handler_do_not_count() {
    let mut fx = Fixture::new();
    let sign = fx.script("sign", 0, |b| {
        b.procedure("look_at_p_proc", 0).ret_int(0);
    });
    let mut s = fx.scheduler();
    place(&mut s, sign, 4500, 0);
    let fired = s.exec_spatial(&Game::default(), ObjectHandle::new(1, 1), BuiltTile::new(4500, 0));
    assert_eq!(fired, 0);
    assert!(s.spatial_enabled());
}

#[test]
fn critters_take_turns() {
    let mut fx = Fixture::new();
    let idle = fx.script("idle", 1, |b| {
        b.procedure("critter_p_proc", 0);
        bump(b, 0);
        b.ret_int(0);
    });
    let mut s = fx.scheduler();
    let critters: Vec<ScriptId> = (0..4)
        .map(|_| attach(&mut s, ScriptType::Critter, idle))
        .collect();
    let game = Game::default();

    for _ in 0..8 {
        s.check_critters(&game);
    }
    for sid in critters {
        assert_eq!(local(&mut s, sid, 0), 2);
    }
}

#[test]
fn removed_critters_leave_the_rotation() {
    let mut fx = Fixture::new();
    let idle = fx.script("idle", 1, |b| {
        b.procedure("critter_p_proc", 0);
        bump(b, 0);
        b.ret_int(0);
    });
    let mut s = fx.scheduler();
    let a = attach(&mut s, ScriptType::Critter, idle);
    let b = attach(&mut s, ScriptType::Critter, idle);
    s.remove_script(a).unwrap();
    let game = Game::default();

    s.check_critters(&game);
    s.check_critters(&game);
    assert_eq!(local(&mut s, b, 0), 2);
    assert_eq!(s.critter_cursor(), 0);
}
