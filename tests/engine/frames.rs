//! Integration tests for the frame driver: background programs, the game
//! clock, timed events, and the request drain.

use mapscript_engine::{RequestFlags, Scheduler, SchedulerConfig};
use mapscript_foundation::{GameTime, ProcKind, ScriptType};
use mapscript_language::{HostOp, Opcode};

use crate::harness::{Fixture, Game, attach, bump, local};

/// Runs frames 100 ms apart, from `from_ms` up to and including `to_ms`.
fn frames(s: &mut Scheduler, game: &mut Game, from_ms: u64, to_ms: u64) {
    let mut now = from_ms;
    while now <= to_ms {
        s.run_frame(game, now);
        now += 100;
    }
}

#[test]
fn waiting_script_resumes_on_a_later_frame() {
    let mut fx = Fixture::new();
    let nap = fx.script("nap", 1, |b| {
        b.procedure("use_p_proc", 0).push_int(3).op(Opcode::Wait);
        bump(b, 0);
        b.ret_int(0);
    });
    let mut s = fx.scheduler();
    let sid = attach(&mut s, ScriptType::Item, nap);
    let mut game = Game::default();

    assert!(s.exec_proc(&game, sid, ProcKind::Use));
    assert!(s.get(sid).unwrap().program.as_deref().unwrap().is_waiting());

    // Time reaches 3 on the frame at 300 ms; programs resume at the start of
    // the following frame.
    frames(&mut s, &mut game, 0, 300);
    assert_eq!(s.game_time(), GameTime(3));
    assert_eq!(local(&mut s, sid, 0), 0);

    frames(&mut s, &mut game, 400, 800);
    assert_eq!(local(&mut s, sid, 0), 1);
}

#[test]
fn self_rearming_timer_fires_every_two_ticks() {
    let mut fx = Fixture::new();
    let beacon = fx.script("beacon", 1, |b| {
        b.procedure("timed_event_p_proc", 0);
        bump(b, 0);
        b.push_int(2)
            .push_int(0)
            .host(HostOp::AddTimerEvent)
            .ret_int(0);
    });
    let mut s = fx.scheduler();
    let sid = attach(&mut s, ScriptType::Item, beacon);
    s.add_timer_event(sid, 2, 0).unwrap();
    let mut game = Game::default();

    frames(&mut s, &mut game, 0, 400);
    assert_eq!(s.game_time(), GameTime(4));
    assert_eq!(local(&mut s, sid, 0), 2);
    assert_eq!(s.events().next_time(), Some(GameTime(6)));
}

#[test]
fn combat_freezes_the_clock() {
    let mut fx = Fixture::new();
    let beacon = fx.script("beacon", 1, |b| {
        b.procedure("timed_event_p_proc", 0);
        bump(b, 0);
        b.ret_int(0);
    });
    let mut s = fx.scheduler();
    let sid = attach(&mut s, ScriptType::Item, beacon);
    s.add_timer_event(sid, 1, 0).unwrap();
    let mut game = Game {
        combat: true,
        ..Game::default()
    };

    frames(&mut s, &mut game, 0, 500);
    assert_eq!(s.game_time(), GameTime(0));
    assert_eq!(local(&mut s, sid, 0), 0);

    game.combat = false;
    frames(&mut s, &mut game, 600, 600);
    assert_eq!(local(&mut s, sid, 0), 1);
}

#[test]
fn map_update_events_reach_loaded_scripts() {
    let mut fx = Fixture::new();
    let lamp = fx.script("lamp", 2, |b| {
        b.procedure("start", 0).ret_int(0);
        b.procedure("map_enter_p_proc", 0);
        bump(b, 0);
        b.ret_int(0);
        b.procedure("map_update_p_proc", 0);
        bump(b, 1);
        b.ret_int(0);
    });
    let mut s = fx.scheduler();
    s = s.with_config(SchedulerConfig::default().with_map_update_period(3));
    let sid = attach(&mut s, ScriptType::Item, lamp);
    let mut game = Game::default();

    s.exec_start_procs(&game);
    s.map_enter(&game, true);
    assert_eq!(local(&mut s, sid, 0), 1);

    frames(&mut s, &mut game, 0, 300);
    assert_eq!(local(&mut s, sid, 1), 1);
    assert_eq!(s.events().next_time(), Some(GameTime(6)));
}

#[test]
fn dialog_pauses_critters_and_the_clock() {
    let mut fx = Fixture::new();
    let idle = fx.script("idle", 1, |b| {
        b.procedure("critter_p_proc", 0);
        bump(b, 0);
        b.ret_int(0);
    });
    let mut s = fx.scheduler();
    let sid = attach(&mut s, ScriptType::Critter, idle);
    let mut game = Game {
        dialog: true,
        ..Game::default()
    };

    frames(&mut s, &mut game, 0, 300);
    assert_eq!(local(&mut s, sid, 0), 0);
    assert_eq!(s.game_time(), GameTime(0));

    game.dialog = false;
    frames(&mut s, &mut game, 400, 400);
    assert_eq!(local(&mut s, sid, 0), 1);
}

#[test]
fn requests_from_scripts_apply_after_the_tick() {
    let mut fx = Fixture::new();
    let chatty = fx.script("chatty", 0, |b| {
        b.procedure("critter_p_proc", 0)
            .push_int(0)
            .host(HostOp::RequestDialog)
            .host(HostOp::RequestTownMap)
            .ret_int(0);
    });
    let mut s = fx.scheduler();
    attach(&mut s, ScriptType::Critter, chatty);
    let mut game = Game::default();

    let report = s.run_frame(&mut game, 0);
    assert_eq!(game.applied, vec!["town", "dialog"]);
    assert_eq!(report.applied, RequestFlags::TOWN_MAP | RequestFlags::DIALOG);
    assert!(s.requests().pending().is_empty());
}

#[test]
fn combat_request_drops_the_world_map() {
    let mut fx = Fixture::new();
    let raider = fx.script("raider", 0, |b| {
        b.procedure("critter_p_proc", 0)
            .host(HostOp::RequestWorldMap)
            .push_int(0)
            .push_int(0)
            .host(HostOp::RequestCombat)
            .ret_int(0);
    });
    let mut s = fx.scheduler();
    attach(&mut s, ScriptType::Critter, raider);
    let mut game = Game::default();

    let report = s.run_frame(&mut game, 0);
    assert_eq!(game.applied, vec!["combat"]);
    assert!(report.dropped.contains(RequestFlags::WORLD_MAP));
}
