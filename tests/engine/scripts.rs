//! Integration tests for calls between scripts and shared state

use mapscript_engine::ExecStatus;
use mapscript_foundation::{ErrorKind, ProcKind, ScriptType, Value};
use mapscript_language::{HostOp, Opcode};

use crate::harness::{Fixture, Game, attach, bump, local};

#[test]
fn mutual_run_proc_stops_at_the_busy_script() {
    let mut fx = Fixture::new();
    // Local 0 holds the other script's sid; local 1 records the result.
    let caller = fx.script("ping", 2, |b| {
        b.procedure("use_p_proc", 0)
            .push_int(1)
            .push_int(0)
            .host(HostOp::LocalVar)
            .push_int(ProcKind::Use as i32)
            .host(HostOp::RunProc)
            .host(HostOp::SetLocalVar)
            .ret_int(0);
    });
    let mut s = fx.scheduler();
    let ping = attach(&mut s, ScriptType::Item, caller);
    let pong = attach(&mut s, ScriptType::Item, caller);
    s.registry_mut().set_local_var(ping, 0, pong.raw()).unwrap();
    s.registry_mut().set_local_var(pong, 0, ping.raw()).unwrap();

    assert!(s.exec_proc(&Game::default(), ping, ProcKind::Use));
    assert_eq!(local(&mut s, ping, 1), 1);
    assert_eq!(local(&mut s, pong, 1), 0);
    assert!(!s.is_running(ping));
    assert!(!s.is_running(pong));
}

#[test]
fn exported_variables_are_shared() {
    let mut fx = Fixture::new();
    let writer = fx.script("lever", 0, |b| {
        b.procedure("use_p_proc", 0)
            .push_string("gate_open")
            .op(Opcode::ExportVar)
            .push_int(1)
            .push_string("gate_open")
            .op(Opcode::StoreExternal)
            .ret_int(0);
    });
    let reader = fx.script("gate", 0, |b| {
        b.procedure("look_at_p_proc", 0)
            .push_string("gate_open")
            .op(Opcode::FetchExternal)
            .op(Opcode::PopReturn);
    });
    let mut s = fx.scheduler();
    let lever = attach(&mut s, ScriptType::Item, writer);
    let gate = attach(&mut s, ScriptType::Item, reader);
    let game = Game::default();

    s.exec_proc(&game, lever, ProcKind::Use);
    assert_eq!(s.external("gate_open"), Some(&Value::Int(1)));
    assert_eq!(
        s.try_exec_proc(&game, gate, ProcKind::LookAt).unwrap(),
        ExecStatus::Returned(Value::Int(1))
    );

    s.map_exit(&game);
    assert!(s.external("gate_open").is_none());
}

#[test]
fn programs_are_shared_by_name_but_not_state() {
    let mut fx = Fixture::new();
    let counter = fx.script("counter", 1, |b| {
        b.procedure("use_p_proc", 0);
        bump(b, 0);
        b.ret_int(0);
    });
    let mut s = fx.scheduler();
    let a = attach(&mut s, ScriptType::Item, counter);
    let b = attach(&mut s, ScriptType::Item, counter);
    let game = Game::default();

    s.exec_proc(&game, a, ProcKind::Use);
    s.exec_proc(&game, a, ProcKind::Use);
    s.exec_proc(&game, b, ProcKind::Use);
    assert_eq!(local(&mut s, a, 0), 2);
    assert_eq!(local(&mut s, b, 0), 1);
}

#[test]
fn unlisted_script_is_a_load_error() {
    let fx = Fixture::new();
    let mut s = fx.scheduler();
    let sid = attach(&mut s, ScriptType::Item, 0);
    let err = s
        .try_exec_proc(&Game::default(), sid, ProcKind::Start)
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::LoadError { .. }));
    assert!(s.registry().contains(sid));
    assert!(!s.get(sid).unwrap().is_loaded());
}

#[test]
fn listed_script_missing_from_disk_is_a_load_error() {
    let mut fx = Fixture::new();
    fx.script("lamp", 0, |b| {
        b.procedure("start", 0).ret_int(0);
    });
    fx.forget("lamp");
    let mut s = fx.scheduler();
    let sid = attach(&mut s, ScriptType::Item, 0);
    assert!(!s.exec_proc(&Game::default(), sid, ProcKind::Start));
    assert!(!s.get(sid).unwrap().is_loaded());
}
