//! Integration tests for local variable windows

use mapscript_foundation::{ErrorKind, ScriptId, ScriptType};
use mapscript_storage::{ScriptCatalog, ScriptRegistry};

fn registry() -> ScriptRegistry {
    let catalog = ScriptCatalog::parse(
        "door.int ; doors # local_vars=2\n\
         guard.int ; guards # local_vars=3\n\
         rock.int\n\
         trap.int # local_vars=1\n",
    );
    ScriptRegistry::new().with_catalog(catalog)
}

fn attach(reg: &mut ScriptRegistry, script_type: ScriptType, script_index: i32) -> ScriptId {
    let sid = reg.add(script_type).unwrap();
    reg.get_mut(sid).unwrap().script_index = script_index;
    sid
}

#[test]
fn windows_are_allocated_on_first_use() {
    let mut reg = registry();
    let door = attach(&mut reg, ScriptType::Item, 0);
    assert_eq!(reg.get(door).unwrap().local_vars_offset, -1);
    assert!(reg.local_vars().is_empty());

    assert_eq!(reg.get_local_var(door, 1).unwrap(), 0);
    let script = reg.get(door).unwrap();
    assert_eq!(script.local_vars_offset, 0);
    assert_eq!(script.local_vars_count, 2);
    assert_eq!(reg.local_vars().len(), 2);
}

#[test]
fn removal_compacts_later_windows() {
    let mut reg = registry();
    let door = attach(&mut reg, ScriptType::Item, 0);
    let guard = attach(&mut reg, ScriptType::Critter, 1);
    let trap = attach(&mut reg, ScriptType::Spatial, 3);
    reg.set_local_var(door, 1, 11).unwrap();
    reg.set_local_var(guard, 2, 22).unwrap();
    reg.set_local_var(trap, 0, 33).unwrap();
    assert_eq!(reg.local_vars().as_slice(), &[0, 11, 0, 0, 22, 33]);

    reg.remove(door).unwrap();
    assert_eq!(reg.local_vars().as_slice(), &[0, 0, 22, 33]);
    assert_eq!(reg.get(guard).unwrap().local_vars_offset, 0);
    assert_eq!(reg.get(trap).unwrap().local_vars_offset, 3);
    assert_eq!(reg.get_local_var(guard, 2).unwrap(), 22);
    assert_eq!(reg.get_local_var(trap, 0).unwrap(), 33);
}

#[test]
fn index_outside_window_is_rejected() {
    let mut reg = registry();
    let guard = attach(&mut reg, ScriptType::Critter, 1);
    let err = reg.get_local_var(guard, 3).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::LocalVarOutOfRange {
            index: 3,
            count: 3,
            ..
        }
    ));
    assert!(reg.set_local_var(guard, -1, 0).is_err());
}

#[test]
fn scripts_without_locals_have_an_empty_window() {
    let mut reg = registry();
    let rock = attach(&mut reg, ScriptType::Item, 2);
    assert!(matches!(
        reg.get_local_var(rock, 0).unwrap_err().kind,
        ErrorKind::LocalVarOutOfRange { count: 0, .. }
    ));
    assert!(reg.local_vars().is_empty());
}

#[test]
fn system_scripts_have_no_locals() {
    let mut reg = registry();
    let map = attach(&mut reg, ScriptType::System, 0);
    let err = reg.get_local_var(map, 0).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidScript { .. }));
}
