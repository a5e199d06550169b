//! Integration tests for the script registry

use std::collections::HashSet;

use mapscript_foundation::{ErrorKind, ObjectHandle, ScriptId, ScriptType};
use mapscript_storage::{EXTENT_SIZE, ScriptFlags, ScriptRegistry};
use proptest::prelude::*;

// =============================================================================
// Add and Remove
// =============================================================================

#[test]
fn remove_leaves_the_rest_reachable() {
    let mut reg = ScriptRegistry::new();
    let sids: Vec<ScriptId> = (0..40).map(|_| reg.add(ScriptType::Item).unwrap()).collect();
    for sid in sids.iter().step_by(3) {
        reg.remove(*sid).unwrap();
    }

    assert_eq!(reg.count(ScriptType::Item), 40 - 14);
    for (i, sid) in sids.iter().enumerate() {
        assert_eq!(reg.contains(*sid), i % 3 != 0, "{sid:?}");
    }
    let extents = reg.extents(ScriptType::Item);
    assert_eq!(extents.len(), 2);
    assert_eq!(extents[0].len(), EXTENT_SIZE);
}

#[test]
fn removal_moves_the_last_script_into_the_hole() {
    let mut reg = ScriptRegistry::new();
    let a = reg.add(ScriptType::Critter).unwrap();
    let b = reg.add(ScriptType::Critter).unwrap();
    let c = reg.add(ScriptType::Critter).unwrap();
    reg.remove(a).unwrap();

    let order: Vec<ScriptId> = reg.iter(ScriptType::Critter).map(|s| s.sid()).collect();
    assert_eq!(order, vec![c, b]);
}

#[test]
fn ids_are_not_reused_after_removal() {
    let mut reg = ScriptRegistry::new();
    let a = reg.add(ScriptType::Spatial).unwrap();
    reg.remove(a).unwrap();
    let b = reg.add(ScriptType::Spatial).unwrap();
    assert_ne!(a, b);
    assert!(reg.get(a).is_err());
}

#[test]
fn removing_twice_is_not_found() {
    let mut reg = ScriptRegistry::new();
    let sid = reg.add(ScriptType::Item).unwrap();
    reg.remove(sid).unwrap();
    let err = reg.remove(sid).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ScriptNotFound(_)));
}

#[test]
fn remove_all_spares_persistent_scripts() {
    let mut reg = ScriptRegistry::new();
    let player = reg.add(ScriptType::Critter).unwrap();
    reg.get_mut(player)
        .unwrap()
        .flags
        .insert(ScriptFlags::PERSISTENT);
    for script_type in ScriptType::ALL {
        reg.add(script_type).unwrap();
    }

    let removed = reg.remove_all();
    assert_eq!(removed.len(), ScriptType::COUNT);
    assert_eq!(reg.len(), 1);
    assert!(reg.contains(player));
}

#[test]
fn nth_walks_across_extents() {
    let mut reg = ScriptRegistry::new();
    let sids: Vec<ScriptId> = (0..20).map(|_| reg.add(ScriptType::Critter).unwrap()).collect();
    assert_eq!(reg.nth(ScriptType::Critter, 17).map(|s| s.sid()), Some(sids[17]));
    assert!(reg.nth(ScriptType::Critter, 20).is_none());
}

// =============================================================================
// Owners
// =============================================================================

#[test]
fn owners_rebind_from_object_ids() {
    let mut reg = ScriptRegistry::new();
    let bound = reg.add(ScriptType::Item).unwrap();
    let loose = reg.add(ScriptType::Item).unwrap();
    reg.bind_owner(bound, ObjectHandle::new(1, 1), 77).unwrap();

    reg.rebind_owners(|id| (id == 77).then_some(ObjectHandle::new(9, 4)));
    assert_eq!(reg.get(bound).unwrap().owner, Some(ObjectHandle::new(9, 4)));
    assert_eq!(reg.get(loose).unwrap().owner, None);
}

#[test]
fn unbind_object_clears_source_and_target() {
    let mut reg = ScriptRegistry::new();
    let sid = reg.add(ScriptType::Spatial).unwrap();
    let gone = ObjectHandle::new(3, 1);
    {
        let script = reg.get_mut(sid).unwrap();
        script.source = Some(gone);
        script.target = Some(ObjectHandle::new(4, 1));
    }
    reg.unbind_object(gone);
    let script = reg.get(sid).unwrap();
    assert_eq!(script.source, None);
    assert_eq!(script.target, Some(ObjectHandle::new(4, 1)));
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #[test]
    fn count_tracks_adds_and_removes(ops in prop::collection::vec(any::<(bool, usize)>(), 1..200)) {
        let mut reg = ScriptRegistry::new();
        let mut live: Vec<ScriptId> = Vec::new();
        let mut dead: HashSet<ScriptId> = HashSet::new();

        for (add, pick) in ops {
            if add || live.is_empty() {
                live.push(reg.add(ScriptType::Item).unwrap());
            } else {
                let sid = live.swap_remove(pick % live.len());
                reg.remove(sid).unwrap();
                dead.insert(sid);
            }
        }

        prop_assert_eq!(reg.count(ScriptType::Item), live.len());
        for sid in &live {
            prop_assert!(reg.contains(*sid));
        }
        for sid in &dead {
            prop_assert!(!reg.contains(*sid));
        }
        let extents = reg.extents(ScriptType::Item);
        if let Some((tail, full)) = extents.split_last() {
            prop_assert!(full.iter().all(|e| e.len() == EXTENT_SIZE));
            prop_assert!(!tail.is_empty());
        }
    }
}
