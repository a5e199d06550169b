//! Integration tests for script ids, tiles, and game time

use mapscript_foundation::{BuiltTile, Epoch, GameTime, ProcKind, ScriptId, ScriptType, hex_distance};

// =============================================================================
// Script Ids
// =============================================================================

#[test]
fn sid_carries_type_in_high_byte() {
    let sid = ScriptId::new(ScriptType::Critter, 17);
    assert_eq!(sid.raw(), (4 << 24) | 17);
    assert_eq!(sid.script_type(), Some(ScriptType::Critter));
    assert_eq!(sid.index(), 17);
}

#[test]
fn sid_survives_raw_round_trip() {
    for script_type in ScriptType::ALL {
        let sid = ScriptId::new(script_type, 0x00AB_CDEF);
        assert_eq!(ScriptId::from_raw(sid.raw()), sid);
        assert_eq!(sid.script_type(), Some(script_type));
    }
}

#[test]
fn corrupt_sid_has_no_type() {
    assert_eq!(ScriptId::from_raw(9 << 24).script_type(), None);
    assert_eq!(ScriptId::from_raw(-1).script_type(), None);
}

#[test]
fn script_types_index_in_storage_order() {
    let indices: Vec<usize> = ScriptType::ALL.iter().map(|t| t.index()).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(ScriptType::COUNT, 5);
    assert_eq!(ScriptType::Spatial.to_string(), "spatial");
}

#[test]
fn sid_debug_shows_type_and_index() {
    let sid = ScriptId::new(ScriptType::Item, 3);
    assert_eq!(format!("{sid:?}"), "ScriptId(item:3)");
    assert_eq!(format!("{sid}"), "0x03000003");
}

// =============================================================================
// Procedure Kinds
// =============================================================================

#[test]
fn proc_kinds_map_to_table_slots() {
    assert_eq!(ProcKind::ALL.len(), 27);
    for (i, kind) in ProcKind::ALL.iter().enumerate() {
        assert_eq!(kind.slot(), i + 1);
        assert_eq!(ProcKind::from_raw(i32::try_from(i + 1).unwrap()), Some(*kind));
    }
    assert_eq!(ProcKind::from_raw(0), None);
    assert_eq!(ProcKind::from_raw(28), None);
}

#[test]
fn proc_kind_names() {
    assert_eq!(ProcKind::Start.procedure_name(), "start");
    assert_eq!(ProcKind::Spatial.procedure_name(), "spatial_p_proc");
    assert_eq!(ProcKind::MapEnter.procedure_name(), "map_enter_p_proc");
}

// =============================================================================
// Tiles
// =============================================================================

#[test]
fn built_tile_keeps_tile_and_elevation_apart() {
    let a = BuiltTile::new(4500, 0);
    let b = BuiltTile::new(4500, 1);
    assert_ne!(a, b);
    assert_eq!(a.tile(), b.tile());
    assert_eq!(b.elevation(), 1);
}

#[test]
fn hex_distance_along_a_row() {
    assert_eq!(hex_distance(4500, 4503), 3);
    assert_eq!(hex_distance(4500, 4510), 10);
}

// =============================================================================
// Game Time
// =============================================================================

#[test]
fn new_game_starts_in_the_morning() {
    assert_eq!(GameTime::START.military(), 824);
    assert_eq!(GameTime::START.plus(GameTime::TICKS_PER_HOUR).military(), 924);
}

#[test]
fn plus_wraps_instead_of_panicking() {
    assert_eq!(GameTime(u32::MAX).plus(2), GameTime(1));
}

#[test]
fn date_counts_from_epoch() {
    let epoch = Epoch::default();
    assert_eq!(GameTime(0).date(epoch), (7, 25, 2241));
    assert_eq!(GameTime(GameTime::TICKS_PER_YEAR).date(epoch).2, 2242);
}
