//! Well-known procedure entry points.

use std::fmt;

/// One of the 27 procedure kinds the runtime can ask a script to run.
///
/// The discriminant is the slot in a script's procedure table. Slot 0 is
/// reserved so that a zeroed table reads as "nothing implemented".
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ProcKind {
    /// Runs once when the script's map loads.
    Start = 1,
    /// An object entered the spatial script's area.
    Spatial = 2,
    /// Long description of the owner.
    Description = 3,
    /// Owner picked up.
    Pickup = 4,
    /// Owner dropped.
    Drop = 5,
    /// Owner used.
    Use = 6,
    /// Another object used on the owner.
    UseObjOn = 7,
    /// A skill used on the owner.
    UseSkillOn = 8,
    /// Unused in shipped data.
    UseAdOn = 9,
    /// Unused in shipped data.
    UseDisadOn = 10,
    /// Dialog started with the owner.
    Talk = 11,
    /// Idle critter behavior, driven by the round-robin.
    Critter = 12,
    /// Combat turn of the owner.
    Combat = 13,
    /// Owner took damage.
    Damage = 14,
    /// The map was entered.
    MapEnter = 15,
    /// The map is being left.
    MapExit = 16,
    /// Owner created.
    Create = 17,
    /// Owner destroyed.
    Destroy = 18,
    /// Barter opened.
    BarterInit = 19,
    /// Barter completed.
    Barter = 20,
    /// Short description of the owner.
    LookAt = 21,
    /// A timed event for the script fired.
    Timed = 22,
    /// Periodic map update.
    MapUpdate = 23,
    /// Owner pushed.
    Push = 24,
    /// Owner is about to drop something.
    IsDropping = 25,
    /// Combat is about to start.
    CombatIsStarting = 26,
    /// Combat ended.
    CombatIsOver = 27,
}

impl ProcKind {
    /// Size of a procedure table, including the reserved slot 0.
    pub const TABLE_SIZE: usize = 28;

    /// All procedure kinds in table order.
    pub const ALL: [ProcKind; 27] = [
        ProcKind::Start,
        ProcKind::Spatial,
        ProcKind::Description,
        ProcKind::Pickup,
        ProcKind::Drop,
        ProcKind::Use,
        ProcKind::UseObjOn,
        ProcKind::UseSkillOn,
        ProcKind::UseAdOn,
        ProcKind::UseDisadOn,
        ProcKind::Talk,
        ProcKind::Critter,
        ProcKind::Combat,
        ProcKind::Damage,
        ProcKind::MapEnter,
        ProcKind::MapExit,
        ProcKind::Create,
        ProcKind::Destroy,
        ProcKind::BarterInit,
        ProcKind::Barter,
        ProcKind::LookAt,
        ProcKind::Timed,
        ProcKind::MapUpdate,
        ProcKind::Push,
        ProcKind::IsDropping,
        ProcKind::CombatIsStarting,
        ProcKind::CombatIsOver,
    ];

    /// Converts a raw table slot.
    #[must_use]
    pub fn from_raw(raw: i32) -> Option<Self> {
        usize::try_from(raw - 1)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Slot in the procedure table.
    #[must_use]
    pub const fn slot(self) -> usize {
        self as usize
    }

    /// The procedure name a script image must export for this kind.
    #[must_use]
    pub const fn procedure_name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Spatial => "spatial_p_proc",
            Self::Description => "description_p_proc",
            Self::Pickup => "pickup_p_proc",
            Self::Drop => "drop_p_proc",
            Self::Use => "use_p_proc",
            Self::UseObjOn => "use_obj_on_p_proc",
            Self::UseSkillOn => "use_skill_on_p_proc",
            Self::UseAdOn => "use_ad_on_p_proc",
            Self::UseDisadOn => "use_disad_on_p_proc",
            Self::Talk => "talk_p_proc",
            Self::Critter => "critter_p_proc",
            Self::Combat => "combat_p_proc",
            Self::Damage => "damage_p_proc",
            Self::MapEnter => "map_enter_p_proc",
            Self::MapExit => "map_exit_p_proc",
            Self::Create => "create_p_proc",
            Self::Destroy => "destroy_p_proc",
            Self::BarterInit => "barter_init_p_proc",
            Self::Barter => "barter_p_proc",
            Self::LookAt => "look_at_p_proc",
            Self::Timed => "timed_event_p_proc",
            Self::MapUpdate => "map_update_p_proc",
            Self::Push => "push_p_proc",
            Self::IsDropping => "is_dropping_p_proc",
            Self::CombatIsStarting => "combat_is_starting_p_proc",
            Self::CombatIsOver => "combat_is_over_p_proc",
        }
    }
}

impl fmt::Display for ProcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.procedure_name())
    }
}
