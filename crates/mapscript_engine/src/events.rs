//! The timed event queue.
//!
//! Events are kept sorted by due time. An event queued for the same time as
//! existing ones runs after them.

use std::collections::VecDeque;

use mapscript_foundation::{GameTime, ObjectHandle, ScriptId};

/// Persistent object id meaning "no owner".
pub const NO_OWNER: i32 = -2;

/// What an event does when it comes due.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// Run a script's timed procedure with a fixed parameter.
    Script {
        /// The script.
        sid: ScriptId,
        /// Passed to the procedure.
        fixed_param: i32,
    },
    /// Broadcast map-update and queue the next one.
    MapUpdate,
}

impl EventKind {
    /// Type code used in saves.
    pub const SCRIPT_CODE: i32 = 3;
    /// Type code used in saves.
    pub const MAP_UPDATE_CODE: i32 = 12;

    /// The save type code.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::Script { .. } => Self::SCRIPT_CODE,
            Self::MapUpdate => Self::MAP_UPDATE_CODE,
        }
    }
}

/// A queued event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// When the event fires.
    pub time: GameTime,
    /// Persistent id of the owning object, or [`NO_OWNER`].
    pub owner_id: i32,
    /// The owning object. Not persisted; rebound after load.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub owner: Option<ObjectHandle>,
    /// What happens.
    pub kind: EventKind,
}

impl Event {
    /// An event with no owner.
    #[must_use]
    pub fn new(time: GameTime, kind: EventKind) -> Self {
        Self {
            time,
            owner_id: NO_OWNER,
            owner: None,
            kind,
        }
    }

    /// Sets the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: Option<ObjectHandle>, owner_id: i32) -> Self {
        self.owner = owner;
        self.owner_id = if owner.is_some() || owner_id != -1 {
            owner_id
        } else {
            NO_OWNER
        };
        self
    }
}

/// Time-ordered queue of pending events.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventQueue {
    events: VecDeque<Event>,
}

impl EventQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an event after every event due at or before its time.
    pub fn push(&mut self, event: Event) {
        let at = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(at, event);
    }

    /// Due time of the earliest event.
    #[must_use]
    pub fn next_time(&self) -> Option<GameTime> {
        self.events.front().map(|e| e.time)
    }

    /// Removes and returns the earliest event if it is due.
    pub fn pop_due(&mut self, now: GameTime) -> Option<Event> {
        if self.next_time()? <= now {
            self.events.pop_front()
        } else {
            None
        }
    }

    /// Removes every event owned by `owner`.
    pub fn remove_owned_by(&mut self, owner: ObjectHandle) -> usize {
        self.remove_where(|e| e.owner == Some(owner))
    }

    /// Removes every script event.
    pub fn clear_script_events(&mut self) -> usize {
        self.remove_where(|e| matches!(e.kind, EventKind::Script { .. }))
    }

    /// Removes every map-update event.
    pub fn clear_map_updates(&mut self) -> usize {
        self.remove_where(|e| e.kind == EventKind::MapUpdate)
    }

    /// Removes every event matching a predicate, returning how many.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&Event) -> bool) -> usize {
        let before = self.events.len();
        self.events.retain(|e| !pred(e));
        before - self.events.len()
    }

    /// Re-resolves event owners from their persistent ids.
    pub fn rebind_owners(&mut self, mut resolve: impl FnMut(i32) -> Option<ObjectHandle>) {
        for event in &mut self.events {
            event.owner = if event.owner_id == NO_OWNER {
                None
            } else {
                resolve(event.owner_id)
            };
        }
    }

    /// Events in due order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drops every event.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
