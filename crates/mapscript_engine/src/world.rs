//! What the dispatcher needs to know about the game world.

use mapscript_foundation::{BuiltTile, ObjectHandle};

use crate::requests::ElevatorRequest;

/// Read-only queries into the embedding game.
pub trait World {
    /// Where an object stands, or `None` if it is not on the map.
    fn object_location(&self, object: ObjectHandle) -> Option<BuiltTile>;

    /// Whether an object may fire spatial triggers. Hidden and flat objects
    /// and the mouse cursor may not.
    fn is_spatial_eligible(&self, object: ObjectHandle) -> bool {
        let _ = object;
        true
    }

    /// True while combat is active.
    fn in_combat(&self) -> bool {
        false
    }

    /// True while a dialog is open.
    fn dialog_active(&self) -> bool {
        false
    }

    /// The elevator panel nearest to an object, if any.
    fn elevator_near(&self, object: ObjectHandle) -> Option<ElevatorRequest> {
        let _ = object;
        None
    }

    /// Team that knocked the player out, if the player was defeated.
    fn player_defeated_by(&self) -> Option<i32> {
        None
    }

    /// Resolves a persistent object id to a live handle.
    fn object_by_id(&self, object_id: i32) -> Option<ObjectHandle> {
        let _ = object_id;
        None
    }
}

/// A world with no objects, no combat, and no dialog.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmptyWorld;

impl World for EmptyWorld {
    fn object_location(&self, _object: ObjectHandle) -> Option<BuiltTile> {
        None
    }
}
