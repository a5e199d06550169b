//! Deferred requests.
//!
//! Scripts never change game mode directly. They set a request bit and a
//! payload; after every script of the tick has run, the dispatcher drains
//! the requests through a [`RequestHandler`] in a fixed order.

use bitflags::bitflags;
use mapscript_foundation::{Error, ErrorKind, ObjectHandle, Result};

bitflags! {
    /// Pending request kinds.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct RequestFlags: u32 {
        /// Enter combat.
        const COMBAT = 0x001;
        /// Open the town map.
        const TOWN_MAP = 0x002;
        /// Open the world map.
        const WORLD_MAP = 0x004;
        /// Use an elevator.
        const ELEVATOR = 0x008;
        /// Detonate an explosion.
        const EXPLOSION = 0x010;
        /// Start dialog.
        const DIALOG = 0x020;
        /// Combat was requested without attacker and defender.
        const COMBAT_NO_TARGET = 0x040;
        /// Play the ending.
        const ENDGAME = 0x080;
        /// Open a container.
        const LOOTING = 0x100;
        /// Open a steal screen.
        const STEALING = 0x200;
        /// Further combat requests are refused.
        const COMBAT_LOCKED = 0x400;
    }
}

/// Who attacks whom.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatRequest {
    /// The attacker.
    pub attacker: Option<ObjectHandle>,
    /// The defender.
    pub defender: Option<ObjectHandle>,
}

/// Which elevator panel to show.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElevatorRequest {
    /// Elevator type.
    pub elevator: i32,
    /// Current level.
    pub level: i32,
}

/// Where and how hard.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExplosionRequest {
    /// Center tile.
    pub tile: i32,
    /// Elevation.
    pub elevation: i32,
    /// Minimum damage.
    pub min_damage: i32,
    /// Maximum damage.
    pub max_damage: i32,
}

/// An inventory transfer between two objects.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransferRequest {
    /// The object taking items.
    pub taker: Option<ObjectHandle>,
    /// The object items are taken from.
    pub from: Option<ObjectHandle>,
}

/// Applies drained requests to the game.
pub trait RequestHandler {
    /// Enters combat. Returns true if the game mode changed.
    fn enter_combat(&mut self, request: Option<CombatRequest>) -> bool;
    /// Opens the town map.
    fn town_map(&mut self);
    /// Opens the world map.
    fn world_map(&mut self);
    /// Operates an elevator.
    fn elevator(&mut self, request: ElevatorRequest);
    /// Detonates an explosion.
    fn explosion(&mut self, request: ExplosionRequest);
    /// Starts dialog with an object.
    fn dialog(&mut self, with: Option<ObjectHandle>);
    /// Plays the ending.
    fn endgame(&mut self);
    /// Opens a container.
    fn looting(&mut self, request: TransferRequest);
    /// Opens a steal screen.
    fn stealing(&mut self, request: TransferRequest);
    /// True while an explosion is animating; combat entry waits for it.
    fn explosion_running(&self) -> bool {
        false
    }
}

/// What happened during one drain.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Kinds passed to the handler.
    pub applied: RequestFlags,
    /// Kinds discarded without being applied.
    pub dropped: RequestFlags,
    /// A combat request was left pending.
    pub combat_held: bool,
}

/// Pending requests and their payloads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestQueue {
    flags: RequestFlags,
    combat: CombatRequest,
    elevator: ElevatorRequest,
    explosion: ExplosionRequest,
    dialog: Option<ObjectHandle>,
    looting: TransferRequest,
    stealing: TransferRequest,
}

impl RequestQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending kinds.
    #[must_use]
    pub fn pending(&self) -> RequestFlags {
        self.flags
    }

    /// True if `kind` is pending.
    #[must_use]
    pub fn is_pending(&self, kind: RequestFlags) -> bool {
        self.flags.intersects(kind)
    }

    /// The pending combat payload.
    #[must_use]
    pub fn combat(&self) -> &CombatRequest {
        &self.combat
    }

    /// Requests combat. `None` starts combat with no particular target.
    ///
    /// # Errors
    ///
    /// Returns `CombatLocked` while combat requests are locked.
    pub fn request_combat(&mut self, request: Option<CombatRequest>) -> Result<()> {
        if self.flags.contains(RequestFlags::COMBAT_LOCKED) {
            return Err(Error::new(ErrorKind::CombatLocked));
        }
        self.set_combat(request);
        Ok(())
    }

    /// Requests combat and locks out further combat requests until it is applied.
    pub fn request_combat_locked(&mut self, request: Option<CombatRequest>) {
        self.set_combat(request);
        self.flags.insert(RequestFlags::COMBAT_LOCKED);
    }

    fn set_combat(&mut self, request: Option<CombatRequest>) {
        match request {
            Some(request) => self.combat = request,
            None => self.flags.insert(RequestFlags::COMBAT_NO_TARGET),
        }
        self.flags.insert(RequestFlags::COMBAT);
    }

    /// Withdraws a pending combat request made by `attacker`.
    pub fn clear_combat_by(&mut self, attacker: ObjectHandle) {
        if self.flags.contains(RequestFlags::COMBAT) && self.combat.attacker == Some(attacker) {
            self.flags
                .remove(RequestFlags::COMBAT | RequestFlags::COMBAT_LOCKED);
        }
    }

    /// Requests the town map.
    pub fn request_town_map(&mut self) {
        self.flags.insert(RequestFlags::TOWN_MAP);
    }

    /// Requests the world map.
    pub fn request_world_map(&mut self) {
        self.flags.insert(RequestFlags::WORLD_MAP);
    }

    /// Requests an elevator.
    pub fn request_elevator(&mut self, request: ElevatorRequest) {
        self.elevator = request;
        self.flags.insert(RequestFlags::ELEVATOR);
    }

    /// Requests an explosion.
    pub fn request_explosion(&mut self, request: ExplosionRequest) {
        self.explosion = request;
        self.flags.insert(RequestFlags::EXPLOSION);
    }

    /// Requests dialog.
    pub fn request_dialog(&mut self, with: Option<ObjectHandle>) {
        self.dialog = with;
        self.flags.insert(RequestFlags::DIALOG);
    }

    /// Requests the ending.
    pub fn request_endgame(&mut self) {
        self.flags.insert(RequestFlags::ENDGAME);
    }

    /// Requests looting.
    pub fn request_looting(&mut self, request: TransferRequest) {
        self.looting = request;
        self.flags.insert(RequestFlags::LOOTING);
    }

    /// Requests stealing.
    pub fn request_stealing(&mut self, request: TransferRequest) {
        self.stealing = request;
        self.flags.insert(RequestFlags::STEALING);
    }

    /// Drops every pending request.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Applies pending requests in order.
    ///
    /// Combat is held while `hold_combat` is set or the handler reports a
    /// running explosion. If entering combat changes the game mode, pending
    /// town-map, world-map, and dialog requests are dropped.
    pub fn drain(&mut self, handler: &mut dyn RequestHandler, hold_combat: bool) -> DrainReport {
        let mut report = DrainReport::default();

        if self.take(RequestFlags::COMBAT, false) {
            if hold_combat || handler.explosion_running() {
                log::debug!("combat request held");
                report.combat_held = true;
            } else {
                self.flags.remove(RequestFlags::COMBAT | RequestFlags::COMBAT_LOCKED);
                let request = if self.take(RequestFlags::COMBAT_NO_TARGET, true) {
                    None
                } else {
                    Some(std::mem::take(&mut self.combat))
                };
                report.applied.insert(RequestFlags::COMBAT);
                if handler.enter_combat(request) {
                    let dropped = self.flags
                        & (RequestFlags::TOWN_MAP | RequestFlags::WORLD_MAP | RequestFlags::DIALOG);
                    if !dropped.is_empty() {
                        log::debug!("combat started; dropping {dropped:?}");
                    }
                    self.flags.remove(dropped);
                    report.dropped.insert(dropped);
                }
            }
        }

        if self.take(RequestFlags::TOWN_MAP, true) {
            report.applied.insert(RequestFlags::TOWN_MAP);
            handler.town_map();
        }
        if self.take(RequestFlags::WORLD_MAP, true) {
            report.applied.insert(RequestFlags::WORLD_MAP);
            handler.world_map();
        }
        if self.take(RequestFlags::ELEVATOR, true) {
            report.applied.insert(RequestFlags::ELEVATOR);
            handler.elevator(self.elevator);
        }
        if self.take(RequestFlags::EXPLOSION, true) {
            report.applied.insert(RequestFlags::EXPLOSION);
            handler.explosion(self.explosion);
        }
        if self.take(RequestFlags::DIALOG, true) {
            report.applied.insert(RequestFlags::DIALOG);
            handler.dialog(self.dialog.take());
        }
        if self.take(RequestFlags::ENDGAME, true) {
            report.applied.insert(RequestFlags::ENDGAME);
            handler.endgame();
        }
        if self.take(RequestFlags::LOOTING, true) {
            report.applied.insert(RequestFlags::LOOTING);
            handler.looting(self.looting);
        }
        if self.take(RequestFlags::STEALING, true) {
            report.applied.insert(RequestFlags::STEALING);
            handler.stealing(self.stealing);
        }
        report
    }

    /// Applies only elevator and looting requests, discarding the rest.
    ///
    /// Used while combat is active.
    pub fn drain_in_combat(&mut self, handler: &mut dyn RequestHandler) -> DrainReport {
        let mut report = DrainReport::default();
        if self.is_pending(RequestFlags::ELEVATOR) {
            report.applied.insert(RequestFlags::ELEVATOR);
            handler.elevator(self.elevator);
        }
        if self.is_pending(RequestFlags::LOOTING) {
            report.applied.insert(RequestFlags::LOOTING);
            handler.looting(self.looting);
        }
        report.dropped = self.flags.difference(report.applied);
        self.flags = RequestFlags::empty();
        report
    }

    /// Tests a bit, clearing it if `clear`.
    fn take(&mut self, kind: RequestFlags, clear: bool) -> bool {
        let set = self.flags.contains(kind);
        if set && clear {
            self.flags.remove(kind);
        }
        set
    }
}
