//! Trigger entry points and the per-frame driver.

use mapscript_foundation::{
    BuiltTile, MIN_TRIGGER_TILE, ObjectHandle, ProcKind, ScriptId, ScriptType, hex_distance,
};
use mapscript_storage::Script;

use super::Scheduler;
use crate::events::{Event, EventKind};
use crate::requests::{DrainReport, RequestHandler};
use crate::world::World;

impl Scheduler {
    // -------------------------------------------------------------------------
    // Spatial
    // -------------------------------------------------------------------------

    /// Fires spatial scripts for an object arriving at `tile`.
    ///
    /// Every spatial script on the tile's elevation whose trigger tile is
    /// `tile`, or whose non-zero radius reaches it, runs its spatial
    /// procedure once with `source` set to the object. Spatial triggers are
    /// off while they run, so movement caused by a spatial script does not
    /// fire more of them.
    ///
    /// Returns how many scripts were run.
    pub fn exec_spatial(
        &mut self,
        world: &dyn World,
        object: ObjectHandle,
        tile: BuiltTile,
    ) -> usize {
        if !self.spatial_enabled || !self.is_enabled() {
            return 0;
        }
        if tile.tile() < MIN_TRIGGER_TILE || !world.is_spatial_eligible(object) {
            return 0;
        }

        let candidates: Vec<ScriptId> = self
            .registry
            .spatials_at(tile.elevation())
            .filter(|s| covers(s, tile))
            .map(Script::sid)
            .collect();
        if candidates.is_empty() {
            return 0;
        }

        self.spatial_enabled = false;
        let mut fired = 0;
        for sid in candidates {
            if self.is_running(sid) {
                continue;
            }
            let Ok(script) = self.registry.get_mut(sid) else {
                continue;
            };
            script.source = Some(object);
            if self.exec_proc(world, sid, ProcKind::Spatial) {
                fired += 1;
            }
            // The binding only lives for the call, which may not have run.
            if let Ok(script) = self.registry.get_mut(sid) {
                script.source = None;
            }
        }
        self.spatial_enabled = true;
        fired
    }

    // -------------------------------------------------------------------------
    // Critters
    // -------------------------------------------------------------------------

    /// Advances the critter round-robin by one and runs the script it lands
    /// on. Does nothing during dialog or combat.
    pub fn check_critters(&mut self, world: &dyn World) {
        if !self.config.critters_enabled || world.dialog_active() || world.in_combat() {
            return;
        }
        let count = self.registry.count(ScriptType::Critter);
        self.critter_cursor += 1;
        if self.critter_cursor >= count {
            self.critter_cursor = 0;
        }
        let Some(sid) = self
            .registry
            .nth(ScriptType::Critter, self.critter_cursor)
            .map(Script::sid)
        else {
            return;
        };
        let kind = if world.in_combat() {
            ProcKind::Combat
        } else {
            ProcKind::Critter
        };
        self.exec_proc(world, sid, kind);
    }

    // -------------------------------------------------------------------------
    // Timed
    // -------------------------------------------------------------------------

    /// Polls the real-time timers at `now_ms`.
    ///
    /// Broadcasts map-update when the light interval elapses. When the clock
    /// interval elapses, game time advances one tick outside combat. Due
    /// events are processed on every poll outside combat, and in combat only
    /// when the clock interval elapsed.
    pub fn check_timed_events(&mut self, world: &dyn World, now_ms: u64) {
        let in_combat = world.in_combat();
        let poll = self.clock.poll(now_ms, &self.config, in_combat);
        if poll.light_due {
            self.map_update(world);
        }
        if poll.ticked || !in_combat {
            self.process_events(world);
        }
    }

    /// Runs every event due at the current game time.
    ///
    /// Events queued while draining wait for the next drain, even if they
    /// are already due. Returns how many events ran.
    pub fn process_events(&mut self, world: &dyn World) -> usize {
        let budget = self.events.len();
        let mut processed = 0;
        while processed < budget {
            let Some(event) = self.events.pop_due(self.clock.time()) else {
                break;
            };
            processed += 1;
            match event.kind {
                EventKind::Script { sid, fixed_param } => {
                    let Ok(script) = self.registry.get_mut(sid) else {
                        log::debug!("timed event for missing script {sid}");
                        continue;
                    };
                    script.fixed_param = fixed_param;
                    self.exec_proc(world, sid, ProcKind::Timed);
                }
                EventKind::MapUpdate => {
                    self.map_update(world);
                    self.schedule_map_update();
                }
            }
        }
        processed
    }

    fn schedule_map_update(&mut self) {
        self.events.clear_map_updates();
        let at = self.clock.time().plus(self.config.map_update_period);
        self.events.push(Event::new(at, EventKind::MapUpdate));
    }

    // -------------------------------------------------------------------------
    // Map lifecycle
    // -------------------------------------------------------------------------

    /// Resets trigger state for a new map and broadcasts map-enter.
    ///
    /// `first_visit` is passed to every script as its fixed parameter.
    pub fn map_enter(&mut self, world: &dyn World, first_visit: bool) {
        self.spatial_enabled = true;
        self.critter_cursor = 0;
        self.clock.reset_timers();
        self.schedule_map_update();
        self.broadcast(world, ProcKind::MapEnter, i32::from(first_visit));
    }

    /// Broadcasts map-exit, then tears down everything tied to the map:
    /// non-persistent scripts, exported variables, requests, and scratch
    /// arrays.
    pub fn map_exit(&mut self, world: &dyn World) {
        self.broadcast(world, ProcKind::MapExit, 0);
        let removed = self.remove_all_scripts();
        log::debug!("map exit removed {removed} scripts");
        self.events.clear_map_updates();
        self.externals.clear();
        self.requests.clear();
        self.scratch.clear();
    }

    /// Broadcasts map-update.
    pub fn map_update(&mut self, world: &dyn World) {
        self.broadcast(world, ProcKind::MapUpdate, 0);
    }

    /// Runs `kind` on the map script, then on every other script whose
    /// procedure table implements it.
    fn broadcast(&mut self, world: &dyn World, kind: ProcKind, fixed_param: i32) {
        let map_sid = self.map_sid;
        if let Some(sid) = map_sid {
            if let Ok(script) = self.registry.get_mut(sid) {
                script.fixed_param = fixed_param;
                self.exec_proc(world, sid, kind);
            }
        }

        let sids: Vec<ScriptId> = self
            .registry
            .iter_all()
            .filter(|s| Some(s.sid()) != map_sid && s.procs.implements(kind))
            .map(Script::sid)
            .collect();
        log::debug!("broadcast {kind} to {} scripts", sids.len());
        for sid in sids {
            let Ok(script) = self.registry.get_mut(sid) else {
                continue;
            };
            script.fixed_param = fixed_param;
            self.exec_proc(world, sid, kind);
        }
    }

    /// Runs `start` on every script, loading each program so its procedure
    /// table is known to later broadcasts.
    pub fn exec_start_procs(&mut self, world: &dyn World) {
        for sid in self.registry.all_sids() {
            if self.registry.contains(sid) {
                self.exec_proc(world, sid, ProcKind::Start);
            }
        }
    }

    /// Runs the map script's combat procedure after the player was defeated,
    /// with the defeating team as fixed parameter.
    ///
    /// Returns true if the script overrode the default outcome.
    pub fn end_combat(&mut self, world: &dyn World) -> bool {
        let Some(sid) = self.map_sid else {
            return false;
        };
        let Some(team) = world.player_defeated_by() else {
            return false;
        };
        let Ok(script) = self.registry.get_mut(sid) else {
            return false;
        };
        script.fixed_param = team;
        if !self.exec_proc(world, sid, ProcKind::Combat) {
            return false;
        }
        self.registry.get(sid).is_ok_and(|s| s.overrides != 0)
    }

    // -------------------------------------------------------------------------
    // Frame
    // -------------------------------------------------------------------------

    /// Applies pending requests, then frees the tick's scratch arrays.
    ///
    /// During combat only elevator and looting requests apply.
    pub fn handle_requests(
        &mut self,
        handler: &mut dyn RequestHandler,
        in_combat: bool,
    ) -> DrainReport {
        let report = if in_combat {
            self.requests.drain_in_combat(handler)
        } else {
            let hold = self.critical_open();
            self.requests.drain(handler, hold)
        };
        self.scratch.clear();
        report
    }

    /// One background step: resume due programs, then (outside dialog) the
    /// critter round-robin and the timed poll.
    pub fn tick(&mut self, world: &dyn World, now_ms: u64) {
        if !self.is_enabled() {
            return;
        }
        self.update_programs(world);
        if world.dialog_active() {
            return;
        }
        self.check_critters(world);
        self.check_timed_events(world, now_ms);
    }

    /// A full frame: [`Scheduler::tick`] followed by the request drain.
    pub fn run_frame<G: World + RequestHandler>(
        &mut self,
        game: &mut G,
        now_ms: u64,
    ) -> DrainReport {
        self.tick(&*game, now_ms);
        let in_combat = game.in_combat();
        self.handle_requests(game, in_combat)
    }
}

/// Whether a spatial script reacts to an object at `tile`.
fn covers(script: &Script, tile: BuiltTile) -> bool {
    let Some(at) = script.built_tile() else {
        return false;
    };
    if at == tile {
        return true;
    }
    let radius = script.radius().unwrap_or(0);
    radius != 0 && hex_distance(at.tile(), tile.tile()) <= radius
}
