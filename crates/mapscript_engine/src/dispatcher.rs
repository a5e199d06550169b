//! The trigger dispatcher.
//!
//! A [`Scheduler`] owns everything the scripting runtime keeps between
//! ticks: the script registry, background programs, the event queue, the
//! request queue, the game clock, and the trigger state (critter cursor,
//! spatial flag). The embedding game drives it once per frame with
//! [`Scheduler::run_frame`] and calls the trigger entry points (spatial,
//! map lifecycle, end of combat) as things happen.
//!
//! # Invocation
//!
//! [`Scheduler::try_exec_proc`] is the single entry into a script. It loads
//! the script's program on first use, runs the module initializer once,
//! locates the procedure table, and runs one procedure. While it runs, the
//! program is taken out of its script; any attempt to run the same script
//! again fails with `ScriptBusy`. Failures never escape a tick:
//! [`Scheduler::exec_proc`] logs them and reports `false`.

mod triggers;

use std::collections::HashMap;

use mapscript_foundation::{
    Error, ErrorKind, GameTime, ProcKind, Result, ScriptId, ScriptType, Value,
};
use mapscript_language::{Interpreter, Outcome, Program, ProgramId};
use mapscript_storage::{ProcTable, Script, ScriptFlags, ScriptRegistry};

use crate::clock::GameClock;
use crate::config::SchedulerConfig;
use crate::context::ScriptContext;
use crate::events::{Event, EventKind, EventQueue};
use crate::loader::ImageSource;
use crate::requests::RequestQueue;
use crate::scratch::TempArrays;
use crate::world::World;

// =============================================================================
// ExecStatus
// =============================================================================

/// Result of running a script procedure.
#[derive(Clone, Debug, PartialEq)]
pub enum ExecStatus {
    /// The procedure ran to completion and returned this value.
    Returned(Value),
    /// The program is waiting or blocked; it continues on a later tick.
    Suspended,
    /// The program exited.
    Finished,
    /// The script does not implement the procedure.
    NoHandler,
}

impl From<Outcome> for ExecStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Returned(value) => Self::Returned(value),
            Outcome::Waiting(_) | Outcome::Blocked => Self::Suspended,
            Outcome::Finished => Self::Finished,
        }
    }
}

// =============================================================================
// SchedulerState
// =============================================================================

/// The scheduler's own state, apart from the registry and programs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerState {
    /// Timing and limits.
    pub config: SchedulerConfig,
    /// Game time and timers.
    pub clock: GameClock,
    /// Pending timed events.
    pub events: EventQueue,
    /// Pending requests.
    pub requests: RequestQueue,
    /// Critter round-robin position.
    pub critter_cursor: usize,
    /// Whether spatial triggers fire.
    pub spatial_enabled: bool,
    /// Whether scripts run at all.
    pub enabled: bool,
    /// The map script.
    pub map_sid: Option<ScriptId>,
    /// Exported variables, sorted by name.
    pub externals: Vec<(String, Value)>,
}

// =============================================================================
// Scheduler
// =============================================================================

/// Decides which scripts run, and runs them.
pub struct Scheduler {
    pub(crate) config: SchedulerConfig,
    pub(crate) registry: ScriptRegistry,
    pub(crate) events: EventQueue,
    pub(crate) requests: RequestQueue,
    pub(crate) clock: GameClock,
    pub(crate) loader: Box<dyn ImageSource>,
    pub(crate) programs: Vec<Program>,
    pub(crate) externals: HashMap<String, Value>,
    pub(crate) scratch: TempArrays,
    pending_releases: Vec<(ProgramId, ProgramId)>,
    running: Vec<ScriptId>,
    next_program_id: u32,
    pub(crate) critter_cursor: usize,
    pub(crate) spatial_enabled: bool,
    enabled: bool,
    pub(crate) map_sid: Option<ScriptId>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("scripts", &self.registry.len())
            .field("programs", &self.programs.len())
            .field("events", &self.events.len())
            .field("requests", &self.requests.pending())
            .field("time", &self.clock.time())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Creates a scheduler loading images from `loader`.
    #[must_use]
    pub fn new(loader: impl ImageSource + 'static) -> Self {
        Self {
            config: SchedulerConfig::default(),
            registry: ScriptRegistry::new(),
            events: EventQueue::new(),
            requests: RequestQueue::new(),
            clock: GameClock::new(),
            loader: Box::new(loader),
            programs: Vec::new(),
            externals: HashMap::new(),
            scratch: TempArrays::new(),
            pending_releases: Vec::new(),
            running: Vec::new(),
            next_program_id: 0,
            critter_cursor: 0,
            spatial_enabled: true,
            enabled: true,
            map_sid: None,
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the registry.
    #[must_use]
    pub fn with_registry(mut self, registry: ScriptRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the game clock.
    #[must_use]
    pub fn with_clock(mut self, clock: GameClock) -> Self {
        self.clock = clock;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The script registry.
    #[must_use]
    pub fn registry(&self) -> &ScriptRegistry {
        &self.registry
    }

    /// The script registry, mutably.
    pub fn registry_mut(&mut self) -> &mut ScriptRegistry {
        &mut self.registry
    }

    /// Pending timed events.
    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Pending timed events, mutably.
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Pending requests.
    #[must_use]
    pub fn requests(&self) -> &RequestQueue {
        &self.requests
    }

    /// Pending requests, mutably.
    pub fn requests_mut(&mut self) -> &mut RequestQueue {
        &mut self.requests
    }

    /// The game clock.
    #[must_use]
    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// The game clock, mutably.
    pub fn clock_mut(&mut self) -> &mut GameClock {
        &mut self.clock
    }

    /// Current game time.
    #[must_use]
    pub fn game_time(&self) -> GameTime {
        self.clock.time()
    }

    /// Programs started by scripts and not yet finished.
    #[must_use]
    pub fn background_programs(&self) -> &[Program] {
        &self.programs
    }

    /// Scratch arrays allocated this tick.
    #[must_use]
    pub fn temp_arrays(&self) -> &TempArrays {
        &self.scratch
    }

    /// An exported variable.
    #[must_use]
    pub fn external(&self, name: &str) -> Option<&Value> {
        self.externals.get(name)
    }

    /// True if scripts run.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables all script execution.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// True if spatial triggers fire.
    #[must_use]
    pub fn spatial_enabled(&self) -> bool {
        self.spatial_enabled
    }

    /// Enables or disables spatial triggers.
    pub fn set_spatial_enabled(&mut self, enabled: bool) {
        self.spatial_enabled = enabled;
    }

    /// The map script, which runs first in map broadcasts.
    #[must_use]
    pub fn map_script(&self) -> Option<ScriptId> {
        self.map_sid
    }

    /// Sets the map script.
    pub fn set_map_script(&mut self, sid: Option<ScriptId>) {
        self.map_sid = sid;
    }

    /// Critter round-robin position.
    #[must_use]
    pub fn critter_cursor(&self) -> usize {
        self.critter_cursor
    }

    /// True if `sid` is executing or re-entered through `run_proc`.
    #[must_use]
    pub fn is_running(&self, sid: ScriptId) -> bool {
        self.running.contains(&sid)
    }

    // -------------------------------------------------------------------------
    // Scripts
    // -------------------------------------------------------------------------

    /// Adds a script.
    ///
    /// # Errors
    ///
    /// Returns `AllocationExhausted` when the type has no free ids.
    pub fn add_script(&mut self, script_type: ScriptType) -> Result<ScriptId> {
        self.registry.add(script_type)
    }

    /// Looks up a script.
    ///
    /// # Errors
    ///
    /// Returns `ScriptNotFound` for stale or invalid ids.
    pub fn get(&self, sid: ScriptId) -> Result<&Script> {
        self.registry.get(sid)
    }

    /// Removes a script and everything hanging off it.
    ///
    /// Withdraws a combat request its owner made, cancels events its owner
    /// queued, unbinds its owner from other scripts' source and target,
    /// stops its background programs, and releases its local variables.
    /// Removing a script while it runs is allowed; its program is dropped
    /// when the invocation ends.
    ///
    /// # Errors
    ///
    /// Returns `ScriptNotFound` for stale or invalid ids.
    pub fn remove_script(&mut self, sid: ScriptId) -> Result<Script> {
        let owner = self.registry.get(sid)?.owner;
        if let Some(owner) = owner {
            self.requests.clear_combat_by(owner);
            self.events.remove_owned_by(owner);
        }
        self.events
            .remove_where(|e| matches!(e.kind, EventKind::Script { sid: s, .. } if s == sid));
        for program in &mut self.programs {
            if program.sid() == Some(sid) {
                program.kill();
            }
        }
        let removed = self.registry.remove(sid)?;
        if let Some(owner) = owner {
            self.registry.unbind_object(owner);
        }
        if self.map_sid == Some(sid) {
            self.map_sid = None;
        }
        log::debug!("removed script {sid}");
        Ok(removed)
    }

    /// Removes every script not flagged persistent, as on leaving a map.
    pub fn remove_all_scripts(&mut self) -> usize {
        let doomed: Vec<ScriptId> = self
            .registry
            .iter_all()
            .filter(|s| !s.flags.contains(ScriptFlags::PERSISTENT))
            .map(Script::sid)
            .collect();
        doomed
            .into_iter()
            .filter(|&sid| self.remove_script(sid).is_ok())
            .count()
    }

    /// Queues a script's timed procedure `delay` ticks from now.
    ///
    /// The event belongs to the script's owner and is cancelled with it.
    ///
    /// # Errors
    ///
    /// Returns `ScriptNotFound` for stale or invalid ids.
    pub fn add_timer_event(&mut self, sid: ScriptId, delay: i32, param: i32) -> Result<()> {
        let script = self.registry.get(sid)?;
        let delay = u32::try_from(delay).unwrap_or(0);
        let event = Event::new(
            self.clock.time().plus(delay),
            EventKind::Script {
                sid,
                fixed_param: param,
            },
        )
        .with_owner(script.owner, script.owner_id);
        self.events.push(event);
        Ok(())
    }

    /// Re-resolves owners of scripts and events after a load.
    pub fn rebind_owners(&mut self, world: &dyn World) {
        self.registry.rebind_owners(|id| world.object_by_id(id));
        self.events.rebind_owners(|id| world.object_by_id(id));
    }

    /// Whether a script implements a procedure, loading it if needed.
    pub fn has_proc(&mut self, world: &dyn World, sid: ScriptId, kind: ProcKind) -> bool {
        if let Err(e) = self.load_script(world, sid) {
            log::debug!("{sid}: {e}");
            return false;
        }
        self.registry
            .get(sid)
            .is_ok_and(|s| s.procedure(kind).is_some())
    }

    /// Loads a script's program and runs its initializer, if not done yet.
    ///
    /// # Errors
    ///
    /// Returns a load error, or the error that aborted the initializer.
    pub fn load_script(&mut self, world: &dyn World, sid: ScriptId) -> Result<()> {
        if self.running.contains(&sid) {
            return Ok(());
        }
        if !self.ensure_loaded(sid)? {
            return Ok(());
        }
        let mut program = self.take_program(sid)?;
        self.running.push(sid);
        let result = self.initialize(world, sid, &mut program);
        self.running.retain(|&s| s != sid);
        self.return_program(sid, program);
        result
    }

    // -------------------------------------------------------------------------
    // Execution
    // -------------------------------------------------------------------------

    /// Runs one procedure of a script.
    ///
    /// # Errors
    ///
    /// - `ScriptsDisabled` while scripts are disabled
    /// - `ScriptBusy` if the script is already executing
    /// - `ScriptNotFound` for stale ids
    /// - load errors, argument count errors, and fatal script errors
    pub fn try_exec_proc(
        &mut self,
        world: &dyn World,
        sid: ScriptId,
        kind: ProcKind,
    ) -> Result<ExecStatus> {
        if !self.enabled {
            return Err(Error::new(ErrorKind::ScriptsDisabled));
        }
        if self.running.contains(&sid) {
            return Err(Error::script_busy(sid));
        }
        self.registry.get_mut(sid)?.overrides = 0;
        let first_load = self.ensure_loaded(sid)?;

        let mut program = self.take_program(sid)?;
        // Blocked, waiting, or released by a child but not yet continued.
        if program.is_mid_invocation() {
            self.return_program(sid, program);
            return Ok(ExecStatus::Suspended);
        }

        let script = self.registry.get_mut(sid)?;
        if script.target.is_none() {
            script.target = script.owner;
        }
        script.flags.insert(ScriptFlags::EXECUTED);

        self.running.push(sid);
        let result = self.run_procedure(world, sid, kind, first_load, &mut program);
        self.running.retain(|&s| s != sid);

        if let Ok(script) = self.registry.get_mut(sid) {
            script.source = None;
        }
        self.return_program(sid, program);
        self.apply_releases();
        result
    }

    /// Runs one procedure, logging any failure.
    ///
    /// Returns false if the script has no such procedure, or if it could
    /// not run or aborted.
    pub fn exec_proc(&mut self, world: &dyn World, sid: ScriptId, kind: ProcKind) -> bool {
        match self.try_exec_proc(world, sid, kind) {
            Ok(ExecStatus::NoHandler) => false,
            Ok(_) => true,
            Err(e) => {
                match &e.kind {
                    ErrorKind::ScriptBusy(_) | ErrorKind::ScriptsDisabled => {
                        log::debug!("{sid} {kind}: {e}");
                    }
                    _ => log::warn!("{sid} {kind}: {e}"),
                }
                false
            }
        }
    }

    fn run_procedure(
        &mut self,
        world: &dyn World,
        sid: ScriptId,
        kind: ProcKind,
        first_load: bool,
        program: &mut Program,
    ) -> Result<ExecStatus> {
        if first_load {
            self.initialize(world, sid, program)?;
        }
        let script = self.registry.get_mut(sid)?;
        let Some(index) = script.procedure(kind) else {
            log::trace!("{sid}: no {kind}");
            return Ok(ExecStatus::NoHandler);
        };
        script.action = i32::try_from(kind.slot()).unwrap_or_default();

        let vm = self.interpreter();
        let mut ctx = ScriptContext::new(self, world);
        let outcome = vm.execute_procedure(program, index, &[], &mut ctx)?;
        Ok(outcome.into())
    }

    fn initialize(&mut self, world: &dyn World, sid: ScriptId, program: &mut Program) -> Result<()> {
        let vm = self.interpreter();
        {
            let mut ctx = ScriptContext::new(self, world);
            vm.run_initializer(program, &mut ctx)?;
        }
        let procs = ProcTable::locate(program.image());
        let script = self.registry.get_mut(sid)?;
        script.procs = procs;
        script.action = 0;
        Ok(())
    }

    /// Loads the script's program unless a live one is attached.
    ///
    /// Returns true if a fresh program was loaded.
    fn ensure_loaded(&mut self, sid: ScriptId) -> Result<bool> {
        let script = self.registry.get_mut(sid)?;
        if script.is_loaded() {
            if script.program.as_deref().is_some_and(|p| !p.is_finished()) {
                return Ok(false);
            }
            log::debug!("{sid}: reloading");
            script.unload();
        }
        let index = script.script_index;
        let name = self
            .registry
            .catalog()
            .file_name(index)
            .ok_or_else(|| Error::load(format!("script #{index}"), "no catalog entry"))?;
        let image = self.loader.load(&name)?;
        let id = self.allocate_program_id();
        let script = self.registry.get_mut(sid)?;
        script.program = Some(Box::new(Program::new(id, image, Some(sid))));
        script.flags.insert(ScriptFlags::LOADED);
        log::debug!("{sid}: loaded {name} as {id}");
        Ok(true)
    }

    fn take_program(&mut self, sid: ScriptId) -> Result<Program> {
        self.registry
            .get_mut(sid)?
            .program
            .take()
            .map(|p| *p)
            .ok_or_else(|| Error::new(ErrorKind::Internal(format!("{sid} has no program"))))
    }

    /// Puts a program back into its script, dropping it if it finished or
    /// the script was removed meanwhile.
    fn return_program(&mut self, sid: ScriptId, program: Program) {
        match self.registry.get_mut(sid) {
            Ok(script) if program.is_finished() => {
                log::debug!("{sid}: program finished");
                script.unload();
            }
            Ok(script) => script.program = Some(Box::new(program)),
            Err(_) => log::debug!("{sid}: removed while running"),
        }
    }

    pub(crate) fn interpreter(&self) -> Interpreter {
        Interpreter::new().with_limits(self.config.vm_limits())
    }

    pub(crate) fn allocate_program_id(&mut self) -> ProgramId {
        self.next_program_id += 1;
        ProgramId(self.next_program_id)
    }

    // -------------------------------------------------------------------------
    // Programs
    // -------------------------------------------------------------------------

    /// Resumes due script programs and runs background programs.
    pub fn update_programs(&mut self, world: &dyn World) {
        let now = self.clock.time();
        let due: Vec<ScriptId> = self
            .registry
            .iter_all()
            .filter(|s| s.program.as_deref().is_some_and(|p| needs_resume(p, now)))
            .map(Script::sid)
            .collect();
        for sid in due {
            if let Err(e) = self.resume_script(world, sid) {
                log::warn!("{sid}: {e}");
            }
        }
        self.run_background(world);
        self.apply_releases();
    }

    fn resume_script(&mut self, world: &dyn World, sid: ScriptId) -> Result<()> {
        if self.running.contains(&sid) {
            return Ok(());
        }
        let mut program = self.take_program(sid)?;
        self.running.push(sid);
        let vm = self.interpreter();
        let result = {
            let mut ctx = ScriptContext::new(self, world);
            vm.resume(&mut program, &mut ctx)
        };
        self.running.retain(|&s| s != sid);
        self.return_program(sid, program);
        result.map(|_| ())
    }

    fn run_background(&mut self, world: &dyn World) {
        let now = self.clock.time();
        let vm = self.interpreter();
        let pending = std::mem::take(&mut self.programs);
        let mut kept = Vec::with_capacity(pending.len());

        for mut program in pending {
            if program.sid().is_some_and(|sid| !self.registry.contains(sid)) {
                program.kill();
            }
            let result = if program.is_finished() {
                Ok(Outcome::Finished)
            } else if !program.is_initialized() {
                let mut ctx = ScriptContext::new(self, world);
                vm.run_initializer(&mut program, &mut ctx)
            } else if needs_resume(&program, now) {
                let mut ctx = ScriptContext::new(self, world);
                vm.resume(&mut program, &mut ctx)
            } else if program.is_waiting() || program.is_blocked() {
                kept.push(program);
                continue;
            } else {
                Ok(Outcome::Finished)
            };

            match result {
                Ok(Outcome::Waiting(_) | Outcome::Blocked) => kept.push(program),
                done => {
                    if let Err(e) = done {
                        log::warn!("{} {}: {e}", program.name(), program.id());
                    }
                    if let Some(parent) = program.parent() {
                        self.release_parent(parent, program.id());
                    }
                    log::trace!("{} {} done", program.name(), program.id());
                }
            }
        }

        kept.append(&mut self.programs);
        self.programs = kept;
    }

    /// Drops every background program and pending parent release, as before
    /// loading a saved map.
    pub fn clear_programs(&mut self) {
        log::debug!("dropping {} background programs", self.programs.len());
        self.programs.clear();
        self.pending_releases.clear();
    }

    /// True if any program is inside a critical section.
    #[must_use]
    pub fn critical_open(&self) -> bool {
        self.registry
            .iter_all()
            .filter_map(|s| s.program.as_deref())
            .chain(self.programs.iter())
            .any(Program::is_critical)
    }

    pub(crate) fn release_parent(&mut self, parent: ProgramId, child: ProgramId) {
        if !self.try_release(parent, child) {
            self.pending_releases.push((parent, child));
        }
    }

    fn try_release(&mut self, parent: ProgramId, child: ProgramId) -> bool {
        let in_scripts = self
            .registry
            .iter_all_mut()
            .filter_map(|s| s.program.as_deref_mut())
            .find(|p| p.id() == parent);
        if let Some(program) = in_scripts {
            return program.release_child(child);
        }
        self.programs
            .iter_mut()
            .find(|p| p.id() == parent)
            .is_some_and(|p| p.release_child(child))
    }

    /// Retries releases whose parent was out of reach when the child ended.
    /// Parents that no longer exist are forgotten.
    fn apply_releases(&mut self) {
        if self.running.is_empty() {
            for (parent, child) in std::mem::take(&mut self.pending_releases) {
                if !self.try_release(parent, child) {
                    log::trace!("{child}: parent {parent} is gone");
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // State
    // -------------------------------------------------------------------------

    /// Captures the scheduler's own state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        let mut externals: Vec<(String, Value)> = self
            .externals
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        externals.sort_by(|a, b| a.0.cmp(&b.0));
        SchedulerState {
            config: self.config,
            clock: self.clock.clone(),
            events: self.events.clone(),
            requests: self.requests.clone(),
            critter_cursor: self.critter_cursor,
            spatial_enabled: self.spatial_enabled,
            enabled: self.enabled,
            map_sid: self.map_sid,
            externals,
        }
    }

    /// Restores state captured by [`Scheduler::state`].
    pub fn restore_state(&mut self, state: SchedulerState) {
        self.config = state.config;
        self.clock = state.clock;
        self.events = state.events;
        self.requests = state.requests;
        self.critter_cursor = state.critter_cursor;
        self.spatial_enabled = state.spatial_enabled;
        self.enabled = state.enabled;
        self.map_sid = state.map_sid;
        self.externals = state.externals.into_iter().collect();
    }
}

/// A program the update pass should continue: due after a wait, or released
/// from a child mid-invocation.
fn needs_resume(program: &Program, now: GameTime) -> bool {
    if program.is_finished() || program.is_blocked() {
        return false;
    }
    if program.is_waiting() {
        return program.is_due(now);
    }
    program.is_mid_invocation()
}
