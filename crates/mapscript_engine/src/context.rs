//! The dispatcher's implementation of [`VmContext`].
//!
//! A [`ScriptContext`] lives for one interpreter call. The running program
//! has been taken out of its script, so the context can hold the whole
//! scheduler mutably: nested `run_proc` calls re-enter the dispatcher, and
//! the busy check rejects calls back into the running script.

use std::sync::Arc;

use mapscript_foundation::{
    Error, ErrorKind, Fault, GameTime, ObjectHandle, ProcKind, Result, ScriptId, Value,
};
use mapscript_language::{HostOp, Image, Program, ProgramId, VmContext};

use crate::dispatcher::{ExecStatus, Scheduler};
use crate::requests::{CombatRequest, ElevatorRequest, ExplosionRequest, TransferRequest};
use crate::world::World;

/// Host services for programs run by a [`Scheduler`].
pub(crate) struct ScriptContext<'a> {
    scheduler: &'a mut Scheduler,
    world: &'a dyn World,
}

impl<'a> ScriptContext<'a> {
    pub(crate) fn new(scheduler: &'a mut Scheduler, world: &'a dyn World) -> Self {
        Self { scheduler, world }
    }

    fn request_elevator(&mut self, sid: ScriptId, elevator: i32) -> Result<()> {
        let owner = self.scheduler.registry.get(sid)?.owner;
        let Some(location) = owner.and_then(|o| self.world.object_location(o)) else {
            log::debug!("{sid}: elevator request from an object off the map");
            return Ok(());
        };
        let request = owner
            .and_then(|o| self.world.elevator_near(o))
            .unwrap_or(ElevatorRequest {
                elevator,
                level: location.elevation(),
            });
        if request.elevator == -1 {
            log::debug!("{sid}: no elevator");
        } else {
            self.scheduler.requests.request_elevator(request);
        }
        Ok(())
    }

    fn run_proc(&mut self, caller: ScriptId, sid: i32, kind: i32) -> Result<Value> {
        let sid = ScriptId::from_raw(sid);
        let Some(kind) = ProcKind::from_raw(kind) else {
            return Err(Error::fatal(Fault::Host(format!("bad procedure kind {kind}"))));
        };
        match self.scheduler.try_exec_proc(self.world, sid, kind) {
            Ok(ExecStatus::NoHandler) => Ok(Value::from(false)),
            Ok(_) => Ok(Value::from(true)),
            Err(e) => {
                log::debug!("{caller}: run_proc {sid} {kind}: {e}");
                Ok(Value::from(false))
            }
        }
    }
}

fn bound(sid: Option<ScriptId>) -> Result<ScriptId> {
    sid.ok_or_else(|| Error::new(ErrorKind::Internal("program has no script".to_string())))
}

fn arg(args: &[Value], index: usize) -> Result<&Value> {
    args.get(index)
        .ok_or_else(|| Error::fatal(Fault::StackUnderflow))
}

fn int(args: &[Value], index: usize) -> Result<i32> {
    arg(args, index)?.as_int()
}

fn object(args: &[Value], index: usize) -> Result<Option<ObjectHandle>> {
    arg(args, index)?.as_object()
}

fn transfer(args: &[Value]) -> Result<TransferRequest> {
    Ok(TransferRequest {
        taker: object(args, 0)?,
        from: object(args, 1)?,
    })
}

impl VmContext for ScriptContext<'_> {
    fn game_time(&self) -> GameTime {
        self.scheduler.clock.time()
    }

    fn host_call(
        &mut self,
        sid: Option<ScriptId>,
        op: HostOp,
        args: &[Value],
    ) -> Result<Option<Value>> {
        let sid = bound(sid)?;
        let value = match op {
            HostOp::GameTime => {
                let ticks = self.scheduler.clock.time().ticks();
                Value::Int(i32::try_from(ticks).unwrap_or(i32::MAX))
            }
            HostOp::SelfObj => self.scheduler.registry.get(sid)?.owner_value(),
            HostOp::SourceObj => Value::object(self.scheduler.registry.get(sid)?.source),
            HostOp::TargetObj => Value::object(self.scheduler.registry.get(sid)?.target),
            HostOp::FixedParam => Value::Int(self.scheduler.registry.get(sid)?.fixed_param),
            HostOp::ScriptAction => Value::Int(self.scheduler.registry.get(sid)?.action),
            HostOp::SelfSid => Value::Int(sid.raw()),
            HostOp::LocalVar => {
                Value::Int(self.scheduler.registry.get_local_var(sid, int(args, 0)?)?)
            }
            HostOp::SetLocalVar => {
                self.scheduler
                    .registry
                    .set_local_var(sid, int(args, 0)?, int(args, 1)?)?;
                return Ok(None);
            }
            HostOp::AddTimerEvent => {
                self.scheduler
                    .add_timer_event(sid, int(args, 0)?, int(args, 1)?)?;
                return Ok(None);
            }
            HostOp::ScriptOverrides => {
                self.scheduler.registry.get_mut(sid)?.overrides = 1;
                return Ok(None);
            }
            HostOp::RunProc => self.run_proc(sid, int(args, 0)?, int(args, 1)?)?,

            HostOp::RequestCombat => {
                let attacker = object(args, 0)?;
                let defender = object(args, 1)?;
                let request = (attacker.is_some() || defender.is_some())
                    .then_some(CombatRequest { attacker, defender });
                if let Err(e) = self.scheduler.requests.request_combat(request) {
                    log::debug!("{sid}: {e}");
                }
                return Ok(None);
            }
            HostOp::RequestTownMap => {
                self.scheduler.requests.request_town_map();
                return Ok(None);
            }
            HostOp::RequestWorldMap => {
                self.scheduler.requests.request_world_map();
                return Ok(None);
            }
            HostOp::RequestElevator => {
                self.request_elevator(sid, int(args, 0)?)?;
                return Ok(None);
            }
            HostOp::RequestExplosion => {
                self.scheduler.requests.request_explosion(ExplosionRequest {
                    tile: int(args, 0)?,
                    elevation: int(args, 1)?,
                    min_damage: int(args, 2)?,
                    max_damage: int(args, 3)?,
                });
                return Ok(None);
            }
            HostOp::RequestDialog => {
                self.scheduler.requests.request_dialog(object(args, 0)?);
                return Ok(None);
            }
            HostOp::RequestEndgame => {
                self.scheduler.requests.request_endgame();
                return Ok(None);
            }
            HostOp::RequestLooting => {
                self.scheduler.requests.request_looting(transfer(args)?);
                return Ok(None);
            }
            HostOp::RequestStealing => {
                self.scheduler.requests.request_stealing(transfer(args)?);
                return Ok(None);
            }

            HostOp::TempArray => Value::Int(self.scheduler.scratch.allocate(int(args, 0)?)?),
            HostOp::SetArray => {
                let value = arg(args, 2)?.clone();
                self.scheduler
                    .scratch
                    .set(int(args, 0)?, int(args, 1)?, value)?;
                return Ok(None);
            }
            HostOp::GetArray => self.scheduler.scratch.get(int(args, 0)?, int(args, 1)?)?,

            HostOp::DebugMsg => {
                log::debug!(target: "mapscript::script", "{sid}: {}", arg(args, 0)?);
                return Ok(None);
            }
        };
        Ok(Some(value))
    }

    fn load_image(&mut self, name: &str) -> Result<Arc<Image>> {
        self.scheduler.loader.load(name)
    }

    fn next_program_id(&mut self) -> ProgramId {
        self.scheduler.allocate_program_id()
    }

    fn adopt(&mut self, program: Program) {
        log::debug!("adopted {} {}", program.name(), program.id());
        self.scheduler.programs.push(program);
    }

    fn release_parent(&mut self, parent: ProgramId, child: ProgramId) {
        self.scheduler.release_parent(parent, child);
    }

    fn fetch_external(&self, name: &str) -> Result<Value> {
        self.scheduler
            .externals
            .get(name)
            .cloned()
            .ok_or_else(|| not_exported(name))
    }

    fn store_external(&mut self, name: &str, value: Value) -> Result<()> {
        let slot = self
            .scheduler
            .externals
            .get_mut(name)
            .ok_or_else(|| not_exported(name))?;
        *slot = value;
        Ok(())
    }

    fn export_variable(&mut self, name: &str) -> Result<()> {
        self.scheduler
            .externals
            .entry(name.to_string())
            .or_insert(Value::NULL);
        Ok(())
    }
}

fn not_exported(name: &str) -> Error {
    Error::new(ErrorKind::Internal(format!(
        "external variable '{name}' is not exported"
    )))
}
