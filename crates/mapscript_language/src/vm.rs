//! Stack-based interpreter for script programs.
//!
//! The [`Interpreter`] is stateless apart from its limits; all execution
//! state lives in the [`Program`]. An invocation (the initializer, a
//! procedure entered from the host, or the continuation of a suspended one)
//! runs until the outermost frame returns, the program waits, blocks on a
//! child, or finishes.
//!
//! # Failure
//!
//! Every invocation records a checkpoint of the program's stacks when it
//! starts. Any error raised while it runs rewinds the program to that
//! checkpoint. Fatal errors additionally mark the program exited; other
//! errors (a wrong argument count) abort only the current invocation.
//!
//! # Host access
//!
//! Anything that touches the world, other scripts, or other programs goes
//! through the [`VmContext`] trait.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]

mod context;

pub use context::{NoContext, VmContext};

use std::cmp::Ordering;
use std::sync::Arc;

use mapscript_foundation::{Error, ErrorContext, Fault, GameTime, Result, Value};

use crate::host::HostOp;
use crate::image::Image;
use crate::opcode::{Instruction, OPERAND_SIZE, Opcode, WORD_SIZE};
use crate::program::{HOST_RETURN, Program, ProgramFlags};

// =============================================================================
// Limits and outcomes
// =============================================================================

/// Resource limits applied to every invocation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VmLimits {
    /// Maximum depth of the value stack.
    pub max_stack: usize,
    /// Maximum depth of the control stack.
    pub max_control: usize,
    /// Maximum instructions executed by one run before the program is killed.
    pub max_instructions: u64,
}

impl Default for VmLimits {
    fn default() -> Self {
        // A 4 KiB stack of 6-byte entries.
        Self {
            max_stack: 682,
            max_control: 682,
            max_instructions: 1_000_000,
        }
    }
}

/// How an invocation stopped.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The outermost frame returned this value.
    Returned(Value),
    /// Suspended until the given game time.
    Waiting(GameTime),
    /// Waiting on a child program.
    Blocked,
    /// Exited or stopped; the program never runs again.
    Finished,
}

// =============================================================================
// Interpreter
// =============================================================================

/// Executes programs.
#[derive(Clone, Debug, Default)]
pub struct Interpreter {
    limits: VmLimits,
}

impl Interpreter {
    /// Creates an interpreter with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the limits.
    #[must_use]
    pub fn with_limits(mut self, limits: VmLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the limits.
    #[must_use]
    pub fn limits(&self) -> VmLimits {
        self.limits
    }

    /// Runs the module prologue and initializer of a freshly loaded program.
    ///
    /// Does nothing for a program that is already initialized.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the initializer.
    pub fn run_initializer<C: VmContext + ?Sized>(
        &self,
        program: &mut Program,
        ctx: &mut C,
    ) -> Result<Outcome> {
        if program.is_initialized() {
            return Ok(Outcome::Returned(Value::NULL));
        }
        program.flags.remove(ProgramFlags::NEVER_RUN);
        self.invoke(program, ctx, 0, &[])
    }

    /// Invokes a procedure by index with the given arguments.
    ///
    /// A finished program is not run. A program that is mid-invocation
    /// (suspended, blocked, or released but not yet resumed) is not
    /// re-entered; its current state is reported instead, with a released
    /// program reported as blocked.
    ///
    /// # Errors
    ///
    /// Returns an argument count error without touching the program if
    /// `args` does not match the procedure's arity, or the error that
    /// aborted the invocation.
    pub fn execute_procedure<C: VmContext + ?Sized>(
        &self,
        program: &mut Program,
        index: usize,
        args: &[Value],
        ctx: &mut C,
    ) -> Result<Outcome> {
        if let Some(outcome) = Self::unavailable(program) {
            return Ok(outcome);
        }
        let procedure = program
            .image()
            .procedure(index)
            .ok_or_else(|| Error::fatal(Fault::BadProcedure(index as i64)))?;
        if procedure.arg_count != args.len() {
            return Err(Error::argument_count(
                procedure.name.clone(),
                procedure.arg_count,
                args.len(),
            ));
        }
        let entry = procedure.body_address;
        log::trace!("{}: enter {}", program.name(), procedure.name);
        self.invoke(program, ctx, entry, args)
    }

    /// Continues an invocation that was suspended or blocked.
    ///
    /// The caller decides when a waiting program is due; resuming clears
    /// the wait unconditionally.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the invocation.
    pub fn resume<C: VmContext + ?Sized>(
        &self,
        program: &mut Program,
        ctx: &mut C,
    ) -> Result<Outcome> {
        if program.is_finished() {
            return Ok(Outcome::Finished);
        }
        if program.is_blocked() {
            return Ok(Outcome::Blocked);
        }
        if !program.is_mid_invocation() {
            return Ok(Outcome::Returned(program.return_value().clone()));
        }
        program.flags.remove(ProgramFlags::WAITING);
        self.run(program, ctx)
    }

    fn unavailable(program: &Program) -> Option<Outcome> {
        if program.is_finished() {
            Some(Outcome::Finished)
        } else if program.is_blocked() {
            Some(Outcome::Blocked)
        } else if program.is_waiting() {
            Some(Outcome::Waiting(program.wait_until))
        } else if program.is_mid_invocation() {
            // Released by its child; only `resume` may continue it.
            Some(Outcome::Blocked)
        } else {
            None
        }
    }

    fn invoke<C: VmContext + ?Sized>(
        &self,
        program: &mut Program,
        ctx: &mut C,
        entry: usize,
        args: &[Value],
    ) -> Result<Outcome> {
        program.capture();
        program.flags.remove(ProgramFlags::RETURNED);
        if let Err(err) = self.enter_frame(program, entry, args) {
            return Err(Self::abort(program, err));
        }
        self.run(program, ctx)
    }

    fn enter_frame(&self, program: &mut Program, entry: usize, args: &[Value]) -> Result<()> {
        for arg in args {
            program.push(arg.clone(), self.limits.max_stack)?;
        }
        program.push_control(Value::Int(HOST_RETURN), self.limits.max_control)?;
        program.push_control(Value::Int(program.frame as i32), self.limits.max_control)?;
        program.frame = program.stack.len() - args.len();
        program.ip = entry;
        Ok(())
    }

    fn run<C: VmContext + ?Sized>(&self, program: &mut Program, ctx: &mut C) -> Result<Outcome> {
        let image = Arc::clone(program.image());
        let mut executed: u64 = 0;
        while !program.flags.intersects(ProgramFlags::HALTING) {
            if executed >= self.limits.max_instructions {
                let limit = self.limits.max_instructions;
                return Err(Self::abort(program, Error::fatal(Fault::InstructionLimit { limit })));
            }
            executed += 1;
            let at = program.ip;
            if let Err(err) = self.step(&image, program, ctx) {
                let context = ErrorContext::new()
                    .with_script(program.name())
                    .with_offset(at);
                return Err(Self::abort(program, err.with_context(context)));
            }
        }
        Ok(Self::finish(program))
    }

    fn finish(program: &mut Program) -> Outcome {
        let flags = program.flags;
        if flags.intersects(ProgramFlags::FINISHED) {
            program.checkpoint = None;
            Outcome::Finished
        } else if flags.contains(ProgramFlags::WAITING) {
            Outcome::Waiting(program.wait_until)
        } else if flags.intersects(ProgramFlags::BLOCKED) {
            Outcome::Blocked
        } else {
            program.checkpoint = None;
            Outcome::Returned(program.return_value.clone())
        }
    }

    fn abort(program: &mut Program, err: Error) -> Error {
        program.restore();
        if err.is_fatal() {
            program.flags.insert(ProgramFlags::EXITED | ProgramFlags::FATAL);
        }
        log::warn!("{}: {err}", program.name());
        err
    }

    // =========================================================================
    // Instruction dispatch
    // =========================================================================

    fn step<C: VmContext + ?Sized>(
        &self,
        image: &Image,
        program: &mut Program,
        ctx: &mut C,
    ) -> Result<()> {
        let at = program.ip;
        let word = image
            .read_word(at)
            .ok_or_else(|| Error::fatal(Fault::BadAddress(at as i64)))?;
        let instruction =
            Instruction::decode(word).ok_or_else(|| Error::fatal(Fault::InvalidOpcode(word)))?;
        log::trace!("{} {at:#06x} {instruction:?}", program.name());
        program.ip = at + WORD_SIZE;

        match instruction {
            Instruction::PushInt => {
                let operand = self.operand(image, program)?;
                program.push(Value::Int(operand as i32), self.limits.max_stack)
            }
            Instruction::PushFloat => {
                let operand = self.operand(image, program)?;
                program.push(Value::Float(f32::from_bits(operand)), self.limits.max_stack)
            }
            Instruction::PushString => {
                let offset = self.operand(image, program)? as usize;
                let s = image
                    .static_string(offset)
                    .ok_or_else(|| Error::fatal(Fault::BadAddress(offset as i64)))?;
                program.push(Value::string(s), self.limits.max_stack)
            }
            Instruction::Op(op) => self.exec_op(op, image, program, ctx),
            Instruction::Host(op) => self.exec_host(op, program, ctx),
        }
    }

    fn operand(&self, image: &Image, program: &mut Program) -> Result<u32> {
        let at = program.ip;
        let value = image
            .read_operand(at)
            .ok_or_else(|| Error::fatal(Fault::BadAddress(at as i64)))?;
        program.ip = at + OPERAND_SIZE;
        Ok(value)
    }

    fn exec_op<C: VmContext + ?Sized>(
        &self,
        op: Opcode,
        image: &Image,
        program: &mut Program,
        ctx: &mut C,
    ) -> Result<()> {
        let max_stack = self.limits.max_stack;
        let max_control = self.limits.max_control;
        match op {
            Opcode::Noop => {}
            Opcode::EnterCriticalSection => program.flags.insert(ProgramFlags::CRITICAL),
            Opcode::LeaveCriticalSection => program.flags.remove(ProgramFlags::CRITICAL),

            Opcode::Jump => {
                let addr = program.pop_int()?;
                jump(image, program, addr)?;
            }
            Opcode::Call => {
                let index = program.pop_int()?;
                let argc = program.pop_int()?;
                let procedure = procedure(image, index)?;
                if usize::try_from(argc).ok() != Some(procedure.arg_count) {
                    return Err(Error::argument_count(
                        procedure.name.clone(),
                        procedure.arg_count,
                        argc.max(0) as usize,
                    ));
                }
                let argc = procedure.arg_count;
                if program.stack.len() < program.frame + argc {
                    return Err(Error::fatal(Fault::StackUnderflow));
                }
                program.push_control(Value::Int(program.ip as i32), max_control)?;
                program.push_control(Value::Int(program.frame as i32), max_control)?;
                program.frame = program.stack.len() - argc;
                program.ip = procedure.body_address;
            }

            Opcode::CallStart | Opcode::Spawn | Opcode::Fork | Opcode::Exec => {
                self.start_program(op, program, ctx)?;
            }
            Opcode::AToD => {
                let value = program.pop_control()?;
                program.push(value, max_stack)?;
            }
            Opcode::DToA => {
                let value = program.pop()?;
                program.push_control(value, max_control)?;
            }
            Opcode::Exit => program.flags.insert(ProgramFlags::EXITED),
            Opcode::Detach => {
                if let Some(parent) = program.parent.take() {
                    ctx.release_parent(parent, program.id());
                }
            }
            Opcode::StopProgram => program.flags.insert(ProgramFlags::STOPPED),

            Opcode::FetchGlobal => {
                let index = program.pop_int()?;
                let slot = slot(program.globals, index, program.stack.len())?;
                let value = program.stack[slot].clone();
                program.push(value, max_stack)?;
            }
            Opcode::StoreGlobal => {
                let index = program.pop_int()?;
                let value = program.pop()?;
                let slot = slot(program.globals, index, program.stack.len())?;
                program.stack[slot] = value;
            }
            Opcode::FetchExternal => {
                let name = program.pop()?;
                let value = ctx.fetch_external(name.as_str()?)?;
                program.push(value, max_stack)?;
            }
            Opcode::StoreExternal => {
                let name = program.pop()?;
                let value = program.pop()?;
                ctx.store_external(name.as_str()?, value)?;
            }
            Opcode::ExportVar => {
                let name = program.pop()?;
                ctx.export_variable(name.as_str()?)?;
            }

            Opcode::Swap => {
                let b = program.pop()?;
                let a = program.pop()?;
                program.push(b, max_stack)?;
                program.push(a, max_stack)?;
            }
            Opcode::SwapA => {
                let b = program.pop_control()?;
                let a = program.pop_control()?;
                program.push_control(b, max_control)?;
                program.push_control(a, max_control)?;
            }
            Opcode::Pop => {
                program.pop()?;
            }
            Opcode::Dup => {
                let value = program.pop()?;
                program.push(value.clone(), max_stack)?;
                program.push(value, max_stack)?;
            }

            Opcode::PopReturn => {
                let value = program.pop()?;
                if program.frame > program.stack.len() {
                    return Err(Error::fatal(Fault::StackUnderflow));
                }
                program.stack.truncate(program.frame);
                let return_to = Self::pop_frame(program)?;
                if return_to == HOST_RETURN {
                    program.return_value = value;
                    program.flags.insert(ProgramFlags::RETURNED);
                } else {
                    program.push(value, max_stack)?;
                    jump(image, program, return_to)?;
                }
            }
            Opcode::PopExit => {
                let return_to = Self::pop_frame(program)?;
                if return_to == HOST_RETURN {
                    program.return_value = Value::NULL;
                    program.flags.insert(ProgramFlags::RETURNED);
                } else {
                    jump(image, program, return_to)?;
                }
            }
            Opcode::CheckArgCount => {
                let index = program.pop_int()?;
                let argc = program.pop_int()?;
                let procedure = procedure(image, index)?;
                if usize::try_from(argc).ok() != Some(procedure.arg_count) {
                    return Err(Error::argument_count(
                        procedure.name.clone(),
                        procedure.arg_count,
                        argc.max(0) as usize,
                    ));
                }
            }
            Opcode::LookupProcByName => {
                let name = program.pop()?;
                let name = name.as_str()?;
                let index = image
                    .find_procedure(name)
                    .ok_or_else(|| Error::fatal(Fault::UnknownProcedure(name.to_string())))?;
                program.push(Value::Int(index as i32), max_stack)?;
            }
            Opcode::SetGlobal => program.globals = program.stack.len(),
            Opcode::FetchProcAddress => {
                let index = program.pop_int()?;
                let body = procedure(image, index)?.body_address;
                program.push(Value::Int(body as i32), max_stack)?;
            }
            Opcode::Dump => {
                let count = program.pop_int()?;
                let mut values = Vec::new();
                for _ in 0..count.max(0) {
                    values.push(program.pop()?);
                }
                values.reverse();
                log::debug!("{}: dump {values:?}", program.name());
            }

            Opcode::If | Opcode::While => {
                let condition = program.pop()?;
                let addr = program.pop_int()?;
                if !condition.is_truthy() {
                    jump(image, program, addr)?;
                }
            }
            Opcode::Store => {
                let index = program.pop_int()?;
                let value = program.pop()?;
                let slot = slot(program.frame, index, program.stack.len())?;
                program.stack[slot] = value;
            }
            Opcode::Fetch => {
                let index = program.pop_int()?;
                let slot = slot(program.frame, index, program.stack.len())?;
                let value = program.stack[slot].clone();
                program.push(value, max_stack)?;
            }

            Opcode::Equal
            | Opcode::NotEqual
            | Opcode::LessEqual
            | Opcode::GreaterEqual
            | Opcode::Less
            | Opcode::Greater => {
                let b = program.pop()?;
                let a = program.pop()?;
                let result = match op {
                    Opcode::Equal => equals(&a, &b),
                    Opcode::NotEqual => !equals(&a, &b),
                    Opcode::LessEqual => compare(&a, &b)? != Ordering::Greater,
                    Opcode::GreaterEqual => compare(&a, &b)? != Ordering::Less,
                    Opcode::Less => compare(&a, &b)? == Ordering::Less,
                    _ => compare(&a, &b)? == Ordering::Greater,
                };
                program.push(Value::from(result), max_stack)?;
            }

            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod => {
                let b = program.pop()?;
                let a = program.pop()?;
                program.push(arithmetic(op, &a, &b)?, max_stack)?;
            }

            Opcode::And | Opcode::Or => {
                let b = program.pop()?.is_truthy();
                let a = program.pop()?.is_truthy();
                let result = if op == Opcode::And { a && b } else { a || b };
                program.push(Value::from(result), max_stack)?;
            }
            Opcode::BitAnd | Opcode::BitOr | Opcode::BitXor => {
                let b = program.pop_int()?;
                let a = program.pop_int()?;
                let result = match op {
                    Opcode::BitAnd => a & b,
                    Opcode::BitOr => a | b,
                    _ => a ^ b,
                };
                program.push(Value::Int(result), max_stack)?;
            }
            Opcode::BitNot => {
                let a = program.pop_int()?;
                program.push(Value::Int(!a), max_stack)?;
            }
            Opcode::Floor => {
                let value = match program.pop()? {
                    Value::Float(f) => Value::Int(f.floor() as i32),
                    Value::Int(i) => Value::Int(i),
                    other => return Err(type_mismatch("number", &other)),
                };
                program.push(value, max_stack)?;
            }
            Opcode::Not => {
                let a = program.pop()?.is_truthy();
                program.push(Value::from(!a), max_stack)?;
            }
            Opcode::Negate => {
                let value = match program.pop()? {
                    Value::Int(i) => Value::Int(i.wrapping_neg()),
                    Value::Float(f) => Value::Float(-f),
                    other => return Err(type_mismatch("number", &other)),
                };
                program.push(value, max_stack)?;
            }

            Opcode::Wait => {
                let ticks = program.pop_int()?;
                let now = ctx.game_time();
                program.waited_at = now;
                program.wait_until = now.plus(ticks.max(0) as u32);
                program.flags.insert(ProgramFlags::WAITING);
            }
        }
        Ok(())
    }

    /// Pops a frame's saved frame pointer and return address.
    fn pop_frame(program: &mut Program) -> Result<i32> {
        let saved_frame = program.pop_control()?.as_int()?;
        let return_to = program.pop_control()?.as_int()?;
        program.frame = usize::try_from(saved_frame)
            .map_err(|_| Error::fatal(Fault::BadVariable(i64::from(saved_frame))))?;
        Ok(return_to)
    }

    fn exec_host<C: VmContext + ?Sized>(
        &self,
        op: HostOp,
        program: &mut Program,
        ctx: &mut C,
    ) -> Result<()> {
        let arity = op.arity();
        if program.stack.len() < arity {
            return Err(Error::fatal(Fault::StackUnderflow));
        }
        let args = program.stack.split_off(program.stack.len() - arity);
        let result = ctx
            .host_call(program.sid(), op, &args)
            .map_err(|e| {
                if e.is_fatal() {
                    e
                } else {
                    Error::fatal(Fault::Host(format!("{}: {e}", op.mnemonic())))
                }
            })?;
        if op.returns_value() {
            program.push(result.unwrap_or(Value::NULL), self.limits.max_stack)?;
        }
        Ok(())
    }

    // =========================================================================
    // Sub-programs
    // =========================================================================

    fn start_program<C: VmContext + ?Sized>(
        &self,
        op: Opcode,
        program: &mut Program,
        ctx: &mut C,
    ) -> Result<()> {
        let name = program.pop()?;
        let name = name.as_str()?;
        let image = ctx
            .load_image(name)
            .map_err(|e| Error::fatal(Fault::Host(e.to_string())))?;
        let id = ctx.next_program_id();
        log::debug!("{}: {} {name} as {id}", program.name(), op.mnemonic());

        match op {
            Opcode::CallStart => {
                let child = program.child_of(id, image, true);
                program.child = Some(id);
                program.flags.insert(ProgramFlags::BLOCKED_ON_CALL);
                ctx.adopt(child);
            }
            Opcode::Spawn => {
                let mut child = program.child_of(id, image, true);
                program.child = Some(id);
                program.flags.insert(ProgramFlags::BLOCKED_ON_SPAWN);
                if !program.is_critical() {
                    ctx.adopt(child);
                    return Ok(());
                }
                // Inside a critical section the child runs before the parent continues.
                let done = match self.run_initializer(&mut child, ctx) {
                    Ok(Outcome::Returned(_) | Outcome::Finished) | Err(_) => true,
                    Ok(Outcome::Waiting(_) | Outcome::Blocked) => false,
                };
                if done || child.parent().is_none() {
                    program.release_child(id);
                    child.orphan();
                }
                if !done {
                    ctx.adopt(child);
                }
            }
            Opcode::Fork => ctx.adopt(program.child_of(id, image, false)),
            _ => {
                let mut next = program.child_of(id, image, false);
                next.parent = program.parent.take();
                program.flags.insert(ProgramFlags::EXITED);
                ctx.adopt(next);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn jump(image: &Image, program: &mut Program, addr: i32) -> Result<()> {
    match usize::try_from(addr) {
        Ok(target) if target < image.bytes().len() => {
            program.ip = target;
            Ok(())
        }
        _ => Err(Error::fatal(Fault::BadAddress(i64::from(addr)))),
    }
}

fn procedure(image: &Image, index: i32) -> Result<&crate::image::Procedure> {
    usize::try_from(index)
        .ok()
        .and_then(|i| image.procedure(i))
        .ok_or_else(|| Error::fatal(Fault::BadProcedure(i64::from(index))))
}

fn slot(base: usize, index: i32, len: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .map(|i| base + i)
        .filter(|&s| s < len)
        .ok_or_else(|| Error::fatal(Fault::BadVariable(i64::from(index))))
}

fn type_mismatch(expected: &'static str, actual: &Value) -> Error {
    Error::fatal(Fault::TypeMismatch {
        expected,
        actual: actual.type_name(),
    })
}

fn as_float(value: &Value) -> Option<f32> {
    match value {
        Value::Int(i) => Some(*i as f32),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => x == y,
        _ => match (as_float(a), as_float(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

fn compare(a: &Value, b: &Value) -> Result<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        _ => match (as_float(a), as_float(b)) {
            (Some(x), Some(y)) => Ok(x.total_cmp(&y)),
            (Some(_), None) => Err(type_mismatch("number", b)),
            _ => Err(type_mismatch("number", a)),
        },
    }
}

fn arithmetic(op: Opcode, a: &Value, b: &Value) -> Result<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => {
            let (x, y) = (*x, *y);
            let result = match op {
                Opcode::Add => x.wrapping_add(y),
                Opcode::Sub => x.wrapping_sub(y),
                Opcode::Mul => x.wrapping_mul(y),
                Opcode::Div | Opcode::Mod if y == 0 => {
                    return Err(Error::fatal(Fault::DivisionByZero));
                }
                Opcode::Div => x.wrapping_div(y),
                _ => x.wrapping_rem(y),
            };
            Ok(Value::Int(result))
        }
        (Value::Str(_), _) | (_, Value::Str(_)) if op == Opcode::Add => {
            Ok(Value::string(&format!("{a}{b}")))
        }
        _ => {
            let x = as_float(a).ok_or_else(|| type_mismatch("number", a))?;
            let y = as_float(b).ok_or_else(|| type_mismatch("number", b))?;
            let result = match op {
                Opcode::Add => x + y,
                Opcode::Sub => x - y,
                Opcode::Mul => x * y,
                Opcode::Div | Opcode::Mod if y == 0.0 => {
                    return Err(Error::fatal(Fault::DivisionByZero));
                }
                Opcode::Div => x / y,
                _ => x % y,
            };
            Ok(Value::Float(result))
        }
    }
}
