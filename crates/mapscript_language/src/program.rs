//! Loaded programs.
//!
//! A [`Program`] is one executing instance of an [`Image`]: its own value
//! and control stacks, instruction pointer, frame and global base pointers,
//! suspension state, and links to a parent or child program.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use mapscript_foundation::{Error, Fault, GameTime, Result, ScriptId, Value};

use crate::image::Image;

/// Control-stack return address meaning "return to the host".
pub const HOST_RETURN: i32 = -1;

/// Identifies a program among all programs alive in one dispatcher.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Program execution state.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ProgramFlags: u32 {
        /// Finished; never runs again.
        const EXITED = 0x01;
        /// Aborted by a fatal error.
        const FATAL = 0x04;
        /// Stopped by `stop_program`.
        const STOPPED = 0x08;
        /// Suspended by `wait`.
        const WAITING = 0x10;
        /// Blocked on a `callstart` child.
        const BLOCKED_ON_CALL = 0x20;
        /// The outermost frame returned to the host.
        const RETURNED = 0x40;
        /// Inside a critical section.
        const CRITICAL = 0x80;
        /// Held by a `spawn` child that has not detached.
        const BLOCKED_ON_SPAWN = 0x100;
        /// The initializer has not run yet.
        const NEVER_RUN = 0x200;
    }
}

impl ProgramFlags {
    /// Any state that stops the interpreter loop.
    pub const HALTING: Self = Self::EXITED
        .union(Self::FATAL)
        .union(Self::STOPPED)
        .union(Self::WAITING)
        .union(Self::BLOCKED_ON_CALL)
        .union(Self::RETURNED)
        .union(Self::BLOCKED_ON_SPAWN);

    /// States from which a program never runs again.
    pub const FINISHED: Self = Self::EXITED.union(Self::FATAL).union(Self::STOPPED);

    /// States in which the program waits on a child.
    pub const BLOCKED: Self = Self::BLOCKED_ON_CALL.union(Self::BLOCKED_ON_SPAWN);
}

/// Stack depths and registers captured when an invocation starts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Checkpoint {
    pub(crate) stack: usize,
    pub(crate) control: usize,
    pub(crate) ip: usize,
    pub(crate) frame: usize,
}

/// An executing instance of an image.
#[derive(Clone, Debug)]
pub struct Program {
    id: ProgramId,
    image: Arc<Image>,
    sid: Option<ScriptId>,
    pub(crate) ip: usize,
    pub(crate) frame: usize,
    pub(crate) globals: usize,
    pub(crate) stack: Vec<Value>,
    pub(crate) control: Vec<Value>,
    pub(crate) flags: ProgramFlags,
    pub(crate) waited_at: GameTime,
    pub(crate) wait_until: GameTime,
    pub(crate) parent: Option<ProgramId>,
    pub(crate) child: Option<ProgramId>,
    pub(crate) return_value: Value,
    pub(crate) checkpoint: Option<Checkpoint>,
}

impl Program {
    /// Creates a program positioned at the module prologue.
    #[must_use]
    pub fn new(id: ProgramId, image: Arc<Image>, sid: Option<ScriptId>) -> Self {
        Self {
            id,
            image,
            sid,
            ip: 0,
            frame: 0,
            globals: 0,
            stack: Vec::new(),
            control: Vec::new(),
            flags: ProgramFlags::NEVER_RUN,
            waited_at: GameTime::default(),
            wait_until: GameTime::default(),
            parent: None,
            child: None,
            return_value: Value::NULL,
            checkpoint: None,
        }
    }

    /// The program's id.
    #[must_use]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// The image this program executes.
    #[must_use]
    pub fn image(&self) -> &Arc<Image> {
        &self.image
    }

    /// The image name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.image.name()
    }

    /// The script this program runs on behalf of.
    #[must_use]
    pub fn sid(&self) -> Option<ScriptId> {
        self.sid
    }

    /// Current flags.
    #[must_use]
    pub fn flags(&self) -> ProgramFlags {
        self.flags
    }

    /// Instruction pointer.
    #[must_use]
    pub fn ip(&self) -> usize {
        self.ip
    }

    /// Index of a procedure by name.
    #[must_use]
    pub fn procedure_index(&self, name: &str) -> Option<usize> {
        self.image.find_procedure(name)
    }

    /// True once the initializer has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !self.flags.contains(ProgramFlags::NEVER_RUN)
    }

    /// True if the program will never run again.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.flags.intersects(ProgramFlags::FINISHED)
    }

    /// True if suspended by `wait`.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.flags.contains(ProgramFlags::WAITING)
    }

    /// True if waiting on a child program.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.flags.intersects(ProgramFlags::BLOCKED)
    }

    /// True inside a critical section.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.flags.contains(ProgramFlags::CRITICAL)
    }

    /// True if the program is suspended and its due time has come.
    #[must_use]
    pub fn is_due(&self, now: GameTime) -> bool {
        self.is_waiting() && now >= self.wait_until
    }

    /// The game time at which a waiting program may resume.
    #[must_use]
    pub fn wait_until(&self) -> Option<GameTime> {
        self.is_waiting().then_some(self.wait_until)
    }

    /// The game time at which the program last suspended.
    #[must_use]
    pub fn waited_at(&self) -> GameTime {
        self.waited_at
    }

    /// The parent program, if this is an attached child.
    #[must_use]
    pub fn parent(&self) -> Option<ProgramId> {
        self.parent
    }

    /// The attached child program, if any.
    #[must_use]
    pub fn child(&self) -> Option<ProgramId> {
        self.child
    }

    /// Releases this program from a child it was blocked on.
    ///
    /// Returns false if `child` is not this program's child.
    pub fn release_child(&mut self, child: ProgramId) -> bool {
        if self.child != Some(child) {
            return false;
        }
        self.child = None;
        self.flags.remove(ProgramFlags::BLOCKED);
        true
    }

    /// Forgets the parent link, e.g. when the parent is gone.
    pub fn orphan(&mut self) {
        self.parent = None;
    }

    /// Value returned by the last completed invocation.
    #[must_use]
    pub fn return_value(&self) -> &Value {
        &self.return_value
    }

    /// Depth of the value stack.
    #[must_use]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Depth of the control stack.
    #[must_use]
    pub fn control_depth(&self) -> usize {
        self.control.len()
    }

    /// The global variables (everything below the first frame).
    #[must_use]
    pub fn globals(&self) -> &[Value] {
        let end = self.checkpoint.map_or(self.stack.len(), |c| c.stack);
        self.stack.get(self.globals..end).unwrap_or(&[])
    }

    /// True between the start of an invocation and its completion, including
    /// while suspended or blocked.
    #[must_use]
    pub fn is_mid_invocation(&self) -> bool {
        self.checkpoint.is_some() && !self.is_finished()
    }

    /// Marks the program exited by the host.
    pub fn kill(&mut self) {
        self.flags.insert(ProgramFlags::EXITED);
    }

    pub(crate) fn push(&mut self, value: Value, limit: usize) -> Result<()> {
        if self.stack.len() >= limit {
            return Err(Error::fatal(Fault::StackOverflow { limit }));
        }
        self.stack.push(value);
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Result<Value> {
        self.stack
            .pop()
            .ok_or_else(|| Error::fatal(Fault::StackUnderflow))
    }

    pub(crate) fn pop_int(&mut self) -> Result<i32> {
        self.pop()?.as_int()
    }

    pub(crate) fn push_control(&mut self, value: Value, limit: usize) -> Result<()> {
        if self.control.len() >= limit {
            return Err(Error::fatal(Fault::StackOverflow { limit }));
        }
        self.control.push(value);
        Ok(())
    }

    pub(crate) fn pop_control(&mut self) -> Result<Value> {
        self.control
            .pop()
            .ok_or_else(|| Error::fatal(Fault::StackUnderflow))
    }

    pub(crate) fn capture(&mut self) {
        self.checkpoint = Some(Checkpoint {
            stack: self.stack.len(),
            control: self.control.len(),
            ip: self.ip,
            frame: self.frame,
        });
    }

    pub(crate) fn restore(&mut self) {
        if let Some(c) = self.checkpoint.take() {
            self.stack.truncate(c.stack);
            self.control.truncate(c.control);
            self.ip = c.ip;
            self.frame = c.frame;
        }
    }

    /// Builds a child program sharing this program's script.
    pub(crate) fn child_of(&self, id: ProgramId, image: Arc<Image>, attach: bool) -> Program {
        let mut child = Program::new(id, image, self.sid);
        if attach {
            child.parent = Some(self.id);
        }
        child
    }
}
