//! The interpreter's view of the host.
//!
//! Programs reach the game, the script registry, and other programs only
//! through [`VmContext`]. The dispatcher implements it; [`NoContext`] is
//! available for running images with no host at all.

use std::sync::Arc;

use mapscript_foundation::{Error, ErrorKind, GameTime, Result, ScriptId, Value};

use crate::host::HostOp;
use crate::image::Image;
use crate::program::{Program, ProgramId};

// =============================================================================
// VmContext Trait
// =============================================================================

/// Host services available to an executing program.
pub trait VmContext {
    /// The current game time, used by `wait`.
    fn game_time(&self) -> GameTime;

    /// Performs a host call on behalf of `sid`.
    ///
    /// `args` are in push order. The returned value is pushed only for ops
    /// that produce one; `None` pushes null.
    fn host_call(&mut self, sid: Option<ScriptId>, op: HostOp, args: &[Value])
    -> Result<Option<Value>>;

    /// Resolves an image by name for `callstart`, `spawn`, `fork`, and `exec`.
    fn load_image(&mut self, name: &str) -> Result<Arc<Image>>;

    /// Allocates an id for a new program.
    fn next_program_id(&mut self) -> ProgramId;

    /// Takes ownership of a program started by the running one.
    fn adopt(&mut self, program: Program);

    /// A child detached from, or finished under, `parent`.
    fn release_parent(&mut self, parent: ProgramId, child: ProgramId);

    /// Reads an exported variable.
    fn fetch_external(&self, name: &str) -> Result<Value>;

    /// Writes an exported variable.
    fn store_external(&mut self, name: &str, value: Value) -> Result<()>;

    /// Declares an exported variable.
    fn export_variable(&mut self, name: &str) -> Result<()>;
}

// =============================================================================
// NoContext
// =============================================================================

/// A context with no host: host calls and sub-programs fail.
///
/// Game time is fixed at zero and exported variables do not exist.
#[derive(Debug, Default)]
pub struct NoContext {
    next_id: u32,
}

fn unavailable(what: &str) -> Error {
    Error::new(ErrorKind::Internal(format!(
        "{what} not available in this context"
    )))
}

impl VmContext for NoContext {
    fn game_time(&self) -> GameTime {
        GameTime(0)
    }

    fn host_call(
        &mut self,
        _sid: Option<ScriptId>,
        op: HostOp,
        _args: &[Value],
    ) -> Result<Option<Value>> {
        Err(unavailable(op.mnemonic()))
    }

    fn load_image(&mut self, name: &str) -> Result<Arc<Image>> {
        Err(Error::load(name, "no image source"))
    }

    fn next_program_id(&mut self) -> ProgramId {
        self.next_id += 1;
        ProgramId(self.next_id)
    }

    fn adopt(&mut self, _program: Program) {}

    fn release_parent(&mut self, _parent: ProgramId, _child: ProgramId) {}

    fn fetch_external(&self, name: &str) -> Result<Value> {
        Err(unavailable(name))
    }

    fn store_external(&mut self, name: &str, _value: Value) -> Result<()> {
        Err(unavailable(name))
    }

    fn export_variable(&mut self, name: &str) -> Result<()> {
        Err(unavailable(name))
    }
}
