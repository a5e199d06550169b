//! Error types for the mapscript runtime.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::sid::ScriptId;

/// The main error type for mapscript operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a load error for a bytecode image.
    #[must_use]
    pub fn load(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::LoadError {
            name: name.into(),
            reason: reason.into(),
        })
    }

    /// Creates an argument count error.
    #[must_use]
    pub fn argument_count(procedure: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::new(ErrorKind::ArgumentCount {
            procedure: procedure.into(),
            expected,
            actual,
        })
    }

    /// Creates a script not found error.
    #[must_use]
    pub fn script_not_found(sid: ScriptId) -> Self {
        Self::new(ErrorKind::ScriptNotFound(sid))
    }

    /// Creates a fatal script error.
    #[must_use]
    pub fn fatal(fault: Fault) -> Self {
        Self::new(ErrorKind::FatalScript(fault))
    }

    /// Creates an allocation exhausted error.
    #[must_use]
    pub fn allocation_exhausted(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::AllocationExhausted(what.into()))
    }

    /// Creates a script busy error (re-entrant invocation).
    #[must_use]
    pub fn script_busy(sid: ScriptId) -> Self {
        Self::new(ErrorKind::ScriptBusy(sid))
    }

    /// Creates an I/O error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IoError(message.into()))
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SerializationError(message.into()))
    }

    /// Returns true if this error aborted a program (as opposed to rejecting a call).
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::FatalScript(_))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A bytecode image was missing or malformed.
    #[error("failed to load '{name}': {reason}")]
    LoadError {
        /// The image name or path.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A procedure was invoked with the wrong number of arguments.
    #[error("procedure '{procedure}' expects {expected} arguments, got {actual}")]
    ArgumentCount {
        /// The procedure name.
        procedure: String,
        /// Declared arity.
        expected: usize,
        /// Arguments supplied.
        actual: usize,
    },

    /// The script id is stale or was never allocated.
    #[error("script not found: {0}")]
    ScriptNotFound(ScriptId),

    /// The program aborted; it is marked exited.
    #[error("fatal script error: {0}")]
    FatalScript(Fault),

    /// Script ids, local variables, or extents could not grow.
    #[error("allocation exhausted: {0}")]
    AllocationExhausted(String),

    /// The script's program is already executing or suspended mid-procedure.
    #[error("script {0} is already running")]
    ScriptBusy(ScriptId),

    /// Script execution is globally disabled.
    #[error("scripts are disabled")]
    ScriptsDisabled,

    /// Combat requests are locked.
    #[error("combat requests are locked")]
    CombatLocked,

    /// A local variable index outside the script's window.
    #[error("local variable {index} out of range for script {sid} ({count} allocated)")]
    LocalVarOutOfRange {
        /// The script.
        sid: ScriptId,
        /// The requested variable.
        index: i32,
        /// The size of the script's window.
        count: i32,
    },

    /// The operation is not valid for this kind of script.
    #[error("invalid operation on script {sid}: {message}")]
    InvalidScript {
        /// The script.
        sid: ScriptId,
        /// What was attempted.
        message: String,
    },

    /// I/O failure.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Encoding or decoding failure.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Reasons a program is aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Popped from an empty stack.
    StackUnderflow,
    /// A stack grew past its limit.
    StackOverflow {
        /// The configured limit.
        limit: usize,
    },
    /// An opcode with no handler.
    InvalidOpcode(u16),
    /// Instruction pointer left the code.
    BadAddress(i64),
    /// Procedure index outside the procedure table.
    BadProcedure(i64),
    /// No procedure with this name.
    UnknownProcedure(String),
    /// Variable index outside the global area or frame.
    BadVariable(i64),
    /// Integer division or modulo by zero.
    DivisionByZero,
    /// An operand had the wrong type.
    TypeMismatch {
        /// What the opcode needed.
        expected: &'static str,
        /// What it got.
        actual: &'static str,
    },
    /// The per-invocation instruction budget ran out.
    InstructionLimit {
        /// The configured limit.
        limit: u64,
    },
    /// A host call failed.
    Host(String),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackUnderflow => write!(f, "stack underflow"),
            Self::StackOverflow { limit } => write!(f, "stack overflow ({limit} entries)"),
            Self::InvalidOpcode(op) => write!(f, "invalid opcode {op:#06x}"),
            Self::BadAddress(addr) => write!(f, "bad address {addr}"),
            Self::BadProcedure(index) => write!(f, "bad procedure index {index}"),
            Self::UnknownProcedure(name) => write!(f, "no procedure named '{name}'"),
            Self::BadVariable(index) => write!(f, "bad variable index {index}"),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::TypeMismatch { expected, actual } => {
                write!(f, "type mismatch: expected {expected}, got {actual}")
            }
            Self::InstructionLimit { limit } => {
                write!(f, "instruction limit ({limit}) exceeded")
            }
            Self::Host(message) => write!(f, "{message}"),
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Script image name.
    pub script: Option<String>,
    /// Procedure being executed.
    pub procedure: Option<String>,
    /// Instruction offset of the failing opcode.
    pub offset: Option<usize>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the script name.
    #[must_use]
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// Sets the procedure name.
    #[must_use]
    pub fn with_procedure(mut self, procedure: impl Into<String>) -> Self {
        self.procedure = Some(procedure.into());
        self
    }

    /// Sets the instruction offset.
    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(script) = &self.script {
            write!(f, "in {script}")?;
        }
        if let Some(procedure) = &self.procedure {
            write!(f, " ({procedure})")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " at {offset:#x}")?;
        }
        Ok(())
    }
}

/// Result type alias for mapscript operations.
pub type Result<T> = std::result::Result<T, Error>;
