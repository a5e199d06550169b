//! Bytecode instruction set.
//!
//! Instructions are big-endian 16-bit words with the high bit set. Literal
//! pushes carry their type in the word itself and are followed by a 32-bit
//! operand; every other instruction takes its operands from the value stack.

#![allow(clippy::doc_markdown)]

use crate::host::HostOp;

/// Push an integer literal; followed by an `i32`.
pub const PUSH_INT: u16 = 0xC001;
/// Push a float literal; followed by the `f32` bits.
pub const PUSH_FLOAT: u16 = 0xA001;
/// Push a static string; followed by its offset in the string table.
pub const PUSH_STRING: u16 = 0x9001;

/// Size of an instruction word in bytes.
pub const WORD_SIZE: usize = 2;
/// Size of a literal operand in bytes.
pub const OPERAND_SIZE: usize = 4;

/// Core interpreter instructions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    // === Control ===
    /// No operation.
    Noop = 0x8000,
    /// Set the program's critical flag.
    EnterCriticalSection = 0x8002,
    /// Clear the program's critical flag.
    LeaveCriticalSection = 0x8003,
    /// `[addr] -> []`, jump to `addr`.
    Jump = 0x8004,
    /// `[args.., argc, proc] -> []`, call a procedure of this program.
    Call = 0x8005,

    // === Sub-programs ===
    /// `[name] -> []`, run a child program; the parent blocks until it exits.
    CallStart = 0x8008,
    /// `[name] -> []`, replace this program with another.
    Exec = 0x8009,
    /// `[name] -> []`, start a child; the parent is held until it detaches.
    Spawn = 0x800A,
    /// `[name] -> []`, start an unrelated program.
    Fork = 0x800B,
    /// Move the top of the control stack to the value stack.
    AToD = 0x800C,
    /// Move the top of the value stack to the control stack.
    DToA = 0x800D,
    /// Mark the program exited.
    Exit = 0x800E,
    /// Release the parent of a spawned child.
    Detach = 0x800F,
    /// Mark the program stopped.
    StopProgram = 0x8011,

    // === Variables ===
    /// `[index] -> [value]`, read a global.
    FetchGlobal = 0x8012,
    /// `[value, index] -> []`, write a global.
    StoreGlobal = 0x8013,
    /// `[name] -> [value]`, read an exported variable.
    FetchExternal = 0x8014,
    /// `[value, name] -> []`, write an exported variable.
    StoreExternal = 0x8015,
    /// `[name] -> []`, export a variable.
    ExportVar = 0x8016,

    // === Stack ===
    /// Swap the two top values.
    Swap = 0x8018,
    /// Swap the two top control entries.
    SwapA = 0x8019,
    /// Discard the top value.
    Pop = 0x801A,
    /// Duplicate the top value.
    Dup = 0x801B,

    // === Returns ===
    /// `[value] -> []`, drop the frame and return `value` to the caller.
    PopReturn = 0x801C,
    /// Drop the frame's control entries and return, keeping the value stack.
    PopExit = 0x801D,
    /// `[argc, proc] -> []`, abort if `proc` does not take `argc` arguments.
    CheckArgCount = 0x8027,
    /// `[name] -> [proc]`, find a procedure by name.
    LookupProcByName = 0x8028,
    /// Mark the start of the global area at the current stack depth.
    SetGlobal = 0x802C,
    /// `[proc] -> [addr]`, body address of a procedure.
    FetchProcAddress = 0x802D,
    /// `[values.., n] -> []`, log and discard `n` values.
    Dump = 0x802E,

    // === Branches and locals ===
    /// `[addr, cond] -> []`, jump to `addr` if `cond` is false.
    If = 0x802F,
    /// `[addr, cond] -> []`, loop exit: jump to `addr` if `cond` is false.
    While = 0x8030,
    /// `[value, index] -> []`, write a frame slot.
    Store = 0x8031,
    /// `[index] -> [value]`, read a frame slot.
    Fetch = 0x8032,

    // === Comparison ===
    /// `[a, b] -> [a == b]`
    Equal = 0x8033,
    /// `[a, b] -> [a != b]`
    NotEqual = 0x8034,
    /// `[a, b] -> [a <= b]`
    LessEqual = 0x8035,
    /// `[a, b] -> [a >= b]`
    GreaterEqual = 0x8036,
    /// `[a, b] -> [a < b]`
    Less = 0x8037,
    /// `[a, b] -> [a > b]`
    Greater = 0x8038,

    // === Arithmetic ===
    /// `[a, b] -> [a + b]`, concatenates when either side is a string.
    Add = 0x8039,
    /// `[a, b] -> [a - b]`
    Sub = 0x803A,
    /// `[a, b] -> [a * b]`
    Mul = 0x803B,
    /// `[a, b] -> [a / b]`
    Div = 0x803C,
    /// `[a, b] -> [a % b]`
    Mod = 0x803D,

    // === Logic ===
    /// `[a, b] -> [a && b]`
    And = 0x803E,
    /// `[a, b] -> [a || b]`
    Or = 0x803F,
    /// `[a, b] -> [a & b]`
    BitAnd = 0x8040,
    /// `[a, b] -> [a | b]`
    BitOr = 0x8041,
    /// `[a, b] -> [a ^ b]`
    BitXor = 0x8042,
    /// `[a] -> [!a]` bitwise
    BitNot = 0x8043,
    /// `[a] -> [floor(a)]`
    Floor = 0x8044,
    /// `[a] -> [!a]`
    Not = 0x8045,
    /// `[a] -> [-a]`
    Negate = 0x8046,

    // === Suspension ===
    /// `[ticks] -> []`, suspend until game time advances by `ticks`.
    Wait = 0x8047,
}

impl Opcode {
    /// Every core opcode, in numeric order.
    pub const ALL: [Opcode; 55] = [
        Opcode::Noop,
        Opcode::EnterCriticalSection,
        Opcode::LeaveCriticalSection,
        Opcode::Jump,
        Opcode::Call,
        Opcode::CallStart,
        Opcode::Exec,
        Opcode::Spawn,
        Opcode::Fork,
        Opcode::AToD,
        Opcode::DToA,
        Opcode::Exit,
        Opcode::Detach,
        Opcode::StopProgram,
        Opcode::FetchGlobal,
        Opcode::StoreGlobal,
        Opcode::FetchExternal,
        Opcode::StoreExternal,
        Opcode::ExportVar,
        Opcode::Swap,
        Opcode::SwapA,
        Opcode::Pop,
        Opcode::Dup,
        Opcode::PopReturn,
        Opcode::PopExit,
        Opcode::CheckArgCount,
        Opcode::LookupProcByName,
        Opcode::SetGlobal,
        Opcode::FetchProcAddress,
        Opcode::Dump,
        Opcode::If,
        Opcode::While,
        Opcode::Store,
        Opcode::Fetch,
        Opcode::Equal,
        Opcode::NotEqual,
        Opcode::LessEqual,
        Opcode::GreaterEqual,
        Opcode::Less,
        Opcode::Greater,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Mod,
        Opcode::And,
        Opcode::Or,
        Opcode::BitAnd,
        Opcode::BitOr,
        Opcode::BitXor,
        Opcode::BitNot,
        Opcode::Floor,
        Opcode::Not,
        Opcode::Negate,
        Opcode::Wait,
    ];

    /// Returns the instruction word.
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Decodes a core opcode.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.code() == code)
    }

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::EnterCriticalSection => "enter_critical",
            Self::LeaveCriticalSection => "leave_critical",
            Self::Jump => "jump",
            Self::Call => "call",
            Self::CallStart => "callstart",
            Self::Exec => "exec",
            Self::Spawn => "spawn",
            Self::Fork => "fork",
            Self::AToD => "a_to_d",
            Self::DToA => "d_to_a",
            Self::Exit => "exit",
            Self::Detach => "detach",
            Self::StopProgram => "stop_program",
            Self::FetchGlobal => "fetch_global",
            Self::StoreGlobal => "store_global",
            Self::FetchExternal => "fetch_external",
            Self::StoreExternal => "store_external",
            Self::ExportVar => "export_var",
            Self::Swap => "swap",
            Self::SwapA => "swapa",
            Self::Pop => "pop",
            Self::Dup => "dup",
            Self::PopReturn => "pop_return",
            Self::PopExit => "pop_exit",
            Self::CheckArgCount => "check_arg_count",
            Self::LookupProcByName => "lookup_proc_by_name",
            Self::SetGlobal => "set_global",
            Self::FetchProcAddress => "fetch_proc_address",
            Self::Dump => "dump",
            Self::If => "if",
            Self::While => "while",
            Self::Store => "store",
            Self::Fetch => "fetch",
            Self::Equal => "equal",
            Self::NotEqual => "not_equal",
            Self::LessEqual => "less_equal",
            Self::GreaterEqual => "greater_equal",
            Self::Less => "less",
            Self::Greater => "greater",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::And => "and",
            Self::Or => "or",
            Self::BitAnd => "bwand",
            Self::BitOr => "bwor",
            Self::BitXor => "bwxor",
            Self::BitNot => "bwnot",
            Self::Floor => "floor",
            Self::Not => "not",
            Self::Negate => "negate",
            Self::Wait => "wait",
        }
    }
}

/// A decoded instruction word.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Integer literal push.
    PushInt,
    /// Float literal push.
    PushFloat,
    /// Static string push.
    PushString,
    /// Core opcode.
    Op(Opcode),
    /// Call into the host.
    Host(HostOp),
}

impl Instruction {
    /// Decodes an instruction word.
    #[must_use]
    pub fn decode(word: u16) -> Option<Self> {
        match word {
            PUSH_INT => Some(Self::PushInt),
            PUSH_FLOAT => Some(Self::PushFloat),
            PUSH_STRING => Some(Self::PushString),
            _ => Opcode::from_code(word)
                .map(Self::Op)
                .or_else(|| HostOp::from_code(word).map(Self::Host)),
        }
    }

    /// Encoded size including any literal operand.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::PushInt | Self::PushFloat | Self::PushString => WORD_SIZE + OPERAND_SIZE,
            Self::Op(_) | Self::Host(_) => WORD_SIZE,
        }
    }
}
