//! Programmatic image assembly.
//!
//! [`ImageBuilder`] emits code into a single buffer, tracks labels and
//! procedure entry points relative to that buffer, and lays out the prologue
//! and tables around it in [`ImageBuilder::finish`].
//!
//! Code emitted before the first [`ImageBuilder::procedure`] call is the
//! module initializer. It starts with `set_global`, so anything it pushes
//! becomes a global, and ends with `pop_exit`.

use std::collections::HashMap;

use mapscript_foundation::{Error, Result};

use crate::host::HostOp;
use crate::image::{PROCEDURE_ENTRY_SIZE, PROLOGUE_SIZE, ProcedureFlags};
use crate::opcode::{OPERAND_SIZE, Opcode, PUSH_FLOAT, PUSH_INT, PUSH_STRING};

/// A code position that may be referenced before it is bound.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Label(usize);

struct ProcDef {
    name: String,
    arg_count: usize,
    flags: ProcedureFlags,
    body: usize,
}

/// Builds a bytecode image.
pub struct ImageBuilder {
    name: String,
    code: Vec<u8>,
    procedures: Vec<ProcDef>,
    strings: Vec<u8>,
    string_offsets: HashMap<String, u32>,
    labels: Vec<Option<usize>>,
    fixups: Vec<(usize, Label)>,
    initializer_open: bool,
}

impl ImageBuilder {
    /// Starts an image whose initializer is open for emission.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut builder = Self {
            name: name.into(),
            code: Vec::new(),
            procedures: Vec::new(),
            strings: Vec::new(),
            string_offsets: HashMap::new(),
            labels: Vec::new(),
            fixups: Vec::new(),
            initializer_open: true,
        };
        builder.op(Opcode::SetGlobal);
        builder
    }

    /// The image name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Emits a core opcode.
    pub fn op(&mut self, op: Opcode) -> &mut Self {
        self.word(op.code());
        self
    }

    /// Emits a host call.
    pub fn host(&mut self, op: HostOp) -> &mut Self {
        self.word(op.code());
        self
    }

    /// Pushes an integer literal.
    pub fn push_int(&mut self, value: i32) -> &mut Self {
        self.word(PUSH_INT);
        self.operand(value.to_be_bytes());
        self
    }

    /// Pushes a float literal.
    pub fn push_float(&mut self, value: f32) -> &mut Self {
        self.word(PUSH_FLOAT);
        self.operand(value.to_bits().to_be_bytes());
        self
    }

    /// Pushes a static string, adding it to the string table.
    pub fn push_string(&mut self, s: &str) -> &mut Self {
        let offset = self.string(s);
        self.word(PUSH_STRING);
        self.operand(offset.to_be_bytes());
        self
    }

    /// Pushes the address of a label.
    pub fn push_label(&mut self, label: Label) -> &mut Self {
        self.word(PUSH_INT);
        self.fixups.push((self.code.len(), label));
        self.operand([0; OPERAND_SIZE]);
        self
    }

    /// Creates an unbound label.
    pub fn label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Binds a label to the current position.
    pub fn bind(&mut self, label: Label) -> &mut Self {
        self.labels[label.0] = Some(self.code.len());
        self
    }

    /// Emits `push addr; jump`.
    pub fn jump(&mut self, label: Label) -> &mut Self {
        self.push_label(label).op(Opcode::Jump)
    }

    /// Emits `push argc; push proc; call`. Arguments must already be pushed.
    pub fn call(&mut self, proc_index: i32, argc: i32) -> &mut Self {
        self.push_int(argc).push_int(proc_index).op(Opcode::Call)
    }

    /// Emits `push value; pop_return`.
    pub fn ret_int(&mut self, value: i32) -> &mut Self {
        self.push_int(value).op(Opcode::PopReturn)
    }

    /// Closes the initializer with `pop_exit`. Idempotent.
    pub fn end_initializer(&mut self) -> &mut Self {
        if self.initializer_open {
            self.initializer_open = false;
            self.op(Opcode::PopExit);
        }
        self
    }

    /// Starts a procedure at the current position, closing the initializer.
    pub fn procedure(&mut self, name: &str, arg_count: usize) -> &mut Self {
        self.procedure_with_flags(name, arg_count, ProcedureFlags::empty())
    }

    /// Starts a procedure with explicit table flags.
    pub fn procedure_with_flags(
        &mut self,
        name: &str,
        arg_count: usize,
        flags: ProcedureFlags,
    ) -> &mut Self {
        self.end_initializer();
        self.procedures.push(ProcDef {
            name: name.to_string(),
            arg_count,
            flags,
            body: self.code.len(),
        });
        self
    }

    /// Number of procedures declared so far.
    #[must_use]
    pub fn procedure_count(&self) -> usize {
        self.procedures.len()
    }

    /// Adds a static string, returning its offset.
    pub fn string(&mut self, s: &str) -> u32 {
        if let Some(&offset) = self.string_offsets.get(s) {
            return offset;
        }
        let offset = u32::try_from(self.strings.len()).unwrap_or(u32::MAX);
        self.strings.extend_from_slice(s.as_bytes());
        self.strings.push(0);
        self.string_offsets.insert(s.to_string(), offset);
        offset
    }

    /// Lays out the prologue and tables and resolves addresses.
    ///
    /// # Errors
    ///
    /// Returns a load error if a referenced label was never bound.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.end_initializer();

        let mut identifiers = Vec::new();
        let mut name_offsets = Vec::with_capacity(self.procedures.len());
        for def in &self.procedures {
            name_offsets.push(identifiers.len());
            identifiers.extend_from_slice(def.name.as_bytes());
            identifiers.push(0);
        }

        let code_base = PROLOGUE_SIZE
            + 4
            + PROCEDURE_ENTRY_SIZE * self.procedures.len()
            + 4
            + identifiers.len()
            + 4
            + self.strings.len();

        for (at, label) in &self.fixups {
            let Some(target) = self.labels[label.0] else {
                return Err(Error::load(&self.name, format!("unbound label {}", label.0)));
            };
            let addr = to_u32(code_base + target);
            self.code[*at..*at + OPERAND_SIZE].copy_from_slice(&addr.to_be_bytes());
        }

        let mut out = Vec::with_capacity(code_base + self.code.len());
        // Prologue: jump to the initializer, then pad.
        push_word(&mut out, PUSH_INT);
        push_u32(&mut out, to_u32(code_base));
        push_word(&mut out, Opcode::Jump.code());
        while out.len() < PROLOGUE_SIZE {
            push_word(&mut out, Opcode::Noop.code());
        }

        push_u32(&mut out, to_u32(self.procedures.len()));
        for (def, name_offset) in self.procedures.iter().zip(name_offsets) {
            push_u32(&mut out, to_u32(name_offset));
            push_u32(&mut out, def.flags.bits());
            push_u32(&mut out, 0);
            push_u32(&mut out, 0);
            push_u32(&mut out, to_u32(code_base + def.body));
            push_u32(&mut out, to_u32(def.arg_count));
        }
        push_u32(&mut out, to_u32(identifiers.len()));
        out.extend_from_slice(&identifiers);
        push_u32(&mut out, to_u32(self.strings.len()));
        out.extend_from_slice(&self.strings);
        debug_assert_eq!(out.len(), code_base);
        out.extend_from_slice(&self.code);
        Ok(out)
    }

    fn word(&mut self, word: u16) {
        push_word(&mut self.code, word);
    }

    fn operand(&mut self, bytes: [u8; OPERAND_SIZE]) {
        self.code.extend_from_slice(&bytes);
    }
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn push_word(out: &mut Vec<u8>, word: u16) {
    out.extend_from_slice(&word.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}
