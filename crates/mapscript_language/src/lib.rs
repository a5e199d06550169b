//! Bytecode images, assembler, and stack interpreter for mapscript programs.
//!
//! This crate provides:
//! - [`Image`] - Parsed bytecode images and their procedure tables
//! - [`ImageBuilder`] - Programmatic assembly of images
//! - [`Opcode`] / [`HostOp`] - The instruction set
//! - [`Program`] - One executing instance of an image
//! - [`Interpreter`] - The stack machine, talking to the host via [`VmContext`]
//! - [`disassemble`] - Human-readable listings

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod assembler;
pub mod disasm;
pub mod host;
pub mod image;
pub mod opcode;
pub mod program;
pub mod vm;

pub use assembler::{ImageBuilder, Label};
pub use disasm::disassemble;
pub use host::HostOp;
pub use image::{Image, Procedure, ProcedureFlags};
pub use opcode::{Instruction, Opcode};
pub use program::{Program, ProgramFlags, ProgramId};
pub use vm::{Interpreter, NoContext, Outcome, VmContext, VmLimits};
