//! Human-readable image listings.

#![allow(clippy::cast_possible_wrap)]

use std::fmt::Write;

use crate::image::{Image, PROLOGUE_SIZE};
use crate::opcode::{Instruction, WORD_SIZE};

/// Renders an image's procedure table and code.
///
/// Each line of code is `address  mnemonic [operand]`. Procedure entry
/// points are labelled. Words that do not decode are shown as `.word`.
#[must_use]
pub fn disassemble(image: &Image) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "; {}", image.name());
    let _ = writeln!(out, "; {} procedures", image.procedures().len());
    for (i, p) in image.procedures().iter().enumerate() {
        let _ = writeln!(
            out,
            ";   {i:3} {:<24} args={} body={:#06x} flags={:?}",
            p.name, p.arg_count, p.body_address, p.flags
        );
    }

    out.push_str("\n; prologue\n");
    listing(image, 0, PROLOGUE_SIZE, &mut out);
    out.push_str("\n; code\n");
    listing(image, image.code_start(), image.bytes().len(), &mut out);
    out
}

fn listing(image: &Image, start: usize, end: usize, out: &mut String) {
    let mut at = start;
    while at + WORD_SIZE <= end {
        for p in image.procedures().iter().filter(|p| p.body_address == at) {
            let _ = writeln!(out, "{}:", p.name);
        }
        let Some(word) = image.read_word(at) else {
            break;
        };
        let _ = write!(out, "  {at:#06x}  ");
        match Instruction::decode(word) {
            Some(instruction) => {
                let operand = image.read_operand(at + WORD_SIZE);
                match (instruction, operand) {
                    (Instruction::PushInt, Some(v)) => {
                        let _ = writeln!(out, "push {}", v as i32);
                    }
                    (Instruction::PushFloat, Some(v)) => {
                        let _ = writeln!(out, "push {:?}", f32::from_bits(v));
                    }
                    (Instruction::PushString, Some(v)) => {
                        let s = image.static_string(v as usize).unwrap_or("?");
                        let _ = writeln!(out, "push {s:?}");
                    }
                    (Instruction::Op(op), _) => {
                        let _ = writeln!(out, "{}", op.mnemonic());
                    }
                    (Instruction::Host(op), _) => {
                        let _ = writeln!(out, "{}", op.mnemonic());
                    }
                    _ => {
                        let _ = writeln!(out, "push <truncated>");
                        break;
                    }
                }
                at += instruction.size();
            }
            None => {
                let _ = writeln!(out, ".word {word:#06x}");
                at += WORD_SIZE;
            }
        }
    }
}
