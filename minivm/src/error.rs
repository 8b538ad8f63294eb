//! # Execution faults
//! Anything that stops the machine other than `halt` is reported as a [`Fault`].
//! A fault is synchronous: the instruction that raised it is the last one to
//! have been fetched, and no further fetch happens afterwards.

use std::io;

use thiserror::Error;

use crate::instruction::Instruction;

/// What went wrong while executing an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum FaultKind {
    #[error("illegal instruction (opcode {0:#04x})")]
    IllegalInstruction(u8),
    #[error("instruction fetch out of bounds (word {0:#x})")]
    FetchOutOfBounds(u64),
    #[error("stack overflow (sp = {0:#x})")]
    StackOverflow(u64),
    #[error("data access out of bounds ({len} bytes at {offset:#x}, data memory holds {size} bytes)")]
    DataOutOfBounds { offset: u64, len: u64, size: usize },
    #[error("unsupported interrupt class {0:#04x}")]
    UnsupportedInterrupt(u8),
    #[error("unsupported system call {0}")]
    UnsupportedSyscall(u64),
    #[error("console write failed: {0}")]
    Io(io::ErrorKind),
}

/// A [`FaultKind`] located at the instruction that raised it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("fault at ip {ip:#06x}{}: {kind}", describe(.instruction))]
pub struct Fault {
    /// Word index of the offending instruction.
    pub ip: u64,
    /// The decoded instruction, `None` if the fetch itself failed.
    pub instruction: Option<Instruction>,
    pub kind: FaultKind,
}

fn describe(instruction: &Option<Instruction>) -> String {
    match instruction {
        Some(instruction) => format!(
            " ({instruction}, opcode {:#04x})",
            instruction.opcode.byte()
        ),
        None => String::new(),
    }
}
