//! # Interrupt bus
//! The `int` instruction is the only way for a guest program to reach the outside
//! world. The machine hands the interrupt class (the instruction's operand byte),
//! its registers and its data memory to an implementation defined [`InterruptBus`].
//!
//! [`ConsoleBus`] is the standard bus. It supports a single class, [`SYSCALL`],
//! whose service number is taken from `r0`:
//!
//! | **`r0`** | **Service** | **Stack, from `sp` upwards** |
//! | -------- | ----------- | ---------------------------- |
//! | 0 | write | length, buffer offset |
//!
//! Any other class or service is a fault.

use std::io::{self, Write};

use crate::{error::FaultKind, memory::SegmentMemory, registers::RegisterFile};

/// Interrupt class of system calls.
pub const SYSCALL: u8 = 0x80;
/// System call writing a data memory buffer to the console.
pub const SYS_WRITE: u64 = 0;

pub trait InterruptBus {
    /// Services interrupt `class`. Returning an error faults the machine.
    fn interrupt(
        &mut self,
        class: u8,
        registers: &mut RegisterFile,
        data: &mut [u8],
    ) -> Result<(), FaultKind>;
}

/// Bus writing system call output to any [`Write`] implementor.
#[derive(Debug, Default)]
pub struct ConsoleBus<W> {
    output: W,
}
impl ConsoleBus<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}
impl<W: Write> ConsoleBus<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }
    pub fn into_inner(self) -> W {
        self.output
    }

    fn syscall(&mut self, registers: &RegisterFile, data: &[u8]) -> Result<(), FaultKind> {
        match registers.read(0) {
            SYS_WRITE => {
                let sp = registers.sp();
                let len = data.read_u64(sp)?;
                let offset = data.read_u64(sp.checked_add(8).ok_or(
                    FaultKind::DataOutOfBounds {
                        offset: sp,
                        len: 16,
                        size: data.len(),
                    },
                )?)?;
                let buffer = data.range(offset, len)?;
                log::debug!("write: {len} bytes from {offset:#x}");
                self.output
                    .write_all(buffer)
                    .and_then(|_| self.output.flush())
                    .map_err(|e| FaultKind::Io(e.kind()))
            }
            service => Err(FaultKind::UnsupportedSyscall(service)),
        }
    }
}
impl<W: Write> InterruptBus for ConsoleBus<W> {
    fn interrupt(
        &mut self,
        class: u8,
        registers: &mut RegisterFile,
        data: &mut [u8],
    ) -> Result<(), FaultKind> {
        match class {
            SYSCALL => self.syscall(registers, data),
            class => Err(FaultKind::UnsupportedInterrupt(class)),
        }
    }
}
