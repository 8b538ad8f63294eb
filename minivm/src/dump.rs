//! # State dump
//! Read-only, human oriented view of a [`Machine`]: its status, registers and the
//! beginning of data memory, 16 bytes per line.
//! ```text
//! vm state: halted, 7 cycles
//!  r0 = 0x0000000000000000   r1 = 0x000000000000000a ...
//! data memory (32 of 65536 bytes):
//! 00000000: 00 00 00 00 00 00 00 00 00 00 74 65 73 74 00 00
//! 00000010: 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00
//! ```

use core::fmt::Display;

use crate::{machine::Machine, memory::SegmentMemory};

/// Number of bytes shown per line.
const LINE_WIDTH: usize = 16;

pub struct StateDump<'a, T> {
    machine: &'a Machine<T>,
    data_bytes: usize,
}
impl<'a, T: SegmentMemory> StateDump<'a, T> {
    pub fn new(machine: &'a Machine<T>, data_bytes: usize) -> Self {
        Self {
            machine,
            data_bytes,
        }
    }
}
impl<'a, T: SegmentMemory> Display for StateDump<'a, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(
            f,
            "vm state: {}, {} cycles",
            self.machine.status(),
            self.machine.cycles()
        )?;
        write!(f, "{}", self.machine.registers())?;

        let data = self.machine.data_memory().bytes();
        let shown = &data[..self.data_bytes.min(data.len())];
        writeln!(f, "data memory ({} of {} bytes):", shown.len(), data.len())?;
        for (line, bytes) in shown.chunks(LINE_WIDTH).enumerate() {
            write!(f, "{:08x}:", line * LINE_WIDTH)?;
            for byte in bytes {
                write!(f, " {byte:02x}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
