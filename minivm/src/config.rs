//! # Machine configuration

use std::collections::TryReserveError;

use crate::{machine::Machine, memory::zeroed};

/// Default size of both memory segments, 64 KiB.
pub const DEFAULT_SEGMENT_SIZE: usize = 0x10000;

/// What the executor does with an opcode it does not know.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UnknownOpcode {
    /// Stop with an illegal instruction fault.
    #[default]
    Fault,
    /// Stop as if `halt` had been executed.
    Halt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MachineConfig {
    /// Size of instruction memory, in bytes.
    pub instruction_memory: usize,
    /// Size of data memory, in bytes. Also the initial stack pointer.
    pub data_memory: usize,
    pub unknown_opcode: UnknownOpcode,
}
impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            instruction_memory: DEFAULT_SEGMENT_SIZE,
            data_memory: DEFAULT_SEGMENT_SIZE,
            unknown_opcode: UnknownOpcode::default(),
        }
    }
}
impl MachineConfig {
    /// Builds a machine with zeroed, heap allocated segments.
    ///
    /// Fails if either segment cannot be allocated.
    pub fn build(&self) -> Result<Machine<Vec<u8>>, TryReserveError> {
        let instruction_memory = zeroed(self.instruction_memory)?;
        let data_memory = zeroed(self.data_memory)?;
        Ok(Machine::new(instruction_memory, data_memory).with_unknown_opcode(self.unknown_opcode))
    }
}
