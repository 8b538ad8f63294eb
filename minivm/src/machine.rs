//! # Register machine
//! Represents the whole state of a running program: sixteen registers, an
//! instruction memory and a data memory.
//!
//! Execution follows a plain fetch-decode-execute cycle: the word at `ip` is
//! fetched, `ip` moves to the next word, then the decoded instruction is executed.
//! The machine keeps going until it executes `halt` or raises a [`Fault`].
//!
//! Instructions can be executed one at a time with [`Machine::step`], through the
//! [`Execution`] iterator, or all at once with [`Machine::run`]. The iterator makes
//! it easy to trace a program, for example:
//! ```rust
//! # use minivm::{bus::ConsoleBus, machine::*};
//! // li r1 10, halt
//! let mut machine = Machine::new(vec![0x00, 0x1a, 0x03, 0x00], vec![0; 0x40]);
//! let mut bus = ConsoleBus::new(Vec::new());
//! for executed_instruction in machine.execution(&mut bus) {
//!     println!("{}", executed_instruction.unwrap());
//! }
//! assert_eq!(machine.registers().read(1), 10);
//! assert_eq!(machine.status(), Status::Halted);
//! ```
//!
//! Machines are parametrized by their memory storage type (`T`), and executed
//! against an [`InterruptBus`] servicing `int` instructions.

use core::fmt::Display;
use core::iter::FusedIterator;

use crate::{
    bus::InterruptBus,
    config::UnknownOpcode,
    dump::StateDump,
    error::{Fault, FaultKind},
    instruction::{Instruction, Opcode},
    memory::SegmentMemory,
    registers::RegisterFile,
};

/// Where the machine stands in its lifecycle. Both stopped states are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    Halted,
    Faulted(Fault),
}
impl Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Halted => write!(f, "halted"),
            Self::Faulted(fault) => write!(f, "faulted, {fault}"),
        }
    }
}

/// What to do once an instruction has been executed.
enum Flow {
    Continue,
    Halt,
}

pub struct Machine<T> {
    registers: RegisterFile,
    instruction_memory: T,
    data_memory: T,

    status: Status,
    cycles: u64,
    unknown_opcode: UnknownOpcode,
}
impl<T: SegmentMemory> Machine<T> {
    /// Creates a machine over two segments. `ip` starts at 0 and `sp` one past
    /// the end of data memory.
    pub fn new(instruction_memory: T, data_memory: T) -> Self {
        let mut registers = RegisterFile::new();
        registers.set_sp(data_memory.capacity() as u64);
        Self {
            registers,
            instruction_memory,
            data_memory,
            status: Status::Running,
            cycles: 0,
            unknown_opcode: UnknownOpcode::default(),
        }
    }

    pub fn with_unknown_opcode(mut self, policy: UnknownOpcode) -> Self {
        self.unknown_opcode = policy;
        self
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }
    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }
    pub fn instruction_memory(&self) -> &T {
        &self.instruction_memory
    }
    pub fn instruction_memory_mut(&mut self) -> &mut T {
        &mut self.instruction_memory
    }
    pub fn data_memory(&self) -> &T {
        &self.data_memory
    }
    pub fn data_memory_mut(&mut self) -> &mut T {
        &mut self.data_memory
    }

    pub fn status(&self) -> Status {
        self.status
    }
    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }
    /// Number of instructions executed so far, `halt` included.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Returns a read-only view of the machine state showing the first `data_bytes`
    /// bytes of data memory.
    pub fn dump(&self, data_bytes: usize) -> StateDump<'_, T> {
        StateDump::new(self, data_bytes)
    }

    /// Returns an [`Execution`] that can be iterated on to execute instructions
    /// until the machine stops.
    pub fn execution<'a, B: InterruptBus>(&'a mut self, bus: &'a mut B) -> Execution<'a, T, B> {
        Execution { machine: self, bus }
    }

    /// Executes instructions until `halt`. Returns the total number of executed
    /// instructions.
    pub fn run<B: InterruptBus>(&mut self, bus: &mut B) -> Result<u64, Fault> {
        while self.step(bus)?.is_some() {}
        log::info!("halted after {} cycles", self.cycles);
        Ok(self.cycles)
    }

    /// Fetches, decodes and executes a single instruction.
    ///
    /// Returns the executed instruction while the machine keeps running, and `None`
    /// once it has halted. A stopped machine never fetches again: stepping a halted
    /// machine returns `None`, stepping a faulted one returns its fault.
    pub fn step<B: InterruptBus>(&mut self, bus: &mut B) -> Result<Option<Instruction>, Fault> {
        match self.status {
            Status::Running => {}
            Status::Halted => return Ok(None),
            Status::Faulted(fault) => return Err(fault),
        }

        let ip = self.registers.ip();
        let Some(raw) = self.instruction_memory.read_word(ip) else {
            return Err(self.fault(ip, None, FaultKind::FetchOutOfBounds(ip)));
        };
        self.registers.set_ip(ip.wrapping_add(1));
        let instruction = Instruction::decode(raw);
        self.cycles += 1;
        log::trace!("{ip:#06x}: {instruction}");

        match self.execute(instruction, bus) {
            Ok(Flow::Continue) => Ok(Some(instruction)),
            Ok(Flow::Halt) => {
                self.status = Status::Halted;
                Ok(None)
            }
            Err(kind) => Err(self.fault(ip, Some(instruction), kind)),
        }
    }

    fn fault(&mut self, ip: u64, instruction: Option<Instruction>, kind: FaultKind) -> Fault {
        let fault = Fault {
            ip,
            instruction,
            kind,
        };
        log::debug!("{fault}");
        self.status = Status::Faulted(fault);
        fault
    }

    /// Executes an already fetched instruction.
    fn execute<B: InterruptBus>(
        &mut self,
        instruction: Instruction,
        bus: &mut B,
    ) -> Result<Flow, FaultKind> {
        fn alu(registers: &mut RegisterFile, ra0: u8, ra1: u8, op: impl Fn(u64, u64) -> u64) {
            let v = op(registers.read(ra0), registers.read(ra1));
            registers.write(ra0, v)
        }
        // Word operations only see the low 32 bits, the result is zero extended.
        fn alu_word(registers: &mut RegisterFile, ra0: u8, ra1: u8, op: impl Fn(u32, u32) -> u32) {
            let v = op(registers.read(ra0) as u32, registers.read(ra1) as u32);
            registers.write(ra0, v as u64)
        }

        let Instruction { opcode, ra0, ra1 } = instruction;
        let registers = &mut self.registers;
        match opcode {
            Opcode::LoadImmediate => registers.write(ra0, ra1 as u64),
            Opcode::Push => {
                let value = registers.read(ra0);
                let sp = registers
                    .sp()
                    .checked_sub(8)
                    .ok_or(FaultKind::StackOverflow(registers.sp()))?;
                self.data_memory.write_u64(sp, value)?;
                registers.set_sp(sp);
            }
            Opcode::Interrupt => {
                let class = instruction.operand_byte();
                log::debug!("interrupt {class:#04x}");
                bus.interrupt(class, registers, self.data_memory.bytes_mut())?
            }
            Opcode::Halt => return Ok(Flow::Halt),

            Opcode::Add => alu(registers, ra0, ra1, u64::wrapping_add),
            Opcode::Sub => alu(registers, ra0, ra1, u64::wrapping_sub),
            Opcode::And => alu(registers, ra0, ra1, |a, b| a & b),
            Opcode::Or => alu(registers, ra0, ra1, |a, b| a | b),
            Opcode::Not => alu(registers, ra0, ra1, |_, b| !b),
            Opcode::Xor => alu(registers, ra0, ra1, |a, b| a ^ b),
            Opcode::AddWord => alu_word(registers, ra0, ra1, u32::wrapping_add),
            Opcode::SubWord => alu_word(registers, ra0, ra1, u32::wrapping_sub),
            Opcode::AndWord => alu_word(registers, ra0, ra1, |a, b| a & b),
            Opcode::OrWord => alu_word(registers, ra0, ra1, |a, b| a | b),
            Opcode::NotWord => alu_word(registers, ra0, ra1, |_, b| !b),
            Opcode::XorWord => alu_word(registers, ra0, ra1, |a, b| a ^ b),

            Opcode::Unknown(byte) => match self.unknown_opcode {
                UnknownOpcode::Fault => return Err(FaultKind::IllegalInstruction(byte)),
                UnknownOpcode::Halt => {
                    log::warn!("unknown opcode {byte:#04x}, treating it as halt");
                    return Ok(Flow::Halt);
                }
            },
        }

        Ok(Flow::Continue)
    }
}

/// An execution of the machine, implemented as an iterator that executes
/// instructions in sequence until the machine halts.
///
/// Each item is the executed instruction. A fault is yielded once as an error,
/// after which the iterator is exhausted. `halt` itself is not yielded.
pub struct Execution<'a, T, B> {
    machine: &'a mut Machine<T>,
    bus: &'a mut B,
}
impl<'a, T, B> Iterator for Execution<'a, T, B>
where
    T: SegmentMemory,
    B: InterruptBus,
{
    type Item = Result<Instruction, Fault>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.machine.is_running() {
            return None;
        }
        self.machine.step(self.bus).transpose()
    }
}
impl<'a, T, B> FusedIterator for Execution<'a, T, B>
where
    T: SegmentMemory,
    B: InterruptBus,
{
}
