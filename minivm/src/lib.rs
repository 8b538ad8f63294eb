//! # MiniVM: a minimal register machine
//! A small virtual machine built to show a fetch-decode-execute loop in action.
//!
//! Programs come as two raw images: an instruction image made of 16-bit words,
//! and a data image copied at the start of data memory. The machine runs the
//! instructions against sixteen 64-bit registers until `halt`, and reaches the
//! outside world only through the `int` instruction and an [`InterruptBus`].
//!
//! ```rust
//! use minivm::{ConsoleBus, MachineConfig, SegmentMemory};
//!
//! let mut machine = MachineConfig::default().build().unwrap();
//! // li r1 3, halt
//! machine.instruction_memory_mut().load(&[0x00u8, 0x13, 0x03, 0x00][..]).unwrap();
//! machine.run(&mut ConsoleBus::new(Vec::new())).unwrap();
//! assert_eq!(machine.registers().read(1), 3);
//! ```

pub mod bus;
pub mod config;
pub mod dump;
pub mod error;
pub mod instruction;
pub mod machine;
pub mod memory;
pub mod registers;

pub use bus::{ConsoleBus, InterruptBus};
pub use config::{MachineConfig, UnknownOpcode};
pub use error::{Fault, FaultKind};
pub use instruction::{Instruction, Opcode};
pub use machine::{Execution, Machine, Status};
pub use memory::SegmentMemory;
pub use registers::RegisterFile;
