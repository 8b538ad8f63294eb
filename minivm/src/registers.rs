//! # Register file
//! The machine holds sixteen 64-bit registers. Register indices always come from
//! a 4-bit instruction field, so every index from 0 to 15 is valid.
//!
//! The last two slots are special purpose:
//!
//! | **Index** | 0 ... 13 | 14 | 15 |
//! | --------- | -------- | -- | -- |
//! | **Name** | `r0` ... `r13` | `sp` | `ip` |
//!
//! `sp` is a byte offset into data memory, `ip` is a word index into instruction
//! memory. Since both are ordinary registers, any instruction may read or write them.

use core::fmt::{Debug, Display};

/// Number of registers, special purpose ones included.
pub const REGISTER_COUNT: usize = 16;
/// Index of the stack pointer.
pub const SP: u8 = 14;
/// Index of the instruction pointer.
pub const IP: u8 = 15;

const NAMES: [&str; REGISTER_COUNT] = [
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "r12", "r13", "sp",
    "ip",
];

/// Returns the assembly name of a register.
/// # Example
/// ```rust
/// # use minivm::registers::register_name;
/// assert_eq!(register_name(3), "r3");
/// assert_eq!(register_name(14), "sp");
/// ```
pub fn register_name(index: u8) -> &'static str {
    NAMES[(index & 0x0f) as usize]
}

#[derive(Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct RegisterFile {
    registers: [u64; REGISTER_COUNT],
}
impl RegisterFile {
    /// Returns a register file with every register set to zero.
    pub const fn new() -> Self {
        Self {
            registers: [0; REGISTER_COUNT],
        }
    }

    /// Reads a register. Only the low 4 bits of `index` are considered.
    /// # Example
    /// ```rust
    /// # use minivm::registers::RegisterFile;
    /// let mut registers = RegisterFile::new();
    /// registers.write(2, 0xbeef);
    /// assert_eq!(registers.read(2), 0xbeef);
    /// assert_eq!(registers.read(0x12), 0xbeef);
    /// ```
    pub fn read(&self, index: u8) -> u64 {
        self.registers[(index & 0x0f) as usize]
    }
    /// Writes a register. Only the low 4 bits of `index` are considered.
    pub fn write(&mut self, index: u8, value: u64) {
        self.registers[(index & 0x0f) as usize] = value
    }

    pub fn sp(&self) -> u64 {
        self.read(SP)
    }
    pub fn set_sp(&mut self, value: u64) {
        self.write(SP, value)
    }
    pub fn ip(&self) -> u64 {
        self.read(IP)
    }
    pub fn set_ip(&mut self, value: u64) {
        self.write(IP, value)
    }

    /// Iterates over `(name, value)` pairs, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        NAMES.iter().copied().zip(self.registers.iter().copied())
    }
}
impl Debug for RegisterFile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
impl Display for RegisterFile {
    /// Four registers per line, in hexadecimal.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            write!(f, "{name:>3} = {value:#018x}")?;
            if i % 4 == 3 {
                writeln!(f)?
            } else {
                write!(f, "  ")?
            }
        }
        Ok(())
    }
}
