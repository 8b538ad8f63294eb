//! # Instruction encoding
//! Every instruction is a single 16-bit word:
//!
//! | **Bits** | 15..12 | 11..8 | 7..0 |
//! | -------- | ------ | ----- | ---- |
//! | **Field** | `ra0` | `ra1` | opcode |
//!
//! Images store words in little endian order, so the opcode is the first byte of
//! each instruction and `ra0:ra1` the second one. That second byte is called the
//! *operand byte*; `int` uses it whole as its interrupt class.
//!
//! Decoding is total: any word decodes to some [`Instruction`], opcodes without
//! a meaning become [`Opcode::Unknown`] and are dealt with by the executor.

use core::fmt::Display;

use crate::registers::register_name;

/// Operation selected by the low byte of an instruction word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// `li ra0 imm`: loads the 4-bit immediate `ra1` into `ra0`.
    LoadImmediate,
    /// `push ra0`: pushes a 64-bit register onto the data stack.
    Push,
    /// `int class`: calls the interrupt bus with the operand byte as class.
    Interrupt,
    /// `halt`: stops the machine.
    Halt,
    Add,
    Sub,
    AddWord,
    SubWord,
    And,
    Or,
    Not,
    Xor,
    AndWord,
    OrWord,
    NotWord,
    XorWord,
    /// Any other opcode byte.
    Unknown(u8),
}
impl Opcode {
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Self::LoadImmediate,
            0x01 => Self::Push,
            0x02 => Self::Interrupt,
            0x03 => Self::Halt,
            0x04 => Self::Add,
            0x05 => Self::Sub,
            0x06 => Self::AddWord,
            0x07 => Self::SubWord,
            0x08 => Self::And,
            0x09 => Self::Or,
            0x0a => Self::Not,
            0x0b => Self::Xor,
            0x0c => Self::AndWord,
            0x0d => Self::OrWord,
            0x0e => Self::NotWord,
            0x0f => Self::XorWord,
            other => Self::Unknown(other),
        }
    }

    pub const fn byte(self) -> u8 {
        match self {
            Self::LoadImmediate => 0x00,
            Self::Push => 0x01,
            Self::Interrupt => 0x02,
            Self::Halt => 0x03,
            Self::Add => 0x04,
            Self::Sub => 0x05,
            Self::AddWord => 0x06,
            Self::SubWord => 0x07,
            Self::And => 0x08,
            Self::Or => 0x09,
            Self::Not => 0x0a,
            Self::Xor => 0x0b,
            Self::AndWord => 0x0c,
            Self::OrWord => 0x0d,
            Self::NotWord => 0x0e,
            Self::XorWord => 0x0f,
            Self::Unknown(byte) => byte,
        }
    }

    /// Assembly mnemonic, `None` for unknown opcodes.
    pub const fn mnemonic(self) -> Option<&'static str> {
        Some(match self {
            Self::LoadImmediate => "li",
            Self::Push => "push",
            Self::Interrupt => "int",
            Self::Halt => "halt",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::AddWord => "addw",
            Self::SubWord => "subw",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Xor => "xor",
            Self::AndWord => "andw",
            Self::OrWord => "orw",
            Self::NotWord => "notw",
            Self::XorWord => "xorw",
            Self::Unknown(_) => return None,
        })
    }
}

/// A decoded instruction word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub opcode: Opcode,
    pub ra0: u8,
    pub ra1: u8,
}
impl Instruction {
    /// Splits a raw word into its fields.
    /// # Example
    /// ```rust
    /// # use minivm::instruction::*;
    /// let instruction = Instruction::decode(0x1a00);
    /// assert_eq!(instruction.opcode, Opcode::LoadImmediate);
    /// assert_eq!((instruction.ra0, instruction.ra1), (1, 10));
    /// ```
    pub const fn decode(raw: u16) -> Self {
        Self {
            opcode: Opcode::from_byte((raw & 0xff) as u8),
            ra1: ((raw >> 8) & 0x0f) as u8,
            ra0: ((raw >> 12) & 0x0f) as u8,
        }
    }

    /// Packs the fields back into a raw word. Register fields are truncated to 4 bits.
    pub const fn encode(self) -> u16 {
        ((self.ra0 as u16 & 0x0f) << 12) | ((self.ra1 as u16 & 0x0f) << 8) | self.opcode.byte() as u16
    }

    /// Both register fields taken together as a single byte.
    pub const fn operand_byte(self) -> u8 {
        ((self.ra0 & 0x0f) << 4) | (self.ra1 & 0x0f)
    }
}
impl From<u16> for Instruction {
    fn from(raw: u16) -> Self {
        Self::decode(raw)
    }
}
impl From<Instruction> for u16 {
    fn from(instruction: Instruction) -> Self {
        instruction.encode()
    }
}
impl Display for Instruction {
    /// Formats the instruction using assembler syntax.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let Some(mnemonic) = self.opcode.mnemonic() else {
            return write!(f, ".word {:#06x}", self.encode());
        };
        match self.opcode {
            Opcode::LoadImmediate => write!(f, "{mnemonic} {} {}", register_name(self.ra0), self.ra1),
            Opcode::Push => write!(f, "{mnemonic} {}", register_name(self.ra0)),
            Opcode::Interrupt => write!(f, "{mnemonic} {:#04x}", self.operand_byte()),
            Opcode::Halt => write!(f, "{mnemonic}"),
            _ => write!(
                f,
                "{mnemonic} {} {}",
                register_name(self.ra0),
                register_name(self.ra1)
            ),
        }
    }
}
