//! # MiniAsm
//! A line-oriented assembler producing instruction images for MiniVM.
//!
//! Each line holds at most one instruction, a mnemonic followed by its operands,
//! separated by whitespace or commas. Everything after a `#` is a comment.
//! ```text
//! li r0 0       # syscall(write)
//! li r1 10      # buffer offset
//! li r2 8       # length
//! push r1
//! push r2
//! int 0x80
//! halt
//! ```
//!
//! ## Operands
//! - registers: `r0` to `r15`, with `sp` and `ip` as aliases of `r14` and `r15`.
//! - immediates: decimal, `0x` hexadecimal or `0b` binary numbers. `li` takes a
//!   4-bit immediate, `int` an 8-bit interrupt class.
//!
//! The `.word` directive emits a raw 16-bit word, which is handy to produce words
//! the machine does not know about.
//!
//! ## Output
//! Instructions are written as little endian 16-bit words: the opcode byte first,
//! then the `ra0:ra1` operand byte.

use either::*;
use thiserror::Error;

#[cfg(test)]
mod test;

type AssemblerResult<T> = Result<T, AssemblerError>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AssemblerErrorKind {
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),
    #[error("`{mnemonic}` expects {expected} operand(s), found {found}")]
    OperandCount {
        mnemonic: String,
        expected: usize,
        found: usize,
    },
    #[error("invalid register `{0}`")]
    InvalidRegister(String),
    #[error("invalid immediate `{0}`")]
    InvalidImmediate(String),
    #[error("expected a register, found immediate {0}")]
    ExpectedRegister(u64),
    #[error("expected an immediate, found register r{0}")]
    ExpectedImmediate(u8),
    #[error("immediate {value} does not fit, maximum is {max}")]
    ImmediateOutOfRange { value: u64, max: u64 },
}

/// An [`AssemblerErrorKind`] along with the line it was found on (starting at 1).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct AssemblerError {
    pub line: usize,
    pub kind: AssemblerErrorKind,
}

/// Operands expected by an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operands {
    None,
    /// `ra0`
    Register,
    /// `ra0`, 4-bit immediate in `ra1`
    RegisterImmediate,
    /// `ra0`, `ra1`
    RegisterRegister,
    /// Whole operand byte
    Class,
    /// Raw 16-bit word, for `.word`
    Word,
}
impl Operands {
    fn count(self) -> usize {
        match self {
            Self::None => 0,
            Self::Register | Self::Class | Self::Word => 1,
            Self::RegisterImmediate | Self::RegisterRegister => 2,
        }
    }
}

/// Maps a mnemonic to its opcode byte and operand layout.
fn operation(mnemonic: &str) -> Option<(u8, Operands)> {
    Some(match mnemonic {
        "li" => (0x00, Operands::RegisterImmediate),
        "push" => (0x01, Operands::Register),
        "int" => (0x02, Operands::Class),
        "halt" => (0x03, Operands::None),
        "add" => (0x04, Operands::RegisterRegister),
        "sub" => (0x05, Operands::RegisterRegister),
        "addw" => (0x06, Operands::RegisterRegister),
        "subw" => (0x07, Operands::RegisterRegister),
        "and" => (0x08, Operands::RegisterRegister),
        "or" => (0x09, Operands::RegisterRegister),
        "not" => (0x0a, Operands::RegisterRegister),
        "xor" => (0x0b, Operands::RegisterRegister),
        "andw" => (0x0c, Operands::RegisterRegister),
        "orw" => (0x0d, Operands::RegisterRegister),
        "notw" => (0x0e, Operands::RegisterRegister),
        "xorw" => (0x0f, Operands::RegisterRegister),
        _ => return None,
    })
}

/// Parses a register name to its index.
fn register(token: &str) -> Option<u8> {
    match token {
        "sp" => Some(14),
        "ip" => Some(15),
        _ => {
            let digits = token.strip_prefix('r')?;
            // Reject `r01`, `r+1` and the like, so every register has a single spelling.
            if !digits.bytes().all(|b| b.is_ascii_digit())
                || (digits.len() > 1 && digits.starts_with('0'))
            {
                return None;
            }
            digits.parse().ok().filter(|&index: &u8| index < 16)
        }
    }
}

/// Parses a decimal, hexadecimal (`0x`) or binary (`0b`) number.
fn immediate(token: &str) -> Option<u64> {
    let (digits, radix) = if let Some(hex) = token.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(binary) = token.strip_prefix("0b") {
        (binary, 2)
    } else {
        (token, 10)
    };
    // Immediates are unsigned, no leading `+` either.
    if !digits.starts_with(|c: char| c.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

/// Parses an operand that may be either a register (left) or an immediate (right).
fn parse_operand(token: &str) -> Result<Either<u8, u64>, AssemblerErrorKind> {
    if let Some(index) = register(token) {
        Ok(Left(index))
    } else if let Some(value) = immediate(token) {
        Ok(Right(value))
    } else if token.starts_with(|c: char| c.is_ascii_digit() || c == '+' || c == '-') {
        Err(AssemblerErrorKind::InvalidImmediate(token.into()))
    } else {
        Err(AssemblerErrorKind::InvalidRegister(token.into()))
    }
}

fn expect_register(token: &str) -> Result<u8, AssemblerErrorKind> {
    match parse_operand(token)? {
        Left(index) => Ok(index),
        Right(value) => Err(AssemblerErrorKind::ExpectedRegister(value)),
    }
}

fn expect_immediate(token: &str, max: u64) -> Result<u64, AssemblerErrorKind> {
    match parse_operand(token)? {
        Left(index) => Err(AssemblerErrorKind::ExpectedImmediate(index)),
        Right(value) if value > max => Err(AssemblerErrorKind::ImmediateOutOfRange { value, max }),
        Right(value) => Ok(value),
    }
}

/// Keeps track of all information regarding the current assembly process.
#[derive(Clone, Debug, Default)]
pub struct Assembler {
    // Current line of the source, starting at 1
    line: usize,

    // Created image
    image: Vec<u8>,
}
impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a word to the image.
    fn write_word(&mut self, word: u16) {
        self.image.extend_from_slice(&word.to_le_bytes());
    }

    /// Encodes a single instruction and writes it to the image.
    fn write_instruction(
        &mut self,
        mnemonic: &str,
        operands: &[&str],
    ) -> Result<u16, AssemblerErrorKind> {
        let (opcode, expected) = match mnemonic {
            ".word" => (0, Operands::Word),
            _ => operation(mnemonic)
                .ok_or_else(|| AssemblerErrorKind::UnknownOperation(mnemonic.into()))?,
        };
        if operands.len() != expected.count() {
            return Err(AssemblerErrorKind::OperandCount {
                mnemonic: mnemonic.into(),
                expected: expected.count(),
                found: operands.len(),
            });
        }

        let operand_byte = match expected {
            Operands::None => 0,
            Operands::Register => expect_register(operands[0])? << 4,
            Operands::RegisterImmediate => {
                let ra0 = expect_register(operands[0])?;
                let ra1 = expect_immediate(operands[1], 0x0f)? as u8;
                (ra0 << 4) | ra1
            }
            Operands::RegisterRegister => {
                let ra0 = expect_register(operands[0])?;
                let ra1 = expect_register(operands[1])?;
                (ra0 << 4) | ra1
            }
            Operands::Word => {
                let word = expect_immediate(operands[0], 0xffff)? as u16;
                self.write_word(word);
                return Ok(word);
            }
            Operands::Class => expect_immediate(operands[0], 0xff)? as u8,
        };

        let word = u16::from_le_bytes([opcode, operand_byte]);
        self.write_word(word);
        Ok(word)
    }

    /// Assembles one line of source.
    fn parse_line(&mut self, line: &str) -> Result<(), AssemblerErrorKind> {
        let code = match line.split_once('#') {
            Some((code, _comment)) => code,
            None => line,
        };
        let mut tokens = code
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty());
        let Some(mnemonic) = tokens.next() else {
            return Ok(());
        };
        let operands: Vec<&str> = tokens.collect();
        let word = self.write_instruction(mnemonic, &operands)?;
        log::trace!("line {}: {word:#06x}", self.line);
        Ok(())
    }

    /// Consumes the assembler to return either a fully assembled image or the
    /// first error encountered.
    pub fn parse<'src, I: Iterator<Item = &'src str>>(
        mut self,
        source: I,
    ) -> AssemblerResult<Vec<u8>> {
        for line in source {
            self.line += 1;
            self.parse_line(line).map_err(|kind| AssemblerError {
                line: self.line,
                kind,
            })?;
        }
        log::debug!("assembled {} words", self.image.len() / 2);
        Ok(self.image)
    }

    /// Helper method to parse full strings.
    pub fn parse_string(self, source: &str) -> AssemblerResult<Vec<u8>> {
        self.parse(source.lines())
    }
}

/// Assembles a full source string into an instruction image.
pub fn assemble(source: &str) -> AssemblerResult<Vec<u8>> {
    Assembler::new().parse_string(source)
}
