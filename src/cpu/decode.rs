//! Instruction decoder for the PDP-11 subset.
//!
//! The opcode space is not uniformly partitioned, so a word is matched
//! against three field layouts in a fixed order:
//!
//! ```text
//!  15  12 11  9 8   6 5   3 2   0
//! | op   | sm  | sr  | dm  | dr  |   double operand: MOV CMP ADD SUB
//! |      op (10 bits)  | dm  | dr  |   single operand: ASL ASR
//! |      op (10 bits)  | ..offset..|   branch: BR BEQ
//! |   op (7 bits)   | r   | off(6) |   SOB
//! |   op (7 bits)   |  offset (8)  |   BNE
//! ```
//!
//! BR and BEQ are matched on the full 10-bit opcode but take their offset
//! from the low 8 bits, which overlap the opcode match. Only offsets 0-077
//! decode as BR/BEQ; a BEQ word with a larger offset falls through to the
//! BNE layout, and such a BR word is invalid.
//!
//! The all-zero word is HALT and is recognised before any layout.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Operand addressing mode (bits 5-3 or 11-9 of the instruction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// `Rn` - operand is the register itself
    Register,
    /// `(Rn)` - register holds the address
    RegisterDeferred,
    /// `(Rn)+` - register holds the address, then advances by 2
    Autoincrement,
    /// `@(Rn)+` - register points at the address, then advances by 2
    AutoincrementDeferred,
    /// `-(Rn)` - register drops by 2, then holds the address
    Autodecrement,
    /// `@-(Rn)` - register drops by 2, then points at the address
    AutodecrementDeferred,
    /// `X(Rn)` - address is register plus a displacement word
    Index,
    /// `@X(Rn)` - register plus displacement points at the address
    IndexDeferred,
}

impl Mode {
    /// All modes in encoding order.
    pub const ALL: [Mode; 8] = [
        Mode::Register,
        Mode::RegisterDeferred,
        Mode::Autoincrement,
        Mode::AutoincrementDeferred,
        Mode::Autodecrement,
        Mode::AutodecrementDeferred,
        Mode::Index,
        Mode::IndexDeferred,
    ];

    /// Create from a 3-bit field. Higher bits are ignored.
    pub fn from_bits(bits: u16) -> Self {
        Self::ALL[usize::from(bits & 7)]
    }

    /// The 3-bit encoding.
    pub fn bits(self) -> u16 {
        self as u16
    }
}

/// A mode/register operand field as it appears in the instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operand {
    pub mode: Mode,
    pub reg: u8,
}

impl Operand {
    pub fn new(mode: Mode, reg: u8) -> Self {
        Self { mode, reg: reg & 7 }
    }

    /// Register mode on `reg`.
    pub fn reg(reg: u8) -> Self {
        Self::new(Mode::Register, reg)
    }

    /// Decode a 6-bit mode+register field.
    fn from_field(field: u16) -> Self {
        Self::new(Mode::from_bits(field >> 3), (field & 7) as u8)
    }

    fn field(self) -> u16 {
        (self.mode.bits() << 3) | u16::from(self.reg)
    }
}

/// Decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Control ====================

    /// The all-zero word.
    Halt,

    // ==================== Double Operand ====================

    /// dst := src
    Mov { src: Operand, dst: Operand },

    /// Set flags from src - dst
    Cmp { src: Operand, dst: Operand },

    /// dst := src + dst
    Add { src: Operand, dst: Operand },

    /// dst := dst - src
    Sub { src: Operand, dst: Operand },

    // ==================== Single Operand ====================

    /// Arithmetic shift left one place
    Asl { dst: Operand },

    /// Arithmetic shift right one place
    Asr { dst: Operand },

    // ==================== Branches ====================

    /// Unconditional branch by `offset` words
    Br { offset: i8 },

    /// Branch if Z set
    Beq { offset: i8 },

    /// Branch if Z clear
    Bne { offset: i8 },

    /// Decrement `reg`, branch back `offset` words if non-zero.
    /// The offset is a sign-extended 6-bit field.
    Sob { reg: u8, offset: i8 },
}

impl Instruction {
    /// Lower-case mnemonic.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Halt => "halt",
            Instruction::Mov { .. } => "mov",
            Instruction::Cmp { .. } => "cmp",
            Instruction::Add { .. } => "add",
            Instruction::Sub { .. } => "sub",
            Instruction::Asl { .. } => "asl",
            Instruction::Asr { .. } => "asr",
            Instruction::Br { .. } => "br",
            Instruction::Beq { .. } => "beq",
            Instruction::Bne { .. } => "bne",
            Instruction::Sob { .. } => "sob",
        }
    }
}

/// Opcode values for each layout.
struct Opcode;

impl Opcode {
    // word >> 12
    const MOV: u16 = 0o01;
    const CMP: u16 = 0o02;
    const ADD: u16 = 0o06;
    const SUB: u16 = 0o16;

    // word >> 6
    const BR: u16 = 0o0004;
    const BEQ: u16 = 0o0014;
    const ASR: u16 = 0o0062;
    const ASL: u16 = 0o0063;

    // word >> 9
    const BNE: u16 = 0o001;
    const SOB: u16 = 0o077;
}

/// Sign-extend the low 6 bits of a word.
fn sign_extend_6(word: u16) -> i8 {
    (((word & 0o77) as u8) << 2) as i8 >> 2
}

/// Decode a 16-bit instruction word.
pub fn decode(word: u16) -> Result<Instruction, DecodeError> {
    if word == 0 {
        return Ok(Instruction::Halt);
    }

    // Double operand: 4-bit opcode, two 6-bit operand fields
    let src = Operand::from_field(word >> 6);
    let dst = Operand::from_field(word);
    match word >> 12 {
        Opcode::MOV => return Ok(Instruction::Mov { src, dst }),
        Opcode::CMP => return Ok(Instruction::Cmp { src, dst }),
        Opcode::ADD => return Ok(Instruction::Add { src, dst }),
        Opcode::SUB => return Ok(Instruction::Sub { src, dst }),
        _ => {}
    }

    // 10-bit opcode: branch offset or a single operand field
    let offset = (word & 0o377) as u8 as i8;
    match word >> 6 {
        Opcode::BR => return Ok(Instruction::Br { offset }),
        Opcode::BEQ => return Ok(Instruction::Beq { offset }),
        Opcode::ASR => return Ok(Instruction::Asr { dst }),
        Opcode::ASL => return Ok(Instruction::Asl { dst }),
        _ => {}
    }

    // 7-bit opcode
    match word >> 9 {
        Opcode::SOB => Ok(Instruction::Sob {
            reg: ((word >> 6) & 7) as u8,
            offset: sign_extend_6(word),
        }),
        Opcode::BNE => Ok(Instruction::Bne { offset }),
        _ => Err(DecodeError::InvalidOpcode(word)),
    }
}

/// Encode an instruction back to a 16-bit word.
pub fn encode(instr: &Instruction) -> u16 {
    let double = |op: u16, src: &Operand, dst: &Operand| (op << 12) | (src.field() << 6) | dst.field();
    let branch = |op: u16, offset: i8| (op << 6) | u16::from(offset as u8);

    match instr {
        Instruction::Halt => 0,
        Instruction::Mov { src, dst } => double(Opcode::MOV, src, dst),
        Instruction::Cmp { src, dst } => double(Opcode::CMP, src, dst),
        Instruction::Add { src, dst } => double(Opcode::ADD, src, dst),
        Instruction::Sub { src, dst } => double(Opcode::SUB, src, dst),
        Instruction::Asl { dst } => (Opcode::ASL << 6) | dst.field(),
        Instruction::Asr { dst } => (Opcode::ASR << 6) | dst.field(),
        Instruction::Br { offset } => branch(Opcode::BR, *offset),
        Instruction::Beq { offset } => branch(Opcode::BEQ, *offset),
        Instruction::Bne { offset } => (Opcode::BNE << 9) | u16::from(*offset as u8),
        Instruction::Sob { reg, offset } => {
            (Opcode::SOB << 9) | (u16::from(reg & 7) << 6) | (u16::from(*offset as u8) & 0o77)
        }
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid instruction word {0:06o}")]
    InvalidOpcode(u16),
}
