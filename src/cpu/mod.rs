//! CPU emulation for the PDP-11 subset.
//!
//! This module implements the processor core:
//! - byte-addressed memory of 16-bit words
//! - 8 general registers: R0-R5, SP (R6), PC (R7)
//! - N/Z/V/C condition codes
//! - 11 instructions across three encoding layouts, 8 addressing modes

pub mod memory;
pub mod registers;
pub mod flags;
pub mod decode;
pub mod operand;
pub mod execute;
pub mod stats;
pub mod trace;

pub use memory::{Memory, MemoryError};
pub use registers::Registers;
pub use flags::ConditionCodes;
pub use decode::{Instruction, Mode, Operand, DecodeError};
pub use operand::OperandPhrase;
pub use execute::{Cpu, CpuError, CpuState};
pub use stats::Statistics;
pub use trace::{TraceRecord, TraceSink, NullSink, MemoryWrite};
