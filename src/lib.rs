//! # PDP-11 Emulator
//!
//! An instruction-level emulator for a subset of the DEC PDP-11.
//!
//! The machine is a 16-bit minicomputer with eight general registers
//! (R6 is the stack pointer, R7 the program counter), byte-addressed
//! word memory, and four condition codes. This crate executes the
//! MOV/CMP/ADD/SUB, BR/BEQ/BNE/SOB and ASL/ASR subset across all eight
//! addressing modes and counts the memory traffic each instruction causes.

pub mod cpu;
pub mod config;
pub mod loader;
pub mod report;

// Re-export commonly used types
pub use cpu::{
    ConditionCodes, Cpu, CpuError, CpuState, Instruction, Memory, Registers, Statistics,
    TraceRecord, TraceSink,
};
pub use config::{RunConfig, TraceMode};
pub use loader::{parse_image, read_image, LoadError, ProgramImage};
