//! Structured per-instruction trace records.
//!
//! The engine never formats anything itself. After each instruction it
//! hands a [`TraceRecord`] to a [`TraceSink`]; rendering lives in
//! [`crate::report`].

use crate::cpu::decode::Instruction;
use crate::cpu::flags::ConditionCodes;
use serde::{Serialize, Deserialize};

/// A word stored to memory by an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryWrite {
    pub addr: u16,
    pub value: u16,
}

/// Everything observable about one executed instruction.
///
/// Optional fields are present only when the instruction defines them:
/// `src` for double-operand forms, `dst` for CMP/ADD/SUB/ASL/ASR,
/// `result` for instructions that compute one, `flags` when the condition
/// codes were set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Address the instruction word was fetched from.
    pub pc: u16,
    /// Raw instruction word.
    pub word: u16,
    pub instruction: Instruction,
    pub src: Option<u16>,
    pub dst: Option<u16>,
    pub result: Option<u16>,
    pub flags: Option<ConditionCodes>,
    pub write: Option<MemoryWrite>,
    /// Whether a branch instruction took its branch.
    pub taken: Option<bool>,
    /// Register contents after the instruction.
    pub registers: [u16; 8],
}

/// Receiver for trace records.
pub trait TraceSink {
    fn record(&mut self, record: &TraceRecord);

    /// Called instead of [`TraceSink::record`] when the instruction at `pc`
    /// stops the run.
    fn fault(&mut self, _pc: u16) {}
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn record(&mut self, _record: &TraceRecord) {}
}

impl TraceSink for Vec<TraceRecord> {
    fn record(&mut self, record: &TraceRecord) {
        self.push(record.clone());
    }
}
