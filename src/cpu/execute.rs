//! CPU execution engine for the PDP-11 subset.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::cpu::{Memory, Registers};
use crate::cpu::decode::{self, DecodeError, Instruction, Operand, Mode};
use crate::cpu::flags::{self, ConditionCodes};
use crate::cpu::memory::MemoryError;
use crate::cpu::operand::{self, OperandError, OperandPhrase};
use crate::cpu::stats::Statistics;
use crate::cpu::trace::{MemoryWrite, NullSink, TraceRecord, TraceSink};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info};

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU fetched the halt word.
    Halted,
    /// CPU stopped on a fatal error.
    Failed,
}

/// What one instruction did, beyond register and PC updates.
#[derive(Default)]
struct Effect {
    src: Option<u16>,
    dst: Option<u16>,
    result: Option<u16>,
    flags: Option<ConditionCodes>,
    write: Option<MemoryWrite>,
    taken: Option<bool>,
}

/// The PDP-11 CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// General registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Condition codes.
    pub flags: ConditionCodes,
    /// Current execution state.
    pub state: CpuState,
    stats: Statistics,
}

impl Cpu {
    /// Create a new CPU with `memory_words` words of zeroed memory.
    pub fn new(memory_words: usize) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::with_words(memory_words),
            flags: ConditionCodes::default(),
            state: CpuState::Running,
            stats: Statistics::new(),
        }
    }

    /// Create a CPU with default-sized memory holding `program` at address 0.
    pub fn with_program(program: &[u16]) -> Result<Self, MemoryError> {
        let mut cpu = Self::default();
        cpu.load_program(program)?;
        Ok(cpu)
    }

    /// Load a program into memory starting at address 0.
    pub fn load_program(&mut self, program: &[u16]) -> Result<(), MemoryError> {
        self.mem.load_program(program)
    }

    /// Execution statistics so far.
    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed, or an error.
    pub fn step(&mut self) -> Result<Instruction, CpuError> {
        self.step_traced(&mut NullSink)
    }

    /// Execute a single instruction, reporting it to `sink`.
    pub fn step_traced(&mut self, sink: &mut dyn TraceSink) -> Result<Instruction, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        let pc = self.regs.pc();
        match self.cycle(pc) {
            Ok((word, instruction, effect)) => {
                sink.record(&TraceRecord {
                    pc,
                    word,
                    instruction,
                    src: effect.src,
                    dst: effect.dst,
                    result: effect.result,
                    flags: effect.flags,
                    write: effect.write,
                    taken: effect.taken,
                    registers: self.regs.snapshot(),
                });
                Ok(instruction)
            }
            Err(e) => {
                debug!(pc, error = %e, "execution failed");
                sink.fault(pc);
                self.state = CpuState::Failed;
                Err(e)
            }
        }
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        self.run_traced(&mut NullSink)
    }

    /// Run until halt or error, reporting each instruction to `sink`.
    pub fn run_traced(&mut self, sink: &mut dyn TraceSink) -> Result<u64, CpuError> {
        let start = self.stats.instructions_executed;

        while self.state == CpuState::Running {
            self.step_traced(sink)?;
        }

        Ok(self.stats.instructions_executed - start)
    }

    /// Run for at most `max_steps` instructions.
    pub fn run_limited(&mut self, max_steps: u64, sink: &mut dyn TraceSink) -> Result<u64, CpuError> {
        let start = self.stats.instructions_executed;
        let limit = start.saturating_add(max_steps);

        while self.state == CpuState::Running && self.stats.instructions_executed < limit {
            self.step_traced(sink)?;
        }

        Ok(self.stats.instructions_executed - start)
    }

    /// Fetch, decode and execute the instruction at `pc`.
    fn cycle(&mut self, pc: u16) -> Result<(u16, Instruction, Effect), CpuError> {
        // Fetch
        let word = self.mem.read(pc).map_err(|source| CpuError::MemoryFault { pc, source })?;
        self.regs.advance_pc();
        self.stats.instructions_executed += 1;
        self.stats.instruction_words_fetched += 1;

        // Decode
        let instruction = decode::decode(word).map_err(|source| CpuError::InvalidOpcode { pc, source })?;
        debug!(pc, word, ?instruction, "decoded");

        // Execute
        let effect = self.execute(instruction).map_err(|e| match e {
            OperandError::Memory(source) => CpuError::MemoryFault { pc, source },
            OperandError::AddressRange(value) => CpuError::AddressRangeViolation { pc, value },
        })?;

        Ok((word, instruction, effect))
    }

    /// Execute a decoded instruction.
    fn execute(&mut self, instr: Instruction) -> Result<Effect, OperandError> {
        let effect = match instr {
            Instruction::Halt => {
                self.state = CpuState::Halted;
                info!(
                    instructions = self.stats.instructions_executed,
                    "halted"
                );
                Effect::default()
            }

            // ==================== Double Operand ====================

            Instruction::Mov { src, dst } => {
                let src = self.resolve(src)?;
                let dst = self.resolve(dst)?;
                self.flags = flags::mov(src.value, self.flags);

                // Only an autoincrement destination is stored to memory
                let write = match (dst.mode, dst.addr) {
                    (Mode::Autoincrement, Some(addr)) => {
                        self.mem.write(addr, src.value)?;
                        self.stats.data_words_written += 1;
                        Some(MemoryWrite { addr, value: src.value })
                    }
                    _ => {
                        self.regs.set(dst.reg, src.value);
                        None
                    }
                };

                Effect {
                    src: Some(src.value),
                    flags: Some(self.flags),
                    write,
                    ..Effect::default()
                }
            }

            Instruction::Cmp { src, dst } => {
                let src = self.resolve(src)?;
                let dst = self.resolve(dst)?;
                let (result, cc) = flags::cmp(src.value, dst.value);
                self.flags = cc;
                Effect {
                    src: Some(src.value),
                    dst: Some(dst.value),
                    result: Some(result),
                    flags: Some(cc),
                    ..Effect::default()
                }
            }

            Instruction::Add { src, dst } => {
                let src = self.resolve(src)?;
                let dst = self.resolve(dst)?;
                let (result, cc) = flags::add(src.value, dst.value);
                self.flags = cc;
                self.regs.set(dst.reg, result);
                Effect {
                    src: Some(src.value),
                    dst: Some(dst.value),
                    result: Some(result),
                    flags: Some(cc),
                    ..Effect::default()
                }
            }

            Instruction::Sub { src, dst } => {
                let src = self.resolve(src)?;
                let dst = self.resolve(dst)?;
                let (result, cc) = flags::sub(src.value, dst.value);
                self.flags = cc;
                self.regs.set(dst.reg, result);
                Effect {
                    src: Some(src.value),
                    dst: Some(dst.value),
                    result: Some(result),
                    flags: Some(cc),
                    ..Effect::default()
                }
            }

            // ==================== Single Operand ====================

            Instruction::Asl { dst } => {
                let dst = self.resolve(dst)?;
                let (result, cc) = flags::asl(self.regs.get(dst.reg), dst.value);
                self.flags = cc;
                self.regs.set(dst.reg, result);
                Effect {
                    dst: Some(dst.value),
                    result: Some(result),
                    flags: Some(cc),
                    ..Effect::default()
                }
            }

            Instruction::Asr { dst } => {
                let dst = self.resolve(dst)?;
                let (result, cc) = flags::asr(self.regs.get(dst.reg), dst.value);
                self.flags = cc;
                self.regs.set(dst.reg, result);
                Effect {
                    dst: Some(dst.value),
                    result: Some(result),
                    flags: Some(cc),
                    ..Effect::default()
                }
            }

            // ==================== Branches ====================

            Instruction::Br { offset } => self.branch(true, offset),

            Instruction::Beq { offset } => self.branch(self.flags.z, offset),

            Instruction::Bne { offset } => self.branch(!self.flags.z, offset),

            Instruction::Sob { reg, offset } => {
                let count = self.regs.step(reg, -1);
                // SOB branches backwards: the offset is subtracted
                self.branch(count != 0, offset.wrapping_neg())
            }
        };

        Ok(effect)
    }

    /// Count a branch and, if `taken`, move PC by `offset` words.
    fn branch(&mut self, taken: bool, offset: i8) -> Effect {
        self.stats.branch(taken);
        if taken {
            let target = self.regs.pc().wrapping_add_signed(i16::from(offset) * 2);
            self.regs.jump(target);
        }
        Effect {
            taken: Some(taken),
            ..Effect::default()
        }
    }

    fn resolve(&mut self, operand: Operand) -> Result<OperandPhrase, OperandError> {
        operand::resolve(operand, &mut self.regs, &self.mem, &mut self.stats)
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new(crate::cpu::memory::DEFAULT_WORDS)
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("regs", &self.regs)
            .field("flags", &self.flags)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Errors that stop the CPU. All of them are fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("bad instruction at PC = {pc:06o}: {source}")]
    InvalidOpcode {
        pc: u16,
        #[source]
        source: DecodeError,
    },

    #[error("operand {value:o} out of range at PC = {pc:06o}")]
    AddressRangeViolation { pc: u16, value: u32 },

    #[error("memory fault at PC = {pc:06o}: {source}")]
    MemoryFault {
        pc: u16,
        #[source]
        source: MemoryError,
    },
}

impl CpuError {
    /// Address of the instruction that failed.
    pub fn pc(&self) -> Option<u16> {
        match self {
            CpuError::NotRunning(_) => None,
            CpuError::InvalidOpcode { pc, .. }
            | CpuError::AddressRangeViolation { pc, .. }
            | CpuError::MemoryFault { pc, .. } => Some(*pc),
        }
    }
}
