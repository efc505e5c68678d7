//! Run configuration.
//!
//! Configuration only affects what is observed about a run, never what the
//! machine computes.

use crate::cpu::memory::DEFAULT_WORDS;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Largest memory the 16-bit byte address space can reach.
pub const MAX_WORDS: usize = 32 * 1024;

/// How much per-instruction output to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TraceMode {
    /// Statistics only.
    #[default]
    Off,
    /// One line per executed instruction.
    Instructions,
    /// Instruction lines plus registers, operands, flags and a memory dump.
    Verbose,
}

impl TraceMode {
    /// Pick a mode from the `-t` / `-v` switches. Verbose implies tracing.
    pub fn from_switches(trace: bool, verbose: bool) -> Self {
        match (trace, verbose) {
            (_, true) => TraceMode::Verbose,
            (true, false) => TraceMode::Instructions,
            (false, false) => TraceMode::Off,
        }
    }

    /// Whether instruction lines are printed.
    pub fn traces(self) -> bool {
        self != TraceMode::Off
    }

    /// Whether verbose dumps are printed.
    pub fn verbose(self) -> bool {
        self == TraceMode::Verbose
    }
}

/// Settings for a single emulator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub trace: TraceMode,
    /// Memory size in 16-bit words.
    pub memory_words: usize,
    /// Stop after this many instructions if the program has not halted.
    pub max_steps: Option<u64>,
    /// Emit the final report as JSON.
    pub json: bool,
}

impl RunConfig {
    /// Check the settings are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory_words == 0 || self.memory_words > MAX_WORDS {
            return Err(ConfigError::MemorySize(self.memory_words));
        }
        if self.max_steps == Some(0) {
            return Err(ConfigError::ZeroStepLimit);
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            trace: TraceMode::Off,
            memory_words: DEFAULT_WORDS,
            max_steps: None,
            json: false,
        }
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("memory size {0} words is outside 1..=32768")]
    MemorySize(usize),

    #[error("step limit must be at least 1")]
    ZeroStepLimit,
}
