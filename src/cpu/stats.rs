//! Execution statistics.

use serde::{Serialize, Deserialize};

/// Monotonic counters collected while a program runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Instructions executed, including the final halt.
    pub instructions_executed: u64,
    /// Instruction-stream words fetched: opcodes, immediates, index words.
    pub instruction_words_fetched: u64,
    /// Data words read by operand resolution.
    pub data_words_read: u64,
    /// Data words written back to memory.
    pub data_words_written: u64,
    /// Branch instructions executed.
    pub branches_executed: u64,
    /// Branch instructions whose condition held.
    pub branches_taken: u64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one branch, taken or not.
    pub fn branch(&mut self, taken: bool) {
        self.branches_executed += 1;
        if taken {
            self.branches_taken += 1;
        }
    }

    /// Percentage of executed branches that were taken, if any ran.
    pub fn branch_taken_percent(&self) -> Option<f64> {
        if self.branches_executed == 0 {
            return None;
        }
        Some(self.branches_taken as f64 / self.branches_executed as f64 * 100.0)
    }
}
