//! PDP-11 general registers.
//!
//! The processor has 8 sixteen-bit registers:
//! - R0-R5: general purpose
//! - R6 (SP): stack pointer by convention
//! - R7 (PC): program counter
//!
//! All register arithmetic wraps modulo 65536.

use serde::{Serialize, Deserialize};

/// Index of the stack pointer.
pub const SP: u8 = 6;
/// Index of the program counter.
pub const PC: u8 = 7;

/// The PDP-11 register file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    r: [u16; 8],
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self { r: [0; 8] }
    }

    /// Read a register. Only the low 3 bits of `reg` are used.
    #[inline]
    pub fn get(&self, reg: u8) -> u16 {
        self.r[usize::from(reg & 7)]
    }

    /// Write a register. Only the low 3 bits of `reg` are used.
    #[inline]
    pub fn set(&mut self, reg: u8, value: u16) {
        self.r[usize::from(reg & 7)] = value;
    }

    /// Add a signed delta to a register, wrapping. Returns the new value.
    pub fn step(&mut self, reg: u8, delta: i16) -> u16 {
        let value = self.get(reg).wrapping_add_signed(delta);
        self.set(reg, value);
        value
    }

    /// Current program counter.
    #[inline]
    pub fn pc(&self) -> u16 {
        self.get(PC)
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u16) {
        self.set(PC, addr);
    }

    /// Advance the program counter by one word.
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> u16 {
        let old = self.pc();
        self.step(PC, 2);
        old
    }

    /// Snapshot of all eight registers.
    pub fn snapshot(&self) -> [u16; 8] {
        self.r
    }
}
