//! Operand resolution for the eight addressing modes.
//!
//! Resolving an operand may move registers (autoincrement, autodecrement,
//! and the PC when it supplies an immediate or index word) and always
//! updates the traffic counters in [`Statistics`]. Memory itself is only
//! read here; stores are performed by the instruction that owns the
//! destination.

use crate::cpu::decode::{Mode, Operand};
use crate::cpu::memory::{Memory, MemoryError};
use crate::cpu::registers::{Registers, PC};
use crate::cpu::stats::Statistics;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::trace;

/// A resolved operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperandPhrase {
    pub mode: Mode,
    pub reg: u8,
    /// Effective address. `None` in register mode.
    pub addr: Option<u16>,
    /// Operand value.
    pub value: u16,
}

/// Errors raised while resolving an operand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperandError {
    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("autoincrement operand {0:o} exceeds the 16-bit range")]
    AddressRange(u32),
}

/// Reject autoincrement quantities that do not fit in 16 bits.
fn within_range(value: u32) -> Result<u16, OperandError> {
    u16::try_from(value).map_err(|_| OperandError::AddressRange(value))
}

/// Read the displacement word at PC and step PC past it.
fn fetch_displacement(
    regs: &mut Registers,
    mem: &Memory,
    stats: &mut Statistics,
) -> Result<u16, OperandError> {
    let displacement = mem.read(regs.pc())?;
    stats.instruction_words_fetched += 1;
    stats.data_words_read += 3;
    Ok(displacement)
}

/// Resolve `operand` to its effective address and value.
pub fn resolve(
    operand: Operand,
    regs: &mut Registers,
    mem: &Memory,
    stats: &mut Statistics,
) -> Result<OperandPhrase, OperandError> {
    let Operand { mode, reg } = operand;

    let (addr, value) = match mode {
        Mode::Register => (None, regs.get(reg)),

        Mode::RegisterDeferred => {
            let addr = regs.get(reg);
            let value = mem.read(addr)?;
            stats.data_words_read += 1;
            (Some(addr), value)
        }

        Mode::Autoincrement => {
            // (PC)+ is an immediate operand taken from the instruction stream
            if reg == PC {
                stats.instruction_words_fetched += 1;
            }
            let addr = within_range(u32::from(regs.get(reg)))?;
            let value = within_range(u32::from(mem.read(addr)?))?;
            regs.step(reg, 2);
            (Some(addr), value)
        }

        Mode::AutoincrementDeferred => {
            stats.data_words_read += 1;
            let addr = mem.read(regs.get(reg))?;
            let value = mem.read(addr)?;
            regs.step(reg, 2);
            (Some(addr), value)
        }

        Mode::Autodecrement => {
            stats.data_words_read += 1;
            let addr = regs.step(reg, -2);
            let value = mem.read(addr)?;
            (Some(addr), value)
        }

        Mode::AutodecrementDeferred => {
            stats.data_words_read += 1;
            let pointer = regs.step(reg, -2);
            let addr = mem.read(pointer)?;
            let value = mem.read(addr)?;
            (Some(addr), value)
        }

        Mode::Index => {
            let displacement = fetch_displacement(regs, mem, stats)?;
            let addr = regs.get(reg).wrapping_add(displacement);
            regs.advance_pc();
            let value = mem.read(addr)?;
            (Some(addr), value)
        }

        Mode::IndexDeferred => {
            let displacement = fetch_displacement(regs, mem, stats)?;
            let pointer = regs.get(reg).wrapping_add(displacement);
            regs.advance_pc();
            let addr = mem.read(pointer)?;
            let value = mem.read(addr)?;
            (Some(addr), value)
        }
    };

    trace!(?mode, reg, ?addr, value, "resolved operand");

    Ok(OperandPhrase { mode, reg, addr, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        regs: Registers,
        mem: Memory,
        stats: Statistics,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                regs: Registers::new(),
                mem: Memory::new(),
                stats: Statistics::new(),
            }
        }

        fn resolve(&mut self, mode: Mode, reg: u8) -> OperandPhrase {
            resolve(Operand::new(mode, reg), &mut self.regs, &self.mem, &mut self.stats).unwrap()
        }
    }

    #[test]
    fn test_register_mode() {
        let mut fx = Fixture::new();
        fx.regs.set(3, 0o1234);

        let phrase = fx.resolve(Mode::Register, 3);
        assert_eq!(phrase.value, 0o1234);
        assert_eq!(phrase.addr, None);
        assert_eq!(fx.stats, Statistics::new());
    }

    #[test]
    fn test_register_deferred() {
        let mut fx = Fixture::new();
        fx.regs.set(1, 0o100);
        fx.mem.write(0o100, 42).unwrap();

        let phrase = fx.resolve(Mode::RegisterDeferred, 1);
        assert_eq!(phrase.addr, Some(0o100));
        assert_eq!(phrase.value, 42);
        assert_eq!(fx.regs.get(1), 0o100);
        assert_eq!(fx.stats.data_words_read, 1);
    }

    #[test]
    fn test_autoincrement() {
        let mut fx = Fixture::new();
        fx.regs.set(2, 0o200);
        fx.mem.write(0o200, 7).unwrap();

        let phrase = fx.resolve(Mode::Autoincrement, 2);
        assert_eq!(phrase.addr, Some(0o200));
        assert_eq!(phrase.value, 7);
        assert_eq!(fx.regs.get(2), 0o202);
        assert_eq!(fx.stats.data_words_read, 0);
        assert_eq!(fx.stats.instruction_words_fetched, 0);
    }

    #[test]
    fn test_immediate_counts_fetch() {
        let mut fx = Fixture::new();
        fx.regs.jump(2);
        fx.mem.write(2, 0o777).unwrap();

        let phrase = fx.resolve(Mode::Autoincrement, PC);
        assert_eq!(phrase.value, 0o777);
        assert_eq!(fx.regs.pc(), 4);
        assert_eq!(fx.stats.instruction_words_fetched, 1);
    }

    #[test]
    fn test_autoincrement_deferred() {
        let mut fx = Fixture::new();
        fx.regs.set(4, 0o300);
        fx.mem.write(0o300, 0o400).unwrap();
        fx.mem.write(0o400, 99).unwrap();

        let phrase = fx.resolve(Mode::AutoincrementDeferred, 4);
        assert_eq!(phrase.addr, Some(0o400));
        assert_eq!(phrase.value, 99);
        assert_eq!(fx.regs.get(4), 0o302);
        assert_eq!(fx.stats.data_words_read, 1);
    }

    #[test]
    fn test_autodecrement() {
        let mut fx = Fixture::new();
        fx.regs.set(6, 0o1000);
        fx.mem.write(0o776, 5).unwrap();

        let phrase = fx.resolve(Mode::Autodecrement, 6);
        assert_eq!(phrase.addr, Some(0o776));
        assert_eq!(phrase.value, 5);
        assert_eq!(fx.regs.get(6), 0o776);
        assert_eq!(fx.stats.data_words_read, 1);
    }

    #[test]
    fn test_autodecrement_wraps() {
        let mut fx = Fixture::new();
        fx.mem = Memory::with_words(32 * 1024);

        let phrase = fx.resolve(Mode::Autodecrement, 0);
        assert_eq!(phrase.addr, Some(0o177776));
        assert_eq!(fx.regs.get(0), 0o177776);
    }

    #[test]
    fn test_autodecrement_deferred() {
        let mut fx = Fixture::new();
        fx.regs.set(5, 0o502);
        fx.mem.write(0o500, 0o600).unwrap();
        fx.mem.write(0o600, 11).unwrap();

        let phrase = fx.resolve(Mode::AutodecrementDeferred, 5);
        assert_eq!(phrase.addr, Some(0o600));
        assert_eq!(phrase.value, 11);
        assert_eq!(fx.regs.get(5), 0o500);
        assert_eq!(fx.stats.data_words_read, 1);
    }

    #[test]
    fn test_index() {
        let mut fx = Fixture::new();
        fx.regs.jump(0o10);
        fx.regs.set(1, 0o1000);
        fx.mem.write(0o10, 0o20).unwrap();
        fx.mem.write(0o1020, 77).unwrap();

        let phrase = fx.resolve(Mode::Index, 1);
        assert_eq!(phrase.addr, Some(0o1020));
        assert_eq!(phrase.value, 77);
        assert_eq!(fx.regs.pc(), 0o12);
        assert_eq!(fx.stats.instruction_words_fetched, 1);
        assert_eq!(fx.stats.data_words_read, 3);
    }

    #[test]
    fn test_index_negative_displacement() {
        let mut fx = Fixture::new();
        fx.regs.set(1, 0o1000);
        fx.mem.write(0, 0o177776).unwrap();
        fx.mem.write(0o776, 3).unwrap();

        let phrase = fx.resolve(Mode::Index, 1);
        assert_eq!(phrase.addr, Some(0o776));
        assert_eq!(phrase.value, 3);
    }

    #[test]
    fn test_index_deferred() {
        let mut fx = Fixture::new();
        fx.regs.set(3, 0o100);
        fx.mem.write(0, 4).unwrap();
        fx.mem.write(0o104, 0o2000).unwrap();
        fx.mem.write(0o2000, 12).unwrap();

        let phrase = fx.resolve(Mode::IndexDeferred, 3);
        assert_eq!(phrase.addr, Some(0o2000));
        assert_eq!(phrase.value, 12);
        assert_eq!(fx.regs.pc(), 2);
        assert_eq!(fx.stats.data_words_read, 3);
    }

    #[test]
    fn test_memory_fault_propagates() {
        let mut regs = Registers::new();
        let mem = Memory::with_words(4);
        let mut stats = Statistics::new();
        regs.set(0, 0o100);

        let err = resolve(Operand::new(Mode::RegisterDeferred, 0), &mut regs, &mem, &mut stats).unwrap_err();
        assert_eq!(err, OperandError::Memory(MemoryError::Fault { addr: 0o100, words: 4 }));
    }

    #[test]
    fn test_within_range() {
        assert_eq!(within_range(0o177777), Ok(0o177777));
        assert_eq!(within_range(0o200000), Err(OperandError::AddressRange(0o200000)));
    }
}
