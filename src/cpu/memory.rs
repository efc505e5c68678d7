//! PDP-11 memory subsystem.
//!
//! Memory is a flat array of 16-bit words addressed by byte address.
//! Only even addresses are meaningful: the word index is `addr >> 1`,
//! so an odd address silently selects the word containing it.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Default memory size in words (32KB).
pub const DEFAULT_WORDS: usize = 16 * 1024;

/// Word-organized main memory.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    words: Vec<u16>,
}

impl Memory {
    /// Create a zeroed memory of the default size.
    pub fn new() -> Self {
        Self::with_words(DEFAULT_WORDS)
    }

    /// Create a zeroed memory holding `count` words.
    pub fn with_words(count: usize) -> Self {
        Self {
            words: vec![0; count],
        }
    }

    /// Number of words in the backing store.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if the backing store is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Read the word at a byte address.
    #[inline]
    pub fn read(&self, addr: u16) -> Result<u16, MemoryError> {
        let index = self.index(addr)?;
        Ok(self.words[index])
    }

    /// Write the word at a byte address.
    #[inline]
    pub fn write(&mut self, addr: u16, value: u16) -> Result<(), MemoryError> {
        let index = self.index(addr)?;
        self.words[index] = value;
        Ok(())
    }

    fn index(&self, addr: u16) -> Result<usize, MemoryError> {
        let index = usize::from(addr >> 1);
        if index >= self.words.len() {
            return Err(MemoryError::Fault {
                addr,
                words: self.words.len(),
            });
        }
        Ok(index)
    }

    /// Load a program image into consecutive words starting at word 0.
    pub fn load_program(&mut self, program: &[u16]) -> Result<(), MemoryError> {
        if program.len() > self.words.len() {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: self.words.len(),
            });
        }

        self.words[..program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Dump `count` words starting at word index `start` as (byte address, word) pairs.
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u16)> {
        let end = (start + count).min(self.words.len());
        (start..end)
            .map(|i| (i * 2, self.words[i]))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero words
        let non_zero = self.words.iter().filter(|w| **w != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_words", &non_zero)
            .field("total_words", &self.words.len())
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Byte address maps past the end of the backing store.
    #[error("address {addr:06o} is outside memory ({words} words)")]
    Fault { addr: u16, words: usize },

    /// Program is too large to fit in memory.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}
