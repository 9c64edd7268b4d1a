//! Program store.
//!
//! 64 read-only instruction words, addressed directly by the program
//! counter. Shorter programs are padded with zero words.

use crate::bits::InstructionWord;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of words in the program store.
pub const PROGRAM_SIZE: usize = 64;

/// Program store: 64 thirteen-bit instruction words.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramStore {
    words: Vec<InstructionWord>,
}

impl ProgramStore {
    /// Create a store filled with zero words.
    pub fn new() -> Self {
        Self {
            words: vec![InstructionWord::zero(); PROGRAM_SIZE],
        }
    }

    /// Create a store holding `program`, zero-padded to 64 words.
    pub fn from_words(program: &[InstructionWord]) -> Result<Self, MemoryError> {
        let mut store = Self::new();
        store.load(program)?;
        Ok(store)
    }

    /// Replace the contents with `program`, zero-padded to 64 words.
    ///
    /// Programs longer than the store are rejected and leave the current
    /// contents untouched.
    pub fn load(&mut self, program: &[InstructionWord]) -> Result<(), MemoryError> {
        if program.len() > PROGRAM_SIZE {
            return Err(MemoryError::ProgramOverflow {
                size: program.len(),
                capacity: PROGRAM_SIZE,
            });
        }

        self.clear();
        self.words[..program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Fetch the word at `addr`.
    #[inline]
    pub fn fetch(&self, addr: u8) -> Result<InstructionWord, MemoryError> {
        self.words
            .get(addr as usize)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange(addr))
    }

    /// Clear every word to zero.
    pub fn clear(&mut self) {
        self.words.fill(InstructionWord::zero());
    }

    /// All 64 words.
    pub fn words(&self) -> &[InstructionWord] {
        &self.words
    }

    /// Dump a range of addresses (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, InstructionWord)> {
        let end = (start + count).min(PROGRAM_SIZE);
        (start.min(end)..end)
            .map(|i| (i, self.words[i]))
            .collect()
    }
}

impl Default for ProgramStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProgramStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero words
        let non_zero = self.words.iter().filter(|w| w.raw() != 0).count();

        f.debug_struct("ProgramStore")
            .field("non_zero_words", &non_zero)
            .field("total_words", &PROGRAM_SIZE)
            .finish()
    }
}

/// Errors that can occur during program store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("program address {0} out of range (0-63)")]
    AddressOutOfRange(u8),

    #[error("program has {size} words, store holds {capacity}")]
    ProgramOverflow { size: usize, capacity: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(raw: u16) -> InstructionWord {
        InstructionWord::from_raw(raw)
    }

    #[test]
    fn test_new_is_zeroed() {
        let store = ProgramStore::new();
        assert_eq!(store.words().len(), PROGRAM_SIZE);
        assert!(store.words().iter().all(|w| w.raw() == 0));
    }

    #[test]
    fn test_load_pads_with_zero() {
        let store = ProgramStore::from_words(&[word(1), word(2), word(3)]).unwrap();
        assert_eq!(store.fetch(0).unwrap(), word(1));
        assert_eq!(store.fetch(2).unwrap(), word(3));
        assert_eq!(store.fetch(3).unwrap(), word(0));
        assert_eq!(store.fetch(63).unwrap(), word(0));
    }

    #[test]
    fn test_load_replaces_previous_program() {
        let mut store = ProgramStore::from_words(&[word(7); 10]).unwrap();
        store.load(&[word(1)]).unwrap();
        assert_eq!(store.fetch(1).unwrap(), word(0));
    }

    #[test]
    fn test_overflow_rejected() {
        let mut store = ProgramStore::from_words(&[word(5)]).unwrap();
        let big = vec![word(1); PROGRAM_SIZE + 1];
        assert_eq!(
            store.load(&big),
            Err(MemoryError::ProgramOverflow { size: 65, capacity: 64 })
        );
        // Previous contents survive
        assert_eq!(store.fetch(0).unwrap(), word(5));

        assert!(ProgramStore::from_words(&vec![word(1); PROGRAM_SIZE]).is_ok());
    }

    #[test]
    fn test_fetch_bounds() {
        let store = ProgramStore::new();
        assert!(store.fetch(63).is_ok());
        assert_eq!(store.fetch(64), Err(MemoryError::AddressOutOfRange(64)));
    }

    #[test]
    fn test_dump_clamps() {
        let store = ProgramStore::new();
        assert_eq!(store.dump(60, 10).len(), 4);
        assert!(store.dump(70, 2).is_empty());
    }
}
