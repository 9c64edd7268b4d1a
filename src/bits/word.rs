//! Fixed-width binary words.
//!
//! This module provides the two word sizes used by the machine:
//! - `Word8`: 8-bit data word for registers, the stack and the I/O latches
//! - `InstructionWord`: 13-bit word holding one encoded instruction

use std::fmt;
use serde::{Serialize, Deserialize};

/// An 8-bit data word.
///
/// Used for:
/// - The two general registers
/// - The four call/return stack slots
/// - The INPUT and OUTPUT latches
/// - The DATA field of an instruction
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Word8(u8);

/// A 13-bit instruction word: `OPCODE(4) | DEST(1) | DATA(8)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub struct InstructionWord(u16);

// ============================================================================
// Word8 Implementation
// ============================================================================

impl Word8 {
    /// Number of bits in a Word8.
    pub const WIDTH: usize = 8;

    /// Create a new Word8 with all bits clear.
    #[inline]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Create from a raw byte.
    #[inline]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// The raw byte value.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Check if every bit is clear.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Get a single bit by index (0 = LSB).
    #[inline]
    pub const fn bit(self, index: usize) -> bool {
        (self.0 >> index) & 1 == 1
    }

    /// The bits of the word, most significant first.
    ///
    /// This is the order the word is written in program files, so
    /// position `i` of two words is the same physical bit.
    pub fn bits(self) -> [bool; 8] {
        let mut bits = [false; 8];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = self.bit(7 - i);
        }
        bits
    }

    /// Build a word from bits, most significant first.
    pub fn from_bits(bits: [bool; 8]) -> Self {
        let value = bits
            .iter()
            .fold(0u8, |acc, &bit| (acc << 1) | bit as u8);
        Self(value)
    }

    /// Bitwise complement.
    #[inline]
    pub const fn not(self) -> Self {
        Self(!self.0)
    }

    /// Parse from an 8-character binary string like "00010110".
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let s = s.trim();
        let s = s.strip_prefix("0b").unwrap_or(s);
        parse_binary(s, Self::WIDTH).map(|v| Self(v as u8))
    }
}

impl From<u8> for Word8 {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<Word8> for u8 {
    fn from(word: Word8) -> Self {
        word.0
    }
}

impl fmt::Debug for Word8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word8(0b{:08b} = {})", self.0, self.0)
    }
}

impl fmt::Display for Word8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08b}", self.0)
    }
}

// ============================================================================
// InstructionWord Implementation
// ============================================================================

impl InstructionWord {
    /// Number of bits in an instruction.
    pub const WIDTH: usize = 13;

    /// Mask of the valid instruction bits.
    pub const MASK: u16 = 0x1FFF;

    /// The all-zero instruction (used to pad short programs).
    #[inline]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Create from a raw value; bits above 13 are discarded.
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw & Self::MASK)
    }

    /// The raw 13-bit value.
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Assemble from the three fields. Only the low 4 bits of `opcode`
    /// are used.
    pub const fn from_fields(opcode: u8, dest: bool, data: Word8) -> Self {
        let raw = ((opcode as u16 & 0xF) << 9) | ((dest as u16) << 8) | data.value() as u16;
        Self(raw)
    }

    /// The 4-bit OPCODE field.
    #[inline]
    pub const fn opcode(self) -> u8 {
        (self.0 >> 9) as u8 & 0xF
    }

    /// The DEST bit (false selects reg0, true selects reg1).
    #[inline]
    pub const fn dest(self) -> bool {
        (self.0 >> 8) & 1 == 1
    }

    /// The 8-bit DATA field.
    #[inline]
    pub const fn data(self) -> Word8 {
        Word8(self.0 as u8)
    }

    /// Parse from a 13-character binary string like "0111000000101".
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        parse_binary(s.trim(), Self::WIDTH).map(|v| Self(v as u16))
    }
}

impl From<u16> for InstructionWord {
    fn from(raw: u16) -> Self {
        Self::from_raw(raw)
    }
}

impl From<InstructionWord> for u16 {
    fn from(word: InstructionWord) -> Self {
        word.0
    }
}

impl fmt::Debug for InstructionWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InstructionWord({:04b} {} {:08b})",
            self.opcode(),
            self.dest() as u8,
            self.data().value()
        )
    }
}

impl fmt::Display for InstructionWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:013b}", self.0)
    }
}

fn parse_binary(s: &str, width: usize) -> Result<u32, ParseError> {
    if s.len() != width {
        return Err(ParseError::WrongLength { expected: width, got: s.len() });
    }

    let mut value = 0u32;
    for c in s.chars() {
        let bit = match c {
            '0' => 0,
            '1' => 1,
            _ => return Err(ParseError::InvalidChar(c)),
        };
        value = (value << 1) | bit;
    }
    Ok(value)
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when parsing binary strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The input string was the wrong length.
    WrongLength { expected: usize, got: usize },
    /// An invalid character was encountered.
    InvalidChar(char),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::WrongLength { expected, got } => {
                write!(f, "expected {} bits, got {}", expected, got)
            }
            ParseError::InvalidChar(c) => {
                write!(f, "invalid bit character: '{}' (expected 0/1)", c)
            }
        }
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// Tests
// ============================================================================
