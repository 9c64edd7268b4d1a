//! The register file.
//!
//! Two 8-bit general registers, reg0 and reg1. The DEST bit of every
//! instruction names exactly one of them as operand B and write-back
//! target.

use crate::bits::Word8;
use serde::{Serialize, Deserialize};
use std::fmt;

/// Register selected by an instruction's DEST bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dest {
    #[default]
    Reg0,
    Reg1,
}

impl Dest {
    /// Create from the DEST bit.
    pub const fn from_bit(bit: bool) -> Self {
        if bit { Dest::Reg1 } else { Dest::Reg0 }
    }

    /// Convert to the DEST bit.
    pub const fn to_bit(self) -> bool {
        matches!(self, Dest::Reg1)
    }
}

impl fmt::Display for Dest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dest::Reg0 => f.write_str("r0"),
            Dest::Reg1 => f.write_str("r1"),
        }
    }
}

/// The register file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    pub reg0: Word8,
    pub reg1: Word8,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset both registers to zero.
    pub fn reset(&mut self) {
        self.reg0 = Word8::zero();
        self.reg1 = Word8::zero();
    }

    /// Read the register named by `dest`.
    #[inline]
    pub fn read(&self, dest: Dest) -> Word8 {
        match dest {
            Dest::Reg0 => self.reg0,
            Dest::Reg1 => self.reg1,
        }
    }

    /// Write the register named by `dest`; the other is untouched.
    #[inline]
    pub fn write(&mut self, dest: Dest, value: Word8) {
        match dest {
            Dest::Reg0 => self.reg0 = value,
            Dest::Reg1 => self.reg1 = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_is_exclusive() {
        let mut regs = Registers::new();
        regs.write(Dest::Reg1, Word8::new(9));
        assert_eq!(regs.read(Dest::Reg1).value(), 9);
        assert!(regs.read(Dest::Reg0).is_zero());

        regs.write(Dest::Reg0, Word8::new(4));
        assert_eq!(regs.reg0.value(), 4);
        assert_eq!(regs.reg1.value(), 9);
    }

    #[test]
    fn test_reset() {
        let mut regs = Registers { reg0: Word8::new(1), reg1: Word8::new(2) };
        regs.reset();
        assert_eq!(regs, Registers::new());
    }

    #[test]
    fn test_dest_bit_roundtrip() {
        assert_eq!(Dest::from_bit(false), Dest::Reg0);
        assert_eq!(Dest::from_bit(true), Dest::Reg1);
        assert!(Dest::Reg1.to_bit());
    }
}
