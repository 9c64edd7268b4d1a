//! Fixed-width binary words and the arithmetic-logic unit.
//!
//! This module provides the core value types of the machine:
//! - [`Word8`] - An 8-bit data word (registers, stack slots, latches)
//! - [`InstructionWord`] - A 13-bit instruction (OPCODE | DEST | DATA)
//! - [`alu`] - The bit-vector ALU that evaluates every data operation

mod word;
pub mod alu;

pub use word::{InstructionWord, Word8, ParseError};
pub use alu::{AluError, AluOp, AluResult};
