//! Program loaders and tools.
//!
//! This module provides:
//! - The binary text and hex program formats
//! - Program file loading/saving by extension
//! - A simple two-pass assembler (mnemonics → instruction words)
//! - A disassembler (instruction words → readable text)

pub mod assembler;
pub mod disasm;
pub mod formats;
pub mod program;

pub use assembler::{assemble, AssemblerError};
pub use disasm::disassemble;
pub use formats::{parse_hex, parse_text, ParsedProgram};
pub use program::{load_program, parse_program, save_text, ProgramError, ProgramFormat};
