//! # MCU Simulator
//!
//! An emulator of a small microcoded 8-bit accumulator microcontroller.
//!
//! Each 13-bit instruction (`OPCODE(4) | DEST(1) | DATA(8)`) is decoded
//! through a fixed microcode table into control signals that steer an
//! ALU, a two-register file, a 4-deep call/return stack and a pair of
//! INPUT/OUTPUT latches shared with a control panel. The machine runs one
//! cycle per clock tick, either stepped by hand or from a background clock.

pub mod bits;
pub mod cpu;
pub mod clock;
pub mod asm;
pub mod panel;
pub mod config;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use bits::{InstructionWord, Word8};
pub use cpu::{Mcu, McuState, CpuError, CycleReport, IoBus, Instruction, Mnemonic};
pub use clock::{Clock, ClockError, ClockMode};
pub use asm::{assemble, disassemble, load_program, save_text, AssemblerError, ProgramError};
pub use config::Config;

#[cfg(feature = "tui")]
pub use tui::run_panel;
