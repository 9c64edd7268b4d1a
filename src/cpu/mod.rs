//! CPU emulation for the microcontroller.
//!
//! This module implements the complete machine:
//! - 64-word program store of 13-bit instructions
//! - 2 general registers (reg0, reg1) and a 4-deep call/return stack
//! - 13-instruction set decoded through a fixed microcode table
//! - INPUT/OUTPUT latches shared with the control surface

pub mod memory;
pub mod registers;
pub mod stack;
pub mod io;
pub mod decode;
pub mod execute;

pub use memory::{ProgramStore, MemoryError, PROGRAM_SIZE};
pub use registers::{Registers, Dest};
pub use stack::{CallStack, STACK_DEPTH};
pub use io::{IoBus, BusState};
pub use decode::{Instruction, Mnemonic, ControlWord, DecodeError};
pub use execute::{Mcu, McuState, CpuError, CycleReport};
