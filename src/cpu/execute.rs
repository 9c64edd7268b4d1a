//! CPU execution engine.
//!
//! Implements the single-cycle fetch-decode-execute loop. Every fallible
//! step (fetch, decode, ALU) runs before anything is written, so a failing
//! cycle leaves the machine exactly as it was.

use crate::bits::{alu, AluResult, InstructionWord, Word8};
use crate::cpu::decode::{self, AddrSrc, AluSrc, DecodeError, Instruction, StackOp};
use crate::cpu::io::{BusState, IoBus};
use crate::cpu::memory::MemoryError;
use crate::cpu::{CallStack, ProgramStore, Registers};
use crate::bits::AluError;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// What one cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Address the instruction was fetched from.
    pub pc: u8,
    /// The decoded instruction.
    pub instruction: Instruction,
    /// ALU output for this cycle.
    pub alu: AluResult,
    /// Program counter committed at the end of the cycle.
    pub next_pc: u8,
}

/// Serializable view of the whole machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McuState {
    pub bus: BusState,
    pub regs: Registers,
    pub stack: CallStack,
    pub cycles: u64,
}

/// The microcontroller.
pub struct Mcu {
    /// Register file.
    pub regs: Registers,
    /// Call/return stack.
    pub stack: CallStack,
    /// Program store.
    pub program: ProgramStore,
    /// Shared PC and I/O latches.
    bus: IoBus,
    /// Completed cycle count.
    pub cycles: u64,
}

impl Mcu {
    /// Create a machine with zeroed state and its own bus.
    pub fn new() -> Self {
        Self::with_bus(IoBus::new())
    }

    /// Create a machine attached to an existing bus.
    pub fn with_bus(bus: IoBus) -> Self {
        Self {
            regs: Registers::new(),
            stack: CallStack::new(),
            program: ProgramStore::new(),
            bus,
            cycles: 0,
        }
    }

    /// Handle to the shared PC and latches.
    pub fn bus(&self) -> &IoBus {
        &self.bus
    }

    /// Current program counter.
    pub fn pc(&self) -> u8 {
        self.bus.pc()
    }

    /// Reset PC, OUTPUT, registers and stack. The program and INPUT stay.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.stack.reset();
        self.bus.reset();
        self.cycles = 0;
        log::info!("machine reset");
    }

    /// Load a program, zero-padded to 64 words, and reset the machine.
    ///
    /// A program longer than the store is rejected and nothing changes.
    pub fn load_program(&mut self, program: &[InstructionWord]) -> Result<(), MemoryError> {
        self.program.load(program)?;
        self.reset();
        log::info!("loaded {} instruction words", program.len());
        Ok(())
    }

    /// Execute one clock cycle.
    ///
    /// Returns a report of the cycle, or an error with no state modified.
    pub fn step(&mut self) -> Result<CycleReport, CpuError> {
        // Fetch
        let (pc, input) = {
            let bus = self.bus.lock();
            (bus.pc, bus.input)
        };
        let word = self.program.fetch(pc)?;

        // Decode
        let instr = decode::decode(word)?;
        let control = instr.control_word();

        // Execute
        let operand_b = match control.alu_src {
            AluSrc::Register => self.regs.read(instr.dest),
            AluSrc::Input => input,
        };
        let result = alu::evaluate(control.alu_op, instr.data, operand_b)?;

        // Write back
        if control.reg_write {
            self.regs.write(instr.dest, result.value);
        }

        let return_addr = pc + 1;
        let top = self.stack.top();
        match control.stack_op {
            StackOp::Push => self.stack.push(Word8::new(return_addr)),
            StackOp::Pop => {
                self.stack.pop();
            }
            StackOp::Hold => self.stack.hold(),
        }

        let next_pc = match control.addr_src {
            AddrSrc::NextPc => return_addr,
            AddrSrc::Data => instr.data.value(),
            AddrSrc::TopOfStack => top.value(),
            AddrSrc::DataIfZero if result.zero => instr.data.value(),
            AddrSrc::DataIfZero => return_addr,
        };

        {
            let mut bus = self.bus.lock();
            if control.out_latch {
                bus.output = result.value;
            }
            bus.pc = next_pc;
        }

        self.cycles += 1;

        log::trace!(
            "{:02}: {} {} {} -> {} (z={}) next={}",
            pc, instr.mnemonic, instr.dest, instr.data.value(), result.value.value(), result.zero, next_pc
        );

        Ok(CycleReport { pc, instruction: instr, alu: result, next_pc })
    }

    /// Run for at most `max_cycles` cycles.
    ///
    /// Returns the number of cycles executed.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles + max_cycles;

        while self.cycles < limit {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Snapshot the full machine state.
    pub fn state(&self) -> McuState {
        McuState {
            bus: self.bus.snapshot(),
            regs: self.regs.clone(),
            stack: self.stack.clone(),
            cycles: self.cycles,
        }
    }
}

impl Default for Mcu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Mcu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mcu")
            .field("bus", &self.bus.snapshot())
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("stack", &self.stack)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("ALU error: {0}")]
    Alu(#[from] AluError),
}
