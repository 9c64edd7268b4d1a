//! WebAssembly bindings for the MCU emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.
//! The browser drives the clock itself by calling [`WasmMcu::step`].

use wasm_bindgen::prelude::*;
use crate::asm::{assemble, parse_program, ProgramFormat};
use crate::asm::disasm::disassemble_instruction;
use crate::bits::{InstructionWord, Word8};
use crate::cpu::{Dest, Mcu};
use crate::panel::{render_output, DisplayMode, InputLines};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmMcu {
    mcu: Mcu,
    program: Vec<InstructionWord>,
}

#[wasm_bindgen]
impl WasmMcu {
    /// Create a new machine with an empty program.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            mcu: Mcu::new(),
            program: Vec::new(),
        }
    }

    fn load(&mut self, source: &str, format: ProgramFormat) -> Result<usize, JsError> {
        let words = parse_program(source, format).map_err(js_err)?;
        self.mcu.load_program(&words).map_err(js_err)?;
        self.program = words;
        Ok(self.program.len())
    }

    /// Load a program in the binary text format.
    #[wasm_bindgen]
    pub fn load_text(&mut self, source: &str) -> Result<usize, JsError> {
        self.load(source, ProgramFormat::Text)
    }

    /// Load a program in the hex format.
    #[wasm_bindgen]
    pub fn load_hex(&mut self, source: &str) -> Result<usize, JsError> {
        self.load(source, ProgramFormat::Hex)
    }

    /// Load a program from assembly source code.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        self.load(source, ProgramFormat::Assembly)
    }

    /// Run one cycle. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let report = self.mcu.step().map_err(js_err)?;
        let word = self.mcu.program.fetch(report.pc).map_err(js_err)?;
        Ok(disassemble_instruction(word))
    }

    /// Run up to `max_cycles` cycles; returns the total cycle count.
    #[wasm_bindgen]
    pub fn run(&mut self, max_cycles: u32) -> Result<u64, JsError> {
        self.mcu.run_limited(max_cycles as u64).map_err(js_err)?;
        Ok(self.mcu.cycles)
    }

    /// Reset the machine; the program and INPUT stay.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.mcu.reset();
    }

    /// Set the INPUT latch from the four switch lines.
    #[wasm_bindgen]
    pub fn set_inputs(&mut self, day_night: bool, side_street_car: bool, sensor_g1: bool, sensor_g2: bool) {
        InputLines { day_night, side_street_car, sensor_g1, sensor_g2 }.apply(self.mcu.bus());
    }

    /// Set the INPUT latch to a raw byte.
    #[wasm_bindgen]
    pub fn set_input(&mut self, value: u8) {
        self.mcu.bus().set_input(Word8::new(value));
    }

    /// Get the OUTPUT latch.
    #[wasm_bindgen]
    pub fn output(&self) -> u8 {
        self.mcu.bus().output().value()
    }

    /// Get OUTPUT rendered as two traffic lights.
    #[wasm_bindgen]
    pub fn output_lights(&self) -> String {
        render_output(self.mcu.bus().output(), DisplayMode::TrafficLights)
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> u8 {
        self.mcu.pc()
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.mcu.cycles
    }

    /// Get register `index` (0 or 1).
    #[wasm_bindgen]
    pub fn register(&self, index: u8) -> Result<u8, JsError> {
        register_value(&self.mcu, index).ok_or_else(|| js_err(format!("no register r{}", index)))
    }

    /// Get the loaded program as raw 13-bit words.
    #[wasm_bindgen]
    pub fn program_words(&self) -> js_sys::Uint16Array {
        let raw: Vec<u16> = self.program.iter().map(|w| w.raw()).collect();
        js_sys::Uint16Array::from(&raw[..])
    }

    /// Get the full machine state as a JSON string.
    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.mcu.state()).map_err(js_err)
    }
}

fn register_value(mcu: &Mcu, index: u8) -> Option<u8> {
    let dest = match index {
        0 => Dest::Reg0,
        1 => Dest::Reg1,
        _ => return None,
    };
    Some(mcu.regs.read(dest).value())
}

impl Default for WasmMcu {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return instruction count.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<usize, JsError> {
    let instructions = assemble(source).map_err(js_err)?;
    Ok(instructions.len())
}

/// Disassemble a single 13-bit word.
#[wasm_bindgen]
pub fn wasm_disassemble(value: u16) -> String {
    disassemble_instruction(InstructionWord::from_raw(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_index() {
        let mut mcu = Mcu::new();
        mcu.regs.write(Dest::Reg1, Word8::new(7));
        assert_eq!(register_value(&mcu, 0), Some(0));
        assert_eq!(register_value(&mcu, 1), Some(7));
        assert_eq!(register_value(&mcu, 7), None);
    }
}
