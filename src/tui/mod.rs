//! Terminal control panel for the MCU.
//!
//! Provides an interactive front panel with:
//! - Four input switches driving the INPUT latch
//! - OUTPUT as a number or as two traffic lights
//! - Manual stepping or an automatic clock
//! - Register, stack and disassembly views

mod app;
mod ui;

pub use app::{PanelApp, run_panel};
