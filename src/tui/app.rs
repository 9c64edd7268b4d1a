//! Panel application state and logic.

use crate::asm::disasm::disassemble_instruction;
use crate::bits::InstructionWord;
use crate::clock::{lock_mcu, share, Clock, ClockError, ClockMode, Fault};
use crate::cpu::{McuState, Mcu, MemoryError, PROGRAM_SIZE};
use crate::panel::{DisplayMode, InputLines};
use thiserror::Error;

/// Panel application state.
pub struct PanelApp {
    /// Clock driving the machine.
    pub clock: Clock,
    /// Program as loaded, for the disassembly view.
    pub program: Vec<InstructionWord>,
    /// Current switch positions.
    pub inputs: InputLines,
    /// How OUTPUT is drawn.
    pub display: DisplayMode,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Last fault already shown in the status line.
    reported_fault: Option<Fault>,
}

impl PanelApp {
    /// Create a panel with a loaded program and a stopped clock.
    pub fn new(program: Vec<InstructionWord>, hz: u32, display: DisplayMode) -> Result<Self, PanelError> {
        let mut mcu = Mcu::new();
        mcu.load_program(&program)?;
        let clock = Clock::spawn(share(mcu), hz)?;

        Ok(Self {
            clock,
            program,
            inputs: InputLines::default(),
            display,
            should_quit: false,
            status: "Ready. Press 's' to step, 'c' for automatic clock, 'q' to quit.".into(),
            reported_fault: None,
        })
    }

    /// Flip input switch `index` and drive the INPUT latch.
    pub fn toggle_input(&mut self, index: usize) {
        self.inputs.toggle(index);
        let mcu = lock_mcu(self.clock.machine());
        self.inputs.apply(mcu.bus());
        if let Some((label, on)) = self.inputs.line(index) {
            self.status = format!("{}: {}", label, if on { "on" } else { "off" });
        }
    }

    /// Run one cycle by hand.
    pub fn step(&mut self) {
        match self.clock.step() {
            Ok(report) => {
                let word = lock_mcu(self.clock.machine())
                    .program
                    .fetch(report.pc)
                    .unwrap_or_default();
                self.status = format!(
                    "PC={:02}: {} -> {:02}",
                    report.pc,
                    disassemble_instruction(word),
                    report.next_pc
                );
            }
            Err(ClockError::AutomaticModeActive) => {
                self.status = "Clock is automatic; press 'c' to stop it first.".into();
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.reported_fault = self.clock.fault();
            }
        }
    }

    /// Switch between manual and automatic clocking.
    pub fn toggle_clock(&mut self) {
        match self.clock.mode() {
            ClockMode::Manual => {
                self.clock.clear_fault();
                self.reported_fault = None;
                self.clock.set_mode(ClockMode::Automatic);
                self.status = format!("Automatic clock ({:?} period).", self.clock.period());
            }
            ClockMode::Automatic => {
                self.clock.set_mode(ClockMode::Manual);
                self.status = "Manual clock.".into();
            }
        }
    }

    /// Switch between numeric and traffic-light output.
    pub fn toggle_display(&mut self) {
        self.display = self.display.toggled();
    }

    /// Reset the machine; the program and input switches stay.
    pub fn reset(&mut self) {
        lock_mcu(self.clock.machine()).reset();
        self.clock.clear_fault();
        self.reported_fault = None;
        self.status = "Reset. Ready.".into();
    }

    /// Pick up faults raised by the automatic clock.
    pub fn tick(&mut self) {
        let fault = self.clock.fault();
        if fault.is_some() && fault != self.reported_fault {
            if let Some(f) = &fault {
                self.status = format!("Halted: fault at PC={:02}: {}", f.pc, f.error);
            }
            self.reported_fault = fault;
        }
    }

    /// Copy of the machine state for drawing.
    pub fn snapshot(&self) -> McuState {
        lock_mcu(self.clock.machine()).state()
    }

    /// Get disassembly around `pc`.
    pub fn get_disassembly(&self, pc: u8, lines: usize) -> Vec<(u8, String, bool)> {
        let start = (pc as usize).saturating_sub(lines / 2).min(PROGRAM_SIZE.saturating_sub(lines));

        (start..(start + lines).min(PROGRAM_SIZE))
            .map(|addr| {
                let word = self.program.get(addr).copied().unwrap_or_default();
                (addr as u8, disassemble_instruction(word), addr == pc as usize)
            })
            .collect()
    }
}

/// Errors that can stop the panel.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("failed to load program: {0}")]
    Memory(#[from] MemoryError),

    #[error("clock error: {0}")]
    Clock(#[from] ClockError),

    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the control panel with a program.
pub fn run_panel(program: Vec<InstructionWord>, hz: u32, display: DisplayMode) -> Result<(), PanelError> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Create app
    let mut app = PanelApp::new(program, hz, display)?;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Main loop
    loop {
        app.tick();

        // Draw
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        // Handle input
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char(c @ '1'..='4') => app.toggle_input(c as usize - '1' as usize),
                        KeyCode::Char('s') => app.step(),
                        KeyCode::Char('c') => app.toggle_clock(),
                        KeyCode::Char('d') => app.toggle_display(),
                        KeyCode::Char('x') => app.reset(),
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    app.clock.set_mode(ClockMode::Manual);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
