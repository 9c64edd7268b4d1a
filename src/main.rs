//! MCU Simulator - CLI Entry Point
//!
//! Commands:
//! - `mcu-sim run <program>` - Run a .txt, .hex or .asm program
//! - `mcu-sim panel <program>` - Interactive control panel
//! - `mcu-sim asm <source>` - Assemble to the text or hex format
//! - `mcu-sim disasm <program>` - Disassemble a program
//! - `mcu-sim decode-table` - Print the microcode table
//! - `mcu-sim test` - Built-in self-test

use clap::{Parser, Subcommand, ValueEnum};
use mcusim::panel::DisplayMode;
use mcusim::Config;

#[derive(Parser)]
#[command(name = "mcu-sim")]
#[command(version)]
#[command(about = "An emulator of a small microcoded 8-bit accumulator microcontroller")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program for a fixed number of cycles
    Run {
        /// Path to the .txt, .hex or .asm file to execute
        program: String,
        /// Number of cycles to run (default from config: 10000)
        #[arg(short, long)]
        max_cycles: Option<u64>,
        /// Show trace output
        #[arg(short, long)]
        trace: bool,
        /// Value for the INPUT latch (decimal, 0x.. or 0b..)
        #[arg(short, long)]
        input: Option<String>,
        /// Print the final machine state as JSON
        #[arg(long)]
        json: bool,
        /// How to show OUTPUT
        #[arg(short, long, value_enum)]
        display: Option<DisplayArg>,
    },
    /// Interactive control panel
    Panel {
        /// Path to the program to load
        program: String,
        /// Automatic clock frequency in Hz (default from config: 1000)
        #[arg(long)]
        hz: Option<u32>,
        /// How to show OUTPUT
        #[arg(short, long, value_enum)]
        display: Option<DisplayArg>,
    },
    /// Assemble source to the text (or, with a .hex output, hex) format
    Asm {
        /// Path to the source file
        source: String,
        /// Output file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble a program to readable text
    Disasm {
        /// Path to the .txt, .hex or .asm file
        program: String,
    },
    /// Print the opcode and control word of every instruction
    DecodeTable,
    /// Run the built-in self-test
    Test,
}

#[derive(Clone, Copy, ValueEnum)]
enum DisplayArg {
    Numeric,
    TrafficLights,
}

impl From<DisplayArg> for DisplayMode {
    fn from(arg: DisplayArg) -> Self {
        match arg {
            DisplayArg::Numeric => DisplayMode::Numeric,
            DisplayArg::TrafficLights => DisplayMode::TrafficLights,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = Config::get();

    match cli.command {
        Some(Commands::Run { program, max_cycles, trace, input, json, display }) => {
            let max_cycles = max_cycles.unwrap_or(config.max_cycles);
            let display = display.map(DisplayMode::from).unwrap_or(config.display);
            run_program(&program, max_cycles, trace, input.as_deref(), json, display);
        }
        Some(Commands::Panel { program, hz, display }) => {
            let hz = hz.unwrap_or(config.clock_hz);
            let display = display.map(DisplayMode::from).unwrap_or(config.display);
            panel_program(&program, hz, display);
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { program }) => {
            disassemble_file(&program);
        }
        Some(Commands::DecodeTable) => {
            print_decode_table();
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("MCU Simulator v{}", env!("CARGO_PKG_VERSION"));
            println!("A microcoded 8-bit accumulator microcontroller");
            println!();
            println!("Use --help for available commands");
            println!();
            print_decode_table();
        }
    }
}

fn load_or_exit(path: &str) -> Vec<mcusim::InstructionWord> {
    match mcusim::load_program(path) {
        Ok(words) => {
            println!("📂 Loaded {} instructions", words.len());
            words
        }
        Err(e) => {
            eprintln!("❌ Failed to load program: {}", e);
            std::process::exit(1);
        }
    }
}

fn parse_input(text: &str) -> Option<u8> {
    let text = text.trim().replace('_', "");
    if let Some(bin) = text.strip_prefix("0b") {
        u8::from_str_radix(bin, 2).ok()
    } else if let Some(hex) = text.strip_prefix("0x") {
        u8::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

fn run_program(path: &str, max_cycles: u64, trace: bool, input: Option<&str>, json: bool, display: DisplayMode) {
    use mcusim::{Mcu, Word8};
    use mcusim::asm::disasm::disassemble_instruction;
    use mcusim::cpu::decode::encode;
    use mcusim::panel::render_output;

    println!("🔧 Running: {}", path);
    let instructions = load_or_exit(path);

    if instructions.is_empty() {
        eprintln!("❌ No instructions to execute");
        std::process::exit(1);
    }

    // Create machine and load program
    let mut mcu = Mcu::new();
    if let Err(e) = mcu.load_program(&instructions) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    if let Some(text) = input {
        match parse_input(text) {
            Some(value) => mcu.bus().set_input(Word8::new(value)),
            None => {
                eprintln!("❌ Invalid input value: {}", text);
                std::process::exit(1);
            }
        }
    }

    println!();
    println!("━━━ Execution ━━━");

    let mut cycles = 0u64;
    while cycles < max_cycles {
        match mcu.step() {
            Ok(report) => {
                if trace {
                    let disasm = disassemble_instruction(encode(&report.instruction));
                    println!("{:02}: {:<14} r0={:>3} r1={:>3} out={}",
                        report.pc, disasm, mcu.regs.reg0.value(), mcu.regs.reg1.value(),
                        render_output(mcu.bus().output(), display));
                }
                cycles += 1;
            }
            Err(e) => {
                eprintln!("❌ Cycle error at PC={}: {}", mcu.pc(), e);
                std::process::exit(1);
            }
        }
    }

    println!();
    println!("━━━ Result ━━━");
    if json {
        match serde_json::to_string_pretty(&mcu.state()) {
            Ok(state) => println!("{}", state),
            Err(e) => {
                eprintln!("❌ Failed to serialize state: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }
    println!("Cycles: {}", cycles);
    println!("PC:     {}", mcu.pc());
    println!("r0:     {} ({})", mcu.regs.reg0, mcu.regs.reg0.value());
    println!("r1:     {} ({})", mcu.regs.reg1, mcu.regs.reg1.value());
    let stack: Vec<u8> = mcu.stack.slots().iter().map(|w| w.value()).collect();
    println!("Stack:  {:?}", stack);
    println!("Output: {}", render_output(mcu.bus().output(), display));
}

#[cfg(feature = "tui")]
fn panel_program(path: &str, hz: u32, display: DisplayMode) {
    use mcusim::tui::run_panel;

    println!("🔍 Loading: {}", path);
    let instructions = load_or_exit(path);

    if instructions.is_empty() {
        eprintln!("❌ No instructions to execute");
        std::process::exit(1);
    }

    println!("🚀 Launching panel...");
    println!();

    if let Err(e) = run_panel(instructions, hz, display) {
        eprintln!("❌ Panel error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn panel_program(_path: &str, _hz: u32, _display: DisplayMode) {
    eprintln!("❌ This build has no control panel (rebuild with --features tui)");
    std::process::exit(1);
}

fn assemble_file(source_path: &str, output: Option<String>) {
    use mcusim::{assemble, save_text};
    use mcusim::asm::formats::render_hex;
    use std::path::Path;

    let out_path = output.unwrap_or_else(|| {
        Path::new(source_path).with_extension("txt").display().to_string()
    });

    println!("📝 Assembling: {} → {}", source_path, out_path);

    // Read source
    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    // Assemble
    let instructions = match assemble(&source) {
        Ok(instrs) => instrs,
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    println!("✓ Assembled {} instructions", instructions.len());

    let saved = if out_path.to_ascii_lowercase().ends_with(".hex") {
        std::fs::write(&out_path, render_hex(&instructions)).map_err(|e| e.to_string())
    } else {
        save_text(&out_path, &instructions).map_err(|e| e.to_string())
    };

    if let Err(e) = saved {
        eprintln!("❌ Failed to save program: {}", e);
        std::process::exit(1);
    }

    println!("✓ Saved to {}", out_path);
}

fn disassemble_file(path: &str) {
    use mcusim::disassemble;

    println!("📖 Disassembling: {}", path);
    println!();

    let instructions = load_or_exit(path);
    println!("{}", disassemble(&instructions));
}

fn print_decode_table() {
    use mcusim::Mnemonic;

    println!("━━━ Microcode Table ━━━");
    println!();
    println!("{:<4}  {:<6}  {:<10}  {:<5} {:<10} {:<5} {:<8} {:<5} {:<3}",
        "OP", "NAME", "CONTROL", "STACK", "ADDR", "ALU", "SRC", "REGWR", "OUT");

    for mnemonic in Mnemonic::ALL {
        let cw = mnemonic.control_word();
        println!("{:04b}  {:<6}  {}  {:<5} {:<10} {:<5} {:<8} {:<5} {:<3}",
            mnemonic.opcode(),
            mnemonic.name(),
            cw,
            format!("{:?}", cw.stack_op),
            format!("{:?}", cw.addr_src),
            cw.alu_op.to_string(),
            format!("{:?}", cw.alu_src),
            cw.reg_write as u8,
            cw.out_latch as u8);
    }
    println!("1101  1110  1111: undefined");
}

fn run_self_test() {
    use mcusim::{assemble, Mcu, Word8};
    use mcusim::bits::alu::{evaluate, AluOp};
    use mcusim::cpu::{CallStack, CpuError, DecodeError};
    use mcusim::InstructionWord;

    println!("━━━ MCU Simulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    fn machine(source: &str) -> Option<Mcu> {
        let words = assemble(source).ok()?;
        let mut mcu = Mcu::new();
        mcu.load_program(&words).ok()?;
        Some(mcu)
    }

    // Test 1: ADD truncation and zero flag
    print!("ADD 0x80 + 0x80 truncates, zero clear... ");
    match evaluate(AluOp::Add, Word8::new(0x80), Word8::new(0x80)) {
        Ok(r) if r.value.value() == 0 && !r.zero => { println!("✓"); passed += 1; }
        other => { println!("✗ (got {:?})", other); failed += 1; }
    }

    // Test 2: Stack keeps the last four pushes
    print!("Stack keeps last four pushes... ");
    let mut stack = CallStack::new();
    for v in 1..=5 {
        stack.push(Word8::new(v));
    }
    let popped: Vec<u8> = (0..4).map(|_| stack.pop().value()).collect();
    if popped == [5, 4, 3, 2] && stack.top().is_zero() {
        println!("✓");
        passed += 1;
    } else {
        println!("✗ (got {:?})", popped);
        failed += 1;
    }

    // Test 3: Scenario A
    print!("LD 5; ADD 3 gives reg0 = 8... ");
    let ok = machine("LD r0, 5\nADD r0, 3").map_or(false, |mut mcu| {
        mcu.run_limited(2).is_ok() && mcu.regs.reg0.value() == 8 && mcu.pc() == 2
    });
    if ok { println!("✓"); passed += 1; }
    else { println!("✗"); failed += 1; }

    // Test 4: Scenario B
    print!("BZ on zero register branches... ");
    let ok = machine("BZ r0, 10").map_or(false, |mut mcu| {
        mcu.step().is_ok() && mcu.pc() == 10
    });
    if ok { println!("✓"); passed += 1; }
    else { println!("✗"); failed += 1; }

    // Test 5: Scenario C
    print!("CALL/RET round trip... ");
    let ok = machine("CALL 5\nORG 5\nRET").map_or(false, |mut mcu| {
        let called = mcu.step().is_ok()
            && mcu.pc() == 5
            && mcu.stack.slots().map(|w| w.value()) == [1, 0, 0, 0];
        let returned = mcu.step().is_ok()
            && mcu.pc() == 1
            && mcu.stack.slots().map(|w| w.value()) == [0, 0, 0, 0];
        called && returned
    });
    if ok { println!("✓"); passed += 1; }
    else { println!("✗"); failed += 1; }

    // Test 6: Undefined opcode
    print!("Undefined opcode faults without side effects... ");
    let mut mcu = Mcu::new();
    let loaded = mcu.load_program(&[InstructionWord::from_raw(0b1101_0_0000_0001)]).is_ok();
    let result = mcu.step();
    if loaded
        && result == Err(CpuError::Decode(DecodeError::InvalidOpcode(0b1101)))
        && mcu.pc() == 0
        && mcu.cycles == 0
    {
        println!("✓");
        passed += 1;
    } else {
        println!("✗ (got {:?})", result);
        failed += 1;
    }

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
