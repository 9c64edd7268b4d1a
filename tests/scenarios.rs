//! End-to-end runs of whole programs.

use mcusim::asm::formats::render_hex;
use mcusim::clock::{lock_mcu, share};
use mcusim::panel::{InputLines, TrafficLights};
use mcusim::{assemble, load_program, save_text, Clock, ClockMode, Mcu, Word8};
use std::time::Duration;

const TRAFFIC: &str = include_str!("../programs/traffic.asm");

fn machine(source: &str) -> Mcu {
    let mut mcu = Mcu::new();
    mcu.load_program(&assemble(source).unwrap()).unwrap();
    mcu
}

/// Step until OUTPUT has changed `count` times, recording each new value.
fn output_changes(mcu: &mut Mcu, count: usize, max_cycles: u64) -> Vec<u8> {
    let mut changes = Vec::new();
    let mut last = mcu.bus().output();
    for _ in 0..max_cycles {
        mcu.step().unwrap();
        let output = mcu.bus().output();
        if output != last {
            changes.push(output.value());
            last = output;
            if changes.len() == count {
                break;
            }
        }
    }
    changes
}

#[test]
fn test_arithmetic_program() {
    let mut mcu = machine("LD r0, 5\nADD r0, 3");
    mcu.run_limited(2).unwrap();
    assert_eq!(mcu.regs.reg0.value(), 8);
    assert_eq!(mcu.pc(), 2);
}

#[test]
fn test_branch_on_zero_register() {
    let mut mcu = machine("BZ r0, 10");
    mcu.step().unwrap();
    assert_eq!(mcu.pc(), 10);
}

#[test]
fn test_call_and_return() {
    let mut mcu = machine("CALL 5\nORG 5\nRET");

    mcu.step().unwrap();
    assert_eq!(mcu.pc(), 5);
    assert_eq!(mcu.stack.slots().map(|w| w.value()), [1, 0, 0, 0]);

    mcu.step().unwrap();
    assert_eq!(mcu.pc(), 1);
    assert_eq!(mcu.stack.slots().map(|w| w.value()), [0, 0, 0, 0]);
}

#[test]
fn test_traffic_day_without_cars_stays_green() {
    let mut mcu = machine(TRAFFIC);
    InputLines { day_night: true, ..Default::default() }.apply(mcu.bus());

    mcu.run_limited(200).unwrap();
    let lights = TrafficLights::from_output(mcu.bus().output());
    assert!(lights.main.green && !lights.main.red);
    assert!(lights.side.red && !lights.side.green);
}

#[test]
fn test_traffic_side_street_cycle() {
    let mut mcu = machine(TRAFFIC);
    InputLines { day_night: true, side_street_car: true, ..Default::default() }.apply(mcu.bus());

    let changes = output_changes(&mut mcu, 5, 500);
    assert_eq!(changes, [0b001100, 0b001010, 0b100001, 0b010001, 0b001100]);
    // Nested waits never go deeper than one frame
    assert!(mcu.stack.slots()[1].is_zero());
}

#[test]
fn test_traffic_night_flashes() {
    let mut mcu = machine(TRAFFIC);

    let changes = output_changes(&mut mcu, 3, 500);
    assert_eq!(changes, [0b010010, 0, 0b010010]);
}

#[test]
fn test_formats_load_the_same_program() {
    let words = assemble(TRAFFIC).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let asm_path = dir.path().join("traffic.asm");
    std::fs::write(&asm_path, TRAFFIC).unwrap();

    let txt_path = dir.path().join("traffic.txt");
    save_text(&txt_path, &words).unwrap();

    let hex_path = dir.path().join("traffic.hex");
    std::fs::write(&hex_path, render_hex(&words)).unwrap();

    assert_eq!(load_program(&asm_path).unwrap(), words);
    assert_eq!(load_program(&txt_path).unwrap(), words);
    assert_eq!(load_program(&hex_path).unwrap(), words);
}

#[test]
fn test_automatic_clock_runs_program_then_pauses() {
    let shared = share(machine(TRAFFIC));
    lock_mcu(&shared).bus().set_input(Word8::new(0b01));

    let clock = Clock::spawn(shared.clone(), 2000).unwrap();
    clock.set_mode(ClockMode::Automatic);
    std::thread::sleep(Duration::from_millis(50));
    clock.set_mode(ClockMode::Manual);
    std::thread::sleep(Duration::from_millis(10));

    let paused = lock_mcu(&shared).state();
    assert!(paused.cycles > 0);
    assert_eq!(paused.bus.output.value(), 0b001100);

    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(lock_mcu(&shared).state(), paused);

    // Resumable by hand from where the clock stopped
    clock.step().unwrap();
    assert_eq!(lock_mcu(&shared).cycles, paused.cycles + 1);
    assert!(clock.fault().is_none());
}
