//! UI rendering for the control panel.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::clock::ClockMode;
use crate::cpu::McuState;
use crate::panel::{DisplayMode, LampGroup, TrafficLights};
use super::app::PanelApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &PanelApp) {
    let state = app.snapshot();

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(frame.area());

    // Left side: code, machine state and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(7),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app, &state);
    draw_registers(frame, left_chunks[1], app, &state);
    draw_status(frame, left_chunks[2], app);

    // Right side: output, inputs and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Min(6),
            Constraint::Length(5),
        ])
        .split(chunks[1]);

    draw_output(frame, right_chunks[0], app, &state);
    draw_inputs(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw disassembly view around the PC.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &PanelApp, state: &McuState) {
    let disasm = app.get_disassembly(state.bus.pc, (area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}{:02}: {}", prefix, addr, instr)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Program ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw registers, stack and clock state.
fn draw_registers(frame: &mut Frame, area: Rect, app: &PanelApp, state: &McuState) {
    let stack = state
        .stack
        .slots()
        .iter()
        .map(|slot| format!("{:02}", slot.value()))
        .collect::<Vec<_>>()
        .join(" ");

    let mode = app.clock.mode();
    let mode_style = match mode {
        ClockMode::Automatic => Style::default().fg(Color::Green),
        ClockMode::Manual => Style::default().fg(Color::White),
    };

    let content = vec![
        Line::from(vec![
            Span::raw("r0: "),
            Span::styled(format!("{}", state.regs.reg0), Style::default().fg(Color::White)),
            Span::raw(format!(" = {:>3}", state.regs.reg0.value())),
            Span::raw("   r1: "),
            Span::styled(format!("{}", state.regs.reg1), Style::default().fg(Color::White)),
            Span::raw(format!(" = {:>3}", state.regs.reg1.value())),
        ]),
        Line::from(vec![
            Span::raw("PC: "),
            Span::styled(format!("{:02}", state.bus.pc), Style::default().fg(Color::Yellow)),
            Span::raw("   Stack: "),
            Span::styled(stack, Style::default().fg(Color::Magenta)),
        ]),
        Line::from(vec![
            Span::raw("Cycles: "),
            Span::styled(format!("{}", state.cycles), Style::default().fg(Color::Cyan)),
            Span::raw("   Clock: "),
            Span::styled(format!("{:?}", mode), mode_style),
        ]),
        Line::from(match app.clock.fault() {
            Some(fault) => Span::styled(
                format!("Fault at {:02}: {}", fault.pc, fault.error),
                Style::default().fg(Color::Red),
            ),
            None => Span::raw(""),
        }),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Machine ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw the OUTPUT latch.
fn draw_output(frame: &mut Frame, area: Rect, app: &PanelApp, state: &McuState) {
    let output = state.bus.output;
    let content = match app.display {
        DisplayMode::Numeric => vec![
            Line::from(Span::styled(
                format!("{}", output.value()),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(format!("{}", output), Style::default().fg(Color::DarkGray))),
        ],
        DisplayMode::TrafficLights => {
            let lights = TrafficLights::from_output(output);
            vec![
                lamp_line("Main ", lights.main),
                lamp_line("Side ", lights.side),
            ]
        }
    };

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Output ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)));

    frame.render_widget(paragraph, area);
}

fn lamp_line(label: &'static str, group: LampGroup) -> Line<'static> {
    let lamp = |on: bool, color: Color| {
        let style = if on {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Span::styled(" ● ", style)
    };
    Line::from(vec![
        Span::raw(label),
        lamp(group.red, Color::Red),
        lamp(group.yellow, Color::Yellow),
        lamp(group.green, Color::Green),
    ])
}

/// Draw the input switches.
fn draw_inputs(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let items: Vec<ListItem> = (0..crate::panel::InputLines::COUNT)
        .filter_map(|i| app.inputs.line(i).map(|line| (i, line)))
        .map(|(i, (label, on))| {
            let style = if on {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let mark = if on { "[x]" } else { "[ ]" };
            ListItem::new(format!("{}: {} {}", i + 1, mark, label)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Inputs ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &PanelApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("1-4: Toggle input  s: Step  c: Clock mode"),
        Line::from("d: Display mode  x: Reset  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
