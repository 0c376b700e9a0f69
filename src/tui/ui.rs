//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::display::{Display, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(DISPLAY_WIDTH as u16 + 2),
            Constraint::Min(30),
        ])
        .split(frame.area());

    // Left side: screen, registers and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(DISPLAY_HEIGHT as u16 / 2 + 2),
            Constraint::Length(8),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(chunks[0]);

    draw_screen(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);
    draw_help(frame, left_chunks[3]);

    // Right side: code and memory
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(10),
        ])
        .split(chunks[1]);

    draw_disassembly(frame, right_chunks[0], app);
    draw_memory(frame, right_chunks[1], app);
}

/// Pack two pixel rows into each text row using half-block glyphs.
pub fn screen_lines(display: &Display) -> Vec<String> {
    (0..DISPLAY_HEIGHT / 2)
        .map(|row| {
            (0..DISPLAY_WIDTH)
                .map(|x| match (display.pixel(x, row * 2), display.pixel(x, row * 2 + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                })
                .collect()
        })
        .collect()
}

/// Draw the 64×32 frame buffer.
fn draw_screen(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let lines: Vec<Line> = screen_lines(&app.cpu.display)
        .into_iter()
        .map(Line::from)
        .collect();

    let title = if app.cpu.sound_active() {
        format!(" {} ♪ ", app.rom.name)
    } else {
        format!(" {} ", app.rom.name)
    };

    let screen = Paragraph::new(lines)
        .style(Style::default().fg(Color::Green).bg(Color::Black))
        .block(Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(screen, area);
}

/// Draw disassembly view around PC.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, word, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let text = format!("{}{:03X}: {:04X}  {}", prefix, addr, word, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw register, timer and stack state.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let regs = &app.cpu.regs;
    let value_style = Style::default().fg(Color::White);

    let bank = |range: std::ops::Range<usize>| -> Line<'static> {
        let spans: Vec<Span> = range
            .flat_map(|n| {
                vec![
                    Span::raw(format!("V{:X}:", n)),
                    Span::styled(format!("{:02X} ", regs.v[n]), value_style),
                ]
            })
            .collect();
        Line::from(spans)
    };

    let stack: Vec<String> = app.cpu.stack.entries().iter().map(|a| format!("{:03X}", a)).collect();

    let content = vec![
        bank(0..8),
        bank(8..16),
        Line::from(vec![
            Span::raw("PC: "),
            Span::styled(format!("{:03X}", regs.pc), Style::default().fg(Color::Yellow)),
            Span::raw("   I: "),
            Span::styled(format!("{:03X}", regs.i), value_style),
            Span::raw("   DT: "),
            Span::styled(format!("{:02X}", app.cpu.timers.delay), value_style),
            Span::raw("   ST: "),
            Span::styled(format!("{:02X}", app.cpu.timers.sound), value_style),
        ]),
        Line::from(vec![
            Span::raw("Stack: "),
            Span::styled(
                if stack.is_empty() { "-".to_string() } else { stack.join(" ") },
                value_style,
            ),
        ]),
        Line::from(vec![
            Span::raw("Cycles: "),
            Span::styled(format!("{}", app.cpu.cycles), Style::default().fg(Color::Cyan)),
            Span::raw("   State: "),
            if app.faulted {
                Span::styled("Faulted", Style::default().fg(Color::Red))
            } else if app.running {
                Span::styled("Running", Style::default().fg(Color::Green))
            } else {
                Span::styled("Paused", Style::default().fg(Color::Yellow))
            },
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw memory view starting at I.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let base = app.cpu.regs.i as usize + app.mem_scroll * 8;

    let items: Vec<ListItem> = (0..visible_rows)
        .filter_map(|row| {
            let addr = base + row * 8;
            let bytes = app.cpu.mem.dump(addr, 8);
            if bytes.is_empty() {
                return None;
            }

            let hex: Vec<String> = bytes.iter().map(|(_, b)| format!("{:02X}", b)).collect();
            let style = if bytes.iter().any(|(_, b)| *b != 0) {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            Some(ListItem::new(format!("{:03X}: {}", addr, hex.join(" "))).style(style))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory @ I ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
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
        Line::from("n: Step  p: Run/Pause  t: Tick  b: Breakpoint"),
        Line::from("o: Reset  ↑↓: Scroll memory  Esc: Quit"),
        Line::from("Keypad: 1234 / QWER / ASDF / ZXCV"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
