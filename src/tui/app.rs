//! Debugger application state and logic.

use crate::clock::Pacer;
use crate::config::Config;
use crate::cpu::{Cpu, StepOutcome};
use crate::rom::{disassemble_instruction, Rom};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Timer ticks a key stays down after the terminal reports a press.
///
/// Most terminals never send key-up events, so a press is held briefly and
/// kept alive by auto-repeat.
pub const KEY_HOLD_TICKS: u8 = 8;

/// Map a keyboard character onto the hex keypad.
///
/// ```text
///   1 2 3 4        1 2 3 C
///   Q W E R   ->   4 5 6 D
///   A S D F        7 8 9 E
///   Z X C V        A 0 B F
/// ```
pub fn keymap(c: char) -> Option<u8> {
    let key = match c.to_ascii_lowercase() {
        '1' => 0x1, '2' => 0x2, '3' => 0x3, '4' => 0xC,
        'q' => 0x4, 'w' => 0x5, 'e' => 0x6, 'r' => 0xD,
        'a' => 0x7, 's' => 0x8, 'd' => 0x9, 'f' => 0xE,
        'z' => 0xA, 'x' => 0x0, 'c' => 0xB, 'v' => 0xF,
        _ => return None,
    };
    Some(key)
}

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub cpu: Cpu,
    /// Loaded program, kept for resets.
    pub rom: Rom,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<u16>,
    /// Is the machine running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset, in rows of 8 bytes from I.
    pub mem_scroll: usize,
    /// Set after a fatal CPU error until the next reset.
    pub faulted: bool,
    pacer: Pacer,
    key_hold: [u8; 16],
    /// Breakpoint address to step over on the first step after `run`.
    resume_from: Option<u16>,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(rom: Rom, config: &Config) -> Self {
        let mut cpu = config.build_cpu();
        let mut status = format!("Loaded {}. p: run, n: step, Esc: quit.", rom.name);
        if let Err(e) = cpu.load_program(&rom.bytes) {
            status = format!("Error: {}", e);
        }

        Self {
            cpu,
            rom,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status,
            mem_scroll: 0,
            faulted: false,
            pacer: config.pacer(),
            key_hold: [0; 16],
            resume_from: None,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if self.faulted {
            self.status = "Machine faulted. Press o to reset.".into();
            self.running = false;
            return;
        }

        let pc = self.cpu.regs.pc;
        match self.cpu.step() {
            Ok(StepOutcome::Executed(_)) => {
                if !self.running {
                    let word = self.cpu.mem.read_word(pc as usize).unwrap_or(0);
                    self.status = format!("PC={:03X}: {}", pc, disassemble_instruction(word));
                }
            }
            Ok(StepOutcome::WaitingForKey) => {
                self.status = format!("PC={:03X}: waiting for a key", pc);
            }
            Ok(StepOutcome::Unknown(word)) => {
                self.status = format!("PC={:03X}: unknown instruction {:04X}", pc, word);
            }
            Err(e) => {
                self.status = format!("Error at PC={:03X}: {}", pc, e);
                self.running = false;
                self.faulted = true;
            }
        }
    }

    /// Start continuous execution.
    pub fn run(&mut self) {
        self.running = true;
        self.resume_from = Some(self.cpu.regs.pc);
        self.pacer.reset();
        self.status = "Running...".into();
    }

    /// Stop continuous execution.
    pub fn pause(&mut self) {
        self.running = false;
        self.status = format!("Paused at PC={:03X}.", self.cpu.regs.pc);
    }

    /// Decrement the timers once and age held keys.
    pub fn tick(&mut self) {
        self.cpu.tick();
        for (key, hold) in self.key_hold.iter_mut().enumerate() {
            if *hold > 0 {
                *hold -= 1;
                if *hold == 0 {
                    self.cpu.keys.release(key as u8);
                }
            }
        }
    }

    /// Spend the steps and ticks owed for `elapsed` wall-clock time.
    pub fn advance(&mut self, elapsed: Duration) {
        let budget = self.pacer.advance(elapsed);
        if !self.running {
            return;
        }

        for _ in 0..budget.steps {
            let pc = self.cpu.regs.pc;
            let resuming = self.resume_from.take() == Some(pc);
            if !resuming && self.breakpoints.contains(&pc) {
                self.running = false;
                self.status = format!("Breakpoint at PC={:03X}", pc);
                break;
            }
            self.step();
            if !self.running {
                break;
            }
        }

        for _ in 0..budget.ticks {
            self.tick();
        }
    }

    /// Hold a keypad key down for a while.
    pub fn press_key(&mut self, key: u8) {
        self.cpu.keys.press(key);
        self.key_hold[(key & 0x0F) as usize] = KEY_HOLD_TICKS;
    }

    /// Release a keypad key immediately.
    pub fn release_key(&mut self, key: u8) {
        self.cpu.keys.release(key);
        self.key_hold[(key & 0x0F) as usize] = 0;
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.regs.pc;
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={:03X}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={:03X}", pc);
        }
    }

    /// Reset the machine and reload the program.
    pub fn reset(&mut self) {
        self.cpu.reset();
        if let Err(e) = self.cpu.load_program(&self.rom.bytes) {
            self.status = format!("Error: {}", e);
            return;
        }
        self.running = false;
        self.faulted = false;
        self.key_hold = [0; 16];
        self.resume_from = None;
        self.pacer.reset();
        self.status = "Reset. Ready.".into();
    }

    /// Get disassembly starting a little before PC.
    ///
    /// Each entry is (address, word, text, is_current).
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u16, u16, String, bool)> {
        let pc = self.cpu.regs.pc;
        let start = pc.saturating_sub((lines / 2) as u16 * 2);

        (0..lines as u16)
            .filter_map(|n| {
                let addr = start.checked_add(n * 2)?;
                let word = self.cpu.mem.read_word(addr as usize).ok()?;
                Some((addr, word, disassemble_instruction(word), addr == pc))
            })
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(rom: Rom, config: &Config, start_running: bool) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create app
    let mut app = DebuggerApp::new(rom, config);
    if start_running {
        app.run();
    }
    let mut last = Instant::now();

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        // Handle input
        let wait = app.pacer.until_next().min(Duration::from_millis(16));
        if event::poll(wait)? {
            if let Event::Key(key) = event::read()? {
                match (key.kind, key.code) {
                    (KeyEventKind::Release, KeyCode::Char(c)) => {
                        if let Some(k) = keymap(c) {
                            app.release_key(k);
                        }
                    }
                    (KeyEventKind::Release, _) => {}
                    (_, KeyCode::Esc) => app.should_quit = true,
                    (_, KeyCode::Char('n')) => {
                        app.running = false;
                        app.step();
                    }
                    (_, KeyCode::Char('p')) => {
                        if app.running {
                            app.pause();
                        } else {
                            app.run();
                        }
                    }
                    (_, KeyCode::Char('t')) => app.tick(),
                    (_, KeyCode::Char('b')) => app.toggle_breakpoint(),
                    (_, KeyCode::Char('o')) => app.reset(),
                    (_, KeyCode::Up) => {
                        app.mem_scroll = app.mem_scroll.saturating_sub(1);
                    }
                    (_, KeyCode::Down) => {
                        if app.mem_scroll < 64 {
                            app.mem_scroll += 1;
                        }
                    }
                    (_, KeyCode::Char(c)) => {
                        if let Some(k) = keymap(c) {
                            app.press_key(k);
                        }
                    }
                    _ => {}
                }
            }
        }

        // Pace continuous running
        let now = Instant::now();
        app.advance(now - last);
        last = now;

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with(bytes: &[u8]) -> DebuggerApp {
        let config = Config { seed: Some(7), cpu_hz: 600, timer_hz: 60, ..Config::default() };
        DebuggerApp::new(Rom::from_bytes("test", bytes.to_vec()).unwrap(), &config)
    }

    #[test]
    fn test_keymap() {
        assert_eq!(keymap('1'), Some(0x1));
        assert_eq!(keymap('V'), Some(0xF));
        assert_eq!(keymap('x'), Some(0x0));
        assert_eq!(keymap('p'), None);
    }

    #[test]
    fn test_advance_runs_paced_steps() {
        // 0x200: ADD V0, 1 ; 0x202: JP 200
        let mut app = app_with(&[0x70, 0x01, 0x12, 0x00]);
        app.run();
        app.advance(Duration::from_millis(100));

        assert_eq!(app.cpu.cycles, 60);
        assert_eq!(app.cpu.regs.v[0], 30);
    }

    #[test]
    fn test_paused_app_does_not_step() {
        let mut app = app_with(&[0x70, 0x01, 0x12, 0x00]);
        app.advance(Duration::from_millis(100));
        assert_eq!(app.cpu.cycles, 0);
    }

    #[test]
    fn test_breakpoint_stops_run() {
        let mut app = app_with(&[0x70, 0x01, 0x70, 0x01, 0x12, 0x00]);
        app.breakpoints.insert(0x202);
        app.run();
        app.advance(Duration::from_millis(100));

        assert!(!app.running);
        assert_eq!(app.cpu.regs.pc, 0x202);
        assert_eq!(app.cpu.cycles, 1);
    }

    #[test]
    fn test_run_resumes_past_breakpoint() {
        // 0x200: ADD V0, 1 ; 0x202: ADD V0, 1 ; 0x204: JP 200
        let mut app = app_with(&[0x70, 0x01, 0x70, 0x01, 0x12, 0x00]);
        app.breakpoints.insert(0x202);
        app.run();
        app.advance(Duration::from_millis(100));
        assert_eq!(app.cpu.cycles, 1);

        app.run();
        app.advance(Duration::from_millis(100));

        assert!(!app.running);
        assert_eq!(app.cpu.regs.pc, 0x202);
        assert_eq!(app.cpu.cycles, 4);
        assert_eq!(app.cpu.regs.v[0], 3);
        assert!(app.status.contains("Breakpoint at PC=202"));
    }

    #[test]
    fn test_toggle_breakpoint() {
        let mut app = app_with(&[0x12, 0x00]);
        app.toggle_breakpoint();
        assert!(app.breakpoints.contains(&0x200));
        app.toggle_breakpoint();
        assert!(app.breakpoints.is_empty());
    }

    #[test]
    fn test_fault_stops_and_reset_recovers() {
        let mut app = app_with(&[0x00, 0xEE]);
        app.run();
        app.advance(Duration::from_millis(20));
        assert!(app.faulted);
        assert!(!app.running);
        assert!(app.status.contains("stack underflow"));

        app.reset();
        assert!(!app.faulted);
        assert_eq!(app.cpu.regs.pc, 0x200);
    }

    #[test]
    fn test_held_key_decays() {
        let mut app = app_with(&[0x12, 0x00]);
        app.press_key(0xA);
        for _ in 1..KEY_HOLD_TICKS {
            app.tick();
        }
        assert!(app.cpu.keys.is_pressed(0xA));

        app.tick();
        assert!(!app.cpu.keys.is_pressed(0xA));
    }

    #[test]
    fn test_disassembly_marks_pc() {
        let app = app_with(&[0x6A, 0x02, 0x12, 0x00]);
        let lines = app.get_disassembly(4);
        let current: Vec<_> = lines.iter().filter(|l| l.3).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].0, 0x200);
        assert_eq!(current[0].2, "LD VA, 02");
    }
}
