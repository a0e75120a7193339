//! Debugger application state and logic.

use crate::cpu::rom::ROM_SIZE;
use crate::cpu::unit::{UnitId, SCRATCHPAD_SIZE};
use crate::image::disassemble;
use crate::machine::{Machine, NoEvents, StopReason};

/// Scheduler iterations per screen refresh while running.
const ITERATIONS_PER_TICK: u64 = 64;

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub machine: Machine,
    /// Unit shown in the views.
    pub selected: UnitId,
    /// Is the debugger running continuously?
    pub running: bool,
    /// The next tick resumes from a breakpoint.
    resuming: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Scratchpad view scroll offset.
    pub sp_scroll: usize,
}

impl DebuggerApp {
    /// Create a debugger around a bootstrapped machine.
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            selected: UnitId::Cpu0,
            running: false,
            resuming: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            sp_scroll: 0,
        }
    }

    /// Run one scheduler iteration.
    pub fn step(&mut self) {
        let address = self.machine.unit(self.selected).state.address();
        match self.machine.step() {
            Ok(reports) => {
                self.status = match reports.iter().find(|(unit, _)| *unit == self.selected) {
                    Some((_, report)) => format!(
                        "{} {:04o}: {}",
                        self.selected,
                        address,
                        disassemble(&report.microword)
                    ),
                    None => format!("{} is disabled", self.selected),
                };
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }
    }

    /// Start continuous execution.
    pub fn run(&mut self) {
        self.running = true;
        self.resuming = true;
        self.status = "Running...".into();
    }

    /// Stop continuous execution.
    pub fn pause(&mut self) {
        self.running = false;
        self.status = format!("Paused after {} iterations.", self.machine.iterations());
    }

    /// Run one batch of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if !self.resuming {
            if let Some((unit, address)) = self.machine.breakpoint_hit() {
                self.running = false;
                self.status = format!("Breakpoint: {} at {:04o}", unit, address);
                return;
            }
        }
        self.resuming = false;

        match self.machine.run(&mut NoEvents, Some(ITERATIONS_PER_TICK)) {
            Ok(StopReason::Breakpoint { unit, address }) => {
                self.running = false;
                self.selected = unit;
                self.status = format!("Breakpoint: {} at {:04o}", unit, address);
            }
            Ok(_) => {}
            Err(e) => {
                self.running = false;
                self.status = format!("Error: {}", e);
            }
        }
    }

    /// Toggle a breakpoint at the selected unit's micro address.
    pub fn toggle_breakpoint(&mut self) {
        let address = self.machine.unit(self.selected).state.address();
        if self.machine.toggle_breakpoint(self.selected, address) {
            self.status = format!("Set breakpoint: {} at {:04o}", self.selected, address);
        } else {
            self.status = format!("Removed breakpoint: {} at {:04o}", self.selected, address);
        }
    }

    /// Show the next unit.
    pub fn next_unit(&mut self) {
        let index = UnitId::ALL.iter().position(|&u| u == self.selected).unwrap_or(0);
        self.selected = UnitId::ALL[(index + 1) % UnitId::ALL.len()];
        self.sp_scroll = 0;
        self.status = format!("Viewing {}", self.selected);
    }

    /// Enable or disable the selected unit.
    pub fn toggle_enabled(&mut self) {
        let enabled = !self.machine.is_enabled(self.selected);
        self.machine.set_enabled(self.selected, enabled);
        self.status = format!(
            "{} {}",
            self.selected,
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Flip the diagnostic preload switch and reset.
    ///
    /// Turning it off also empties CPU0's control store.
    pub fn toggle_diagnostic(&mut self) {
        let preload = !self.machine.preload_diagnostic();
        self.machine.set_preload_diagnostic(preload);
        if !preload {
            self.machine.unit_mut(UnitId::Cpu0).rom.clear();
        }
        self.machine.bootstrap();
        self.running = false;
        self.status = format!(
            "Reset with diagnostic {}.",
            if preload { "loaded" } else { "off" }
        );
    }

    /// Press the reset switch.
    pub fn reset(&mut self) {
        self.machine.bootstrap();
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    pub fn scroll_up(&mut self) {
        self.sp_scroll = self.sp_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        if self.sp_scroll + 1 < SCRATCHPAD_SIZE {
            self.sp_scroll += 1;
        }
    }

    /// Disassembly around the selected unit's micro address.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u16, String, bool)> {
        let engine = self.machine.unit(self.selected);
        let current = usize::from(engine.state.address());
        let start = current.saturating_sub(lines / 2);

        (start..(start + lines).min(ROM_SIZE))
            .map(|addr| {
                let addr = addr as u16;
                let mw = engine.rom.read(addr);
                (addr, disassemble(&mw), usize::from(addr) == current)
            })
            .collect()
    }
}

/// Run the debugger on a bootstrapped machine.
pub fn run_debugger(machine: Machine) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(machine);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => app.pause(),
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('e') => app.toggle_enabled(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Char('d') => app.toggle_diagnostic(),
                        KeyCode::Tab => app.next_unit(),
                        KeyCode::Up => app.scroll_up(),
                        KeyCode::Down => app.scroll_down(),
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

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

    #[test]
    fn test_step_reports_selected_unit() {
        let mut app = DebuggerApp::new(Machine::new());
        app.step();
        assert!(app.status.starts_with("CPU0 0001:"));
        assert_eq!(app.machine.iterations(), 1);
    }

    #[test]
    fn test_run_stops_at_breakpoint() {
        let mut app = DebuggerApp::new(Machine::new());
        app.toggle_breakpoint();
        app.machine.step().unwrap();
        app.run();
        for _ in 0..4 {
            app.tick();
        }
        assert!(!app.running);
        assert!(app.status.starts_with("Breakpoint: CPU0 at 0001"));
    }

    #[test]
    fn test_unit_cycling_and_reset() {
        let mut app = DebuggerApp::new(Machine::new());
        for _ in 0..UnitId::ALL.len() {
            app.next_unit();
        }
        assert_eq!(app.selected, UnitId::Cpu0);

        app.next_unit();
        app.toggle_enabled();
        assert!(app.machine.is_enabled(UnitId::Cpu1));

        app.step();
        app.reset();
        assert_eq!(app.machine.iterations(), 0);
    }

    #[test]
    fn test_diagnostic_switch() {
        let mut app = DebuggerApp::new(Machine::new());
        app.toggle_diagnostic();
        assert!(!app.machine.preload_diagnostic());
        assert!(app.status.contains("off"));
        assert_eq!(app.machine.unit(UnitId::Cpu0).rom.populated().count(), 0);
        assert!(app.machine.unit(UnitId::Cpu0).state.latched().is_nop());

        app.toggle_diagnostic();
        assert!(app.machine.preload_diagnostic());
        assert_eq!(app.machine.unit(UnitId::Cpu0).rom.populated().count(), 7);
    }

    #[test]
    fn test_disassembly_window() {
        let app = DebuggerApp::new(Machine::new());
        let lines = app.get_disassembly(6);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0].0, 0);
        assert!(lines.iter().any(|(addr, _, current)| *addr == 1 && *current));
        assert_eq!(lines[1].1, ".MC = 20, .B = 2");
    }
}
