//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::sequencer::PipelineStage;
use crate::cpu::unit::{UnitId, SCRATCHPAD_SIZE};
use crate::alu::to_signed;
use crate::image::{annotate, disassemble};
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .split(frame.area());

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(9),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_units(frame, left_chunks[0], app);
    draw_disassembly(frame, left_chunks[1], app);
    draw_registers(frame, left_chunks[2], app);
    draw_status(frame, left_chunks[3], app);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),
            Constraint::Min(6),
            Constraint::Length(5),
        ])
        .split(chunks[1]);

    draw_holding(frame, right_chunks[0], app);
    draw_scratchpad(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Unit tabs: selected unit highlighted, disabled units dimmed.
fn draw_units(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let spans: Vec<Span> = UnitId::ALL
        .iter()
        .flat_map(|&unit| {
            let mut style = if app.machine.is_enabled(unit) {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            if unit == app.selected {
                style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
            }
            [Span::styled(format!(" {} ", unit), style), Span::raw("│")]
        })
        .collect();

    let tabs = Paragraph::new(Line::from(spans))
        .block(Block::default()
            .title(" Units ")
            .borders(Borders::ALL));

    frame.render_widget(tabs, area);
}

/// Control store around the micro address.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, text, is_current)| {
            let has_bp = app.machine.has_breakpoint(app.selected, *addr);
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if has_bp { "●" } else { " " };

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if has_bp {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}{:04o}: {}", bp, prefix, addr, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(format!(" {} control store ", app.selected))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Sequencer and working registers.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let engine = app.machine.unit(app.selected);
    let state = &engine.state;
    let value = Style::default().fg(Color::White);

    let content = vec![
        Line::from(vec![
            Span::raw("O: "),
            Span::styled(format!("{:04o}", state.address()), Style::default().fg(Color::Yellow)),
            Span::raw("   OS: "),
            Span::styled(format!("{:04o}", state.saved_address()), value),
            Span::raw("   Stage: "),
            Span::styled(format!("{}", state.stage().letter()), stage_style(state.stage())),
        ]),
        Line::from(vec![
            Span::raw("M: "),
            Span::styled(format!("{:08o}", state.m()), value),
            Span::raw("   Q: "),
            Span::styled(format!("{:08o}", state.q()), value),
            Span::raw("   Z: "),
            Span::styled(format!("{:08o}", state.z()), value),
        ]),
        Line::from(vec![
            Span::raw("I: "),
            Span::styled(format!("{}", state.latched()), value),
        ]),
        Line::from(Span::styled(
            format!("   {}", disassemble(&state.latched())),
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            format!("   {}", annotate(&state.latched())),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(vec![
            Span::raw("Cycles: "),
            Span::styled(format!("{}", engine.cycles), Style::default().fg(Color::Cyan)),
            Span::raw("   Iterations: "),
            Span::styled(format!("{}", app.machine.iterations()), Style::default().fg(Color::Cyan)),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// R0..R6.
fn draw_holding(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let regs = app.machine.unit(app.selected).state.holding_registers();
    let items: Vec<ListItem> = regs
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let style = if *r != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            ListItem::new(format!("R{}: {:08o} {:>9}", i, r, to_signed(*r))).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Holding ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Scratchpad words.
fn draw_scratchpad(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let words = app.machine.unit(app.selected).state.scratchpad_words();
    let visible_rows = (area.height as usize).saturating_sub(2);
    let start = app.sp_scroll;
    let end = (start + visible_rows).min(SCRATCHPAD_SIZE);

    let items: Vec<ListItem> = (start..end)
        .map(|idx| {
            let value = words[idx];
            let style = if value != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            ListItem::new(format!("SP[{:02o}]: {:08o}", idx, value)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Scratchpad ")
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
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint  x: Reset"),
        Line::from("d: Diagnostic on/off"),
        Line::from("Tab: Unit  e: Enable  ↑↓: Scroll  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// Color for a pipeline stage.
fn stage_style(stage: PipelineStage) -> Style {
    match stage {
        PipelineStage::Normal => Style::default().fg(Color::Green),
        PipelineStage::BranchPending => Style::default().fg(Color::Yellow),
        PipelineStage::ExtendedSettle => Style::default().fg(Color::Red),
    }
}
