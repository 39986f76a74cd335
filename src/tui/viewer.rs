//! Dual-pane PDF comparison viewer.
//!
//! Each pane draws its page outline on a Ratatui canvas with the diff boxes
//! on top. At scale 1 the page fits the pane; zooming in lets it overflow
//! (the canvas clips), zooming out shrinks it.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph,
        canvas::{Canvas, Rectangle},
    },
};

use crate::compare::{DualPageComparator, PageSize, PaneContent, Side, ViewerAction};
use crate::data::BackendClient;
use crate::error::AppError;

use super::TerminalGuard;

/// Boxes are alpha-blended onto this (the terminal background).
const BACKGROUND: (u8, u8, u8) = (0, 0, 0);

/// Start the comparison viewer.
pub fn run(comparator: DualPageComparator, client: BackendClient) -> Result<(), AppError> {
    let _guard = TerminalGuard::new(false)?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut viewer = Viewer { comparator, client, page_input: None };
    viewer.event_loop(&mut terminal)
}

struct Viewer {
    comparator: DualPageComparator,
    client: BackendClient,
    /// Digits typed after `g`, until Enter or Esc.
    page_input: Option<String>,
}

impl Viewer {
    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if let Some(input) = &mut self.page_input {
            match code {
                KeyCode::Esc => self.page_input = None,
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => input.push(c),
                KeyCode::Enter => {
                    let requested = parse_page(input);
                    self.page_input = None;
                    self.comparator.apply(ViewerAction::GoTo(requested), &self.client);
                }
                _ => {}
            }
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('g') => self.page_input = Some(String::new()),
            other => {
                if let Some(action) = action_for(other) {
                    tracing::debug!(?action, "viewer action");
                    self.comparator.apply(action, &self.client);
                }
            }
        }
        false
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);
        self.draw_pane(frame, panes[0], Side::Left);
        self.draw_pane(frame, panes[1], Side::Right);

        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let state = self.comparator.state();
        let on_off = |on: bool| if on { "on" } else { "off" };
        let line = Line::from(vec![
            Span::styled(
                format!("Page {} / {}", state.page, state.page_count),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(format!(
                " | zoom {:.0}% | text diff: {} | left diffs: {} | opacity {:.0}%",
                state.scale * 100.0,
                on_off(state.overlay_active),
                on_off(state.show_left),
                state.opacity * 100.0,
            )),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_pane(&self, frame: &mut ratatui::Frame<'_>, area: Rect, side: Side) {
        let block = Block::default()
            .title(self.comparator.file_name(side).to_string())
            .borders(Borders::ALL);
        let inner = block.inner(area);
        let pane = self.comparator.pane(side);

        let PaneContent::Page(page) = pane.content else {
            let p = Paragraph::new("(no such page)")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(p, area);
            return;
        };

        let (vw, vh) = viewport(page, self.comparator.state().scale, inner.width, inner.height);
        let boxes = &pane.boxes;
        let canvas = Canvas::default()
            .block(block)
            .x_bounds([0.0, vw])
            .y_bounds([0.0, vh])
            .paint(move |ctx| {
                ctx.draw(&Rectangle {
                    x: 0.0,
                    y: vh - page.height,
                    width: page.width,
                    height: page.height,
                    color: Color::White,
                });
                for b in boxes {
                    if b.color.a <= 0.0 {
                        continue;
                    }
                    let (r, g, bl) = b.color.over(BACKGROUND);
                    let (left, top) = (b.rect.left as f64, b.rect.top as f64);
                    let (w, h) = (b.rect.width as f64, b.rect.height as f64);
                    ctx.draw(&Rectangle { x: left, y: vh - top - h, width: w, height: h, color: Color::Rgb(r, g, bl) });
                }
            });
        frame.render_widget(canvas, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let status = if let Some(input) = &self.page_input {
            Span::styled(format!("Go to page: {input}_"), Style::default().fg(Color::Yellow))
        } else if let Some(err) = self.comparator.last_error() {
            Span::styled(err.to_string(), Style::default().fg(Color::Red))
        } else {
            let state = self.comparator.state();
            let boxes = self.comparator.pane(Side::Left).boxes.len() + self.comparator.pane(Side::Right).boxes.len();
            if state.overlay_active {
                Span::styled(format!("{boxes} difference box(es)"), Style::default().fg(Color::Gray))
            } else {
                Span::raw("")
            }
        };

        let line = Line::from(vec![
            status,
            Span::styled(
                " | ←/→ page, g go to, +/- zoom, t text diff, l left diffs, [/] opacity, q quit",
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn action_for(code: KeyCode) -> Option<ViewerAction> {
    match code {
        KeyCode::Right | KeyCode::PageDown | KeyCode::Char('n') => Some(ViewerAction::NextPage),
        KeyCode::Left | KeyCode::PageUp | KeyCode::Char('p') => Some(ViewerAction::PrevPage),
        KeyCode::Home => Some(ViewerAction::GoTo(1)),
        KeyCode::End => Some(ViewerAction::GoTo(i64::MAX)),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(ViewerAction::ZoomIn),
        KeyCode::Char('-') => Some(ViewerAction::ZoomOut),
        KeyCode::Char('t') => Some(ViewerAction::ToggleOverlay),
        KeyCode::Char('l') => Some(ViewerAction::ToggleLeft),
        KeyCode::Char(']') => Some(ViewerAction::OpacityUp),
        KeyCode::Char('[') => Some(ViewerAction::OpacityDown),
        _ => None,
    }
}

/// Typed page number; anything unparseable means page 1.
fn parse_page(input: &str) -> i64 {
    input.trim().parse().unwrap_or(1)
}

/// Canvas extent in page pixels, fixed per page so zoom is visible.
///
/// The unscaled page is fitted to the pane, taking terminal cells as twice as
/// tall as they are wide.
fn viewport(page: PageSize, scale: f64, cols: u16, rows: u16) -> (f64, f64) {
    let base_w = page.width / scale;
    let base_h = page.height / scale;
    if cols == 0 || rows == 0 || base_w <= 0.0 || base_h <= 0.0 {
        return (base_w.max(1.0), base_h.max(1.0));
    }
    let aspect = f64::from(cols) / (f64::from(rows) * 2.0);
    if base_w / base_h > aspect {
        (base_w, base_w / aspect)
    } else {
        (base_h * aspect, base_h)
    }
}
