//! Ratatui-based terminal UI.
//!
//! The dashboard provides a filter form (folder, date range, part type, die
//! number), submits it to the backend and renders one row per feature with
//! its latest deviation and a sparkline. Hovering a sparkline with the mouse
//! shows the nearest point's report label.
//!
//! The comparison viewer lives in [`viewer`].

use std::io;
use std::time::Duration;

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::data::BackendClient;
use crate::domain::KNOWN_PART_TYPES;
use crate::error::AppError;
use crate::present::{
    DeviationClass, Results, ResultsTable, Status, SummaryForm, SummaryTablePresenter, TrendCell,
};
use crate::trend::{self, SparklineLayout, SparklineOptions};

mod plotters_chart;
pub mod viewer;

use plotters_chart::SparklineChart;

/// Terminal rows per results row.
const ROW_HEIGHT: u16 = 2;
const NAME_WIDTH: u16 = 28;
const LATEST_WIDTH: u16 = 12;

/// Start the inspection dashboard.
pub fn run_dashboard(client: BackendClient, form: SummaryForm, submit: bool) -> Result<(), AppError> {
    let _guard = TerminalGuard::new(true)?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = Dashboard::new(client, form);
    if submit {
        app.submit(&mut terminal)?;
    }
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen, mouse) on exit.
pub(crate) struct TerminalGuard {
    mouse: bool,
}

impl TerminalGuard {
    pub(crate) fn new(mouse: bool) -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        if mouse {
            if let Err(e) = execute!(io::stdout(), EnableMouseCapture) {
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                let _ = disable_raw_mode();
                return Err(AppError::new(4, format!("Failed to enable mouse capture: {e}")));
            }
        }
        Ok(Self { mouse })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.mouse {
            let _ = execute!(io::stdout(), DisableMouseCapture);
        }
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Folder,
    StartDate,
    EndDate,
    PartType,
    DieNumber,
}

const FIELDS: [Field; 5] = [
    Field::Folder,
    Field::StartDate,
    Field::EndDate,
    Field::PartType,
    Field::DieNumber,
];

impl Field {
    fn label(self) -> &'static str {
        match self {
            Field::Folder => "Folder",
            Field::StartDate => "Start date",
            Field::EndDate => "End date",
            Field::PartType => "Part type",
            Field::DieNumber => "Die number",
        }
    }

    fn get(self, form: &SummaryForm) -> &str {
        match self {
            Field::Folder => &form.folder,
            Field::StartDate => &form.start_date,
            Field::EndDate => &form.end_date,
            Field::PartType => &form.part_type,
            Field::DieNumber => &form.die_number,
        }
    }

    fn set(self, form: &mut SummaryForm, value: String) {
        match self {
            Field::Folder => form.folder = value,
            Field::StartDate => form.start_date = value,
            Field::EndDate => form.end_date = value,
            Field::PartType => form.part_type = value,
            Field::DieNumber => form.die_number = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Form,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Submit,
    Quit,
}

struct Dashboard {
    client: BackendClient,
    presenter: SummaryTablePresenter,
    form: SummaryForm,
    selected_field: usize,
    editing: bool,
    edit_buffer: String,
    focus: Focus,
    status: Status,
    table: Option<ResultsTable>,
    scroll: usize,
    /// Sparkline cells from the last draw, with the row each one belongs to.
    sparkline_cells: Vec<(Rect, usize)>,
    hover: Option<HoverTip>,
}

impl Dashboard {
    fn new(client: BackendClient, form: SummaryForm) -> Self {
        Self {
            client,
            presenter: SummaryTablePresenter::new(SparklineOptions::interactive()),
            form,
            selected_field: 0,
            editing: false,
            edit_buffer: String::new(),
            focus: Focus::Form,
            status: Status::info("Fill in the form and press 's' to scan."),
            table: None,
            scroll: 0,
            sparkline_cells: Vec::new(),
            hover: None,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                self.redraw(terminal)?;
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
                    match self.handle_key(key.code) {
                        KeyOutcome::Quit => break,
                        KeyOutcome::Submit => self.submit(terminal)?,
                        KeyOutcome::Continue => {}
                    }
                    needs_redraw = true;
                }
                Event::Mouse(mouse) => {
                    needs_redraw = self.handle_mouse(mouse);
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn redraw<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        terminal
            .draw(|f| self.draw(f))
            .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
        Ok(())
    }

    /// Show the pending status, then block on the backend.
    fn submit<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        if let Err(msg) = self.form.to_request() {
            self.status = Status::error(msg);
            return Ok(());
        }

        self.status = SummaryTablePresenter::pending_status();
        self.redraw(terminal)?;

        let view = self.presenter.submit(&self.form, &self.client);
        tracing::info!(outcome = ?view.outcome, "summary submitted");
        self.status = view.status;
        match view.results {
            Results::Unchanged => {}
            Results::Hidden => {
                self.table = None;
                self.hover = None;
            }
            Results::Shown(table) => {
                self.table = Some(table);
                self.scroll = 0;
                self.hover = None;
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> KeyOutcome {
        if self.editing {
            self.handle_edit(code);
            return KeyOutcome::Continue;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return KeyOutcome::Quit,
            KeyCode::Char('s') => return KeyOutcome::Submit,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Form => Focus::Results,
                    Focus::Results => Focus::Form,
                };
            }
            KeyCode::Up => match self.focus {
                Focus::Form => self.selected_field = self.selected_field.saturating_sub(1),
                Focus::Results => self.scroll = self.scroll.saturating_sub(1),
            },
            KeyCode::Down => match self.focus {
                Focus::Form => {
                    if self.selected_field + 1 < FIELDS.len() {
                        self.selected_field += 1;
                    }
                }
                Focus::Results => {
                    let rows = self.table.as_ref().map_or(0, |t| t.rows.len());
                    if self.scroll + 1 < rows {
                        self.scroll += 1;
                    }
                }
            },
            KeyCode::Left | KeyCode::Right if self.focus == Focus::Form => {
                if self.current_field() == Field::PartType {
                    let forward = code == KeyCode::Right;
                    self.form.part_type = cycle_part_type(&self.form.part_type, forward).to_string();
                }
            }
            KeyCode::Enter if self.focus == Focus::Form => {
                self.editing = true;
                self.edit_buffer = self.current_field().get(&self.form).to_string();
            }
            _ => {}
        }
        KeyOutcome::Continue
    }

    fn handle_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing = false;
            }
            KeyCode::Enter => {
                self.editing = false;
                let value = std::mem::take(&mut self.edit_buffer);
                self.current_field().set(&mut self.form, value);
            }
            KeyCode::Backspace => {
                self.edit_buffer.pop();
            }
            KeyCode::Char(c) => {
                self.edit_buffer.push(c);
            }
            _ => {}
        }
    }

    /// Returns whether the tooltip changed.
    fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        if !matches!(mouse.kind, MouseEventKind::Moved) {
            return false;
        }
        let next = self.hover_tip(mouse.column, mouse.row);
        if next == self.hover {
            return false;
        }
        self.hover = next;
        true
    }

    fn hover_tip(&self, column: u16, row: u16) -> Option<HoverTip> {
        let table = self.table.as_ref()?;
        let &(rect, idx) = self
            .sparkline_cells
            .iter()
            .find(|(rect, _)| contains(*rect, column, row))?;
        let TrendCell::Plot(layout) = &table.rows.get(idx)?.trend else {
            return None;
        };
        cell_tooltip(layout, rect, column, row)
    }

    fn current_field(&self) -> Field {
        FIELDS[self.selected_field.min(FIELDS.len() - 1)]
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(FIELDS.len() as u16 + 2),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_form(frame, chunks[1]);
        self.draw_results(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);

        if let Some(tip) = &self.hover {
            let area = tooltip_rect(tip, size);
            frame.render_widget(Clear, area);
            frame.render_widget(
                Paragraph::new(format!(" {} ", tip.label)).style(Style::default().fg(Color::Black).bg(Color::Cyan)),
                area,
            );
        }
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let line = Line::from(vec![
            Span::styled("cmmv", Style::default().fg(Color::Cyan)),
            Span::raw(" CMM inspection dashboard | "),
            Span::styled(self.client.base_url().to_string(), Style::default().fg(Color::Gray)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_form(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        for (idx, field) in FIELDS.iter().enumerate() {
            let selected = idx == self.selected_field && self.focus == Focus::Form;
            let value = if selected && self.editing {
                format!("{}_", self.edit_buffer)
            } else {
                let v = field.get(&self.form);
                if v.is_empty() && *field == Field::PartType {
                    "(any)".to_string()
                } else {
                    v.to_string()
                }
            };

            let label_style = if selected {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::Gray)
            };
            let value_style = if selected && self.editing {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            lines.push(Line::from(vec![
                Span::styled(format!(" {:<11}", field.label()), label_style),
                Span::raw(" "),
                Span::styled(value, value_style),
            ]));
        }

        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Filters").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_results(&mut self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        self.sparkline_cells.clear();

        let Some(table) = &self.table else {
            let block = Block::default().title("Results").borders(Borders::ALL);
            frame.render_widget(block, area);
            return;
        };

        let block = Block::default()
            .title(table.summary_line.clone())
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        if inner.height < 2 {
            return;
        }

        let header = Rect { height: 1, ..inner };
        let [name_h, latest_h, trend_h] = row_columns(header);
        let head_style = Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD);
        frame.render_widget(Paragraph::new("Feature").style(head_style), name_h);
        frame.render_widget(Paragraph::new("Latest").style(head_style), latest_h);
        frame.render_widget(Paragraph::new("Trend").style(head_style), trend_h);

        let mut y = inner.y + 1;
        for (idx, row) in table.rows.iter().enumerate().skip(self.scroll) {
            if y + ROW_HEIGHT > inner.y + inner.height {
                break;
            }
            let row_rect = Rect { x: inner.x, y, width: inner.width, height: ROW_HEIGHT };
            let [name_r, latest_r, trend_r] = row_columns(row_rect);

            let (name_text, name_style) = if row.out_of_tolerance {
                (format!("! {}", row.name), Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
            } else {
                (format!("  {}", row.name), Style::default())
            };
            frame.render_widget(Paragraph::new(name_text).style(name_style), name_r);

            let latest_style = match row.latest.class {
                Some(DeviationClass::Positive) => Style::default().fg(Color::Green),
                Some(DeviationClass::Negative) => Style::default().fg(Color::Red),
                Some(DeviationClass::Neutral) => Style::default(),
                None => Style::default().fg(Color::DarkGray),
            };
            frame.render_widget(Paragraph::new(row.latest.text.clone()).style(latest_style), latest_r);

            match &row.trend {
                TrendCell::Plot(layout) => {
                    frame.render_widget(SparklineChart { layout }, trend_r);
                    self.sparkline_cells.push((trend_r, idx));
                }
                TrendCell::Blank => {}
                TrendCell::NoData => {
                    frame.render_widget(
                        Paragraph::new("No data").style(Style::default().fg(Color::DarkGray)),
                        trend_r,
                    );
                }
            }

            y += ROW_HEIGHT;
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let status_style = if self.status.is_error() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Yellow)
        };

        let help = if self.editing {
            " | Enter apply, Esc cancel"
        } else {
            " | ↑/↓ select, Enter edit, ←/→ part type, Tab focus, s scan, q quit"
        };
        let spans = vec![
            Span::styled(self.status.message.clone(), status_style),
            Span::styled(help, Style::default().fg(Color::DarkGray)),
        ];

        let p = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn row_columns(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(NAME_WIDTH),
            Constraint::Length(LATEST_WIDTH),
            Constraint::Min(8),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

/// Hover label plus the terminal cell its popup starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HoverTip {
    label: String,
    column: u16,
    row: u16,
}

/// Map a terminal cell inside a sparkline cell to sparkline coordinates and
/// hit-test there. The radius grows to at least one cell.
///
/// The tooltip anchor is mapped back to a terminal cell, never lower than the
/// row above the cursor.
fn cell_tooltip(layout: &SparklineLayout, rect: Rect, column: u16, row: u16) -> Option<HoverTip> {
    if rect.width == 0 || rect.height == 0 {
        return None;
    }
    let cell_w = trend::WIDTH / f64::from(rect.width);
    let cell_h = trend::HEIGHT / f64::from(rect.height);
    let x = (f64::from(column - rect.x) + 0.5) * cell_w;
    let y = (f64::from(row - rect.y) + 0.5) * cell_h;
    let radius = trend::HIT_RADIUS.max(cell_w.max(cell_h));
    let tip = layout.nearest_within(x, y, radius)?;

    let anchor_col = f64::from(rect.x) + (tip.x / cell_w).floor();
    let anchor_row = f64::from(rect.y) + (tip.y / cell_h).floor();
    Some(HoverTip {
        label: tip.label.to_string(),
        column: anchor_col.max(0.0) as u16,
        row: (anchor_row.max(0.0) as u16).min(row.saturating_sub(1)),
    })
}

/// One-line popup at the tip's anchor, shifted to stay inside `area`.
fn tooltip_rect(tip: &HoverTip, area: Rect) -> Rect {
    let wanted = u16::try_from(tip.label.chars().count() + 2).unwrap_or(u16::MAX);
    let width = wanted.min(area.width);
    let right = area.x + area.width;
    let x = tip.column.clamp(area.x, right.saturating_sub(width).max(area.x));
    let bottom = (area.y + area.height).saturating_sub(1).max(area.y);
    let y = tip.row.clamp(area.y, bottom);
    Rect { x, y, width, height: area.height.min(1) }
}

/// Next (or previous) choice in `"" -> 675 -> 50TT -> 50TL -> ""`.
/// Free-typed values restart the cycle.
fn cycle_part_type(current: &str, forward: bool) -> &'static str {
    let choices: Vec<&'static str> = std::iter::once("").chain(KNOWN_PART_TYPES).collect();
    let n = choices.len();
    let next = match choices.iter().position(|c| *c == current.trim()) {
        Some(i) if forward => (i + 1) % n,
        Some(i) => (i + n - 1) % n,
        None if forward => 1,
        None => n - 1,
    };
    choices[next]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MeasurementPoint;

    fn point(report: &str, deviation: f64) -> MeasurementPoint {
        MeasurementPoint {
            report: Some(report.to_string()),
            deviation: Some(deviation),
            ..Default::default()
        }
    }

    #[test]
    fn part_type_cycles_both_ways() {
        assert_eq!(cycle_part_type("", true), "675");
        assert_eq!(cycle_part_type("50TL", true), "");
        assert_eq!(cycle_part_type("", false), "50TL");
        assert_eq!(cycle_part_type("custom", true), "675");
    }

    #[test]
    fn hover_maps_cells_to_nearest_point() {
        let points = vec![point("r1.pdf", 0.0), point("r2.pdf", 1.0)];
        let layout = trend::layout(&points, SparklineOptions::interactive()).expect("layout");
        let rect = Rect { x: 10, y: 5, width: 14, height: 2 };

        // first column, bottom row: the low point at the left edge
        let tip = cell_tooltip(&layout, rect, 10, 6).expect("tip");
        assert_eq!(tip.label, "r1.pdf: 0.0000");
        assert_eq!((tip.column, tip.row), (10, 5));

        // last column, top row: the high point, popup on the row above the cell
        let tip = cell_tooltip(&layout, rect, 23, 5).expect("tip");
        assert_eq!(tip.label, "r2.pdf: 1.0000");
        assert_eq!((tip.column, tip.row), (23, 4));
    }

    #[test]
    fn tooltip_popup_stays_on_screen() {
        let area = Rect { x: 0, y: 0, width: 30, height: 10 };
        let tip = HoverTip { label: "report-17.pdf: 0.1250".into(), column: 25, row: 4 };
        let popup = tooltip_rect(&tip, area);
        assert_eq!(popup, Rect { x: 7, y: 4, width: 23, height: 1 });

        let tip = HoverTip { label: "x".into(), column: 3, row: 0 };
        assert_eq!(tooltip_rect(&tip, area), Rect { x: 3, y: 0, width: 3, height: 1 });
    }

    #[test]
    fn contains_is_half_open() {
        let rect = Rect { x: 2, y: 2, width: 3, height: 1 };
        assert!(contains(rect, 2, 2));
        assert!(contains(rect, 4, 2));
        assert!(!contains(rect, 5, 2));
        assert!(!contains(rect, 2, 3));
    }

    #[test]
    fn editing_updates_selected_field() {
        let mut app = Dashboard::new(BackendClient::new("http://127.0.0.1:9"), SummaryForm::default());
        app.handle_key(KeyCode::Down);
        assert_eq!(app.current_field(), Field::StartDate);
        app.handle_key(KeyCode::Enter);
        for c in "2024-01-02".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        assert_eq!(app.handle_key(KeyCode::Enter), KeyOutcome::Continue);
        assert_eq!(app.form.start_date, "2024-01-02");
        assert_eq!(app.handle_key(KeyCode::Char('s')), KeyOutcome::Submit);
    }
}
