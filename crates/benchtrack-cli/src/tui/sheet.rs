//! Interactive tracking sheet.
//!
//! One tab per board, one row per benchmark in schema order. Key bindings:
//! ←/→/Tab switch boards, ↑/↓/j/k move, s/f cycle the small/fast slot,
//! n edit the note, e export, i import, q quit.

use anyhow::Result;
use benchtrack_core::storage::{FileStorage, Persistence};
use benchtrack_core::transfer::{export_snapshot_now, import_snapshot, write_snapshot};
use benchtrack_core::{SaveOutcome, Slot, Status, Store, summarize_board};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Tabs},
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Note,
    ImportPath,
}

pub struct SheetView<P: Persistence> {
    store: Store<P>,
    export_dir: PathBuf,
    board_idx: usize,
    table_state: TableState,
    input_mode: InputMode,
    input_buf: String,
    status_msg: Option<(String, Instant)>,
    should_quit: bool,
}

impl<P: Persistence> SheetView<P> {
    pub fn new(store: Store<P>, export_dir: PathBuf) -> Self {
        let mut table_state = TableState::default();
        if !store.schema().rows().is_empty() {
            table_state.select(Some(0));
        }
        Self {
            store,
            export_dir,
            board_idx: 0,
            table_state,
            input_mode: InputMode::Normal,
            input_buf: String::new(),
            status_msg: None,
            should_quit: false,
        }
    }

    fn board(&self) -> &str {
        self.store
            .schema()
            .boards()
            .get(self.board_idx)
            .map_or("", String::as_str)
    }

    fn selected_key(&self) -> Option<String> {
        let idx = self.table_state.selected()?;
        self.store.schema().rows().get(idx).map(|row| row.key.clone())
    }

    fn set_status_msg(&mut self, msg: impl Into<String>) {
        self.status_msg = Some((msg.into(), Instant::now()));
    }

    fn note_save(&mut self, outcome: &SaveOutcome, done: String) {
        match outcome.warning() {
            None => self.set_status_msg(done),
            Some(err) => self.set_status_msg(format!("{done} (not saved: {err})")),
        }
    }

    fn switch_board(&mut self, forward: bool) {
        let count = self.store.schema().boards().len();
        if count == 0 {
            return;
        }
        self.board_idx = if forward {
            (self.board_idx + 1) % count
        } else {
            (self.board_idx + count - 1) % count
        };
    }

    fn move_selection(&mut self, down: bool) {
        let count = self.store.schema().rows().len();
        if count == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = if down {
            (current + 1).min(count - 1)
        } else {
            current.saturating_sub(1)
        };
        self.table_state.select(Some(next));
    }

    fn cycle(&mut self, slot: Slot) {
        let Some(key) = self.selected_key() else {
            return;
        };
        let board = self.board().to_string();
        match self.store.cycle_status(&board, &key, slot) {
            Ok((status, outcome)) => {
                self.note_save(&outcome, format!("{key} [{slot}] → {status}"));
            }
            Err(err) => self.set_status_msg(format!("error: {err}")),
        }
    }

    fn begin_note(&mut self) {
        let Some(key) = self.selected_key() else {
            return;
        };
        self.input_buf = self
            .store
            .cell(self.board(), &key)
            .map(|cell| cell.notes.clone())
            .unwrap_or_default();
        self.input_mode = InputMode::Note;
    }

    fn commit_note(&mut self) {
        self.input_mode = InputMode::Normal;
        let Some(key) = self.selected_key() else {
            return;
        };
        let board = self.board().to_string();
        let text = std::mem::take(&mut self.input_buf);
        match self.store.set_note(&board, &key, text) {
            Ok(outcome) => self.note_save(&outcome, format!("note saved for {key}")),
            Err(err) => self.set_status_msg(format!("error: {err}")),
        }
    }

    fn export(&mut self) {
        let written = export_snapshot_now(self.store.table())
            .map_err(anyhow::Error::from)
            .and_then(|snapshot| Ok(write_snapshot(&snapshot, &self.export_dir)?));
        match written {
            Ok(path) => self.set_status_msg(format!("exported to {}", path.display())),
            Err(err) => self.set_status_msg(format!("export failed: {err}")),
        }
    }

    fn import(&mut self) {
        self.input_mode = InputMode::Normal;
        let path = PathBuf::from(std::mem::take(&mut self.input_buf).trim());
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.set_status_msg(format!("import failed: {}: {err}", path.display()));
                return;
            }
        };
        match import_snapshot(self.store.schema(), &bytes) {
            Ok((table, report)) => {
                let outcome = self.store.replace_all(table);
                let done = format!(
                    "imported {}: {} restored, {} dropped",
                    path.display(),
                    report.restored,
                    report.dropped_boards.len() + report.dropped_keys.len()
                );
                self.note_save(&outcome, done);
            }
            Err(err) => self.set_status_msg(format!("import failed, nothing changed: {err}")),
        }
    }

    /// Apply one key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match self.input_mode {
            InputMode::Note | InputMode::ImportPath => match key.code {
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    self.input_buf.clear();
                }
                KeyCode::Enter if self.input_mode == InputMode::Note => self.commit_note(),
                KeyCode::Enter => self.import(),
                KeyCode::Backspace => {
                    self.input_buf.pop();
                }
                KeyCode::Char(c) => self.input_buf.push(c),
                _ => {}
            },
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('c') if ctrl => self.should_quit = true,
                KeyCode::Right | KeyCode::Tab => self.switch_board(true),
                KeyCode::Left | KeyCode::BackTab => self.switch_board(false),
                KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
                KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
                KeyCode::Char('s') => self.cycle(Slot::Small),
                KeyCode::Char('f') => self.cycle(Slot::Fast),
                KeyCode::Char('n') => self.begin_note(),
                KeyCode::Char('e') => self.export(),
                KeyCode::Char('i') => {
                    self.input_buf.clear();
                    self.input_mode = InputMode::ImportPath;
                }
                _ => {}
            },
        }
    }
}

/// Run the sheet until the user quits.
///
/// # Errors
///
/// Returns an error if drawing or reading terminal events fails.
pub fn run_sheet_tui(store: Store<FileStorage>, export_dir: PathBuf) -> Result<()> {
    let mut view = SheetView::new(store, export_dir);
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut view);
    ratatui::restore();
    result
}

fn event_loop<P: Persistence>(terminal: &mut DefaultTerminal, view: &mut SheetView<P>) -> Result<()> {
    while !view.should_quit {
        terminal.draw(|frame| render_sheet(frame, view))?;
        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                view.handle_key(key);
            }
        }
    }
    Ok(())
}

const fn status_color(status: Status) -> Color {
    let (r, g, b) = status.rgb();
    Color::Rgb(r, g, b)
}

fn status_cell(status: Status) -> Cell<'static> {
    Cell::from(status.label()).style(Style::default().fg(Color::Black).bg(status_color(status)))
}

fn render_sheet<P: Persistence>(frame: &mut Frame<'_>, view: &mut SheetView<P>) {
    let editing = view.input_mode != InputMode::Normal;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(if editing { 3 } else { 0 }),
            Constraint::Length(2),
        ])
        .split(frame.area());

    render_tabs(frame, view, chunks[0]);
    render_table(frame, view, chunks[1]);
    if editing {
        render_input(frame, view, chunks[2]);
    }
    render_footer(frame, view, chunks[3]);
}

fn render_tabs<P: Persistence>(frame: &mut Frame<'_>, view: &SheetView<P>, area: Rect) {
    let titles: Vec<Line<'_>> = view
        .store
        .schema()
        .boards()
        .iter()
        .map(|board| Line::from(board.as_str()))
        .collect();
    let tabs = Tabs::new(titles)
        .select(view.board_idx)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_set(border::ROUNDED)
                .title(" benchtrack "),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

fn render_table<P: Persistence>(frame: &mut Frame<'_>, view: &mut SheetView<P>, area: Rect) {
    let board = view.board().to_string();
    let rows: Vec<Row<'static>> = view
        .store
        .schema()
        .rows()
        .iter()
        .map(|row| {
            let cell = view.store.cell(&board, &row.key).ok();
            let category = if row.opens_category {
                row.category.clone()
            } else {
                String::new()
            };
            let variant = if row.single_variant {
                String::new()
            } else {
                row.variant.clone()
            };
            Row::new(vec![
                Cell::from(category).style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(variant),
                status_cell(cell.map_or(Status::NotStarted, |c| c.small)),
                status_cell(cell.map_or(Status::NotStarted, |c| c.fast)),
                Cell::from(cell.map(|c| c.notes.clone()).unwrap_or_default()),
            ])
        })
        .collect();

    let summary = summarize_board(view.store.table(), &board);
    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(22),
            Constraint::Length(15),
            Constraint::Length(15),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["Benchmark", "Variant", "Small", "Fast", "Notes"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(Color::Green))
            .title(format!(" {board}: {}% complete ", summary.percent_complete)),
    )
    .row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut view.table_state);
}

fn render_input<P: Persistence>(frame: &mut Frame<'_>, view: &SheetView<P>, area: Rect) {
    let title = match view.input_mode {
        InputMode::Note => " note (Enter save, Esc cancel) ",
        _ => " import file (Enter import, Esc cancel) ",
    };
    let input = Paragraph::new(format!("{}▏", view.input_buf)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title),
    );
    frame.render_widget(input, area);
}

fn render_footer<P: Persistence>(frame: &mut Frame<'_>, view: &SheetView<P>, area: Rect) {
    let summary = view.store.summary();
    let mut spans: Vec<Span<'static>> = Vec::new();
    for status in Status::ALL {
        spans.push(Span::styled(
            format!(" {}: {} ", status.label(), summary.count(status)),
            Style::default().fg(Color::Black).bg(status_color(status)),
        ));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(
        format!("{}% complete", summary.percent_complete),
        Style::default().add_modifier(Modifier::BOLD),
    ));

    let dim = Style::default().fg(Color::DarkGray);
    let second = match view.status_msg {
        Some((ref msg, at)) if at.elapsed() < Duration::from_secs(5) => {
            Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Cyan)))
        }
        _ => Line::from(Span::styled(
            "←/→ board  ↑/↓ row  s/f cycle  n note  e export  i import  q quit",
            dim,
        )),
    };

    frame.render_widget(Paragraph::new(vec![Line::from(spans), second]), area);
}
