use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use medal_terminal::config::AppConfig;
use medal_terminal::logging;
use medal_terminal::medal::{MedalKind, RankedMedalRecord};
use medal_terminal::medals_fetch::MedalsSource;
use medal_terminal::provider;
use medal_terminal::query_store::FileQueryStore;
use medal_terminal::sort_state::{Column, ColumnHeader, SortDirection};
use medal_terminal::state::{AppState, DataStatus, Delta, ProviderCommand, apply_delta};

const BRONZE: Color = Color::Rgb(205, 127, 50);

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(state: AppState, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => self.state.focus_next_column(),
            KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => {
                self.state.focus_prev_column()
            }
            KeyCode::Char('s') | KeyCode::Enter => self.state.progress_focused_sort(),
            KeyCode::Char('a') => self.state.sort_focused(SortDirection::Asc),
            KeyCode::Char('d') => self.state.sort_focused(SortDirection::Desc),
            KeyCode::Char('c') | KeyCode::Backspace => self.state.clear_sort(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.request_fetch(ProviderCommand::Retry, true)
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn request_fetch(&mut self, cmd: ProviderCommand, announce: bool) {
        let Some(tx) = &self.cmd_tx else {
            if announce {
                self.state.push_log("[INFO] Medals fetch unavailable");
            }
            return;
        };
        if !self.state.begin_fetch() {
            if announce {
                self.state.push_log("[INFO] Fetch already in progress");
            }
            return;
        }
        if tx.send(cmd).is_err() {
            apply_delta(
                &mut self.state,
                Delta::FetchFailed("medals provider stopped".to_string()),
            );
        } else if announce {
            self.state.push_log("[INFO] Medals request sent");
        }
    }

    fn maybe_refresh(&mut self) {
        if self.state.needs_refresh(Instant::now()) {
            self.request_fetch(ProviderCommand::FetchMedals, false);
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env();
    let log_init = logging::init(&config.log_filter);

    let mut store = FileQueryStore::in_cache_dir();
    if let Some(query) = config.query.as_deref() {
        if let Err(err) = store.seed(query) {
            tracing::warn!("failed to seed view query: {err:#}");
        }
    }

    let source = MedalsSource::from_config(&config);
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let _provider = provider::spawn_medals_provider(source, tx, cmd_rx);

    let state = AppState::new(Box::new(store), config.source, config.stale_after);
    let mut app = App::new(state, Some(cmd_tx));
    if let Err(err) = log_init {
        app.state.push_log(format!("[WARN] Logging disabled: {err}"));
    }
    app.request_fetch(ProviderCommand::FetchMedals, false);

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend).context("create terminal")?;

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("terminal loop failed: {err}");
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.maybe_refresh();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_summary_cards(frame, chunks[1], &app.state);
    render_grid(frame, chunks[2], &app.state);

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let status = match &state.status {
        DataStatus::Loading if state.standings.is_empty() => "LOADING".to_string(),
        DataStatus::Loading => "REFRESHING".to_string(),
        DataStatus::Ready => match &state.updated_label {
            Some(at) => format!("Updated {at}"),
            None => "READY".to_string(),
        },
        DataStatus::Failed(_) => "FETCH FAILED (r to retry)".to_string(),
    };
    let line1 = "  .-.".to_string();
    let line2 = format!(
        " ( * )  OLYMPICS MEDAL TABLE | {} | Total Countries: {} | {}",
        state.source.label(),
        state.standings.country_count(),
        status
    );
    let line3 = "  '-'".to_string();
    format!("{line1}\n{line2}\n{line3}")
}

fn footer_text(state: &AppState) -> String {
    let keys = "j/k Move | h/l Column | Enter/s Sort | a/d Asc/Desc | c Clear | r Retry | ? Help | q Quit";
    let last = state.logs.back().map(String::as_str).unwrap_or("");
    format!("{keys}\n{} {last}", state.sort.describe())
}

fn medal_color(kind: Option<MedalKind>) -> Color {
    match kind {
        Some(MedalKind::Gold) => Color::Yellow,
        Some(MedalKind::Silver) => Color::Gray,
        Some(MedalKind::Bronze) => BRONZE,
        None => Color::White,
    }
}

fn render_summary_cards(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4])
        .split(area);

    let totals = state.standings.totals;
    let cards = [
        ("Gold", totals.gold, Some(MedalKind::Gold), "Total Medals"),
        ("Silver", totals.silver, Some(MedalKind::Silver), "Total Medals"),
        ("Bronze", totals.bronze, Some(MedalKind::Bronze), "Total Medals"),
        ("Total", totals.total, None, "All Medals"),
    ];

    for (idx, (label, count, kind, caption)) in cards.into_iter().enumerate() {
        let color = medal_color(kind);
        let title = match kind {
            Some(_) => format!("● {label}"),
            None => label.to_string(),
        };
        let text = vec![
            Line::from(Span::styled(
                count.to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(caption, Style::default().fg(Color::DarkGray))),
        ];
        let card = Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(title, Style::default().fg(color)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
        frame.render_widget(card, cols[idx]);
    }
}

fn grid_columns() -> [Constraint; 6] {
    [
        Constraint::Length(8),
        Constraint::Min(12),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
    ]
}

fn render_grid(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let widths = grid_columns();
    render_grid_header(frame, sections[0], &widths, state);

    let list_area = sections[1];
    let rows = state.display_rows();
    if rows.is_empty() {
        render_placeholder(frame, list_area, state);
        return;
    }
    if list_area.height == 0 {
        return;
    }

    let visible = list_area.height as usize;
    let (start, end) = visible_range(state.selected, rows.len(), visible);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };

        let row = rows[idx];
        let selected = idx == state.selected;
        let row_style = row_style(row, selected);
        if selected {
            frame.render_widget(Block::default().style(row_style), row_area);
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        render_cell_text(frame, cols[0], &format!("#{}", row.rank), row_style, Alignment::Center);
        render_cell_text(frame, cols[1], &row.code, row_style.add_modifier(Modifier::BOLD), Alignment::Left);
        render_cell_text(frame, cols[2], &row.gold.to_string(), row_style, Alignment::Center);
        render_cell_text(frame, cols[3], &row.silver.to_string(), row_style, Alignment::Center);
        render_cell_text(frame, cols[4], &row.bronze.to_string(), row_style, Alignment::Center);
        render_cell_text(frame, cols[5], &row.total.to_string(), row_style, Alignment::Center);
    }
}

fn row_style(row: &RankedMedalRecord, selected: bool) -> Style {
    let base = match row.rank {
        1 => Style::default().fg(Color::Yellow),
        2 => Style::default().fg(Color::Gray),
        3 => Style::default().fg(BRONZE),
        _ => Style::default(),
    };
    if selected {
        base.bg(Color::DarkGray)
    } else {
        base
    }
}

fn render_grid_header(frame: &mut Frame, area: Rect, widths: &[Constraint], state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths.iter().copied())
        .split(area);

    for (idx, header) in state.sort.columns().iter().enumerate() {
        let mut style = Style::default().add_modifier(Modifier::BOLD);
        if !header.sortable {
            style = style.fg(Color::DarkGray);
        } else if header.medal.is_some() {
            style = style.fg(medal_color(header.medal));
        }
        if header.column == state.focused_column {
            style = style.add_modifier(Modifier::REVERSED);
        }
        let align = if header.column == Column::Code {
            Alignment::Left
        } else {
            Alignment::Center
        };
        render_cell_text(frame, cols[idx], &header_label(header), style, align);
    }
}

fn header_label(header: &ColumnHeader) -> String {
    let icon = if header.medal.is_some() { "● " } else { "" };
    match header.sort {
        Some(dir) => format!("{icon}{} {}", header.label, dir.arrow()),
        None => format!("{icon}{}", header.label),
    }
}

fn render_placeholder(frame: &mut Frame, area: Rect, state: &AppState) {
    let (text, style) = match &state.status {
        DataStatus::Loading => (
            "Loading Olympics Data\nPreparing the medal standings...".to_string(),
            Style::default().fg(Color::Cyan),
        ),
        DataStatus::Failed(message) => (
            format!("Could not load medal standings\n{message}\nPress r to retry"),
            Style::default().fg(Color::Red),
        ),
        DataStatus::Ready => (
            "No countries in this dataset".to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    };
    let paragraph = Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center);
    let inner = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(3) / 2,
        width: area.width,
        height: area.height.min(3),
    };
    frame.render_widget(paragraph, inner);
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style, align: Alignment) {
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: 1,
    };
    let paragraph = Paragraph::new(text).style(style).alignment(align);
    frame.render_widget(paragraph, text_area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Olympics Medal Table - Help",
        "",
        "Rows:",
        "  j/k or ↑/↓        Move selection",
        "",
        "Sorting:",
        "  h/l, ←/→, Tab     Focus column",
        "  Enter / s         Cycle sort (asc, desc, Olympic order)",
        "  a / d             Sort focused column asc / desc",
        "  c / Backspace     Back to Olympic order",
        "  Rank is fixed by Olympic standing and cannot be sorted",
        "",
        "Data:",
        "  r                 Retry / refresh medals",
        "  ?                 Toggle help",
        "  q                 Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
