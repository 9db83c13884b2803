use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use map_markers::{
    ExportFormat, FilterForm, HeadlessController, InfoCard, LatLng, MarkerEdit,
    HIGHLIGHT_DURATION_MS,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

/// Text prompts opened from the marker list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Search,
    Filter,
    Radius,
    Edit,
    Import,
    Export,
}

impl Prompt {
    pub fn label(&self) -> &'static str {
        match self {
            Prompt::Search => "Search address",
            Prompt::Filter => "Filter lat,lng,km",
            Prompt::Radius => "Circle radius (km)",
            Prompt::Edit => "Edit title|address|avatarUrl",
            Prompt::Import => "Import JSON file",
            Prompt::Export => "Export json|csv|geojson [file]",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    pub controller: HeadlessController,
    pub state: TableState,
    pub show_detail: bool,
    pub prompt: Option<Prompt>,
    pub input: String,
    pub status: Option<StatusMessage>,
    pub circle_in_meters: bool,
}

impl App {
    pub fn new(controller: HeadlessController) -> Self {
        let mut state = TableState::default();
        if !controller.registry().is_empty() {
            state.select(Some(0));
        }

        Self {
            controller,
            state,
            show_detail: false,
            prompt: None,
            input: String::new(),
            status: None,
            circle_in_meters: false,
        }
    }

    pub fn len(&self) -> usize {
        self.controller.registry().len()
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.selected().filter(|i| *i < self.len())
    }

    fn notify(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    fn fail(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    /// Keep the selection inside the list after it shrank or grew.
    fn clamp_selection(&mut self) {
        let len = self.len();
        let selected = match self.state.selected() {
            _ if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            None => Some(0),
            other => other,
        };
        self.state.select(selected);
    }

    pub fn next(&mut self) {
        let len = self.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn open_prompt(&mut self, prompt: Prompt, initial: String) {
        self.prompt = Some(prompt);
        self.input = initial;
    }

    /// Returns `true` when the app should quit.
    pub fn handle_key(&mut self, code: KeyCode, now: DateTime<Utc>) -> bool {
        if let Some(prompt) = self.prompt {
            match code {
                KeyCode::Esc => {
                    self.prompt = None;
                    self.input.clear();
                }
                KeyCode::Enter => {
                    self.prompt = None;
                    let input = std::mem::take(&mut self.input);
                    self.submit_prompt(prompt, &input);
                }
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) => self.input.push(c),
                _ => {}
            }
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Enter => self.show_detail = !self.show_detail,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => self.state.select(Some(0)),
            KeyCode::End => {
                if self.len() > 0 {
                    self.state.select(Some(self.len() - 1));
                }
            }
            KeyCode::Char('u') => {
                let show = !self.controller.toggles().show_users;
                self.controller.set_show_users(show);
            }
            KeyCode::Char('c') => {
                let show = !self.controller.toggles().show_companies;
                self.controller.set_show_companies(show);
            }
            KeyCode::Char(' ') => {
                if let Some(i) = self.selected() {
                    let visible = self.controller.markers()[i].visible;
                    self.controller.set_marker_visible(i, !visible);
                }
            }
            KeyCode::Char('d') => {
                if let Some(i) = self.selected() {
                    self.controller.delete_marker(i);
                    self.clamp_selection();
                }
            }
            KeyCode::Char('z') => {
                if let Some(i) = self.selected() {
                    self.controller.zoom_to(i, now);
                }
            }
            KeyCode::Char('Z') => {
                if let Some(i) = self.selected() {
                    self.controller.zoom_close(i);
                }
            }
            KeyCode::Char('f') => {
                if self.controller.fit().is_none() {
                    self.fail("No visible markers to fit");
                }
            }
            KeyCode::Char('o') => self.toggle_circle(),
            KeyCode::Char('m') => self.circle_in_meters = !self.circle_in_meters,
            KeyCode::Char('s') => match self.controller.save_project() {
                Ok(count) => self.notify(format!("Project saved ({} markers)", count)),
                Err(err) => self.fail(format!("Failed to save project: {}", err)),
            },
            KeyCode::Char('l') => {
                match self.controller.load_project() {
                    Ok(report) => self.notify(format!("Project loaded: {}", report.summary())),
                    Err(err) => self.fail(err.to_string()),
                }
                self.clamp_selection();
            }
            KeyCode::Char('/') => self.open_prompt(Prompt::Search, String::new()),
            KeyCode::Char('r') => self.open_prompt(Prompt::Filter, String::new()),
            KeyCode::Char('R') => {
                if self.controller.filter_circle().is_some() {
                    self.open_prompt(Prompt::Radius, String::new());
                } else {
                    self.fail("No filter circle");
                }
            }
            KeyCode::Char('e') => {
                if let Some(initial) = self.edit_template() {
                    self.open_prompt(Prompt::Edit, initial);
                }
            }
            KeyCode::Char('i') => self.open_prompt(Prompt::Import, String::new()),
            KeyCode::Char('x') => self.open_prompt(Prompt::Export, "json".to_string()),
            _ => {}
        }
        false
    }

    /// Same button places and removes the circle. A new circle is centred
    /// on the selected marker.
    fn toggle_circle(&mut self) {
        if self.controller.remove_circle() {
            self.notify("Filter circle removed");
            return;
        }
        let center = self
            .selected()
            .map(|i| self.controller.markers()[i].position)
            .unwrap_or_else(|| LatLng::new(0.0, 0.0));
        self.controller.place_circle(center);
        self.notify("Filter circle placed");
    }

    fn edit_template(&self) -> Option<String> {
        let registry = self.controller.registry();
        let id = registry.marker_id_at(self.selected()?)?;
        let title = registry.get(id)?.title.clone().unwrap_or_default();
        let meta = registry.get_marker_meta(id)?;
        Some(format!(
            "{}|{}|{}",
            title,
            meta.address.as_deref().unwrap_or(""),
            meta.avatar_url.as_deref().unwrap_or("")
        ))
    }

    fn submit_prompt(&mut self, prompt: Prompt, input: &str) {
        match prompt {
            Prompt::Search => match self.controller.search(input) {
                Ok(id) => {
                    self.notify(format!("Added {} for {:?}", id, input.trim()));
                    self.state.select(Some(self.len() - 1));
                }
                Err(err) => self.fail(err.to_string()),
            },
            Prompt::Filter => {
                let mut parts = input.split(',').map(str::to_string);
                let form = FilterForm {
                    lat: parts.next().unwrap_or_default(),
                    lng: parts.next().unwrap_or_default(),
                    km: parts.next().unwrap_or_default(),
                };
                match self.controller.apply_filter_form(&form) {
                    Ok(()) => self.notify("Distance filter applied"),
                    Err(err) => self.fail(err.to_string()),
                }
            }
            Prompt::Radius => match self.controller.set_circle_radius_input(input) {
                Ok(Some(_)) => {}
                Ok(None) => self.fail("No filter circle"),
                Err(err) => self.fail(err.to_string()),
            },
            Prompt::Edit => {
                let Some(i) = self.selected() else { return };
                let mut parts = input.splitn(3, '|').map(|s| s.trim().to_string());
                let edit = MarkerEdit {
                    title: parts.next().unwrap_or_default(),
                    address: parts.next().unwrap_or_default(),
                    avatar_url: parts.next().unwrap_or_default(),
                };
                if self.controller.edit_marker(i, edit) {
                    self.notify("Marker updated");
                }
            }
            Prompt::Import => {
                let path = input.trim();
                let text = match std::fs::read_to_string(path) {
                    Ok(text) => text,
                    Err(err) => return self.fail(format!("Failed to read {}: {}", path, err)),
                };
                match self.controller.import(&text) {
                    Ok(report) => self.notify(report.summary()),
                    Err(err) => self.fail(err.to_string()),
                }
                self.clamp_selection();
            }
            Prompt::Export => {
                let mut parts = input.split_whitespace();
                let format = match parts.next().unwrap_or("json").parse::<ExportFormat>() {
                    Ok(format) => format,
                    Err(err) => return self.fail(err.to_string()),
                };
                let path = parts.next().unwrap_or(format.file_name()).to_string();
                let written = self
                    .controller
                    .export(format)
                    .and_then(|body| Ok(std::fs::write(&path, body)?));
                match written {
                    Ok(()) => self.notify(format!("Exported to {}", path)),
                    Err(err) => self.fail(format!("Export failed: {}", err)),
                }
            }
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    // Short poll so bounce highlights expire without a key press
    let tick = Duration::from_millis((HIGHLIGHT_DURATION_MS / 7) as u64);

    loop {
        app.controller.tick(Utc::now());
        terminal.draw(|f| ui(f, app))?;

        if !event::poll(tick)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key.code, Utc::now()) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Toggles + counts
            Constraint::Min(0),    // Marker list
            Constraint::Length(3), // Status / prompt
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn checkbox(on: bool) -> &'static str {
    if on {
        "[x]"
    } else {
        "[ ]"
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let toggles = app.controller.toggles();
    let registry = app.controller.registry();
    let key = Style::default().fg(Color::Yellow);

    let mut spans = vec![
        Span::styled(format!("{} ", checkbox(toggles.show_users)), Style::default().fg(Color::Blue)),
        Span::raw("Users ("),
        Span::styled("u", key),
        Span::raw(")  "),
        Span::styled(format!("{} ", checkbox(toggles.show_companies)), Style::default().fg(Color::Red)),
        Span::raw("Companies ("),
        Span::styled("c", key),
        Span::raw(")  |  "),
        Span::styled(
            format!("Markers: {} ({} visible)", registry.len(), registry.visible_count()),
            Style::default().fg(Color::White),
        ),
    ];

    if let Some(readout) = app.controller.circle_readout(app.circle_in_meters) {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("◯ Circle {}", readout),
            Style::default().fg(Color::Green),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Map Markers "),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["#", "Title", "Type", "Lat", "Lng", "Visible"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let registry = app.controller.registry();
    let rows: Vec<Row> = registry
        .records_in_order()
        .enumerate()
        .map(|(i, record)| {
            let color = match record.kind {
                map_markers::EntityKind::User => Color::Blue,
                map_markers::EntityKind::Company => Color::Red,
            };
            let mut title = truncate(record.title.as_deref().unwrap_or("Unnamed"), 28);
            if registry.is_highlighted(record.id) {
                title.push_str(" ✦");
            }
            let row_style = if record.visible {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };

            Row::new(vec![
                Cell::from((i + 1).to_string()),
                Cell::from(title),
                Cell::from(record.kind.as_str()).style(Style::default().fg(color)),
                Cell::from(format!("{:.3}", record.position.lat)),
                Cell::from(format!("{:.3}", record.position.lng)),
                Cell::from(checkbox(record.visible)),
            ])
            .style(row_style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(32),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Markers "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Info card ");

    let registry = app.controller.registry();
    let Some(id) = app.selected().and_then(|i| registry.marker_id_at(i)) else {
        f.render_widget(Paragraph::new("No marker selected").block(block), area);
        return;
    };
    let Some(record) = registry.get(id) else {
        return;
    };

    let label = Style::default().fg(Color::Yellow);
    let card = app.selected().and_then(|i| app.controller.info_card(i));
    let title = card
        .as_ref()
        .map(|c| c.title.clone())
        .unwrap_or_else(|| "Unnamed".to_string());

    let mut content = vec![
        Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
    ];
    for (name, value) in card_fields(card.as_ref()) {
        content.push(Line::from(vec![Span::styled(name, label), Span::raw(value)]));
    }
    content.push(Line::from(""));
    content.push(Line::from(vec![
        Span::styled("Type:    ", label),
        Span::raw(record.kind.as_str()),
    ]));
    content.push(Line::from(vec![
        Span::styled("Visible: ", label),
        Span::raw(if record.visible { "yes" } else { "no" }),
    ]));
    content.push(Line::from(vec![Span::styled("Marker:  ", label), Span::raw(id.to_string())]));
    if card.as_ref().is_some_and(|c| !c.is_title_only()) {
        content.push(Line::from(""));
        content.push(Line::from(vec![Span::styled("[Z]", label), Span::raw(" Zoom")]));
    }

    f.render_widget(Paragraph::new(content).block(block), area);
}

/// Labelled rows of a marker's info card. Title-only cards have none.
fn card_fields(card: Option<&InfoCard>) -> Vec<(&'static str, String)> {
    let Some(card) = card.filter(|c| !c.is_title_only()) else {
        return Vec::new();
    };
    vec![
        ("Address: ", card.address.clone().unwrap_or_default()),
        ("Avatar:  ", card.avatar_url.clone().unwrap_or_default()),
        ("Coords:  ", card.coordinates_label().unwrap_or_default()),
    ]
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = Style::default().fg(Color::Yellow);

    let line = if let Some(prompt) = app.prompt {
        Line::from(vec![
            Span::styled(format!(" {}: ", prompt.label()), key),
            Span::raw(app.input.clone()),
            Span::styled("█", Style::default().fg(Color::White)),
        ])
    } else if let Some(status) = &app.status {
        let color = if status.is_error { Color::Red } else { Color::Green };
        Line::from(Span::styled(format!(" {}", status.text), Style::default().fg(color)))
    } else {
        let mut spans = Vec::new();
        for (k, action) in [
            ("Space", "Show"),
            ("d", "Delete"),
            ("z/Z", "Zoom"),
            ("f", "Fit"),
            ("e", "Edit"),
            ("/", "Search"),
            ("r", "Filter"),
            ("o", "Circle"),
            ("i/x", "Import/Export"),
            ("s/l", "Save/Load"),
            ("q", "Quit"),
        ] {
            spans.push(Span::styled(format!(" {}", k), key));
            spans.push(Span::raw(format!(" {} |", action)));
        }
        Line::from(spans)
    };

    let status_bar = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_markers::{
        HeadlessClusterer, HeadlessMap, MapConfig, MapController, MarkerRegistry, MemoryStore,
        StaticGeocoder,
    };

    fn app() -> App {
        let registry = MarkerRegistry::new(
            HeadlessMap::mount(&MapConfig::default()).unwrap(),
            HeadlessClusterer::new(),
        );
        let mut controller = MapController::new(registry, Box::new(MemoryStore::new()))
            .with_geocoder(Box::new(StaticGeocoder::with_defaults()));
        controller.seed_demo();
        App::new(controller)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c), Utc::now());
        }
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = app();
        assert_eq!(app.selected(), Some(0));
        app.previous();
        assert_eq!(app.selected(), Some(1));
        app.next();
        assert_eq!(app.selected(), Some(0));
    }

    #[test]
    fn test_toggle_and_delete_keys() {
        let mut app = app();
        app.handle_key(KeyCode::Char('u'), Utc::now());
        assert!(!app.controller.toggles().show_users);
        assert_eq!(app.controller.registry().visible_count(), 1);

        app.handle_key(KeyCode::End, Utc::now());
        app.handle_key(KeyCode::Char('d'), Utc::now());
        assert_eq!(app.len(), 1);
        assert_eq!(app.selected(), Some(0));
    }

    #[test]
    fn test_search_prompt() {
        let mut app = app();
        app.handle_key(KeyCode::Char('/'), Utc::now());
        assert_eq!(app.prompt, Some(Prompt::Search));

        type_text(&mut app, "tokyo");
        app.handle_key(KeyCode::Enter, Utc::now());

        assert_eq!(app.prompt, None);
        assert_eq!(app.len(), 3);
        assert_eq!(app.selected(), Some(2));
        assert!(!app.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn test_filter_prompt_reports_bad_input() {
        let mut app = app();
        app.handle_key(KeyCode::Char('r'), Utc::now());
        type_text(&mut app, "0,0,far");
        app.handle_key(KeyCode::Enter, Utc::now());

        let status = app.status.clone().unwrap();
        assert!(status.is_error);
        assert!(status.text.contains("km"));
    }

    #[test]
    fn test_edit_prompt_prefills() {
        let mut app = app();
        app.handle_key(KeyCode::Char('e'), Utc::now());
        assert_eq!(app.prompt, Some(Prompt::Edit));
        assert!(app.input.starts_with("John Doe|"));

        app.input = "Jane|1 Main St|".to_string();
        app.handle_key(KeyCode::Enter, Utc::now());

        assert_eq!(app.controller.markers()[0].title.as_deref(), Some("Jane"));
    }

    #[test]
    fn test_circle_toggle() {
        let mut app = app();
        app.handle_key(KeyCode::Char('o'), Utc::now());
        assert!(app.controller.filter_circle().is_some());
        app.handle_key(KeyCode::Char('o'), Utc::now());
        assert!(app.controller.filter_circle().is_none());
    }

    #[test]
    fn test_card_zoom_key() {
        let mut app = app();
        let edit = MarkerEdit {
            title: String::new(),
            address: "Pier 9".to_string(),
            avatar_url: String::new(),
        };
        app.controller.edit_marker(1, edit);
        app.handle_key(KeyCode::End, Utc::now());
        app.handle_key(KeyCode::Char('Z'), Utc::now());

        let surface = app.controller.registry().surface();
        assert_eq!(surface.zoom, 12);

        let card = app.controller.info_card(1);
        let fields = card_fields(card.as_ref());
        assert_eq!(fields[0], ("Address: ", "Pier 9".to_string()));
        assert_eq!(fields[2].1, "(0.000, 0.000)");
        assert!(card_fields(Some(&InfoCard::title_only("Depot"))).is_empty());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long marker title", 10), "a very ...");
    }
}
