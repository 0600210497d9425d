use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
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
use std::path::PathBuf;
use student_roster::{
    format_amount, keeps_form, DocumentReader, DocumentSource, RosterSession, SortKey, Student,
    StudentForm,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Search,
    AddForm,
}

impl Mode {
    pub fn title(&self) -> &str {
        match self {
            Mode::Browse => "Browse",
            Mode::Search => "Search",
            Mode::AddForm => "Add Student",
        }
    }
}

pub struct App {
    pub session: RosterSession,
    pub state: TableState,
    pub mode: Mode,
    pub form: StudentForm,
    pub form_field: usize,
    pub show_detail: bool,
    pub export_dir: PathBuf,
    source: Box<dyn DocumentSource>,
    reader: Box<dyn DocumentReader>,
}

impl App {
    pub fn new(
        session: RosterSession,
        source: Box<dyn DocumentSource>,
        reader: Box<dyn DocumentReader>,
        export_dir: PathBuf,
    ) -> Self {
        let mut app = Self {
            session,
            state: TableState::default(),
            mode: Mode::Browse,
            form: StudentForm::default(),
            form_field: 0,
            show_detail: false,
            export_dir,
            source,
            reader,
        };
        app.reset_selection();
        app
    }

    fn reset_selection(&mut self) {
        if self.session.visible().is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn selected_student(&self) -> Option<&Student> {
        let rows = self.session.visible();
        self.state.selected().and_then(|i| rows.get(i).copied())
    }

    pub fn reload(&mut self) {
        // the session keeps the failure in its status line
        let _ = self.session.load(self.source.as_ref(), self.reader.as_ref());
        self.reset_selection();
    }

    pub fn export(&mut self) {
        let export = self.session.export();
        let path = self.export_dir.join(export.filename);
        if let Err(e) = std::fs::write(&path, export.document) {
            tracing::warn!(path = %path.display(), error = %e, "export write failed");
            self.session
                .set_status(format!("Failed to export to {}: {}.", path.display(), e));
        }
    }

    pub fn submit_form(&mut self) {
        match self.session.add(&self.form) {
            Ok(_) => {
                self.form.clear();
                self.form_field = 0;
                self.mode = Mode::Browse;
                self.reset_selection();
            }
            Err(err) if keeps_form(&err) => {}
            Err(_) => self.mode = Mode::Browse,
        }
    }

    pub fn click_column(&mut self, index: usize) {
        if let Some(key) = SortKey::ALL.get(index) {
            self.session.click_sort(*key);
            self.reset_selection();
        }
    }

    /// Returns true when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            Mode::Browse => return self.handle_browse_key(key),
            Mode::Search => self.handle_search_key(key),
            Mode::AddForm => self.handle_form_key(key),
        }
        false
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Char('a') => self.mode = Mode::AddForm,
            KeyCode::Char('x') => self.export(),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char(c @ '1'..='5') => self.click_column(c as usize - '1' as usize),
            KeyCode::Enter => self.show_detail = !self.show_detail,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => self.reset_selection(),
            KeyCode::End => {
                let len = self.session.visible().len();
                if len > 0 {
                    self.state.select(Some(len - 1));
                }
            }
            _ => {}
        }
        false
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let mut query = self.session.query().to_string();
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.mode = Mode::Browse;
                return;
            }
            KeyCode::Backspace => {
                query.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => query.push(c),
            _ => return,
        }
        self.session.set_query(query);
        self.reset_selection();
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let field_count = SortKey::ALL.len();
        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab | KeyCode::Down => self.form_field = (self.form_field + 1) % field_count,
            KeyCode::BackTab | KeyCode::Up => {
                self.form_field = (self.form_field + field_count - 1) % field_count
            }
            KeyCode::Backspace => {
                self.form.field_mut(SortKey::ALL[self.form_field]).pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.form.field_mut(SortKey::ALL[self.form_field]).push(c);
            }
            _ => {}
        }
    }

    pub fn next(&mut self) {
        let len = self.session.visible().len();
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
        let len = self.session.visible().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.session.visible().len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map_or(0, |i| (i + 20).min(len - 1));
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.session.visible().is_empty() {
            return;
        }
        let i = self.state.selected().map_or(0, |i| i.saturating_sub(20));
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

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
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with search
            Constraint::Min(0),    // Table
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.mode == Mode::AddForm || app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        if app.mode == Mode::AddForm {
            render_form(f, content_chunks[1], app);
        } else {
            render_detail_panel(f, content_chunks[1], app);
        }
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let searching = app.mode == Mode::Search;
    let query_style = if searching {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };

    let spans = vec![
        Span::styled(
            "Student Roster",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Total: {}", app.session.store().len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(format!("Mode: {}", app.mode.title()), Style::default().fg(Color::Cyan)),
        Span::raw("  |  Search: "),
        Span::styled(
            format!("{}{}", app.session.query(), if searching { "_" } else { "" }),
            query_style,
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn header_label(app: &App, index: usize, key: SortKey) -> String {
    let directive = app.session.directive();
    if directive.key == key {
        format!("{} {} {}", index + 1, key.title(), directive.direction.arrow())
    } else {
        format!("{} {}", index + 1, key.title())
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = SortKey::ALL.iter().enumerate().map(|(i, key)| {
        Cell::from(header_label(app, i, *key)).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let visible = app.session.visible();
    let shown = visible.len();
    let rows = visible.into_iter().map(|s| {
        let cells = vec![
            Cell::from(s.identifier.clone()),
            Cell::from(truncate(&s.name, 30)),
            Cell::from(truncate(&s.section, 15)),
            Cell::from(format!("₱{}", format_amount(s.tuition_fee))).style(Style::default().fg(Color::Green)),
            Cell::from(format!("₱{}", format_amount(s.initial_payout))).style(Style::default().fg(Color::Cyan)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(32),
            Constraint::Length(17),
            Constraint::Length(16),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Students ({}) ", shown)),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let mut content = vec![Line::from("")];

    for (i, key) in SortKey::ALL.iter().enumerate() {
        let active = i == app.form_field;
        let label_style = if active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };

        content.push(Line::from(vec![
            Span::raw(if active { "→ " } else { "  " }),
            Span::styled(format!("{}: ", key.title()), label_style),
            Span::raw(app.form.field(*key).to_string()),
            Span::raw(if active { "_" } else { "" }),
        ]));
        content.push(Line::from(""));
    }

    content.push(Line::from(vec![Span::styled(
        "  Tab next field | Enter save | Esc cancel",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )]));

    let form = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Add Student "),
    );

    f.render_widget(form, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Student Details ");

    let s = match app.selected_student() {
        Some(s) => s,
        None => {
            f.render_widget(Paragraph::new("No student selected").block(block), area);
            return;
        }
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let balance = s.tuition_fee - s.initial_payout;

    let content = vec![
        Line::from(""),
        Line::from(vec![Span::styled("  Student ID: ", label), Span::raw(&s.identifier)]),
        Line::from(""),
        Line::from(vec![Span::styled("  Name: ", label), Span::raw(&s.name)]),
        Line::from(""),
        Line::from(vec![Span::styled("  Section: ", label), Span::raw(&s.section)]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Tuition Fee: ", label),
            Span::raw(format!("₱{}", format_amount(s.tuition_fee))),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Initial Payout: ", label),
            Span::raw(format!("₱{}", format_amount(s.initial_payout))),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Balance: ", label),
            Span::styled(
                format!("₱{}", format_amount(balance)),
                Style::default().fg(if balance > 0.0 { Color::Red } else { Color::Green }),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Press Enter to close",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.session.visible().len();

    let mut status_spans = vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, total),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled(app.session.status().to_string(), Style::default().fg(Color::Green)),
    ];

    for (key, label) in [("/", " Search"), ("a", " Add"), ("1-5", " Sort"), ("x", " Export"), ("r", " Reload")] {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
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
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use student_roster::{QuickXmlReader, SortDirection};

    struct EmptySource;

    impl DocumentSource for EmptySource {
        fn fetch(&self) -> student_roster::Result<String> {
            Ok("<catalog/>".to_string())
        }

        fn describe(&self) -> String {
            "empty".to_string()
        }
    }

    fn app_with(students: Vec<Student>, export_dir: PathBuf) -> App {
        App::new(
            RosterSession::with_students(students),
            Box::new(EmptySource),
            Box::new(QuickXmlReader::new()),
            export_dir,
        )
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn sample() -> Vec<Student> {
        vec![
            Student::new("S1", "Ana", "A", 1000.0, 200.0),
            Student::new("S2", "Bob", "B", 500.0, 100.0),
        ]
    }

    #[test]
    fn test_search_mode_edits_query() {
        let mut app = app_with(sample(), PathBuf::from("."));
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "bob");
        assert_eq!(app.session.query(), "bob");
        assert_eq!(app.session.visible().len(), 1);

        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.session.query(), "bo");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Browse);
    }

    #[test]
    fn test_number_keys_click_headers() {
        let mut app = app_with(sample(), PathBuf::from("."));
        press(&mut app, KeyCode::Char('4'));
        assert_eq!(app.session.directive().key, SortKey::TuitionFee);
        press(&mut app, KeyCode::Char('4'));
        assert_eq!(app.session.directive().direction, SortDirection::Desc);
        assert_eq!(app.selected_student().unwrap().identifier, "S1");
    }

    #[test]
    fn test_duplicate_submission_keeps_form() {
        let mut app = app_with(sample(), PathBuf::from("."));
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "S1");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Copy");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::AddForm);
        assert_eq!(app.form.identifier, "S1");
        assert_eq!(app.form.name, "Copy");
        assert_eq!(app.session.status(), "Student ID \"S1\" already exists.");
    }

    #[test]
    fn test_successful_submission_clears_form() {
        let mut app = app_with(sample(), PathBuf::from("."));
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "S3");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Cy");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.form, StudentForm::default());
        assert_eq!(app.session.store().len(), 3);
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(sample(), dir.path().to_path_buf());
        press(&mut app, KeyCode::Char('x'));

        let written = std::fs::read_to_string(dir.path().join("students_export.xml")).unwrap();
        assert!(written.contains("<student id=\"S2\">"));
        assert_eq!(app.session.status(), "Exported current data to students_export.xml.");
    }

    #[test]
    fn test_reload_replaces_store() {
        let mut app = app_with(sample(), PathBuf::from("."));
        press(&mut app, KeyCode::Char('r'));
        assert!(app.session.store().is_empty());
        assert_eq!(app.state.selected(), None);
        assert_eq!(app.session.status(), "Loaded 0 students from XML.");
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = app_with(sample(), PathBuf::from("."));
        assert_eq!(app.state.selected(), Some(0));
        app.previous();
        assert_eq!(app.state.selected(), Some(1));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_paging_an_empty_view_selects_nothing() {
        let mut app = app_with(Vec::new(), PathBuf::from("."));
        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.state.selected(), None);
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.state.selected(), None);
    }

    #[test]
    fn test_quit_only_from_browse() {
        let mut app = app_with(sample(), PathBuf::from("."));
        press(&mut app, KeyCode::Char('/'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        press(&mut app, KeyCode::Esc);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ñññññññññññ", 6), "ñññ...");
    }
}
