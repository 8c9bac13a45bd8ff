use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use expense_tracker::presenter::{self, AddForm, Level, Notice};
use expense_tracker::{Expense, ExpenseStore};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Amount,
    Category,
    Date,
    Notes,
    DeleteId,
    Search,
}

impl Field {
    const ALL: [Field; 6] = [
        Field::Amount,
        Field::Category,
        Field::Date,
        Field::Notes,
        Field::DeleteId,
        Field::Search,
    ];

    pub fn next(&self) -> Self {
        let i = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        let i = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(&self) -> &str {
        match self {
            Field::Amount => "Amount",
            Field::Category => "Category",
            Field::Date => "Date (YYYY-MM-DD)",
            Field::Notes => "Notes",
            Field::DeleteId => "Delete by ID",
            Field::Search => "Search (Category/Date)",
        }
    }
}

/// Which rows the table is showing.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    All,
    Search(String),
}

pub struct App {
    store: ExpenseStore,
    pub expenses: Vec<Expense>,
    pub listing: Listing,
    pub state: TableState,
    pub form: AddForm,
    pub delete_id: String,
    pub keyword: String,
    pub focus: Field,
    pub notice: Option<Notice>,
}

impl App {
    pub fn new(store: ExpenseStore) -> expense_tracker::Result<Self> {
        let mut app = Self {
            store,
            expenses: Vec::new(),
            listing: Listing::All,
            state: TableState::default(),
            form: AddForm::default(),
            delete_id: String::new(),
            keyword: String::new(),
            focus: Field::Amount,
            notice: None,
        };
        app.expenses = app.store.list()?;
        app.reset_selection();
        Ok(app)
    }

    fn reset_selection(&mut self) {
        self.state
            .select(if self.expenses.is_empty() { None } else { Some(0) });
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Amount => &mut self.form.amount,
            Field::Category => &mut self.form.category,
            Field::Date => &mut self.form.date,
            Field::Notes => &mut self.form.notes,
            Field::DeleteId => &mut self.delete_id,
            Field::Search => &mut self.keyword,
        }
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Amount => &self.form.amount,
            Field::Category => &self.form.category,
            Field::Date => &self.form.date,
            Field::Notes => &self.form.notes,
            Field::DeleteId => &self.delete_id,
            Field::Search => &self.keyword,
        }
    }

    fn fail(&mut self, err: &expense_tracker::ExpenseError) {
        self.notice = Some(Notice::from_error(err));
    }

    pub fn view_all(&mut self) {
        match self.store.list() {
            Ok(expenses) => {
                self.expenses = expenses;
                self.listing = Listing::All;
                self.reset_selection();
            }
            Err(e) => self.fail(&e),
        }
    }

    /// Inputs are cleared only when the add succeeds.
    pub fn submit_add(&mut self) {
        match self.form.submit(&self.store) {
            Ok(_) => {
                self.form.clear();
                self.focus = Field::Amount;
                self.notice = Some(Notice::added());
                self.view_all();
            }
            Err(e) => self.fail(&e),
        }
    }

    pub fn submit_delete(&mut self) {
        let result = presenter::parse_delete_id(&self.delete_id)
            .and_then(|id| self.store.delete(id).map(|affected| (id, affected)));

        match result {
            Ok((id, affected)) => {
                self.delete_id.clear();
                self.notice = Some(Notice::deleted(id, affected));
                self.view_all();
            }
            Err(e) => self.fail(&e),
        }
    }

    pub fn submit_search(&mut self) {
        let result = presenter::validate_keyword(&self.keyword)
            .and_then(|keyword| self.store.search(keyword));

        match result {
            Ok(expenses) => {
                self.expenses = expenses;
                self.listing = Listing::Search(self.keyword.clone());
                self.reset_selection();
                self.notice = None;
            }
            Err(e) => self.fail(&e),
        }
    }

    pub fn export(&mut self) {
        self.notice = Some(match self.store.export_to_csv() {
            Ok(path) => Notice::exported(&path),
            Err(e) => Notice::from_error(&e),
        });
    }

    pub fn next(&mut self) {
        if self.expenses.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.expenses.len() => i + 1,
            Some(_) => 0,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.expenses.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.expenses.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Apply one key press. Returns `true` when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Char('c') if ctrl => return true,
            KeyCode::Char('e') if ctrl => self.export(),
            KeyCode::Char('l') if ctrl => {
                self.notice = None;
                self.view_all();
            }
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Down => self.next(),
            KeyCode::Up => self.previous(),
            KeyCode::Enter => match self.focus {
                Field::Amount | Field::Category | Field::Date | Field::Notes => self.submit_add(),
                Field::DeleteId => self.submit_delete(),
                Field::Search => self.submit_search(),
            },
            KeyCode::Backspace => {
                self.field_mut(self.focus).pop();
            }
            KeyCode::Char(c) if !ctrl => self.field_mut(self.focus).push(c),
            _ => {}
        }

        false
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

    res?;
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
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form + table
            Constraint::Length(3), // Notice
            Constraint::Length(3), // Key help
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(40), Constraint::Min(0)])
        .split(chunks[1]);

    render_form(f, body[0], app);
    render_table(f, body[1], app);
    render_notice(f, chunks[2], app);
    render_status_bar(f, chunks[3]);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let view = match &app.listing {
        Listing::All => "All expenses".to_string(),
        Listing::Search(keyword) => format!("Search: {}", keyword),
    };
    let total: f64 = app.expenses.iter().map(|e| e.amount).sum();

    let spans = vec![
        Span::styled(
            "Expense Tracker",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(view, Style::default().fg(Color::White)),
        Span::raw("  |  "),
        Span::styled(
            format!("{} shown, {:.2} total", app.expenses.len(), total),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  |  "),
        Span::styled(
            app.store.db_path().display().to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = Field::ALL
        .iter()
        .flat_map(|field| {
            let focused = *field == app.focus;
            let label_style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let cursor = if focused { "_" } else { "" };

            let mut lines = Vec::new();
            if *field == Field::DeleteId {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(field.label().to_string(), label_style)));
            lines.push(Line::from(format!("  {}{}", app.field(*field), cursor)));
            lines
        })
        .collect();

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Input "),
    );

    f.render_widget(form, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["ID", "Amount", "Category", "Date", "Notes"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.expenses.iter().map(|expense| {
        Row::new(vec![
            Cell::from(expense.id.to_string()),
            Cell::from(presenter::format_amount(expense.amount)),
            Cell::from(truncate(&expense.category, 18)),
            Cell::from(expense.date.clone()),
            Cell::from(truncate(expense.notes.as_deref().unwrap_or(""), 30)),
        ])
        .height(1)
    });

    let empty_title = match app.listing {
        Listing::All => presenter::NO_EXPENSES,
        Listing::Search(_) => presenter::NO_MATCHES,
    };
    let title = if app.expenses.is_empty() {
        format!(" {} ", empty_title)
    } else {
        " Expenses ".to_string()
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(20),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_notice(f: &mut Frame, area: Rect, app: &App) {
    let line = match &app.notice {
        Some(notice) => {
            let color = match notice.level {
                Level::Success => Color::Green,
                Level::Warning => Color::Yellow,
                Level::Error => Color::Red,
            };
            Line::from(vec![
                Span::styled(
                    format!("{}: ", notice.title),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(notice.message.clone()),
            ])
        }
        None => Line::from(""),
    };

    let paragraph = Paragraph::new(vec![line]).block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let spans = vec![
        key("Tab"),
        Span::raw(" Field | "),
        key("Enter"),
        Span::raw(" Add/Delete/Search | "),
        key("Ctrl+L"),
        Span::raw(" View all | "),
        key("Ctrl+E"),
        Span::raw(" Export CSV | "),
        key("↑/↓"),
        Span::raw(" Nav | "),
        Span::styled("Esc", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
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
