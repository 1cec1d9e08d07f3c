use crate::aggregate::AggregatePoint;
use crate::entry::{FieldKind, FormField};
use crate::format::{is_positive, percent, us_date, usd};
use crate::session::Session;
use chrono::{Local, NaiveDate};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Dataset, GraphType, List, ListItem, Paragraph, Row,
        Table, Tabs,
    },
    Frame, Terminal,
};
use std::collections::HashSet;
use std::io::{self, Stdout};
use std::str::FromStr;
use std::time::Duration;
use tui_big_text::{BigText, PixelSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    // Shared chrome
    TabBar,
    Help,
    // Entry tab
    Preview,
    // Entries tab
    Headline,
    Date,
    Investor,
    PortfolioKey,
    InitialValue,
    FinalValue,
    Performance,
    Profit,
    Commission,
    // Charts tab
    PerformanceChart,
    ProfitChart,
}

impl Component {
    /// Returns all available components
    pub fn all() -> Vec<Component> {
        vec![
            Component::TabBar,
            Component::Help,
            Component::Preview,
            Component::Headline,
            Component::Date,
            Component::Investor,
            Component::PortfolioKey,
            Component::InitialValue,
            Component::FinalValue,
            Component::Performance,
            Component::Profit,
            Component::Commission,
            Component::PerformanceChart,
            Component::ProfitChart,
        ]
    }

    /// Returns the string representation of the component
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::TabBar => "tab_bar",
            Component::Help => "help",
            Component::Preview => "preview",
            Component::Headline => "headline",
            Component::Date => "date",
            Component::Investor => "investor",
            Component::PortfolioKey => "portfolio_key",
            Component::InitialValue => "initial_value",
            Component::FinalValue => "final_value",
            Component::Performance => "performance",
            Component::Profit => "profit",
            Component::Commission => "commission",
            Component::PerformanceChart => "performance_chart",
            Component::ProfitChart => "profit_chart",
        }
    }

    /// Returns a description of what the component does
    pub fn description(&self) -> &'static str {
        match self {
            Component::TabBar => "Top navigation bar showing active tab",
            Component::Help => "Keyboard shortcuts",
            Component::Preview => "Live metrics for the values being typed",
            Component::Headline => "Total profit across all entries",
            Component::Date => "Date column in the entries table",
            Component::Investor => "Investor column in the entries table",
            Component::PortfolioKey => "Portfolio Key column in the entries table",
            Component::InitialValue => "Initial value column in the entries table",
            Component::FinalValue => "Final value column in the entries table",
            Component::Performance => "Performance column in the entries table",
            Component::Profit => "Profit/Loss column in the entries table",
            Component::Commission => "Commission column in the entries table",
            Component::PerformanceChart => "Mean performance per date",
            Component::ProfitChart => "Total profit per date",
        }
    }

    fn column_header(self) -> Option<&'static str> {
        Some(match self {
            Component::Date => "Date",
            Component::Investor => "Investor",
            Component::PortfolioKey => "Portfolio Key",
            Component::InitialValue => "Initial ($)",
            Component::FinalValue => "Final ($)",
            Component::Performance => "Performance (%)",
            Component::Profit => "Profit/Loss ($)",
            Component::Commission => "Commission ($)",
            _ => return None,
        })
    }
}

impl FromStr for Component {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Component::all()
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("Unknown component: '{s}'"))
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DisabledComponents {
    disabled: HashSet<Component>,
}

impl DisabledComponents {
    pub fn new(disabled_list: Vec<String>) -> Self {
        let mut disabled = HashSet::new();

        for component_str in disabled_list {
            match Component::from_str(&component_str) {
                Ok(component) => {
                    disabled.insert(component);
                }
                Err(err) => tracing::warn!("ignoring disabled component: {err}"),
            }
        }

        DisabledComponents { disabled }
    }

    pub fn is_disabled(&self, component: Component) -> bool {
        self.disabled.contains(&component)
    }

    fn is_enabled(&self, component: Component) -> bool {
        !self.is_disabled(component)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Entry,
    Entries,
    Charts,
}

impl Tab {
    fn title(self) -> &'static str {
        match self {
            Tab::Entry => "New Entry",
            Tab::Entries => "Entries",
            Tab::Charts => "Charts",
        }
    }

    fn all() -> &'static [Tab] {
        &[Tab::Entry, Tab::Entries, Tab::Charts]
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entry" => Ok(Tab::Entry),
            "entries" => Ok(Tab::Entries),
            "charts" => Ok(Tab::Charts),
            _ => Err(format!("Unknown tab: '{s}' (expected entry, entries or charts)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    Edit,
}

/// Index of the Calculate control, one past the last form field.
const CALCULATE: usize = FormField::ALL.len();

pub struct App {
    pub current_tab: Tab,
    pub session: Session,
    pub should_quit: bool,
    pub mode: AppMode,
    pub selected_field: usize,
    pub selected_row: usize,
    pub flash_state: bool,
    pub disabled_components: DisabledComponents,
}

impl App {
    pub fn new(disabled_components: DisabledComponents) -> App {
        App {
            current_tab: Tab::Entry,
            session: Session::new(),
            should_quit: false,
            mode: AppMode::Normal,
            selected_field: 0,
            selected_row: 0,
            flash_state: false,
            disabled_components,
        }
    }

    pub fn next_tab(&mut self) {
        let tabs = Tab::all();
        let current_index = tabs
            .iter()
            .position(|&t| t == self.current_tab)
            .unwrap_or(0);
        self.current_tab = tabs[(current_index + 1) % tabs.len()];
    }

    pub fn previous_tab(&mut self) {
        let tabs = Tab::all();
        let current_index = tabs
            .iter()
            .position(|&t| t == self.current_tab)
            .unwrap_or(0);
        self.current_tab = tabs[(current_index + tabs.len() - 1) % tabs.len()];
    }

    /// The form field under the cursor, or `None` on the Calculate control.
    pub fn selected_form_field(&self) -> Option<FormField> {
        FormField::ALL.get(self.selected_field).copied()
    }

    pub fn select_next(&mut self) {
        match self.current_tab {
            Tab::Entry => {
                if self.selected_field < CALCULATE {
                    self.selected_field += 1;
                }
            }
            Tab::Entries => {
                if self.selected_row < self.session.entries().len().saturating_sub(1) {
                    self.selected_row += 1;
                }
            }
            Tab::Charts => {}
        }
    }

    pub fn select_previous(&mut self) {
        match self.current_tab {
            Tab::Entry => self.selected_field = self.selected_field.saturating_sub(1),
            Tab::Entries => self.selected_row = self.selected_row.saturating_sub(1),
            Tab::Charts => {}
        }
    }

    pub fn on_tick(&mut self) {
        self.flash_state = !self.flash_state;
    }

    fn activate(&mut self) {
        if self.selected_form_field().is_some() {
            self.mode = AppMode::Edit;
        } else {
            self.submit();
        }
    }

    /// Submits the form. A form with missing required fields is silently left as is.
    pub fn submit(&mut self) {
        let today: NaiveDate = Local::now().date_naive();
        match self.session.submit(today) {
            Ok(entry) => {
                tracing::info!(id = entry.id().get(), "entry added");
                self.selected_field = 0;
                self.selected_row = self.session.entries().len() - 1;
            }
            Err(e) => tracing::debug!("submit ignored: {e}"),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.mode {
            AppMode::Normal => self.handle_normal_key(key.code),
            AppMode::Edit => self.handle_edit_key(key.code),
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            // Vim navigation - hjkl
            KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => self.previous_tab(),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => self.next_tab(),
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_previous(),
            KeyCode::Enter | KeyCode::Char('e') => {
                if self.current_tab == Tab::Entry {
                    self.activate();
                }
            }
            KeyCode::Char('c') => {
                if self.current_tab == Tab::Entry {
                    self.submit();
                }
            }
            KeyCode::Char('1') => self.current_tab = Tab::Entry,
            KeyCode::Char('2') => self.current_tab = Tab::Entries,
            KeyCode::Char('3') => self.current_tab = Tab::Charts,
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        let Some(field) = self.selected_form_field() else {
            self.mode = AppMode::Normal;
            return;
        };
        match code {
            KeyCode::Esc => self.mode = AppMode::Normal,
            KeyCode::Enter | KeyCode::Tab => {
                self.mode = AppMode::Normal;
                self.select_next();
            }
            KeyCode::Backspace => {
                self.session.form_mut().get_mut(field).pop();
            }
            KeyCode::Char(c) => {
                if field.accepts(c) {
                    self.session.form_mut().get_mut(field).push(c);
                }
            }
            _ => {}
        }
    }
}

pub async fn run_tui(tab: Tab, disabled_components: Vec<String>) -> eyre::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(DisabledComponents::new(disabled_components));
    app.current_tab = tab;

    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!(entries = app.session.entries().len(), "session closed");
    res.map_err(Into::into)
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
) -> io::Result<()> {
    let mut events = EventStream::new();
    // Drives the cursor blink in edit mode
    let mut ticker = tokio::time::interval(Duration::from_millis(500));

    loop {
        terminal.draw(|f| ui(f, app))?;

        tokio::select! {
            _ = ticker.tick() => app.on_tick(),
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => app.handle_key(key),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
                None => break,
            },
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &App) {
    let show_tabs = app.disabled_components.is_enabled(Component::TabBar);
    let show_help = app.disabled_components.is_enabled(Component::Help);

    let mut constraints = Vec::new();
    if show_tabs {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(0));
    if show_help {
        constraints.push(Constraint::Length(3));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    let mut chunk_index = 0;
    if show_tabs {
        let tab_titles: Vec<Line> = Tab::all()
            .iter()
            .map(|t| {
                let style = if *t == app.current_tab {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(Span::styled(t.title(), style))
            })
            .collect();

        let tabs = Tabs::new(tab_titles)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Portfolio Performance Tracker"),
            )
            .style(Style::default().fg(Color::White))
            .highlight_style(Style::default().fg(Color::Yellow))
            .select(
                Tab::all()
                    .iter()
                    .position(|&t| t == app.current_tab)
                    .unwrap_or(0),
            );

        f.render_widget(tabs, chunks[chunk_index]);
        chunk_index += 1;
    }

    let content_area = chunks[chunk_index];
    match app.current_tab {
        Tab::Entry => render_entry_form(f, content_area, app),
        Tab::Entries => render_entries(f, content_area, app),
        Tab::Charts => render_charts(f, content_area, app),
    }

    if show_help {
        let help = match app.mode {
            AppMode::Edit => "Editing: type | Backspace (delete) | Enter (next field) | Esc (done)",
            AppMode::Normal => match app.current_tab {
                Tab::Entry => {
                    "j/k (field) | Enter/e (edit) | c (calculate) | h/l (tabs) | 1-3 (direct) | q (quit)"
                }
                Tab::Entries => "j/k (select row) | h/l (tabs) | 1-3 (direct) | q (quit)",
                Tab::Charts => "h/l (tabs) | 1-3 (direct) | q (quit)",
            },
        };
        let help_text = Paragraph::new(help)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(help_text, chunks[chunk_index + 1]);
    }
}

fn signed_color(value: f64) -> Color {
    if is_positive(value) {
        Color::Green
    } else {
        Color::Red
    }
}

fn date_hint(value: &str) -> Option<&'static str> {
    if value.is_empty() || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        None
    } else {
        Some("expected YYYY-MM-DD")
    }
}

fn render_entry_form(f: &mut Frame, area: Rect, app: &App) {
    let (form_area, preview_area) = if app.disabled_components.is_enabled(Component::Preview) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);
        (chunks[0], Some(chunks[1]))
    } else {
        (area, None)
    };

    let form = app.session.form();
    let mut items: Vec<ListItem> = FormField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let selected = i == app.selected_field;
            let editing = selected && app.mode == AppMode::Edit;
            let value = form.get(*field);

            let marker = if field.is_required() { "*" } else { " " };
            let mut spans = vec![
                Span::styled(
                    format!("{marker} {:<18}", field.label()),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(value.to_string(), Style::default().fg(Color::White)),
            ];
            if editing {
                let cursor = if app.flash_state { "█" } else { "▌" };
                spans.push(Span::styled(cursor, Style::default().fg(Color::Yellow)));
            }
            if field.kind() == FieldKind::Date {
                if let Some(hint) = date_hint(value) {
                    spans.push(Span::styled(
                        format!("  ({hint})"),
                        Style::default().fg(Color::Yellow),
                    ));
                }
            }

            let style = if selected {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let button_style = if app.selected_field == CALCULATE {
        Style::default()
            .fg(Color::White)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Blue)
    };
    items.push(ListItem::new(Line::from("")));
    items.push(ListItem::new(Line::from(Span::styled(
        "  [ Calculate ]  ",
        button_style,
    ))));

    let title = match app.mode {
        AppMode::Normal => "New Entry (* required)".to_string(),
        AppMode::Edit => format!(
            "New Entry - editing {}",
            app.selected_form_field()
                .map(FormField::label)
                .unwrap_or_default()
        ),
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::White));
    f.render_widget(list, form_area);

    if let Some(preview_area) = preview_area {
        render_preview(f, preview_area, app);
    }
}

fn render_preview(f: &mut Frame, area: Rect, app: &App) {
    let lines = match app.session.form().preview() {
        Some(m) => vec![
            Line::from(vec![
                Span::raw("Performance: "),
                Span::styled(
                    percent(m.performance),
                    Style::default().fg(signed_color(m.performance)),
                ),
            ]),
            Line::from(vec![
                Span::raw("Profit/Loss: "),
                Span::styled(usd(m.profit), Style::default().fg(signed_color(m.profit))),
            ]),
            Line::from(vec![
                Span::raw("Commission:  "),
                Span::raw(usd(m.commission)),
            ]),
        ],
        None => vec![Line::from(Span::styled(
            "Enter initial and final values...",
            Style::default().fg(Color::Gray),
        ))],
    };

    let preview = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Gray))
            .title(" Preview "),
    );
    f.render_widget(preview, area);
}

fn render_headline(f: &mut Frame, area: Rect, app: &App) {
    let total_profit = app.session.totals().profit;
    let text = usd(total_profit);

    let big_text = BigText::builder()
        .pixel_size(PixelSize::Quadrant)
        .style(
            Style::default()
                .fg(signed_color(total_profit))
                .add_modifier(Modifier::BOLD),
        )
        .lines(vec![text.clone().into()])
        .build();

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Total Profit/Loss (USD)")
        .title_alignment(Alignment::Center);
    f.render_widget(block, area);

    let inner = area.inner(ratatui::layout::Margin {
        horizontal: 1,
        vertical: 1,
    });
    // Quadrant glyphs are roughly four cells wide
    let big_text_width = text.chars().count() as u16 * 4;
    let centered_area = if big_text_width < inner.width {
        let margin = (inner.width - big_text_width) / 2;
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(margin),
                Constraint::Min(0),
                Constraint::Length(margin),
            ])
            .split(inner)[1]
    } else {
        inner
    };
    f.render_widget(big_text, centered_area);
}

fn render_entries(f: &mut Frame, area: Rect, app: &App) {
    let table_area = if app.disabled_components.is_enabled(Component::Headline) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(0)])
            .split(area);
        render_headline(f, chunks[0], app);
        chunks[1]
    } else {
        area
    };

    let columns: Vec<Component> = Component::all()
        .into_iter()
        .filter(|c| c.column_header().is_some() && app.disabled_components.is_enabled(*c))
        .collect();

    if columns.is_empty() {
        let placeholder = Paragraph::new("All entry columns are disabled")
            .block(Block::default().borders(Borders::ALL).title("Entries"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(placeholder, table_area);
        return;
    }

    let header_cells = columns.iter().filter_map(|c| c.column_header()).map(|h| {
        Cell::from(h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let entries = app.session.entries();
    let rows = entries.iter().enumerate().map(|(i, entry)| {
        let row_style = if i == app.selected_row {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };

        let cells = columns.iter().map(|column| match column {
            Component::Date => Cell::from(us_date(entry.recorded_on())),
            Component::Investor => Cell::from(entry.investor_name().to_string()),
            Component::PortfolioKey => Cell::from(entry.portfolio_label()),
            Component::InitialValue => Cell::from(usd(entry.initial_value())),
            Component::FinalValue => Cell::from(usd(entry.final_value())),
            Component::Performance => Cell::from(percent(entry.performance()))
                .style(Style::default().fg(signed_color(entry.performance()))),
            Component::Profit => Cell::from(usd(entry.profit()))
                .style(Style::default().fg(signed_color(entry.profit()))),
            Component::Commission => Cell::from(usd(entry.commission())),
            _ => Cell::from(""),
        });

        Row::new(cells).height(1).style(row_style)
    });

    let totals = app.session.totals();
    let total_style = Style::default()
        .fg(Color::Green)
        .add_modifier(Modifier::BOLD);
    let total_cells = columns.iter().enumerate().map(|(i, column)| {
        let (text, style) = match column {
            Component::InitialValue => (usd(totals.initial_value), total_style),
            Component::FinalValue => (usd(totals.final_value), total_style),
            Component::Profit => (
                usd(totals.profit),
                Style::default()
                    .fg(signed_color(totals.profit))
                    .add_modifier(Modifier::BOLD),
            ),
            Component::Commission => (usd(totals.commission), total_style),
            _ => (String::new(), total_style),
        };
        // the first visible column carries the label
        match (i, text.is_empty()) {
            (0, true) => Cell::from("TOTAL").style(total_style),
            (0, false) => Cell::from(format!("TOTAL {text}")).style(style),
            _ => Cell::from(text).style(style),
        }
    });
    let total_row = Row::new(total_cells).height(1);

    let widths: Vec<Constraint> = columns
        .iter()
        .map(|c| match c {
            Component::Investor | Component::PortfolioKey => Constraint::Percentage(14),
            _ => Constraint::Percentage(12),
        })
        .collect();

    let title = format!("Entries ({})", entries.len());
    let table = if entries.is_empty() {
        Table::new(Vec::<Row>::new(), widths)
    } else {
        Table::new(rows.chain(std::iter::once(total_row)), widths)
    };
    let table = table
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::White));

    f.render_widget(table, table_area);
}

fn render_charts(f: &mut Frame, area: Rect, app: &App) {
    let points = app.session.aggregates();

    let mut charts: Vec<(Component, &str, fn(&AggregatePoint) -> f64, fn(f64) -> String, Color)> =
        Vec::new();
    if app.disabled_components.is_enabled(Component::PerformanceChart) {
        charts.push((
            Component::PerformanceChart,
            " Mean Performance (%) ",
            |p| p.avg_performance,
            percent,
            Color::Cyan,
        ));
    }
    if app.disabled_components.is_enabled(Component::ProfitChart) {
        charts.push((
            Component::ProfitChart,
            " Total Profit ($) ",
            |p| p.total_profit,
            usd,
            Color::Green,
        ));
    }

    if charts.is_empty() || points.is_empty() {
        let message = if charts.is_empty() {
            "All charts are disabled"
        } else {
            "No entries yet. Add one on the New Entry tab."
        };
        let placeholder = Paragraph::new(message)
            .block(Block::default().borders(Borders::ALL).title("Charts"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(placeholder, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, charts.len() as u32); charts.len()])
        .split(area);

    for (chunk, (component, title, value, fmt, color)) in chunks.iter().zip(charts) {
        tracing::trace!(chart = %component, points = points.len(), "rendering chart");
        render_line_chart(f, *chunk, title, &points, value, fmt, color);
    }
}

/// Plots one value per aggregate point, skipping points whose value is not finite.
pub fn series(points: &[AggregatePoint], value: fn(&AggregatePoint) -> f64) -> Vec<(f64, f64)> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, value(p)))
        .filter(|(_, y)| y.is_finite())
        .collect()
}

/// Y-axis bounds with a little headroom. Flat or empty series still get a visible range.
pub fn value_bounds(data: &[(f64, f64)]) -> [f64; 2] {
    let min = data.iter().map(|(_, y)| *y).fold(f64::INFINITY, f64::min);
    let max = data.iter().map(|(_, y)| *y).fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    if min == max {
        return [min - 1.0, max + 1.0];
    }
    let pad = (max - min) * 0.05;
    [min - pad, max + pad]
}

fn group_label(point: Option<&AggregatePoint>) -> String {
    match point {
        Some(p) if p.group_key.is_empty() => "(no date)".to_string(),
        Some(p) => p.group_key.clone(),
        None => String::new(),
    }
}

fn render_line_chart(
    f: &mut Frame,
    area: Rect,
    title: &str,
    points: &[AggregatePoint],
    value: fn(&AggregatePoint) -> f64,
    fmt: fn(f64) -> String,
    color: Color,
) {
    let data = series(points, value);
    let [min_y, max_y] = value_bounds(&data);
    let max_x = (points.len().saturating_sub(1)).max(1) as f64;

    let datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&data)];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .x_axis(
            Axis::default()
                .title("Date")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, max_x])
                .labels(vec![
                    Span::raw(group_label(points.first())),
                    Span::raw(group_label(points.last())),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([min_y, max_y])
                .labels(vec![Span::raw(fmt(min_y)), Span::raw(fmt(max_y))]),
        );

    f.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    /// Fills a field via the keyboard: select it, edit, type, confirm.
    fn fill(app: &mut App, field: FormField, text: &str) {
        app.selected_field = FormField::ALL.iter().position(|f| *f == field).unwrap();
        press(app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Edit);
        type_text(app, text);
        press(app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
    }

    fn fill_required(app: &mut App, initial: &str, final_value: &str) {
        fill(app, FormField::InvestorName, "Ada");
        fill(app, FormField::PortfolioKey, "P-1");
        fill(app, FormField::InitialValue, initial);
        fill(app, FormField::FinalValue, final_value);
    }

    fn render(app: &App) -> String {
        let backend = TestBackend::new(140, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_component_from_str() {
        assert_eq!(
            Component::from_str(" Profit_Chart ").unwrap(),
            Component::ProfitChart
        );
        assert!(Component::from_str("balance").is_err());
        for c in Component::all() {
            assert_eq!(Component::from_str(c.as_str()).unwrap(), c);
            assert!(!c.description().is_empty());
        }
    }

    #[test]
    fn test_disabled_components_ignore_unknown_names() {
        let disabled = DisabledComponents::new(vec!["help".into(), "nonsense".into()]);
        assert!(disabled.is_disabled(Component::Help));
        assert!(!disabled.is_disabled(Component::TabBar));
    }

    #[test]
    fn test_tab_from_str() {
        assert_eq!(Tab::from_str("Charts").unwrap(), Tab::Charts);
        assert!(Tab::from_str("overview").is_err());
    }

    #[test]
    fn test_tab_navigation_wraps() {
        let mut app = App::new(DisabledComponents::default());
        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.current_tab, Tab::Charts);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_tab, Tab::Entry);
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.current_tab, Tab::Entries);
    }

    #[test]
    fn test_submit_through_keyboard() {
        let mut app = App::new(DisabledComponents::default());
        fill_required(&mut app, "1000", "1100");
        assert_eq!(app.selected_field, CALCULATE);

        press(&mut app, KeyCode::Enter);
        let entries = app.session.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].commission(), 10.0);
        assert_eq!(app.session.form().investor_name, "");
        assert_eq!(app.selected_field, 0);
    }

    #[test]
    fn test_incomplete_submit_is_a_no_op() {
        let mut app = App::new(DisabledComponents::default());
        fill(&mut app, FormField::InvestorName, "Ada");
        fill(&mut app, FormField::InitialValue, "100");

        press(&mut app, KeyCode::Char('c'));
        assert!(app.session.entries().is_empty());
        assert_eq!(app.session.form().investor_name, "Ada");
        assert_eq!(app.session.form().initial_value, "100");
    }

    #[test]
    fn test_numeric_field_filters_input() {
        let mut app = App::new(DisabledComponents::default());
        fill(&mut app, FormField::InitialValue, "1a2.5x");
        assert_eq!(app.session.form().initial_value, "12.5");

        app.selected_field = 5;
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.session.form().initial_value, "12.");
        assert_eq!(app.mode, AppMode::Normal);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_typing_q_while_editing_does_not_quit() {
        let mut app = App::new(DisabledComponents::default());
        fill(&mut app, FormField::InvestorName, "quinn");
        assert_eq!(app.session.form().investor_name, "quinn");
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_from_edit_mode() {
        let mut app = App::new(DisabledComponents::default());
        press(&mut app, KeyCode::Enter);
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
        assert_eq!(app.session.form().investor_name, "");
    }

    #[test]
    fn test_row_selection_is_clamped() {
        let mut app = App::new(DisabledComponents::default());
        fill_required(&mut app, "100", "150");
        app.submit();
        fill_required(&mut app, "200", "180");
        app.submit();
        assert_eq!(app.selected_row, 1);

        app.current_tab = Tab::Entries;
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.selected_row, 1);
        press(&mut app, KeyCode::Char('k'));
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.selected_row, 0);
    }

    #[test]
    fn test_series_skips_non_finite_values() {
        let points = vec![
            AggregatePoint {
                group_key: "a".into(),
                avg_performance: 5.0,
                total_profit: 1.0,
                count: 1,
            },
            AggregatePoint {
                group_key: "b".into(),
                avg_performance: f64::NAN,
                total_profit: 2.0,
                count: 1,
            },
        ];
        assert_eq!(series(&points, |p| p.avg_performance), vec![(0.0, 5.0)]);
        assert_eq!(
            series(&points, |p| p.total_profit),
            vec![(0.0, 1.0), (1.0, 2.0)]
        );
    }

    #[test]
    fn test_value_bounds() {
        assert_eq!(value_bounds(&[]), [0.0, 1.0]);
        assert_eq!(value_bounds(&[(0.0, 3.0)]), [2.0, 4.0]);
        assert_eq!(value_bounds(&[(0.0, 0.0), (1.0, 100.0)]), [-5.0, 105.0]);
    }

    #[test]
    fn test_date_hint() {
        assert_eq!(date_hint(""), None);
        assert_eq!(date_hint("2024-02-29"), None);
        assert!(date_hint("2024-13").is_some());
    }

    #[test]
    fn test_render_entry_form() {
        let mut app = App::new(DisabledComponents::default());
        fill(&mut app, FormField::InitialValue, "1000");
        fill(&mut app, FormField::FinalValue, "1100");
        let screen = render(&app);
        assert!(screen.contains("Portfolio Performance Tracker"));
        assert!(screen.contains("Investor Name"));
        assert!(screen.contains("[ Calculate ]"));
        assert!(screen.contains("Preview"));
        assert!(screen.contains("10.00%"));
    }

    #[test]
    fn test_render_entries_table() {
        let mut app = App::new(DisabledComponents::new(vec!["headline".into()]));
        fill_required(&mut app, "200", "180");
        app.submit();
        app.current_tab = Tab::Entries;

        let screen = render(&app);
        assert!(screen.contains("Entries (1)"));
        assert!(screen.contains("Portfolio Key"));
        assert!(screen.contains("-10.00%"));
        assert!(screen.contains("-$20.00"));
        assert!(screen.contains("TOTAL"));
    }

    #[test]
    fn test_render_entries_respects_disabled_columns() {
        let disabled = DisabledComponents::new(vec!["commission".into(), "headline".into()]);
        let mut app = App::new(disabled);
        app.current_tab = Tab::Entries;
        let screen = render(&app);
        assert!(screen.contains("Investor"));
        assert!(!screen.contains("Commission"));
    }

    #[test]
    fn test_total_label_follows_first_visible_column() {
        let disabled = DisabledComponents::new(vec![
            "date".into(),
            "investor".into(),
            "headline".into(),
        ]);
        let mut app = App::new(disabled);
        fill_required(&mut app, "100", "150");
        app.submit();
        app.current_tab = Tab::Entries;
        let screen = render(&app);
        assert!(screen.contains("TOTAL"));

        let disabled = DisabledComponents::new(vec![
            "date".into(),
            "investor".into(),
            "portfolio_key".into(),
            "headline".into(),
        ]);
        let mut app = App::new(disabled);
        fill_required(&mut app, "100", "150");
        app.submit();
        app.current_tab = Tab::Entries;
        let screen = render(&app);
        assert!(screen.contains("TOTAL $100.00"));
        assert!(screen.contains("$50.00"));
    }

    #[test]
    fn test_number_fields_accept_exponents() {
        let mut app = App::new(DisabledComponents::default());
        fill(&mut app, FormField::InitialValue, "1e3");
        fill(&mut app, FormField::FinalValue, "+1.1E3");
        assert_eq!(app.session.form().initial_value, "1e3");
        assert_eq!(app.session.form().final_value, "+1.1E3");
        let metrics = app.session.form().preview().unwrap();
        assert_eq!(metrics.profit, 100.0);
        assert_eq!(metrics.performance, 10.0);
    }

    #[test]
    fn test_render_charts() {
        let mut app = App::new(DisabledComponents::default());
        app.current_tab = Tab::Charts;
        assert!(render(&app).contains("No entries yet"));

        fill(&mut app, FormField::EndDate, "2024-01-01");
        fill_required(&mut app, "100", "150");
        app.submit();
        let screen = render(&app);
        assert!(screen.contains("Mean Performance (%)"));
        assert!(screen.contains("Total Profit ($)"));
        assert!(screen.contains("2024-01-01"));
    }

    #[test]
    fn test_render_without_tab_bar_or_help() {
        let app = App::new(DisabledComponents::new(vec!["tab_bar".into(), "help".into()]));
        let screen = render(&app);
        assert!(!screen.contains("Portfolio Performance Tracker"));
        assert!(screen.contains("New Entry"));
    }
}
