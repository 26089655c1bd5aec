//! Filter panel component
//!
//! Lists the visible columns with their active-filter badges. Value columns
//! offer a checklist of their options (with a search box once there are
//! more than a handful); date columns take a from/to range.

use crate::action::Action;
use crate::component::Component;
use crate::components::layout::proportional_popup;
use crate::model::filter::{narrow_date_options, narrow_options, FilterSession, OPTION_SEARCH_THRESHOLD};
use crate::model::{DateRange, FilterBadge};
use anyhow::Result;
use chrono::NaiveDate;
use chrono_tz::Tz;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use std::collections::BTreeMap;

const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

/// A column as offered by the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterColumn {
    pub id: String,
    pub header: String,
    pub date_field: bool,
    /// Display values, or raw timestamps for date columns
    pub options: Vec<String>,
    /// Earliest and latest date of a date column
    pub bounds: Option<(NaiveDate, NaiveDate)>,
    /// Zone that decides which calendar day a timestamp falls on
    pub time_zone: Option<Tz>,
}

impl FilterColumn {
    pub fn has_search(&self) -> bool {
        !self.date_field && self.options.len() > OPTION_SEARCH_THRESHOLD
    }
}

/// Which part of the panel receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    Columns,
    Options,
    Search,
    DateFrom,
    DateTo,
}

/// Text typed into the range inputs of one date column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateInputs {
    pub from: String,
    pub to: String,
}

impl DateInputs {
    fn from_range(range: DateRange) -> Self {
        let text = |d: Option<NaiveDate>| {
            d.map(|d| d.format(DATE_INPUT_FORMAT).to_string())
                .unwrap_or_default()
        };
        Self {
            from: text(range.from),
            to: text(range.to),
        }
    }

    /// Parse both inputs; blank inputs leave that end open
    pub fn parse(&self) -> Result<DateRange, String> {
        let parse = |label: &str, text: &str| -> Result<Option<NaiveDate>, String> {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            NaiveDate::parse_from_str(text, DATE_INPUT_FORMAT)
                .map(Some)
                .map_err(|_| format!("{} must be YYYY-MM-DD", label))
        };
        let range = DateRange::new(parse("From", &self.from)?, parse("To", &self.to)?);
        if let (Some(from), Some(to)) = (range.from, range.to) {
            if from > to {
                return Err("From is after To".to_string());
            }
        }
        Ok(range)
    }
}

/// Filter panel
pub struct FilterPanel {
    pub columns: Vec<FilterColumn>,
    pub column_index: usize,
    pub option_index: usize,
    pub focus: PanelFocus,
    pub search_query: String,
    pub date_inputs: BTreeMap<String, DateInputs>,
    pub input_error: Option<String>,
    /// Snapshot of the filters, refreshed by the App after every change
    pub session: FilterSession,
    column_state: ListState,
    option_state: ListState,
}

impl Default for FilterPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterPanel {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            column_index: 0,
            option_index: 0,
            focus: PanelFocus::Columns,
            search_query: String::new(),
            date_inputs: BTreeMap::new(),
            input_error: None,
            session: FilterSession::default(),
            column_state: ListState::default(),
            option_state: ListState::default(),
        }
    }

    /// Load the columns to offer, keeping the cursor when possible
    pub fn set_columns(&mut self, columns: Vec<FilterColumn>, session: &FilterSession) {
        self.columns = columns;
        self.session = session.clone();
        self.focus = PanelFocus::Columns;
        self.column_index = self.column_index.min(self.columns.len().saturating_sub(1));
        self.select_column(self.column_index);
    }

    pub fn sync_session(&mut self, session: &FilterSession) {
        self.session = session.clone();
    }

    /// Forget typed text, e.g. after all filters were cleared
    pub fn reset_inputs(&mut self) {
        self.search_query.clear();
        self.date_inputs.clear();
        self.input_error = None;
        self.option_index = 0;
        if let Some(column) = self.current_column().cloned() {
            self.load_date_inputs(&column);
        }
    }

    pub fn clear_column_inputs(&mut self, column_id: &str) {
        self.date_inputs.remove(column_id);
        self.input_error = None;
        if let Some(column) = self.current_column().cloned() {
            self.load_date_inputs(&column);
        }
    }

    pub fn current_column(&self) -> Option<&FilterColumn> {
        self.columns.get(self.column_index)
    }

    fn current_inputs(&self) -> Option<&DateInputs> {
        self.current_column()
            .and_then(|column| self.date_inputs.get(&column.id))
    }

    fn load_date_inputs(&mut self, column: &FilterColumn) {
        if column.date_field && !self.date_inputs.contains_key(&column.id) {
            let inputs = DateInputs::from_range(self.session.draft(&column.id));
            self.date_inputs.insert(column.id.clone(), inputs);
        }
    }

    fn select_column(&mut self, index: usize) {
        self.column_index = index;
        self.option_index = 0;
        self.search_query.clear();
        self.input_error = None;
        if let Some(column) = self.current_column().cloned() {
            self.load_date_inputs(&column);
        }
    }

    /// Options of the current column after search or range narrowing
    pub fn visible_options(&self) -> Vec<&String> {
        let Some(column) = self.current_column() else {
            return Vec::new();
        };
        if column.date_field {
            let range = self
                .current_inputs()
                .and_then(|inputs| inputs.parse().ok())
                .unwrap_or_default();
            narrow_date_options(&column.options, &range, column.time_zone)
        } else if column.has_search() {
            narrow_options(&column.options, &self.search_query)
        } else {
            column.options.iter().collect()
        }
    }

    fn next_column(&mut self) {
        if self.column_index + 1 < self.columns.len() {
            self.select_column(self.column_index + 1);
        }
    }

    fn prev_column(&mut self) {
        if self.column_index > 0 {
            self.select_column(self.column_index - 1);
        }
    }

    fn next_option(&mut self) {
        if self.option_index + 1 < self.visible_options().len() {
            self.option_index += 1;
        }
    }

    fn prev_option(&mut self) {
        self.option_index = self.option_index.saturating_sub(1);
    }

    fn enter_column(&mut self) {
        self.focus = match self.current_column() {
            Some(column) if column.date_field => PanelFocus::DateFrom,
            Some(_) => PanelFocus::Options,
            None => PanelFocus::Columns,
        };
    }

    fn toggle_current_option(&self) -> Option<Action> {
        let column = self.current_column()?;
        let value = self.visible_options().get(self.option_index)?.to_string();
        Some(Action::ToggleFilterValue {
            column: column.id.clone(),
            value,
        })
    }

    fn edit_date_input(&mut self, edit: impl FnOnce(&mut String)) -> Option<Action> {
        let column_id = self.current_column()?.id.clone();
        let focus = self.focus;
        let inputs = self.date_inputs.entry(column_id.clone()).or_default();
        match focus {
            PanelFocus::DateFrom => edit(&mut inputs.from),
            PanelFocus::DateTo => edit(&mut inputs.to),
            _ => return None,
        }
        self.input_error = None;
        self.option_index = 0;

        // Partial dates are kept as text only
        let range = inputs.parse().ok()?;
        Some(Action::SetDateDraft {
            column: column_id,
            range,
        })
    }

    fn apply_date_inputs(&mut self) -> Option<Action> {
        let column_id = self.current_column()?.id.clone();
        let inputs = self.date_inputs.get(&column_id).cloned().unwrap_or_default();
        match inputs.parse() {
            Ok(_) => {
                self.input_error = None;
                Some(Action::ApplyDateRange(column_id))
            }
            Err(message) => {
                self.input_error = Some(message);
                None
            }
        }
    }

    fn clear_current_column(&self) -> Option<Action> {
        self.current_column()
            .map(|column| Action::ClearColumnFilter(column.id.clone()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Component Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl Component for FilterPanel {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match self.focus {
            PanelFocus::Columns => match key.code {
                KeyCode::Esc | KeyCode::Char('f') | KeyCode::Char('q') => Some(Action::CloseModal),
                KeyCode::Down | KeyCode::Char('j') => {
                    self.next_column();
                    None
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.prev_column();
                    None
                }
                KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                    self.enter_column();
                    None
                }
                KeyCode::Char('c') => self.clear_current_column(),
                KeyCode::Char('X') => Some(Action::ClearAllFilters),
                _ => None,
            },
            PanelFocus::Options => match key.code {
                KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => {
                    self.focus = PanelFocus::Columns;
                    None
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.next_option();
                    None
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.prev_option();
                    None
                }
                KeyCode::Char(' ') | KeyCode::Enter => self.toggle_current_option(),
                KeyCode::Char('/') if self.current_column().is_some_and(FilterColumn::has_search) => {
                    self.focus = PanelFocus::Search;
                    None
                }
                KeyCode::Char('c') => self.clear_current_column(),
                KeyCode::Char('X') => Some(Action::ClearAllFilters),
                _ => None,
            },
            PanelFocus::Search => match key.code {
                KeyCode::Esc => {
                    self.search_query.clear();
                    self.option_index = 0;
                    self.focus = PanelFocus::Options;
                    None
                }
                KeyCode::Enter => {
                    self.focus = PanelFocus::Options;
                    None
                }
                KeyCode::Backspace => {
                    self.search_query.pop();
                    self.option_index = 0;
                    None
                }
                KeyCode::Char(c) => {
                    self.search_query.push(c);
                    self.option_index = 0;
                    None
                }
                _ => None,
            },
            PanelFocus::DateFrom | PanelFocus::DateTo => match key.code {
                KeyCode::Esc => {
                    self.focus = PanelFocus::Columns;
                    None
                }
                KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
                    self.focus = if self.focus == PanelFocus::DateFrom {
                        PanelFocus::DateTo
                    } else {
                        PanelFocus::DateFrom
                    };
                    None
                }
                KeyCode::Enter => self.apply_date_inputs(),
                KeyCode::Backspace => self.edit_date_input(|text| {
                    text.pop();
                }),
                KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                    self.edit_date_input(|text| text.push(c))
                }
                KeyCode::Char('c') => self.clear_current_column(),
                KeyCode::Char('X') => Some(Action::ClearAllFilters),
                _ => None,
            },
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let popup_area = proportional_popup(area, 80);
        frame.render_widget(Clear, popup_area);

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Summary
                Constraint::Min(5),    // Columns + options
                Constraint::Length(3), // Help bar
            ])
            .split(popup_area);

        self.draw_summary(frame, main_chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(main_chunks[1]);

        self.draw_column_list(frame, body[0]);
        match self.current_column().cloned() {
            Some(column) if column.date_field => self.draw_date_range(frame, body[1], &column),
            Some(column) => self.draw_option_list(frame, body[1], &column),
            None => {
                let empty = Paragraph::new(Line::from(Span::styled(
                    "No visible columns to filter",
                    Style::default().fg(Color::Yellow),
                )))
                .block(Block::default().borders(Borders::ALL));
                frame.render_widget(empty, body[1]);
            }
        }

        self.draw_help(frame, main_chunks[2]);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rendering
// ═══════════════════════════════════════════════════════════════════════════════

impl FilterPanel {
    fn draw_summary(&self, frame: &mut Frame, area: Rect) {
        let active = self
            .columns
            .iter()
            .filter(|c| self.session.active.badge(&c.id).is_some())
            .count();
        let text = if self.session.active.any_active() {
            format!("{} column(s) filtered", active)
        } else {
            "No filters active".to_string()
        };

        let header = Paragraph::new(Line::from(Span::styled(text, Style::default().fg(Color::Cyan))))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Filters ")
                    .title_style(
                        Style::default()
                            .fg(Color::Magenta)
                            .add_modifier(Modifier::BOLD),
                    ),
            );
        frame.render_widget(header, area);
    }

    fn draw_column_list(&mut self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .columns
            .iter()
            .map(|column| {
                let badge = match self.session.active.badge(&column.id) {
                    Some(FilterBadge::Count(n)) => format!(" [{}]", n),
                    Some(FilterBadge::DateRange) => " [range]".to_string(),
                    None => String::new(),
                };
                let marker = if badge.is_empty() { "  " } else { "● " };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(Color::Green)),
                    Span::styled(column.header.clone(), Style::default().fg(Color::White)),
                    Span::styled(badge, Style::default().fg(Color::Yellow)),
                ]))
            })
            .collect();

        let focused = self.focus == PanelFocus::Columns;
        self.column_state.select(Some(self.column_index));
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Columns ")
                    .border_style(border_style(focused)),
            )
            .highlight_style(highlight_style(focused))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut self.column_state);
    }

    fn draw_option_list(&mut self, frame: &mut Frame, area: Rect, column: &FilterColumn) {
        let list_area = if column.has_search() {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(3)])
                .split(area);

            let searching = self.focus == PanelFocus::Search;
            let cursor = if searching { "▏" } else { "" };
            let search = Paragraph::new(Line::from(vec![
                Span::styled("/ ", Style::default().fg(Color::Cyan)),
                Span::raw(format!("{}{}", self.search_query, cursor)),
            ]))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Search ")
                    .border_style(border_style(searching)),
            );
            frame.render_widget(search, chunks[0]);
            chunks[1]
        } else {
            area
        };

        let options = self.visible_options();
        let items: Vec<ListItem> = if options.is_empty() {
            vec![ListItem::new(Span::styled(
                "No matching values",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            options
                .iter()
                .map(|value| {
                    let checked = self.session.active.is_checked(&column.id, value);
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            if checked { "[x] " } else { "[ ] " },
                            Style::default().fg(Color::Green),
                        ),
                        Span::styled(
                            value.to_string(),
                            if checked {
                                Style::default()
                                    .fg(Color::Cyan)
                                    .add_modifier(Modifier::BOLD)
                            } else {
                                Style::default().fg(Color::White)
                            },
                        ),
                    ]))
                })
                .collect()
        };

        let focused = self.focus == PanelFocus::Options;
        self.option_state.select(Some(self.option_index));
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", column.header))
                    .border_style(border_style(focused)),
            )
            .highlight_style(highlight_style(focused))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, list_area, &mut self.option_state);
    }

    fn draw_date_range(&mut self, frame: &mut Frame, area: Rect, column: &FilterColumn) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(3)])
            .split(area);

        let inputs = self.date_inputs.get(&column.id).cloned().unwrap_or_default();
        let input_span = |label: &str, text: &str, focused: bool| -> Vec<Span<'static>> {
            let style = if focused {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            let shown = if text.is_empty() { "YYYY-MM-DD" } else { text };
            vec![
                Span::styled(format!("{}: ", label), Style::default().fg(Color::Yellow)),
                Span::styled(format!(" {:10} ", shown), style),
                Span::raw("  "),
            ]
        };

        let mut range_line = input_span("From", &inputs.from, self.focus == PanelFocus::DateFrom);
        range_line.extend(input_span("To", &inputs.to, self.focus == PanelFocus::DateTo));

        let mut lines = vec![Line::from(range_line)];
        if let Some((min, max)) = column.bounds {
            lines.push(Line::from(Span::styled(
                format!(
                    "Available: {} to {}",
                    min.format(DATE_INPUT_FORMAT),
                    max.format(DATE_INPUT_FORMAT)
                ),
                Style::default().fg(Color::DarkGray),
            )));
        }
        if let Some(active) = self.session.active.date_range(&column.id) {
            lines.push(Line::from(Span::styled(
                format!("Active: {}", describe_range(&active)),
                Style::default().fg(Color::Green),
            )));
        }
        if let Some(error) = &self.input_error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }

        let focused = matches!(self.focus, PanelFocus::DateFrom | PanelFocus::DateTo);
        let range = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", column.header))
                .border_style(border_style(focused)),
        );
        frame.render_widget(range, chunks[0]);

        let matches: Vec<ListItem> = self
            .visible_options()
            .into_iter()
            .map(|ts| ListItem::new(Span::styled(ts.clone(), Style::default().fg(Color::White))))
            .collect();
        let count = matches.len();
        let list = List::new(matches).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} matching ", count))
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(list, chunks[1]);
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let mut help_text = match self.focus {
            PanelFocus::Columns => vec![
                Span::styled(" Enter ", Style::default().fg(Color::Yellow)),
                Span::raw("Edit  "),
                Span::styled(" j/k ", Style::default().fg(Color::Cyan)),
                Span::raw("Navigate  "),
                Span::styled(" c ", Style::default().fg(Color::Cyan)),
                Span::raw("Clear column  "),
            ],
            PanelFocus::Options => {
                let mut spans = vec![
                    Span::styled(" Space ", Style::default().fg(Color::Yellow)),
                    Span::raw("Toggle  "),
                    Span::styled(" j/k ", Style::default().fg(Color::Cyan)),
                    Span::raw("Navigate  "),
                ];
                if self.current_column().is_some_and(FilterColumn::has_search) {
                    spans.push(Span::styled(" / ", Style::default().fg(Color::Cyan)));
                    spans.push(Span::raw("Search  "));
                }
                spans
            }
            PanelFocus::Search => vec![
                Span::styled(" Enter ", Style::default().fg(Color::Yellow)),
                Span::raw("Done  "),
                Span::styled(" Esc ", Style::default().fg(Color::Yellow)),
                Span::raw("Clear search  "),
            ],
            PanelFocus::DateFrom | PanelFocus::DateTo => vec![
                Span::styled(" Enter ", Style::default().fg(Color::Yellow)),
                Span::raw("Apply  "),
                Span::styled(" Tab ", Style::default().fg(Color::Cyan)),
                Span::raw("From/To  "),
            ],
        };

        if self.session.active.any_active() && self.focus != PanelFocus::Search {
            help_text.push(Span::styled(" X ", Style::default().fg(Color::Yellow)));
            help_text.push(Span::raw("Clear all  "));
        }
        help_text.push(Span::styled(" Esc ", Style::default().fg(Color::Yellow)));
        help_text.push(Span::raw(if self.focus == PanelFocus::Columns { "Close" } else { "Back" }));

        let help = Paragraph::new(Line::from(help_text))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn describe_range(range: &DateRange) -> String {
    let end = |d: Option<NaiveDate>| {
        d.map(|d| d.format(DATE_INPUT_FORMAT).to_string())
            .unwrap_or_else(|| "…".to_string())
    };
    format!("{} to {}", end(range.from), end(range.to))
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn highlight_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    }
}
