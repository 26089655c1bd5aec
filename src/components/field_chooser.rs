//! Field chooser dialog
//!
//! Searchable list of every column with a visibility toggle, plus
//! show-all / hide-all. A visible column can be picked up with `m` and
//! dropped onto another visible column.

use crate::action::Action;
use crate::component::Component;
use crate::components::layout::proportional_popup;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

/// One column as listed by the chooser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChooserEntry {
    pub id: String,
    pub header: String,
    pub visible: bool,
    pub order_number: u32,
}

/// Field chooser dialog
pub struct FieldChooser {
    /// Visible columns in display order, then hidden ones
    pub entries: Vec<ChooserEntry>,
    pub selected_index: usize,
    pub search_query: String,
    pub search_mode: bool,
    /// Column picked up for reordering
    pub moving: Option<String>,
    list_state: ListState,
}

impl Default for FieldChooser {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldChooser {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            selected_index: 0,
            search_query: String::new(),
            search_mode: false,
            moving: None,
            list_state: ListState::default(),
        }
    }

    /// Replace the entries; the cursor stays on the same column when it
    /// is still listed
    pub fn set_entries(&mut self, mut entries: Vec<ChooserEntry>) {
        let current = self.selected_entry().map(|e| e.id.clone());
        entries.sort_by_key(|e| (!e.visible, if e.visible { e.order_number } else { 0 }));
        self.entries = entries;

        self.selected_index = current
            .and_then(|id| self.filtered_entries().iter().position(|e| e.id == id))
            .unwrap_or(0);
    }

    /// Reset search and cursor when the dialog opens
    pub fn open(&mut self, entries: Vec<ChooserEntry>) {
        self.search_query.clear();
        self.search_mode = false;
        self.moving = None;
        self.selected_index = 0;
        self.entries.clear();
        self.set_entries(entries);
    }

    /// Entries whose header contains the search text, ignoring case
    pub fn filtered_entries(&self) -> Vec<&ChooserEntry> {
        let query = self.search_query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|e| query.is_empty() || e.header.to_lowercase().contains(&query))
            .collect()
    }

    pub fn selected_entry(&self) -> Option<&ChooserEntry> {
        self.filtered_entries().get(self.selected_index).copied()
    }

    /// Pick up the selected column, or drop the picked one onto it
    fn move_selected(&mut self) -> Option<Action> {
        let target = self.selected_entry().filter(|e| e.visible)?.id.clone();
        match self.moving.take() {
            None => {
                self.moving = Some(target);
                None
            }
            Some(from) if from == target => None,
            Some(from) => Some(Action::ReorderColumn { from, to: target }),
        }
    }

    fn select_next(&mut self) {
        if self.selected_index + 1 < self.filtered_entries().len() {
            self.selected_index += 1;
        }
    }

    fn select_prev(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }
}

impl Component for FieldChooser {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.search_mode {
            let action = match key.code {
                KeyCode::Esc => {
                    self.search_query.clear();
                    self.search_mode = false;
                    self.selected_index = 0;
                    None
                }
                KeyCode::Enter => {
                    self.search_mode = false;
                    None
                }
                KeyCode::Backspace => {
                    self.search_query.pop();
                    self.selected_index = 0;
                    None
                }
                KeyCode::Char(c) => {
                    self.search_query.push(c);
                    self.selected_index = 0;
                    None
                }
                _ => None,
            };
            return Ok(action);
        }

        let action = match key.code {
            KeyCode::Esc if self.moving.is_some() => {
                self.moving = None;
                None
            }
            KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('q') => Some(Action::CloseModal),
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_prev();
                None
            }
            KeyCode::Char(' ') | KeyCode::Enter => self
                .selected_entry()
                .map(|e| Action::ToggleColumn(e.id.clone())),
            KeyCode::Char('a') => Some(Action::ShowAllColumns),
            KeyCode::Char('n') => Some(Action::HideAllColumns),
            KeyCode::Char('m') => self.move_selected(),
            KeyCode::Char('/') => {
                self.search_mode = true;
                None
            }
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let popup_area = proportional_popup(area, 60);
        frame.render_widget(Clear, popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search
                Constraint::Min(3),    // Columns
                Constraint::Length(3), // Help bar
            ])
            .split(popup_area);

        let visible = self.entries.iter().filter(|e| e.visible).count();
        let cursor = if self.search_mode { "▏" } else { "" };
        let search = Paragraph::new(Line::from(vec![
            Span::styled("/ ", Style::default().fg(Color::Cyan)),
            Span::raw(format!("{}{}", self.search_query, cursor)),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Fields ({}/{} shown) ", visible, self.entries.len()))
                .title_style(
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                )
                .border_style(if self.search_mode {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default()
                }),
        );
        frame.render_widget(search, chunks[0]);

        let items: Vec<ListItem> = self
            .filtered_entries()
            .into_iter()
            .map(|entry| {
                let (mark, style) = if entry.visible {
                    (
                        "[x] ",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    ("[ ] ", Style::default().fg(Color::White))
                };
                let mark = if self.moving.as_deref() == Some(entry.id.as_str()) {
                    "↕   "
                } else {
                    mark
                };
                let mut spans = vec![
                    Span::styled(mark, Style::default().fg(Color::Green)),
                    Span::styled(entry.header.clone(), style),
                ];
                if entry.visible {
                    spans.push(Span::styled(
                        format!("  #{}", entry.order_number),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let empty = items.is_empty();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");
        self.list_state
            .select(if empty { None } else { Some(self.selected_index) });
        frame.render_stateful_widget(list, chunks[1], &mut self.list_state);

        let help_text = if self.moving.is_some() {
            vec![
                Span::styled(" m ", Style::default().fg(Color::Yellow)),
                Span::raw("Drop here  "),
                Span::styled(" Esc ", Style::default().fg(Color::Yellow)),
                Span::raw("Cancel move"),
            ]
        } else if self.search_mode {
            vec![
                Span::styled(" Enter ", Style::default().fg(Color::Yellow)),
                Span::raw("Done  "),
                Span::styled(" Esc ", Style::default().fg(Color::Yellow)),
                Span::raw("Clear search"),
            ]
        } else {
            vec![
                Span::styled(" Space ", Style::default().fg(Color::Yellow)),
                Span::raw("Show/Hide  "),
                Span::styled(" a ", Style::default().fg(Color::Cyan)),
                Span::raw("Show all  "),
                Span::styled(" n ", Style::default().fg(Color::Cyan)),
                Span::raw("Hide all  "),
                Span::styled(" m ", Style::default().fg(Color::Cyan)),
                Span::raw("Move  "),
                Span::styled(" / ", Style::default().fg(Color::Cyan)),
                Span::raw("Search  "),
                Span::styled(" Esc ", Style::default().fg(Color::Yellow)),
                Span::raw("Close"),
            ]
        };
        let help = Paragraph::new(Line::from(help_text))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[2]);

        Ok(())
    }
}
