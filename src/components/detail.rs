//! Schedule detail dialog
//!
//! Recipients of one schedule grouped by enrollment status, followed by the
//! pending requests for its item. Addresses can be picked one by one or a
//! group at a time and turned into a `mailto:` link.

use crate::action::Action;
use crate::component::Component;
use crate::components::layout::proportional_popup;
use crate::model::selection::{EmailSelection, GroupKind, ScheduleDetail};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

/// One line of the recipient list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Group(usize),
    Recipient(usize, usize),
}

/// Schedule detail dialog
pub struct DetailDialog {
    pub detail: Option<ScheduleDetail>,
    pub selection: EmailSelection,
    /// Title of the request group
    pub requests_label: String,
    pub cursor: usize,
    list_state: ListState,
}

impl Default for DetailDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl DetailDialog {
    pub fn new() -> Self {
        Self {
            detail: None,
            selection: EmailSelection::new(),
            requests_label: "Requests".to_string(),
            cursor: 0,
            list_state: ListState::default(),
        }
    }

    /// Show a schedule, starting with an empty selection
    pub fn open(&mut self, detail: ScheduleDetail, requests_label: String) {
        self.detail = Some(detail);
        self.requests_label = requests_label;
        self.selection.deselect_all();
        self.cursor = 0;
    }

    fn entries(&self) -> Vec<Entry> {
        let Some(detail) = &self.detail else {
            return Vec::new();
        };
        let mut entries = Vec::new();
        for (g, group) in detail.groups.iter().enumerate() {
            entries.push(Entry::Group(g));
            entries.extend((0..group.recipients.len()).map(|r| Entry::Recipient(g, r)));
        }
        entries
    }

    fn current_entry(&self) -> Option<Entry> {
        self.entries().get(self.cursor).copied()
    }

    /// Mail link for the selection, with the schedule title as subject
    pub fn mailto_link(&self) -> String {
        let subject = self
            .detail
            .as_ref()
            .and_then(|d| d.title.as_deref())
            .unwrap_or("");
        self.selection.mailto_link(subject)
    }

    fn group_title(&self, kind: GroupKind, title: &str) -> String {
        match kind {
            GroupKind::Status => title.to_string(),
            GroupKind::Requests => self.requests_label.clone(),
        }
    }

    fn toggle_current(&mut self) {
        let Some(detail) = &self.detail else {
            return;
        };
        match self.current_entry() {
            Some(Entry::Recipient(g, r)) => {
                let email = detail.groups[g].recipients[r].email.clone();
                self.selection.toggle(email.as_deref());
            }
            Some(Entry::Group(_)) => self.select_current_group(),
            None => {}
        }
    }

    fn select_current_group(&mut self) {
        let Some(detail) = &self.detail else {
            return;
        };
        let group = match self.current_entry() {
            Some(Entry::Group(g)) | Some(Entry::Recipient(g, _)) => g,
            None => return,
        };
        self.selection.select_all(detail.groups[group].emails());
    }
}

impl Component for DetailDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(Action::CloseModal),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < self.entries().len() {
                    self.cursor += 1;
                }
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            KeyCode::Char(' ') | KeyCode::Enter => Some(Action::ToggleRecipient),
            KeyCode::Char('a') => Some(Action::SelectGroup),
            KeyCode::Char('d') => Some(Action::DeselectAllRecipients),
            KeyCode::Char('m') => Some(Action::ComposeEmail),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::ToggleRecipient => self.toggle_current(),
            Action::SelectGroup => self.select_current_group(),
            Action::DeselectAllRecipients => self.selection.deselect_all(),
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let popup_area = proportional_popup(area, 80);
        frame.render_widget(Clear, popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Schedule
                Constraint::Min(3),    // Recipients
                Constraint::Length(4), // Selection
                Constraint::Length(3), // Help bar
            ])
            .split(popup_area);

        let (title, schd_id, count) = match &self.detail {
            Some(d) => (
                d.title.clone().unwrap_or_default(),
                d.schd_id,
                d.recipient_count(),
            ),
            None => (String::new(), 0, 0),
        };
        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                title,
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {} recipient(s)", count),
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Schedule {} ", schd_id))
                .title_style(
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                ),
        );
        frame.render_widget(header, chunks[0]);

        let mut items = Vec::new();
        if let Some(detail) = &self.detail {
            for entry in self.entries() {
                let item = match entry {
                    Entry::Group(g) => {
                        let group = &detail.groups[g];
                        ListItem::new(Line::from(vec![
                            Span::styled(
                                self.group_title(group.kind, &group.title),
                                Style::default()
                                    .fg(Color::Yellow)
                                    .add_modifier(Modifier::BOLD),
                            ),
                            Span::styled(
                                format!(" ({})", group.recipients.len()),
                                Style::default().fg(Color::DarkGray),
                            ),
                        ]))
                    }
                    Entry::Recipient(g, r) => {
                        let recipient = &detail.groups[g].recipients[r];
                        let checked = recipient
                            .email
                            .as_deref()
                            .is_some_and(|e| self.selection.contains(e));
                        let mark = match (&recipient.email, checked) {
                            (None, _) => "    ",
                            (Some(_), true) => "[x] ",
                            (Some(_), false) => "[ ] ",
                        };
                        ListItem::new(Line::from(vec![
                            Span::raw("  "),
                            Span::styled(mark, Style::default().fg(Color::Green)),
                            Span::styled(
                                recipient.display_name(),
                                Style::default().fg(Color::White),
                            ),
                            Span::styled(
                                format!(
                                    "  {}",
                                    recipient.email.as_deref().unwrap_or("no e-mail address")
                                ),
                                Style::default().fg(Color::DarkGray),
                            ),
                        ]))
                    }
                };
                items.push(item);
            }
        }

        if self.detail.as_ref().map_or(true, ScheduleDetail::is_empty) {
            let empty = Paragraph::new(Line::from(Span::styled(
                "No enrollments or requests for this schedule",
                Style::default().fg(Color::Yellow),
            )))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
            frame.render_widget(empty, chunks[1]);
        } else {
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
            self.list_state.select(Some(self.cursor));
            frame.render_stateful_widget(list, chunks[1], &mut self.list_state);
        }

        let selection = Paragraph::new(vec![Line::from(Span::styled(
            self.mailto_link(),
            Style::default().fg(Color::Cyan),
        ))])
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} selected ", self.selection.len())),
        );
        frame.render_widget(selection, chunks[2]);

        let help = Paragraph::new(Line::from(vec![
            Span::styled(" Space ", Style::default().fg(Color::Yellow)),
            Span::raw("Select  "),
            Span::styled(" a ", Style::default().fg(Color::Cyan)),
            Span::raw("Select group  "),
            Span::styled(" d ", Style::default().fg(Color::Cyan)),
            Span::raw("Deselect all  "),
            Span::styled(" m ", Style::default().fg(Color::Green)),
            Span::raw("Compose e-mail  "),
            Span::styled(" Esc ", Style::default().fg(Color::Yellow)),
            Span::raw("Close"),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[3]);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::selection::{Recipient, RecipientGroup};
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn recipient(name: &str, email: Option<&str>) -> Recipient {
        Recipient {
            first_name: name.to_string(),
            last_name: String::new(),
            email: email.map(str::to_string),
        }
    }

    fn dialog() -> DetailDialog {
        let detail = ScheduleDetail {
            schd_id: 7,
            title: Some("Fire Safety".to_string()),
            groups: vec![
                RecipientGroup {
                    kind: GroupKind::Status,
                    title: "Enrolled".to_string(),
                    recipients: vec![
                        recipient("Ada", Some("ada@example.com")),
                        recipient("Alan", None),
                    ],
                },
                RecipientGroup {
                    kind: GroupKind::Requests,
                    title: String::new(),
                    recipients: vec![recipient("Grace", Some("grace@example.com"))],
                },
            ],
        };
        let mut dialog = DetailDialog::new();
        dialog.open(detail, "Requests".to_string());
        dialog
    }

    fn press(dialog: &mut DetailDialog, code: KeyCode) {
        if let Some(action) = dialog.handle_key_event(key(code)).unwrap() {
            dialog.update(action).unwrap();
        }
    }

    #[test]
    fn test_toggle_recipient_under_cursor() {
        let mut dialog = dialog();
        press(&mut dialog, KeyCode::Char('j'));
        press(&mut dialog, KeyCode::Char(' '));
        assert_eq!(dialog.selection.selected(), ["ada@example.com"]);

        press(&mut dialog, KeyCode::Char(' '));
        assert!(dialog.selection.is_empty());
    }

    #[test]
    fn test_recipient_without_address_is_ignored() {
        let mut dialog = dialog();
        press(&mut dialog, KeyCode::Char('j'));
        press(&mut dialog, KeyCode::Char('j'));
        press(&mut dialog, KeyCode::Char(' '));
        assert!(dialog.selection.is_empty());
    }

    #[test]
    fn test_select_group_on_header() {
        let mut dialog = dialog();
        // Cursor on the request group header
        for _ in 0..3 {
            press(&mut dialog, KeyCode::Char('j'));
        }
        press(&mut dialog, KeyCode::Char(' '));
        press(&mut dialog, KeyCode::Char('k'));
        press(&mut dialog, KeyCode::Char('a'));
        assert_eq!(
            dialog.selection.selected(),
            ["grace@example.com", "ada@example.com"]
        );

        press(&mut dialog, KeyCode::Char('d'));
        assert!(dialog.selection.is_empty());
        assert_eq!(dialog.mailto_link(), "#");
    }

    #[test]
    fn test_mailto_uses_schedule_title() {
        let mut dialog = dialog();
        press(&mut dialog, KeyCode::Char('a'));
        assert_eq!(
            dialog.mailto_link(),
            "mailto:ada@example.com?subject=Fire%20Safety&body="
        );
    }

    #[test]
    fn test_open_resets_selection() {
        let mut dialog = dialog();
        press(&mut dialog, KeyCode::Char('a'));
        let detail = dialog.detail.clone().unwrap();
        dialog.open(detail, "Requests".to_string());
        assert!(dialog.selection.is_empty());
        assert_eq!(dialog.cursor, 0);
    }
}
