//! Help dialog component
//!
//! Lists the keyboard shortcuts of the grid and its dialogs.

use crate::action::Action;
use crate::component::Component;
use crate::components::layout::proportional_popup;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

/// Help dialog showing all keyboard shortcuts
#[derive(Default)]
pub struct HelpDialog {
    pub scroll_offset: usize,
}

impl Component for HelpDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => Some(Action::CloseModal),
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
                None
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_add(10);
                None
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
                None
            }
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, _action: Action) -> Result<Option<Action>> {
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let dialog_area = proportional_popup(area, 80);
        frame.render_widget(Clear, dialog_area);

        let content = build_help_content();
        let total = content.len();
        let visible_height = dialog_area.height.saturating_sub(2) as usize;

        // Clamp scroll offset
        let max_scroll = total.saturating_sub(visible_height);
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }

        let paragraph = Paragraph::new(content.clone())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Keyboard Shortcuts ")
                    .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .scroll((self.scroll_offset as u16, 0));

        frame.render_widget(paragraph, dialog_area);

        // Render scrollbar if content exceeds visible area
        if total > visible_height {
            let mut scrollbar_state =
                ScrollbarState::new(total.saturating_sub(visible_height)).position(self.scroll_offset);

            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("↑"))
                    .end_symbol(Some("↓")),
                dialog_area.inner(ratatui::layout::Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }

        Ok(())
    }
}

/// Build the help content with all keyboard shortcuts
fn build_help_content() -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    // Helper to add a section header
    let add_section = |lines: &mut Vec<Line<'static>>, title: &str| {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {} ", title),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("  {}", "─".repeat(title.len() + 2)),
            Style::default().fg(Color::DarkGray),
        )));
    };

    // Helper to add a shortcut line
    let add_shortcut = |lines: &mut Vec<Line<'static>>, key: &str, description: &str| {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:12}", key),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(description.to_string(), Style::default().fg(Color::White)),
        ]));
    };

    // Navigation
    add_section(&mut lines, "Navigation");
    add_shortcut(&mut lines, "j / ↓", "Next row");
    add_shortcut(&mut lines, "k / ↑", "Previous row");
    add_shortcut(&mut lines, "g / G", "First / last row");
    add_shortcut(&mut lines, "h / l", "Focus previous / next column");
    add_shortcut(&mut lines, "n / PgDn", "Next page");
    add_shortcut(&mut lines, "p / PgUp", "Previous page");
    add_shortcut(&mut lines, "Enter", "Open schedule recipients");

    // Columns
    add_section(&mut lines, "Columns");
    add_shortcut(&mut lines, "s", "Sort focused column (asc, desc, off)");
    add_shortcut(&mut lines, "< / >", "Move focused column left / right");
    add_shortcut(&mut lines, "x", "Hide focused column");
    add_shortcut(&mut lines, "c", "Open field chooser");
    add_shortcut(&mut lines, "m", "Pick up / drop column (in chooser)");

    // Filters
    add_section(&mut lines, "Filters");
    add_shortcut(&mut lines, "f", "Open filter panel");
    add_shortcut(&mut lines, "Space", "Toggle option (in panel)");
    add_shortcut(&mut lines, "/", "Search options (in panel)");
    add_shortcut(&mut lines, "Enter", "Apply date range (in panel)");
    add_shortcut(&mut lines, "c", "Clear column filter (in panel)");
    add_shortcut(&mut lines, "X", "Clear all filters");

    // Recipients
    add_section(&mut lines, "Recipients");
    add_shortcut(&mut lines, "Space", "Select recipient");
    add_shortcut(&mut lines, "a", "Select whole group");
    add_shortcut(&mut lines, "d", "Deselect all");
    add_shortcut(&mut lines, "m", "Compose e-mail");

    // Export
    add_section(&mut lines, "Export");
    add_shortcut(&mut lines, "e", "Export filtered rows to CSV");

    // General
    add_section(&mut lines, "General");
    add_shortcut(&mut lines, "?", "Show this help");
    add_shortcut(&mut lines, "q", "Quit / Close dialog");

    // Footer
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Press q, Esc, or ? to close",
        Style::default().fg(Color::DarkGray),
    )));

    lines
}
