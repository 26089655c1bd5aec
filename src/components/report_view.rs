//! Report view - the main screen
//!
//! Owns the grid's presentation state (focused column, selected row, sort
//! and page). Rendering goes through `draw_report_screen`, which reads the
//! report data from a `ReportRenderContext`.

use crate::action::Action;
use crate::component::Component;
use crate::components::layout::{calculate_report_layout, centered_popup};
use crate::components::table::{build_grid_lines, row_window, GridColumn};
use crate::model::projection::{initial_sort, project};
use crate::model::{ColumnDescriptor, Pagination, ReportState, SortState};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Report View State
// ═══════════════════════════════════════════════════════════════════════════════

/// Presentation state of the report grid
#[derive(Debug, Clone)]
pub struct ReportView {
    /// Index into the visible columns
    pub focused_column: usize,
    /// Row index inside the current page
    pub selected_row: usize,
    pub sort: Option<SortState>,
    pub pagination: Pagination,
}

impl Default for ReportView {
    fn default() -> Self {
        Self::new(Pagination::default().page_size)
    }
}

impl ReportView {
    pub fn new(page_size: usize) -> Self {
        Self {
            focused_column: 0,
            selected_row: 0,
            sort: None,
            pagination: Pagination::new(page_size),
        }
    }

    /// Take the sort order carried by the descriptors, if any
    pub fn reset_sort(&mut self, columns: &[ColumnDescriptor]) {
        self.sort = initial_sort(columns);
    }

    /// Position of the selected row among all filtered rows
    pub fn selected_index(&self) -> usize {
        self.pagination.page * self.pagination.page_size + self.selected_row
    }

    fn page_len(&self, total: usize) -> usize {
        self.pagination.range(total).len()
    }

    pub fn focused_column_id(&self, state: &ReportState) -> Option<String> {
        state
            .visible_columns()
            .get(self.focused_column)
            .map(|c| c.id.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────

    pub fn next_row(&mut self, total: usize) {
        if self.selected_row + 1 < self.page_len(total) {
            self.selected_row += 1;
        } else if self.pagination.page + 1 < self.pagination.page_count(total) {
            self.pagination.next(total);
            self.selected_row = 0;
        }
    }

    pub fn previous_row(&mut self, total: usize) {
        if self.selected_row > 0 {
            self.selected_row -= 1;
        } else if self.pagination.page > 0 {
            self.pagination.previous();
            self.selected_row = self.page_len(total).saturating_sub(1);
        }
    }

    pub fn first_row(&mut self) {
        self.pagination.page = 0;
        self.selected_row = 0;
    }

    pub fn last_row(&mut self, total: usize) {
        self.pagination.page = self.pagination.page_count(total) - 1;
        self.selected_row = self.page_len(total).saturating_sub(1);
    }

    pub fn next_page(&mut self, total: usize) {
        self.pagination.next(total);
        self.selected_row = 0;
    }

    pub fn previous_page(&mut self) {
        self.pagination.previous();
        self.selected_row = 0;
    }

    pub fn next_column(&mut self, visible: usize) {
        if self.focused_column + 1 < visible {
            self.focused_column += 1;
        }
    }

    pub fn previous_column(&mut self) {
        self.focused_column = self.focused_column.saturating_sub(1);
    }

    /// Focus a column by id after the layout changed
    pub fn focus_column(&mut self, state: &ReportState, column_id: &str) {
        if let Some(index) = state
            .visible_columns()
            .iter()
            .position(|c| c.id == column_id)
        {
            self.focused_column = index;
        }
    }

    /// Cycle the sort of the focused column
    pub fn cycle_sort(&mut self, state: &ReportState) {
        if let Some(column_id) = self.focused_column_id(state) {
            self.sort = SortState::cycle(self.sort.as_ref(), &column_id);
        }
    }

    /// Keep cursor, page and sort valid after columns or filters changed
    pub fn clamp(&mut self, state: &ReportState, total: usize) {
        let visible = state.visible_columns();
        self.focused_column = self.focused_column.min(visible.len().saturating_sub(1));

        if let Some(sort) = &self.sort {
            if !visible.iter().any(|c| c.id == sort.column_id) {
                self.sort = None;
            }
        }

        self.pagination.clamp(total);
        self.selected_row = self
            .selected_row
            .min(self.page_len(total).saturating_sub(1));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Component Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl Component for ReportView {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            // Rows and pages
            KeyCode::Char('j') | KeyCode::Down => Some(Action::NextRow),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::PrevRow),
            KeyCode::Char('g') | KeyCode::Home => Some(Action::FirstRow),
            KeyCode::Char('G') | KeyCode::End => Some(Action::LastRow),
            KeyCode::Char('n') | KeyCode::Char(']') | KeyCode::PageDown => Some(Action::NextPage),
            KeyCode::Char('p') | KeyCode::Char('[') | KeyCode::PageUp => Some(Action::PrevPage),

            // Columns
            KeyCode::Char('l') | KeyCode::Right => Some(Action::NextColumn),
            KeyCode::Char('h') | KeyCode::Left => Some(Action::PrevColumn),
            KeyCode::Char('s') => Some(Action::CycleSort),
            KeyCode::Char('<') | KeyCode::Char('H') => Some(Action::MoveColumnLeft),
            KeyCode::Char('>') | KeyCode::Char('L') => Some(Action::MoveColumnRight),
            KeyCode::Char('x') => Some(Action::HideColumn),

            // Filters and dialogs
            KeyCode::Char('f') => Some(Action::OpenFilters),
            KeyCode::Char('X') => Some(Action::ClearAllFilters),
            KeyCode::Char('c') => Some(Action::OpenFieldChooser),
            KeyCode::Enter => Some(Action::OpenDetail),
            KeyCode::Char('e') => Some(Action::ExportCsv),
            KeyCode::Char('?') => Some(Action::OpenHelp),
            KeyCode::Char('q') => Some(Action::OpenQuitDialog),

            _ => None,
        };
        Ok(action)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        let action = match mouse.kind {
            MouseEventKind::ScrollDown => Some(Action::NextRow),
            MouseEventKind::ScrollUp => Some(Action::PrevRow),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, _action: Action) -> Result<Option<Action>> {
        // Navigation needs the row count, so App calls the methods above
        Ok(None)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        // Drawing goes through draw_report_screen
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rendering Functions
// ═══════════════════════════════════════════════════════════════════════════════

/// Context needed for rendering the report screen
pub struct ReportRenderContext<'a> {
    pub state: &'a ReportState,
    pub error: Option<&'a str>,
    pub status_message: Option<&'a str>,
}

/// Draw the report screen
pub fn draw_report_screen(
    frame: &mut Frame,
    area: Rect,
    view: &mut ReportView,
    ctx: &ReportRenderContext,
) -> Result<()> {
    let has_status = ctx.error.is_some() || ctx.status_message.is_some();
    let layout = calculate_report_layout(area, has_status);

    let rows = ctx.state.sorted_rows(view.sort.as_ref());
    let total = rows.len();
    view.clamp(ctx.state, total);

    render_header(frame, layout.header, ctx, total);

    let range = view.pagination.range(total);
    let page = project(
        rows[range.clone()].iter().copied(),
        ctx.state.columns(),
        &ctx.state.context(),
    );

    if ctx.state.is_empty() {
        render_message(frame, layout.grid, "No results", None);
    } else if page.column_ids.is_empty() {
        render_message(
            frame,
            layout.grid,
            "All columns are hidden",
            Some("Press c to choose the fields to show"),
        );
    } else if total == 0 {
        render_message(
            frame,
            layout.grid,
            "No results",
            Some("No rows match the active filters. Press X to clear them"),
        );
    } else {
        let columns: Vec<GridColumn> = ctx
            .state
            .visible_columns()
            .into_iter()
            .map(|c| GridColumn {
                header: ctx.state.context().header(c),
                sort: view
                    .sort
                    .as_ref()
                    .filter(|s| s.column_id == c.id)
                    .map(|s| s.direction),
                badge: ctx.state.filters.active.badge(&c.id),
            })
            .collect();

        render_grid(frame, layout.grid, view, &columns, &page.rows, total, range.start);
    }

    if let Some(status_area) = layout.status {
        render_status_bar(frame, status_area, ctx);
    }
    render_help_bar(frame, layout.help, ctx);

    Ok(())
}

fn render_header(frame: &mut Frame, area: Rect, ctx: &ReportRenderContext, total: usize) {
    let all = ctx.state.rows().len();
    let mut spans = vec![
        Span::styled(
            format!(" {} ", ctx.state.labels.lookup("label.Results")),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            format!("{} of {} schedules", total, all),
            Style::default().fg(Color::White),
        ),
    ];

    if ctx.state.filters.active.any_active() {
        spans.push(Span::styled(
            "  filters active",
            Style::default().fg(Color::Yellow),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_grid(
    frame: &mut Frame,
    area: Rect,
    view: &ReportView,
    columns: &[GridColumn],
    page_rows: &[Vec<String>],
    total: usize,
    first_index: usize,
) {
    // Borders, header line and separator line
    let body_height = area.height.saturating_sub(4) as usize;
    let window = row_window(view.selected_row, page_rows.len(), body_height);
    let selected = view.selected_row.checked_sub(window.start);

    let lines = build_grid_lines(
        columns,
        &page_rows[window.clone()],
        view.focused_column,
        selected,
        area.width.saturating_sub(2) as usize,
    );

    let footer = format!(
        " Page {}/{} · rows {}-{} of {} ",
        view.pagination.page + 1,
        view.pagination.page_count(total),
        first_index + 1,
        first_index + page_rows.len(),
        total
    );

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Schedules ")
            .title_bottom(Line::from(Span::styled(
                footer,
                Style::default().fg(Color::Yellow),
            )))
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(paragraph, area);

    if page_rows.len() > body_height {
        let mut scrollbar_state = ScrollbarState::new(page_rows.len()).position(view.selected_row);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓")),
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_message(frame: &mut Frame, area: Rect, title: &str, hint: Option<&str>) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            title.to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(hint) = hint {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            hint.to_string(),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(paragraph, area);
}

/// Screen shown instead of the report when the host is not authorized
pub fn draw_unauthorized_screen(frame: &mut Frame, area: Rect) {
    let popup_area = centered_popup(area, 56, 7);
    frame.render_widget(Clear, popup_area);

    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "This host is not authorized to display the report.",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                " q ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("Quit"),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Not authorized "),
        );
    frame.render_widget(paragraph, popup_area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, ctx: &ReportRenderContext) {
    let mut spans = vec![];

    if let Some(error) = ctx.error {
        spans.push(Span::styled(
            format!(" Error: {} ", error),
            Style::default().fg(Color::Red),
        ));
    }

    if let Some(status) = ctx.status_message {
        spans.push(Span::styled(
            format!(" {} ", status),
            Style::default().fg(Color::Yellow),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn key_span(key: &str, color: Color) -> Span<'static> {
    Span::styled(
        format!(" {} ", key),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

fn render_help_bar(frame: &mut Frame, area: Rect, ctx: &ReportRenderContext) {
    let mut spans = vec![
        key_span("q", Color::Yellow),
        Span::raw("Quit "),
        key_span("s", Color::Green),
        Span::raw("Sort "),
        key_span("f", Color::Cyan),
        Span::raw("Filter "),
        key_span("c", Color::Cyan),
        Span::raw("Fields "),
        key_span("</>", Color::Cyan),
        Span::raw("Move "),
        key_span("x", Color::Cyan),
        Span::raw("Hide "),
        key_span("Enter", Color::Magenta),
        Span::raw("Recipients "),
        key_span("e", Color::Green),
        Span::raw("Export "),
    ];

    if ctx.state.filters.active.any_active() {
        spans.push(key_span("X", Color::Yellow));
        spans.push(Span::raw("Clear filters "));
    }

    spans.push(key_span("?", Color::White));
    spans.push(Span::raw("Help"));

    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Left),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resolve::LabelDictionary;
    use crate::model::{Dataset, SortDirection};
    use serde_json::json;

    fn state(rows: usize) -> ReportState {
        let sched: Vec<_> = (0..rows)
            .map(|i| json!({"SCHD_ID": i, "CPNT_ID": format!("C{}", i), "CPNT_TITLE": "t"}))
            .collect();
        let dataset: Dataset = serde_json::from_value(json!({ "sched": sched })).unwrap();
        ReportState::new(dataset, LabelDictionary::default(), None)
    }

    #[test]
    fn test_next_row_crosses_page_boundary() {
        let mut view = ReportView::new(2);
        view.next_row(5);
        assert_eq!((view.pagination.page, view.selected_row), (0, 1));
        view.next_row(5);
        assert_eq!((view.pagination.page, view.selected_row), (1, 0));
        assert_eq!(view.selected_index(), 2);
    }

    #[test]
    fn test_previous_row_goes_to_end_of_previous_page() {
        let mut view = ReportView::new(2);
        view.next_page(5);
        view.previous_row(5);
        assert_eq!((view.pagination.page, view.selected_row), (0, 1));
    }

    #[test]
    fn test_last_row_on_partial_page() {
        let mut view = ReportView::new(25);
        view.last_row(52);
        assert_eq!(view.pagination.page, 2);
        assert_eq!(view.selected_row, 1);
        assert_eq!(view.selected_index(), 51);
    }

    #[test]
    fn test_cycle_sort_on_focused_column() {
        let state = state(3);
        let mut view = ReportView::default();
        view.next_column(state.visible_columns().len());
        let focused = view.focused_column_id(&state).unwrap();

        view.cycle_sort(&state);
        assert_eq!(view.sort.as_ref().map(|s| s.direction), Some(SortDirection::Asc));
        view.cycle_sort(&state);
        assert_eq!(view.sort.as_ref().map(|s| s.direction), Some(SortDirection::Desc));
        assert_eq!(view.sort.as_ref().map(|s| s.column_id.clone()), Some(focused));
        view.cycle_sort(&state);
        assert!(view.sort.is_none());
    }

    #[test]
    fn test_clamp_after_rows_shrink() {
        let state = state(60);
        let mut view = ReportView::new(25);
        view.last_row(60);
        view.focused_column = 9;

        view.clamp(&state, 3);
        assert_eq!(view.pagination.page, 0);
        assert_eq!(view.selected_row, 2);
        assert_eq!(view.focused_column, state.visible_columns().len() - 1);
    }

    #[test]
    fn test_clamp_drops_sort_of_hidden_column() {
        let state = state(3);
        let mut view = ReportView::default();
        view.sort = Some(SortState {
            column_id: "CPNT_TITLE".to_string(),
            direction: SortDirection::Asc,
        });
        view.clamp(&state, 3);
        assert!(view.sort.is_none());
    }
}
