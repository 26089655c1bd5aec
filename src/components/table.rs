//! Grid rendering helpers
//!
//! Turns a page of display text into styled lines. Column widths follow the
//! content, measured in terminal cells, and the visible window of columns
//! follows the focused column.

use crate::model::{FilterBadge, SortDirection};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use std::ops::Range;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Columns never grow wider than this many cells
pub const MAX_COLUMN_WIDTH: usize = 40;

const SEPARATOR: &str = " │ ";
const SEPARATOR_WIDTH: usize = 3;

/// Header of one grid column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridColumn {
    pub header: String,
    pub sort: Option<SortDirection>,
    pub badge: Option<FilterBadge>,
}

impl GridColumn {
    /// Header with sort arrow and filter badge
    pub fn title(&self) -> String {
        let mut title = self.header.clone();
        match self.sort {
            Some(SortDirection::Asc) => title.push_str(" ▲"),
            Some(SortDirection::Desc) => title.push_str(" ▼"),
            None => {}
        }
        match self.badge {
            Some(FilterBadge::Count(n)) => title.push_str(&format!(" [{}]", n)),
            Some(FilterBadge::DateRange) => title.push_str(" [range]"),
            None => {}
        }
        title
    }
}

/// Truncate or pad `text` to exactly `width` cells
pub fn fit_cell(text: &str, width: usize) -> String {
    let text_width = UnicodeWidthStr::width(text);
    if text_width <= width {
        return format!("{}{}", text, " ".repeat(width - text_width));
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// Widest cell per column, headers included, capped at `MAX_COLUMN_WIDTH`
pub fn column_widths(titles: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = titles.iter().map(|t| t.width()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.width());
            }
        }
    }
    for width in &mut widths {
        *width = (*width).clamp(1, MAX_COLUMN_WIDTH);
    }
    widths
}

fn span_width(widths: &[usize]) -> usize {
    widths.iter().sum::<usize>() + SEPARATOR_WIDTH * widths.len().saturating_sub(1)
}

/// Columns that fit into `available` cells while keeping `focused` on screen
pub fn column_window(widths: &[usize], focused: usize, available: usize) -> Range<usize> {
    if widths.is_empty() {
        return 0..0;
    }
    let focused = focused.min(widths.len() - 1);

    let mut start = 0;
    while start < focused && span_width(&widths[start..=focused]) > available {
        start += 1;
    }
    let mut end = focused + 1;
    while end < widths.len() && span_width(&widths[start..=end]) <= available {
        end += 1;
    }
    start..end
}

/// Rows to draw so that `selected` stays inside `visible` lines
pub fn row_window(selected: usize, total: usize, visible: usize) -> Range<usize> {
    if visible == 0 || total == 0 {
        return 0..0;
    }
    let start = selected.min(total - 1).saturating_sub(visible - 1);
    start..(start + visible).min(total)
}

/// Header, separator and body lines of one page
pub fn build_grid_lines(
    columns: &[GridColumn],
    rows: &[Vec<String>],
    focused: usize,
    selected: Option<usize>,
    available_width: usize,
) -> Vec<Line<'static>> {
    let titles: Vec<String> = columns.iter().map(GridColumn::title).collect();
    let widths = column_widths(&titles, rows);
    let window = column_window(&widths, focused, available_width);

    let mut lines = Vec::with_capacity(rows.len() + 2);

    let header_spans: Vec<Span> = window
        .clone()
        .flat_map(|i| {
            let mut style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
            if i == focused {
                style = style.add_modifier(Modifier::REVERSED);
            }
            if columns[i].badge.is_some() {
                style = style.fg(Color::Yellow);
            }
            vec![
                Span::styled(fit_cell(&titles[i], widths[i]), style),
                Span::raw(SEPARATOR),
            ]
        })
        .collect();
    lines.push(Line::from(header_spans));

    let separator = widths[window.clone()]
        .iter()
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join("─┼─");
    lines.push(Line::from(Span::styled(
        separator,
        Style::default().fg(Color::DarkGray),
    )));

    for (row_index, row) in rows.iter().enumerate() {
        let is_selected = selected == Some(row_index);
        let row_spans: Vec<Span> = window
            .clone()
            .flat_map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let cell = cell.replace(['\n', '\r'], " ");
                let mut style = Style::default().fg(Color::White);
                if is_selected {
                    style = style.bg(Color::Blue);
                    if i == focused {
                        style = style.add_modifier(Modifier::BOLD);
                    }
                }
                vec![
                    Span::styled(fit_cell(&cell, widths[i]), style),
                    Span::raw(SEPARATOR),
                ]
            })
            .collect();
        lines.push(Line::from(row_spans));
    }

    lines
}
