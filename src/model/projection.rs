//! Grid projection: sorting, paging and the visible/filtered cell matrix
//! shared by the table view and the export.

use super::column::{ColumnDescriptor, SortDirection};
use super::dataset::Row;
use super::datetime::parse_timestamp;
use super::layout::visible_columns;
use super::resolve::ResolveContext;
use serde_json::Value;
use std::cmp::Ordering;

/// Rows per page
pub const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub column_id: String,
    pub direction: SortDirection,
}

impl SortState {
    /// Next state when the sort key of `column_id` is cycled:
    /// ascending, descending, unsorted
    pub fn cycle(current: Option<&SortState>, column_id: &str) -> Option<SortState> {
        let direction = match current {
            Some(state) if state.column_id == column_id => match state.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => return None,
            },
            _ => SortDirection::Asc,
        };
        Some(SortState {
            column_id: column_id.to_string(),
            direction,
        })
    }
}

/// Sort state carried by restored descriptors, first visible one wins
pub fn initial_sort(columns: &[ColumnDescriptor]) -> Option<SortState> {
    visible_columns(columns).into_iter().find_map(|column| {
        column.sorting.map(|direction| SortState {
            column_id: column.id.clone(),
            direction,
        })
    })
}

fn compare_values(a: &Value, b: &Value, date_field: bool) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) if date_field => {
            match (parse_timestamp(x), parse_timestamp(y)) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::String(x), Value::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        (x, y) => x.to_string().cmp(&y.to_string()),
    }
}

/// Stable sort of rows by one column; missing values always go last
pub fn sort_rows(rows: &mut [&Row], sort: &SortState, columns: &[ColumnDescriptor]) {
    let date_field = columns
        .iter()
        .find(|c| c.id == sort.column_id)
        .is_some_and(|c| c.date_field);

    rows.sort_by(|a, b| {
        let a = a.get(&sort.column_id).filter(|v| !v.is_null());
        let b = b.get(&sort.column_id).filter(|v| !v.is_null());
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => {
                let ordering = compare_values(a, b, date_field);
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            }
        }
    });
}

/// Headers and display cells of the visible columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableProjection {
    pub column_ids: Vec<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableProjection {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Project rows onto the visible columns in display order
pub fn project<'r>(
    rows: impl IntoIterator<Item = &'r Row>,
    columns: &[ColumnDescriptor],
    ctx: &ResolveContext<'_>,
) -> TableProjection {
    let visible = visible_columns(columns);

    TableProjection {
        column_ids: visible.iter().map(|c| c.id.clone()).collect(),
        headers: visible.iter().map(|c| ctx.header(c)).collect(),
        rows: rows
            .into_iter()
            .map(|row| {
                visible
                    .iter()
                    .map(|c| ctx.display_value(row, c).unwrap_or_default())
                    .collect()
            })
            .collect(),
    }
}

/// Page position over a row count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    /// Index range of the current page, clamped to `total`
    pub fn range(&self, total: usize) -> std::ops::Range<usize> {
        let start = (self.page * self.page_size).min(total);
        let end = (start + self.page_size).min(total);
        start..end
    }

    pub fn next(&mut self, total: usize) {
        if self.page + 1 < self.page_count(total) {
            self.page += 1;
        }
    }

    pub fn previous(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    /// Pull the page back inside the data after the row count shrank
    pub fn clamp(&mut self, total: usize) {
        self.page = self.page.min(self.page_count(total) - 1);
    }
}
