//! Filter engine
//!
//! Option lists per column, active value/date filters and the row
//! predicate built from them. Everything here recomputes from scratch.

use super::column::ColumnDescriptor;
use super::dataset::{field_text, Row};
use super::datetime::{local_date, parse_timestamp};
use super::resolve::ResolveContext;
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::collections::{BTreeMap, BTreeSet};

/// Columns with more options than this get a search box
pub const OPTION_SEARCH_THRESHOLD: usize = 5;

/// Inclusive calendar-date range; open ends are unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn is_set(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    /// Whether a raw timestamp falls on a date inside the range
    ///
    /// Unparseable timestamps never match.
    pub fn contains_timestamp(&self, raw: &str, tz: Option<Tz>) -> bool {
        parse_timestamp(raw).is_some_and(|ts| self.contains(local_date(ts, tz)))
    }
}

/// Active filter of one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnFilter {
    /// Accepted display values; any one of them matches
    Values(BTreeSet<String>),
    Dates(DateRange),
}

impl ColumnFilter {
    /// Whether the filter constrains anything
    pub fn is_active(&self) -> bool {
        match self {
            ColumnFilter::Values(values) => !values.is_empty(),
            ColumnFilter::Dates(range) => range.is_set(),
        }
    }
}

/// Badge shown next to a filtered column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterBadge {
    Count(usize),
    DateRange,
}

/// Active filters keyed by column id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveFilters {
    filters: BTreeMap<String, ColumnFilter>,
}

impl ActiveFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column_id: &str) -> Option<&ColumnFilter> {
        self.filters.get(column_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ColumnFilter)> {
        self.filters.iter()
    }

    /// Check or uncheck one value of a column
    pub fn toggle_value(&mut self, column_id: &str, value: &str) {
        let entry = self
            .filters
            .entry(column_id.to_string())
            .or_insert_with(|| ColumnFilter::Values(BTreeSet::new()));

        if let ColumnFilter::Dates(_) = entry {
            *entry = ColumnFilter::Values(BTreeSet::new());
        }
        if let ColumnFilter::Values(values) = entry {
            if !values.remove(value) {
                values.insert(value.to_string());
            }
        }

        if !entry.is_active() {
            self.filters.remove(column_id);
        }
    }

    pub fn is_checked(&self, column_id: &str, value: &str) -> bool {
        matches!(self.filters.get(column_id), Some(ColumnFilter::Values(values)) if values.contains(value))
    }

    /// Set or clear (when unbounded) the date range of a column
    pub fn set_date_range(&mut self, column_id: &str, range: DateRange) {
        if range.is_set() {
            self.filters.insert(column_id.to_string(), ColumnFilter::Dates(range));
        } else {
            self.filters.remove(column_id);
        }
    }

    pub fn date_range(&self, column_id: &str) -> Option<DateRange> {
        match self.filters.get(column_id) {
            Some(ColumnFilter::Dates(range)) => Some(*range),
            _ => None,
        }
    }

    pub fn clear_column(&mut self, column_id: &str) {
        self.filters.remove(column_id);
    }

    pub fn clear_all(&mut self) {
        self.filters.clear();
    }

    pub fn badge(&self, column_id: &str) -> Option<FilterBadge> {
        match self.filters.get(column_id)? {
            ColumnFilter::Values(values) if !values.is_empty() => Some(FilterBadge::Count(values.len())),
            ColumnFilter::Dates(range) if range.is_set() => Some(FilterBadge::DateRange),
            _ => None,
        }
    }

    pub fn any_active(&self) -> bool {
        self.filters.values().any(ColumnFilter::is_active)
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Active filters plus the date ranges still being edited
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSession {
    pub active: ActiveFilters,
    pub date_drafts: BTreeMap<String, DateRange>,
}

impl FilterSession {
    pub fn draft(&self, column_id: &str) -> DateRange {
        self.date_drafts
            .get(column_id)
            .copied()
            .or_else(|| self.active.date_range(column_id))
            .unwrap_or_default()
    }

    pub fn set_draft(&mut self, column_id: &str, range: DateRange) {
        self.date_drafts.insert(column_id.to_string(), range);
    }

    /// Apply the draft of a column as its active date filter
    pub fn commit_draft(&mut self, column_id: &str) {
        if let Some(range) = self.date_drafts.remove(column_id) {
            self.active.set_date_range(column_id, range);
        }
    }

    /// Drop the filter and draft of one column
    pub fn clear_column(&mut self, column_id: &str) {
        self.active.clear_column(column_id);
        self.date_drafts.remove(column_id);
    }

    /// Reset filters and drafts together
    pub fn clear_all(&mut self) {
        self.active.clear_all();
        self.date_drafts.clear();
    }
}

/// Sorted distinct display values of a column, without nulls and blanks
pub fn unique_values<'r>(
    column: &ColumnDescriptor,
    rows: impl IntoIterator<Item = &'r Row>,
    ctx: &ResolveContext<'_>,
) -> Vec<String> {
    rows.into_iter()
        .filter_map(|row| ctx.display_value(row, column))
        .filter(|value| !value.is_empty())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// Rows passing every active filter
///
/// Filters naming a column that is not in `columns` compare the raw text.
pub fn apply_filters<'r>(
    rows: impl IntoIterator<Item = &'r Row>,
    columns: &[ColumnDescriptor],
    filters: &ActiveFilters,
    ctx: &ResolveContext<'_>,
) -> Vec<&'r Row> {
    let active: Vec<(&str, Option<&ColumnDescriptor>, &ColumnFilter)> = filters
        .iter()
        .filter(|(_, filter)| filter.is_active())
        .map(|(id, filter)| (id.as_str(), columns.iter().find(|c| c.id == *id), filter))
        .collect();

    rows.into_iter()
        .filter(|row| {
            active
                .iter()
                .all(|(id, column, filter)| row_matches(row, id, *column, filter, ctx))
        })
        .collect()
}

fn row_matches(
    row: &Row,
    column_id: &str,
    column: Option<&ColumnDescriptor>,
    filter: &ColumnFilter,
    ctx: &ResolveContext<'_>,
) -> bool {
    match filter {
        ColumnFilter::Values(accepted) => {
            let value = match column {
                Some(column) => ctx.display_value(row, column),
                None => field_text(row, column_id),
            };
            value.is_some_and(|v| accepted.iter().any(|a| a.trim() == v.trim()))
        }
        ColumnFilter::Dates(range) => field_text(row, column_id)
            .is_some_and(|raw| range.contains_timestamp(&raw, ctx.time_zone())),
    }
}

/// Options containing `query`, ignoring case; all options for a blank query
pub fn narrow_options<'a>(options: &'a [String], query: &str) -> Vec<&'a String> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return options.iter().collect();
    }
    options
        .iter()
        .filter(|option| option.to_lowercase().contains(&query))
        .collect()
}

/// Date options whose calendar day in `tz` lies inside the range
///
/// Same predicate as the date filter, so the preview agrees with the grid.
pub fn narrow_date_options<'a>(
    options: &'a [String],
    range: &DateRange,
    tz: Option<Tz>,
) -> Vec<&'a String> {
    if !range.is_set() {
        return options.iter().collect();
    }
    options
        .iter()
        .filter(|option| range.contains_timestamp(option, tz))
        .collect()
}

/// Earliest and latest calendar date of a date column
pub fn date_bounds<'r>(
    column: &ColumnDescriptor,
    rows: impl IntoIterator<Item = &'r Row>,
    ctx: &ResolveContext<'_>,
) -> Option<(NaiveDate, NaiveDate)> {
    let tz = ctx.time_zone();
    rows.into_iter()
        .filter_map(|row| field_text(row, &column.id))
        .filter_map(|raw| parse_timestamp(&raw))
        .map(|ts| local_date(ts, tz))
        .fold(None, |bounds, date| match bounds {
            None => Some((date, date)),
            Some((min, max)) => Some((min.min(date), max.max(date))),
        })
}
