//! Report state - the dataset, its columns and the active filters

use super::builder::build_columns;
use super::column::ColumnDescriptor;
use super::dataset::{field_text, Dataset, Row, Schema};
use super::datetime::Preferences;
use super::filter::{apply_filters, date_bounds, unique_values, FilterSession};
use super::layout::{normalize_order, visible_columns};
use super::projection::{project, sort_rows, SortState, TableProjection};
use super::resolve::{LabelDictionary, ResolveContext};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::debug;

/// Central report state.
///
/// Column and filter changes go through the setters so that derived data is
/// always recomputed from the current descriptors.
#[derive(Debug, Clone, Default)]
pub struct ReportState {
    pub dataset: Dataset,
    pub labels: LabelDictionary,
    pub preferences: Option<Preferences>,
    columns: Vec<ColumnDescriptor>,
    pub filters: FilterSession,
}

impl ReportState {
    /// Build fresh column descriptors for a dataset
    pub fn new(dataset: Dataset, labels: LabelDictionary, preferences: Option<Preferences>) -> Self {
        let schema = Schema::from_rows(&dataset.sched);
        let mut columns = build_columns(&schema, &dataset.custom_columns);
        normalize_order(&mut columns);

        Self {
            dataset,
            labels,
            preferences,
            columns,
            filters: FilterSession::default(),
        }
    }

    pub fn context(&self) -> ResolveContext<'_> {
        ResolveContext::new(
            &self.dataset.custom_columns,
            &self.labels,
            self.preferences.as_ref(),
        )
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Replace all descriptors, renumbering the visible ones
    pub fn set_columns(&mut self, mut columns: Vec<ColumnDescriptor>) {
        normalize_order(&mut columns);
        debug!(
            columns = columns.len(),
            visible = columns.iter().filter(|c| c.visible).count(),
            "column layout replaced"
        );
        self.columns = columns;
    }

    pub fn column(&self, id: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn visible_columns(&self) -> Vec<&ColumnDescriptor> {
        visible_columns(&self.columns)
    }

    pub fn rows(&self) -> &[Row] {
        &self.dataset.sched
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.sched.is_empty()
    }

    /// Rows passing the active filters, in dataset order
    pub fn filtered_rows(&self) -> Vec<&Row> {
        apply_filters(
            &self.dataset.sched,
            &self.columns,
            &self.filters.active,
            &self.context(),
        )
    }

    /// Filtered rows in display order
    pub fn sorted_rows(&self, sort: Option<&SortState>) -> Vec<&Row> {
        let mut rows = self.filtered_rows();
        if let Some(sort) = sort {
            sort_rows(&mut rows, sort, &self.columns);
        }
        rows
    }

    /// Filter options of a column over the whole dataset
    pub fn options(&self, column_id: &str) -> Vec<String> {
        match self.column(column_id) {
            Some(column) => unique_values(column, &self.dataset.sched, &self.context()),
            None => Vec::new(),
        }
    }

    /// Date span of a date column over the whole dataset
    pub fn date_bounds(&self, column_id: &str) -> Option<(NaiveDate, NaiveDate)> {
        let column = self.column(column_id).filter(|c| c.date_field)?;
        date_bounds(column, &self.dataset.sched, &self.context())
    }

    /// Distinct raw timestamps of a date column, oldest first
    pub fn date_options(&self, column_id: &str) -> Vec<String> {
        if !self.column(column_id).is_some_and(|c| c.date_field) {
            return Vec::new();
        }
        self.dataset
            .sched
            .iter()
            .filter_map(|row| field_text(row, column_id))
            .filter(|value| !value.is_empty())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect()
    }

    /// Visible/filtered grid as display text
    pub fn projection(&self, sort: Option<&SortState>) -> TableProjection {
        project(self.sorted_rows(sort), &self.columns, &self.context())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::filter::DateRange;
    use crate::model::layout::show_column;
    use serde_json::json;

    fn region_dataset(referenced: bool) -> Dataset {
        serde_json::from_value(json!({
            "sched": [{"SCHD_ID": 1, "CC_SCHED_3_DESC": "A"}],
            "customColumns": {
                "sched": {"3": {"label": "Region", "referenced": referenced, "values": {"A": "Alpha"}}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_referenced_description_column_end_to_end() {
        let mut state = ReportState::new(region_dataset(true), LabelDictionary::default(), None);

        let column = state.column("CC_SCHED_3_DESC").cloned().unwrap();
        assert_eq!(state.context().header(&column), "Region Description");

        state.set_columns(show_column(state.columns(), "CC_SCHED_3_DESC").unwrap());
        let projection = state.projection(None);
        assert_eq!(projection.headers.last().map(String::as_str), Some("Region Description"));
        assert_eq!(projection.rows[0].last().map(String::as_str), Some("Alpha"));
    }

    #[test]
    fn test_unreferenced_description_column_end_to_end() {
        let state = ReportState::new(region_dataset(false), LabelDictionary::default(), None);
        assert!(state.column("CC_SCHED_3_DESC").is_none());
        assert!(state.column("SCHD_ID").is_some());
    }

    #[test]
    fn test_date_range_filter_end_to_end() {
        let dataset: Dataset = serde_json::from_value(json!({
            "sched": [
                {"SCHD_ID": 1, "CLASS_START_DATE": "2022-12-31T12:00:00Z"},
                {"SCHD_ID": 2, "CLASS_START_DATE": "2023-01-01T08:00:00Z"},
                {"SCHD_ID": 3, "CLASS_START_DATE": "2023-06-30T20:00:00Z"},
                {"SCHD_ID": 4, "CLASS_START_DATE": "2023-07-01T00:00:00Z"}
            ]
        }))
        .unwrap();
        let mut state = ReportState::new(dataset, LabelDictionary::default(), None);

        state.filters.active.set_date_range(
            "CLASS_START_DATE",
            DateRange::new(NaiveDate::from_ymd_opt(2023, 1, 1), NaiveDate::from_ymd_opt(2023, 6, 30)),
        );
        let ids: Vec<i64> = state
            .filtered_rows()
            .iter()
            .filter_map(|r| r["SCHD_ID"].as_i64())
            .collect();
        assert_eq!(ids, vec![2, 3]);

        assert_eq!(state.date_options("CLASS_START_DATE").len(), 4);
        assert!(state.date_options("SCHD_ID").is_empty());
        assert_eq!(
            state.date_bounds("CLASS_START_DATE"),
            Some((
                NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
                NaiveDate::from_ymd_opt(2023, 7, 1).unwrap()
            ))
        );
    }

    #[test]
    fn test_default_columns_are_numbered() {
        let dataset: Dataset = serde_json::from_value(json!({
            "sched": [{"CPNT_TITLE": "x", "CPNT_ID": "c", "SCHD_ID": 1}]
        }))
        .unwrap();
        let state = ReportState::new(dataset, LabelDictionary::default(), None);

        let visible: Vec<(&str, u32)> = state
            .visible_columns()
            .into_iter()
            .map(|c| (c.id.as_str(), c.order_number))
            .collect();
        assert_eq!(visible, vec![("CPNT_ID", 1), ("SCHD_ID", 2)]);
    }

    #[test]
    fn test_empty_dataset() {
        let state = ReportState::new(Dataset::default(), LabelDictionary::default(), None);
        assert!(state.is_empty());
        assert!(state.columns().is_empty());
        assert!(state.projection(None).is_empty());
        assert!(state.options("SCHD_ID").is_empty());
    }
}
