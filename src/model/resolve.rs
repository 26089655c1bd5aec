//! Field and header resolution
//!
//! Turns raw row values and column labels into what the grid, the filter
//! options and the export show.

use super::column::ColumnDescriptor;
use super::dataset::{field_text, CustomColumns, Row};
use super::datetime::{format_timestamp, Preferences};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Translated labels keyed by label key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelDictionary(HashMap<String, String>);

impl LabelDictionary {
    pub fn new(labels: HashMap<String, String>) -> Self {
        Self(labels)
    }

    /// Translate a label key, falling back to the key itself
    pub fn lookup(&self, key: &str) -> String {
        match self.0.get(key) {
            Some(label) if !label.is_empty() => label.clone(),
            _ => key.to_string(),
        }
    }
}

impl FromIterator<(String, String)> for LabelDictionary {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Resolve a raw value to its display form.
///
/// Only the `_DESC` half of a custom column is translated, through the
/// entry's value map. Anything without a mapping comes back unchanged.
pub fn resolve_field<'a>(
    raw: &'a str,
    column: &ColumnDescriptor,
    custom_columns: &'a CustomColumns,
) -> &'a str {
    let Some((bucket, number)) = column.column_type.custom_parts() else {
        return raw;
    };
    if !column.is_description() {
        return raw;
    }

    custom_columns
        .entry(bucket, number)
        .and_then(|entry| entry.values.get(raw))
        .map(String::as_str)
        .filter(|resolved| !resolved.is_empty())
        .unwrap_or(raw)
}

/// Build the display header for a column
pub fn resolve_header<F>(label: &str, column: &ColumnDescriptor, label_lookup: F) -> String
where
    F: Fn(&str) -> String,
{
    if column.column_type.is_custom() {
        if column.is_description() {
            format!("{} Description", column.label)
        } else {
            format!("{} ID", column.label)
        }
    } else {
        label_lookup(label)
    }
}

/// Everything needed to turn a row cell into display text
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub custom_columns: &'a CustomColumns,
    pub labels: &'a LabelDictionary,
    pub preferences: Option<&'a Preferences>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(
        custom_columns: &'a CustomColumns,
        labels: &'a LabelDictionary,
        preferences: Option<&'a Preferences>,
    ) -> Self {
        Self {
            custom_columns,
            labels,
            preferences,
        }
    }

    /// Display header of a column
    pub fn header(&self, column: &ColumnDescriptor) -> String {
        resolve_header(&column.label, column, |key| self.labels.lookup(key))
    }

    /// Display text of a cell: formatted for date columns, translated for
    /// referenced columns, raw otherwise
    pub fn display_value(&self, row: &Row, column: &ColumnDescriptor) -> Option<String> {
        let raw = field_text(row, &column.id)?;
        Some(self.display_text(&raw, column))
    }

    pub fn display_text(&self, raw: &str, column: &ColumnDescriptor) -> String {
        if column.date_field {
            format_timestamp(raw, self.preferences)
        } else if column.referenced {
            resolve_field(raw, column, self.custom_columns).to_string()
        } else {
            raw.to_string()
        }
    }

    /// Zone used to turn timestamps into calendar dates
    pub fn time_zone(&self) -> Option<Tz> {
        self.preferences.and_then(Preferences::tz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::column::ColumnType;
    use crate::model::dataset::CustomColumnEntry;
    use std::collections::BTreeMap;

    fn custom_columns() -> CustomColumns {
        let entry = CustomColumnEntry {
            label: Some("Region".to_string()),
            referenced: true,
            values: HashMap::from([("A".to_string(), "Alpha".to_string()), ("E".to_string(), String::new())]),
        };
        CustomColumns {
            sched: Some(BTreeMap::from([("3".to_string(), entry.clone())])),
            user: Some(BTreeMap::from([("5".to_string(), entry)])),
            cpnt: None,
        }
    }

    fn custom(id: &str, column_type: ColumnType) -> ColumnDescriptor {
        ColumnDescriptor {
            id: id.to_string(),
            label: "Region".to_string(),
            referenced: true,
            column_type,
            visible: true,
            order_number: 1,
            date_field: false,
            sorting: None,
        }
    }

    #[test]
    fn test_standard_value_is_unchanged() {
        let columns = custom_columns();
        let column = ColumnDescriptor::standard("CPNT_ID", "CPNT_ID");
        assert_eq!(resolve_field("A", &column, &columns), "A");
    }

    #[test]
    fn test_description_value_is_translated() {
        let columns = custom_columns();
        let sched = custom("CC_SCHED_3_DESC", ColumnType::CustomSched(3));
        let user = custom("CC_USER_5_DESC", ColumnType::CustomUser(5));
        assert_eq!(resolve_field("A", &sched, &columns), "Alpha");
        assert_eq!(resolve_field("A", &user, &columns), "Alpha");
    }

    #[test]
    fn test_id_half_is_not_translated() {
        let columns = custom_columns();
        let column = custom("CC_SCHED_3", ColumnType::CustomSched(3));
        assert_eq!(resolve_field("A", &column, &columns), "A");
    }

    #[test]
    fn test_missing_mapping_falls_back_to_raw() {
        let columns = custom_columns();
        let sched = custom("CC_SCHED_3_DESC", ColumnType::CustomSched(3));
        let unknown_number = custom("CC_SCHED_9_DESC", ColumnType::CustomSched(9));
        let missing_bucket = custom("CC_CPNT_3_DESC", ColumnType::CustomCpnt(3));

        assert_eq!(resolve_field("Z", &sched, &columns), "Z");
        assert_eq!(resolve_field("E", &sched, &columns), "E");
        assert_eq!(resolve_field("A", &unknown_number, &columns), "A");
        assert_eq!(resolve_field("A", &missing_bucket, &columns), "A");
    }

    #[test]
    fn test_headers() {
        let labels: LabelDictionary =
            [("label.ItemID".to_string(), "Item ID".to_string())].into_iter().collect();
        let lookup = |key: &str| labels.lookup(key);

        let desc = custom("CC_SCHED_3_DESC", ColumnType::CustomSched(3));
        let id = custom("CC_SCHED_3", ColumnType::CustomSched(3));
        let standard = ColumnDescriptor::standard("CPNT_ID", "label.ItemID");
        let untranslated = ColumnDescriptor::standard("ITEM_KEY", "label.ItemKey");

        assert_eq!(resolve_header(&desc.label, &desc, lookup), "Region Description");
        assert_eq!(resolve_header(&id.label, &id, lookup), "Region ID");
        assert_eq!(resolve_header(&standard.label, &standard, lookup), "Item ID");
        assert_eq!(resolve_header(&untranslated.label, &untranslated, lookup), "label.ItemKey");
    }

    #[test]
    fn test_display_value_for_date_and_referenced_columns() {
        let columns = custom_columns();
        let labels = LabelDictionary::default();
        let prefs = Preferences::default();
        let ctx = ResolveContext::new(&columns, &labels, Some(&prefs));

        let row: Row = serde_json::from_str(
            r#"{"CLASS_START_DATE": "2023-12-05T15:00:00Z", "CC_SCHED_3_DESC": "A", "CPNT_ID": null}"#,
        )
        .unwrap();

        let mut date = ColumnDescriptor::standard("CLASS_START_DATE", "label.StartDate");
        date.date_field = true;
        let desc = custom("CC_SCHED_3_DESC", ColumnType::CustomSched(3));
        let item = ColumnDescriptor::standard("CPNT_ID", "label.ItemID");

        assert_eq!(ctx.display_value(&row, &date).as_deref(), Some("2023-12-05"));
        assert_eq!(ctx.display_value(&row, &desc).as_deref(), Some("Alpha"));
        assert_eq!(ctx.display_value(&row, &item), None);
    }
}
