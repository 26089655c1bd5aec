//! Report dataset as delivered by the host: schedules, enrollments, requests
//! and custom-column metadata.

use super::column::CustomBucket;
use super::datetime::Preferences;
use super::resolve::LabelDictionary;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A schedule record: field name to primitive value, in source order.
pub type Row = serde_json::Map<String, Value>;

/// Render a primitive row value as text. `null` has no text.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Text of a named field in a row, if present and not null
pub fn field_text(row: &Row, field: &str) -> Option<String> {
    row.get(field).and_then(value_text)
}

/// Treat an explicit JSON `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Metadata for one custom field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomColumnEntry {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub referenced: bool,
    /// Coded key to display string
    #[serde(default, deserialize_with = "null_as_default")]
    pub values: HashMap<String, String>,
}

/// Custom-column metadata grouped by bucket and keyed by column number
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomColumns {
    #[serde(default)]
    pub sched: Option<BTreeMap<String, CustomColumnEntry>>,
    #[serde(default)]
    pub user: Option<BTreeMap<String, CustomColumnEntry>>,
    #[serde(default)]
    pub cpnt: Option<BTreeMap<String, CustomColumnEntry>>,
}

impl CustomColumns {
    pub fn bucket(&self, bucket: CustomBucket) -> Option<&BTreeMap<String, CustomColumnEntry>> {
        match bucket {
            CustomBucket::Sched => self.sched.as_ref(),
            CustomBucket::User => self.user.as_ref(),
            CustomBucket::Cpnt => self.cpnt.as_ref(),
        }
    }

    /// Look up the entry for a custom column number within a bucket
    pub fn entry(&self, bucket: CustomBucket, number: u32) -> Option<&CustomColumnEntry> {
        self.bucket(bucket)?.get(&number.to_string())
    }
}

/// An enrollment of a learner into a schedule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enroll {
    #[serde(rename = "SCHD_ID", default)]
    pub schd_id: i64,
    #[serde(rename = "ENRL_STAT_ID", default, deserialize_with = "null_as_default")]
    pub enrl_stat_id: String,
    #[serde(rename = "STUD_ID", default, deserialize_with = "null_as_default")]
    pub stud_id: String,
    #[serde(rename = "ENRL_STAT_DESC", default, deserialize_with = "null_as_default")]
    pub enrl_stat_desc: String,
    #[serde(rename = "FNAME", default)]
    pub fname: Option<String>,
    #[serde(rename = "LNAME", default)]
    pub lname: Option<String>,
    #[serde(rename = "EMAIL_ADDR", default)]
    pub email_addr: Option<String>,
}

/// A pending request for an item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "STUD_ID", default)]
    pub stud_id: Option<String>,
    #[serde(rename = "FNAME", default)]
    pub fname: Option<String>,
    #[serde(rename = "LNAME", default)]
    pub lname: Option<String>,
    #[serde(rename = "EMAIL_ADDR", default)]
    pub email_addr: Option<String>,
    #[serde(rename = "CPNT_ID", default, deserialize_with = "null_as_default")]
    pub cpnt_id: String,
    #[serde(rename = "CPNT_TYP_ID", default, deserialize_with = "null_as_default")]
    pub cpnt_typ_id: String,
    #[serde(rename = "REV_DTE", default, deserialize_with = "null_as_default")]
    pub rev_dte: String,
    #[serde(rename = "ITEM_KEY", default, deserialize_with = "null_as_default")]
    pub item_key: String,
}

/// The complete pre-fetched dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default, deserialize_with = "null_as_default")]
    pub enroll: Vec<Enroll>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sched: Vec<Row>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub request: Vec<Request>,
    #[serde(rename = "customColumns", default, deserialize_with = "null_as_default")]
    pub custom_columns: CustomColumns,
}

impl Dataset {
    /// Find a schedule row by its `SCHD_ID`
    pub fn schedule_by_id(&self, schd_id: i64) -> Option<&Row> {
        self.sched
            .iter()
            .find(|row| row.get("SCHD_ID").and_then(Value::as_i64) == Some(schd_id))
    }

    /// All enrollments of one schedule
    pub fn enrollments_for(&self, schd_id: i64) -> Vec<&Enroll> {
        self.enroll.iter().filter(|e| e.schd_id == schd_id).collect()
    }
}

/// Everything the host hands over before the viewer starts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBundle {
    #[serde(default)]
    pub data: Option<Dataset>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: LabelDictionary,
    #[serde(default)]
    pub preferences: Option<Preferences>,
    /// Result of the host-domain check; absent means verification is disabled
    #[serde(default = "default_host_authorized")]
    pub host_authorized: bool,
}

fn default_host_authorized() -> bool {
    true
}

// ═══════════════════════════════════════════════════════════════════════════════
// Schema
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordered field names shared by every row of the primary collection.
///
/// Taken from the first row; rows are expected to share it and
/// [`Schema::mismatches`] reports the ones that don't.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<String>,
}

/// A row whose field set differs from the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMismatch {
    pub row_index: usize,
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
}

impl Schema {
    #[cfg(test)]
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Infer the schema from the first row, empty when there are no rows
    pub fn from_rows(rows: &[Row]) -> Self {
        let fields = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check every row against the schema
    pub fn mismatches(&self, rows: &[Row]) -> Vec<SchemaMismatch> {
        let expected: HashSet<&str> = self.fields.iter().map(String::as_str).collect();

        rows.iter()
            .enumerate()
            .filter_map(|(row_index, row)| {
                let missing: Vec<String> = self
                    .fields
                    .iter()
                    .filter(|f| !row.contains_key(f.as_str()))
                    .cloned()
                    .collect();
                let unexpected: Vec<String> = row
                    .keys()
                    .filter(|k| !expected.contains(k.as_str()))
                    .cloned()
                    .collect();

                if missing.is_empty() && unexpected.is_empty() {
                    None
                } else {
                    Some(SchemaMismatch {
                        row_index,
                        missing,
                        unexpected,
                    })
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_schema_keeps_source_order() {
        let rows = vec![row(json!({"SCHD_ID": 1, "CPNT_ID": "A", "CLASS_START_DATE": null}))];
        let schema = Schema::from_rows(&rows);
        assert_eq!(schema.fields(), ["SCHD_ID", "CPNT_ID", "CLASS_START_DATE"]);
    }

    #[test]
    fn test_schema_from_empty_rows() {
        assert!(Schema::from_rows(&[]).is_empty());
    }

    #[test]
    fn test_schema_mismatches() {
        let rows = vec![
            row(json!({"SCHD_ID": 1, "CPNT_ID": "A"})),
            row(json!({"SCHD_ID": 2, "CPNT_ID": "B"})),
            row(json!({"SCHD_ID": 3, "EXTRA": true})),
        ];
        let schema = Schema::from_rows(&rows);
        let mismatches = schema.mismatches(&rows);

        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].row_index, 2);
        assert_eq!(mismatches[0].missing, vec!["CPNT_ID"]);
        assert_eq!(mismatches[0].unexpected, vec!["EXTRA"]);
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("a")), Some("a".to_string()));
        assert_eq!(value_text(&json!(12)), Some("12".to_string()));
        assert_eq!(value_text(&json!(true)), Some("true".to_string()));
        assert_eq!(value_text(&Value::Null), None);
    }

    #[test]
    fn test_dataset_tolerates_nulls_and_missing_collections() {
        let dataset: Dataset = serde_json::from_value(json!({
            "sched": [{"SCHD_ID": 7}],
            "enroll": null,
            "customColumns": {"sched": {"3": {"label": "Region", "referenced": true, "values": null}}}
        }))
        .unwrap();

        assert_eq!(dataset.sched.len(), 1);
        assert!(dataset.enroll.is_empty());
        assert!(dataset.request.is_empty());
        let entry = dataset.custom_columns.entry(CustomBucket::Sched, 3).unwrap();
        assert!(entry.referenced);
        assert!(entry.values.is_empty());
        assert!(dataset.custom_columns.user.is_none());
    }

    #[test]
    fn test_schedule_lookup_and_enrollments() {
        let dataset: Dataset = serde_json::from_value(json!({
            "sched": [{"SCHD_ID": 1}, {"SCHD_ID": 2}],
            "enroll": [
                {"SCHD_ID": 2, "ENRL_STAT_ID": "E", "STUD_ID": "s1", "ENRL_STAT_DESC": "Enrolled", "LNAME": "Doe"},
                {"SCHD_ID": 1, "ENRL_STAT_ID": "E", "STUD_ID": "s2", "ENRL_STAT_DESC": "Enrolled", "LNAME": "Roe"}
            ]
        }))
        .unwrap();

        assert!(dataset.schedule_by_id(2).is_some());
        assert!(dataset.schedule_by_id(3).is_none());
        let enrolled = dataset.enrollments_for(2);
        assert_eq!(enrolled.len(), 1);
        assert_eq!(enrolled[0].stud_id, "s1");
    }

    #[test]
    fn test_bundle_defaults() {
        let bundle: ReportBundle = serde_json::from_value(json!({})).unwrap();
        assert!(bundle.host_authorized);
        assert!(bundle.data.is_none());
        assert!(bundle.preferences.is_none());
    }
}
