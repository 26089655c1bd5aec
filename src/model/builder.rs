//! Column definition builder
//!
//! Turns the row schema plus custom-column metadata into the full set of
//! column descriptors for one dataset load.

use super::column::{ColumnDescriptor, ColumnType, CustomBucket, INTERNAL_PREFIX};
use super::dataset::{CustomColumns, Schema};
use tracing::debug;

/// Fields shown before the user changes anything
pub const DEFAULT_VISIBLE: &[&str] = &["SCHD_ID", "CPNT_ID"];

/// Fields holding timestamps
pub const DATE_FIELDS: &[&str] = &["CLASS_START_DATE", "CLASS_END_DATE"];

/// Label keys of the standard schedule fields
pub const HEADER_LABELS: &[(&str, &str)] = &[
    ("SCHD_ID", "label.ScheduleID"),
    ("SCHD_DESC", "label.ScheduleDescription"),
    ("CLASS_START_DATE", "label.StartDate"),
    ("CLASS_END_DATE", "label.EndDate"),
    ("CPNT_TITLE", "label.ItemTitle"),
    ("CPNT_DESC", "label.ItemDescription"),
    ("CPNT_ID", "label.ItemID"),
    ("CPNT_TYP_ID", "label.ItemType"),
    ("CPNT_TYP_DESC", "label.ItemTypeDescription"),
    ("REV_DTE", "label.RevisionDate"),
    ("ITEM_KEY", "label.ItemKey"),
];

fn header_label(field: &str) -> Option<&'static str> {
    HEADER_LABELS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, label)| *label)
}

/// Custom-column number embedded in a field name (`CC_SCHED_3_DESC` -> 3)
fn custom_number(field: &str) -> Option<u32> {
    field.split('_').nth(2)?.parse().ok()
}

/// Build the column descriptors for a schema.
///
/// All rows are expected to share `schema`. Custom fields without matching
/// metadata are dropped, as are `INTERNAL_` fields. Order numbers are left
/// at 0; numbering happens when the layout is normalized.
pub fn build_columns(schema: &Schema, custom_columns: &CustomColumns) -> Vec<ColumnDescriptor> {
    let columns: Vec<ColumnDescriptor> = schema
        .fields()
        .iter()
        .filter_map(|field| build_column(field, custom_columns))
        .collect();

    debug!(
        fields = schema.fields().len(),
        columns = columns.len(),
        "built column definitions"
    );
    columns
}

fn build_column(field: &str, custom_columns: &CustomColumns) -> Option<ColumnDescriptor> {
    if field.starts_with(INTERNAL_PREFIX) {
        return None;
    }

    let visible = DEFAULT_VISIBLE.contains(&field);
    let date_field = DATE_FIELDS.contains(&field);

    let Some(bucket) = CustomBucket::classify(field) else {
        return Some(ColumnDescriptor {
            id: field.to_string(),
            label: header_label(field).unwrap_or(field).to_string(),
            referenced: false,
            column_type: ColumnType::Standard,
            visible,
            order_number: 0,
            date_field,
            sorting: None,
        });
    };

    let number = custom_number(field)?;
    let entry = custom_columns.entry(bucket, number)?;

    let column = ColumnDescriptor {
        id: field.to_string(),
        label: entry.label.clone().unwrap_or_else(|| field.to_string()),
        referenced: entry.referenced,
        column_type: ColumnType::custom(bucket, number),
        visible,
        order_number: 0,
        date_field,
        sorting: None,
    };

    // Only schedule custom fields drop an unreferenced description half
    if bucket == CustomBucket::Sched && column.is_description() && !entry.referenced {
        debug!(field, "dropping unreferenced schedule description column");
        return None;
    }

    Some(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dataset::{CustomColumnEntry, Row};
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap, HashSet};

    fn entry(label: &str, referenced: bool) -> CustomColumnEntry {
        CustomColumnEntry {
            label: Some(label.to_string()),
            referenced,
            values: HashMap::from([("A".to_string(), "Alpha".to_string())]),
        }
    }

    fn schema(fields: &[&str]) -> Schema {
        Schema::new(fields.iter().map(|f| f.to_string()).collect())
    }

    fn buckets(referenced: bool) -> CustomColumns {
        CustomColumns {
            sched: Some(BTreeMap::from([("3".to_string(), entry("Region", referenced))])),
            user: Some(BTreeMap::from([("1".to_string(), entry("Department", referenced))])),
            cpnt: Some(BTreeMap::from([("2".to_string(), entry("Vendor", referenced))])),
        }
    }

    #[test]
    fn test_standard_columns() {
        let columns = build_columns(
            &schema(&["SCHD_ID", "CPNT_ID", "CLASS_START_DATE", "UNKNOWN_FIELD"]),
            &CustomColumns::default(),
        );

        assert_eq!(columns.len(), 4);
        assert!(columns[0].visible);
        assert_eq!(columns[0].label, "label.ScheduleID");
        assert!(columns[1].visible);
        assert!(!columns[2].visible);
        assert!(columns[2].date_field);
        assert_eq!(columns[3].label, "UNKNOWN_FIELD");
        assert!(columns.iter().all(|c| c.order_number == 0));
        assert!(columns.iter().all(|c| c.column_type == ColumnType::Standard));
    }

    #[test]
    fn test_internal_fields_are_skipped() {
        let columns = build_columns(
            &schema(&["SCHD_ID", "INTERNAL_ROW_KEY"]),
            &CustomColumns::default(),
        );
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].id, "SCHD_ID");
    }

    #[test]
    fn test_referenced_description_column_is_built() {
        let rows: Vec<Row> = vec![json!({"SCHD_ID": 1, "CC_SCHED_3_DESC": "A"})
            .as_object()
            .cloned()
            .unwrap()];
        let columns = build_columns(&Schema::from_rows(&rows), &buckets(true));

        let desc = columns.iter().find(|c| c.id == "CC_SCHED_3_DESC").unwrap();
        assert_eq!(desc.column_type, ColumnType::CustomSched(3));
        assert_eq!(desc.label, "Region");
        assert!(desc.referenced);
    }

    #[test]
    fn test_unreferenced_sched_description_is_dropped() {
        let columns = build_columns(
            &schema(&["SCHD_ID", "CC_SCHED_3", "CC_SCHED_3_DESC"]),
            &buckets(false),
        );
        let ids: Vec<&str> = columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["SCHD_ID", "CC_SCHED_3"]);
    }

    /// Unlike schedule fields, unreferenced user/item description columns
    /// are kept. This asymmetry is intentional behavior of the report.
    #[test]
    fn test_unreferenced_user_and_cpnt_descriptions_are_kept() {
        let columns = build_columns(
            &schema(&["CC_USER_1_DESC", "CC_CPNT_2_DESC"]),
            &buckets(false),
        );
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].column_type, ColumnType::CustomUser(1));
        assert_eq!(columns[1].column_type, ColumnType::CustomCpnt(2));
        assert!(columns.iter().all(|c| !c.referenced));
    }

    #[test]
    fn test_unmapped_custom_fields_are_dropped() {
        let mut custom = buckets(true);
        custom.cpnt = None;

        let columns = build_columns(
            &schema(&["CC_SCHED_4", "CC_CPNT_2", "CC_USER_x", "CC_USER_1"]),
            &custom,
        );
        let ids: Vec<&str> = columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["CC_USER_1"]);
    }

    #[test]
    fn test_custom_label_falls_back_to_field() {
        let custom = CustomColumns {
            sched: Some(BTreeMap::from([(
                "7".to_string(),
                CustomColumnEntry {
                    label: None,
                    referenced: false,
                    values: HashMap::new(),
                },
            )])),
            ..Default::default()
        };
        let columns = build_columns(&schema(&["CC_SCHED_7"]), &custom);
        assert_eq!(columns[0].label, "CC_SCHED_7");
    }

    #[test]
    fn test_empty_schema_builds_nothing() {
        assert!(build_columns(&Schema::default(), &buckets(true)).is_empty());
    }

    fn field_name() -> impl Strategy<Value = String> {
        prop_oneof![
            "[A-Z]{2,8}(_[A-Z]{2,5})?",
            "INTERNAL_[A-Z]{1,5}",
            (1u32..6).prop_map(|n| format!("CC_SCHED_{}", n)),
            (1u32..6).prop_map(|n| format!("CC_SCHED_{}_DESC", n)),
            (1u32..6).prop_map(|n| format!("CC_USER_{}_DESC", n)),
            (1u32..6).prop_map(|n| format!("CC_CPNT_{}", n)),
        ]
    }

    proptest! {
        #[test]
        fn prop_ids_unique_and_never_internal(
            fields in proptest::collection::btree_set(field_name(), 0..20),
            referenced in any::<bool>(),
        ) {
            let schema = Schema::new(fields.into_iter().collect());
            let columns = build_columns(&schema, &buckets(referenced));

            let ids: HashSet<&str> = columns.iter().map(|c| c.id.as_str()).collect();
            prop_assert_eq!(ids.len(), columns.len());
            prop_assert!(columns.iter().all(|c| !c.id.starts_with(INTERNAL_PREFIX)));
        }
    }
}
