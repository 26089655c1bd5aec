//! Column descriptors - the typed, user-configurable column model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix of custom fields carrying a coded description value
pub const DESC_SUFFIX: &str = "_DESC";

/// Prefix of fields that never become columns
pub const INTERNAL_PREFIX: &str = "INTERNAL_";

/// The three custom-column buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CustomBucket {
    Sched,
    User,
    Cpnt,
}

impl CustomBucket {
    pub const ALL: [CustomBucket; 3] = [CustomBucket::Sched, CustomBucket::User, CustomBucket::Cpnt];

    /// Field-name prefix marking a custom column of this bucket
    pub fn prefix(self) -> &'static str {
        match self {
            CustomBucket::Sched => "CC_SCHED_",
            CustomBucket::User => "CC_USER_",
            CustomBucket::Cpnt => "CC_CPNT_",
        }
    }

    /// Classify a field name by its custom-column prefix
    pub fn classify(field: &str) -> Option<CustomBucket> {
        Self::ALL.into_iter().find(|b| field.starts_with(b.prefix()))
    }
}

impl fmt::Display for CustomBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomBucket::Sched => write!(f, "sched"),
            CustomBucket::User => write!(f, "user"),
            CustomBucket::Cpnt => write!(f, "cpnt"),
        }
    }
}

/// Kind of a column; custom kinds carry their custom-column number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Standard,
    CustomSched(u32),
    CustomUser(u32),
    CustomCpnt(u32),
}

impl ColumnType {
    pub fn custom(bucket: CustomBucket, number: u32) -> Self {
        match bucket {
            CustomBucket::Sched => ColumnType::CustomSched(number),
            CustomBucket::User => ColumnType::CustomUser(number),
            CustomBucket::Cpnt => ColumnType::CustomCpnt(number),
        }
    }

    /// Bucket and number for custom kinds
    pub fn custom_parts(self) -> Option<(CustomBucket, u32)> {
        match self {
            ColumnType::Standard => None,
            ColumnType::CustomSched(n) => Some((CustomBucket::Sched, n)),
            ColumnType::CustomUser(n) => Some((CustomBucket::User, n)),
            ColumnType::CustomCpnt(n) => Some((CustomBucket::Cpnt, n)),
        }
    }

    pub fn is_custom(self) -> bool {
        self.custom_parts().is_some()
    }

    /// Tag used in the persisted layout
    pub fn tag(self) -> &'static str {
        match self {
            ColumnType::Standard => "standard",
            ColumnType::CustomSched(_) => "customColumnSched",
            ColumnType::CustomUser(_) => "customColumnUser",
            ColumnType::CustomCpnt(_) => "customColumnCpnt",
        }
    }
}

/// Sort direction of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A single column of the report grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredColumn", into = "StoredColumn")]
pub struct ColumnDescriptor {
    /// Row field name, unique within one dataset
    pub id: String,
    /// Label before header resolution
    pub label: String,
    /// Values are codes that need lookup
    pub referenced: bool,
    pub column_type: ColumnType,
    pub visible: bool,
    /// 1-based position among visible columns, 0 when hidden
    pub order_number: u32,
    /// Values are timestamps
    pub date_field: bool,
    pub sorting: Option<SortDirection>,
}

impl ColumnDescriptor {
    /// A hidden standard column
    #[cfg(test)]
    pub fn standard(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            referenced: false,
            column_type: ColumnType::Standard,
            visible: false,
            order_number: 0,
            date_field: false,
            sorting: None,
        }
    }

    /// Whether this is the description half of a custom column pair
    pub fn is_description(&self) -> bool {
        self.id.ends_with(DESC_SUFFIX)
    }
}

// Wire shape of a descriptor in the persisted layout. The column kind is
// split into a string tag and an optional number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredColumn {
    id: String,
    label: String,
    #[serde(default)]
    referenced: bool,
    column_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    custom_column_number: Option<u32>,
    #[serde(default)]
    visible: bool,
    #[serde(default)]
    order_number: u32,
    #[serde(default)]
    date_field: bool,
    #[serde(default)]
    sorting: Option<SortDirection>,
}

impl TryFrom<StoredColumn> for ColumnDescriptor {
    type Error = String;

    fn try_from(stored: StoredColumn) -> Result<Self, Self::Error> {
        let bucket = match stored.column_type.as_str() {
            "standard" => None,
            "customColumnSched" => Some(CustomBucket::Sched),
            "customColumnUser" => Some(CustomBucket::User),
            "customColumnCpnt" => Some(CustomBucket::Cpnt),
            other => return Err(format!("unknown column type '{}'", other)),
        };

        let column_type = match bucket {
            None => ColumnType::Standard,
            Some(bucket) => {
                let number = stored.custom_column_number.ok_or_else(|| {
                    format!("custom column '{}' has no customColumnNumber", stored.id)
                })?;
                ColumnType::custom(bucket, number)
            }
        };

        Ok(ColumnDescriptor {
            id: stored.id,
            label: stored.label,
            referenced: stored.referenced,
            column_type,
            visible: stored.visible,
            order_number: stored.order_number,
            date_field: stored.date_field,
            sorting: stored.sorting,
        })
    }
}

impl From<ColumnDescriptor> for StoredColumn {
    fn from(column: ColumnDescriptor) -> Self {
        StoredColumn {
            custom_column_number: column.column_type.custom_parts().map(|(_, n)| n),
            column_type: column.column_type.tag().to_string(),
            id: column.id,
            label: column.label,
            referenced: column.referenced,
            visible: column.visible,
            order_number: column.order_number,
            date_field: column.date_field,
            sorting: column.sorting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_prefixes() {
        assert_eq!(CustomBucket::classify("CC_SCHED_3"), Some(CustomBucket::Sched));
        assert_eq!(CustomBucket::classify("CC_USER_1_DESC"), Some(CustomBucket::User));
        assert_eq!(CustomBucket::classify("CC_CPNT_12"), Some(CustomBucket::Cpnt));
        assert_eq!(CustomBucket::classify("CPNT_ID"), None);
    }

    #[test]
    fn test_custom_descriptor_wire_format() {
        let column = ColumnDescriptor {
            id: "CC_USER_2_DESC".to_string(),
            label: "Department".to_string(),
            referenced: true,
            column_type: ColumnType::CustomUser(2),
            visible: true,
            order_number: 3,
            date_field: false,
            sorting: Some(SortDirection::Desc),
        };

        let value = serde_json::to_value(&column).unwrap();
        assert_eq!(value["columnType"], "customColumnUser");
        assert_eq!(value["customColumnNumber"], 2);
        assert_eq!(value["orderNumber"], 3);
        assert_eq!(value["sorting"], "desc");

        let back: ColumnDescriptor = serde_json::from_value(value).unwrap();
        assert_eq!(back, column);
    }

    #[test]
    fn test_standard_descriptor_has_no_number() {
        let column = ColumnDescriptor::standard("SCHD_ID", "label.ScheduleID");
        let value = serde_json::to_value(&column).unwrap();
        assert_eq!(value["columnType"], "standard");
        assert!(value.get("customColumnNumber").is_none());
        assert!(value["sorting"].is_null());
    }

    #[test]
    fn test_custom_descriptor_without_number_is_rejected() {
        let result: Result<ColumnDescriptor, _> = serde_json::from_value(json!({
            "id": "CC_SCHED_1",
            "label": "Region",
            "columnType": "customColumnSched"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_column_type_is_rejected() {
        let result: Result<ColumnDescriptor, _> = serde_json::from_value(json!({
            "id": "X",
            "label": "X",
            "columnType": "somethingElse"
        }));
        assert!(result.is_err());
    }
}
