//! Column layout persistence
//!
//! The layout file holds one slot per report:
//! `{ "<namespace>": { "columnDefinitions": [...] } }`.

use crate::model::ColumnDescriptor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Slot used by the schedule report
pub const DEFAULT_NAMESPACE: &str = "report-sched";

/// File name of the layout store inside the data directory
pub const LAYOUT_FILE_NAME: &str = "report_preferences.json";

type Slots = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutSlot {
    column_definitions: Vec<ColumnDescriptor>,
}

/// Reads and writes the column layout of one report namespace
#[derive(Debug, Clone)]
pub struct LayoutStore {
    path: PathBuf,
    namespace: String,
}

impl LayoutStore {
    pub fn new(path: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: namespace.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the descriptors into this namespace's slot
    ///
    /// The slot is replaced wholesale; slots of other namespaces are kept.
    /// A missing or malformed file starts from an empty object.
    pub fn persist(&self, columns: &[ColumnDescriptor]) -> Result<()> {
        let mut slots = match self.read_slots() {
            Ok(slots) => slots.unwrap_or_default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "overwriting unreadable layout");
                Slots::new()
            }
        };
        let slot = LayoutSlot {
            column_definitions: columns.to_vec(),
        };
        slots.insert(self.namespace.clone(), serde_json::to_value(slot)?);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(&slots)?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write layout to {}", self.path.display()))?;

        info!(
            path = %self.path.display(),
            namespace = %self.namespace,
            columns = columns.len(),
            "layout persisted"
        );
        Ok(())
    }

    /// Merge the stored layout into freshly built descriptors.
    ///
    /// Stored descriptors replace input descriptors with the same id. Input
    /// descriptors without a stored counterpart stay; stored ones without an
    /// input counterpart are dropped. Any read or parse problem returns the
    /// input unchanged.
    pub fn restore(&self, columns: Vec<ColumnDescriptor>) -> Vec<ColumnDescriptor> {
        match self.read_slot() {
            Ok(Some(stored)) => merge(columns, stored),
            Ok(None) => columns,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable layout");
                columns
            }
        }
    }

    /// Every slot in the file, or `None` when there is no file yet
    fn read_slots(&self) -> Result<Option<Slots>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no stored layout");
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let slots: Slots =
            serde_json::from_str(&contents).context("Layout file is not a JSON object")?;
        Ok(Some(slots))
    }

    fn read_slot(&self) -> Result<Option<Vec<ColumnDescriptor>>> {
        let Some(mut slots) = self.read_slots()? else {
            return Ok(None);
        };

        let Some(slot) = slots.remove(&self.namespace) else {
            debug!(namespace = %self.namespace, "stored layout has no slot for namespace");
            return Ok(None);
        };
        let slot: LayoutSlot = serde_json::from_value(slot)
            .with_context(|| format!("Malformed layout slot '{}'", self.namespace))?;

        Ok(Some(slot.column_definitions))
    }
}

fn merge(columns: Vec<ColumnDescriptor>, stored: Vec<ColumnDescriptor>) -> Vec<ColumnDescriptor> {
    let mut stored: HashMap<String, ColumnDescriptor> =
        stored.into_iter().map(|c| (c.id.clone(), c)).collect();

    let mut restored = 0;
    let merged: Vec<ColumnDescriptor> = columns
        .into_iter()
        .map(|column| match stored.remove(&column.id) {
            Some(saved) => {
                restored += 1;
                saved
            }
            None => column,
        })
        .collect();

    debug!(restored, stale = stored.len(), "layout restored");
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::layout::{normalize_order, show_column, visible_count};
    use crate::model::column::ColumnType;
    use crate::model::SortDirection;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn column(id: &str, visible: bool, order: u32) -> ColumnDescriptor {
        let mut column = ColumnDescriptor::standard(id, format!("label.{}", id));
        column.visible = visible;
        column.order_number = order;
        column
    }

    fn store(dir: &TempDir) -> LayoutStore {
        LayoutStore::new(dir.path().join(LAYOUT_FILE_NAME), DEFAULT_NAMESPACE)
    }

    #[test]
    fn test_restore_without_file_returns_input() {
        let dir = TempDir::new().unwrap();
        let input = vec![column("A", true, 1)];
        assert_eq!(store(&dir).restore(input.clone()), input);
    }

    #[test]
    fn test_restore_malformed_file_returns_input() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let input = vec![column("A", true, 1)];

        fs::write(store.path(), "not json").unwrap();
        assert_eq!(store.restore(input.clone()), input);

        fs::write(store.path(), r#"{"report-sched": {"columnDefinitions": [{"id": 3}]}}"#).unwrap();
        assert_eq!(store.restore(input.clone()), input);

        fs::write(store.path(), r#"{"other-report": {"columnDefinitions": []}}"#).unwrap();
        assert_eq!(store.restore(input.clone()), input);
    }

    #[test]
    fn test_persist_writes_namespaced_slot() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.persist(&[column("A", true, 1)]).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        let definitions = &written["report-sched"]["columnDefinitions"];
        assert_eq!(definitions[0]["id"], "A");
        assert_eq!(definitions[0]["orderNumber"], 1);
        assert_eq!(definitions[0]["columnType"], "standard");
    }

    #[test]
    fn test_persist_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let store = LayoutStore::new(dir.path().join("nested/deeper/layout.json"), "x");
        store.persist(&[column("A", true, 1)]).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_restore_replaces_matching_and_drops_stale() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let mut saved_b = column("B", true, 1);
        saved_b.label = "Saved".to_string();
        saved_b.sorting = Some(SortDirection::Asc);
        store.persist(&[saved_b.clone(), column("GONE", true, 2)]).unwrap();

        let fresh = vec![column("A", true, 1), column("B", false, 0)];
        let restored = store.restore(fresh);

        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0], column("A", true, 1));
        assert_eq!(restored[1], saved_b);
    }

    #[test]
    fn test_shown_column_position_survives_persist() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut columns = vec![column("A", true, 1), column("B", true, 2), column("C", false, 0)];
        normalize_order(&mut columns);
        let k = visible_count(&columns) as u32;

        let shown = show_column(&columns, "C").unwrap();
        store.persist(&shown).unwrap();

        let fresh = vec![column("A", true, 0), column("B", true, 0), column("C", false, 0)];
        let restored = store.restore(fresh);
        let c = restored.iter().find(|c| c.id == "C").unwrap();
        assert!(c.visible);
        assert_eq!(c.order_number, k + 1);
    }

    #[test]
    fn test_persist_replaces_previous_content() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.persist(&[column("A", true, 1), column("B", true, 2)]).unwrap();
        store.persist(&[column("B", true, 1)]).unwrap();

        let restored = store.restore(vec![column("A", false, 0), column("B", false, 0)]);
        assert_eq!(restored[0], column("A", false, 0));
        assert_eq!(restored[1], column("B", true, 1));
    }

    #[test]
    fn test_persist_keeps_other_namespaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LAYOUT_FILE_NAME);
        let report_a = LayoutStore::new(&path, "report-a");
        let report_b = LayoutStore::new(&path, "report-b");

        report_a.persist(&[column("A", true, 1)]).unwrap();
        report_b.persist(&[column("B", true, 1), column("C", true, 2)]).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(written.get("report-a").is_some());
        assert!(written.get("report-b").is_some());

        assert_eq!(report_a.restore(vec![column("A", false, 0)]), vec![column("A", true, 1)]);
        assert_eq!(
            report_b.restore(vec![column("B", false, 0), column("C", false, 0)]),
            vec![column("B", true, 1), column("C", true, 2)]
        );
    }

    #[test]
    fn test_persist_over_malformed_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), "[1, 2").unwrap();

        store.persist(&[column("A", true, 1)]).unwrap();
        assert_eq!(store.restore(vec![column("A", false, 0)]), vec![column("A", true, 1)]);
    }

    fn arb_descriptor(index: usize) -> impl Strategy<Value = ColumnDescriptor> {
        (
            "[A-Za-z ]{0,12}",
            any::<bool>(),
            any::<bool>(),
            0u32..20,
            prop_oneof![
                Just(ColumnType::Standard),
                (1u32..50).prop_map(ColumnType::CustomSched),
                (1u32..50).prop_map(ColumnType::CustomUser),
                (1u32..50).prop_map(ColumnType::CustomCpnt),
            ],
            proptest::option::of(prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)]),
        )
            .prop_map(move |(label, referenced, visible, order_number, column_type, sorting)| {
                ColumnDescriptor {
                    id: format!("FIELD_{}", index),
                    label,
                    referenced,
                    column_type,
                    visible,
                    order_number,
                    date_field: index % 3 == 0,
                    sorting,
                }
            })
    }

    fn arb_descriptors() -> impl Strategy<Value = Vec<ColumnDescriptor>> {
        (0usize..10).prop_flat_map(|n| (0..n).map(arb_descriptor).collect::<Vec<_>>())
    }

    proptest! {
        #[test]
        fn prop_restore_after_persist_is_identity(columns in arb_descriptors()) {
            let dir = TempDir::new().unwrap();
            let store = store(&dir);
            store.persist(&columns).unwrap();

            let fresh: Vec<ColumnDescriptor> = columns
                .iter()
                .map(|c| ColumnDescriptor::standard(c.id.clone(), c.id.clone()))
                .collect();
            prop_assert_eq!(store.restore(fresh), columns);
        }
    }
}
