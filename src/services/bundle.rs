//! Report bundle loading
//!
//! A bundle is everything the host hands over up front: the dataset, the
//! label dictionary and the user's preferences.

use crate::model::{ReportBundle, Schema};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Sample bundle used by `--preview`
const PREVIEW_BUNDLE: &str = include_str!("../../demos/preview_bundle.json");

/// Read and parse a bundle file
pub fn load_bundle<P: AsRef<Path>>(path: P) -> Result<ReportBundle> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read bundle {}", path.display()))?;
    let bundle = parse_bundle(&contents)
        .with_context(|| format!("Failed to parse bundle {}", path.display()))?;

    info!(
        path = %path.display(),
        schedules = bundle.data.as_ref().map_or(0, |d| d.sched.len()),
        "bundle loaded"
    );
    Ok(bundle)
}

pub fn parse_bundle(contents: &str) -> Result<ReportBundle> {
    let bundle: ReportBundle = serde_json::from_str(contents)?;
    validate_schema(&bundle);
    Ok(bundle)
}

/// The built-in sample bundle
pub fn preview_bundle() -> Result<ReportBundle> {
    parse_bundle(PREVIEW_BUNDLE).context("Built-in preview bundle is invalid")
}

/// Log schedule rows whose fields differ from the first row.
///
/// Returns the number of mismatching rows.
pub fn validate_schema(bundle: &ReportBundle) -> usize {
    let Some(data) = bundle.data.as_ref() else {
        return 0;
    };

    let schema = Schema::from_rows(&data.sched);
    let mismatches = schema.mismatches(&data.sched);
    for mismatch in mismatches.iter().take(10) {
        warn!(
            row = mismatch.row_index,
            missing = ?mismatch.missing,
            unexpected = ?mismatch.unexpected,
            "schedule row does not match schema"
        );
    }
    if mismatches.len() > 10 {
        warn!(count = mismatches.len(), "further schema mismatches suppressed");
    }
    mismatches.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_preview_bundle_parses() {
        let bundle = preview_bundle().unwrap();
        let data = bundle.data.as_ref().unwrap();

        assert!(bundle.host_authorized);
        assert!(!data.sched.is_empty());
        assert!(!data.enroll.is_empty());
        assert!(bundle.preferences.is_some());
        assert_eq!(validate_schema(&bundle), 0);
    }

    #[test]
    fn test_load_bundle_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bundle.json");
        fs::write(
            &path,
            r#"{"data": {"sched": [{"SCHD_ID": 1}]}, "labels": {"label.ItemID": "Item"}, "hostAuthorized": false}"#,
        )
        .unwrap();

        let bundle = load_bundle(&path).unwrap();
        assert!(!bundle.host_authorized);
        assert_eq!(bundle.labels.lookup("label.ItemID"), "Item");
        assert!(bundle.preferences.is_none());
    }

    #[test]
    fn test_load_bundle_errors_carry_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        let err = load_bundle(&missing).unwrap_err();
        assert!(format!("{:#}", err).contains("missing.json"));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{").unwrap();
        let err = load_bundle(&broken).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse bundle"));
    }

    #[test]
    fn test_validate_schema_counts_mismatches() {
        let bundle = parse_bundle(
            r#"{"data": {"sched": [{"SCHD_ID": 1, "CPNT_ID": "a"}, {"SCHD_ID": 2}, {"SCHD_ID": 3, "CPNT_ID": "c"}]}}"#,
        )
        .unwrap();
        assert_eq!(validate_schema(&bundle), 1);
        assert_eq!(validate_schema(&ReportBundle::default()), 0);
    }
}
