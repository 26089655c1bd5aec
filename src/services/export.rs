//! CSV export of the current grid

use crate::model::TableProjection;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// `Report-<date>.csv`
pub fn default_export_name(date: NaiveDate) -> String {
    format!("Report-{}.csv", date.format("%Y-%m-%d"))
}

/// Write headers and rows as CSV
pub fn write_csv<W: Write>(writer: W, projection: &TableProjection) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&projection.headers)?;
    for row in &projection.rows {
        csv.write_record(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Export into `dir` under the default name for `date`, returning the path
pub fn export_to_file(dir: &Path, date: NaiveDate, projection: &TableProjection) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(default_export_name(date));

    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(file, projection).with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), rows = projection.rows.len(), "report exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn projection() -> TableProjection {
        TableProjection {
            column_ids: vec!["SCHD_ID".into(), "CPNT_TITLE".into()],
            headers: vec!["Schedule ID".into(), "Title".into()],
            rows: vec![
                vec!["1".into(), "Fire Safety".into()],
                vec!["2".into(), "Forklift, Advanced".into()],
            ],
        }
    }

    #[test]
    fn test_default_export_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(default_export_name(date), "Report-2024-03-07.csv");
    }

    #[test]
    fn test_write_csv_quotes_when_needed() {
        let mut out = Vec::new();
        write_csv(&mut out, &projection()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Schedule ID,Title\n1,Fire Safety\n2,\"Forklift, Advanced\"\n"
        );
    }

    #[test]
    fn test_export_to_file() {
        let dir = TempDir::new().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let path = export_to_file(&dir.path().join("exports"), date, &projection()).unwrap();

        assert!(path.ends_with("Report-2024-03-07.csv"));
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.starts_with("Schedule ID,Title\n"));
    }

    #[test]
    fn test_export_headers_only_for_empty_projection() {
        let mut out = Vec::new();
        let empty = TableProjection {
            headers: vec!["A".into()],
            ..Default::default()
        };
        write_csv(&mut out, &empty).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "A\n");
    }
}
