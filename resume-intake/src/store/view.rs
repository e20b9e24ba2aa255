use std::path::Path;

use serde::Serialize;

use crate::error::{IntakeError, Result};

/// The rows and columns currently shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableView {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header plus one record per row, in display order.
    pub fn export_csv(&self, destination: &Path) -> Result<usize> {
        let mut writer = csv::Writer::from_path(destination).map_err(|e| {
            IntakeError::WriteFailure(format!("cannot create {}: {e}", destination.display()))
        })?;

        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        tracing::info!(
            path = %destination.display(),
            rows = self.rows.len(),
            "Exported CSV"
        );
        Ok(self.rows.len())
    }

    /// Column widths for plain-text rendering, capped at `max_width`.
    pub fn column_widths(&self, max_width: usize) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .min(max_width)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> TableView {
        TableView::new(
            vec!["Name".into(), "Email".into(), "Notes".into()],
            vec![
                vec!["Doe, Jane".into(), "jane@example.com".into(), "said \"hi\"".into()],
                vec!["Ravi Kumar".into(), "ravi@example.com".into(), "line1\nline2".into()],
            ],
        )
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let view = sample();

        assert_eq!(view.export_csv(&path).unwrap(), 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(header, view.columns());

        let rows: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        assert_eq!(rows, view.rows());
    }

    #[test]
    fn test_export_into_missing_dir_is_write_failure() {
        let err = sample()
            .export_csv(Path::new("/nonexistent/dir/out.csv"))
            .unwrap_err();
        assert!(matches!(err, IntakeError::WriteFailure(_)));
    }

    #[test]
    fn test_is_empty_tracks_rows_not_columns() {
        assert!(!sample().is_empty());
        assert!(TableView::new(vec!["Name".into()], Vec::new()).is_empty());
    }

    #[test]
    fn test_column_widths() {
        assert_eq!(sample().column_widths(12), vec![10, 12, 11]);
    }
}
