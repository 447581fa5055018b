use std::collections::BTreeSet;
use std::path::Path;

use crate::error::RunError;
use crate::models::{FileRecord, TECHNICAL_COLUMNS};

/// Collects records while a run is in progress.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    records: Vec<FileRecord>,
    total_duration: f64,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: FileRecord) {
        self.total_duration += record.duration_sec;
        self.records.push(record);
    }

    /// Sum of `duration_sec` over every record added so far.
    pub fn total(&self) -> f64 {
        self.total_duration
    }

    /// Freeze the column set: the sorted union of technical fields and every tag seen.
    pub fn finalize(self) -> ReportTable {
        let columns: BTreeSet<String> = TECHNICAL_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(
                self.records
                    .iter()
                    .flat_map(|r| r.keys().map(str::to_string)),
            )
            .collect();

        ReportTable {
            columns: columns.into_iter().collect(),
            records: self.records,
        }
    }
}

/// A finished report whose columns can no longer change.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    columns: Vec<String>,
    records: Vec<FileRecord>,
}

impl ReportTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Value of `column` for row `row`, empty when the record has no such key.
    pub fn cell(&self, row: usize, column: &str) -> String {
        self.records
            .get(row)
            .and_then(|r| r.value(column))
            .unwrap_or_default()
    }

    /// Rows rendered in column order.
    pub fn rows(&self) -> Vec<Vec<String>> {
        (0..self.records.len())
            .map(|row| self.columns.iter().map(|c| self.cell(row, c)).collect())
            .collect()
    }

    pub fn to_writer<W: std::io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in self.rows() {
            csv_writer.write_record(&row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table as UTF-8 CSV, replacing any existing file.
    pub fn write_csv(&self, path: &Path) -> Result<(), RunError> {
        let to_report_error = |source| RunError::Report {
            path: path.to_path_buf(),
            source,
        };
        let file = std::fs::File::create(path).map_err(|e| to_report_error(csv::Error::from(e)))?;
        self.to_writer(file).map_err(to_report_error)
    }
}
