//! Spreadsheet-style export of a finished report.
//!
//! [`CsvExporter`] writes two artifacts into an output directory:
//! - `report.csv` - two header rows (category, priority) then one row per metric
//! - `jql_queries.csv` - the rendered query for every metric and category
//!
//! Each file is written to a temp file in the same directory, synced, then
//! renamed over the target.

use crate::error::{ReportError, Result};
use crate::model::Category;
use crate::report::ReportOutput;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const REPORT_FILENAME: &str = "report.csv";
pub const QUERIES_FILENAME: &str = "jql_queries.csv";

/// Receives the finished table and rendered catalog.
pub trait ReportExporter {
    /// Persist a finished report.
    ///
    /// # Errors
    ///
    /// Returns an error if any artifact cannot be written.
    fn export(&self, output: &ReportOutput) -> Result<ExportSummary>;
}

/// Paths written by an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub report_path: PathBuf,
    pub queries_path: PathBuf,
    pub rows: usize,
}

/// Writes CSV artifacts into a directory.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl CsvExporter {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl ReportExporter for CsvExporter {
    fn export(&self, output: &ReportOutput) -> Result<ExportSummary> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.output_dir.join(REPORT_FILENAME);
        let report_bytes = render_report_csv(output)?;
        write_atomic(&report_path, &report_bytes)?;

        let queries_path = self.output_dir.join(QUERIES_FILENAME);
        let queries_bytes = render_queries_csv(output)?;
        write_atomic(&queries_path, &queries_bytes)?;

        let rows = output.table.rows().len();
        info!(
            report = %report_path.display(),
            queries = %queries_path.display(),
            rows,
            "Report exported"
        );

        Ok(ExportSummary {
            report_path,
            queries_path,
            rows,
        })
    }
}

/// Render the table as CSV with two header rows.
///
/// # Errors
///
/// Returns an error if CSV serialization fails.
pub fn render_report_csv(output: &ReportOutput) -> Result<Vec<u8>> {
    let columns = output.table.layout().columns();
    let mut writer = csv::WriterBuilder::new().flexible(false).from_writer(Vec::new());

    let mut group_header = vec!["Metrics".to_string()];
    group_header.extend(columns.iter().map(|c| c.group.clone()));
    writer.write_record(&group_header)?;

    let mut priority_header = vec!["Priority".to_string()];
    priority_header.extend(columns.iter().map(|c| c.priority_label().to_string()));
    writer.write_record(&priority_header)?;

    for rendered in output.table.render_rows() {
        let mut record = Vec::with_capacity(rendered.values.len() + 1);
        record.push(rendered.metric);
        record.extend(rendered.values);
        writer.write_record(&record)?;
    }

    finish(writer)
}

/// Render the rendered catalog as CSV: metric, then one column per category.
///
/// # Errors
///
/// Returns an error if CSV serialization fails.
pub fn render_queries_csv(output: &ReportOutput) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["Metric"];
    header.extend(Category::ALL.iter().map(|c| c.as_str()));
    writer.write_record(&header)?;

    for metric in output.queries.metrics() {
        let mut record = vec![metric.to_string()];
        record.extend(
            Category::ALL
                .iter()
                .map(|category| output.queries.get(*category, metric).unwrap_or("").to_string()),
        );
        writer.write_record(&record)?;
    }

    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| ReportError::Export(e.to_string()))
}

/// Write bytes via a sibling temp file and rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        ReportError::Export(format!("Invalid output path: {}", path.display()))
    })?;
    fs::create_dir_all(parent)?;

    let temp_path = path.with_extension("csv.tmp");
    let write_result = (|| -> Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::age::DefectAges;
    use crate::catalog::{DateWindow, QueryCatalog};
    use crate::fetch::FetchStats;
    use crate::model::{PriorityBucket, row};
    use crate::table::{Cell, ColumnKey, MetricsTable};
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_output() -> ReportOutput {
        let mut table = MetricsTable::standard();
        table.drop_row(row::RESOLUTION);
        table.set(
            row::BUGS_RAISED,
            &ColumnKey::cell(Category::Regression, PriorityBucket::Blocker),
            Cell::Count(3),
        );
        table.set(row::BUGS_RAISED, &ColumnKey::overall(), Cell::Count(3));
        table.normalize();

        let mut catalog = QueryCatalog::default();
        catalog.insert(Category::Regression, "Noise", "labels = r AND created >= {{start_date}}");
        catalog.insert(Category::Exploratory, "Noise", "labels = \"e, x\"");
        let window = DateWindow::new("2024-01-01", "2024-01-31");

        ReportOutput {
            queries: catalog.render(&window),
            window,
            generated_at: Utc::now(),
            table,
            defect_ages: DefectAges::default(),
            fetch_stats: FetchStats::default(),
        }
    }

    #[test]
    fn report_csv_has_two_header_rows() {
        let bytes = render_report_csv(&sample_output()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Metrics,Regression,Regression,Regression,Exploratory,Exploratory,Exploratory,Overall"
        );
        assert_eq!(lines[1], "Priority,Blocker,Critical,Others,Blocker,Critical,Others,");
        assert_eq!(lines[2], "BugsRaised,3,0,0,0,0,0,3");
        assert!(!text.contains("Resolution,"));
        assert_eq!(lines.len(), 2 + row::ALL.len() - 1);
    }

    #[test]
    fn queries_csv_quotes_and_renders() {
        let bytes = render_queries_csv(&sample_output()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Metric,Regression,Exploratory");
        assert!(lines[1].starts_with("Noise,labels = r AND created >= 2024-01-01,"));
        assert!(lines[1].contains("\"labels = \"\"e, x\"\"\""));
    }

    #[test]
    fn export_writes_both_files_atomically() {
        let temp = TempDir::new().expect("tempdir");
        let out_dir = temp.path().join("nested").join("report");
        let exporter = CsvExporter::new(&out_dir);

        let summary = exporter.export(&sample_output()).expect("export");
        assert!(summary.report_path.is_file());
        assert!(summary.queries_path.is_file());
        assert_eq!(summary.rows, row::ALL.len() - 1);

        let leftovers: Vec<_> = fs::read_dir(&out_dir)
            .unwrap()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn re_export_overwrites_cleanly() {
        let temp = TempDir::new().expect("tempdir");
        let exporter = CsvExporter::new(temp.path());
        let first = exporter.export(&sample_output()).unwrap();
        let before = fs::read_to_string(&first.report_path).unwrap();
        let second = exporter.export(&sample_output()).unwrap();
        let after = fs::read_to_string(&second.report_path).unwrap();
        assert_eq!(before, after);
    }
}
