//! Merge engine for consolidating repeated downloads of one price history

use crate::error::{Error, Result};
use crate::normalizer::{display_name, normalize};
use crate::scanner::find_files;
use crate::table::{CellValue, Column, NormalizedTable};
use crate::writer::write_csv;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Suffix appended to the pattern to name the merged file
pub const OUTPUT_SUFFIX: &str = "_TOTAL.csv";

/// A merged table: one row per date, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedTable {
    /// Column definitions (union of all source columns, first-seen order)
    pub columns: Vec<Column>,
    /// Rows with provenance
    pub rows: Vec<MergedRow>,
    /// Files that contributed to this table, in merge order
    pub sources: Vec<PathBuf>,
}

impl MergedTable {
    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find the row for a date
    pub fn find_row(&self, date: NaiveDate) -> Option<&MergedRow> {
        self.rows.iter().find(|r| r.date == date)
    }

    /// Column names in output order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// A row in the merged table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedRow {
    /// Deduplication and sort key
    pub date: NaiveDate,
    /// One cell per merged column
    pub cells: Vec<CellValue>,
    /// The file this row was taken from
    pub source: PathBuf,
}

/// A file that was left out of the merge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    /// Path of the skipped file
    pub path: PathBuf,
    /// Why it was skipped
    pub error: String,
}

/// Summary of a merge run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeReport {
    /// Where the merged table was written
    pub output_path: PathBuf,
    /// Files that matched the pattern
    pub files_matched: usize,
    /// Files that made it into the merge
    pub files_merged: usize,
    /// Files that were skipped, with the reason
    pub failures: Vec<FileFailure>,
    /// Rows in the merged table
    pub record_count: usize,
    /// Columns of the merged table
    pub columns: Vec<String>,
}

impl MergeReport {
    /// Save the report as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Path of the merged file for a directory and pattern
pub fn output_path<P: AsRef<Path>>(directory: P, pattern: &str) -> PathBuf {
    directory.as_ref().join(format!("{}{}", pattern, OUTPUT_SUFFIX))
}

/// Merge every file in `directory` matching `pattern` into
/// `<directory>/<pattern>_TOTAL.csv`.
///
/// Files that cannot be read or normalized are skipped. The run fails if
/// nothing matched, if no file was usable, or if combining or writing fails;
/// in that case no output file is produced.
pub fn merge<P: AsRef<Path>>(directory: P, pattern: &str) -> Result<MergeReport> {
    let directory = directory.as_ref();
    info!("starting CSV merge in {}", directory.display());

    let result = run_merge(directory, pattern);
    if let Err(e) = &result {
        error!("merge process failed: {}", e);
    }
    result
}

fn run_merge(directory: &Path, pattern: &str) -> Result<MergeReport> {
    // Discover
    let files = find_files(directory, pattern)?;
    if files.is_empty() {
        return Err(Error::NoFilesFound {
            directory: directory.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }

    // Normalize each, skipping failures
    let (tables, failures) = normalize_all(&files);
    if tables.is_empty() {
        return Err(Error::NoUsableData {
            pattern: pattern.to_string(),
            failed: failures.len(),
        });
    }
    let files_merged = tables.len();

    // Combine, deduplicate, sort, emit
    let output = output_path(directory, pattern);
    let merged = merge_tables(tables)
        .and_then(|merged| write_csv(&merged, &output).map(|_| merged))
        .map_err(Error::into_merge)?;
    info!("merged file saved: {}", display_name(&output));

    let report = MergeReport {
        output_path: output,
        files_matched: files.len(),
        files_merged,
        failures,
        record_count: merged.row_count(),
        columns: merged.column_names(),
    };

    info!("final statistics:");
    info!("- files matched: {}", report.files_matched);
    info!("- files processed: {}", report.files_merged);
    info!("- total records: {}", report.record_count);
    info!("- columns in merged file: {:?}", report.columns);

    Ok(report)
}

/// Normalize every path, splitting successes from failures
pub fn normalize_all(paths: &[PathBuf]) -> (Vec<NormalizedTable>, Vec<FileFailure>) {
    let mut tables = Vec::new();
    let mut failures = Vec::new();

    for path in paths {
        match normalize(path) {
            Ok(table) => {
                info!("file processed: {}", display_name(path));
                tables.push(table);
            }
            Err(e) => {
                error!("skipping {}: {}", display_name(path), e);
                failures.push(FileFailure {
                    path: path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    (tables, failures)
}

/// Combine normalized tables into one row per date, newest first.
///
/// When several rows share a date, the first one in concatenation order
/// (earlier tables, then earlier rows) is kept whole.
pub fn merge_tables(tables: Vec<NormalizedTable>) -> Result<MergedTable> {
    // Build unified column list (union of all columns)
    let mut column_names: Vec<String> = Vec::new();
    let mut seen_columns: HashSet<String> = HashSet::new();

    for table in &tables {
        for col in &table.columns {
            if seen_columns.insert(col.name.clone()) {
                column_names.push(col.name.clone());
            }
        }
    }

    let columns: Vec<Column> = column_names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Column::new(name, i))
        .collect();

    let col_index: HashMap<&str, usize> = columns
        .iter()
        .map(|c| (c.name.as_str(), c.index))
        .collect();

    let sources: Vec<PathBuf> = tables.iter().map(|t| t.source_path.clone()).collect();

    let mut seen_dates: HashSet<NaiveDate> = HashSet::new();
    let mut rows: Vec<MergedRow> = Vec::new();

    for table in tables {
        // Source position -> unified position
        let mapping: Vec<usize> = table
            .columns
            .iter()
            .map(|c| col_index[c.name.as_str()])
            .collect();

        for record in table.records {
            if !seen_dates.insert(record.date) {
                continue;
            }

            let mut cells = vec![CellValue::Empty; columns.len()];
            for (src_idx, cell) in record.cells.into_iter().enumerate() {
                if let Some(&unified_idx) = mapping.get(src_idx) {
                    cells[unified_idx] = cell;
                }
            }

            rows.push(MergedRow {
                date: record.date,
                cells,
                source: table.source_path.clone(),
            });
        }
    }

    rows.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(MergedTable {
        columns,
        rows,
        sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize_table;
    use crate::parser::{parse_csv, parse_csv_str};

    fn table(csv: &str, name: &str) -> NormalizedTable {
        normalize_table(parse_csv_str(csv, name).unwrap()).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn dates(merged: &MergedTable) -> Vec<NaiveDate> {
        merged.rows.iter().map(|r| r.date).collect()
    }

    #[test]
    fn test_first_seen_row_wins() {
        let a = table("Date,Close\n2024-01-01,100\n", "a.csv");
        let b = table("Date,Close\n2024-01-01,200\n", "b.csv");

        let merged = merge_tables(vec![a, b]).unwrap();

        assert_eq!(merged.row_count(), 1);
        let row = merged.find_row(ymd(2024, 1, 1)).unwrap();
        assert_eq!(row.cells[1], CellValue::Integer(100));
        assert_eq!(row.source, PathBuf::from("a.csv"));
    }

    #[test]
    fn test_first_seen_wins_for_whole_row() {
        let a = table("Date,Close\n2024-01-01,100\n", "a.csv");
        let b = table("Date,Close,Volume\n2024-01-01,200,5K\n", "b.csv");

        let merged = merge_tables(vec![a, b]).unwrap();

        // Volume is not filled in from the later file
        let row = merged.find_row(ymd(2024, 1, 1)).unwrap();
        assert_eq!(row.cells[2], CellValue::Empty);
    }

    #[test]
    fn test_duplicate_dates_within_one_file() {
        let a = table("Date,Close\n2024-01-01,1\n2024-01-01,2\n", "a.csv");

        let merged = merge_tables(vec![a]).unwrap();

        assert_eq!(merged.row_count(), 1);
        assert_eq!(merged.rows[0].cells[1], CellValue::Integer(1));
    }

    #[test]
    fn test_rows_sorted_newest_first() {
        let a = table("Date,Close\n2024-01-01,1\n2024-03-01,3\n", "a.csv");
        let b = table("Date,Close\n2024-02-01,2\n", "b.csv");

        let merged = merge_tables(vec![a, b]).unwrap();

        assert_eq!(
            dates(&merged),
            vec![ymd(2024, 3, 1), ymd(2024, 2, 1), ymd(2024, 1, 1)]
        );
    }

    #[test]
    fn test_same_day_in_different_formats_deduplicates() {
        let en = table("Date,Price\n01/15/2024,35.1\n", "en.csv");
        let es = table("Fecha,Último\n15.01.2024,99\n", "es.csv");

        let merged = merge_tables(vec![en, es]).unwrap();

        assert_eq!(merged.row_count(), 1);
        assert_eq!(merged.rows[0].cells[1], CellValue::Float(35.1));
    }

    #[test]
    fn test_column_union_fills_missing() {
        let a = table("Date,Close\n2024-01-01,1\n", "a.csv");
        let b = table("Date,Volume,Close\n2024-01-02,7K,2\n", "b.csv");

        let merged = merge_tables(vec![a, b]).unwrap();

        assert_eq!(merged.column_names(), vec!["Date", "Close", "Volume"]);
        let old = merged.find_row(ymd(2024, 1, 1)).unwrap();
        assert_eq!(old.cells[2], CellValue::Empty);
        // b's columns are realigned to the unified order
        let new = merged.find_row(ymd(2024, 1, 2)).unwrap();
        assert_eq!(new.cells[1], CellValue::Integer(2));
        assert_eq!(new.cells[2], CellValue::String("7K".to_string()));
        assert_eq!(merged.sources, vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]);
    }

    #[test]
    fn test_merge_writes_total_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "P.csv", "Date,Price\n01/02/2024,2\n01/01/2024,1\n");
        write(dir.path(), "P (1).csv", "Fecha,Último,Vol.\n03.01.2024,3,1K\n");
        write(dir.path(), "Other.csv", "Date,Close\n2030-01-01,9\n");

        let report = merge(dir.path(), "P").unwrap();

        assert_eq!(report.files_matched, 2);
        assert_eq!(report.files_merged, 2);
        assert_eq!(report.record_count, 3);
        assert_eq!(report.columns, vec!["Date", "Close", "Volume"]);
        assert_eq!(report.output_path, dir.path().join("P_TOTAL.csv"));

        let content = fs::read_to_string(&report.output_path).unwrap();
        assert_eq!(
            content,
            "Date,Close,Volume\n2024-01-03,3,1K\n2024-01-02,2,\n2024-01-01,1,\n"
        );
    }

    #[test]
    fn test_repeated_and_blank_headers_survive_merge() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "P.csv", "Date,Close,Note,Note\n2024-01-01,1,a,b\n");
        write(dir.path(), "P (1).csv", "Date,Close,,\n2024-01-02,2,,\n");

        let report = merge(dir.path(), "P").unwrap();

        assert_eq!(report.files_merged, 2);
        assert!(report.failures.is_empty());
        let content = fs::read_to_string(&report.output_path).unwrap();
        let header: HashSet<&str> = content.lines().next().unwrap().split(',').collect();
        assert_eq!(
            header,
            HashSet::from(["Date", "Close", "Note", "Note.1", "Unnamed: 2", "Unnamed: 3"])
        );
        // both Note values are written, neither overwrites the other
        let old_row: Vec<&str> = content
            .lines()
            .find(|l| l.starts_with("2024-01-01"))
            .unwrap()
            .split(',')
            .collect();
        assert!(old_row.contains(&"a"));
        assert!(old_row.contains(&"b"));
    }

    #[test]
    fn test_large_volume_is_written_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "P.csv",
            "Date,Close,Volume\n2024-01-01,1,12345678901234567891\n2024-01-02,2,1e3\n",
        );

        let report = merge(dir.path(), "P").unwrap();

        let content = fs::read_to_string(&report.output_path).unwrap();
        assert_eq!(
            content,
            "Date,Close,Volume\n2024-01-02,2,1e3\n2024-01-01,1,12345678901234567891\n"
        );
    }

    #[test]
    fn test_bad_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "P.csv", "Date,Close\n2024-01-01,1\n");
        let bad = write(dir.path(), "P (1).csv", "Date,Open\n2024-01-02,2\n");

        let report = merge(dir.path(), "P").unwrap();

        assert_eq!(report.files_matched, 2);
        assert_eq!(report.files_merged, 1);
        assert_eq!(report.record_count, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, bad);
        assert!(report.failures[0].error.contains("Close"));
    }

    #[test]
    fn test_no_files_found() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Other.csv", "Date,Close\n2024-01-01,1\n");

        let err = merge(dir.path(), "P").unwrap_err();

        assert!(matches!(err, Error::NoFilesFound { .. }));
        assert!(!output_path(dir.path(), "P").exists());
    }

    #[test]
    fn test_all_files_fail() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "P.csv", "Date,Open\n2024-01-01,1\n");
        write(dir.path(), "P (1).csv", "Fecha,Apertura\n01.01.2024,1\n");

        let err = merge(dir.path(), "P").unwrap_err();

        match err {
            Error::NoUsableData { failed, .. } => assert_eq!(failed, 2),
            other => panic!("expected no usable data, got {other:?}"),
        }
        assert!(!output_path(dir.path(), "P").exists());
    }

    #[test]
    fn test_failed_write_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "P.csv", "Date,Close\n2024-01-01,1\n");
        // A directory squatting on the output name makes the final rename fail
        fs::create_dir(output_path(dir.path(), "P")).unwrap();

        let err = merge(dir.path(), "P").unwrap_err();

        assert!(matches!(err, Error::Merge(_)));
        assert!(output_path(dir.path(), "P").is_dir());
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_merging_output_again_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "P.csv", "Date,Price,Change %\n01/02/2024,2.5,0.1%\n01/01/2024,2.25,\n");
        write(dir.path(), "P (1).csv", "Fecha,Último\n04.01.2024,4\n03.01.2024,3\n");

        let first = merge(dir.path(), "P").unwrap();
        let first_rows = parse_csv(&first.output_path).unwrap();

        // Feed the merged file back in as the next numbered copy
        fs::rename(&first.output_path, dir.path().join("P (2).csv")).unwrap();
        let second = merge(dir.path(), "P").unwrap();
        let second_rows = parse_csv(&second.output_path).unwrap();

        assert_eq!(first.record_count, second.record_count);
        let as_text = |t: &crate::table::Table| -> HashSet<Vec<String>> {
            t.rows
                .iter()
                .map(|r| r.cells.iter().map(|c| c.to_string_value()).collect())
                .collect()
        };
        assert_eq!(first_rows.header_names(), second_rows.header_names());
        assert_eq!(as_text(&first_rows), as_text(&second_rows));
    }

    #[test]
    fn test_report_saves_as_json() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "P.csv", "Date,Close\n2024-01-01,1\n");
        let report = merge(dir.path(), "P").unwrap();

        let json_path = dir.path().join("report.json");
        report.save(&json_path).unwrap();

        let loaded: MergeReport =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(loaded.record_count, 1);
        assert_eq!(loaded.columns, vec!["Date", "Close"]);
    }
}
