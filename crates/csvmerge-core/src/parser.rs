//! CSV parser for downloaded price history files

use crate::error::{Error, Result};
use crate::table::{CellValue, Column, Row, Table};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::warn;

const BOM: char = '\u{feff}';

/// Parse a CSV file into a Table
pub fn parse_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    // The handle is dropped when this returns
    parse_reader(BufReader::new(file), path.to_path_buf())
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, source_name: &str) -> Result<Table> {
    parse_reader(content.as_bytes(), PathBuf::from(source_name))
}

fn parse_reader<R: Read>(reader: R, path: PathBuf) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // Allow varying number of fields
        .from_reader(reader);

    // Parse headers into columns
    let headers = csv_reader.headers().map_err(|e| Error::Csv {
        path: path.clone(),
        source: e,
    })?;

    let names: Vec<&str> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| if i == 0 { name.trim_start_matches(BOM) } else { name })
        .collect();

    if names.iter().all(|name| name.is_empty()) {
        return Err(Error::CsvParse {
            path,
            message: "no columns found in CSV".to_string(),
        });
    }

    let columns = unique_columns(&names);

    // Parse rows
    let mut rows = Vec::new();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| Error::Csv {
            path: path.clone(),
            source: e,
        })?;

        let mut cells: Vec<CellValue> = record.iter().map(CellValue::parse).collect();

        // Pad with empty cells if row is shorter than header
        while cells.len() < columns.len() {
            cells.push(CellValue::Empty);
        }

        // Warn if row is longer than header (truncate)
        if cells.len() > columns.len() {
            warn!(
                "row {} in {} has more cells than columns, truncating",
                row_idx + 1,
                path.display()
            );
            cells.truncate(columns.len());
        }

        rows.push(Row::new(cells));
    }

    Ok(Table {
        columns,
        rows,
        source_path: path,
    })
}

/// Give every header a distinct name.
///
/// Blank headers become `Unnamed: <index>`; a repeated header gets a
/// `.1`, `.2`, ... suffix, so `Note,Note` reads as `Note,Note.1`.
fn unique_columns(names: &[&str]) -> Vec<Column> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut columns = Vec::with_capacity(names.len());

    for (i, name) in names.iter().enumerate() {
        let base = if name.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            name.to_string()
        };

        let mut unique = base.clone();
        let mut n = 1;
        while taken.contains(&unique) {
            unique = format!("{}.{}", base, n);
            n += 1;
        }

        taken.insert(unique.clone());
        columns.push(Column::new(unique, i));
    }

    columns
}
