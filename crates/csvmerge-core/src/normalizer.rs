//! Header normalization and schema validation for a single export
//!
//! Turns a raw [`Table`] into a [`NormalizedTable`]:
//! - headers are renamed through the alias table
//! - `Date` and `Close` must be present afterwards
//! - every `Date` cell must be a calendar date

use crate::aliases::{canonical_name, rename_header, DATE_COLUMN, REQUIRED_COLUMNS};
use crate::dates::parse_date;
use crate::error::{Error, Result};
use crate::parser::parse_csv;
use crate::table::{CellValue, Column, NormalizedTable, Record, Table};
use std::path::Path;
use tracing::{error, info, warn};

/// Read and normalize one file.
///
/// Errors are logged with the file name before being returned; the caller
/// decides whether to skip the file or abort.
pub fn normalize<P: AsRef<Path>>(path: P) -> Result<NormalizedTable> {
    let path = path.as_ref();
    let result = parse_csv(path).and_then(normalize_table);

    if let Err(e) = &result {
        error!("error processing {}: {}", display_name(path), e);
    }
    result
}

/// Normalize an already-parsed table
pub fn normalize_table(table: Table) -> Result<NormalizedTable> {
    let name = display_name(&table.source_path);
    let original_headers: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();
    info!("original columns in {}: {:?}", name, original_headers);

    let columns = rename_columns(&table.columns);

    let missing = missing_required(&columns);
    let date_idx = match columns.iter().position(|c| c.name == DATE_COLUMN) {
        Some(idx) if missing.is_empty() => idx,
        _ => {
            warn!("missing columns in {}: {:?}", name, missing);
            return Err(Error::Schema {
                path: table.source_path,
                missing,
            });
        }
    };

    if let Some(column) = renamed_collision(&table.columns, &columns) {
        return Err(Error::DuplicateColumn {
            path: table.source_path,
            column,
        });
    }

    let mut records = Vec::with_capacity(table.rows.len());
    for (row_idx, row) in table.rows.into_iter().enumerate() {
        let raw = row.get(date_idx).map(|c| c.to_string_value()).unwrap_or_default();
        let date = parse_date(&raw).ok_or_else(|| Error::InvalidDate {
            path: table.source_path.clone(),
            // 1-based, counting the header line
            row: row_idx + 2,
            value: raw.clone(),
        })?;

        let mut cells = row.cells;
        cells[date_idx] = CellValue::Date(date);
        records.push(Record { date, cells });
    }

    Ok(NormalizedTable {
        columns,
        records,
        source_path: table.source_path,
        original_headers,
    })
}

/// Apply the alias table to every column, keeping positions
pub fn rename_columns(columns: &[Column]) -> Vec<Column> {
    columns
        .iter()
        .map(|c| Column::new(rename_header(&c.name), c.index))
        .collect()
}

/// Required canonical columns not present in `columns`
pub fn missing_required(columns: &[Column]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|req| !columns.iter().any(|c| c.name == **req))
        .map(|req| req.to_string())
        .collect()
}

/// First canonical name that an alias rename made collide with another
/// column. Raw headers are already distinct, so passthrough columns never
/// collide among themselves.
fn renamed_collision(original: &[Column], renamed: &[Column]) -> Option<String> {
    original
        .iter()
        .zip(renamed)
        .filter(|(orig, _)| canonical_name(&orig.name).is_some())
        .find(|(_, col)| {
            renamed
                .iter()
                .any(|other| other.index != col.index && other.name == col.name)
        })
        .map(|(_, col)| col.name.clone())
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
