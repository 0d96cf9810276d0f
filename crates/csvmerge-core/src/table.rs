//! Core table types for representing price history data

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format for calendar dates
pub const DATE_OUTPUT_FORMAT: &str = "%Y-%m-%d";

/// A parsed table from a single CSV file, headers as found in the file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Column definitions
    pub columns: Vec<Column>,
    /// Row data
    pub rows: Vec<Row>,
    /// Source file path
    pub source_path: PathBuf,
}

impl Table {
    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Header names in file order
    pub fn header_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (e.g., "Date" or "Último")
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }
}

/// A row of data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    /// Cell values for each column
    pub cells: Vec<CellValue>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// A table whose headers went through the alias table and whose rows all
/// carry a calendar date.
///
/// Always contains a `Date` and a `Close` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedTable {
    /// Canonical (or passed-through) column definitions
    pub columns: Vec<Column>,
    /// Records in file order
    pub records: Vec<Record>,
    /// Source file path
    pub source_path: PathBuf,
    /// Headers exactly as they appeared in the file
    pub original_headers: Vec<String>,
}

impl NormalizedTable {
    /// Get the number of records
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Earliest and latest date in the table
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}

/// A row keyed by its calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Value of the Date column
    pub date: NaiveDate,
    /// Cell values, the Date column holding `CellValue::Date`
    pub cells: Vec<CellValue>,
}

/// A cell value with type detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// Calendar date (only produced for the Date column)
    Date(NaiveDate),
    /// String value
    String(String),
    /// Empty/missing cell
    Empty,
}

impl CellValue {
    /// Parse a string into a CellValue, detecting the type
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        // Try parsing as integer first
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }

        // Plain decimals only, and only when they print back to the same value
        if let Ok(f) = trimmed.parse::<f64>() {
            if let (Some(text), Some(printed)) =
                (plain_decimal(trimmed), plain_decimal(&f.to_string()))
            {
                if text == printed {
                    return CellValue::Float(f);
                }
            }
        }

        // Otherwise, keep as string ("1,234.50", "1.23K", "1e3", huge integers)
        CellValue::String(trimmed.to_string())
    }

    /// Convert to the string written to CSV
    pub fn to_string_value(&self) -> String {
        self.to_string()
    }
}

/// Canonical digits of a plain decimal literal: sign, integer part without
/// leading zeros, fraction without trailing zeros. `None` for anything else
/// (exponents, "inf", "NaN").
fn plain_decimal(s: &str) -> Option<(bool, &str, &str)> {
    let (negative, digits) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));
    if int.is_empty() && frac.is_empty() {
        return None;
    }
    if !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let int = int.trim_start_matches('0');
    let frac = frac.trim_end_matches('0');
    // -0 and 0 are the same value
    Some((negative && !(int.is_empty() && frac.is_empty()), int, frac))
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(fl) => write!(f, "{}", fl),
            CellValue::Date(d) => write!(f, "{}", d.format(DATE_OUTPUT_FORMAT)),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Empty => write!(f, ""),
        }
    }
}
