//! csvmerge-core: Core library for merging historical-price CSV exports
//!
//! This library provides functionality to:
//! - Find repeated downloads of one export (`Name.csv`, `Name (1).csv`, ...)
//! - Parse CSV files into structured tables
//! - Translate localized headers to canonical column names
//! - Merge the files into one table, one row per date, newest first
//! - Write the result atomically to `Name_TOTAL.csv`

pub mod aliases;
pub mod dates;
pub mod error;
pub mod merger;
pub mod normalizer;
pub mod parser;
pub mod scanner;
pub mod table;
pub mod writer;

pub use error::{Error, Result};
pub use merger::{
    merge, merge_tables, output_path, FileFailure, MergeReport, MergedRow, MergedTable,
};
pub use normalizer::{normalize, normalize_table};
pub use parser::parse_csv;
pub use scanner::{copy_number, file_pattern, find_files};
pub use table::{CellValue, Column, NormalizedTable, Record, Row, Table};
pub use writer::write_csv;
