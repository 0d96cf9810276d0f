//! Error types for csvmerge-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in csvmerge-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Structurally unusable CSV (no header, no columns)
    #[error("failed to parse CSV '{path}': {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A value in the Date column is not a recognizable calendar date
    #[error("invalid date '{value}' on row {row} of '{path}'")]
    InvalidDate {
        path: PathBuf,
        row: usize,
        value: String,
    },

    /// Required canonical columns absent after renaming
    #[error("missing required columns in '{path}': {}", .missing.join(", "))]
    Schema { path: PathBuf, missing: Vec<String> },

    /// Two source headers were renamed onto the same canonical column
    #[error("column '{column}' appears more than once in '{path}' after renaming")]
    DuplicateColumn { path: PathBuf, column: String },

    /// No file in the directory matched the pattern
    #[error("no CSV files matching '{pattern}' found in '{}'", .directory.display())]
    NoFilesFound { directory: PathBuf, pattern: String },

    /// Every matched file failed normalization
    #[error("none of the {failed} file(s) matching '{pattern}' could be processed")]
    NoUsableData { pattern: String, failed: usize },

    /// Failure while combining, sorting or writing the merged table
    #[error("merge failed: {0}")]
    Merge(#[source] Box<Error>),

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// The file name rule could not be compiled
    #[error("invalid file pattern: {0}")]
    Regex(#[from] regex::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error only disqualifies a single input file.
    ///
    /// Per-file errors are collected and the file is skipped; everything
    /// else aborts the run.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Error::FileRead { .. }
                | Error::CsvParse { .. }
                | Error::Csv { .. }
                | Error::InvalidDate { .. }
                | Error::Schema { .. }
                | Error::DuplicateColumn { .. }
        )
    }

    /// Wrap a failure from the combine-through-write stage.
    pub(crate) fn into_merge(self) -> Error {
        match self {
            Error::Merge(_) => self,
            other => Error::Merge(Box::new(other)),
        }
    }
}
