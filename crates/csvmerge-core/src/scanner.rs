//! Directory scanner for discovering repeated downloads of one export

use crate::error::Result;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// Build the file name rule for a base pattern.
///
/// Matches `<pattern>.csv` and `<pattern> (N).csv` with N a positive
/// integer. The pattern itself is matched literally.
pub fn file_pattern(pattern: &str) -> Result<Regex> {
    let rule = format!(r"^{}(?: \(([1-9][0-9]*)\))?\.csv$", regex::escape(pattern));
    Ok(Regex::new(&rule)?)
}

/// Copy number of a matching file name: `None` for the plain download,
/// `Some(n)` for `<pattern> (n).csv`.
///
/// `rule` comes from [`file_pattern`]. Returns `None` as well when the
/// name does not match at all; use `rule.is_match` to test membership.
pub fn copy_number(rule: &Regex, file_name: &str) -> Option<u32> {
    rule.captures(file_name)?
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
}

/// Find the files in `directory` whose names match `pattern`.
///
/// Only direct entries are considered. Paths are returned in the order
/// the directory listing yields them.
pub fn find_files<P: AsRef<Path>>(directory: P, pattern: &str) -> Result<Vec<PathBuf>> {
    let rule = file_pattern(pattern)?;
    let mut files = Vec::new();

    for entry in WalkDir::new(directory.as_ref())
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(file_name) = entry.file_name().to_str() {
            if rule.is_match(file_name) {
                info!("file found: {}", file_name);
                files.push(entry.into_path());
            }
        }
    }

    Ok(files)
}
