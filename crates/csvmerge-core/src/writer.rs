//! Export of a merged table to CSV

use crate::error::{Error, Result};
use crate::merger::MergedTable;
use std::io::BufWriter;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write a merged table to `path`.
///
/// The table is written to a temporary file next to `path` and moved into
/// place once complete, so `path` either keeps its previous state or holds
/// the whole table.
pub fn write_csv<P: AsRef<Path>>(table: &MergedTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(BufWriter::new(tmp.as_file()));

        let csv_err = |e: csv::Error| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        };

        // Write header
        writer
            .write_record(table.columns.iter().map(|c| c.name.as_str()))
            .map_err(csv_err)?;

        // Write rows
        for row in &table.rows {
            writer
                .write_record(row.cells.iter().map(|c| c.to_string_value()))
                .map_err(csv_err)?;
        }

        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
