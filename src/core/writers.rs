//! CSV writers for subsets.
//!
//! Each subset is written as its own file, `{key}.csv`, with a header row and
//! the columns in their current order. Missing cells are written as empty
//! fields. The row index is implicit and never written.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use thiserror::Error;

use super::table::{SubsetKey, Table};
use crate::config::delimiter_byte;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Output folder does not exist.
    #[error("output folder '{0}' does not exist")]
    MissingFolder(PathBuf),

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("unsupported delimiter: {0:?}")]
    InvalidDelimiter(char),
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Outcome of writing a whole collection.
#[derive(Debug, Default)]
pub struct SaveReport {
    /// Files written, in collection order.
    pub written: Vec<PathBuf>,
    /// Subsets that could not be written.
    pub failed: Vec<(SubsetKey, WriteError)>,
}

impl SaveReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Creates a buffered writer for the given path.
fn create_buffered_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(BufWriter::new(file))
}

/// File name used for a subset.
pub fn subset_file_name(key: &str) -> String {
    format!("{}.csv", key)
}

/// Write a table to a delimited file with a header row.
///
/// # Arguments
///
/// * `path` - Output file path (the parent folder must exist)
/// * `table` - Table to serialize
/// * `delimiter` - Field separator
///
/// # Returns
///
/// The number of data rows written.
///
/// # Example
///
/// ```no_run
/// use tobii_split::core::table::Table;
/// use tobii_split::core::writers::write_table_csv;
/// use std::path::Path;
///
/// let table = Table::new(["time", "Gaze point X"]);
/// write_table_csv(Path::new("out.csv"), &table, ',').unwrap();
/// ```
pub fn write_table_csv(path: &Path, table: &Table, delimiter: char) -> Result<usize> {
    let delimiter = delimiter_byte(delimiter).ok_or(WriteError::InvalidDelimiter(delimiter))?;
    let buf_writer = create_buffered_writer(path)?;
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(buf_writer);

    let path_str = path.display().to_string();

    // Write header
    csv_writer
        .write_record(table.column_names())
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    // Write data rows
    for row in table.rows() {
        csv_writer
            .write_record(row.iter().map(|cell| cell.unwrap_or("")))
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(table.height())
}

/// Write every subset to `{folder}/{key}.csv`.
///
/// The folder must already exist; otherwise nothing is written and
/// [`WriteError::MissingFolder`] is returned. A failure on one subset is
/// recorded in the report and the remaining subsets are still written.
pub fn write_subsets<'a, I>(subsets: I, folder: &Path, delimiter: char) -> Result<SaveReport>
where
    I: IntoIterator<Item = (&'a SubsetKey, &'a Table)>,
{
    if !folder.is_dir() {
        return Err(WriteError::MissingFolder(folder.to_path_buf()));
    }

    let mut report = SaveReport::default();
    for (key, table) in subsets {
        let file_name = subset_file_name(key);
        let path = folder.join(&file_name);
        match write_table_csv(&path, table, delimiter) {
            Ok(rows) => {
                debug!("{}: {} rows, {} columns", file_name, rows, table.width());
                info!("saved: {}", file_name);
                report.written.push(path);
            }
            Err(e) => {
                error!("failed to save {}: {}", file_name, e);
                report.failed.push((key.clone(), e));
            }
        }
    }

    Ok(report)
}
