//! Loader for delimited eye-tracking exports.
//!
//! Tobii Pro Lab writes one sample per row with a header line naming every
//! column. Fields are read verbatim as text; an empty field or one of the
//! usual not-available markers (`NA`, `NaN`, `null`, ...) becomes a missing
//! cell.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use thiserror::Error;

use super::table::{Cell, Table, TableError};
use crate::config::delimiter_byte;

/// Field values read as missing, compared exactly.
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Unsupported delimiter: {0:?}")]
    InvalidDelimiter(char),

    #[error("Line {line}: expected at most {expected} fields, found {found}")]
    TooManyFields {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Load a delimited text file into a [`Table`].
///
/// # Arguments
///
/// * `path` - Path to the export file
/// * `delimiter` - Field separator (`'\t'` for Tobii exports)
///
/// # Errors
///
/// Returns an error if the file cannot be read, has no header line, or a
/// record has more fields than the header. Records with fewer fields are
/// padded with missing cells.
pub fn load_table<P: AsRef<Path>>(path: P, delimiter: char) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let table = read_table(BufReader::new(file), delimiter)?;

    if table.width() == 0 {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(table)
}

/// Parse delimited text from any reader into a [`Table`].
pub fn read_table<R: Read>(reader: R, delimiter: char) -> Result<Table> {
    let delimiter = delimiter_byte(delimiter).ok_or(LoaderError::InvalidDelimiter(delimiter))?;

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let width = headers.len();
    let mut table = Table::new(headers.iter());

    for result in reader.records() {
        let record = result?;
        if record.len() > width {
            return Err(LoaderError::TooManyFields {
                line: record.position().map_or(0, |p| p.line()),
                expected: width,
                found: record.len(),
            });
        }

        let mut row: Vec<Cell> = record
            .iter()
            .map(|field| (!NA_VALUES.contains(&field)).then(|| field.to_string()))
            .collect();
        row.resize(width, None);

        // Duplicate header names collapse into one column; keep the first field.
        if table.width() < width {
            row = dedup_row(&headers, row);
        }

        table.push_row(row)?;
    }

    Ok(table)
}

fn dedup_row(headers: &csv::StringRecord, row: Vec<Cell>) -> Vec<Cell> {
    let mut seen = std::collections::HashSet::new();
    headers
        .iter()
        .zip(row)
        .filter(|(name, _)| seen.insert(*name))
        .map(|(_, cell)| cell)
        .collect()
}
