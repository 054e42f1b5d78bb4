//! Row filtering and timestamp reconstruction for divided subsets.
//!
//! Each subset is formatted independently: rows without a usable stimulus are
//! dropped, metadata columns are removed and a leading time-of-day column is
//! rebuilt from the recording start time and each sample's position. A subset
//! that cannot be formatted is left untouched and reported; the others are
//! still processed.

use std::collections::HashSet;

use chrono::NaiveTime;
use log::{debug, info, warn};
use thiserror::Error;

use crate::config::FormatConfig;
use crate::core::table::{Cell, SubsetCollection, SubsetKey, Table, TableError};
use crate::core::transforms::{format_time_of_day, parse_start_time, sample_time, ClockError};

/// Reasons a subset could not be formatted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("no rows left after stimulus filtering")]
    NoRowsRemaining,

    #[error("'{column}' is missing in row {row}")]
    MissingStartTime { column: String, row: usize },

    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Row counts of a successfully formatted subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatStats {
    pub rows_kept: usize,
    pub rows_dropped: usize,
    /// Time of day of the first kept row.
    pub first_sample: NaiveTime,
}

/// Result of formatting one subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    Formatted(FormatStats),
    Failed(FormatError),
}

/// Per-subset outcomes of one formatting pass, in collection order.
#[derive(Debug, Clone, Default)]
pub struct FormatReport {
    pub outcomes: Vec<(SubsetKey, FormatOutcome)>,
}

impl FormatReport {
    /// Keys of subsets that were formatted.
    pub fn succeeded(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(|(key, outcome)| match outcome {
            FormatOutcome::Formatted(_) => Some(key.as_str()),
            FormatOutcome::Failed(_) => None,
        })
    }

    /// Keys and reasons of subsets that were left unformatted.
    pub fn failed(&self) -> impl Iterator<Item = (&str, &FormatError)> {
        self.outcomes.iter().filter_map(|(key, outcome)| match outcome {
            FormatOutcome::Failed(e) => Some((key.as_str(), e)),
            FormatOutcome::Formatted(_) => None,
        })
    }

    pub fn is_clean(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Positions of rows whose stimulus is present and not excluded.
fn kept_rows(stimuli: &[Cell], excluded: &HashSet<&str>) -> Vec<usize> {
    stimuli
        .iter()
        .enumerate()
        .filter_map(|(row, stimulus)| match stimulus.as_deref() {
            Some(name) if !excluded.contains(name) => Some(row),
            _ => None,
        })
        .collect()
}

/// Format a single subset, returning the new table.
///
/// Steps:
/// 1. Keep rows whose stimulus is present and not in the exclusion list.
/// 2. Parse the recording start time of the first kept row.
/// 3. Offset it by that row's position in the subset at the sampling rate.
/// 4. Drop the configured metadata columns.
/// 5. Re-index the kept rows from 0 and prepend one time of day per row.
///
/// # Errors
///
/// Fails if a needed column is absent, no row survives filtering, the start
/// time is missing or malformed, or a column to drop does not exist.
pub fn format_subset(subset: &Table, config: &FormatConfig) -> Result<(Table, FormatStats), FormatError> {
    let excluded: HashSet<&str> = config
        .delete_stimulus_names
        .iter()
        .map(String::as_str)
        .collect();

    let rows = kept_rows(subset.column(&config.stimulus_column)?, &excluded);
    let first_row = *rows.first().ok_or(FormatError::NoRowsRemaining)?;

    let start_time = subset
        .cell(first_row, &config.start_time_column)?
        .ok_or_else(|| FormatError::MissingStartTime {
            column: config.start_time_column.clone(),
            row: first_row,
        })?;
    let start_time = parse_start_time(start_time)?;
    let first_sample = sample_time(start_time, first_row, config.sampling_rate_hz)?;

    let mut formatted = subset.take_rows(&rows)?;
    formatted.drop_columns(config.delete_columns.as_slice())?;

    let times = (0..formatted.height())
        .map(|i| {
            sample_time(first_sample, i, config.sampling_rate_hz)
                .map(|t| Some(format_time_of_day(t)))
        })
        .collect::<Result<Vec<Cell>, ClockError>>()?;
    formatted.insert_column(0, config.time_column.as_str(), times)?;

    let stats = FormatStats {
        rows_kept: rows.len(),
        rows_dropped: subset.height() - rows.len(),
        first_sample,
    };
    Ok((formatted, stats))
}

/// Format every subset of the collection in place.
///
/// A subset that fails keeps its divided, unformatted table. Failures are
/// logged and collected in the returned report.
pub fn format_subsets(subsets: &mut SubsetCollection, config: &FormatConfig) -> FormatReport {
    let mut report = FormatReport::default();

    for (key, table) in subsets.iter_mut() {
        let outcome = match format_subset(table, config) {
            Ok((formatted, stats)) => {
                *table = formatted;
                info!("formatted: {}", key);
                debug!(
                    "{}: kept {} rows, dropped {}, first sample at {}",
                    key,
                    stats.rows_kept,
                    stats.rows_dropped,
                    format_time_of_day(stats.first_sample)
                );
                FormatOutcome::Formatted(stats)
            }
            Err(e) => {
                warn!("{} ignore: {}", e, key);
                FormatOutcome::Failed(e)
            }
        };
        report.outcomes.push((key.clone(), outcome));
    }

    report
}
