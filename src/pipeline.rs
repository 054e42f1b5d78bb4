//! Pipeline orchestration
//!
//! [`TobiiDataProcess`] owns a loaded export and the subsets derived from it,
//! and runs the stages in order:
//!
//! 1. `load` - read the raw export
//! 2. `divide` - split it into `{group}_{participant}` subsets
//! 3. `format` - filter rows and rebuild timestamps, per subset
//! 4. `save` - write one CSV per subset

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::core::loaders::{load_table, LoaderError};
use crate::core::table::{SubsetCollection, SubsetKey, Table, TableError};
use crate::core::writers::{write_subsets, SaveReport, WriteError};
use crate::processors::format::{format_subsets, FormatReport};
use crate::processors::partition::divide;

/// Errors that stop the whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no groupby column configured")]
    MissingGroupbyColumn,

    #[error("failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: LoaderError,
    },

    #[error("failed to divide data: {0}")]
    Divide(#[from] TableError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// A loaded export and its subsets.
#[derive(Debug)]
pub struct TobiiDataProcess {
    config: PipelineConfig,
    raw: Table,
    subsets: SubsetCollection,
    unformatted: HashSet<SubsetKey>,
}

impl TobiiDataProcess {
    /// Read the export at `target_data_path`.
    ///
    /// The grouping column must be set in `config.partition.groupby_column`.
    pub fn load<P: AsRef<Path>>(target_data_path: P, config: PipelineConfig) -> Result<Self> {
        if config.partition.groupby_column.is_none() {
            return Err(PipelineError::MissingGroupbyColumn);
        }

        let path = target_data_path.as_ref();
        info!("reading data: {}", path.display());
        let raw = load_table(path, config.input.delimiter).map_err(|source| PipelineError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        info!("read {} rows, {} columns", raw.height(), raw.width());

        Ok(Self::from_table(raw, config))
    }

    /// Wrap an already loaded table.
    pub fn from_table(raw: Table, config: PipelineConfig) -> Self {
        Self {
            config,
            raw,
            subsets: SubsetCollection::new(),
            unformatted: HashSet::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn raw(&self) -> &Table {
        &self.raw
    }

    pub fn subsets(&self) -> &SubsetCollection {
        &self.subsets
    }

    /// Split the raw table into subsets, replacing any previous ones.
    pub fn divide(&mut self) -> Result<&SubsetCollection> {
        let groupby_column = self
            .config
            .partition
            .groupby_column
            .as_deref()
            .ok_or(PipelineError::MissingGroupbyColumn)?;

        self.subsets = divide(
            &self.raw,
            groupby_column,
            &self.config.partition.participant_column,
        )?;
        self.unformatted = self.subsets.keys().cloned().collect();
        Ok(&self.subsets)
    }

    /// Format every subset; failed subsets stay as divided.
    pub fn format(&mut self) -> FormatReport {
        let report = format_subsets(&mut self.subsets, &self.config.format);
        for key in report.succeeded() {
            self.unformatted.remove(key);
        }
        report
    }

    /// Write the subsets to the configured save folder.
    pub fn save(&self) -> Result<SaveReport> {
        self.save_to(&self.config.output.save_folder)
    }

    /// Write the subsets to `folder`, which must exist.
    ///
    /// With `output.skip_unformatted` set, subsets that were divided but not
    /// formatted are left out.
    pub fn save_to(&self, folder: &Path) -> Result<SaveReport> {
        let skip_unformatted = self.config.output.skip_unformatted;
        let selected = self
            .subsets
            .iter()
            .filter(|(key, _)| !(skip_unformatted && self.unformatted.contains(*key)));

        let report = write_subsets(selected, folder, self.config.output.delimiter)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PartitionConfig;
    use crate::core::table::Cell;
    use tempfile::tempdir;

    fn row(values: &[&str]) -> Vec<Cell> {
        values
            .iter()
            .map(|v| (!v.is_empty()).then(|| v.to_string()))
            .collect()
    }

    fn raw_table() -> Table {
        let mut table = Table::new([
            "Recording name",
            "Participant name",
            "Recording timestamp",
            "Computer timestamp",
            "Sensor",
            "Recording start time",
            "Presented Stimulus name",
        ]);
        for values in [
            ["G1", "P1", "0", "0", "Eye Tracker", "10:00:00.000", "ImageA"],
            ["G2", "P2", "0", "0", "Eye Tracker", "bad", "ImageB"],
            ["G1", "P1", "4", "4", "Eye Tracker", "10:00:00.000", "ImageA"],
        ] {
            table.push_row(row(&values)).unwrap();
        }
        table
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            partition: PartitionConfig::new("Recording name"),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_divide_then_format() {
        let mut process = TobiiDataProcess::from_table(raw_table(), config());

        let keys: Vec<_> = process.divide().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["G1_P1", "G2_P2"]);

        let report = process.format();
        assert_eq!(report.succeeded().collect::<Vec<_>>(), vec!["G1_P1"]);
        assert_eq!(report.failed().count(), 1);

        assert!(process.subsets()["G1_P1"].has_column("time"));
        assert!(process.subsets()["G2_P2"].has_column("Sensor"));
    }

    #[test]
    fn test_divide_requires_groupby_column() {
        let mut process = TobiiDataProcess::from_table(raw_table(), PipelineConfig::default());
        assert!(matches!(
            process.divide(),
            Err(PipelineError::MissingGroupbyColumn)
        ));

        let mut config = config();
        config.partition.groupby_column = Some("Session".to_string());
        let mut process = TobiiDataProcess::from_table(raw_table(), config);
        assert!(matches!(
            process.divide(),
            Err(PipelineError::Divide(TableError::MissingColumn(_)))
        ));
    }

    #[test]
    fn test_save_writes_unformatted_by_default() {
        let dir = tempdir().unwrap();
        let mut process = TobiiDataProcess::from_table(raw_table(), config());
        process.divide().unwrap();
        process.format();

        let report = process.save_to(dir.path()).unwrap();

        assert_eq!(report.written.len(), 2);
        assert!(dir.path().join("G2_P2.csv").exists());
    }

    #[test]
    fn test_save_can_skip_unformatted() {
        let dir = tempdir().unwrap();
        let mut config = config();
        config.output.skip_unformatted = true;
        let mut process = TobiiDataProcess::from_table(raw_table(), config);
        process.divide().unwrap();
        process.format();

        let report = process.save_to(dir.path()).unwrap();

        assert_eq!(report.written, vec![dir.path().join("G1_P1.csv")]);
        assert!(!dir.path().join("G2_P2.csv").exists());
    }

    #[test]
    fn test_load_requires_groupby_column() {
        let result = TobiiDataProcess::load("does-not-matter.tsv", PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::MissingGroupbyColumn)));
    }

    #[test]
    fn test_load_missing_file() {
        let result = TobiiDataProcess::load("/nonexistent/export.tsv", config());
        assert!(matches!(result, Err(PipelineError::Load { .. })));
    }
}
