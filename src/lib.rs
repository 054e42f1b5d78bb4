//! Split Tobii eye-tracking exports into per-recording, per-participant files.
//!
//! This crate provides tools for:
//! - Loading a tab-separated Tobii Pro Lab export
//! - Dividing it into one subset per group value and participant
//! - Dropping calibration/text rows and metadata columns
//! - Rebuilding a per-sample time of day from the recording start time
//! - Writing each subset to its own CSV file
//!
//! # Example
//!
//! ```no_run
//! use tobii_split::{PipelineConfig, TobiiDataProcess};
//!
//! let mut config = PipelineConfig::default();
//! config.partition.groupby_column = Some("Recording name".to_string());
//!
//! let mut process = TobiiDataProcess::load("export.tsv", config).unwrap();
//! process.divide().unwrap();
//! let report = process.format();
//! for (key, reason) in report.failed() {
//!     eprintln!("{key}: {reason}");
//! }
//! process.save().unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod pipeline;
pub mod processors;

pub use config::{FormatConfig, InputConfig, OutputConfig, PartitionConfig, PipelineConfig};
pub use crate::core::table::{SubsetCollection, SubsetKey, Table};
pub use pipeline::{PipelineError, TobiiDataProcess};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
