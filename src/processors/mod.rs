//! Data processing stages.

pub mod format;
pub mod partition;

// Re-export key types for convenience
pub use format::{format_subset, format_subsets, FormatError, FormatOutcome, FormatReport, FormatStats};
pub use partition::{divide, subset_key};
