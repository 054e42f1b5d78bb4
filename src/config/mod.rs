//! Configuration types for the split pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Samples per second assumed for every recording.
pub const DEFAULT_SAMPLING_RATE_HZ: u32 = 250;

/// Configuration for reading the raw export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Field delimiter of the export (Tobii writes tab-separated text)
    #[serde(default = "default_input_delimiter")]
    pub delimiter: char,
}

fn default_input_delimiter() -> char {
    '\t'
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_input_delimiter(),
        }
    }
}

/// Configuration for splitting the raw table into subsets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Column whose value identifies a group (e.g. "Recording name").
    /// There is no default; it must come from the config file or the CLI.
    #[serde(default)]
    pub groupby_column: Option<String>,

    /// Column holding the participant identifier
    #[serde(default = "default_participant_column")]
    pub participant_column: String,
}

fn default_participant_column() -> String {
    "Participant name".to_string()
}

impl PartitionConfig {
    pub fn new(groupby_column: impl Into<String>) -> Self {
        Self {
            groupby_column: Some(groupby_column.into()),
            participant_column: default_participant_column(),
        }
    }
}

/// Configuration for row filtering and timestamp reconstruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Metadata columns removed from every formatted subset
    #[serde(default = "default_delete_columns")]
    pub delete_columns: Vec<String>,

    /// Stimulus names whose rows are discarded
    #[serde(default = "default_delete_stimulus_names")]
    pub delete_stimulus_names: Vec<String>,

    #[serde(default = "default_stimulus_column")]
    pub stimulus_column: String,

    #[serde(default = "default_start_time_column")]
    pub start_time_column: String,

    /// Name of the reconstructed leading timestamp column
    #[serde(default = "default_time_column")]
    pub time_column: String,

    #[serde(default = "default_sampling_rate_hz")]
    pub sampling_rate_hz: u32,
}

fn default_delete_columns() -> Vec<String> {
    vec![
        "Recording timestamp".to_string(),
        "Computer timestamp".to_string(),
        "Sensor".to_string(),
        "Recording start time".to_string(),
    ]
}

fn default_delete_stimulus_names() -> Vec<String> {
    vec!["Eyetracker Calibration".to_string(), "Text".to_string()]
}

fn default_stimulus_column() -> String {
    "Presented Stimulus name".to_string()
}

fn default_start_time_column() -> String {
    "Recording start time".to_string()
}

fn default_time_column() -> String {
    "time".to_string()
}

fn default_sampling_rate_hz() -> u32 {
    DEFAULT_SAMPLING_RATE_HZ
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            delete_columns: default_delete_columns(),
            delete_stimulus_names: default_delete_stimulus_names(),
            stimulus_column: default_stimulus_column(),
            start_time_column: default_start_time_column(),
            time_column: default_time_column(),
            sampling_rate_hz: default_sampling_rate_hz(),
        }
    }
}

/// Configuration for writing subsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Folder receiving one CSV per subset
    #[serde(default = "default_save_folder")]
    pub save_folder: PathBuf,

    #[serde(default = "default_output_delimiter")]
    pub delimiter: char,

    /// Skip subsets whose formatting failed instead of writing them as-is
    #[serde(default)]
    pub skip_unformatted: bool,
}

fn default_save_folder() -> PathBuf {
    PathBuf::from("./divided_data")
}

fn default_output_delimiter() -> char {
    ','
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_folder: default_save_folder(),
            delimiter: default_output_delimiter(),
            skip_unformatted: false,
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub partition: PartitionConfig,

    #[serde(default)]
    pub format: FormatConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Converts a delimiter character to the single byte the csv crate expects.
pub(crate) fn delimiter_byte(delimiter: char) -> Option<u8> {
    u8::try_from(delimiter).ok().filter(u8::is_ascii)
}
