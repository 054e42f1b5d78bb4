//! Command-line interface for the split pipeline.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::core::writers::SaveReport;
use crate::{PipelineConfig, TobiiDataProcess};

#[derive(Parser)]
#[command(name = "tobii-split")]
#[command(about = "Split Tobii eye-tracking exports into per-participant CSV files", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Divide, format and save an export
    Process {
        /// Tab-separated export file
        input: PathBuf,
        /// Column to group rows by (e.g. "Recording name")
        #[arg(short, long)]
        groupby: Option<String>,
        /// Output folder for the CSV files
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Do not write subsets whose formatting failed
        #[arg(long)]
        skip_unformatted: bool,
    },

    /// Divide and save an export without formatting
    Divide {
        /// Tab-separated export file
        input: PathBuf,
        /// Column to group rows by
        #[arg(short, long)]
        groupby: Option<String>,
        /// Output folder for the CSV files
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the subsets an export divides into
    List {
        /// Tab-separated export file
        input: PathBuf,
        /// Column to group rows by
        #[arg(short, long)]
        groupby: Option<String>,
    },

    /// Write the default configuration to a YAML file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            format!("{}...", value.chars().take(36).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    // Dispatch to subcommands
    let result = match cli.command {
        Commands::Process { input, groupby, output, skip_unformatted } => {
            cmd_process(&input, groupby, output, skip_unformatted, config)
        }
        Commands::Divide { input, groupby, output } => cmd_divide(&input, groupby, output, config),
        Commands::List { input, groupby } => cmd_list(&input, groupby, config),
        Commands::InitConfig { path } => cmd_init_config(&path),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Load the YAML config at `path`, or the defaults when no path is given.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let config = PipelineConfig::from_yaml(path)
        .map_err(|e| anyhow::anyhow!("loading config from {}: {}", path.display(), e))?;
    info!("Loaded config from: {}", path.display());
    Ok(config)
}

/// Apply command-line overrides on top of the file configuration.
fn apply_overrides(
    mut config: PipelineConfig,
    groupby: Option<String>,
    output: Option<PathBuf>,
) -> Result<PipelineConfig> {
    if let Some(column) = groupby {
        config.partition.groupby_column = Some(column);
    }
    if let Some(folder) = output {
        config.output.save_folder = folder;
    }
    if config.partition.groupby_column.is_none() {
        bail!("no groupby column given; pass --groupby or set partition.groupby_column");
    }
    Ok(config)
}

fn load_and_divide(input: &Path, config: PipelineConfig) -> Result<TobiiDataProcess> {
    let spinner = create_spinner("Reading export...");
    let loaded = TobiiDataProcess::load(input, config);
    spinner.finish_and_clear();

    let mut process = loaded.with_context(|| format!("reading {}", input.display()))?;
    process.divide().context("dividing export")?;
    Ok(process)
}

fn save(process: &TobiiDataProcess) -> Result<SaveReport> {
    let folder = &process.config().output.save_folder;
    fs::create_dir_all(folder)
        .with_context(|| format!("creating output folder {}", folder.display()))?;

    let report = process
        .save()
        .with_context(|| format!("saving to {}", folder.display()))?;
    for (key, e) in &report.failed {
        error!("{}: {}", key, e);
    }
    Ok(report)
}

fn cmd_process(
    input: &Path,
    groupby: Option<String>,
    output: Option<PathBuf>,
    skip_unformatted: bool,
    config: PipelineConfig,
) -> Result<()> {
    let start = Instant::now();
    let mut config = apply_overrides(config, groupby, output)?;
    config.output.skip_unformatted |= skip_unformatted;

    let mut process = load_and_divide(input, config)?;
    let divided = process.subsets().len();

    let format_report = process.format();
    for (key, reason) in format_report.failed() {
        println!("{} ignore: {}", reason, key);
    }

    let save_report = save(&process)?;

    print_summary(
        "Process Complete",
        &[
            ("Input file", input.display().to_string()),
            ("Output folder", process.config().output.save_folder.display().to_string()),
            ("Rows read", process.raw().height().to_string()),
            ("Subsets", divided.to_string()),
            ("Formatted", format_report.succeeded().count().to_string()),
            ("Format failures", format_report.failed().count().to_string()),
            ("Files written", save_report.written.len().to_string()),
            ("Write failures", save_report.failed.len().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    if !save_report.is_clean() {
        bail!("{} subset(s) could not be written", save_report.failed.len());
    }
    Ok(())
}

fn cmd_divide(
    input: &Path,
    groupby: Option<String>,
    output: Option<PathBuf>,
    config: PipelineConfig,
) -> Result<()> {
    let start = Instant::now();
    let config = apply_overrides(config, groupby, output)?;

    let process = load_and_divide(input, config)?;
    let save_report = save(&process)?;

    print_summary(
        "Divide Complete",
        &[
            ("Input file", input.display().to_string()),
            ("Output folder", process.config().output.save_folder.display().to_string()),
            ("Subsets", process.subsets().len().to_string()),
            ("Files written", save_report.written.len().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    if !save_report.is_clean() {
        bail!("{} subset(s) could not be written", save_report.failed.len());
    }
    Ok(())
}

fn cmd_list(input: &Path, groupby: Option<String>, config: PipelineConfig) -> Result<()> {
    let config = apply_overrides(config, groupby, None)?;
    let process = load_and_divide(input, config)?;

    for (key, subset) in process.subsets() {
        println!("{:<40} {:>10} rows", key, subset.height());
    }
    println!("{} subsets", process.subsets().len());
    Ok(())
}

fn cmd_init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    PipelineConfig::default()
        .to_yaml(path)
        .map_err(|e| anyhow::anyhow!("writing {}: {}", path.display(), e))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_process_command() {
        let cli = Cli::try_parse_from([
            "tobii-split",
            "-v",
            "process",
            "export.tsv",
            "--groupby",
            "Recording name",
            "--skip-unformatted",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Process { input, groupby, output, skip_unformatted } => {
                assert_eq!(input, PathBuf::from("export.tsv"));
                assert_eq!(groupby.as_deref(), Some("Recording name"));
                assert!(output.is_none());
                assert!(skip_unformatted);
            }
            _ => panic!("expected process command"),
        }
    }

    #[test]
    fn test_load_config() {
        let config = load_config(None).unwrap();
        assert!(config.partition.groupby_column.is_none());

        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("missing.yaml"))).is_err());

        let bad = dir.path().join("bad.yaml");
        fs::write(&bad, "format: [not, a, mapping\n").unwrap();
        assert!(load_config(Some(&bad)).is_err());

        let good = dir.path().join("good.yaml");
        fs::write(&good, "partition:\n  groupby_column: Recording name\n").unwrap();
        let config = load_config(Some(&good)).unwrap();
        assert_eq!(config.partition.groupby_column.as_deref(), Some("Recording name"));
    }

    #[test]
    fn test_apply_overrides() {
        let config = apply_overrides(
            PipelineConfig::default(),
            Some("Recording name".to_string()),
            Some(PathBuf::from("out")),
        )
        .unwrap();
        assert_eq!(config.partition.groupby_column.as_deref(), Some("Recording name"));
        assert_eq!(config.output.save_folder, PathBuf::from("out"));

        assert!(apply_overrides(PipelineConfig::default(), None, None).is_err());
    }
}
