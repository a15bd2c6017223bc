mod config;
mod job;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::JobConfig;

/// Convert a directory of CSV files into filtered Parquet files
#[derive(Debug, Parser)]
#[command(name = "parquet-filter", version)]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of input files (overrides the config file)
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Directory for Parquet output (overrides the config file)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Directory for intermediate artifacts (overrides the config file)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Case-insensitive row filter pattern (overrides the config file)
    #[arg(long)]
    pattern: Option<String>,

    /// Field delimiter (overrides the config file)
    #[arg(long)]
    delimiter: Option<char>,

    /// Worker pool cap, 0 for the host parallelism (overrides the config file)
    #[arg(long)]
    max_workers: Option<usize>,

    /// Keep intermediate artifacts after the run
    #[arg(long)]
    keep_scratch: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = JobConfig::load_or_default(args.config.as_deref())?;
    if let Some(input_dir) = args.input_dir {
        config.input_dir = input_dir;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(scratch_dir) = args.scratch_dir {
        config.scratch_dir = scratch_dir;
    }
    if let Some(pattern) = args.pattern {
        config.pattern = pattern;
    }
    if let Some(delimiter) = args.delimiter {
        config.delimiter = delimiter;
    }
    if let Some(max_workers) = args.max_workers {
        config.max_workers = max_workers;
    }
    if args.keep_scratch {
        config.keep_scratch = true;
    }

    let summary = job::run(&config)?;
    if !summary.is_clean() {
        anyhow::bail!(
            "{} of {} files failed to convert",
            summary.failures(),
            summary.results().len()
        );
    }
    Ok(())
}
