//! The conversion job around the core pipeline: directory lifecycle, input
//! listing, run reporting.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use parquet_filter_core::{ConversionOrchestrator, ConversionSettings, RunSummary};

use crate::config::JobConfig;

/// Run one conversion pass over the configured input directory.
pub fn run(config: &JobConfig) -> anyhow::Result<RunSummary> {
    info!("Step 1 of 4 --- prepare job directories");
    clear_dir(&config.scratch_dir)
        .with_context(|| format!("preparing scratch dir {}", config.scratch_dir.display()))?;
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("preparing output dir {}", config.output_dir.display()))?;

    info!("Step 2 of 4 --- list input files");
    let inputs = list_files(&config.input_dir)?;
    if inputs.is_empty() {
        warn!(dir = %config.input_dir.display(), "no input files found");
    }

    info!("Step 3 of 4 --- convert input files to Parquet");
    let settings = ConversionSettings::new(
        config.output_dir.clone(),
        config.scratch_dir.clone(),
    )
    .with_delimiter(config.delimiter)
    .with_pattern(config.pattern.clone())
    .with_max_workers(config.max_workers);
    let summary = ConversionOrchestrator::new(settings).convert_all(&inputs)?;

    info!("Step 4 of 4 --- clean up scratch directory");
    if config.keep_scratch {
        info!(dir = %config.scratch_dir.display(), "keeping scratch artifacts");
    } else {
        fs::remove_dir_all(&config.scratch_dir)
            .with_context(|| format!("removing scratch dir {}", config.scratch_dir.display()))?;
    }

    info!(
        successes = summary.successes(),
        failures = summary.failures(),
        "--- job completed ---"
    );
    Ok(summary)
}

/// Recreate `path` as an empty directory
fn clear_dir(path: &Path) -> std::io::Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path)
}

/// Regular files of `dir`, sorted for a deterministic dispatch order
fn list_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("listing input dir {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("listing input dir {}", dir.display()))?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_dir_empties_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("scratch");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("stale.schema"), "x").unwrap();

        clear_dir(&target).unwrap();
        assert!(target.exists());
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
    }

    #[test]
    fn test_list_files_skips_directories_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "x").unwrap();
        fs::write(dir.path().join("a.csv"), "x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let files = list_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.csv", "b.csv"]);
    }

    #[test]
    fn test_run_converts_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input_dir = dir.path().join("in");
        fs::create_dir_all(&input_dir).unwrap();
        fs::write(input_dir.join("people.csv"), "name,food\nAda,pie\n").unwrap();

        let config = JobConfig {
            input_dir,
            output_dir: dir.path().join("out"),
            scratch_dir: dir.path().join("scratch"),
            ..JobConfig::default()
        };
        let summary = run(&config).unwrap();
        assert!(summary.is_clean());
        assert!(dir.path().join("out/people.parquet").exists());
        // Scratch is cleaned up unless asked otherwise.
        assert!(!dir.path().join("scratch").exists());
    }
}
