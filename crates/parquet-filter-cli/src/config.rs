use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Job configuration, loadable from a TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Directory of already-extracted input files
    pub input_dir: PathBuf,
    /// Directory receiving the columnar output files
    pub output_dir: PathBuf,
    /// Directory for intermediate schema descriptions and filtered CSVs
    pub scratch_dir: PathBuf,
    /// Field delimiter
    pub delimiter: char,
    /// Case-insensitive row filter pattern
    pub pattern: String,
    /// Worker pool cap; 0 means the host's available parallelism
    pub max_workers: usize,
    /// Leave intermediate artifacts in place after the run
    pub keep_scratch: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        JobConfig {
            input_dir: PathBuf::from("./input"),
            output_dir: PathBuf::from("./output"),
            scratch_dir: PathBuf::from("./scratch"),
            delimiter: ',',
            pattern: ".*".to_string(),
            max_workers: 0,
            keep_scratch: false,
        }
    }
}

impl JobConfig {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {e}", path.display()))?;
        toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("cannot parse config {}: {e}", path.display()))
    }

    /// Load the file when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }
}
