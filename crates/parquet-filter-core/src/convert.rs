//! Single-file end-to-end conversion: infer schema, filter rows, encode.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::orchestrate::{CancelToken, ConversionSettings};
use crate::{ConvertError, RecordEncoder, Result, RowFilter, Schema};

/// Strip every extension from a file name: the name is cut at the first `.`
/// that is not its leading character, so `data.csv.gz` becomes `data` and
/// `.hidden` stays `.hidden`.
pub fn strip_extensions(file_name: &str) -> &str {
    let mut chars = file_name.char_indices();
    chars.next();
    for (idx, c) in chars {
        if c == '.' {
            return &file_name[..idx];
        }
    }
    file_name
}

/// Paths owned by one conversion: the input file, the final columnar output,
/// and the two scratch artifacts (schema description, filtered CSV).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub schema_path: PathBuf,
    pub filtered_path: PathBuf,
}

impl ConversionTask {
    pub fn new(input_path: PathBuf, output_dir: &Path, scratch_dir: &Path) -> Self {
        let file_name = input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = strip_extensions(&file_name);
        ConversionTask {
            output_path: output_dir.join(format!("{base}.parquet")),
            schema_path: scratch_dir.join(format!("{base}.schema")),
            filtered_path: scratch_dir.join(&file_name),
            input_path,
        }
    }
}

/// Pipeline stage a conversion failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStage {
    SchemaInference,
    Filter,
    Encode,
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConversionStage::SchemaInference => "schema inference",
            ConversionStage::Filter => "filter",
            ConversionStage::Encode => "encode",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// Conversion finished; the output file holds this many records
    Success { records: u64 },
    Failure {
        stage: ConversionStage,
        reason: String,
    },
}

/// Per-file outcome collected by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub outcome: ConversionOutcome,
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ConversionOutcome::Success { .. })
    }
}

/// Converts one file end to end. The unit of concurrency: each worker owns
/// one converter run over one task's disjoint path set.
pub struct FileConverter<'a> {
    settings: &'a ConversionSettings,
    cancel: CancelToken,
}

impl<'a> FileConverter<'a> {
    pub fn new(settings: &'a ConversionSettings, cancel: CancelToken) -> Self {
        FileConverter { settings, cancel }
    }

    /// Run all stages for one task. Failures are captured per stage and
    /// never propagate past this file.
    pub fn run(&self, task: &ConversionTask) -> ConversionResult {
        debug!(input = %task.input_path.display(), "starting conversion");
        let outcome = match self.run_stages(task) {
            Ok(records) => ConversionOutcome::Success { records },
            Err((stage, err)) => ConversionOutcome::Failure {
                stage,
                reason: err.to_string(),
            },
        };
        ConversionResult {
            input_path: task.input_path.clone(),
            output_path: task.output_path.clone(),
            outcome,
        }
    }

    fn run_stages(&self, task: &ConversionTask) -> std::result::Result<u64, (ConversionStage, ConvertError)> {
        self.infer_schema(task)
            .map_err(|e| (ConversionStage::SchemaInference, e))?;
        self.filter_rows(task)
            .map_err(|e| (ConversionStage::Filter, e))?;
        self.encode(task).map_err(|e| (ConversionStage::Encode, e))
    }

    /// Stage 1: derive the schema and persist its message text so the encode
    /// stage (and anyone debugging a run) can re-read it.
    fn infer_schema(&self, task: &ConversionTask) -> Result<()> {
        self.ensure_live()?;
        let schema = match &self.settings.schema {
            Some(declared) => declared.clone(),
            None => Schema::infer_from_file(&task.input_path, self.settings.delimiter)?,
        };
        fs::write(&task.schema_path, schema.to_message_text()).map_err(|e| {
            ConvertError::schema_inference(format!(
                "cannot persist schema to {}: {e}",
                task.schema_path.display()
            ))
        })
    }

    /// Stage 2: stream pattern-matching lines into the filtered CSV.
    fn filter_rows(&self, task: &ConversionTask) -> Result<u64> {
        let filter = RowFilter::new(&self.settings.pattern)?;
        let reader = BufReader::new(File::open(&task.input_path).map_err(|e| {
            ConvertError::filter(format!("cannot open {}: {e}", task.input_path.display()))
        })?);
        let mut writer = BufWriter::new(File::create(&task.filtered_path).map_err(|e| {
            ConvertError::filter(format!(
                "cannot create {}: {e}",
                task.filtered_path.display()
            ))
        })?);
        let mut matched = 0u64;
        for line in filter.matching_lines(reader) {
            self.ensure_live()?;
            let line = line.map_err(|e| {
                ConvertError::filter(format!("read of {} failed: {e}", task.input_path.display()))
            })?;
            writeln!(writer, "{line}").map_err(|e| {
                ConvertError::filter(format!(
                    "write to {} failed: {e}",
                    task.filtered_path.display()
                ))
            })?;
            matched += 1;
        }
        writer.flush().map_err(|e| {
            ConvertError::filter(format!(
                "write to {} failed: {e}",
                task.filtered_path.display()
            ))
        })?;
        Ok(matched)
    }

    /// Stage 3: re-parse the persisted schema, then split and encode every
    /// line of the filtered CSV into the columnar output.
    fn encode(&self, task: &ConversionTask) -> Result<u64> {
        let text = fs::read_to_string(&task.schema_path).map_err(|e| {
            ConvertError::encoding(format!(
                "cannot read schema description {}: {e}",
                task.schema_path.display()
            ))
        })?;
        let schema = Schema::from_message_text(&text)?;

        let sink = File::create(&task.output_path)?;
        let mut encoder = RecordEncoder::new(sink, schema)?;
        let reader = BufReader::new(File::open(&task.filtered_path)?);
        for line in reader.lines() {
            self.ensure_live()?;
            let line = line?;
            let fields: Vec<&str> = line.split(self.settings.delimiter).collect();
            encoder.write_record(&fields)?;
        }
        encoder.close()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(ConvertError::Cancelled)
        } else {
            Ok(())
        }
    }
}
