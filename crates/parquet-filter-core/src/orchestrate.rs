//! Fan-out/fan-in coordination for multi-file conversion runs.
//!
//! One task is dispatched per input file onto a bounded worker pool; every
//! task reports a [`ConversionResult`], and collecting those results is the
//! completion barrier. A single file's failure never cancels its siblings.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use rayon::prelude::*;
use tracing::{error, info};

use crate::convert::{ConversionOutcome, ConversionResult, ConversionTask, FileConverter};
use crate::{ConvertError, Result, Schema};

/// Cooperative cancellation handle shared by a run and its workers.
///
/// Cancelling makes in-flight converters fail fast at their next row or
/// stage boundary; every dispatched task still reports a result, so the
/// fan-in barrier cannot deadlock.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Run-wide conversion settings
#[derive(Debug, Clone)]
pub struct ConversionSettings {
    /// Field delimiter for splitting rows and the header line
    pub delimiter: char,
    /// Case-insensitive row filter pattern
    pub pattern: String,
    /// Directory receiving the columnar output files
    pub output_dir: PathBuf,
    /// Directory receiving schema descriptions and filtered CSVs
    pub scratch_dir: PathBuf,
    /// Worker pool cap; 0 means the host's available parallelism
    pub max_workers: usize,
    /// Declared schema applied to every file instead of per-file inference
    pub schema: Option<Schema>,
}

impl ConversionSettings {
    pub fn new(output_dir: PathBuf, scratch_dir: PathBuf) -> Self {
        ConversionSettings {
            delimiter: ',',
            pattern: ".*".to_string(),
            output_dir,
            scratch_dir,
            max_workers: 0,
            schema: None,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_pattern<S: Into<String>>(mut self, pattern: S) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Pool size for a run over `files` inputs: the configured cap (or the
    /// host parallelism when unset), clamped to the file count. Independent
    /// of input cardinality beyond that clamp.
    pub fn worker_count(&self, files: usize) -> usize {
        let cap = if self.max_workers == 0 {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            self.max_workers
        };
        cap.min(files).max(1)
    }
}

/// Aggregate outcome of one conversion run
#[derive(Debug)]
pub struct RunSummary {
    results: Vec<ConversionResult>,
}

impl RunSummary {
    pub fn results(&self) -> &[ConversionResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<ConversionResult> {
        self.results
    }

    pub fn successes(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failures(&self) -> usize {
        self.results.len() - self.successes()
    }

    pub fn is_clean(&self) -> bool {
        self.failures() == 0
    }
}

/// Converts a whole input set, one bounded-pool task per file.
pub struct ConversionOrchestrator {
    settings: ConversionSettings,
}

impl ConversionOrchestrator {
    pub fn new(settings: ConversionSettings) -> Self {
        ConversionOrchestrator { settings }
    }

    pub fn settings(&self) -> &ConversionSettings {
        &self.settings
    }

    /// Convert every input and block until all have finished.
    pub fn convert_all(&self, inputs: &[PathBuf]) -> Result<RunSummary> {
        self.convert_all_with_cancel(inputs, &CancelToken::new())
    }

    /// Convert every input, checking `cancel` between rows and stages.
    ///
    /// The returned summary always holds exactly one result per input; only
    /// the run's own coordination failing (pool construction, colliding
    /// output paths) produces an `Err`.
    pub fn convert_all_with_cancel(
        &self,
        inputs: &[PathBuf],
        cancel: &CancelToken,
    ) -> Result<RunSummary> {
        let tasks: Vec<ConversionTask> = inputs
            .iter()
            .map(|input| {
                ConversionTask::new(
                    input.clone(),
                    &self.settings.output_dir,
                    &self.settings.scratch_dir,
                )
            })
            .collect();
        ensure_disjoint_outputs(&tasks)?;
        if tasks.is_empty() {
            return Ok(RunSummary { results: Vec::new() });
        }

        let workers = self.settings.worker_count(tasks.len());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| ConvertError::run(format!("failed to build worker pool: {e}")))?;

        info!(files = tasks.len(), workers, "dispatching conversion tasks");
        let converter = FileConverter::new(&self.settings, cancel.clone());
        let results: Vec<ConversionResult> = pool.install(|| {
            tasks.par_iter().map(|task| converter.run(task)).collect()
        });

        for result in &results {
            if let ConversionOutcome::Failure { stage, reason } = &result.outcome {
                error!(
                    file = %result.input_path.display(),
                    %stage,
                    %reason,
                    "file conversion failed"
                );
            }
        }
        let summary = RunSummary { results };
        info!(
            successes = summary.successes(),
            failures = summary.failures(),
            "conversion run finished"
        );
        Ok(summary)
    }
}

/// Workers own their paths exclusively; two inputs whose stripped base names
/// collide would race on one output file, so the run refuses them up front.
fn ensure_disjoint_outputs(tasks: &[ConversionTask]) -> Result<()> {
    let mut by_output: HashMap<&PathBuf, &PathBuf> = HashMap::with_capacity(tasks.len());
    for task in tasks {
        if let Some(previous) = by_output.insert(&task.output_path, &task.input_path) {
            return Err(ConvertError::run(format!(
                "inputs {} and {} both map to output {}",
                previous.display(),
                task.input_path.display(),
                task.output_path.display()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ConversionSettings {
        ConversionSettings::new(PathBuf::from("/out"), PathBuf::from("/scratch"))
    }

    #[test]
    fn test_worker_count_is_bounded_by_cap_not_file_count() {
        let settings = settings().with_max_workers(4);
        assert_eq!(settings.worker_count(100), 4);
        assert_eq!(settings.worker_count(4), 4);
        assert_eq!(settings.worker_count(2), 2);
        assert_eq!(settings.worker_count(1), 1);
    }

    #[test]
    fn test_worker_count_defaults_to_host_parallelism() {
        let host = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        assert_eq!(settings().worker_count(usize::MAX), host);
    }

    #[test]
    fn test_colliding_outputs_are_rejected() {
        let tasks = vec![
            ConversionTask::new(PathBuf::from("/in/a.csv"), "/out".as_ref(), "/tmp".as_ref()),
            ConversionTask::new(PathBuf::from("/in/a.txt"), "/out".as_ref(), "/tmp".as_ref()),
        ];
        let err = ensure_disjoint_outputs(&tasks).unwrap_err();
        assert!(matches!(err, ConvertError::Run(_)));
    }

    #[test]
    fn test_empty_run_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = ConversionOrchestrator::new(ConversionSettings::new(
            dir.path().to_path_buf(),
            dir.path().to_path_buf(),
        ));
        let summary = orchestrator.convert_all(&[]).unwrap();
        assert!(summary.is_clean());
        assert!(summary.results().is_empty());
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
