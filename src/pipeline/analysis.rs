//! Retrying analysis pipeline.

use super::executor::{TaskHandle, WorkerPool};
use super::stages::{
    analyze_changes, analyze_structure, correlate_impacts, AnalysisContext, ImpactedComponent,
    ModStructure, VersionChangeList,
};
use super::PipelineError;
use crate::config::PipelineConfig;
use crate::coordination::ReadyPair;
use crate::reports::AnalysisReporter;
use crate::utils::atomic_write_bytes;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Inputs of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTask {
    /// Mod analysis report
    pub source_report: PathBuf,
    /// Version change list
    pub target_report: PathBuf,
}

impl AnalysisTask {
    #[must_use]
    pub fn new(source_report: impl Into<PathBuf>, target_report: impl Into<PathBuf>) -> Self {
        Self {
            source_report: source_report.into(),
            target_report: target_report.into(),
        }
    }
}

impl From<ReadyPair> for AnalysisTask {
    fn from(pair: ReadyPair) -> Self {
        Self::new(pair.source.report_path, pair.target.report_path)
    }
}

/// Outcome of a successful analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub structure: ModStructure,
    pub changes: VersionChangeList,
    pub impacts: Vec<ImpactedComponent>,
    pub missing_references: BTreeSet<String>,
    /// Markdown report written by the run
    pub report_path: PathBuf,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// Structure → changes → correlation → report, retried as a whole.
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    max_attempts: u32,
    backoff: Duration,
    output_dir: PathBuf,
}

impl AnalysisPipeline {
    /// Create a pipeline; `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, backoff: Duration, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.max_attempts, config.backoff(), config.output_dir.clone())
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub const fn backoff(&self) -> Duration {
        self.backoff
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run the pipeline, retrying failed attempts after a fixed backoff.
    pub fn run(
        &self,
        source_report: &Path,
        target_report: &Path,
    ) -> Result<AnalysisResult, PipelineError> {
        let mut attempt = 1;
        loop {
            match self.run_once(source_report, target_report, attempt) {
                Ok(result) => {
                    tracing::info!(
                        mod_id = %result.structure.mod_id,
                        impacts = result.impacts.len(),
                        attempts = result.attempts,
                        report = %result.report_path.display(),
                        "analysis complete"
                    );
                    return Ok(result);
                }
                Err(e) if attempt < self.max_attempts => {
                    tracing::warn!(
                        "Analysis attempt {}/{} failed: {}",
                        attempt,
                        self.max_attempts,
                        e
                    );
                    std::thread::sleep(self.backoff);
                    attempt += 1;
                    tracing::debug!("Retry attempt {} after {:?}", attempt, self.backoff);
                }
                Err(last) => {
                    tracing::error!(attempts = attempt, "analysis failed: {last}");
                    return Err(PipelineError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(last),
                    });
                }
            }
        }
    }

    /// Run a [`AnalysisTask`].
    pub fn run_task(&self, task: &AnalysisTask) -> Result<AnalysisResult, PipelineError> {
        self.run(&task.source_report, &task.target_report)
    }

    /// Queue a run on the pool.
    pub fn submit(
        &self,
        pool: &WorkerPool,
        task: AnalysisTask,
    ) -> TaskHandle<Result<AnalysisResult, PipelineError>> {
        let pipeline = self.clone();
        pool.submit(move || pipeline.run_task(&task))
    }

    fn run_once(
        &self,
        source_report: &Path,
        target_report: &Path,
        attempt: u32,
    ) -> Result<AnalysisResult, PipelineError> {
        let structure = analyze_structure(source_report)?;
        let changes = analyze_changes(target_report)?;

        let mut context = AnalysisContext::default();
        let impacts = correlate_impacts(&structure, &changes, &mut context);

        let result = AnalysisResult {
            report_path: self.report_path(&structure, &changes),
            structure,
            changes,
            impacts,
            missing_references: context.missing_references,
            attempts: attempt,
        };
        self.write_report(&result)?;
        Ok(result)
    }

    /// `<output_dir>/<mod_id>-<old>-to-<new>.md`
    #[must_use]
    pub fn report_path(&self, structure: &ModStructure, changes: &VersionChangeList) -> PathBuf {
        self.output_dir.join(format!(
            "{}-{}-to-{}.md",
            file_component(&structure.mod_id),
            file_component(&changes.old_version),
            file_component(&changes.new_version)
        ))
    }

    fn write_report(&self, result: &AnalysisResult) -> Result<(), PipelineError> {
        let failed = |source: anyhow::Error| PipelineError::ReportFailed {
            path: result.report_path.clone(),
            source,
        };
        let markdown = AnalysisReporter::new()
            .generate(result)
            .map_err(|e| failed(e.into()))?;
        std::fs::create_dir_all(&self.output_dir).map_err(|e| failed(e.into()))?;
        atomic_write_bytes(&result.report_path, markdown.as_bytes()).map_err(|e| failed(e.into()))?;
        Ok(())
    }
}

fn file_component(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
