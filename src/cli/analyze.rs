//! Analyze command handler.
//!
//! Runs the retrying analysis pipeline on an existing mod report and change
//! list.

use super::ensure_valid;
use crate::config::AnalyzeConfig;
use crate::pipeline::{exit_codes, AnalysisPipeline, AnalysisResult, AnalysisTask, WorkerPool};
use anyhow::Result;

/// Run the analyze command, returning the desired exit code.
#[allow(clippy::needless_pass_by_value)]
pub fn run_analyze(config: AnalyzeConfig) -> Result<i32> {
    ensure_valid(&config.app)?;

    let pool = WorkerPool::new(config.app.compare.worker_threads)?;
    let pipeline = AnalysisPipeline::from_config(&config.app.pipeline);
    let task = AnalysisTask::new(&config.mod_report, &config.change_report);

    let result = pipeline.submit(&pool, task).wait()??;
    if !config.app.behavior.quiet {
        print_analysis_summary(&result);
    }

    Ok(exit_code_for(&result, config.app.behavior.fail_on_change))
}

/// Print a short outcome line for an analysis run.
pub(crate) fn print_analysis_summary(result: &AnalysisResult) {
    println!(
        "{} {} against {} → {}: {} impacted component(s), {} missing reference(s)",
        result.structure.mod_id,
        result.structure.mod_version,
        result.changes.old_version,
        result.changes.new_version,
        result.impacts.len(),
        result.missing_references.len()
    );
    println!("Report: {}", result.report_path.display());
}

pub(crate) fn exit_code_for(result: &AnalysisResult, fail_on_change: bool) -> i32 {
    if fail_on_change && !result.impacts.is_empty() {
        exit_codes::CHANGES_DETECTED
    } else {
        exit_codes::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::pipeline::test_support::write_inputs;

    #[test]
    fn test_analyze_reports_impacts() {
        let dir = tempfile::tempdir().unwrap();
        let (mod_report, change_report) = write_inputs(dir.path());
        let out = dir.path().join("out");

        let config = AnalyzeConfig {
            mod_report,
            change_report,
            app: AppConfig::builder()
                .worker_threads(1)
                .max_attempts(1)
                .backoff_ms(0)
                .pipeline_output_dir(out.clone())
                .quiet(true)
                .fail_on_change(true)
                .build(),
        };

        assert_eq!(run_analyze(config).unwrap(), exit_codes::CHANGES_DETECTED);
        assert!(out.join("examplemod-1.20-to-1.21.md").exists());
    }

    #[test]
    fn test_analyze_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalyzeConfig {
            mod_report: dir.path().join("missing.json"),
            change_report: dir.path().join("missing2.json"),
            app: AppConfig::builder()
                .worker_threads(1)
                .max_attempts(2)
                .backoff_ms(1)
                .pipeline_output_dir(dir.path().to_path_buf())
                .build(),
        };
        let err = run_analyze(config).unwrap_err();
        assert!(err.to_string().contains("2 attempt(s)"));
    }
}
