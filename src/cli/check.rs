//! Check command handler.
//!
//! The coordinated flow: the mod report marks the source side of a
//! completion barrier ready, the version comparison marks the target side
//! once its change list is written, and the fired event is analysed by the
//! pipeline on the shared worker pool.

use super::analyze::{exit_code_for, print_analysis_summary};
use super::compare::{build_engine, compare_on_pool};
use super::ensure_valid;
use crate::config::CheckConfig;
use crate::coordination::{BarrierPolicy, CompletionBarrier, ReadySignal};
use crate::pipeline::{AnalysisDispatcher, AnalysisPipeline, WorkerPool};
use crate::reports::{JsonReporter, ReportGenerator};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Run the check command, returning the desired exit code.
#[allow(clippy::needless_pass_by_value)]
pub fn run_check(config: CheckConfig) -> Result<i32> {
    let app = &config.app;
    ensure_valid(app)?;
    if !config.mod_report.is_file() {
        anyhow::bail!("mod report not found: {}", config.mod_report.display());
    }

    let pool = Arc::new(WorkerPool::new(app.compare.worker_threads)?);
    let pipeline = Arc::new(AnalysisPipeline::from_config(&app.pipeline));
    let (barrier, events) = CompletionBarrier::new(BarrierPolicy::LatestWins);
    let (dispatcher, outcomes) =
        AnalysisDispatcher::spawn(events, Arc::clone(&pipeline), Arc::clone(&pool));

    barrier.mark_source_ready(ReadySignal::new(&config.mod_version, &config.mod_report));

    let target = prepare_target(&config, &pool);
    let fired = match target {
        Ok(signal) => barrier.mark_target_ready(signal),
        Err(e) => {
            drop(barrier);
            let _ = dispatcher.join();
            return Err(e);
        }
    };
    tracing::debug!(fired, status = %barrier.status(), "target side marked");

    // Closing the event channel lets the dispatcher finish after this run.
    drop(barrier);
    let outcome = outcomes
        .recv()
        .context("analysis dispatcher stopped without an outcome")?;
    dispatcher.join()?;

    let result = outcome.result?;
    if !app.behavior.quiet {
        print_analysis_summary(&result);
    }
    Ok(exit_code_for(&result, app.behavior.fail_on_change))
}

/// Compare the two trees and write the change list the pipeline reads.
fn prepare_target(config: &CheckConfig, pool: &WorkerPool) -> Result<ReadySignal> {
    let app = &config.app;
    let engine = Arc::new(build_engine(app));
    let comparison = compare_on_pool(pool, &engine, &config.versions, false)?;

    let output_dir = &app.pipeline.output_dir;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let change_list = output_dir.join(format!(
        "changes-{}-to-{}.json",
        comparison.old_version, comparison.new_version
    ));
    let json = JsonReporter::new()
        .generate_comparison_report(&comparison)
        .context("failed to render change list")?;
    crate::utils::atomic_write_bytes(&change_list, json.as_bytes())
        .with_context(|| format!("failed to write {}", change_list.display()))?;
    tracing::info!(
        changes = comparison.result.change_count(),
        path = %change_list.display(),
        "change list written"
    );

    Ok(ReadySignal::new(&comparison.new_version, change_list))
}
