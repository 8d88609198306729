//! Compare command handler.
//!
//! Implements the `compare` subcommand for diffing two version trees.

use super::ensure_valid;
use crate::config::{AppConfig, CompareRunConfig, OutputConfig, VersionPair};
use crate::diff::{ComparisonEngine, ComparisonStateStore, VersionComparison};
use crate::pipeline::{exit_codes, WorkerPool};
use crate::reports::{create_reporter, ReportFormat};
use crate::utils::atomic_write_bytes;
use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::sync::Arc;

/// Run the compare command, returning the desired exit code.
///
/// The caller is responsible for calling `std::process::exit()` with the
/// returned code when it is non-zero.
#[allow(clippy::needless_pass_by_value)]
pub fn run_compare(config: CompareRunConfig) -> Result<i32> {
    let app = &config.app;
    ensure_valid(app)?;

    let pool = WorkerPool::new(app.compare.worker_threads)?;
    let engine = Arc::new(build_engine(app));
    let comparison = compare_on_pool(&pool, &engine, &config.versions, config.force_full)?;

    output_comparison(&comparison, &app.output, app.behavior.quiet)?;

    Ok(determine_exit_code(app, &comparison))
}

/// Build a comparison engine from the application config.
#[must_use]
pub fn build_engine(app: &AppConfig) -> ComparisonEngine {
    let engine = ComparisonEngine::new(&app.compare);
    if app.state.enabled {
        let store = Arc::new(ComparisonStateStore::new(app.state.resolved_dir()));
        engine.with_state_store(store, app.state.ttl())
    } else {
        tracing::debug!("comparison state disabled");
        engine
    }
}

/// Run a version comparison as a pool task and wait for it.
pub fn compare_on_pool(
    pool: &WorkerPool,
    engine: &Arc<ComparisonEngine>,
    versions: &VersionPair,
    force_full: bool,
) -> Result<VersionComparison> {
    let engine = Arc::clone(engine);
    let pair = versions.clone();
    let handle = pool.submit(move || {
        engine.compare_versions(
            &pair.old_version,
            &pair.new_version,
            &pair.old_dir,
            &pair.new_dir,
            force_full,
        )
    });
    let comparison = handle.wait()?.with_context(|| {
        format!(
            "comparing {} ({}) with {} ({})",
            versions.old_version,
            versions.old_dir.display(),
            versions.new_version,
            versions.new_dir.display()
        )
    })?;
    Ok(comparison)
}

/// Render a comparison in the configured format and write it out.
///
/// Reports go to stdout unless an output file is configured. File reports
/// are written atomically, so a reader never sees a partial report.
pub fn output_comparison(
    comparison: &VersionComparison,
    output: &OutputConfig,
    quiet: bool,
) -> Result<()> {
    let to_terminal = output.file.is_none() && std::io::stdout().is_terminal();
    let format = resolve_format(output.format, to_terminal);
    let use_color = to_terminal && !output.no_color && std::env::var_os("NO_COLOR").is_none();

    let report = create_reporter(format, use_color)
        .generate_comparison_report(comparison)
        .context("failed to generate report")?;

    match &output.file {
        None => println!("{report}"),
        Some(path) => {
            atomic_write_bytes(path, report.as_bytes())
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            if !quiet {
                tracing::info!(path = %path.display(), %format, "report written");
            }
        }
    }
    Ok(())
}

/// Pick the concrete format for `auto`: a summary on a terminal, the full
/// text report anywhere else.
fn resolve_format(requested: ReportFormat, to_terminal: bool) -> ReportFormat {
    match requested {
        ReportFormat::Auto if to_terminal => ReportFormat::Summary,
        ReportFormat::Auto => ReportFormat::Text,
        other => other,
    }
}

/// Determine the appropriate exit code based on the result and config flags.
fn determine_exit_code(app: &AppConfig, comparison: &VersionComparison) -> i32 {
    if app.behavior.fail_on_change && !comparison.result.is_empty() {
        return exit_codes::CHANGES_DETECTED;
    }
    exit_codes::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn run_config(old: &Path, new: &Path, state: &Path, out: &Path) -> CompareRunConfig {
        CompareRunConfig {
            versions: VersionPair {
                old_version: "1.20".to_string(),
                new_version: "1.21".to_string(),
                old_dir: old.to_path_buf(),
                new_dir: new.to_path_buf(),
            },
            force_full: false,
            app: AppConfig::builder()
                .worker_threads(2)
                .state_dir(Some(state.to_path_buf()))
                .output_format(ReportFormat::Json)
                .output_file(Some(out.to_path_buf()))
                .quiet(true)
                .fail_on_change(true)
                .build(),
        }
    }

    #[test]
    fn test_compare_writes_report_and_state() {
        let old = tempfile::tempdir().unwrap();
        let new = tempfile::tempdir().unwrap();
        let state = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(old.path(), "a/b.txt", "one\n");
        write(new.path(), "a/b.txt", "two\n");

        let report = out.path().join("changes.json");
        let code = run_compare(run_config(old.path(), new.path(), state.path(), &report)).unwrap();
        assert_eq!(code, exit_codes::CHANGES_DETECTED);

        let json = std::fs::read_to_string(&report).unwrap();
        assert!(json.contains("\"a/b.txt\""));
        let store = ComparisonStateStore::new(state.path());
        assert!(store.load("1.20", "1.21").is_some());
    }

    #[test]
    fn test_identical_trees_exit_success() {
        let old = tempfile::tempdir().unwrap();
        let new = tempfile::tempdir().unwrap();
        let state = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(old.path(), "same.txt", "x\n");
        write(new.path(), "same.txt", "x\n");

        let report = out.path().join("changes.json");
        let code = run_compare(run_config(old.path(), new.path(), state.path(), &report)).unwrap();
        assert_eq!(code, exit_codes::SUCCESS);
    }

    #[test]
    fn test_auto_format_depends_on_terminal() {
        assert_eq!(resolve_format(ReportFormat::Auto, true), ReportFormat::Summary);
        assert_eq!(resolve_format(ReportFormat::Auto, false), ReportFormat::Text);
        assert_eq!(resolve_format(ReportFormat::Json, true), ReportFormat::Json);
    }

    #[test]
    fn test_auto_format_to_file_writes_text_report() {
        let old = tempfile::tempdir().unwrap();
        let new = tempfile::tempdir().unwrap();
        let state = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(old.path(), "a.txt", "one\n");
        write(new.path(), "a.txt", "two\n");

        let report = out.path().join("nested").join("changes.txt");
        let mut config = run_config(old.path(), new.path(), state.path(), &report);
        config.app.output.format = ReportFormat::Auto;
        run_compare(config).unwrap();

        let text = std::fs::read_to_string(&report).unwrap();
        assert!(text.contains("a.txt"));
        assert!(serde_json::from_str::<serde_json::Value>(&text).is_err());
    }

    #[test]
    fn test_missing_tree_is_an_error() {
        let new = tempfile::tempdir().unwrap();
        let state = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let missing = new.path().join("does-not-exist");

        let report = out.path().join("changes.json");
        assert!(run_compare(run_config(&missing, new.path(), state.path(), &report)).is_err());
    }
}
