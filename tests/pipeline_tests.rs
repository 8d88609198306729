//! Integration tests for the analysis pipeline.
//!
//! Covers the retry loop against inputs that appear late, the worker pool
//! and the barrier-driven dispatcher.

use modshift::coordination::{BarrierPolicy, CompletionBarrier, ReadySignal};
use modshift::pipeline::{
    AnalysisDispatcher, AnalysisPipeline, AnalysisTask, ImpactSeverity, PipelineError,
    WorkerPool,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const MOD_REPORT: &str = r#"{
    "mod_id": "examplemod",
    "mod_version": "2.1.0",
    "classes": [
        {
            "name": "com/example/mixin/EntityMixin",
            "references": ["net.minecraft.entity.Entity", "net/minecraft/client/Gui"]
        }
    ]
}"#;

const CHANGE_REPORT: &str = r#"{
    "metadata": {
        "tool": { "name": "modshift", "version": "0.1.0" },
        "generated_at": "2026-01-01T00:00:00+00:00",
        "old_version": "1.20",
        "new_version": "1.21",
        "mode": "full"
    },
    "summary": { "total_changes": 2, "added": 0, "removed": 1, "modified": 1 },
    "changes": [
        { "path": "net/minecraft/client/Gui.java", "kind": "removed" },
        { "path": "net/minecraft/entity/Entity.java", "kind": "modified" }
    ]
}"#;

fn write_mod_report(dir: &Path) -> PathBuf {
    let path = dir.join("mod.json");
    std::fs::write(&path, MOD_REPORT).unwrap();
    path
}

fn write_change_report(dir: &Path) -> PathBuf {
    let path = dir.join("changes.json");
    std::fs::write(&path, CHANGE_REPORT).unwrap();
    path
}

// ============================================================================
// Retry behaviour
// ============================================================================

mod retry {
    use super::*;

    #[test]
    fn test_succeeds_first_try() {
        let work = tempfile::tempdir().unwrap();
        let source = write_mod_report(work.path());
        let target = write_change_report(work.path());
        let pipeline = AnalysisPipeline::new(3, Duration::from_millis(10), work.path().join("out"));

        let result = pipeline.run(&source, &target).unwrap();
        assert_eq!(result.attempts, 1);
        assert_eq!(result.impacts.len(), 2);
        assert_eq!(result.impacts[0].severity, ImpactSeverity::Breaking);
        assert!(result.missing_references.contains("net/minecraft/client/Gui"));
        assert_eq!(
            result.report_path,
            work.path().join("out").join("examplemod-1.20-to-1.21.md")
        );
        assert!(result.report_path.exists());
    }

    #[test]
    fn test_input_appearing_during_backoff_is_picked_up() {
        let work = tempfile::tempdir().unwrap();
        let source = write_mod_report(work.path());
        let target = work.path().join("changes.json");
        let pipeline =
            AnalysisPipeline::new(3, Duration::from_millis(500), work.path().join("out"));

        let writer = {
            let dir = work.path().to_path_buf();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(100));
                write_change_report(&dir);
            })
        };

        let started = Instant::now();
        let result = pipeline.run(&source, &target).unwrap();
        writer.join().unwrap();

        assert_eq!(result.attempts, 2);
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[test]
    fn test_retries_exhausted_reports_last_error() {
        let work = tempfile::tempdir().unwrap();
        let source = write_mod_report(work.path());
        let target = work.path().join("never-written.json");
        let pipeline = AnalysisPipeline::new(2, Duration::from_millis(10), work.path().join("out"));

        let err = pipeline.run(&source, &target).unwrap_err();
        match err {
            PipelineError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, PipelineError::ChangesFailed { .. }));
            }
            other => panic!("expected RetriesExhausted, got {other}"),
        }
        assert!(!work.path().join("out").exists());
    }

    #[test]
    fn test_invalid_mod_report_fails_structure_stage() {
        let work = tempfile::tempdir().unwrap();
        let source = work.path().join("mod.json");
        std::fs::write(&source, r#"{"mod_id": " ", "mod_version": "1"}"#).unwrap();
        let target = write_change_report(work.path());
        let pipeline = AnalysisPipeline::new(1, Duration::ZERO, work.path().join("out"));

        let err = pipeline.run(&source, &target).unwrap_err();
        let PipelineError::RetriesExhausted { last, .. } = err else {
            panic!("expected RetriesExhausted");
        };
        assert!(matches!(*last, PipelineError::StructureFailed { .. }));
    }
}

// ============================================================================
// Worker pool
// ============================================================================

mod pool {
    use super::*;

    #[test]
    fn test_submitted_analysis_runs_on_pool() {
        let work = tempfile::tempdir().unwrap();
        let task = AnalysisTask::new(
            write_mod_report(work.path()),
            write_change_report(work.path()),
        );
        let pool = WorkerPool::new(2).unwrap();
        let pipeline = AnalysisPipeline::new(1, Duration::ZERO, work.path().join("out"));

        let result = pipeline.submit(&pool, task).wait().unwrap().unwrap();
        assert_eq!(result.structure.mod_id, "examplemod");
    }

    #[test]
    fn test_many_tasks_complete() {
        let pool = WorkerPool::new(3).unwrap();
        let handles: Vec<_> = (0..32u64).map(|i| pool.submit(move || i * i)).collect();
        let total: u64 = handles.into_iter().map(|h| h.wait().unwrap()).sum();
        assert_eq!(total, (0..32u64).map(|i| i * i).sum::<u64>());
    }

    #[test]
    fn test_panicking_task_is_reported() {
        let pool = WorkerPool::new(1).unwrap();
        let handle = pool.submit(|| -> u32 { panic!("boom") });
        assert!(matches!(handle.wait(), Err(PipelineError::TaskPanicked(_))));

        // The pool keeps working afterwards
        assert_eq!(pool.submit(|| 7).wait().unwrap(), 7);
    }
}

// ============================================================================
// Barrier-driven dispatch
// ============================================================================

mod dispatch {
    use super::*;

    #[test]
    fn test_fired_pair_is_analysed() {
        let work = tempfile::tempdir().unwrap();
        let source = write_mod_report(work.path());
        let target = write_change_report(work.path());
        let pool = Arc::new(WorkerPool::new(2).unwrap());
        let pipeline = Arc::new(AnalysisPipeline::new(
            1,
            Duration::ZERO,
            work.path().join("out"),
        ));

        let (barrier, events) = CompletionBarrier::new(BarrierPolicy::LatestWins);
        let (dispatcher, outcomes) = AnalysisDispatcher::spawn(events, pipeline, pool);

        let target_side = {
            let target = target.clone();
            thread::spawn(move || ReadySignal::new("1.21", target))
        };
        barrier.mark_source_ready(ReadySignal::new("2.1.0", &source));
        assert!(barrier.mark_target_ready(target_side.join().unwrap()));
        drop(barrier);

        let outcome = outcomes.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(outcome.pair.target.report_path, target);
        assert_eq!(outcome.result.unwrap().attempts, 1);
        assert_eq!(dispatcher.join().unwrap(), 1);
    }
}
