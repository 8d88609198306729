//! Feeds fired barrier events into the analysis pipeline.

use super::analysis::{AnalysisPipeline, AnalysisResult, AnalysisTask};
use super::executor::WorkerPool;
use super::PipelineError;
use crate::coordination::ReadyPair;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Terminal outcome of one dispatched analysis.
#[derive(Debug)]
pub struct AnalysisOutcome {
    /// The barrier event that triggered the run
    pub pair: ReadyPair,
    pub result: Result<AnalysisResult, PipelineError>,
}

/// Single consumer of a barrier's event channel.
///
/// Every received [`ReadyPair`] becomes one pipeline run on the worker pool.
/// Outcomes are logged and forwarded on the outcome channel. The dispatcher
/// stops once the barrier (the event sender) is dropped.
pub struct AnalysisDispatcher {
    thread: JoinHandle<usize>,
}

impl AnalysisDispatcher {
    /// Start consuming `events`. Returns the dispatcher and its outcome channel.
    pub fn spawn(
        events: Receiver<ReadyPair>,
        pipeline: Arc<AnalysisPipeline>,
        pool: Arc<WorkerPool>,
    ) -> (Self, Receiver<AnalysisOutcome>) {
        let (outcome_tx, outcome_rx) = mpsc::channel();
        let thread = thread::spawn(move || dispatch_loop(&events, &pipeline, &pool, &outcome_tx));
        (Self { thread }, outcome_rx)
    }

    /// Wait for the event channel to close. Returns the number of runs submitted.
    pub fn join(self) -> Result<usize, PipelineError> {
        self.thread
            .join()
            .map_err(|_| PipelineError::TaskPanicked("analysis dispatcher".to_string()))
    }
}

fn dispatch_loop(
    events: &Receiver<ReadyPair>,
    pipeline: &Arc<AnalysisPipeline>,
    pool: &WorkerPool,
    outcomes: &Sender<AnalysisOutcome>,
) -> usize {
    let mut dispatched = 0;
    for pair in events {
        dispatched += 1;
        tracing::info!(
            source = %pair.source.version,
            target = %pair.target.version,
            "dispatching analysis"
        );
        let pipeline = Arc::clone(pipeline);
        let outcomes = outcomes.clone();
        // Detached: the outcome travels over the channel, not the handle.
        let _handle = pool.submit(move || {
            let result = pipeline.run_task(&AnalysisTask::from(pair.clone()));
            match &result {
                Ok(analysis) => tracing::info!(
                    report = %analysis.report_path.display(),
                    impacts = analysis.impacts.len(),
                    "analysis succeeded"
                ),
                Err(e) => tracing::error!("analysis failed: {e}"),
            }
            if outcomes.send(AnalysisOutcome { pair, result }).is_err() {
                tracing::warn!("outcome receiver dropped");
            }
        });
    }
    tracing::debug!(dispatched, "barrier channel closed, dispatcher stopping");
    dispatched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::{BarrierPolicy, CompletionBarrier, ReadySignal};
    use crate::pipeline::test_support::write_inputs;
    use std::time::Duration;

    #[test]
    fn test_fired_event_runs_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let (mod_report, change_report) = write_inputs(dir.path());
        let pool = Arc::new(WorkerPool::new(2).unwrap());
        let pipeline = Arc::new(AnalysisPipeline::new(1, Duration::ZERO, dir.path()));

        let (barrier, events) = CompletionBarrier::new(BarrierPolicy::LatestWins);
        let (dispatcher, outcomes) = AnalysisDispatcher::spawn(events, pipeline, pool);

        barrier.mark_target_ready(ReadySignal::new("1.21", &change_report));
        barrier.mark_source_ready(ReadySignal::new("2.1.0", &mod_report));

        let outcome = outcomes.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(outcome.pair.source.version, "2.1.0");
        let result = outcome.result.unwrap();
        assert!(result.report_path.exists());

        drop(barrier);
        assert_eq!(dispatcher.join().unwrap(), 1);
    }

    #[test]
    fn test_failed_run_is_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let pool = Arc::new(WorkerPool::new(1).unwrap());
        let pipeline = Arc::new(AnalysisPipeline::new(2, Duration::from_millis(1), dir.path()));

        let (barrier, events) = CompletionBarrier::new(BarrierPolicy::LatestWins);
        let (dispatcher, outcomes) = AnalysisDispatcher::spawn(events, pipeline, pool);

        barrier.mark_source_ready(ReadySignal::new("2.1.0", dir.path().join("missing.json")));
        barrier.mark_target_ready(ReadySignal::new("1.21", dir.path().join("missing2.json")));

        let outcome = outcomes.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(matches!(
            outcome.result,
            Err(PipelineError::RetriesExhausted { attempts: 2, .. })
        ));

        drop(barrier);
        assert_eq!(dispatcher.join().unwrap(), 1);
    }
}
