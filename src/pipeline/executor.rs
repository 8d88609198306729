//! Bounded worker pool with completion handles.

use super::PipelineError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Mutex;
use std::time::Duration;

/// Fixed-size pool comparisons and analysis runs execute on.
///
/// Rayon parallel iterators used inside a submitted task run on the same
/// pool, so the thread bound holds for nested per-file work too.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Build a pool with `threads` workers (0 = number of CPUs).
    pub fn new(threads: usize) -> Result<Self, PipelineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("modshift-worker-{index}"))
            .build()
            .map_err(|e| PipelineError::PoolUnavailable(e.to_string()))?;
        tracing::debug!(threads = pool.current_num_threads(), "worker pool started");
        Ok(Self { pool })
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `f` on the pool and block until it returns.
    pub fn install<T, F>(&self, f: F) -> T
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        self.pool.install(f)
    }

    /// Queue `f` on the pool and return a handle to its result.
    ///
    /// A panic inside `f` is caught and surfaces as
    /// [`PipelineError::TaskPanicked`] from the handle.
    pub fn submit<T, F>(&self, f: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        self.pool.spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(f)).map_err(panic_message);
            // The handle may have been dropped; nobody is waiting then.
            let _ = sender.send(outcome);
        });
        TaskHandle {
            receiver: Mutex::new(receiver),
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads())
            .finish()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

type TaskOutcome<T> = Result<T, String>;

/// Completion handle for a task submitted to a [`WorkerPool`].
pub struct TaskHandle<T> {
    receiver: Mutex<Receiver<TaskOutcome<T>>>,
}

impl<T> TaskHandle<T> {
    /// Block until the task finishes.
    pub fn wait(self) -> Result<T, PipelineError> {
        let receiver = self
            .receiver
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match receiver.recv() {
            Ok(outcome) => outcome.map_err(PipelineError::TaskPanicked),
            Err(_) => Err(PipelineError::TaskLost),
        }
    }

    /// Wait up to `timeout`; `Ok(None)` if the task is still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Option<T>, PipelineError> {
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match receiver.recv_timeout(timeout) {
            Ok(outcome) => outcome.map(Some).map_err(PipelineError::TaskPanicked),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(PipelineError::TaskLost),
        }
    }

    /// Non-blocking poll; `Ok(None)` if the task is still running.
    pub fn try_take(&self) -> Result<Option<T>, PipelineError> {
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match receiver.try_recv() {
            Ok(outcome) => outcome.map(Some).map_err(PipelineError::TaskPanicked),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(PipelineError::TaskLost),
        }
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle").finish_non_exhaustive()
    }
}
