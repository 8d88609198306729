//! Analysis pipeline and execution plumbing.
//!
//! This module holds the bounded worker pool comparisons and analyses run
//! on, the three analysis stages (structure → changes → impact correlation),
//! the retrying pipeline that chains them, and the dispatcher that feeds
//! fired barrier events into it.

mod analysis;
mod dispatcher;
mod executor;
mod stages;

pub use analysis::{AnalysisPipeline, AnalysisResult, AnalysisTask};
pub use dispatcher::{AnalysisDispatcher, AnalysisOutcome};
pub use executor::{TaskHandle, WorkerPool};
pub use stages::{
    analyze_changes, analyze_structure, correlate_impacts, normalize_class_reference,
    AnalysisContext, ImpactSeverity, ImpactedComponent, ModClass, ModDependency, ModStructure,
    VersionChangeList,
};

#[cfg(test)]
pub(crate) use stages::test_support;

use std::path::PathBuf;

/// Structured pipeline error types for better diagnostics.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// Mod analysis report could not be read or is invalid
    #[error("Structure analysis failed for {}: {source}", path.display())]
    StructureFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Version change report could not be read or is invalid
    #[error("Change analysis failed for {}: {source}", path.display())]
    ChangesFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Report generation or output failed
    #[error("Report failed for {}: {source}", path.display())]
    ReportFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Worker pool could not be built
    #[error("Worker pool unavailable: {0}")]
    PoolUnavailable(String),

    /// A submitted task panicked
    #[error("Task panicked: {0}")]
    TaskPanicked(String),

    /// A submitted task was dropped without producing a result
    #[error("Task result lost: worker disconnected")]
    TaskLost,

    /// Every attempt failed
    #[error("Analysis failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<PipelineError>,
    },
}

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Success - no changes detected (or no --fail-on-change)
    pub const SUCCESS: i32 = 0;
    /// Changes were detected
    pub const CHANGES_DETECTED: i32 = 1;
    /// An error occurred
    pub const ERROR: i32 = 3;
}

/// Platform-specific cache directory utilities
pub mod dirs {
    use std::path::PathBuf;

    /// Get the platform-specific cache directory
    #[must_use]
    pub fn cache_dir() -> Option<PathBuf> {
        ::dirs::cache_dir()
    }

    /// Get the default comparison state directory
    #[must_use]
    pub fn state_dir() -> PathBuf {
        cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("modshift")
            .join("state")
    }
}
