//! **Version change detection and mod impact analysis for game version trees.**
//!
//! `modshift` compares two extracted (or decompiled) game version trees and
//! reports which files were added, removed or modified. Comparisons persist
//! per-pair state so repeat runs only rehash what changed. On top of the
//! comparison engine sit a two-phase completion barrier and a retrying
//! analysis pipeline that correlates the change list with a mod's class
//! references to find the parts of the mod an upgrade breaks.
//!
//! ## Core Concepts & Modules
//!
//! - **[`diff`]**: the [`ComparisonEngine`], per-file content diffing,
//!   the mtime-validated [`FingerprintCache`] and the persisted
//!   [`ComparisonStateStore`].
//! - **[`coordination`]**: the [`CompletionBarrier`] pairing "source ready"
//!   (mod report) and "target ready" (version change list) signals.
//! - **[`pipeline`]**: the bounded [`WorkerPool`], the three analysis stages
//!   and the retrying [`AnalysisPipeline`].
//! - **[`reports`]**: text, JSON and summary comparison reports plus the
//!   markdown impact report.
//! - **[`config`]**: YAML configuration, presets and validation.
//!
//! ## Comparing Two Versions
//!
//! ```no_run
//! use modshift::config::CompareConfig;
//! use modshift::diff::{ComparisonEngine, ComparisonStateStore};
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(ComparisonStateStore::new("/tmp/modshift-state"));
//!     let engine = ComparisonEngine::new(&CompareConfig::default())
//!         .with_state_store(store, Duration::from_secs(24 * 3600));
//!
//!     let comparison = engine.compare_versions(
//!         "1.20.1",
//!         "1.21",
//!         Path::new("trees/1.20.1"),
//!         Path::new("trees/1.21"),
//!         false,
//!     )?;
//!     println!(
//!         "{} changes ({} comparison)",
//!         comparison.result.change_count(),
//!         comparison.mode
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Coordinated Analysis
//!
//! ```no_run
//! use modshift::coordination::{BarrierPolicy, CompletionBarrier, ReadySignal};
//! use modshift::pipeline::{AnalysisDispatcher, AnalysisPipeline, WorkerPool};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = Arc::new(WorkerPool::new(0)?);
//!     let pipeline = Arc::new(AnalysisPipeline::new(3, Duration::from_secs(2), "reports"));
//!     let (barrier, events) = CompletionBarrier::new(BarrierPolicy::LatestWins);
//!     let (dispatcher, outcomes) = AnalysisDispatcher::spawn(events, pipeline, pool);
//!
//!     barrier.mark_source_ready(ReadySignal::new("2.1.0", "mod-report.json"));
//!     barrier.mark_target_ready(ReadySignal::new("1.21", "changes.json"));
//!     drop(barrier);
//!
//!     let outcome = outcomes.recv()?;
//!     println!("{:?}", outcome.result.map(|r| r.report_path));
//!     dispatcher.join()?;
//!     Ok(())
//! }
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::similar_names
)]

pub mod cli;
pub mod config;
pub mod coordination;
pub mod diff;
pub mod error;
pub mod pipeline;
pub mod reports;
pub mod utils;

// Re-export main types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigPreset};
pub use config::{BehaviorConfig, CompareConfig, OutputConfig, PipelineConfig, StateConfig};
pub use config::{ConfigError, Validatable};
pub use coordination::{BarrierPolicy, CompletionBarrier, ReadyPair, ReadySignal};
pub use diff::{
    ChangeKind, ComparisonEngine, ComparisonMode, ComparisonResult, ComparisonState,
    ComparisonStateStore, DiffEntry, FileFingerprint, FingerprintCache, VersionComparison,
};
pub use error::{ErrorContext, ModshiftError, Result};
pub use pipeline::{
    AnalysisDispatcher, AnalysisPipeline, AnalysisResult, AnalysisTask, PipelineError,
    TaskHandle, WorkerPool,
};
pub use reports::{ReportFormat, ReportGenerator};
