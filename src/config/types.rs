//! Configuration types for modshift operations.
//!
//! Provides structured configuration for compare, analyze and check operations.

use super::defaults::{
    default_text_extensions, DEFAULT_BACKOFF_MS, DEFAULT_CHUNK_SIZE, DEFAULT_LARGE_FILE_THRESHOLD,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_STATE_TTL_HOURS,
};
use crate::reports::ReportFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// Aggregates all configuration options. It can be constructed from CLI
/// arguments, config files, or both (with CLI overriding file settings).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Tree comparison settings (chunking, thresholds, text detection)
    pub compare: CompareConfig,
    /// Persisted comparison state settings
    pub state: StateConfig,
    /// Analysis pipeline settings (retry policy, output directory)
    pub pipeline: PipelineConfig,
    /// Output configuration (format, file, colors)
    pub output: OutputConfig,
    /// Behavior flags
    pub behavior: BehaviorConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the streaming chunk size.
    pub const fn chunk_size(mut self, bytes: usize) -> Self {
        self.config.compare.chunk_size_bytes = bytes;
        self
    }

    /// Set the size at which files switch to the first-difference fast path.
    pub const fn large_file_threshold(mut self, bytes: u64) -> Self {
        self.config.compare.large_file_threshold_bytes = bytes;
        self
    }

    /// Set the number of worker threads (0 = number of CPUs).
    pub const fn worker_threads(mut self, threads: usize) -> Self {
        self.config.compare.worker_threads = threads;
        self
    }

    /// Set the comparison state directory.
    pub fn state_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config.state.dir = dir;
        self
    }

    /// Enable or disable persisted comparison state.
    pub const fn state_enabled(mut self, enabled: bool) -> Self {
        self.config.state.enabled = enabled;
        self
    }

    /// Set the maximum number of pipeline attempts.
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.pipeline.max_attempts = attempts;
        self
    }

    /// Set the pipeline backoff in milliseconds.
    pub const fn backoff_ms(mut self, millis: u64) -> Self {
        self.config.pipeline.backoff_ms = millis;
        self
    }

    /// Set the directory analysis reports are written to.
    pub fn pipeline_output_dir(mut self, dir: PathBuf) -> Self {
        self.config.pipeline.output_dir = dir;
        self
    }

    /// Set the output format.
    pub const fn output_format(mut self, format: ReportFormat) -> Self {
        self.config.output.format = format;
        self
    }

    /// Set the output file.
    pub fn output_file(mut self, file: Option<PathBuf>) -> Self {
        self.config.output.file = file;
        self
    }

    /// Disable colored output.
    pub const fn no_color(mut self, no_color: bool) -> Self {
        self.config.output.no_color = no_color;
        self
    }

    /// Enable quiet mode.
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.config.behavior.quiet = quiet;
        self
    }

    /// Enable fail-on-change mode.
    pub const fn fail_on_change(mut self, fail: bool) -> Self {
        self.config.behavior.fail_on_change = fail;
        self
    }

    /// Build the `AppConfig`.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Section Configurations
// ============================================================================

/// Settings for comparing two version trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CompareConfig {
    /// Chunk size in bytes used for streaming comparison and binary diffs
    pub chunk_size_bytes: usize,
    /// Files at or above this size only get their first differing offset located
    pub large_file_threshold_bytes: u64,
    /// File extensions (without the dot) diffed line by line
    pub text_extensions: Vec<String>,
    /// Worker threads for comparisons and analysis (0 = number of CPUs)
    pub worker_threads: usize,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: DEFAULT_CHUNK_SIZE,
            large_file_threshold_bytes: DEFAULT_LARGE_FILE_THRESHOLD,
            text_extensions: default_text_extensions(),
            worker_threads: 0,
        }
    }
}

impl CompareConfig {
    /// Check whether a file extension is diffed as text (case-insensitive).
    #[must_use]
    pub fn is_text_extension(&self, ext: &str) -> bool {
        self.text_extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }

    /// Effective worker count.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.worker_threads == 0 {
            std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
        } else {
            self.worker_threads
        }
    }
}

/// Settings for persisted comparison state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StateConfig {
    /// Load and save comparison state for incremental comparisons
    pub enabled: bool,
    /// State directory (defaults to the platform cache directory)
    pub dir: Option<PathBuf>,
    /// Age after which a stored state is discarded, in hours
    pub ttl_hours: u64,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            ttl_hours: DEFAULT_STATE_TTL_HOURS,
        }
    }
}

impl StateConfig {
    /// Directory state files live in.
    #[must_use]
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(crate::pipeline::dirs::state_dir)
    }

    /// State time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours * 3600)
    }
}

/// Settings for the retrying analysis pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PipelineConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Fixed delay between attempts, in milliseconds
    pub backoff_ms: u64,
    /// Directory analysis reports are written to
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_ms: DEFAULT_BACKOFF_MS,
            output_dir: PathBuf::from("."),
        }
    }
}

impl PipelineConfig {
    /// Delay between attempts.
    #[must_use]
    pub const fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Output-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: ReportFormat,
    /// Output file path (None for stdout)
    pub file: Option<PathBuf>,
    /// Disable colored output
    pub no_color: bool,
}

/// Behavior flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Suppress non-essential output
    pub quiet: bool,
    /// Exit with code 1 if any change is detected
    pub fail_on_change: bool,
}

// ============================================================================
// Command-specific Configuration Types
// ============================================================================

/// Two version trees and their identifiers.
#[derive(Debug, Clone)]
pub struct VersionPair {
    /// Identifier of the old version (e.g. `1.20.1`)
    pub old_version: String,
    /// Identifier of the new version
    pub new_version: String,
    /// Root of the extracted old tree
    pub old_dir: PathBuf,
    /// Root of the extracted new tree
    pub new_dir: PathBuf,
}

/// Configuration for compare operations
#[derive(Debug, Clone)]
pub struct CompareRunConfig {
    /// Trees to compare
    pub versions: VersionPair,
    /// Skip stored state and force a full comparison
    pub force_full: bool,
    /// Application configuration
    pub app: AppConfig,
}

/// Configuration for analyze operations
#[derive(Debug, Clone)]
pub struct AnalyzeConfig {
    /// Mod analysis report (JSON)
    pub mod_report: PathBuf,
    /// Version change report (JSON, produced by `compare -o json`)
    pub change_report: PathBuf,
    /// Application configuration
    pub app: AppConfig,
}

/// Configuration for the coordinated check flow
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Trees to compare
    pub versions: VersionPair,
    /// Mod analysis report (JSON)
    pub mod_report: PathBuf,
    /// Version identifier of the mod build the report describes
    pub mod_version: String,
    /// Application configuration
    pub app: AppConfig,
}
