//! Default configurations and presets for modshift.
//!
//! Provides named presets for common use cases and default values.

use super::types::{AppConfig, BehaviorConfig, OutputConfig, StateConfig};
use crate::reports::ReportFormat;

// ============================================================================
// Default Values
// ============================================================================

/// Chunk size for streaming comparison and binary diffs (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Files at or above this size use the first-difference fast path (10 MiB).
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Stored comparison state older than this is discarded.
pub const DEFAULT_STATE_TTL_HOURS: u64 = 24;

/// Total pipeline attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Fixed delay between pipeline attempts.
pub const DEFAULT_BACKOFF_MS: u64 = 2000;

/// Extensions found in decompiled game trees that are diffed line by line.
const TEXT_EXTENSIONS: &[&str] = &[
    "java",
    "kt",
    "groovy",
    "gradle",
    "json",
    "mcmeta",
    "txt",
    "md",
    "properties",
    "cfg",
    "toml",
    "yaml",
    "yml",
    "xml",
    "lang",
    "mcfunction",
    "accesswidener",
    "csv",
    "html",
    "js",
    "glsl",
    "vsh",
    "fsh",
    "tiny",
    "mappings",
];

/// Default text extension list as owned strings.
#[must_use]
pub fn default_text_extensions() -> Vec<String> {
    TEXT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect()
}

// ============================================================================
// Configuration Presets
// ============================================================================

/// Named configuration presets for common use cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Default settings suitable for most comparisons
    Default,
    /// CI/CD: machine-readable output, fail on changes, quiet
    CiCd,
    /// Always run full comparisons and never persist state
    Stateless,
}

impl ConfigPreset {
    /// Get the preset name as a string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::CiCd => "ci-cd",
            Self::Stateless => "stateless",
        }
    }

    /// Parse a preset from a string name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::Default),
            "ci-cd" | "ci" | "cd" | "pipeline" => Some(Self::CiCd),
            "stateless" | "full" => Some(Self::Stateless),
            _ => None,
        }
    }

    /// Get a description of this preset.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Default => "Incremental comparisons with a 24h state cache",
            Self::CiCd => "JSON output, quiet, non-zero exit code on any change",
            Self::Stateless => "Full comparisons only, no state files written",
        }
    }

    /// Get all available presets.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Default, Self::CiCd, Self::Stateless]
    }
}

impl std::fmt::Display for ConfigPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Preset Implementations
// ============================================================================

impl AppConfig {
    /// Create an `AppConfig` from a named preset.
    #[must_use]
    pub fn from_preset(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Default => Self::default(),
            ConfigPreset::CiCd => Self::ci_cd_preset(),
            ConfigPreset::Stateless => Self::stateless_preset(),
        }
    }

    /// CI/CD pipeline preset.
    #[must_use]
    pub fn ci_cd_preset() -> Self {
        Self {
            output: OutputConfig {
                format: ReportFormat::Json,
                file: None,
                no_color: true,
            },
            behavior: BehaviorConfig {
                quiet: true,
                fail_on_change: true,
            },
            ..Self::default()
        }
    }

    /// Preset that never reads or writes comparison state.
    #[must_use]
    pub fn stateless_preset() -> Self {
        Self {
            state: StateConfig {
                enabled: false,
                ..StateConfig::default()
            },
            ..Self::default()
        }
    }
}
