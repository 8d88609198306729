//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery.

use super::types::AppConfig;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".modshift.yaml",
    ".modshift.yml",
    "modshift.yaml",
    "modshift.yml",
];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/modshift/)
/// 5. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    if let Some(path) = std::env::current_dir()
        .ok()
        .and_then(|cwd| find_config_in_dir(&cwd))
    {
        return Some(path);
    }

    if let Some(path) = find_git_root().and_then(|root| find_config_in_dir(&root)) {
        return Some(path);
    }

    if let Some(path) =
        dirs::config_dir().and_then(|dir| find_config_in_dir(&dir.join("modshift")))
    {
        return Some(path);
    }

    dirs::home_dir().and_then(|home| find_config_in_dir(&home))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Find the git repository root by walking up the directory tree.
fn find_git_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut current = cwd.as_path();

    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    /// File not found
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// IO error reading file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// YAML parsing error
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Configuration Merging
// ============================================================================

impl AppConfig {
    /// Merge another config into this one, with `other` taking precedence
    /// wherever it differs from the defaults.
    ///
    /// This is how CLI args are layered over file config.
    pub fn merge(&mut self, other: &Self) {
        let defaults = Self::default();

        // Compare config
        if other.compare.chunk_size_bytes != defaults.compare.chunk_size_bytes {
            self.compare.chunk_size_bytes = other.compare.chunk_size_bytes;
        }
        if other.compare.large_file_threshold_bytes != defaults.compare.large_file_threshold_bytes
        {
            self.compare.large_file_threshold_bytes = other.compare.large_file_threshold_bytes;
        }
        if other.compare.text_extensions != defaults.compare.text_extensions {
            self.compare
                .text_extensions
                .clone_from(&other.compare.text_extensions);
        }
        if other.compare.worker_threads != 0 {
            self.compare.worker_threads = other.compare.worker_threads;
        }

        // State config
        if !other.state.enabled {
            self.state.enabled = false;
        }
        if other.state.dir.is_some() {
            self.state.dir.clone_from(&other.state.dir);
        }
        if other.state.ttl_hours != defaults.state.ttl_hours {
            self.state.ttl_hours = other.state.ttl_hours;
        }

        // Pipeline config
        if other.pipeline.max_attempts != defaults.pipeline.max_attempts {
            self.pipeline.max_attempts = other.pipeline.max_attempts;
        }
        if other.pipeline.backoff_ms != defaults.pipeline.backoff_ms {
            self.pipeline.backoff_ms = other.pipeline.backoff_ms;
        }
        if other.pipeline.output_dir != defaults.pipeline.output_dir {
            self.pipeline.output_dir.clone_from(&other.pipeline.output_dir);
        }

        // Output config - only override if explicitly set
        if other.output.format != crate::reports::ReportFormat::Auto {
            self.output.format = other.output.format;
        }
        if other.output.file.is_some() {
            self.output.file.clone_from(&other.output.file);
        }
        if other.output.no_color {
            self.output.no_color = true;
        }

        // Behavior config (booleans - if set to true, override)
        if other.behavior.quiet {
            self.behavior.quiet = true;
        }
        if other.behavior.fail_on_change {
            self.behavior.fail_on_change = true;
        }
    }

    /// Load from file and merge with CLI overrides.
    #[must_use]
    pub fn from_file_with_overrides(
        config_path: Option<&Path>,
        cli_overrides: &Self,
    ) -> (Self, Option<PathBuf>) {
        let (mut config, loaded_from) = load_or_default(config_path);
        config.merge(cli_overrides);
        (config, loaded_from)
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    let example = AppConfig::default();
    format!(
        r"# modshift configuration
# Place this file at .modshift.yaml in your project root or ~/.config/modshift/

{}
",
        serde_yaml::to_string(&example).unwrap_or_default()
    )
}

/// Generate a commented example config with all options.
#[must_use]
pub fn generate_full_example_config() -> String {
    r"# modshift configuration file
# ============================
#
# Place it at:
#   - .modshift.yaml in your project root
#   - ~/.config/modshift/modshift.yaml for global config
#
# CLI arguments always override file settings.

# Tree comparison
compare:
  # Chunk size for streaming comparison and binary diffs (bytes)
  chunk_size_bytes: 1048576
  # Files at or above this size only report their first differing offset
  large_file_threshold_bytes: 10485760
  # Extensions diffed line by line (everything else is binary)
  text_extensions: [java, json, txt, md, properties, toml, yaml, xml]
  # Worker threads (0 = number of CPUs)
  worker_threads: 0

# Persisted comparison state (incremental comparisons)
state:
  enabled: true
  # dir: ~/.cache/modshift/state
  ttl_hours: 24

# Analysis pipeline
pipeline:
  max_attempts: 3
  backoff_ms: 2000
  output_dir: .

# Output configuration
output:
  # Format: auto, summary, json, text
  format: auto
  # file: changes.json
  no_color: false

# Behavior flags
behavior:
  quiet: false
  # Exit with code 1 if any changes detected
  fail_on_change: false
"
    .to_string()
}

// ============================================================================
// Tests
// ============================================================================
