//! Configuration module for modshift.
//!
//! This module provides a unified configuration system with:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - Named presets for common use cases
//! - YAML config file loading and discovery
//! - CLI argument merging
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use modshift::config::{AppConfig, ConfigPreset};
//!
//! // Use defaults
//! let config = AppConfig::default();
//!
//! // Use a preset
//! let config = AppConfig::from_preset(ConfigPreset::CiCd);
//!
//! // Use builder
//! let config = AppConfig::builder()
//!     .chunk_size(256 * 1024)
//!     .max_attempts(5)
//!     .build();
//!
//! // Load from file
//! use modshift::config::file::load_or_default;
//! let (config, loaded_from) = load_or_default(None);
//! ```
//!
//! # Configuration File
//!
//! Place a `.modshift.yaml` file in your project root or `~/.config/modshift/`:
//!
//! ```yaml
//! state:
//!   ttl_hours: 12
//! pipeline:
//!   max_attempts: 5
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::{
    default_text_extensions, ConfigPreset, DEFAULT_BACKOFF_MS, DEFAULT_CHUNK_SIZE,
    DEFAULT_LARGE_FILE_THRESHOLD, DEFAULT_MAX_ATTEMPTS, DEFAULT_STATE_TTL_HOURS,
};
pub use types::{
    AnalyzeConfig, AppConfig, AppConfigBuilder, BehaviorConfig, CheckConfig, CompareConfig,
    CompareRunConfig, OutputConfig, PipelineConfig, StateConfig, VersionPair,
};
pub use validation::{ConfigError, Validatable};

pub use file::{
    discover_config_file, generate_example_config, generate_full_example_config, load_config_file,
    load_or_default, ConfigFileError, CONFIG_FILE_NAMES,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// The schema documents every option that can be set in `.modshift.yaml`
/// and can be used by editors for validation and autocompletion.
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
}
