//! Configuration validation for modshift.
//!
//! Provides validation traits and implementations for all configuration types.

use super::types::{AppConfig, CompareConfig, OutputConfig, PipelineConfig, StateConfig};

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.compare.validate());
        errors.extend(self.state.validate());
        errors.extend(self.pipeline.validate());
        errors.extend(self.output.validate());
        errors
    }
}

impl Validatable for CompareConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.chunk_size_bytes == 0 {
            errors.push(ConfigError::new(
                "compare.chunk_size_bytes",
                "Chunk size must be greater than zero",
            ));
        }
        // Binary diff records address offsets with 32-bit fields
        if u32::try_from(self.chunk_size_bytes).is_err() {
            errors.push(ConfigError::new(
                "compare.chunk_size_bytes",
                format!("Chunk size {} exceeds 4 GiB", self.chunk_size_bytes),
            ));
        }
        if self.large_file_threshold_bytes < self.chunk_size_bytes as u64 {
            errors.push(ConfigError::new(
                "compare.large_file_threshold_bytes",
                format!(
                    "Threshold ({}) must be at least the chunk size ({})",
                    self.large_file_threshold_bytes, self.chunk_size_bytes
                ),
            ));
        }
        if self.large_file_threshold_bytes > u64::from(u32::MAX) {
            errors.push(ConfigError::new(
                "compare.large_file_threshold_bytes",
                "Threshold must fit in a 32-bit offset (binary diff record format)",
            ));
        }
        if self.text_extensions.iter().any(|e| e.starts_with('.') || e.is_empty()) {
            errors.push(ConfigError::new(
                "compare.text_extensions",
                "Extensions must be non-empty and given without a leading dot",
            ));
        }

        errors
    }
}

impl Validatable for StateConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.enabled && self.ttl_hours == 0 {
            errors.push(ConfigError::new(
                "state.ttl_hours",
                "TTL must be at least one hour when state is enabled",
            ));
        }
        if let Some(dir) = &self.dir {
            if dir.is_file() {
                errors.push(ConfigError::new(
                    "state.dir",
                    format!("{} is a file, expected a directory", dir.display()),
                ));
            }
        }
        errors
    }
}

impl Validatable for PipelineConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.max_attempts == 0 {
            errors.push(ConfigError::new(
                "pipeline.max_attempts",
                "At least one attempt is required",
            ));
        }
        if self.output_dir.is_file() {
            errors.push(ConfigError::new(
                "pipeline.output_dir",
                format!("{} is a file, expected a directory", self.output_dir.display()),
            ));
        }
        errors
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let Some(parent) = self.file.as_ref().and_then(|f| f.parent()) {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                errors.push(ConfigError::new(
                    "output.file",
                    format!("Parent directory does not exist: {}", parent.display()),
                ));
            }
        }
        errors
    }
}
