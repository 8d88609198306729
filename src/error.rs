//! Unified error types for modshift.
//!
//! This module provides the error hierarchy for the library, with rich
//! context for debugging and user-friendly messages. Per-file read failures
//! (`IoRead`) are isolated by the comparison engine, comparison-level
//! failures abort a comparison, and state-load failures never leave the
//! state store.

use crate::pipeline::PipelineError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for modshift operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ModshiftError {
    /// Malformed version identifiers, missing roots and similar input problems
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A single file could not be read while hashing or diffing
    #[error("Failed to read {}: {source}", path.display())]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected failure that aborts a whole comparison
    #[error("Comparison failed: {context}")]
    Comparison {
        context: String,
        #[source]
        source: ComparisonErrorKind,
    },

    /// Comparison state could not be loaded (always degraded to a full comparison)
    #[error("Comparison state at {} unusable: {source}", path.display())]
    StateLoad {
        path: PathBuf,
        #[source]
        source: StateLoadErrorKind,
    },

    /// Errors while persisting comparison state
    #[error("Failed to persist comparison state at {}: {message}", path.display())]
    StateSave { path: PathBuf, message: String },

    /// Errors during report generation
    #[error("Report generation failed: {0}")]
    Report(String),

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Analysis pipeline failures
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Specific comparison error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ComparisonErrorKind {
    #[error("Directory traversal failed: {0}")]
    Traversal(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Specific state load error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StateLoadErrorKind {
    #[error("state file not found")]
    Missing,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad magic header")]
    BadMagic,

    #[error("unsupported state format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u8, supported: u8 },

    #[error("decompression failed: {0}")]
    Decompress(String),

    #[error("deserialization failed: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("invalid version pair: {0}")]
    InvalidKey(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for modshift operations
pub type Result<T> = std::result::Result<T, ModshiftError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl ModshiftError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a per-file read error
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create a comparison error with context
    pub fn comparison(context: impl Into<String>, source: ComparisonErrorKind) -> Self {
        Self::Comparison {
            context: context.into(),
            source,
        }
    }

    /// Create a state load error
    pub fn state_load(path: impl Into<PathBuf>, source: StateLoadErrorKind) -> Self {
        Self::StateLoad {
            path: path.into(),
            source,
        }
    }

    /// Create a state save error
    pub fn state_save(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::StateSave {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a report error
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error only affects a single file of a comparison.
    #[must_use]
    pub const fn is_per_file(&self) -> bool {
        matches!(self, Self::IoRead { .. })
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<walkdir::Error> for ModshiftError {
    fn from(err: walkdir::Error) -> Self {
        Self::comparison("walking version tree", ComparisonErrorKind::Traversal(err))
    }
}

impl From<serde_json::Error> for ModshiftError {
    fn from(err: serde_json::Error) -> Self {
        Self::Report(format!("JSON serialization: {err}"))
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// The context string is chained in front of any existing context, so a
/// failure deep in a traversal reads like `"comparing 1.20 -> 1.21: walking
/// version tree"`.
///
/// # Example
///
/// ```ignore
/// use modshift::error::ErrorContext;
///
/// let result = engine
///     .compare(&old_dir, &new_dir)
///     .with_context(|| format!("comparing {old} -> {new}"))?;
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure (lazy evaluation).
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<ModshiftError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: ModshiftError, new_ctx: &str) -> ModshiftError {
    match err {
        ModshiftError::Comparison {
            context: existing,
            source,
        } => ModshiftError::Comparison {
            context: chain_context(new_ctx, &existing),
            source,
        },
        ModshiftError::StateSave { path, message } => ModshiftError::StateSave {
            path,
            message: chain_context(new_ctx, &message),
        },
        ModshiftError::Report(msg) => ModshiftError::Report(chain_context(new_ctx, &msg)),
        ModshiftError::Config(msg) => ModshiftError::Config(chain_context(new_ctx, &msg)),
        ModshiftError::Validation(msg) => ModshiftError::Validation(chain_context(new_ctx, &msg)),
        // Path-carrying and pipeline errors already identify their origin.
        other => other,
    }
}

/// Chain two context strings together.
///
/// If the existing context is empty, returns just the new context.
/// Otherwise, returns "`new_context`: `existing_context`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_read_display_contains_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ModshiftError::io_read("/trees/1.20/a.java", io_err);

        assert!(err.to_string().contains("/trees/1.20/a.java"));
        assert!(err.is_per_file());
    }

    #[test]
    fn test_context_chaining() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let initial: Result<()> = Err(ModshiftError::comparison(
            "walking version tree",
            ComparisonErrorKind::Io(io_err),
        ));

        match initial.context("comparing 1.20 -> 1.21") {
            Err(ModshiftError::Comparison { context, .. }) => {
                assert_eq!(context, "comparing 1.20 -> 1.21: walking version tree");
            }
            other => panic!("Expected Comparison error, got {other:?}"),
        }
    }

    #[test]
    fn test_context_chaining_multiple_levels() {
        fn inner() -> Result<()> {
            Err(ModshiftError::validation("base"))
        }

        fn middle() -> Result<()> {
            inner().context("middle layer")
        }

        fn outer() -> Result<()> {
            middle().context("outer layer")
        }

        match outer() {
            Err(ModshiftError::Validation(msg)) => {
                assert_eq!(msg, "outer layer: middle layer: base");
            }
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_context_leaves_io_read_untouched() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let result: Result<()> = Err(ModshiftError::io_read("/a/b.bin", io_err));
        let err = result.context("hashing").unwrap_err();
        assert!(matches!(err, ModshiftError::IoRead { .. }));
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let mut called = false;

        let ok_result: Result<i32> = Ok(42);
        let _ = ok_result.with_context(|| {
            called = true;
            "should not be called"
        });
        assert!(!called, "Closure should not be called for Ok result");

        let err_result: Result<i32> = Err(ModshiftError::validation("error"));
        let _ = err_result.with_context(|| {
            called = true;
            "should be called"
        });
        assert!(called, "Closure should be called for Err result");
    }

    #[test]
    fn test_chain_context_helper() {
        assert_eq!(chain_context("new", ""), "new");
        assert_eq!(chain_context("new", "existing"), "new: existing");
    }
}
