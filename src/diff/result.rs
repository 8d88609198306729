//! Comparison result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

// ============================================================================
// Per-file diff payloads
// ============================================================================

/// How a file present in both trees differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffEntry {
    /// Unified line diff with inline word highlights
    TextModified { diff_text: String },
    /// zstd-compressed sequence of differing chunk records
    BinaryModified { encoded_chunks: Vec<u8> },
    /// Large file; only the first differing byte offset was located
    ContentModifiedAtOffset { offset: u64 },
}

impl DiffEntry {
    /// Short label used by reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::TextModified { .. } => "text",
            Self::BinaryModified { .. } => "binary",
            Self::ContentModifiedAtOffset { .. } => "large",
        }
    }
}

/// Kind of change recorded for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

// ============================================================================
// ComparisonResult
// ============================================================================

/// Outcome of comparing two version trees.
///
/// A path appears in at most one of `added`, `removed` and `diffs`. Keys are
/// `/`-separated paths relative to the tree roots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Paths present only in the new tree
    pub added: BTreeSet<String>,
    /// Paths present only in the old tree
    pub removed: BTreeSet<String>,
    /// Paths present in both trees with differing content
    pub diffs: BTreeMap<String, DiffEntry>,
    /// Paths whose per-file comparison failed and were left out
    pub skipped: BTreeSet<String>,
}

impl ComparisonResult {
    /// Create an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path that only exists in the new tree.
    pub fn mark_added(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.removed.remove(&path);
        self.diffs.remove(&path);
        self.added.insert(path);
    }

    /// Record a path that only exists in the old tree.
    pub fn mark_removed(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.added.remove(&path);
        self.diffs.remove(&path);
        self.removed.insert(path);
    }

    /// Record a content difference for a path present in both trees.
    pub fn insert_diff(&mut self, path: impl Into<String>, entry: DiffEntry) {
        let path = path.into();
        self.added.remove(&path);
        self.removed.remove(&path);
        self.diffs.insert(path, entry);
    }

    /// Record a path that could not be compared.
    pub fn mark_skipped(&mut self, path: impl Into<String>) {
        self.skipped.insert(path.into());
    }

    /// Fold another partial result into this one.
    pub fn absorb(&mut self, other: Self) {
        for path in other.added {
            self.mark_added(path);
        }
        for path in other.removed {
            self.mark_removed(path);
        }
        for (path, entry) in other.diffs {
            self.insert_diff(path, entry);
        }
        self.skipped.extend(other.skipped);
    }

    /// True when no change was detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.diffs.is_empty()
    }

    /// Number of changed paths.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.diffs.len()
    }

    /// Change kind recorded for a path, if any.
    #[must_use]
    pub fn kind_of(&self, path: &str) -> Option<ChangeKind> {
        if self.added.contains(path) {
            Some(ChangeKind::Added)
        } else if self.removed.contains(path) {
            Some(ChangeKind::Removed)
        } else if self.diffs.contains_key(path) {
            Some(ChangeKind::Modified)
        } else {
            None
        }
    }

    /// All changed paths with their kind, sorted by path.
    #[must_use]
    pub fn changes(&self) -> Vec<(&str, ChangeKind)> {
        let mut all: Vec<(&str, ChangeKind)> = self
            .added
            .iter()
            .map(|p| (p.as_str(), ChangeKind::Added))
            .chain(self.removed.iter().map(|p| (p.as_str(), ChangeKind::Removed)))
            .chain(self.diffs.keys().map(|p| (p.as_str(), ChangeKind::Modified)))
            .collect();
        all.sort_unstable_by(|a, b| a.0.cmp(b.0));
        all
    }
}

// ============================================================================
// VersionComparison
// ============================================================================

/// Whether a comparison rehashed everything or reused stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    Full,
    Incremental,
}

impl std::fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Incremental => write!(f, "incremental"),
        }
    }
}

/// A comparison between two named versions, the unit reports are built from.
#[derive(Debug, Clone)]
pub struct VersionComparison {
    pub old_version: String,
    pub new_version: String,
    pub old_root: PathBuf,
    pub new_root: PathBuf,
    pub mode: ComparisonMode,
    pub generated_at: DateTime<Utc>,
    pub result: ComparisonResult,
}
