//! JSON change list generator.
//!
//! The change list is the machine-readable form of a comparison and the
//! input the analysis pipeline reads back, so it is both `Serialize` and
//! `Deserialize`.

use super::{ReportError, ReportFormat, ReportGenerator};
use crate::diff::{unpack_records, ChangeKind, ComparisonMode, DiffEntry, VersionComparison};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// JSON report generator
pub struct JsonReporter {
    /// Pretty print output
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: true }
    }

    /// Set pretty printing
    #[must_use]
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for JsonReporter {
    fn generate_comparison_report(
        &self,
        comparison: &VersionComparison,
    ) -> Result<String, ReportError> {
        let report = ChangeListReport::from_comparison(comparison)?;
        let json = if self.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        Ok(json)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }
}

// ============================================================================
// Change list structures
// ============================================================================

/// Machine-readable change list between two versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeListReport {
    pub metadata: ChangeListMetadata,
    pub summary: ChangeSummary,
    pub changes: Vec<ChangeRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeListMetadata {
    pub tool: ToolInfo,
    pub generated_at: String,
    pub old_version: String,
    pub new_version: String,
    pub mode: ComparisonMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub total_changes: usize,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
}

/// One changed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub path: String,
    pub kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffDetail>,
}

/// Diff payload of a modified path, flattened for consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiffDetail {
    Text {
        diff_text: String,
    },
    Binary {
        changed_chunks: usize,
        chunk_offsets: Vec<u32>,
        compressed_size: usize,
    },
    Large {
        first_difference_offset: u64,
    },
}

impl DiffDetail {
    fn from_entry(path: &str, entry: &DiffEntry) -> Result<Self, ReportError> {
        Ok(match entry {
            DiffEntry::TextModified { diff_text } => Self::Text {
                diff_text: diff_text.clone(),
            },
            DiffEntry::BinaryModified { encoded_chunks } => {
                let records = unpack_records(encoded_chunks).map_err(|e| {
                    ReportError::SerializationError(format!("chunk records of {path}: {e}"))
                })?;
                Self::Binary {
                    changed_chunks: records.len(),
                    chunk_offsets: records.iter().map(|r| r.offset).collect(),
                    compressed_size: encoded_chunks.len(),
                }
            }
            DiffEntry::ContentModifiedAtOffset { offset } => Self::Large {
                first_difference_offset: *offset,
            },
        })
    }
}

impl ChangeListReport {
    /// Build the change list for a comparison.
    pub fn from_comparison(comparison: &VersionComparison) -> Result<Self, ReportError> {
        let result = &comparison.result;
        let changes = result
            .changes()
            .into_iter()
            .map(|(path, kind)| {
                let diff = result
                    .diffs
                    .get(path)
                    .map(|entry| DiffDetail::from_entry(path, entry))
                    .transpose()?;
                Ok(ChangeRecord {
                    path: path.to_string(),
                    kind,
                    diff,
                })
            })
            .collect::<Result<Vec<_>, ReportError>>()?;

        Ok(Self {
            metadata: ChangeListMetadata {
                tool: ToolInfo {
                    name: env!("CARGO_PKG_NAME").to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
                generated_at: comparison.generated_at.to_rfc3339(),
                old_version: comparison.old_version.clone(),
                new_version: comparison.new_version.clone(),
                mode: comparison.mode,
            },
            summary: ChangeSummary {
                total_changes: result.change_count(),
                added: result.added.len(),
                removed: result.removed.len(),
                modified: result.diffs.len(),
            },
            changes,
            skipped: result.skipped.iter().cloned().collect(),
        })
    }

    /// Read a change list written by [`JsonReporter`].
    pub fn from_path(path: &Path) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Paths with the given change kind.
    pub fn paths_of(&self, kind: ChangeKind) -> impl Iterator<Item = &str> {
        self.changes
            .iter()
            .filter(move |c| c.kind == kind)
            .map(|c| c.path.as_str())
    }
}
