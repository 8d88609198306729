//! Report generation for comparison and analysis results.
//!
//! Output formats for a [`VersionComparison`]:
//! - Text: header, statistics and one block per changed file
//! - JSON: machine-readable change list, consumed by the analysis pipeline
//! - Summary: compact shell-friendly output
//!
//! Analysis results are rendered as Markdown by [`AnalysisReporter`].

mod analysis;
mod json;
mod summary;
mod text;
mod types;

pub use analysis::AnalysisReporter;
pub use json::{
    ChangeListMetadata, ChangeListReport, ChangeRecord, ChangeSummary, DiffDetail, JsonReporter,
    ToolInfo,
};
pub use summary::SummaryReporter;
pub use text::TextReporter;
pub use types::ReportFormat;

use crate::diff::VersionComparison;
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during report generation
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Format error: {0}")]
    FormatError(#[from] std::fmt::Error),
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<ReportError> for crate::error::ModshiftError {
    fn from(err: ReportError) -> Self {
        Self::report(err.to_string())
    }
}

/// Trait for comparison report generators
pub trait ReportGenerator {
    /// Render a report for a comparison
    fn generate_comparison_report(
        &self,
        comparison: &VersionComparison,
    ) -> Result<String, ReportError>;

    /// Write report to a writer
    fn write_comparison_report(
        &self,
        comparison: &VersionComparison,
        writer: &mut dyn Write,
    ) -> Result<(), ReportError> {
        let report = self.generate_comparison_report(comparison)?;
        writer.write_all(report.as_bytes())?;
        Ok(())
    }

    /// Get the format this generator produces
    fn format(&self) -> ReportFormat;
}

/// Create a report generator for the given format
#[must_use]
pub fn create_reporter(format: ReportFormat, use_color: bool) -> Box<dyn ReportGenerator> {
    match format {
        ReportFormat::Auto | ReportFormat::Summary => {
            if use_color {
                Box::new(SummaryReporter::new())
            } else {
                Box::new(SummaryReporter::new().no_color())
            }
        }
        ReportFormat::Json => Box::new(JsonReporter::new()),
        ReportFormat::Text => Box::new(TextReporter::new()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::diff::{ComparisonMode, ComparisonResult, DiffEntry, VersionComparison};
    use std::path::Path;

    /// A comparison over real trees: `a.txt` modified, `b.bin` large,
    /// `new.txt` added and `old.json` removed.
    pub fn sample_comparison(old_root: &Path, new_root: &Path) -> VersionComparison {
        std::fs::write(old_root.join("a.txt"), "v1\n").unwrap();
        std::fs::write(new_root.join("a.txt"), "v2\n").unwrap();
        std::fs::write(new_root.join("new.txt"), "brand new\n").unwrap();
        std::fs::write(old_root.join("old.json"), "{\"gone\": true}\n").unwrap();

        let mut result = ComparisonResult::new();
        result.insert_diff(
            "a.txt",
            DiffEntry::TextModified {
                diff_text: crate::diff::render_unified_diff("a/a.txt", "b/a.txt", "v1\n", "v2\n"),
            },
        );
        result.insert_diff("b.bin", DiffEntry::ContentModifiedAtOffset { offset: 10_485_759 });
        result.mark_added("new.txt");
        result.mark_removed("old.json");

        VersionComparison {
            old_version: "1.20".to_string(),
            new_version: "1.21".to_string(),
            old_root: old_root.to_path_buf(),
            new_root: new_root.to_path_buf(),
            mode: ComparisonMode::Full,
            generated_at: chrono::Utc::now(),
            result,
        }
    }
}
