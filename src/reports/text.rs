//! Full plain-text comparison report.
//!
//! Layout: a header naming both versions, a statistics block, then one block
//! per changed path in path order. Text files carry their complete old and
//! new contents followed by the unified diff; binary and large files get a
//! one-line notice.

use super::{ReportError, ReportFormat, ReportGenerator};
use crate::diff::{unpack_records, ChangeKind, DiffEntry, VersionComparison};
use crate::utils::key_to_path;
use std::fmt::Write as _;
use std::path::Path;

const RULE: &str =
    "================================================================================";
const THIN_RULE: &str =
    "--------------------------------------------------------------------------------";

/// Text report generator
pub struct TextReporter {
    /// Include full file contents for modified text files
    include_contents: bool,
}

impl TextReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            include_contents: true,
        }
    }

    /// Omit old/new contents, keeping only the diffs
    #[must_use]
    pub const fn diffs_only(mut self) -> Self {
        self.include_contents = false;
        self
    }

    fn write_header(out: &mut String, comparison: &VersionComparison) -> std::fmt::Result {
        writeln!(out, "{RULE}")?;
        writeln!(
            out,
            "Version comparison: {} -> {}",
            comparison.old_version, comparison.new_version
        )?;
        writeln!(out, "{RULE}")?;
        writeln!(out, "Old tree:  {}", comparison.old_root.display())?;
        writeln!(out, "New tree:  {}", comparison.new_root.display())?;
        writeln!(out, "Mode:      {}", comparison.mode)?;
        writeln!(out, "Generated: {}", comparison.generated_at.to_rfc3339())?;
        writeln!(out)
    }

    fn write_statistics(out: &mut String, comparison: &VersionComparison) -> std::fmt::Result {
        let result = &comparison.result;
        writeln!(out, "Statistics")?;
        writeln!(out, "{THIN_RULE}")?;
        writeln!(out, "Total changes: {}", result.change_count())?;
        writeln!(out, "  Added:    {}", result.added.len())?;
        writeln!(out, "  Removed:  {}", result.removed.len())?;
        writeln!(out, "  Modified: {}", result.diffs.len())?;
        if !result.skipped.is_empty() {
            writeln!(out, "  Skipped:  {} (unreadable)", result.skipped.len())?;
        }
        writeln!(out)
    }

    fn write_file_block(
        &self,
        out: &mut String,
        comparison: &VersionComparison,
        path: &str,
        kind: ChangeKind,
    ) -> std::fmt::Result {
        writeln!(out, "{RULE}")?;
        writeln!(out, "[{}] {path}", kind.to_string().to_uppercase())?;
        writeln!(out, "{RULE}")?;

        match kind {
            ChangeKind::Added => writeln!(out, "File only present in {}", comparison.new_version)?,
            ChangeKind::Removed => {
                writeln!(out, "File only present in {}", comparison.old_version)?;
            }
            ChangeKind::Modified => match comparison.result.diffs.get(path) {
                Some(DiffEntry::TextModified { diff_text }) => {
                    if self.include_contents {
                        write_contents(out, "Old content", &comparison.old_root, path)?;
                        write_contents(out, "New content", &comparison.new_root, path)?;
                    }
                    writeln!(out, "--- Diff ---")?;
                    out.push_str(diff_text);
                    if !diff_text.ends_with('\n') {
                        writeln!(out)?;
                    }
                }
                Some(DiffEntry::BinaryModified { encoded_chunks }) => {
                    match unpack_records(encoded_chunks) {
                        Ok(records) => writeln!(
                            out,
                            "Binary file modified: {} differing chunk(s)",
                            records.len()
                        )?,
                        Err(e) => writeln!(out, "Binary file modified (chunk data unreadable: {e})")?,
                    }
                }
                Some(DiffEntry::ContentModifiedAtOffset { offset }) => writeln!(
                    out,
                    "Large file modified: first difference at byte offset {offset}"
                )?,
                None => writeln!(out, "File modified")?,
            },
        }
        writeln!(out)
    }
}

fn write_contents(out: &mut String, title: &str, root: &Path, key: &str) -> std::fmt::Result {
    writeln!(out, "--- {title} ---")?;
    match std::fs::read_to_string(key_to_path(root, key)) {
        Ok(content) => {
            out.push_str(&content);
            if !content.is_empty() && !content.ends_with('\n') {
                writeln!(out)?;
            }
        }
        Err(e) => writeln!(out, "(content unavailable: {e})")?,
    }
    Ok(())
}

impl Default for TextReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for TextReporter {
    fn generate_comparison_report(
        &self,
        comparison: &VersionComparison,
    ) -> Result<String, ReportError> {
        let mut out = String::new();
        Self::write_header(&mut out, comparison)?;
        Self::write_statistics(&mut out, comparison)?;

        let changes = comparison.result.changes();
        if changes.is_empty() {
            writeln!(out, "No changes detected.")?;
        }
        for (path, kind) in changes {
            self.write_file_block(&mut out, comparison, path, kind)?;
        }
        Ok(out)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::test_support::sample_comparison;

    #[test]
    fn test_sections_in_order() {
        let old = tempfile::tempdir().unwrap();
        let new = tempfile::tempdir().unwrap();
        let comparison = sample_comparison(old.path(), new.path());

        let report = TextReporter::new()
            .generate_comparison_report(&comparison)
            .unwrap();

        let header = report.find("Version comparison: 1.20 -> 1.21").unwrap();
        let stats = report.find("Statistics").unwrap();
        let first_block = report.find("[MODIFIED] a.txt").unwrap();
        let large_block = report.find("[MODIFIED] b.bin").unwrap();
        assert!(header < stats && stats < first_block && first_block < large_block);

        assert!(report.contains("Total changes: 4"));
        assert!(report.contains("--- Old content ---\nv1\n"));
        assert!(report.contains("--- New content ---\nv2\n"));
        assert!(report.contains("-v1\n"));
        assert!(report.contains("first difference at byte offset 10485759"));
        assert!(report.contains("[ADDED] new.txt"));
        assert!(report.contains("[REMOVED] old.json"));
    }

    #[test]
    fn test_diffs_only_omits_contents() {
        let old = tempfile::tempdir().unwrap();
        let new = tempfile::tempdir().unwrap();
        let comparison = sample_comparison(old.path(), new.path());

        let report = TextReporter::new()
            .diffs_only()
            .generate_comparison_report(&comparison)
            .unwrap();
        assert!(!report.contains("--- Old content ---"));
        assert!(report.contains("--- Diff ---"));
    }

    #[test]
    fn test_missing_content_is_noted() {
        let old = tempfile::tempdir().unwrap();
        let new = tempfile::tempdir().unwrap();
        let comparison = sample_comparison(old.path(), new.path());
        std::fs::remove_file(old.path().join("a.txt")).unwrap();

        let report = TextReporter::new()
            .generate_comparison_report(&comparison)
            .unwrap();
        assert!(report.contains("(content unavailable:"));
    }
}
