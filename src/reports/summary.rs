//! Summary report generator for shell output.
//!
//! Provides a compact, human-readable summary for terminal usage.

use super::{ReportError, ReportFormat, ReportGenerator};
use crate::diff::{ChangeKind, VersionComparison};

/// Maximum number of paths listed per change kind.
const MAX_LISTED: usize = 10;

/// Apply ANSI color formatting if colored output is enabled.
pub(crate) fn ansi_color(text: &str, color: &str, colored: bool) -> String {
    if colored {
        match color {
            "red" => format!("\x1b[31m{text}\x1b[0m"),
            "green" => format!("\x1b[32m{text}\x1b[0m"),
            "yellow" => format!("\x1b[33m{text}\x1b[0m"),
            "cyan" => format!("\x1b[36m{text}\x1b[0m"),
            "bold" => format!("\x1b[1m{text}\x1b[0m"),
            "dim" => format!("\x1b[2m{text}\x1b[0m"),
            _ => text.to_string(),
        }
    } else {
        text.to_string()
    }
}

/// Summary reporter for shell output
pub struct SummaryReporter {
    /// Use colored output
    colored: bool,
}

impl SummaryReporter {
    /// Create a new summary reporter
    #[must_use]
    pub const fn new() -> Self {
        Self { colored: true }
    }

    /// Disable colored output
    #[must_use]
    pub const fn no_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        ansi_color(text, color, self.colored)
    }

    fn count_line(&self, count: usize, sign: &str, color: &str, verb: &str) -> String {
        format!(
            "  {} {} {verb}",
            self.color(&format!("{sign}{count}"), color),
            if count == 1 { "file" } else { "files" }
        )
    }
}

impl Default for SummaryReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for SummaryReporter {
    fn generate_comparison_report(
        &self,
        comparison: &VersionComparison,
    ) -> Result<String, ReportError> {
        let result = &comparison.result;
        let mut lines = Vec::new();

        // Header
        lines.push(self.color("Version Comparison Summary", "bold"));
        lines.push(self.color("─".repeat(40).as_str(), "dim"));
        lines.push(format!(
            "{}  {} → {}",
            self.color("Versions:", "cyan"),
            comparison.old_version,
            comparison.new_version
        ));
        lines.push(format!("{}  {}", self.color("Mode:", "cyan"), comparison.mode));
        lines.push(String::new());

        // Changes
        lines.push(self.color("Changes:", "bold"));
        let added = result.added.len();
        let removed = result.removed.len();
        let modified = result.diffs.len();

        if added > 0 {
            lines.push(self.count_line(added, "+", "green", "added"));
        }
        if removed > 0 {
            lines.push(self.count_line(removed, "-", "red", "removed"));
        }
        if modified > 0 {
            lines.push(self.count_line(modified, "~", "yellow", "modified"));
        }
        if added == 0 && removed == 0 && modified == 0 {
            lines.push(format!("  {}", self.color("No changes", "dim")));
        }
        if !result.skipped.is_empty() {
            lines.push(format!(
                "  {} unreadable, skipped",
                self.color(&format!("!{}", result.skipped.len()), "red")
            ));
        }

        // Paths
        let changes = result.changes();
        if !changes.is_empty() {
            lines.push(String::new());
            lines.push(self.color("Files:", "bold"));
            for (path, kind) in changes.iter().take(MAX_LISTED) {
                let (marker, color) = match kind {
                    ChangeKind::Added => ("+", "green"),
                    ChangeKind::Removed => ("-", "red"),
                    ChangeKind::Modified => ("~", "yellow"),
                };
                let detail = result
                    .diffs
                    .get(*path)
                    .map(|entry| format!(" {}", self.color(&format!("({})", entry.label()), "dim")))
                    .unwrap_or_default();
                lines.push(format!("  {} {path}{detail}", self.color(marker, color)));
            }
            if changes.len() > MAX_LISTED {
                lines.push(format!(
                    "  {}",
                    self.color(&format!("... and {} more", changes.len() - MAX_LISTED), "dim")
                ));
            }
        }

        lines.push(String::new());
        Ok(lines.join("\n"))
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::test_support::sample_comparison;

    #[test]
    fn test_summary_without_color() {
        let old = tempfile::tempdir().unwrap();
        let new = tempfile::tempdir().unwrap();
        let comparison = sample_comparison(old.path(), new.path());

        let report = SummaryReporter::new()
            .no_color()
            .generate_comparison_report(&comparison)
            .unwrap();

        assert!(!report.contains("\x1b["));
        assert!(report.contains("1.20 → 1.21"));
        assert!(report.contains("+1 file added"));
        assert!(report.contains("~2 files modified"));
        assert!(report.contains("~ b.bin (large)"));
    }

    #[test]
    fn test_summary_colored() {
        let old = tempfile::tempdir().unwrap();
        let new = tempfile::tempdir().unwrap();
        let comparison = sample_comparison(old.path(), new.path());

        let report = SummaryReporter::new()
            .generate_comparison_report(&comparison)
            .unwrap();
        assert!(report.contains("\x1b[32m+1\x1b[0m"));
    }

    #[test]
    fn test_ansi_color_passthrough() {
        assert_eq!(ansi_color("x", "red", false), "x");
        assert_eq!(ansi_color("x", "unknown", true), "x");
    }
}
