//! Markdown impact report for analysis results.

use super::ReportError;
use crate::diff::ChangeKind;
use crate::pipeline::{AnalysisResult, ImpactSeverity};
use std::fmt::Write as _;

/// Escape characters that would break a markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Markdown report generator for [`AnalysisResult`]s.
#[derive(Debug, Default)]
pub struct AnalysisReporter;

impl AnalysisReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Render the report: header, summary counts, impacted components,
    /// missing references and mod dependencies.
    pub fn generate(&self, result: &AnalysisResult) -> Result<String, ReportError> {
        let mut md = String::new();
        let structure = &result.structure;
        let changes = &result.changes;

        writeln!(md, "# Impact report: {}", structure.mod_id)?;
        writeln!(md)?;
        writeln!(md, "| | |")?;
        writeln!(md, "|---|---|")?;
        writeln!(md, "| Mod | {} {} |", escape_cell(&structure.mod_id), escape_cell(&structure.mod_version))?;
        if let Some(game) = &structure.game_version {
            writeln!(md, "| Built against | {} |", escape_cell(game))?;
        }
        writeln!(
            md,
            "| Upgrade | {} → {} |",
            escape_cell(&changes.old_version),
            escape_cell(&changes.new_version)
        )?;
        writeln!(md, "| Attempts | {} |", result.attempts)?;
        writeln!(md)?;

        writeln!(md, "## Summary")?;
        writeln!(md)?;
        let count = |severity: ImpactSeverity| {
            result
                .impacts
                .iter()
                .filter(|i| i.severity == severity)
                .count()
        };
        writeln!(md, "- Game files changed: {}", changes.changes.len())?;
        writeln!(
            md,
            "  - added {}, removed {}, modified {}",
            changes.count(ChangeKind::Added),
            changes.count(ChangeKind::Removed),
            changes.count(ChangeKind::Modified)
        )?;
        writeln!(md, "- Mod classes: {}", structure.classes.len())?;
        writeln!(md, "- Impacted components: {}", result.impacts.len())?;
        writeln!(
            md,
            "  - breaking {}, changed {}, added {}",
            count(ImpactSeverity::Breaking),
            count(ImpactSeverity::Changed),
            count(ImpactSeverity::Added)
        )?;
        writeln!(md)?;

        writeln!(md, "## Impacted components")?;
        writeln!(md)?;
        if result.impacts.is_empty() {
            writeln!(md, "No referenced game class changed.")?;
        } else {
            writeln!(md, "| Severity | Class | Changed file | Referenced by |")?;
            writeln!(md, "|---|---|---|---|")?;
            for impact in &result.impacts {
                let referenced_by: Vec<&str> =
                    impact.referenced_by.iter().map(String::as_str).collect();
                writeln!(
                    md,
                    "| {} | `{}` | `{}` | {} |",
                    impact.severity,
                    escape_cell(&impact.class_name),
                    escape_cell(&impact.path),
                    escape_cell(&referenced_by.join(", "))
                )?;
            }
        }
        writeln!(md)?;

        writeln!(md, "## Missing references")?;
        writeln!(md)?;
        if result.missing_references.is_empty() {
            writeln!(md, "None.")?;
        } else {
            for missing in &result.missing_references {
                writeln!(md, "- `{missing}`")?;
            }
        }
        writeln!(md)?;

        writeln!(md, "## Dependencies")?;
        writeln!(md)?;
        if structure.dependencies.is_empty() {
            writeln!(md, "None declared.")?;
        } else {
            for dep in &structure.dependencies {
                match &dep.version_range {
                    Some(range) => writeln!(md, "- {} `{range}`", dep.mod_id)?,
                    None => writeln!(md, "- {}", dep.mod_id)?,
                }
            }
        }

        Ok(md)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{
        AnalysisResult, ImpactedComponent, ModClass, ModDependency, ModStructure,
        VersionChangeList,
    };
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::PathBuf;

    fn sample_result() -> AnalysisResult {
        let mut changes = BTreeMap::new();
        changes.insert("a/Gone.java".to_string(), ChangeKind::Removed);
        changes.insert("a/Tweaked.java".to_string(), ChangeKind::Modified);

        AnalysisResult {
            structure: ModStructure {
                mod_id: "examplemod".to_string(),
                mod_version: "2.1.0".to_string(),
                game_version: Some("1.20".to_string()),
                classes: vec![ModClass {
                    name: "m/Hook".to_string(),
                    references: vec!["a.Gone".to_string(), "a.Tweaked".to_string()],
                }],
                dependencies: vec![ModDependency {
                    mod_id: "fabric-api".to_string(),
                    version_range: Some(">=0.90".to_string()),
                }],
            },
            changes: VersionChangeList {
                old_version: "1.20".to_string(),
                new_version: "1.21".to_string(),
                changes,
            },
            impacts: vec![
                ImpactedComponent {
                    class_name: "a/Gone".to_string(),
                    path: "a/Gone.java".to_string(),
                    change: ChangeKind::Removed,
                    severity: ImpactSeverity::Breaking,
                    referenced_by: BTreeSet::from(["m/Hook".to_string()]),
                },
                ImpactedComponent {
                    class_name: "a/Tweaked".to_string(),
                    path: "a/Tweaked.java".to_string(),
                    change: ChangeKind::Modified,
                    severity: ImpactSeverity::Changed,
                    referenced_by: BTreeSet::from(["m/Hook".to_string()]),
                },
            ],
            missing_references: BTreeSet::from(["a/Gone".to_string()]),
            report_path: PathBuf::from("examplemod-1.20-to-1.21.md"),
            attempts: 2,
        }
    }

    #[test]
    fn test_report_sections() {
        let md = AnalysisReporter::new().generate(&sample_result()).unwrap();

        assert!(md.starts_with("# Impact report: examplemod\n"));
        assert!(md.contains("| Upgrade | 1.20 → 1.21 |"));
        assert!(md.contains("| Attempts | 2 |"));
        assert!(md.contains("  - breaking 1, changed 1, added 0"));
        assert!(md.contains("| breaking | `a/Gone` | `a/Gone.java` | m/Hook |"));
        assert!(md.contains("## Missing references\n\n- `a/Gone`"));
        assert!(md.contains("- fabric-api `>=0.90`"));
    }

    #[test]
    fn test_empty_impacts() {
        let mut result = sample_result();
        result.impacts.clear();
        result.missing_references.clear();
        result.structure.dependencies.clear();

        let md = AnalysisReporter::new().generate(&result).unwrap();
        assert!(md.contains("No referenced game class changed."));
        assert!(md.contains("## Missing references\n\nNone."));
        assert!(md.contains("None declared."));
    }

    #[test]
    fn test_escape_cell() {
        assert_eq!(escape_cell("a|b\nc"), "a\\|b c");
    }
}
