//! The three analysis stages.
//!
//! 1. [`analyze_structure`] reads the mod analysis report.
//! 2. [`analyze_changes`] reads the version change list written by `compare`.
//! 3. [`correlate_impacts`] matches the classes the mod references against
//!    the changed paths.

use super::PipelineError;
use crate::diff::ChangeKind;
use crate::reports::ChangeListReport;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

// ============================================================================
// Stage 1: mod structure
// ============================================================================

/// Structure of a mod as described by its analysis report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModStructure {
    pub mod_id: String,
    pub mod_version: String,
    #[serde(default)]
    pub game_version: Option<String>,
    #[serde(default)]
    pub classes: Vec<ModClass>,
    #[serde(default)]
    pub dependencies: Vec<ModDependency>,
}

/// A class shipped by the mod and the game classes it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModClass {
    pub name: String,
    #[serde(default)]
    pub references: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModDependency {
    pub mod_id: String,
    #[serde(default)]
    pub version_range: Option<String>,
}

impl ModStructure {
    /// Number of distinct normalised class references.
    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.classes
            .iter()
            .flat_map(|c| c.references.iter())
            .filter_map(|r| normalize_class_reference(r))
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Parse and validate a mod analysis report.
pub fn analyze_structure(path: &Path) -> Result<ModStructure, PipelineError> {
    let failed = |source: anyhow::Error| PipelineError::StructureFailed {
        path: path.to_path_buf(),
        source,
    };

    let content = std::fs::read_to_string(path)
        .context("reading mod report")
        .map_err(failed)?;
    let structure: ModStructure = serde_json::from_str(&content)
        .context("parsing mod report")
        .map_err(failed)?;
    if structure.mod_id.trim().is_empty() {
        return Err(failed(anyhow::anyhow!("mod_id must not be empty")));
    }

    tracing::debug!(
        mod_id = %structure.mod_id,
        classes = structure.classes.len(),
        "mod structure loaded"
    );
    Ok(structure)
}

// ============================================================================
// Stage 2: version changes
// ============================================================================

/// Changed paths between two game versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChangeList {
    pub old_version: String,
    pub new_version: String,
    pub changes: BTreeMap<String, ChangeKind>,
}

impl VersionChangeList {
    #[must_use]
    pub fn from_report(report: &ChangeListReport) -> Self {
        Self {
            old_version: report.metadata.old_version.clone(),
            new_version: report.metadata.new_version.clone(),
            changes: report
                .changes
                .iter()
                .map(|c| (c.path.clone(), c.kind))
                .collect(),
        }
    }

    #[must_use]
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.values().filter(|k| **k == kind).count()
    }

    /// Changed paths keyed by their extension-stripped form.
    fn by_class_key(&self) -> BTreeMap<&str, Vec<(&str, ChangeKind)>> {
        let mut index: BTreeMap<&str, Vec<(&str, ChangeKind)>> = BTreeMap::new();
        for (path, kind) in &self.changes {
            index
                .entry(strip_extension(path))
                .or_default()
                .push((path.as_str(), *kind));
        }
        index
    }
}

/// Parse a change list written by `compare --output json`.
pub fn analyze_changes(path: &Path) -> Result<VersionChangeList, PipelineError> {
    let report = ChangeListReport::from_path(path).map_err(|e| PipelineError::ChangesFailed {
        path: path.to_path_buf(),
        source: anyhow::Error::new(e).context("reading change list"),
    })?;
    let changes = VersionChangeList::from_report(&report);
    tracing::debug!(
        old = %changes.old_version,
        new = %changes.new_version,
        changes = changes.changes.len(),
        "version changes loaded"
    );
    Ok(changes)
}

// ============================================================================
// Stage 3: impact correlation
// ============================================================================

/// Per-run analysis state.
#[derive(Debug, Default, Clone)]
pub struct AnalysisContext {
    /// Referenced game classes whose files were removed
    pub missing_references: BTreeSet<String>,
}

/// How badly a change affects a referencing mod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactSeverity {
    /// Referenced class was removed
    Breaking,
    /// Referenced class was modified
    Changed,
    /// Referenced class was added (the mod may be shadowing it)
    Added,
}

impl ImpactSeverity {
    #[must_use]
    pub const fn from_change(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Removed => Self::Breaking,
            ChangeKind::Modified => Self::Changed,
            ChangeKind::Added => Self::Added,
        }
    }
}

impl std::fmt::Display for ImpactSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Breaking => write!(f, "breaking"),
            Self::Changed => write!(f, "changed"),
            Self::Added => write!(f, "added"),
        }
    }
}

/// A changed game file referenced by the mod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactedComponent {
    /// Normalised class name (`a/b/C`)
    pub class_name: String,
    /// Changed path in the version tree
    pub path: String,
    pub change: ChangeKind,
    pub severity: ImpactSeverity,
    /// Mod classes referencing it
    pub referenced_by: BTreeSet<String>,
}

/// Normalise a class reference to the `a/b/C` form used by tree paths.
///
/// Accepts dotted names, JVM descriptors (`La/b/C;`, array prefixes) and
/// inner classes, which resolve to their outer class file.
#[must_use]
pub fn normalize_class_reference(reference: &str) -> Option<String> {
    let mut name = reference.trim().trim_start_matches('[');
    if let Some(inner) = name.strip_prefix('L').and_then(|n| n.strip_suffix(';')) {
        name = inner;
    }
    if let Some(cut) = name.find('$') {
        name = &name[..cut];
    }
    let normalized = name.replace('.', "/");
    let normalized = normalized.trim_matches('/');
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

fn strip_extension(path: &str) -> &str {
    let file_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => &path[..file_start + dot],
        _ => path,
    }
}

/// Match mod class references against changed paths.
///
/// One [`ImpactedComponent`] is produced per (referenced class, changed
/// path), sorted by severity then class name. Removed targets are recorded
/// in `context.missing_references`.
pub fn correlate_impacts(
    structure: &ModStructure,
    changes: &VersionChangeList,
    context: &mut AnalysisContext,
) -> Vec<ImpactedComponent> {
    let index = changes.by_class_key();
    let mut impacts: BTreeMap<(String, String), ImpactedComponent> = BTreeMap::new();

    for class in &structure.classes {
        for reference in &class.references {
            let Some(target) = normalize_class_reference(reference) else {
                tracing::debug!(class = %class.name, reference = %reference, "ignoring empty reference");
                continue;
            };
            let Some(hits) = index.get(target.as_str()) else {
                continue;
            };
            for (path, kind) in hits {
                if *kind == ChangeKind::Removed {
                    context.missing_references.insert(target.clone());
                }
                impacts
                    .entry((target.clone(), (*path).to_string()))
                    .or_insert_with(|| ImpactedComponent {
                        class_name: target.clone(),
                        path: (*path).to_string(),
                        change: *kind,
                        severity: ImpactSeverity::from_change(*kind),
                        referenced_by: BTreeSet::new(),
                    })
                    .referenced_by
                    .insert(class.name.clone());
            }
        }
    }

    let mut impacts: Vec<ImpactedComponent> = impacts.into_values().collect();
    impacts.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.class_name.cmp(&b.class_name))
            .then_with(|| a.path.cmp(&b.path))
    });
    tracing::debug!(
        impacts = impacts.len(),
        missing = context.missing_references.len(),
        "impacts correlated"
    );
    impacts
}


#[cfg(test)]
mod tests {
    use super::test_support::write_inputs;
    use super::*;

    #[test]
    fn test_normalize_class_reference() {
        assert_eq!(
            normalize_class_reference("net.minecraft.entity.Entity").as_deref(),
            Some("net/minecraft/entity/Entity")
        );
        assert_eq!(
            normalize_class_reference("Lnet/minecraft/world/World;").as_deref(),
            Some("net/minecraft/world/World")
        );
        assert_eq!(
            normalize_class_reference("[Lnet/minecraft/Item;").as_deref(),
            Some("net/minecraft/Item")
        );
        assert_eq!(
            normalize_class_reference("a/b/Outer$Inner$Deep").as_deref(),
            Some("a/b/Outer")
        );
        assert_eq!(normalize_class_reference("  "), None);
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("a/b/C.java"), "a/b/C");
        assert_eq!(strip_extension("a/b.d/C"), "a/b.d/C");
        assert_eq!(strip_extension("a/.hidden"), "a/.hidden");
        assert_eq!(strip_extension("C.tar.gz"), "C.tar");
    }

    #[test]
    fn test_analyze_structure_rejects_empty_mod_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod.json");
        std::fs::write(&path, r#"{"mod_id": " ", "mod_version": "1.0"}"#).unwrap();
        assert!(matches!(
            analyze_structure(&path),
            Err(PipelineError::StructureFailed { .. })
        ));
    }

    #[test]
    fn test_analyze_structure_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = analyze_structure(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_analyze_changes_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            analyze_changes(&path),
            Err(PipelineError::ChangesFailed { .. })
        ));
    }

    #[test]
    fn test_correlation_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let (mod_report, change_report) = write_inputs(dir.path());
        let structure = analyze_structure(&mod_report).unwrap();
        let changes = analyze_changes(&change_report).unwrap();
        assert_eq!(structure.reference_count(), 3);
        assert_eq!(changes.count(ChangeKind::Modified), 2);

        let mut context = AnalysisContext::default();
        let impacts = correlate_impacts(&structure, &changes, &mut context);

        // Gui removed, Entity modified in two files.
        assert_eq!(impacts.len(), 3);
        assert_eq!(impacts[0].class_name, "net/minecraft/client/Gui");
        assert_eq!(impacts[0].severity, ImpactSeverity::Breaking);

        let entity: Vec<_> = impacts
            .iter()
            .filter(|i| i.class_name == "net/minecraft/entity/Entity")
            .collect();
        assert_eq!(entity.len(), 2);
        assert!(entity.iter().all(|i| i.referenced_by.len() == 2));

        assert_eq!(
            context.missing_references.into_iter().collect::<Vec<_>>(),
            vec!["net/minecraft/client/Gui".to_string()]
        );
    }

    #[test]
    fn test_contexts_are_independent_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let (mod_report, change_report) = write_inputs(dir.path());
        let structure = analyze_structure(&mod_report).unwrap();
        let changes = analyze_changes(&change_report).unwrap();

        let mut first = AnalysisContext::default();
        correlate_impacts(&structure, &changes, &mut first);

        let unchanged = VersionChangeList {
            old_version: "1.21".to_string(),
            new_version: "1.21.1".to_string(),
            changes: BTreeMap::new(),
        };
        let mut second = AnalysisContext::default();
        let impacts = correlate_impacts(&structure, &unchanged, &mut second);
        assert!(impacts.is_empty());
        assert!(second.missing_references.is_empty());
        assert_eq!(first.missing_references.len(), 1);
    }
}
