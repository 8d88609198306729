//! Version tree comparison engine.

use super::content::ContentDiffer;
use super::fingerprint::FingerprintCache;
use super::result::{ComparisonMode, ComparisonResult, VersionComparison};
use super::state::{ComparisonState, ComparisonStateStore};
use super::walk::{ensure_tree_root, list_files, TreeListing};
use crate::config::{CompareConfig, DEFAULT_STATE_TTL_HOURS};
use crate::error::{ErrorContext, ModshiftError, Result};
use crate::utils::{key_to_path, validate_version_id};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of classifying a single path.
enum PathOutcome {
    Added,
    Removed,
    Diff(super::DiffEntry),
    Identical,
    Skipped,
}

/// Compares two extracted version trees.
///
/// Holds the fingerprint cache shared by all comparisons it runs and,
/// optionally, a state store enabling incremental comparisons.
pub struct ComparisonEngine {
    pub(super) differ: ContentDiffer,
    pub(super) fingerprints: Arc<FingerprintCache>,
    store: Option<Arc<ComparisonStateStore>>,
    state_ttl: Duration,
}

impl ComparisonEngine {
    /// Create an engine without persisted state.
    #[must_use]
    pub fn new(config: &CompareConfig) -> Self {
        Self {
            differ: ContentDiffer::new(config),
            fingerprints: Arc::new(FingerprintCache::new()),
            store: None,
            state_ttl: Duration::from_secs(DEFAULT_STATE_TTL_HOURS * 3600),
        }
    }

    /// Load and save comparison state through `store`.
    #[must_use]
    pub fn with_state_store(mut self, store: Arc<ComparisonStateStore>, ttl: Duration) -> Self {
        self.store = Some(store);
        self.state_ttl = ttl;
        self
    }

    /// Share a fingerprint cache with other engines.
    #[must_use]
    pub fn with_fingerprint_cache(mut self, cache: Arc<FingerprintCache>) -> Self {
        self.fingerprints = cache;
        self
    }

    pub fn fingerprint_cache(&self) -> &Arc<FingerprintCache> {
        &self.fingerprints
    }

    pub fn state_store(&self) -> Option<&Arc<ComparisonStateStore>> {
        self.store.as_ref()
    }

    /// Full comparison of two trees.
    pub fn compare(&self, old_dir: &Path, new_dir: &Path) -> Result<ComparisonResult> {
        self.full_result(old_dir, new_dir).map(|(result, _)| result)
    }

    /// Full comparison that also hashes the new tree into a fresh state.
    pub fn compare_full(
        &self,
        old_dir: &Path,
        new_dir: &Path,
    ) -> Result<(ComparisonResult, ComparisonState)> {
        let (result, new_files) = self.full_result(old_dir, new_dir)?;
        let state = ComparisonState::new(self.hash_listing(&new_files, &BTreeMap::new()));
        Ok((result, state))
    }

    fn full_result(
        &self,
        old_dir: &Path,
        new_dir: &Path,
    ) -> Result<(ComparisonResult, TreeListing)> {
        ensure_tree_root(old_dir, "old")?;
        ensure_tree_root(new_dir, "new")?;
        let old_files = list_files(old_dir)?;
        let new_files = list_files(new_dir)?;

        let mut result = ComparisonResult::new();
        for key in new_files.keys().filter(|k| !old_files.contains_key(*k)) {
            result.mark_added(key.clone());
        }
        for key in old_files.keys().filter(|k| !new_files.contains_key(*k)) {
            result.mark_removed(key.clone());
        }

        let common: Vec<&String> = old_files
            .keys()
            .filter(|k| new_files.contains_key(*k))
            .collect();
        tracing::debug!(
            added = result.added.len(),
            removed = result.removed.len(),
            common = common.len(),
            "full comparison"
        );
        result.absorb(self.classify(old_dir, new_dir, common));
        Ok((result, new_files))
    }

    /// Compare two named versions, reusing stored state when it is fresh.
    ///
    /// The freshly computed state is saved afterwards; a failed save is
    /// logged and does not fail the comparison.
    pub fn compare_versions(
        &self,
        old_version: &str,
        new_version: &str,
        old_dir: &Path,
        new_dir: &Path,
        force_full: bool,
    ) -> Result<VersionComparison> {
        validate_version_id(old_version).map_err(ModshiftError::validation)?;
        validate_version_id(new_version).map_err(ModshiftError::validation)?;

        let stored = match (&self.store, force_full) {
            (Some(store), false) => store.load(old_version, new_version),
            _ => None,
        };
        let now = chrono::Utc::now();
        let fresh = stored.filter(|state| {
            let stale = state.is_stale(self.state_ttl, now.timestamp_millis());
            if stale {
                tracing::info!(
                    old = old_version,
                    new = new_version,
                    age_secs = state.age(now.timestamp_millis()).as_secs(),
                    "stored state is stale, running a full comparison"
                );
            }
            !stale
        });

        let context = || format!("comparing {old_version} -> {new_version}");
        let (mode, (result, state)) = match fresh {
            Some(state) => (
                ComparisonMode::Incremental,
                self.compare_incremental(old_dir, new_dir, &state)
                    .with_context(context)?,
            ),
            None => (
                ComparisonMode::Full,
                self.compare_full(old_dir, new_dir).with_context(context)?,
            ),
        };

        let cache = self.fingerprints.stats();
        tracing::info!(
            old = old_version,
            new = new_version,
            %mode,
            added = result.added.len(),
            removed = result.removed.len(),
            modified = result.diffs.len(),
            skipped = result.skipped.len(),
            fingerprint_hits = cache.hits,
            fingerprint_misses = cache.misses,
            "comparison complete"
        );

        if let Some(store) = &self.store {
            if let Err(e) = store.save(old_version, new_version, &state) {
                tracing::warn!("{e}");
            }
        }

        Ok(VersionComparison {
            old_version: old_version.to_string(),
            new_version: new_version.to_string(),
            old_root: old_dir.to_path_buf(),
            new_root: new_dir.to_path_buf(),
            mode,
            generated_at: now,
            result,
        })
    }

    /// Classify each key against both trees in parallel.
    ///
    /// Per-file read failures are logged and recorded as skipped.
    pub(super) fn classify<'a, I>(
        &self,
        old_dir: &Path,
        new_dir: &Path,
        keys: I,
    ) -> ComparisonResult
    where
        I: IntoIterator<Item = &'a String>,
    {
        let keys: Vec<&String> = keys.into_iter().collect();
        let outcomes: Vec<(&String, PathOutcome)> = keys
            .par_iter()
            .map(|key| (*key, self.classify_one(old_dir, new_dir, key)))
            .collect();

        let mut result = ComparisonResult::new();
        for (key, outcome) in outcomes {
            match outcome {
                PathOutcome::Added => result.mark_added(key.clone()),
                PathOutcome::Removed => result.mark_removed(key.clone()),
                PathOutcome::Diff(entry) => result.insert_diff(key.clone(), entry),
                PathOutcome::Skipped => result.mark_skipped(key.clone()),
                PathOutcome::Identical => {}
            }
        }
        result
    }

    fn classify_one(&self, old_dir: &Path, new_dir: &Path, key: &str) -> PathOutcome {
        let old_path = key_to_path(old_dir, key);
        let new_path = key_to_path(new_dir, key);
        // A listed key missing on both sides vanished after listing; the
        // differ reports that as a read failure.
        match (old_path.is_file(), new_path.is_file()) {
            (false, true) => PathOutcome::Added,
            (true, false) => PathOutcome::Removed,
            _ => match self.differ.diff_file(key, &old_path, &new_path) {
                Ok(Some(entry)) => PathOutcome::Diff(entry),
                Ok(None) => PathOutcome::Identical,
                Err(e) => {
                    tracing::warn!(path = key, "skipping file: {e}");
                    PathOutcome::Skipped
                }
            },
        }
    }

    /// Hash every file of a listing, reusing `known` digests where present.
    ///
    /// Files that cannot be read are left out so the next incremental
    /// comparison treats them as changed.
    pub(super) fn hash_listing(
        &self,
        files: &TreeListing,
        known: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        files
            .par_iter()
            .filter_map(|(key, path)| {
                if let Some(hash) = known.get(key) {
                    return Some((key.clone(), hash.clone()));
                }
                match self.fingerprints.hash(path) {
                    Ok(hash) => Some((key.clone(), hash)),
                    Err(e) => {
                        tracing::warn!(path = key.as_str(), "not recorded in state: {e}");
                        None
                    }
                }
            })
            .collect()
    }
}
