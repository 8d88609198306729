//! Incremental comparison against stored state.
//!
//! A stored [`ComparisonState`] holds the content hashes of the new tree from
//! the last comparison of a version pair. The old tree is hashed (through the
//! fingerprint cache) and matched against those hashes:
//!
//! 1. An old-tree path whose hash equals the stored one is assumed identical
//!    in the new tree and is not compared again.
//! 2. Any other old-tree path, and every new-tree path missing from the old
//!    tree, is changed and goes through the per-file comparator.
//!
//! With a state produced from the same two trees the result equals a full
//! comparison.

use super::engine::ComparisonEngine;
use super::result::ComparisonResult;
use super::state::ComparisonState;
use super::walk::{ensure_tree_root, list_files};
use crate::error::Result;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Split of the old tree against a stored state.
#[derive(Debug, Default)]
pub(crate) struct ChangeSet {
    /// Paths that must be compared
    pub changed: BTreeSet<String>,
    /// Paths assumed identical, with their hash
    pub unchanged: BTreeMap<String, String>,
}

impl ComparisonEngine {
    /// Compare two trees, skipping paths whose old content matches `state`.
    ///
    /// Returns the result together with the state for the next run. The
    /// returned state keeps the timestamp of `state`, so reused hashes age
    /// out once the TTL has passed since the last full comparison.
    pub fn compare_incremental(
        &self,
        old_dir: &Path,
        new_dir: &Path,
        state: &ComparisonState,
    ) -> Result<(ComparisonResult, ComparisonState)> {
        ensure_tree_root(old_dir, "old")?;
        ensure_tree_root(new_dir, "new")?;
        let old_files = list_files(old_dir)?;
        let new_files = list_files(new_dir)?;

        let old_hashes: Vec<(&String, Option<String>)> = old_files
            .par_iter()
            .map(|(key, path)| (key, self.fingerprints.hash(path).ok()))
            .collect();

        let mut changes = ChangeSet::default();
        for (key, hash) in old_hashes {
            match (hash, state.file_hashes.get(key)) {
                (Some(hash), Some(stored)) if hash == *stored && new_files.contains_key(key) => {
                    changes.unchanged.insert(key.clone(), hash);
                }
                _ => {
                    changes.changed.insert(key.clone());
                }
            }
        }
        for key in new_files.keys().filter(|k| !old_files.contains_key(*k)) {
            changes.changed.insert(key.clone());
        }

        tracing::debug!(
            changed = changes.changed.len(),
            unchanged = changes.unchanged.len(),
            "incremental comparison"
        );

        let result = self.classify(old_dir, new_dir, &changes.changed);
        let next = ComparisonState::with_timestamp(
            self.hash_listing(&new_files, &changes.unchanged),
            state.timestamp_millis,
        );
        Ok((result, next))
    }
}
