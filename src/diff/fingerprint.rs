//! Content fingerprints with mtime-validated memoisation.
//!
//! Hashing a decompiled game tree is the dominant cost of a comparison, so
//! digests are kept per absolute path and reused for as long as the file's
//! modification time is unchanged.

use crate::error::{ModshiftError, Result};
use crate::utils::{sha256_reader, system_time_millis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Digest of a file at a given modification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFingerprint {
    /// Canonical absolute path
    pub path: PathBuf,
    /// Lowercase hex SHA-256 of the full content
    pub hash: String,
    /// Modification time the hash was computed at (epoch millis)
    pub last_modified_millis: i64,
}

/// Lookup statistics for the fingerprint cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FingerprintStats {
    pub lookups: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Thread-safe, unbounded cache of file fingerprints.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    entries: RwLock<HashMap<PathBuf, FileFingerprint>>,
    stats: RwLock<FingerprintStats>,
}

impl FingerprintCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// SHA-256 of the file content, reusing a cached digest while the
    /// modification time is unchanged.
    pub fn hash(&self, path: &Path) -> Result<String> {
        self.fingerprint(path).map(|fp| fp.hash)
    }

    /// Full fingerprint for a file.
    pub fn fingerprint(&self, path: &Path) -> Result<FileFingerprint> {
        let canonical = path
            .canonicalize()
            .map_err(|e| ModshiftError::io_read(path, e))?;
        let modified = canonical
            .metadata()
            .and_then(|m| m.modified())
            .map_err(|e| ModshiftError::io_read(path, e))?;
        let mtime = system_time_millis(modified);

        let cached = {
            let entries = self.entries.read().expect("fingerprint lock poisoned");
            entries
                .get(&canonical)
                .filter(|fp| fp.last_modified_millis == mtime)
                .cloned()
        };

        {
            let mut stats = self.stats.write().expect("stats lock poisoned");
            stats.lookups += 1;
            if cached.is_some() {
                stats.hits += 1;
            } else {
                stats.misses += 1;
            }
        }

        if let Some(fp) = cached {
            return Ok(fp);
        }

        let file = File::open(&canonical).map_err(|e| ModshiftError::io_read(path, e))?;
        let hash =
            sha256_reader(BufReader::new(file)).map_err(|e| ModshiftError::io_read(path, e))?;
        tracing::trace!(path = %canonical.display(), %hash, "hashed file");

        let fingerprint = FileFingerprint {
            path: canonical.clone(),
            hash,
            last_modified_millis: mtime,
        };
        self.entries
            .write()
            .expect("fingerprint lock poisoned")
            .insert(canonical, fingerprint.clone());
        Ok(fingerprint)
    }

    /// Cached fingerprint for a path without touching the filesystem.
    #[must_use]
    pub fn peek(&self, path: &Path) -> Option<FileFingerprint> {
        let canonical = path.canonicalize().ok()?;
        self.entries
            .read()
            .expect("fingerprint lock poisoned")
            .get(&canonical)
            .cloned()
    }

    pub fn stats(&self) -> FingerprintStats {
        *self.stats.read().expect("stats lock poisoned")
    }

    pub fn clear(&self) {
        self.entries.write().expect("fingerprint lock poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("fingerprint lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .read()
            .expect("fingerprint lock poisoned")
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::sha256_hex;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_hash_matches_content_digest() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("Block.java");
        std::fs::write(&path, b"class Block {}").unwrap();

        let cache = FingerprintCache::new();
        assert_eq!(cache.hash(&path).unwrap(), sha256_hex(b"class Block {}"));
    }

    #[test]
    fn test_hash_is_stable_and_cached() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("data.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let cache = FingerprintCache::new();
        let first = cache.hash(&path).unwrap();
        let second = cache.hash(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        let stats = cache.stats();
        assert_eq!(stats.lookups, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_mtime_change_invalidates_entry() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();

        let cache = FingerprintCache::new();
        let before = cache.hash(&path).unwrap();

        std::fs::write(&path, "world").unwrap();
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(5))
            .unwrap();
        drop(file);

        let after = cache.hash(&path).unwrap();
        assert_ne!(before, after);
        assert_eq!(after, sha256_hex(b"world"));
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_missing_file_is_io_read() {
        let cache = FingerprintCache::new();
        let err = cache.hash(Path::new("/nonexistent/modshift/file")).unwrap_err();
        assert!(err.is_per_file());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_drops_entries() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "x").unwrap();

        let cache = FingerprintCache::new();
        cache.hash(&path).unwrap();
        assert!(cache.peek(&path).is_some());
        cache.clear();
        assert!(cache.peek(&path).is_none());
    }
}
