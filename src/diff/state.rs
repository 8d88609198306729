//! Persisted comparison state for incremental comparisons.
//!
//! One state file exists per ordered version pair at
//! `<dir>/<old>__<new>.mstate`. The container is the magic `MSST`, a format
//! version byte, then a zstd-compressed JSON body:
//!
//! ```text
//! { "timestamp_millis": 1718000000000, "file_hashes": { "a/b.txt": "<sha256>" } }
//! ```
//!
//! Loading never fails: any problem with a stored state is logged and the
//! caller falls back to a full comparison.

use crate::error::{ModshiftError, Result, StateLoadErrorKind};
use crate::utils::{atomic_write_bytes, validate_version_id};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;

/// Magic bytes at the start of every state file.
pub const STATE_MAGIC: &[u8; 4] = b"MSST";

/// Current state container version.
pub const STATE_FORMAT_VERSION: u8 = 1;

/// File extension of state files.
pub const STATE_EXTENSION: &str = "mstate";

const ZSTD_LEVEL: i32 = 3;

// ============================================================================
// ComparisonState
// ============================================================================

/// Content hashes of the new tree of the last comparison of a version pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonState {
    /// Creation time (epoch millis)
    pub timestamp_millis: i64,
    /// Relative path to lowercase hex SHA-256
    pub file_hashes: BTreeMap<String, String>,
}

impl ComparisonState {
    /// Create a state stamped with the current time.
    #[must_use]
    pub fn new(file_hashes: BTreeMap<String, String>) -> Self {
        Self {
            timestamp_millis: chrono::Utc::now().timestamp_millis(),
            file_hashes,
        }
    }

    /// Create a state with an explicit timestamp.
    #[must_use]
    pub const fn with_timestamp(file_hashes: BTreeMap<String, String>, timestamp_millis: i64) -> Self {
        Self {
            timestamp_millis,
            file_hashes,
        }
    }

    /// Whether the state is too old (or dated in the future) to trust.
    #[must_use]
    pub fn is_stale(&self, ttl: Duration, now_millis: i64) -> bool {
        let age = now_millis.saturating_sub(self.timestamp_millis);
        if age < 0 {
            return true;
        }
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        age >= ttl_millis
    }

    /// Age of the state relative to `now_millis`.
    #[must_use]
    pub fn age(&self, now_millis: i64) -> Duration {
        let age = now_millis.saturating_sub(self.timestamp_millis).max(0);
        Duration::from_millis(u64::try_from(age).unwrap_or(0))
    }

    pub fn len(&self) -> usize {
        self.file_hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_hashes.is_empty()
    }
}

// ============================================================================
// Container codec
// ============================================================================

/// Encode a state into the on-disk container.
pub fn encode_state(state: &ComparisonState) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(state)
        .map_err(|e| ModshiftError::state_save("<memory>", format!("serialize: {e}")))?;
    let body = zstd::encode_all(json.as_slice(), ZSTD_LEVEL)
        .map_err(|e| ModshiftError::state_save("<memory>", format!("compress: {e}")))?;

    let mut out = Vec::with_capacity(STATE_MAGIC.len() + 1 + body.len());
    out.extend_from_slice(STATE_MAGIC);
    out.push(STATE_FORMAT_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a state container.
pub fn decode_state(bytes: &[u8]) -> std::result::Result<ComparisonState, StateLoadErrorKind> {
    let header_len = STATE_MAGIC.len() + 1;
    if bytes.len() < header_len || &bytes[..STATE_MAGIC.len()] != STATE_MAGIC {
        return Err(StateLoadErrorKind::BadMagic);
    }
    let version = bytes[STATE_MAGIC.len()];
    if version != STATE_FORMAT_VERSION {
        return Err(StateLoadErrorKind::UnsupportedVersion {
            found: version,
            supported: STATE_FORMAT_VERSION,
        });
    }
    let json = zstd::decode_all(&bytes[header_len..])
        .map_err(|e| StateLoadErrorKind::Decompress(e.to_string()))?;
    Ok(serde_json::from_slice(&json)?)
}

// ============================================================================
// ComparisonStateStore
// ============================================================================

type PairKey = (String, String);

/// Directory-backed store of comparison states with an in-memory front map.
#[derive(Debug)]
pub struct ComparisonStateStore {
    dir: PathBuf,
    front: RwLock<HashMap<PairKey, ComparisonState>>,
}

impl ComparisonStateStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            front: RwLock::new(HashMap::new()),
        }
    }

    /// Directory state files are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the state file for a version pair.
    pub fn state_path(&self, old_version: &str, new_version: &str) -> Result<PathBuf> {
        validate_version_id(old_version).map_err(ModshiftError::validation)?;
        validate_version_id(new_version).map_err(ModshiftError::validation)?;
        Ok(self
            .dir
            .join(format!("{old_version}__{new_version}.{STATE_EXTENSION}")))
    }

    /// Load the state for a version pair.
    ///
    /// Returns `None` when no usable state exists; the reason is logged.
    pub fn load(&self, old_version: &str, new_version: &str) -> Option<ComparisonState> {
        let path = match self.state_path(old_version, new_version) {
            Ok(path) => path,
            Err(e) => {
                let err = ModshiftError::state_load(
                    self.dir.clone(),
                    StateLoadErrorKind::InvalidKey(e.to_string()),
                );
                tracing::warn!("{err}");
                return None;
            }
        };

        let key = (old_version.to_string(), new_version.to_string());
        if let Some(state) = self
            .front
            .read()
            .expect("state lock poisoned")
            .get(&key)
            .cloned()
        {
            tracing::debug!(old = old_version, new = new_version, "state served from memory");
            return Some(state);
        }

        match Self::read_from_disk(&path) {
            Ok(state) => {
                tracing::debug!(
                    path = %path.display(),
                    files = state.len(),
                    "loaded comparison state"
                );
                self.front
                    .write()
                    .expect("state lock poisoned")
                    .insert(key, state.clone());
                Some(state)
            }
            Err(StateLoadErrorKind::Missing) => {
                tracing::debug!(path = %path.display(), "no stored comparison state");
                None
            }
            Err(kind) => {
                let err = ModshiftError::state_load(path, kind);
                tracing::warn!("{err}; falling back to a full comparison");
                None
            }
        }
    }

    fn read_from_disk(path: &Path) -> std::result::Result<ComparisonState, StateLoadErrorKind> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StateLoadErrorKind::Missing)
            }
            Err(e) => return Err(StateLoadErrorKind::Io(e)),
        };
        decode_state(&bytes)
    }

    /// Persist the state for a version pair, replacing any previous one.
    pub fn save(&self, old_version: &str, new_version: &str, state: &ComparisonState) -> Result<()> {
        let path = self.state_path(old_version, new_version)?;
        let bytes = encode_state(state).map_err(|e| match e {
            ModshiftError::StateSave { message, .. } => ModshiftError::state_save(&path, message),
            other => other,
        })?;
        atomic_write_bytes(&path, &bytes)
            .map_err(|e| ModshiftError::state_save(&path, e.to_string()))?;

        self.front.write().expect("state lock poisoned").insert(
            (old_version.to_string(), new_version.to_string()),
            state.clone(),
        );
        tracing::debug!(path = %path.display(), files = state.len(), "saved comparison state");
        Ok(())
    }

    /// Remove the state for a version pair. Returns whether a file existed.
    pub fn remove(&self, old_version: &str, new_version: &str) -> Result<bool> {
        let path = self.state_path(old_version, new_version)?;
        self.front
            .write()
            .expect("state lock poisoned")
            .remove(&(old_version.to_string(), new_version.to_string()));
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ModshiftError::io_read(path, e)),
        }
    }

    /// All state files currently in the store directory.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ModshiftError::io_read(&self.dir, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ModshiftError::io_read(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(STATE_EXTENSION) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Delete every state file and empty the front map. Returns the count removed.
    pub fn clear(&self) -> Result<usize> {
        self.front.write().expect("state lock poisoned").clear();
        let files = self.list()?;
        for path in &files {
            std::fs::remove_file(path).map_err(|e| ModshiftError::io_read(path, e))?;
        }
        tracing::info!(count = files.len(), dir = %self.dir.display(), "cleared comparison state");
        Ok(files.len())
    }
}
