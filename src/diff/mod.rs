//! Version change detection.
//!
//! Compares two extracted version trees and reports which files were added,
//! removed or modified.
//!
//! # Architecture
//!
//! - [`ComparisonEngine`]: walks both trees and dispatches common paths to the
//!   per-file comparator in parallel
//! - [`ContentDiffer`]: text line diffs, chunked binary diffs and the
//!   large-file first-difference scan
//! - [`FingerprintCache`]: mtime-validated SHA-256 digests
//! - [`ComparisonStateStore`]: persisted per-pair state enabling incremental
//!   comparisons
//!
//! # Example
//!
//! ```ignore
//! use modshift::config::CompareConfig;
//! use modshift::diff::{ComparisonEngine, ComparisonStateStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(ComparisonStateStore::new("/var/cache/modshift/state"));
//! let engine = ComparisonEngine::new(&CompareConfig::default())
//!     .with_state_store(store, std::time::Duration::from_secs(24 * 3600));
//!
//! let comparison = engine.compare_versions("1.20.1", "1.21", &old_dir, &new_dir, false)?;
//! println!("{} changes ({})", comparison.result.change_count(), comparison.mode);
//! ```

pub mod binary;
mod content;
mod engine;
mod fingerprint;
mod incremental;
mod result;
pub mod state;
mod walk;

pub use binary::{
    compress_records, decode_chunk_records, decompress_records, encode_chunk_records,
    unpack_records, ChunkRecord, RecordDecodeError,
};
pub use content::{render_unified_diff, ContentDiffer};
pub use engine::ComparisonEngine;
pub use fingerprint::{FileFingerprint, FingerprintCache, FingerprintStats};
pub use result::{ChangeKind, ComparisonMode, ComparisonResult, DiffEntry, VersionComparison};
pub use state::{ComparisonState, ComparisonStateStore};
pub use walk::{ensure_tree_root, list_files, TreeListing};
