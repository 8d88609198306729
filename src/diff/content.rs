//! Per-file content comparison.
//!
//! Small files get a full diff: a unified line diff for text, chunk records
//! for everything else. Files at or above the large-file threshold are only
//! scanned for their first differing byte.

use super::binary::{compress_records, encode_chunk_records, read_chunk, ChunkRecord};
use super::result::DiffEntry;
use crate::config::CompareConfig;
use crate::error::{ModshiftError, Result};
use similar::{Algorithm, ChangeTag, TextDiff};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::Range;
use std::path::Path;

/// Lines of context around each hunk.
const CONTEXT_LINES: usize = 3;

/// Compares the content of a file present in both trees.
#[derive(Debug, Clone)]
pub struct ContentDiffer {
    chunk_size: usize,
    large_file_threshold: u64,
    config: CompareConfig,
}

impl ContentDiffer {
    #[must_use]
    pub fn new(config: &CompareConfig) -> Self {
        Self {
            chunk_size: config.chunk_size_bytes.max(1),
            large_file_threshold: config.large_file_threshold_bytes,
            config: config.clone(),
        }
    }

    /// Whether a path is diffed line by line.
    #[must_use]
    pub fn is_text_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.config.is_text_extension(ext))
    }

    /// Compare a relative path across both trees, choosing the fast path for
    /// large files. `key` labels the text diff headers.
    pub fn diff_file(&self, key: &str, old: &Path, new: &Path) -> Result<Option<DiffEntry>> {
        let old_len = file_len(old)?;
        let new_len = file_len(new)?;
        if old_len.max(new_len) >= self.large_file_threshold {
            tracing::trace!(path = key, old_len, new_len, "large file fast path");
            self.diff_large(old, new)
        } else {
            self.small_diff(old, new, &format!("a/{key}"), &format!("b/{key}"))
        }
    }

    /// Full diff for files below the large-file threshold.
    pub fn diff_small(&self, old: &Path, new: &Path) -> Result<Option<DiffEntry>> {
        self.small_diff(
            old,
            new,
            &old.display().to_string(),
            &new.display().to_string(),
        )
    }

    fn small_diff(
        &self,
        old: &Path,
        new: &Path,
        old_label: &str,
        new_label: &str,
    ) -> Result<Option<DiffEntry>> {
        if self.is_text_path(new) {
            let old_bytes = std::fs::read(old).map_err(|e| ModshiftError::io_read(old, e))?;
            let new_bytes = std::fs::read(new).map_err(|e| ModshiftError::io_read(new, e))?;
            if old_bytes == new_bytes {
                return Ok(None);
            }
            if let (Ok(old_text), Ok(new_text)) = (
                std::str::from_utf8(&old_bytes),
                std::str::from_utf8(&new_bytes),
            ) {
                let diff_text = render_unified_diff(old_label, new_label, old_text, new_text);
                return Ok(Some(DiffEntry::TextModified { diff_text }));
            }
            tracing::debug!(path = new_label, "text extension but not UTF-8, using binary diff");
            let records = self.chunk_records(
                old,
                &mut old_bytes.as_slice(),
                new,
                &mut new_bytes.as_slice(),
            )?;
            return self.pack(records, old);
        }

        let mut old_reader = open(old)?;
        let mut new_reader = open(new)?;
        let records = self.chunk_records(old, &mut old_reader, new, &mut new_reader)?;
        self.pack(records, old)
    }

    fn pack(&self, records: Vec<ChunkRecord>, path: &Path) -> Result<Option<DiffEntry>> {
        if records.is_empty() {
            return Ok(None);
        }
        let encoded = encode_chunk_records(&records);
        let encoded_chunks =
            compress_records(&encoded).map_err(|e| ModshiftError::io_read(path, e))?;
        Ok(Some(DiffEntry::BinaryModified { encoded_chunks }))
    }

    /// Collect differing chunk pairs from two streams read in lockstep.
    fn chunk_records<A: Read, B: Read>(
        &self,
        old_path: &Path,
        old: &mut A,
        new_path: &Path,
        new: &mut B,
    ) -> Result<Vec<ChunkRecord>> {
        let mut old_buf = vec![0u8; self.chunk_size];
        let mut new_buf = vec![0u8; self.chunk_size];
        let mut records = Vec::new();
        let mut offset: u64 = 0;
        loop {
            let n_old =
                read_chunk(old, &mut old_buf).map_err(|e| ModshiftError::io_read(old_path, e))?;
            let n_new =
                read_chunk(new, &mut new_buf).map_err(|e| ModshiftError::io_read(new_path, e))?;
            if n_old == 0 && n_new == 0 {
                break;
            }
            if old_buf[..n_old] != new_buf[..n_new] {
                let record = record_at(offset, &old_buf[..n_old], &new_buf[..n_new])
                    .map_err(|e| ModshiftError::io_read(new_path, e))?;
                records.push(record);
            }
            offset += self.chunk_size as u64;
        }
        Ok(records)
    }

    /// Locate the first differing byte of two files.
    ///
    /// On a length mismatch with a common prefix the offset is the shorter
    /// file's length. Identical files yield `None`.
    pub fn diff_large(&self, old: &Path, new: &Path) -> Result<Option<DiffEntry>> {
        Ok(self
            .first_difference(old, new)?
            .map(|offset| DiffEntry::ContentModifiedAtOffset { offset }))
    }

    fn first_difference(&self, old_path: &Path, new_path: &Path) -> Result<Option<u64>> {
        let mut old = open(old_path)?;
        let mut new = open(new_path)?;
        let mut old_buf = vec![0u8; self.chunk_size];
        let mut new_buf = vec![0u8; self.chunk_size];
        let mut offset: u64 = 0;

        loop {
            let n_old = read_chunk(&mut old, &mut old_buf)
                .map_err(|e| ModshiftError::io_read(old_path, e))?;
            let n_new = read_chunk(&mut new, &mut new_buf)
                .map_err(|e| ModshiftError::io_read(new_path, e))?;

            let common = n_old.min(n_new);
            if let Some(i) = old_buf[..common]
                .iter()
                .zip(&new_buf[..common])
                .position(|(a, b)| a != b)
            {
                return Ok(Some(offset + i as u64));
            }
            if n_old != n_new {
                return Ok(Some(offset + common as u64));
            }
            if n_old == 0 {
                return Ok(None);
            }
            offset += n_old as u64;
        }
    }
}

fn record_at(offset: u64, old: &[u8], new: &[u8]) -> std::io::Result<ChunkRecord> {
    let offset = u32::try_from(offset).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("chunk offset {offset} does not fit a binary diff record"),
        )
    })?;
    Ok(ChunkRecord {
        offset,
        old_bytes: old.to_vec(),
        new_bytes: new.to_vec(),
    })
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| ModshiftError::io_read(path, e))
}

fn file_len(path: &Path) -> Result<u64> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| ModshiftError::io_read(path, e))
}

// ============================================================================
// Unified diff rendering
// ============================================================================

/// Render a unified line diff with inline word highlights.
///
/// Removed words are wrapped as `[-word-]` and inserted words as `{+word+}`
/// on the changed lines of each hunk.
#[must_use]
pub fn render_unified_diff(old_label: &str, new_label: &str, old: &str, new: &str) -> String {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(old, new);

    let mut out = String::new();
    let _ = writeln!(out, "--- {old_label}");
    let _ = writeln!(out, "+++ {new_label}");

    for group in diff.grouped_ops(CONTEXT_LINES) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_range = first.old_range().start..last.old_range().end;
        let new_range = first.new_range().start..last.new_range().end;
        let _ = writeln!(
            out,
            "@@ -{} +{} @@",
            hunk_range(&old_range),
            hunk_range(&new_range)
        );

        for op in &group {
            for change in diff.iter_inline_changes(op) {
                let (sign, open, close) = match change.tag() {
                    ChangeTag::Delete => ('-', "[-", "-]"),
                    ChangeTag::Insert => ('+', "{+", "+}"),
                    ChangeTag::Equal => (' ', "", ""),
                };
                out.push(sign);
                for (emphasized, value) in change.iter_strings_lossy() {
                    if emphasized {
                        push_highlighted(&mut out, &value, open, close);
                    } else {
                        out.push_str(&value);
                    }
                }
                if change.missing_newline() {
                    out.push('\n');
                    out.push_str("\\ No newline at end of file\n");
                }
            }
        }
    }
    out
}

fn push_highlighted(out: &mut String, value: &str, open: &str, close: &str) {
    let (body, newline) = match value.strip_suffix('\n') {
        Some(body) => (body, true),
        None => (value, false),
    };
    if !body.is_empty() {
        out.push_str(open);
        out.push_str(body);
        out.push_str(close);
    }
    if newline {
        out.push('\n');
    }
}

fn hunk_range(range: &Range<usize>) -> String {
    let len = range.len();
    let start = if len == 0 { range.start } else { range.start + 1 };
    format!("{start},{len}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::binary::unpack_records;
    use std::path::PathBuf;

    fn differ(chunk: usize, threshold: u64) -> ContentDiffer {
        ContentDiffer::new(&CompareConfig {
            chunk_size_bytes: chunk,
            large_file_threshold_bytes: threshold,
            ..CompareConfig::default()
        })
    }

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_identical_files_yield_none() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let old = write(dir.path(), "old.txt", b"same\n");
        let new = write(dir.path(), "new.txt", b"same\n");

        let d = differ(4, 1024);
        assert!(d.diff_small(&old, &new).unwrap().is_none());
        assert!(d.diff_large(&old, &new).unwrap().is_none());
    }

    #[test]
    fn test_text_diff_has_hunk_and_highlights() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let old = write(dir.path(), "old.txt", b"hello\n");
        let new = write(dir.path(), "new.txt", b"world\n");

        let entry = differ(1024, 1 << 20).diff_small(&old, &new).unwrap();
        let Some(DiffEntry::TextModified { diff_text }) = entry else {
            panic!("expected text diff, got {entry:?}");
        };
        assert!(diff_text.contains("@@ -1,1 +1,1 @@"), "{diff_text}");
        // Lines with little in common are shown whole, without word highlights
        assert!(diff_text.contains("\n-hello\n"), "{diff_text}");
        assert!(diff_text.contains("\n+world\n"), "{diff_text}");
    }

    #[test]
    fn test_inline_highlight_marks_changed_word_only() {
        let text = render_unified_diff(
            "a/x.java",
            "b/x.java",
            "int count = 1;\n",
            "int count = 2;\n",
        );
        assert!(text.starts_with("--- a/x.java\n+++ b/x.java\n"));
        assert!(text.contains("-int count = [-1;-]\n"), "{text}");
        assert!(text.contains("+int count = {+2;+}\n"), "{text}");
        assert!(text.contains("int count = "), "{text}");
    }

    #[test]
    fn test_hunk_context_is_three_lines() {
        let old: String = (1..=20).map(|i| format!("line {i}\n")).collect();
        let new = old.replace("line 10\n", "line ten\n");
        let text = render_unified_diff("a", "b", &old, &new);
        assert!(text.contains("@@ -7,7 +7,7 @@"), "{text}");
        assert!(!text.contains("line 6\n"));
    }

    #[test]
    fn test_binary_diff_records_differing_chunks() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let old = write(dir.path(), "old.bin", &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        let new = write(dir.path(), "new.bin", &[0, 1, 2, 3, 9, 5, 6, 7]);

        let entry = differ(4, 1024).diff_small(&old, &new).unwrap();
        let Some(DiffEntry::BinaryModified { encoded_chunks }) = entry else {
            panic!("expected binary diff, got {entry:?}");
        };
        let records = unpack_records(&encoded_chunks).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].offset, 4);
        assert_eq!(records[0].old_bytes, vec![4, 5, 6, 7]);
        assert_eq!(records[0].new_bytes, vec![9, 5, 6, 7]);
        assert_eq!(records[1].offset, 8);
        assert_eq!(records[1].old_bytes, vec![8]);
        assert!(records[1].new_bytes.is_empty());
    }

    #[test]
    fn test_non_utf8_text_extension_falls_back_to_binary() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let old = write(dir.path(), "old.txt", &[0xff, 0xfe]);
        let new = write(dir.path(), "new.txt", &[0xff, 0x00]);

        let entry = differ(16, 1024).diff_small(&old, &new).unwrap();
        assert!(matches!(entry, Some(DiffEntry::BinaryModified { .. })));
    }

    #[test]
    fn test_large_diff_reports_exact_offset() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut bytes = vec![0u8; 100];
        let old = write(dir.path(), "old.bin", &bytes);
        bytes[37] = 1;
        let new = write(dir.path(), "new.bin", &bytes);

        let entry = differ(16, 64).diff_large(&old, &new).unwrap();
        assert_eq!(entry, Some(DiffEntry::ContentModifiedAtOffset { offset: 37 }));
    }

    #[test]
    fn test_large_diff_length_mismatch_reports_shorter_length() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let old = write(dir.path(), "old.bin", &[7u8; 40]);
        let new = write(dir.path(), "new.bin", &[7u8; 32]);

        let entry = differ(16, 64).diff_large(&old, &new).unwrap();
        assert_eq!(entry, Some(DiffEntry::ContentModifiedAtOffset { offset: 32 }));
    }

    #[test]
    fn test_diff_file_dispatches_on_threshold() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let old = write(dir.path(), "old.txt", b"aaaa\nbbbb\n");
        let new = write(dir.path(), "new.txt", b"aaaa\ncccc\n");

        let small = differ(4, 1024).diff_file("f.txt", &old, &new).unwrap();
        assert!(matches!(small, Some(DiffEntry::TextModified { .. })));

        let large = differ(4, 10).diff_file("f.txt", &old, &new).unwrap();
        assert_eq!(large, Some(DiffEntry::ContentModifiedAtOffset { offset: 5 }));
    }

    #[test]
    fn test_missing_file_is_io_read() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let old = write(dir.path(), "old.bin", b"x");
        let err = differ(4, 1024)
            .diff_file("gone.bin", &old, &dir.path().join("gone.bin"))
            .unwrap_err();
        assert!(err.is_per_file());
    }
}
