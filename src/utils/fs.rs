//! Filesystem helpers shared by the state store and report writers.

use std::fs;
use std::io::Write;
use std::path::{Component, Path};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;

/// Write bytes to `path` atomically using a temp file + rename.
///
/// The temp file gets a unique name next to `path`, so concurrent writers
/// of the same target never share one. The parent directory is created
/// when missing.
pub fn atomic_write_bytes(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Render a path relative to a tree root as a `/`-separated key.
///
/// Keys are platform independent so persisted state stays portable.
/// Returns `None` outside `root` and for names that are not valid UTF-8,
/// since those could not be resolved again with [`key_to_path`].
#[must_use]
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        if let Component::Normal(name) = component {
            parts.push(name.to_str()?);
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Resolve a `/`-separated key back onto a tree root.
#[must_use]
pub fn key_to_path(root: &Path, key: &str) -> std::path::PathBuf {
    key.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
}

/// Milliseconds since the Unix epoch for a `SystemTime` (0 before the epoch).
#[must_use]
pub fn system_time_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_relative_key_uses_forward_slashes() {
        let root = PathBuf::from("/trees/1.20");
        let path = root.join("net").join("minecraft").join("Block.java");
        assert_eq!(
            relative_key(&root, &path).as_deref(),
            Some("net/minecraft/Block.java")
        );
    }

    #[test]
    fn test_relative_key_outside_root() {
        assert!(relative_key(Path::new("/a"), Path::new("/b/c")).is_none());
        assert!(relative_key(Path::new("/a"), Path::new("/a")).is_none());
    }

    #[test]
    fn test_key_to_path_round_trip() {
        let root = PathBuf::from("/trees/old");
        let key = "assets/textures/stone.png";
        let path = key_to_path(&root, key);
        assert_eq!(relative_key(&root, &path).as_deref(), Some(key));
    }

    #[test]
    fn test_atomic_write_creates_parent() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let target = dir.path().join("nested").join("out.bin");
        atomic_write_bytes(&target, b"payload").expect("write");
        assert_eq!(fs::read(&target).unwrap(), b"payload");
        let leftovers: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("out.bin")]);
    }

    #[test]
    fn test_concurrent_writes_never_mix() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let target = dir.path().join("state.bin");

        let writers: Vec<_> = (0..8u8)
            .map(|i| {
                let target = target.clone();
                std::thread::spawn(move || {
                    let payload = vec![i; 256 * 1024];
                    for _ in 0..10 {
                        atomic_write_bytes(&target, &payload).expect("write");
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let written = fs::read(&target).unwrap();
        assert_eq!(written.len(), 256 * 1024);
        assert!(written.iter().all(|b| *b == written[0]));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_key_rejects_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = PathBuf::from("/trees/old");
        let path = root.join("assets").join(OsStr::from_bytes(b"bad\xff.png"));
        assert!(relative_key(&root, &path).is_none());
    }

    #[test]
    fn test_system_time_millis_epoch() {
        assert_eq!(system_time_millis(UNIX_EPOCH), 0);
        let later = UNIX_EPOCH + std::time::Duration::from_millis(1_500);
        assert_eq!(system_time_millis(later), 1_500);
    }
}
