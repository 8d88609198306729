//! Version tree traversal.

use crate::error::{ComparisonErrorKind, ModshiftError, Result};
use crate::utils::relative_key;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files of a version tree keyed by `/`-separated relative path.
pub type TreeListing = BTreeMap<String, PathBuf>;

/// Ensure a comparison root exists and is a directory.
pub fn ensure_tree_root(root: &Path, label: &str) -> Result<()> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ModshiftError::validation(format!(
            "{label} tree {} is not a directory",
            root.display()
        ))),
        Err(_) => Err(ModshiftError::validation(format!(
            "{label} tree {} does not exist",
            root.display()
        ))),
    }
}

/// List every regular file below `root`.
///
/// Symlinks are not followed, so linked files and directories are skipped.
/// Files whose names are not valid UTF-8 are logged and left out.
pub fn list_files(root: &Path) -> Result<TreeListing> {
    let mut files = TreeListing::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            ModshiftError::comparison(
                format!("walking {}", root.display()),
                ComparisonErrorKind::Traversal(e),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        match relative_key(root, entry.path()) {
            Some(key) => {
                files.insert(key, entry.into_path());
            }
            None => tracing::warn!(
                path = %entry.path().display(),
                "skipping file whose name is not valid UTF-8"
            ),
        }
    }
    tracing::debug!(root = %root.display(), files = files.len(), "listed version tree");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_files_nested_keys() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("net/minecraft")).unwrap();
        std::fs::write(dir.path().join("net/minecraft/Block.java"), "class Block {}").unwrap();
        std::fs::write(dir.path().join("pack.mcmeta"), "{}").unwrap();
        std::fs::create_dir_all(dir.path().join("empty")).unwrap();

        let files = list_files(dir.path()).unwrap();
        let keys: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["net/minecraft/Block.java", "pack.mcmeta"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_not_followed() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join("real.txt"), "x").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();

        let files = list_files(dir.path()).unwrap();
        assert!(files.contains_key("real.txt"));
        assert!(!files.contains_key("link.txt"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_are_left_out() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join("ok.txt"), "x").unwrap();
        std::fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff.txt")), "y").unwrap();

        let files = list_files(dir.path()).unwrap();
        let keys: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["ok.txt"]);
    }

    #[test]
    fn test_ensure_tree_root() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let file = dir.path().join("f.txt");
        std::fs::write(&file, "x").unwrap();

        assert!(ensure_tree_root(dir.path(), "old").is_ok());
        assert!(matches!(
            ensure_tree_root(&file, "old"),
            Err(ModshiftError::Validation(_))
        ));
        assert!(matches!(
            ensure_tree_root(&dir.path().join("missing"), "new"),
            Err(ModshiftError::Validation(_))
        ));
    }
}
