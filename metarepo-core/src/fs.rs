//! Whole-file replacement helpers shared by the manifest store and the README
//! writer.

use std::io;
use std::path::{Path, PathBuf};

/// Sibling temp path used while writing `path`: `<file_name>.tmp`.
pub fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{name}.tmp"))
}

/// Atomically replace `path` with `contents`.
///
/// Write flow: create parent → write `<name>.tmp` sibling → `rename`.
/// The `.tmp` is always in the same directory as the target, so the rename
/// never crosses filesystems. On failure the `.tmp` is removed and the
/// previous file, if any, is left untouched.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    if let Err(e) = std::fs::write(&tmp, contents) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_parent_and_cleans_tmp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("file.yml");
        write_atomic(&path, "a\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\n");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.yml");
        write_atomic(&path, "old").unwrap();
        write_atomic(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn failed_rename_removes_tmp_and_keeps_target() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory cannot be replaced by a file, even by root.
        let path = dir.path().join("repositories.yml");
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("keep"), "kept").unwrap();

        let result = write_atomic(&path, "replacement");

        assert!(result.is_err());
        assert!(!tmp_path(&path).exists());
        assert!(path.is_dir());
        assert_eq!(std::fs::read_to_string(path.join("keep")).unwrap(), "kept");
    }
}
