//! Repository manifest persistence.
//!
//! # File format
//!
//! ```text
//! - https://github.com/nuke-build/common#master
//! - https://github.com/nuke-build/docfx#develop
//! - https://github.com/nuke-build/web
//! ```
//!
//! A YAML list of strings, one repository per line. Each entry is split on the
//! first `#`: the left part is an origin URL in any supported form, the right
//! part the branch (default [`DEFAULT_BRANCH`]). [`save_at`] always writes the
//! HTTPS form, sorted by the serialized string, so diffs stay stable.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{io_err, ManifestError};
use crate::fs::write_atomic;
use crate::types::{RepositoryDescriptor, DEFAULT_BRANCH};

// ---------------------------------------------------------------------------
// 1. Entry codec
// ---------------------------------------------------------------------------

/// Decode a single `url[#branch]` entry.
pub fn parse_entry(entry: &str) -> Result<RepositoryDescriptor, ManifestError> {
    let entry = entry.trim();
    let (url, branch) = match entry.split_once('#') {
        Some((url, branch)) => (url, branch.trim()),
        None => (entry, DEFAULT_BRANCH),
    };
    if url.trim().is_empty() {
        return Err(ManifestError::InvalidEntry {
            entry: entry.to_string(),
            reason: "missing repository URL",
        });
    }
    if branch.is_empty() {
        return Err(ManifestError::InvalidEntry {
            entry: entry.to_string(),
            reason: "empty branch after '#'",
        });
    }
    RepositoryDescriptor::from_url(url, branch)
}

/// Encode descriptors as sorted `https-url#branch` lines.
pub fn serialize(descriptors: &[RepositoryDescriptor]) -> Vec<String> {
    let mut entries: Vec<String> = descriptors.iter().map(|d| d.manifest_entry()).collect();
    entries.sort();
    entries
}

/// Fails with [`ManifestError::DuplicateIdentifier`] on the first repeated identifier.
pub fn ensure_unique(descriptors: &[RepositoryDescriptor]) -> Result<(), ManifestError> {
    let mut seen = HashSet::new();
    for d in descriptors {
        if !seen.insert(&d.identifier) {
            return Err(ManifestError::DuplicateIdentifier {
                identifier: d.identifier.to_string(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load the manifest at `path`, preserving file order.
///
/// Returns `ManifestError::NotFound` if absent, `ManifestError::Parse` if the
/// file is not a YAML list of strings, and `ManifestError::Entry` (with the
/// 1-based entry index) for an undecodable entry.
pub fn load_at(path: &Path) -> Result<Vec<RepositoryDescriptor>, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    if contents.trim().is_empty() {
        return Ok(vec![]);
    }
    let entries: Vec<String> = serde_yaml::from_str(&contents).map_err(|e| ManifestError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let descriptors = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            parse_entry(entry).map_err(|e| ManifestError::Entry {
                path: path.to_path_buf(),
                index: i + 1,
                source: Box::new(e),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    ensure_unique(&descriptors)?;
    tracing::debug!("loaded {} repositories from {}", descriptors.len(), path.display());
    Ok(descriptors)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// File contents [`save_at`] would write for `descriptors`.
pub fn to_yaml(descriptors: &[RepositoryDescriptor]) -> Result<String, ManifestError> {
    ensure_unique(descriptors)?;
    Ok(serde_yaml::to_string(&serialize(descriptors))?)
}

/// Atomically rewrite the manifest at `path` from `descriptors`.
pub fn save_at(path: &Path, descriptors: &[RepositoryDescriptor]) -> Result<(), ManifestError> {
    let yaml = to_yaml(descriptors)?;
    write_atomic(path, &yaml).map_err(|e| io_err(path, e))?;
    tracing::debug!("saved {} repositories to {}", descriptors.len(), path.display());
    Ok(())
}

/// Append `descriptor`, re-sort and persist. Returns the persisted list in
/// manifest order.
///
/// A missing manifest is treated as empty.
pub fn append_at(
    path: &Path,
    descriptor: RepositoryDescriptor,
) -> Result<Vec<RepositoryDescriptor>, ManifestError> {
    let mut descriptors = match load_at(path) {
        Ok(d) => d,
        Err(ManifestError::NotFound { .. }) => vec![],
        Err(e) => return Err(e),
    };
    descriptors.push(descriptor);
    save_at(path, &descriptors)?;
    descriptors.sort_by_key(|d| d.manifest_entry());
    Ok(descriptors)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn entry_without_branch_defaults_to_master() {
        let d = parse_entry("https://github.com/org/a").unwrap();
        assert_eq!(d.branch, "master");
    }

    #[test]
    fn entry_splits_on_first_hash() {
        let d = parse_entry("https://github.com/org/a#feature#2").unwrap();
        assert_eq!(d.branch, "feature#2");
    }

    #[test]
    fn empty_branch_is_rejected() {
        let err = parse_entry("https://github.com/org/a#").unwrap_err();
        assert!(matches!(err, ManifestError::InvalidEntry { .. }));
    }

    #[test]
    fn empty_file_is_empty_manifest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("repositories.yml");
        std::fs::write(&path, "\n").unwrap();
        assert!(load_at(&path).unwrap().is_empty());
    }

    #[test]
    fn save_writes_sorted_https_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("repositories.yml");
        let descriptors = vec![
            parse_entry("git@github.com:org/b.git#main").unwrap(),
            parse_entry("https://github.com/org/a").unwrap(),
        ];
        save_at(&path, &descriptors).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "- https://github.com/org/a#master\n- https://github.com/org/b#main\n"
        );
    }

    #[test]
    fn append_to_missing_manifest_creates_it() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("repositories.yml");
        let list = append_at(&path, parse_entry("https://github.com/org/a").unwrap()).unwrap();
        assert_eq!(list.len(), 1);
        assert!(path.exists());
    }

    #[test]
    fn failed_save_reports_path_and_removes_tmp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("repositories.yml");
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("keep"), "kept").unwrap();

        let err = save_at(&path, &[parse_entry("https://github.com/org/a").unwrap()]).unwrap_err();

        match err {
            ManifestError::Io { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("expected Io, got {other}"),
        }
        assert!(!crate::fs::tmp_path(&path).exists());
        assert_eq!(std::fs::read_to_string(path.join("keep")).unwrap(), "kept");
    }
}
