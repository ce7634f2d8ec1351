//! README rendering and change-gated atomic writes.
//!
//! ## `write_if_changed`
//!
//! 1. Normalise line endings to LF.
//! 2. Compare with the file on disk → skip if identical.
//! 3. Write to `<path>.tmp`, then rename over the final path.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use metarepo_core::{fs::write_atomic, RepositoryDescriptor};
use metarepo_template::{ReadmeContext, ReadmeRenderer};

use crate::error::{io_err, SyncError};
use crate::pipeline::Workspace;

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped: the rendered content matches what is on disk.
    Unchanged { path: PathBuf },
    /// Dry run: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, WriteResult::Unchanged { .. })
    }
}

/// Render the README for `descriptors` with the workspace's title and
/// (optional) custom template.
pub fn render_readme(
    workspace: &Workspace,
    descriptors: &[RepositoryDescriptor],
) -> Result<String, SyncError> {
    let config = &workspace.config;
    let renderer = match config.readme_template_path(&workspace.root) {
        Some(path) => ReadmeRenderer::from_file(&path)?,
        None => ReadmeRenderer::new()?,
    };
    let ctx = ReadmeContext::new(config.readme_title(&workspace.root), descriptors);
    Ok(renderer.render(&ctx)?)
}

/// Regenerate the README from the manifest.
///
/// With `dry_run`, reports [`WriteResult::WouldWrite`] instead of writing,
/// which is what `metarepo readme --check` relies on.
pub fn write_readme(workspace: &Workspace, dry_run: bool) -> Result<WriteResult, SyncError> {
    let descriptors = workspace.load_manifest()?;
    let content = render_readme(workspace, &descriptors)?;
    let path = workspace.config.readme_path(&workspace.root);
    write_if_changed(&path, &content, dry_run)
}

pub(crate) fn write_if_changed(
    path: &Path,
    content: &str,
    dry_run: bool,
) -> Result<WriteResult, SyncError> {
    let content = content.replace("\r\n", "\n");

    match std::fs::read_to_string(path) {
        Ok(existing) if existing.replace("\r\n", "\n") == content => {
            tracing::debug!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(path, e)),
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    write_atomic(path, &content).map_err(|e| io_err(path, e))?;
    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn first_write_creates_file() {
        let dir = TempDir::new().expect("dir");
        let path = dir.path().join("README.md");
        let result = write_if_changed(&path, "hello\n", false).expect("write");
        assert_eq!(result, WriteResult::Written { path: path.clone() });
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn identical_content_is_skipped() {
        let dir = TempDir::new().expect("dir");
        let path = dir.path().join("README.md");
        std::fs::write(&path, "hello\r\n").unwrap();
        let result = write_if_changed(&path, "hello\n", false).expect("write");
        assert!(result.is_unchanged());
    }

    #[test]
    fn dry_run_never_writes() {
        let dir = TempDir::new().expect("dir");
        let path = dir.path().join("README.md");
        let result = write_if_changed(&path, "hello\n", true).expect("write");
        assert_eq!(result, WriteResult::WouldWrite { path: path.clone() });
        assert!(!path.exists());
    }

    #[test]
    fn crlf_is_normalised_on_write() {
        let dir = TempDir::new().expect("dir");
        let path = dir.path().join("README.md");
        write_if_changed(&path, "a\r\nb\r\n", false).expect("write");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\n");
        assert!(!dir.path().join("README.md.tmp").exists());
    }
}
