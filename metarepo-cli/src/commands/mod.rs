pub mod add;
pub mod readme;
pub mod status;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};
use metarepo_sync::Workspace;

/// Resolve `--root` (or the current directory) and load its config.
pub fn open_workspace(root: Option<PathBuf>) -> Result<Workspace> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir().context("could not determine current directory")?,
    };
    tracing::debug!(root = %root.display(), "opening workspace");
    Workspace::open(&root)
        .with_context(|| format!("failed to load workspace config in {}", root.display()))
}
