//! Shared sync entrypoint used by every CLI command.

use std::path::PathBuf;

use metarepo_core::{manifest, RepositoryDescriptor, WorkspaceConfig};

use crate::reconcile::{self, PlannedRepository, ReconcileOptions, ReconcileReport};
use crate::vcs::Vcs;
use crate::SyncError;

/// A workspace root together with its loaded configuration.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub config: WorkspaceConfig,
}

impl Workspace {
    /// Load `metarepo.yaml` from `root` (defaults when absent).
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let root = root.into();
        let config = WorkspaceConfig::load_at(&root)?;
        Ok(Self { root, config })
    }

    pub fn with_config(root: impl Into<PathBuf>, config: WorkspaceConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.config.manifest_path(&self.root)
    }

    pub fn repositories_path(&self) -> PathBuf {
        self.config.repositories_path(&self.root)
    }

    pub fn repository_path(&self, descriptor: &RepositoryDescriptor) -> PathBuf {
        self.repositories_path().join(descriptor.identifier.to_path())
    }

    pub fn load_manifest(&self) -> Result<Vec<RepositoryDescriptor>, SyncError> {
        Ok(manifest::load_at(&self.manifest_path())?)
    }
}

/// Load the manifest and reconcile every entry.
///
/// This is the canonical sync entrypoint for both `metarepo sync` and the
/// tail of `metarepo add`.
pub fn sync(
    workspace: &Workspace,
    options: &ReconcileOptions,
    vcs: &dyn Vcs,
) -> Result<ReconcileReport, SyncError> {
    let descriptors = workspace.load_manifest()?;
    tracing::debug!(
        "loaded {} entries from {}",
        descriptors.len(),
        workspace.manifest_path().display()
    );
    reconcile::reconcile(&workspace.repositories_path(), &descriptors, options, vcs)
}

/// Load the manifest and plan without changing anything.
pub fn preview(
    workspace: &Workspace,
    use_https: bool,
    vcs: &dyn Vcs,
) -> Result<Vec<PlannedRepository>, SyncError> {
    let descriptors = workspace.load_manifest()?;
    reconcile::plan(&workspace.repositories_path(), &descriptors, use_https, vcs)
}
