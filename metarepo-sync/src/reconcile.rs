//! Bring the repositories directory in line with the manifest.
//!
//! For every descriptor, in manifest order:
//!
//! 1. Missing directory → clone the chosen origin at the descriptor's branch.
//! 2. Existing directory → upsert remote `origin`: query it, add it when
//!    absent, then always `set-url` to the chosen origin.
//!
//! Directories that are not in the manifest are never touched, and nothing
//! already done is rolled back when a later descriptor fails.

use std::path::{Path, PathBuf};

use serde::Serialize;

use metarepo_core::{RepoIdentifier, RepositoryDescriptor};

use crate::error::{io_err, Step, SyncError, VcsError};
use crate::vcs::Vcs;

/// Name of the remote every managed repository is pointed at.
pub const ORIGIN: &str = "origin";

/// What happens when one descriptor fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileMode {
    /// Stop at the first failure.
    #[default]
    FailFast,
    /// Record the failure and carry on with the next descriptor.
    BestEffort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOptions {
    /// Point remotes at the HTTPS form instead of SSH.
    pub use_https: bool,
    pub mode: ReconcileMode,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum RepositoryOutcome {
    Cloned,
    RemoteUpdated {
        /// `origin` before the update; `None` when it had to be added.
        previous: Option<String>,
        changed: bool,
    },
    /// Only produced in [`ReconcileMode::BestEffort`].
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryReport {
    pub identifier: RepoIdentifier,
    pub origin: String,
    pub outcome: RepositoryOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub repositories: Vec<RepositoryReport>,
}

impl ReconcileReport {
    pub fn cloned(&self) -> usize {
        self.count(|o| matches!(o, RepositoryOutcome::Cloned))
    }

    /// Existing repositories whose origin was rewritten to a different URL.
    pub fn changed(&self) -> usize {
        self.count(|o| matches!(o, RepositoryOutcome::RemoteUpdated { changed: true, .. }))
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, RepositoryOutcome::RemoteUpdated { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RepositoryOutcome::Failed { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&RepositoryOutcome) -> bool) -> usize {
        self.repositories.iter().filter(|r| pred(&r.outcome)).count()
    }
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

/// Clone or repoint every repository in `descriptors` under `root`.
pub fn reconcile(
    root: &Path,
    descriptors: &[RepositoryDescriptor],
    options: &ReconcileOptions,
    vcs: &dyn Vcs,
) -> Result<ReconcileReport, SyncError> {
    let mut report = ReconcileReport::default();

    for descriptor in descriptors {
        let target = root.join(descriptor.identifier.to_path());
        let origin = descriptor.origin(options.use_https);

        let outcome = match reconcile_one(descriptor, &target, &origin, vcs) {
            Ok(outcome) => outcome,
            Err(e) if options.mode == ReconcileMode::BestEffort => {
                tracing::warn!("{}: {e}", descriptor.identifier);
                RepositoryOutcome::Failed {
                    message: e.to_string(),
                }
            }
            Err(e) => return Err(e),
        };
        report.repositories.push(RepositoryReport {
            identifier: descriptor.identifier.clone(),
            origin,
            outcome,
        });
    }

    tracing::info!(
        "reconciled {} repositories: {} cloned, {} updated, {} failed",
        report.repositories.len(),
        report.cloned(),
        report.updated(),
        report.failed()
    );
    Ok(report)
}

fn reconcile_one(
    descriptor: &RepositoryDescriptor,
    target: &Path,
    origin: &str,
    vcs: &dyn Vcs,
) -> Result<RepositoryOutcome, SyncError> {
    let fail = |step: Step| {
        move |source: VcsError| SyncError::Repository {
            identifier: descriptor.identifier.to_string(),
            step,
            source,
        }
    };

    if !target.exists() {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        tracing::info!("cloning {} ({}) into {}", origin, descriptor.branch, target.display());
        vcs.clone_repository(origin, target, &descriptor.branch)
            .map_err(fail(Step::Clone))?;
        return Ok(RepositoryOutcome::Cloned);
    }

    let previous = vcs
        .remote_url(ORIGIN, target)
        .map_err(fail(Step::QueryRemote))?;
    if previous.is_none() {
        tracing::debug!("{}: adding remote {}", descriptor.identifier, ORIGIN);
        vcs.remote_add(ORIGIN, origin, target)
            .map_err(fail(Step::AddRemote))?;
    }
    vcs.remote_set_url(ORIGIN, origin, target)
        .map_err(fail(Step::SetUrl))?;

    let changed = previous.as_deref() != Some(origin);
    if changed {
        tracing::info!("{}: origin -> {}", descriptor.identifier, origin);
    } else {
        tracing::debug!("{}: origin unchanged", descriptor.identifier);
    }
    Ok(RepositoryOutcome::RemoteUpdated { previous, changed })
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

/// What [`reconcile`] would do for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum PlannedAction {
    Clone,
    AddRemote,
    SetUrl { from: String },
    UpToDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedRepository {
    pub identifier: RepoIdentifier,
    pub branch: String,
    pub origin: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub action: PlannedAction,
}

/// Read-only preview of [`reconcile`]. Only queries remotes; never clones
/// or rewrites anything.
pub fn plan(
    root: &Path,
    descriptors: &[RepositoryDescriptor],
    use_https: bool,
    vcs: &dyn Vcs,
) -> Result<Vec<PlannedRepository>, SyncError> {
    descriptors
        .iter()
        .map(|descriptor| {
            let path = root.join(descriptor.identifier.to_path());
            let origin = descriptor.origin(use_https);
            let action = if !path.exists() {
                PlannedAction::Clone
            } else {
                match vcs.remote_url(ORIGIN, &path) {
                    Ok(None) => PlannedAction::AddRemote,
                    Ok(Some(url)) if url == origin => PlannedAction::UpToDate,
                    Ok(Some(url)) => PlannedAction::SetUrl { from: url },
                    Err(source) => {
                        return Err(SyncError::Repository {
                            identifier: descriptor.identifier.to_string(),
                            step: Step::QueryRemote,
                            source,
                        })
                    }
                }
            };
            Ok(PlannedRepository {
                identifier: descriptor.identifier.clone(),
                branch: descriptor.branch.clone(),
                origin,
                path,
                action,
            })
        })
        .collect()
}
