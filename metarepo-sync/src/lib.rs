//! # metarepo-sync
//!
//! Reconciliation of a workspace against its manifest, and the project
//! scaffolding pipeline.
//!
//! Call [`pipeline::sync`] to clone missing repositories and repoint existing
//! remotes, [`pipeline::preview`] for a read-only plan, [`add_project`] to
//! create a repository from the template, or [`write_readme`] to regenerate
//! the workspace README. All git access goes through the [`Vcs`] trait;
//! [`GitCli`] is the production implementation.

pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod scaffold;
pub mod vcs;
pub mod writer;

pub use error::{Step, SyncError, VcsError};
pub use pipeline::Workspace;
pub use reconcile::{
    plan, reconcile, PlannedAction, PlannedRepository, ReconcileMode, ReconcileOptions,
    ReconcileReport, RepositoryOutcome, RepositoryReport,
};
pub use scaffold::{add_project, AddProjectOutcome, AddProjectRequest};
pub use vcs::{GitCli, Vcs};
pub use writer::{render_readme, write_readme, WriteResult};
