//! `metarepo add`: create a new repository from the organization template.
//!
//! ## Pipeline
//!
//! 1. Validate: the identifier `<organization>/<dashed-name>` must be neither
//!    listed in the manifest nor present as a non-empty directory.
//! 2. Inside the new repository directory (scoped working directory):
//!    instantiate the template, drop `.git`, run the prepare command with
//!    retry, then `init`, `checkout -b`, an empty initial commit, `add .` and
//!    a commit of the template files.
//! 3. Append the HTTPS entry to the manifest (sorted, atomic).
//! 4. Optionally commit the manifest in the workspace repository.
//! 5. Reconcile again so the new repository gets its `origin`.
//!
//! A failure in step 2 leaves the manifest untouched.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use metarepo_core::{
    manifest, with_retry, with_working_directory, ManifestError, RepoIdentifier,
    RepositoryDescriptor, RetryPolicy,
};
use metarepo_template::{
    dashed_name, instantiate, remove_vcs_metadata, InstantiateReport, SubstitutionMap,
    TemplateError,
};

use crate::error::{io_err, SyncError};
use crate::pipeline::Workspace;
use crate::reconcile::{reconcile, ReconcileMode, ReconcileOptions, ReconcileReport};
use crate::vcs::{run_command, Vcs};

pub const INITIAL_COMMIT_MESSAGE: &str = "Initialize repository";
pub const TEMPLATE_COMMIT_MESSAGE: &str = "Add template files";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddProjectRequest {
    /// Display name, e.g. `Docker.Tools`. Substituted for `Template`.
    pub name: String,
    /// Body of the template commit.
    pub description: String,
    /// Overrides the configured default branch.
    pub default_branch: Option<String>,
    pub dry_run: bool,
}

impl AddProjectRequest {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            default_branch: None,
            dry_run: false,
        }
    }
}

#[derive(Debug)]
pub enum AddProjectOutcome {
    /// Nothing was written.
    DryRun {
        descriptor: RepositoryDescriptor,
        repository: PathBuf,
        /// Unified diff of the manifest change.
        manifest_diff: String,
    },
    Created {
        descriptor: RepositoryDescriptor,
        repository: PathBuf,
        instantiated: InstantiateReport,
        reconciled: ReconcileReport,
    },
}

/// Scaffold `request.name` under the configured organization.
pub fn add_project(
    workspace: &Workspace,
    request: &AddProjectRequest,
    vcs: &dyn Vcs,
) -> Result<AddProjectOutcome, SyncError> {
    let config = &workspace.config;
    validate(request)?;

    let organization = config.organization(&workspace.root)?;
    let dashed = dashed_name(request.name.trim());
    let identifier = RepoIdentifier::new(format!("{organization}/{dashed}"))?;
    let branch = request
        .default_branch
        .clone()
        .unwrap_or_else(|| config.default_branch.clone());
    let descriptor = RepositoryDescriptor::new(&config.host, identifier.clone(), branch.clone());

    let manifest_path = workspace.manifest_path();
    let current = load_or_empty(&manifest_path)?;
    if current.iter().any(|d| d.identifier == identifier) {
        return Err(SyncError::ProjectExists {
            identifier: identifier.to_string(),
            reason: "already listed in the manifest",
        });
    }
    let repository = workspace.repository_path(&descriptor);
    if is_non_empty_dir(&repository)? {
        return Err(SyncError::ProjectExists {
            identifier: identifier.to_string(),
            reason: "directory is not empty",
        });
    }
    let template_dir = config.template_path(&workspace.root)?;
    if !template_dir.is_dir() {
        return Err(TemplateError::TemplateNotFound { path: template_dir }.into());
    }

    if request.dry_run {
        let mut after = current;
        after.push(descriptor.clone());
        let manifest_diff = manifest_diff(workspace, &manifest_path, &after)?;
        tracing::info!("[dry-run] would create {} at {}", identifier, repository.display());
        return Ok(AddProjectOutcome::DryRun {
            descriptor,
            repository,
            manifest_diff,
        });
    }

    tracing::info!("creating {} ({}): {}", identifier, branch, request.description);
    // The scope switches the process directory; every path used inside it
    // must be absolute.
    let template_dir = std::fs::canonicalize(&template_dir).map_err(|e| io_err(&template_dir, e))?;
    let substitutions = SubstitutionMap::for_project(request.name.trim());

    let instantiated = with_working_directory(&repository, |dir| -> Result<_, SyncError> {
        let report = instantiate(&template_dir, dir, &config.layout, &substitutions)?;
        remove_vcs_metadata(dir)?;
        if let Some(command) = &config.prepare_command {
            run_prepare(command, dir, config.retry_policy())?;
        }
        vcs.init(dir)?;
        vcs.checkout_new_branch(&branch, dir)?;
        vcs.commit(INITIAL_COMMIT_MESSAGE, dir, true)?;
        vcs.add_all(dir)?;
        vcs.commit(&template_commit_message(&request.description), dir, false)?;
        Ok(report)
    })?;

    let descriptors = manifest::append_at(&manifest_path, descriptor.clone())?;
    tracing::info!("added {} to {}", identifier, manifest_path.display());

    if config.commit_manifest {
        let relative = manifest_path
            .strip_prefix(&workspace.root)
            .unwrap_or(&manifest_path);
        vcs.add_path(relative, &workspace.root)?;
        vcs.commit(&format!("Add {dashed}"), &workspace.root, false)?;
    }

    let options = ReconcileOptions {
        use_https: config.use_https,
        mode: ReconcileMode::FailFast,
    };
    let reconciled = reconcile(&workspace.repositories_path(), &descriptors, &options, vcs)?;

    Ok(AddProjectOutcome::Created {
        descriptor,
        repository,
        instantiated,
        reconciled,
    })
}

fn validate(request: &AddProjectRequest) -> Result<(), SyncError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(SyncError::InvalidRequest("project name is empty"));
    }
    if name.contains(['/', '\\']) {
        return Err(SyncError::InvalidRequest(
            "project name must not contain path separators",
        ));
    }
    if request.description.trim().is_empty() {
        return Err(SyncError::InvalidRequest("description is empty"));
    }
    if matches!(&request.default_branch, Some(b) if b.trim().is_empty()) {
        return Err(SyncError::InvalidRequest("default branch is empty"));
    }
    Ok(())
}

fn template_commit_message(description: &str) -> String {
    format!("{TEMPLATE_COMMIT_MESSAGE}\n\n{}", description.trim())
}

/// Run the configured generation step in `cwd`, retried per `policy`.
fn run_prepare(command: &[String], cwd: &Path, policy: RetryPolicy) -> Result<(), SyncError> {
    let Some((program, args)) = command.split_first() else {
        return Ok(());
    };
    with_retry(policy, |attempt| {
        tracing::info!("prepare (attempt {attempt}): {}", command.join(" "));
        run_command(program, args, cwd)
    })?;
    Ok(())
}

fn load_or_empty(path: &Path) -> Result<Vec<RepositoryDescriptor>, SyncError> {
    match manifest::load_at(path) {
        Ok(d) => Ok(d),
        Err(ManifestError::NotFound { .. }) => Ok(vec![]),
        Err(e) => Err(e.into()),
    }
}

fn is_non_empty_dir(path: &Path) -> Result<bool, SyncError> {
    match std::fs::read_dir(path) {
        Ok(mut entries) => Ok(entries.next().is_some()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_err(path, e)),
    }
}

fn manifest_diff(
    workspace: &Workspace,
    manifest_path: &Path,
    after: &[RepositoryDescriptor],
) -> Result<String, SyncError> {
    let before = match std::fs::read_to_string(manifest_path) {
        Ok(content) => content.replace("\r\n", "\n"),
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(io_err(manifest_path, e)),
    };
    let after = manifest::to_yaml(after)?;

    let relative = manifest_path
        .strip_prefix(&workspace.root)
        .unwrap_or(manifest_path);
    let old_header = format!("a/{}", relative.display());
    let new_header = format!("b/{}", relative.display());
    Ok(TextDiff::from_lines(&before, &after)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string())
}
