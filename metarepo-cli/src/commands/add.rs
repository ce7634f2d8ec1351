//! `metarepo add`: scaffold a new repository from the template.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use metarepo_sync::{add_project, AddProjectOutcome, AddProjectRequest, GitCli, Workspace};

/// Arguments for `metarepo add`.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Project name, e.g. `Docker.Tools`. The repository is named after its
    /// dashed lower-case form.
    pub name: String,

    /// What the project is for; becomes the body of the template commit.
    #[arg(long, short, required = true, num_args = 1.., value_name = "TEXT")]
    pub description: Vec<String>,

    /// Initial branch (defaults to `default_branch` from metarepo.yaml).
    #[arg(long, value_name = "BRANCH")]
    pub default_branch: Option<String>,

    /// Attempts for the prepare command (defaults to `retry_attempts`).
    #[arg(long, value_name = "N")]
    pub retry_attempts: Option<u32>,

    /// Point the new remote at HTTPS instead of SSH.
    #[arg(long)]
    pub https: bool,

    /// Print the manifest change without creating anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl AddArgs {
    pub fn run(self, mut workspace: Workspace) -> Result<()> {
        if let Some(n) = self.retry_attempts {
            workspace.config.retry_attempts = n;
        }
        if self.https {
            workspace.config.use_https = true;
        }

        let request = AddProjectRequest {
            name: self.name.clone(),
            description: self.description.join(" "),
            default_branch: self.default_branch,
            dry_run: self.dry_run,
        };
        let outcome = add_project(&workspace, &request, &GitCli::new())
            .with_context(|| format!("failed to add project '{}'", self.name))?;

        match outcome {
            AddProjectOutcome::DryRun {
                descriptor,
                repository,
                manifest_diff,
            } => {
                println!(
                    "[dry-run] would create {} ({}) at {}",
                    descriptor.identifier,
                    descriptor.branch,
                    repository.display()
                );
                print!("{manifest_diff}");
                if !manifest_diff.ends_with('\n') {
                    println!();
                }
            }
            AddProjectOutcome::Created {
                descriptor,
                repository,
                instantiated,
                reconciled,
            } => {
                println!(
                    "{} created {} at {}",
                    "✓".green().bold(),
                    descriptor.identifier,
                    repository.display()
                );
                println!(
                    "  {} files copied, {} renamed, {} substituted",
                    instantiated.copied_files,
                    instantiated.renamed.len(),
                    instantiated.substituted.len()
                );
                println!("  {}", descriptor.https_url());
                println!(
                    "  workspace synced ({} repositories, {} cloned)",
                    reconciled.repositories.len(),
                    reconciled.cloned()
                );
            }
        }
        Ok(())
    }
}
