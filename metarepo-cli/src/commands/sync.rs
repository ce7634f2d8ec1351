//! `metarepo sync`: clone missing repositories and repoint remotes.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use metarepo_sync::{
    pipeline, GitCli, PlannedAction, PlannedRepository, ReconcileMode, ReconcileOptions,
    ReconcileReport, RepositoryOutcome, Workspace,
};

/// Arguments for `metarepo sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Point remotes at HTTPS URLs instead of SSH.
    #[arg(long)]
    pub https: bool,

    /// Show what would happen without cloning or touching remotes.
    #[arg(long)]
    pub dry_run: bool,

    /// Carry on with the remaining repositories after a failure.
    #[arg(long)]
    pub keep_going: bool,
}

impl SyncArgs {
    pub fn run(self, workspace: Workspace) -> Result<()> {
        let use_https = self.https || workspace.config.use_https;
        let git = GitCli::new();

        if self.dry_run {
            let planned =
                pipeline::preview(&workspace, use_https, &git).context("failed to plan sync")?;
            print_plan(&planned);
            return Ok(());
        }

        let options = ReconcileOptions {
            use_https,
            mode: if self.keep_going {
                ReconcileMode::BestEffort
            } else {
                ReconcileMode::FailFast
            },
        };
        let report = pipeline::sync(&workspace, &options, &git).context("sync failed")?;
        print_report(&report);

        if !report.is_success() {
            bail!("{} of {} repositories failed", report.failed(), report.repositories.len());
        }
        Ok(())
    }
}

fn print_plan(planned: &[PlannedRepository]) {
    if planned.is_empty() {
        println!("[dry-run] manifest is empty, nothing to do");
        return;
    }
    for p in planned {
        let line = match &p.action {
            PlannedAction::Clone => format!("clone   {} ({}) from {}", p.identifier, p.branch, p.origin),
            PlannedAction::AddRemote => format!("remote  {} add origin {}", p.identifier, p.origin),
            PlannedAction::SetUrl { from } => {
                format!("remote  {} set-url {} -> {}", p.identifier, from, p.origin)
            }
            PlannedAction::UpToDate => format!("ok      {}", p.identifier),
        };
        println!("[dry-run] {line}");
    }
}

fn print_report(report: &ReconcileReport) {
    if report.repositories.is_empty() {
        println!("✓ manifest is empty, nothing to do");
        return;
    }

    println!(
        "✓ {} repositories ({} cloned, {} repointed, {} failed)",
        report.repositories.len(),
        report.cloned(),
        report.changed(),
        report.failed()
    );
    for r in &report.repositories {
        match &r.outcome {
            RepositoryOutcome::Cloned => {
                println!("  {}  {}", "+".green().bold(), r.identifier)
            }
            RepositoryOutcome::RemoteUpdated { changed: true, .. } => {
                println!("  {}  {} -> {}", "✎".yellow().bold(), r.identifier, r.origin)
            }
            RepositoryOutcome::RemoteUpdated { changed: false, .. } => {
                println!("  ·  {}", r.identifier)
            }
            RepositoryOutcome::Failed { message } => {
                println!("  {}  {}", "✗".red().bold(), message)
            }
        }
    }
}
