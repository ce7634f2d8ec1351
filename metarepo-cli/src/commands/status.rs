//! `metarepo status`: per-repository view of what `sync` would change.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use metarepo_sync::{pipeline, GitCli, PlannedAction, PlannedRepository, Workspace};

/// Arguments for `metarepo status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Compare remotes against HTTPS URLs instead of SSH.
    #[arg(long)]
    pub https: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, workspace: Workspace) -> Result<()> {
        let use_https = self.https || workspace.config.use_https;
        let planned = pipeline::preview(&workspace, use_https, &GitCli::new()).with_context(|| {
            format!(
                "failed to read {}; is this a metarepo workspace?",
                workspace.manifest_path().display()
            )
        })?;

        if self.json {
            print_json(&planned)?;
            return Ok(());
        }
        print_table(&planned);
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusReportJson<'a> {
    summary: StatusSummaryJson,
    repositories: &'a [PlannedRepository],
}

#[derive(Serialize)]
struct StatusSummaryJson {
    repositories: usize,
    missing: usize,
    needs_sync: usize,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "branch")]
    branch: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn summary(planned: &[PlannedRepository]) -> StatusSummaryJson {
    StatusSummaryJson {
        repositories: planned.len(),
        missing: planned
            .iter()
            .filter(|p| p.action == PlannedAction::Clone)
            .count(),
        needs_sync: planned
            .iter()
            .filter(|p| p.action != PlannedAction::UpToDate)
            .count(),
    }
}

fn print_json(planned: &[PlannedRepository]) -> Result<()> {
    let payload = StatusReportJson {
        summary: summary(planned),
        repositories: planned,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(planned: &[PlannedRepository]) {
    let summary = summary(planned);
    println!(
        "metarepo v{} | {} repositories | {} missing | {} need sync",
        env!("CARGO_PKG_VERSION"),
        summary.repositories,
        summary.missing,
        summary.needs_sync,
    );

    if planned.is_empty() {
        println!("No repositories in the manifest.");
        return;
    }

    println!(
        "Indicators: {} CURRENT  {} MISSING  {} NO REMOTE  {} MISMATCH",
        indicator(&PlannedAction::UpToDate),
        indicator(&PlannedAction::Clone),
        indicator(&PlannedAction::AddRemote),
        indicator(&PlannedAction::SetUrl {
            from: String::new()
        }),
    );
    let rows: Vec<StatusTableRow> = planned
        .iter()
        .map(|p| StatusTableRow {
            repository: p.identifier.to_string(),
            branch: p.branch.clone(),
            status: format!("{} {}", indicator(&p.action), label(&p.action)),
            detail: detail(p),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if summary.needs_sync > 0 {
        println!("Run 'metarepo sync' to update the workspace.");
    }
}

fn label(action: &PlannedAction) -> &'static str {
    match action {
        PlannedAction::UpToDate => "CURRENT",
        PlannedAction::Clone => "MISSING",
        PlannedAction::AddRemote => "NO REMOTE",
        PlannedAction::SetUrl { .. } => "MISMATCH",
    }
}

fn indicator(action: &PlannedAction) -> String {
    match action {
        PlannedAction::UpToDate => "■".green().bold().to_string(),
        PlannedAction::Clone => "■".bright_black().bold().to_string(),
        PlannedAction::AddRemote => "■".yellow().bold().to_string(),
        PlannedAction::SetUrl { .. } => "■".red().bold().to_string(),
    }
}

fn detail(p: &PlannedRepository) -> String {
    match &p.action {
        PlannedAction::UpToDate => p.origin.clone(),
        PlannedAction::Clone => format!("not cloned ({})", p.origin),
        PlannedAction::AddRemote => "origin not configured".to_string(),
        PlannedAction::SetUrl { from } => format!("origin is {from}"),
    }
}
