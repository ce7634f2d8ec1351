//! metarepo: keep a workspace of git repositories in line with its manifest.
//!
//! # Usage
//!
//! ```text
//! metarepo [--root <dir>] [--verbose] sync [--https] [--dry-run] [--keep-going]
//! metarepo [--root <dir>] [--verbose] status [--https] [--json]
//! metarepo [--root <dir>] [--verbose] add <name> --description <text>... [--default-branch <b>] [--retry-attempts <n>] [--https] [--dry-run]
//! metarepo [--root <dir>] [--verbose] readme [--check]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{add::AddArgs, readme::ReadmeArgs, status::StatusArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "metarepo",
    version,
    about = "Reconcile a workspace of git repositories against a manifest",
    long_about = None,
)]
struct Cli {
    /// Workspace root. Defaults to the current directory.
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clone missing repositories and repoint existing remotes.
    Sync(SyncArgs),

    /// Show what `sync` would do for every manifest entry.
    Status(StatusArgs),

    /// Create a new repository from the organization template.
    Add(AddArgs),

    /// Regenerate the workspace README from the manifest.
    Readme(ReadmeArgs),
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let workspace = commands::open_workspace(cli.root)?;
    match cli.command {
        Commands::Sync(args) => args.run(workspace),
        Commands::Status(args) => args.run(workspace),
        Commands::Add(args) => args.run(workspace),
        Commands::Readme(args) => args.run(workspace),
    }
}
