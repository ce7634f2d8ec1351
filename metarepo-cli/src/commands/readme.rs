//! `metarepo readme`: regenerate the repository table.

use anyhow::{bail, Context, Result};
use clap::Args;

use metarepo_sync::{write_readme, Workspace, WriteResult};

/// Arguments for `metarepo readme`.
#[derive(Args, Debug)]
pub struct ReadmeArgs {
    /// Fail instead of writing when the README is out of date.
    #[arg(long)]
    pub check: bool,
}

impl ReadmeArgs {
    pub fn run(self, workspace: Workspace) -> Result<()> {
        let result = write_readme(&workspace, self.check).context("failed to render README")?;
        match result {
            WriteResult::Written { path } => println!("✎  wrote {}", path.display()),
            WriteResult::Unchanged { path } => println!("·  {} is up to date", path.display()),
            WriteResult::WouldWrite { path } => {
                bail!("{} is out of date; run `metarepo readme`", path.display())
            }
        }
        Ok(())
    }
}
