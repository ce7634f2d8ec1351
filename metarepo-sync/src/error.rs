//! Error types for metarepo-sync.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use metarepo_core::{ConfigError, ManifestError, RetryError, WorkdirError};
use metarepo_template::TemplateError;

/// Failure of an external command (`git` or the prepare step).
#[derive(Debug, Error)]
pub enum VcsError {
    /// The process could not be started at all.
    #[error("failed to run `{command}` in {cwd}: {source}")]
    Spawn {
        command: String,
        cwd: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited unsuccessfully.
    #[error("`{command}` failed in {cwd} ({}): {stderr}", describe_code(.code))]
    CommandFailed {
        command: String,
        cwd: PathBuf,
        /// `None` when terminated by a signal.
        code: Option<i32>,
        stderr: String,
    },

    /// A remote operation targeted a directory without its own `.git`, where
    /// git would act on an enclosing repository instead.
    #[error("{path} is not a git repository")]
    NotARepository { path: PathBuf },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "terminated by signal".to_string(),
    }
}

/// The reconciliation step a repository failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Clone,
    QueryRemote,
    AddRemote,
    SetUrl,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::Clone => "clone",
            Step::QueryRemote => "remote query",
            Step::AddRemote => "remote add",
            Step::SetUrl => "remote set-url",
        };
        f.write_str(s)
    }
}

/// All errors that can arise from sync and scaffolding operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Workdir(#[from] WorkdirError),

    /// The prepare command kept failing.
    #[error("prepare step failed: {0}")]
    Prepare(#[from] RetryError<VcsError>),

    /// One manifest entry could not be reconciled.
    #[error("{identifier}: {step} failed: {source}")]
    Repository {
        identifier: String,
        step: Step,
        #[source]
        source: VcsError,
    },

    #[error("invalid project request: {0}")]
    InvalidRequest(&'static str),

    #[error("project '{identifier}' already exists ({reason})")]
    ProjectExists {
        identifier: String,
        reason: &'static str,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
