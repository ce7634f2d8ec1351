//! Error types for metarepo-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from manifest and descriptor operations.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The manifest file is not a YAML list of strings.
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The manifest file did not exist at the expected path.
    #[error("manifest not found at {path}")]
    NotFound { path: PathBuf },

    /// A single `url#branch` entry could not be decoded.
    #[error("invalid manifest entry {index} in {path}: {source}")]
    Entry {
        path: PathBuf,
        /// 1-based position of the entry in the file.
        index: usize,
        #[source]
        source: Box<ManifestError>,
    },

    #[error("invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: &'static str },

    #[error("invalid manifest entry '{entry}': {reason}")]
    InvalidEntry { entry: String, reason: &'static str },

    /// Two entries resolve to the same local directory.
    #[error("repository '{identifier}' is listed more than once")]
    DuplicateIdentifier { identifier: String },
}

/// Errors raised while loading `metarepo.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A setting required by the requested command is absent.
    #[error("'{key}' must be set in {path}")]
    Missing { key: &'static str, path: PathBuf },
}

/// Failure to enter a scoped working directory.
#[derive(Debug, Error)]
#[error("cannot switch working directory to {path}: {source}")]
pub struct WorkdirError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}
