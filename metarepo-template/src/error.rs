//! Error types for metarepo-template.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while instantiating a template or rendering the
/// README.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Filesystem error, with the path that failed.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template directory not found: {path}")]
    TemplateNotFound { path: PathBuf },

    /// Copying would overwrite a file already present in the target.
    #[error("refusing to overwrite existing file {path}")]
    TargetExists { path: PathBuf },

    /// A path in `content_files` is not present in the copied tree.
    #[error("content file listed in the template layout is missing: {path}")]
    MissingContentFile { path: PathBuf },

    #[error("content file is not valid UTF-8: {path}")]
    NotUtf8 { path: PathBuf },

    /// A rename would land on an existing entry or on another rename's target.
    #[error("rename of {from} would collide with {to}")]
    NameCollision { from: PathBuf, to: PathBuf },

    /// Tera template engine error (README rendering).
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> TemplateError {
    TemplateError::Io {
        path: path.into(),
        source,
    }
}
