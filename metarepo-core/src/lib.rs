//! metarepo core library: repository descriptors, manifest persistence,
//! workspace configuration and the small process helpers shared by the
//! other crates.
//!
//! - [`types`]: [`RepositoryDescriptor`] and [`RepoIdentifier`]
//! - [`manifest`]: load / save / append of `repositories.yml`
//! - [`config`]: `metarepo.yaml`
//! - [`workdir`]: scoped working directory
//! - [`retry`]: bounded retry

pub mod config;
pub mod error;
pub mod fs;
pub mod manifest;
pub mod retry;
pub mod types;
pub mod workdir;

pub use config::{TemplateLayout, WorkspaceConfig};
pub use error::{ConfigError, ManifestError, WorkdirError};
pub use retry::{with_retry, RetryError, RetryPolicy};
pub use types::{RepoIdentifier, RepositoryDescriptor, DEFAULT_BRANCH};
pub use workdir::{with_working_directory, WorkingDirectory};
