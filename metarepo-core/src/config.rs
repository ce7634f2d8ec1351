//! Workspace configuration: `metarepo.yaml` at the workspace root.
//!
//! Every key is optional:
//!
//! ```yaml
//! organization: nuke-build
//! host: github.com
//! repositories_dir: repositories
//! manifest: repositories.yml
//! template: template
//! default_branch: master
//! use_https: false
//! retry_attempts: 5
//! prepare_command: ["dotnet", "restore"]
//! commit_manifest: true
//! readme: README.md
//! readme_title: NUKE
//! readme_template: docs/readme.md.tera
//! layout:
//!   content_files:
//!     - .nuke
//!     - nuke-template.sln
//!   rename_directories: true
//!   rename_files: true
//!   skip_names: [.git]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::retry::RetryPolicy;
use crate::types::{RepoIdentifier, DEFAULT_BRANCH};

pub const CONFIG_FILE: &str = "metarepo.yaml";

/// Which parts of a template tree receive substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateLayout {
    /// Relative paths (as named in the template) whose contents are rewritten.
    /// No other file's content is ever touched.
    pub content_files: Vec<PathBuf>,
    pub rename_directories: bool,
    pub rename_files: bool,
    /// Entry names never copied out of the template.
    pub skip_names: Vec<String>,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self {
            content_files: vec![],
            rename_directories: true,
            rename_files: true,
            skip_names: vec![".git".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Organization new projects are created under. Required by `add`.
    pub organization: Option<String>,
    pub host: String,
    pub repositories_dir: PathBuf,
    pub manifest: PathBuf,
    /// Template repository name inside the organization.
    pub template: String,
    pub default_branch: String,
    pub use_https: bool,
    pub retry_attempts: u32,
    /// Generation step run inside a freshly scaffolded repository.
    pub prepare_command: Option<Vec<String>>,
    /// Commit the manifest change in the workspace repository after `add`.
    pub commit_manifest: bool,
    pub readme: PathBuf,
    /// README heading. Falls back to the organization, then the root
    /// directory name.
    pub readme_title: Option<String>,
    /// Tera template replacing the built-in README layout.
    pub readme_template: Option<PathBuf>,
    pub layout: TemplateLayout,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            organization: None,
            host: "github.com".to_string(),
            repositories_dir: PathBuf::from("repositories"),
            manifest: PathBuf::from("repositories.yml"),
            template: "template".to_string(),
            default_branch: DEFAULT_BRANCH.to_string(),
            use_https: false,
            retry_attempts: RetryPolicy::default().max_attempts,
            prepare_command: None,
            commit_manifest: true,
            readme: PathBuf::from("README.md"),
            readme_title: None,
            readme_template: None,
            layout: TemplateLayout::default(),
        }
    }
}

impl WorkspaceConfig {
    /// Load `<root>/metarepo.yaml`, falling back to defaults when absent.
    pub fn load_at(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!("no {} in {}, using defaults", CONFIG_FILE, root.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        root.join(&self.manifest)
    }

    pub fn repositories_path(&self, root: &Path) -> PathBuf {
        root.join(&self.repositories_dir)
    }

    pub fn readme_path(&self, root: &Path) -> PathBuf {
        root.join(&self.readme)
    }

    pub fn readme_template_path(&self, root: &Path) -> Option<PathBuf> {
        self.readme_template.as_ref().map(|p| root.join(p))
    }

    pub fn readme_title(&self, root: &Path) -> String {
        self.readme_title
            .clone()
            .or_else(|| self.organization.clone())
            .or_else(|| {
                root.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "Repositories".to_string())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts)
    }

    pub fn organization(&self, root: &Path) -> Result<&str, ConfigError> {
        self.organization
            .as_deref()
            .filter(|o| !o.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing {
                key: "organization",
                path: root.join(CONFIG_FILE),
            })
    }

    /// `<repositories>/<organization>/<template>`
    pub fn template_path(&self, root: &Path) -> Result<PathBuf, ConfigError> {
        let org = self.organization(root)?;
        let id = RepoIdentifier::new(format!("{org}/{}", self.template)).map_err(|_| {
            ConfigError::Missing {
                key: "template",
                path: root.join(CONFIG_FILE),
            }
        })?;
        Ok(self.repositories_path(root).join(id.to_path()))
    }
}
