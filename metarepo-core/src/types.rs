//! Domain types for the repository manifest.
//!
//! A [`RepositoryDescriptor`] is computed from an origin URL. Whatever form the
//! URL was written in (HTTPS, `ssh://` or scp-style `git@host:`), the derived
//! [`RepoIdentifier`] is the same, so the local directory never depends on
//! which transport a contributor happened to use.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// Branch assumed when a manifest entry has no `#branch` suffix.
pub const DEFAULT_BRANCH: &str = "master";

// ---------------------------------------------------------------------------
// RepoIdentifier
// ---------------------------------------------------------------------------

/// `org/name` path segment identifying a repository inside the workspace.
///
/// Always relative, `/`-separated, with no empty, `.` or `..` segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoIdentifier(String);

impl RepoIdentifier {
    /// Validate and wrap an identifier such as `nuke-build/common`.
    pub fn new(value: impl Into<String>) -> Result<Self, ManifestError> {
        let value = value.into();
        let segments: Vec<&str> = value.split('/').collect();
        if segments.len() < 2 {
            return Err(ManifestError::InvalidUrl {
                url: value,
                reason: "expected an <organization>/<name> path",
            });
        }
        if segments
            .iter()
            .any(|s| s.is_empty() || *s == "." || *s == ".." || s.contains('\\'))
        {
            return Err(ManifestError::InvalidUrl {
                url: value,
                reason: "path segments must be non-empty and must not be '.' or '..'",
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, the repository name.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Everything before the repository name.
    pub fn organization(&self) -> &str {
        self.0.rsplit_once('/').map(|(org, _)| org).unwrap_or("")
    }

    /// Relative filesystem path (one component per segment).
    pub fn to_path(&self) -> PathBuf {
        self.0.split('/').collect()
    }
}

impl fmt::Display for RepoIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for RepoIdentifier {
    type Error = ManifestError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RepoIdentifier> for String {
    fn from(id: RepoIdentifier) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// RepositoryDescriptor
// ---------------------------------------------------------------------------

/// One repository declared in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryDescriptor {
    /// Origin exactly as written in the manifest.
    pub raw_url: String,
    /// Hosting service, e.g. `github.com`.
    pub host: String,
    pub identifier: RepoIdentifier,
    pub branch: String,
}

impl RepositoryDescriptor {
    /// Parse an origin URL into a descriptor.
    ///
    /// Supports:
    /// - `https://github.com/org/name` (optionally `.git`, also `http://`)
    /// - `ssh://git@github.com/org/name.git`
    /// - `git@github.com:org/name.git`
    pub fn from_url(url: &str, branch: impl Into<String>) -> Result<Self, ManifestError> {
        let raw = url.trim();
        let (host, path) = split_host_and_path(raw)?;

        let path = path.trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let identifier = RepoIdentifier::new(path).map_err(|_| ManifestError::InvalidUrl {
            url: raw.to_string(),
            reason: "expected an <organization>/<name> path",
        })?;

        Ok(Self {
            raw_url: raw.to_string(),
            host,
            identifier,
            branch: branch.into(),
        })
    }

    /// Descriptor for a repository that does not exist yet (project scaffolding).
    pub fn new(host: &str, identifier: RepoIdentifier, branch: impl Into<String>) -> Self {
        let mut descriptor = Self {
            raw_url: String::new(),
            host: host.to_string(),
            identifier,
            branch: branch.into(),
        };
        descriptor.raw_url = descriptor.https_url();
        descriptor
    }

    pub fn https_url(&self) -> String {
        format!("https://{}/{}", self.host, self.identifier)
    }

    pub fn ssh_url(&self) -> String {
        format!("git@{}:{}.git", self.host, self.identifier)
    }

    /// The origin to configure locally.
    pub fn origin(&self, use_https: bool) -> String {
        if use_https {
            self.https_url()
        } else {
            self.ssh_url()
        }
    }

    /// Manifest line form: `<https-url>#<branch>`.
    pub fn manifest_entry(&self) -> String {
        format!("{}#{}", self.https_url(), self.branch)
    }
}

fn split_host_and_path(raw: &str) -> Result<(String, String), ManifestError> {
    let invalid = |reason| ManifestError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    if raw.is_empty() {
        return Err(invalid("empty URL"));
    }

    // scp-style: git@host:org/name.git
    if !raw.contains("://") {
        let Some((user_host, path)) = raw.split_once(':') else {
            return Err(invalid("expected https://, ssh:// or git@host: form"));
        };
        let host = user_host.rsplit('@').next().unwrap_or(user_host);
        if !user_host.contains('@') || host.is_empty() {
            return Err(invalid("expected https://, ssh:// or git@host: form"));
        }
        return Ok((host.to_string(), path.to_string()));
    }

    let parsed = url::Url::parse(raw).map_err(|_| invalid("malformed URL"))?;
    match parsed.scheme() {
        "https" | "http" | "ssh" => {}
        _ => return Err(invalid("unsupported scheme")),
    }
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("missing host"))?;
    // One host serves both URL forms; a port belongs to only one transport.
    if parsed.port().is_some() {
        return Err(invalid("explicit ports are not supported"));
    }
    Ok((host.to_string(), parsed.path().to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_and_ssh_forms_are_derived() {
        let d = RepositoryDescriptor::from_url("https://github.com/nuke-build/common", "master")
            .unwrap();
        assert_eq!(d.https_url(), "https://github.com/nuke-build/common");
        assert_eq!(d.ssh_url(), "git@github.com:nuke-build/common.git");
        assert_eq!(d.identifier.as_str(), "nuke-build/common");
    }

    #[test]
    fn scp_form_parses_host_and_path() {
        let d = RepositoryDescriptor::from_url("git@gitlab.com:group/sub/tool.git", "main").unwrap();
        assert_eq!(d.host, "gitlab.com");
        assert_eq!(d.identifier.as_str(), "group/sub/tool");
        assert_eq!(d.identifier.name(), "tool");
        assert_eq!(d.identifier.organization(), "group/sub");
    }

    #[test]
    fn origin_selects_transport() {
        let d = RepositoryDescriptor::from_url("https://example.com/org/a", "master").unwrap();
        assert!(d.origin(true).starts_with("https://"));
        assert!(d.origin(false).starts_with("git@"));
    }

    #[test]
    fn manifest_entry_uses_https() {
        let d = RepositoryDescriptor::from_url("git@example.com:org/a.git", "dev").unwrap();
        assert_eq!(d.manifest_entry(), "https://example.com/org/a#dev");
    }

    #[test]
    fn explicit_ports_are_rejected() {
        for url in ["ssh://git@example.com:2222/org/a.git", "https://example.com:8443/org/a"] {
            let err = RepositoryDescriptor::from_url(url, "master").unwrap_err();
            assert!(
                matches!(err, ManifestError::InvalidUrl { reason, .. } if reason.contains("port")),
                "{url}: {err}"
            );
        }
        // The scheme's own default port is not an explicit choice.
        assert!(RepositoryDescriptor::from_url("https://example.com:443/org/a", "master").is_ok());
    }

    #[test]
    fn identifier_rejects_traversal() {
        assert!(RepoIdentifier::new("org/../etc").is_err());
        assert!(RepoIdentifier::new("org//name").is_err());
        assert!(RepoIdentifier::new("single").is_err());
    }

    #[test]
    fn identifier_to_path_splits_segments() {
        let id = RepoIdentifier::new("org/name").unwrap();
        assert_eq!(id.to_path(), PathBuf::from("org").join("name"));
    }

    #[test]
    fn new_descriptor_records_https_as_raw_url() {
        let id = RepoIdentifier::new("nuke-build/foo").unwrap();
        let d = RepositoryDescriptor::new("github.com", id, "master");
        assert_eq!(d.raw_url, "https://github.com/nuke-build/foo");
    }
}
