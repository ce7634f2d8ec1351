//! README generation from the reconciled repository list.
//!
//! The README is a derived artifact: its only input is the manifest's
//! descriptors. Rendering uses an embedded Tera template, optionally replaced
//! by a user-supplied one.

use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};

use metarepo_core::RepositoryDescriptor;

use crate::error::{io_err, TemplateError};

const README_TEMPLATE_NAME: &str = "readme.md";
const README_TEMPLATE: &str = include_str!("templates/readme.md.tera");

/// One table row.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryRow {
    pub identifier: String,
    pub organization: String,
    pub name: String,
    pub url: String,
    pub branch: String,
}

impl From<&RepositoryDescriptor> for RepositoryRow {
    fn from(d: &RepositoryDescriptor) -> Self {
        Self {
            identifier: d.identifier.to_string(),
            organization: d.identifier.organization().to_string(),
            name: d.identifier.name().to_string(),
            url: d.https_url(),
            branch: d.branch.clone(),
        }
    }
}

/// Rendering payload.
#[derive(Debug, Clone, Serialize)]
pub struct ReadmeContext {
    pub title: String,
    pub description: Option<String>,
    /// Sorted by identifier.
    pub repositories: Vec<RepositoryRow>,
}

impl ReadmeContext {
    pub fn new(title: impl Into<String>, descriptors: &[RepositoryDescriptor]) -> Self {
        let mut repositories: Vec<RepositoryRow> = descriptors.iter().map(Into::into).collect();
        repositories.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Self {
            title: title.into(),
            description: None,
            repositories,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Create once and reuse.
pub struct ReadmeRenderer {
    tera: Tera,
}

impl ReadmeRenderer {
    /// Renderer using the embedded template.
    pub fn new() -> Result<Self, TemplateError> {
        Self::build(README_TEMPLATE)
    }

    /// Renderer using the Tera template at `path` instead of the embedded one.
    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let source = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Self::build(&source)
    }

    fn build(source: &str) -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_template(README_TEMPLATE_NAME, source)?;
        Ok(Self { tera })
    }

    /// Render with LF line endings.
    pub fn render(&self, ctx: &ReadmeContext) -> Result<String, TemplateError> {
        let tera_ctx = Context::from_serialize(ctx)?;
        let rendered = self.tera.render(README_TEMPLATE_NAME, &tera_ctx)?;
        Ok(rendered.replace("\r\n", "\n"))
    }
}
