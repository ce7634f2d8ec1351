//! # metarepo-template
//!
//! Scaffolds new repositories from a template tree and renders the workspace
//! README.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use metarepo_core::TemplateLayout;
//! use metarepo_template::{instantiate, SubstitutionMap};
//!
//! let subs = SubstitutionMap::for_project("Docker.Tools");
//! let report = instantiate(
//!     Path::new("repositories/nuke-build/template"),
//!     Path::new("repositories/nuke-build/docker-tools"),
//!     &TemplateLayout::default(),
//!     &subs,
//! );
//! if let Ok(report) = report {
//!     println!("{} files, {} renames", report.copied_files, report.renamed.len());
//! }
//! ```

pub mod error;
pub mod instantiate;
pub mod readme;
pub mod substitution;

pub use error::TemplateError;
pub use instantiate::{instantiate, remove_vcs_metadata, InstantiateReport};
pub use readme::{ReadmeContext, ReadmeRenderer};
pub use substitution::{dashed_name, SubstitutionMap};
