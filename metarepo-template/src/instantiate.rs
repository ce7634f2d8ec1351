//! Template instantiation: copy → content substitution → renames.
//!
//! ## Rename protocol
//!
//! 1. Walk the copied tree and compute the final path of every entry by
//!    substituting tokens in each name component (directories and files are
//!    governed separately by [`TemplateLayout`]).
//! 2. Reject the whole plan with [`TemplateError::NameCollision`] if two
//!    entries end at the same path. Nothing has been renamed at that point.
//! 3. Stage: move every renamed entry to a temporary name inside its
//!    template-named parent, deepest first.
//! 4. Settle: move every staged entry to its final name, shallowest first,
//!    so each parent already carries its final name.
//!
//! Staging frees every source name before any final name is taken, so a
//! rename may land on a name that another rename vacates.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use metarepo_core::TemplateLayout;
use walkdir::WalkDir;

use crate::error::{io_err, TemplateError};
use crate::substitution::SubstitutionMap;

/// What [`instantiate`] did, with paths relative to the target root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstantiateReport {
    pub copied_files: usize,
    /// Content-substituted files, in template naming.
    pub substituted: Vec<PathBuf>,
    /// `(before, after)` for every renamed directory, then every renamed file.
    pub renamed: Vec<(PathBuf, PathBuf)>,
}

/// Copy `template_dir` into `target_dir` and apply `substitutions` to the
/// allow-listed contents and to entry names.
pub fn instantiate(
    template_dir: &Path,
    target_dir: &Path,
    layout: &TemplateLayout,
    substitutions: &SubstitutionMap,
) -> Result<InstantiateReport, TemplateError> {
    if !template_dir.is_dir() {
        return Err(TemplateError::TemplateNotFound {
            path: template_dir.to_path_buf(),
        });
    }
    std::fs::create_dir_all(target_dir).map_err(|e| io_err(target_dir, e))?;

    let copied_files = copy_tree(template_dir, target_dir, &layout.skip_names)?;
    tracing::info!(
        "copied {} files from {} to {}",
        copied_files,
        template_dir.display(),
        target_dir.display()
    );

    for rel in &layout.content_files {
        fill_file(target_dir, rel, substitutions)?;
    }

    let plan = plan_renames(target_dir, layout, substitutions)?;
    let renamed = apply_renames(target_dir, &plan)?;
    tracing::info!("renamed {} entries", renamed.len());

    Ok(InstantiateReport {
        copied_files,
        substituted: layout.content_files.clone(),
        renamed,
    })
}

/// Delete `<dir>/.git` so the new repository starts without history.
/// Returns whether anything was removed.
pub fn remove_vcs_metadata(dir: &Path) -> Result<bool, TemplateError> {
    let git = dir.join(".git");
    let Ok(meta) = std::fs::symlink_metadata(&git) else {
        return Ok(false);
    };
    if meta.is_dir() {
        std::fs::remove_dir_all(&git).map_err(|e| io_err(&git, e))?;
    } else {
        std::fs::remove_file(&git).map_err(|e| io_err(&git, e))?;
    }
    tracing::debug!("removed {}", git.display());
    Ok(true)
}

// ---------------------------------------------------------------------------
// Copy
// ---------------------------------------------------------------------------

/// Relative paths under `root` in pre-order, siblings sorted by name, with a
/// flag for directories. Entries named in `skip` are pruned with their
/// subtrees.
fn walk_tree(root: &Path, skip: &[String]) -> Result<Vec<(PathBuf, bool)>, TemplateError> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !skip.iter().any(|s| OsStr::new(s) == e.file_name()))
    {
        let entry = entry.map_err(|e| walk_err(root, e))?;
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        entries.push((rel.to_path_buf(), entry.file_type().is_dir()));
    }
    Ok(entries)
}

fn walk_err(root: &Path, e: walkdir::Error) -> TemplateError {
    let path = e.path().unwrap_or(root).to_path_buf();
    io_err(path, e.into())
}

fn copy_tree(src: &Path, dst: &Path, skip: &[String]) -> Result<usize, TemplateError> {
    let mut copied = 0;
    for (rel, is_dir) in walk_tree(src, skip)? {
        let from = src.join(&rel);
        let to = dst.join(&rel);
        if is_dir {
            std::fs::create_dir_all(&to).map_err(|e| io_err(&to, e))?;
            continue;
        }
        if to.exists() {
            return Err(TemplateError::TargetExists { path: to });
        }
        std::fs::copy(&from, &to).map_err(|e| io_err(&from, e))?;
        copied += 1;
    }
    Ok(copied)
}

// ---------------------------------------------------------------------------
// Content substitution
// ---------------------------------------------------------------------------

fn fill_file(root: &Path, rel: &Path, substitutions: &SubstitutionMap) -> Result<(), TemplateError> {
    let path = root.join(rel);
    if !path.is_file() {
        return Err(TemplateError::MissingContentFile { path });
    }
    let bytes = std::fs::read(&path).map_err(|e| io_err(&path, e))?;
    let Ok(text) = String::from_utf8(bytes) else {
        return Err(TemplateError::NotUtf8 { path });
    };
    if substitutions.matches(&text) {
        std::fs::write(&path, substitutions.apply(&text)).map_err(|e| io_err(&path, e))?;
        tracing::debug!("substituted {}", rel.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Renames
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct PlannedRename {
    from: PathBuf,
    to: PathBuf,
    is_dir: bool,
    /// Temporary name, a sibling of `from`, held between stage and settle.
    staged: PathBuf,
}

fn staging_name(index: usize) -> String {
    format!(".metarepo-rename-{index}")
}

fn substitute_component(name: &OsStr, substitutions: &SubstitutionMap) -> PathBuf {
    match name.to_str() {
        Some(s) if substitutions.matches(s) => PathBuf::from(substitutions.apply(s)),
        _ => PathBuf::from(name),
    }
}

/// Final relative path of `rel`: ancestors are directories; the last
/// component is a directory or a file according to `is_dir`.
fn final_path(
    rel: &Path,
    is_dir: bool,
    layout: &TemplateLayout,
    substitutions: &SubstitutionMap,
) -> PathBuf {
    let components: Vec<&OsStr> = rel.iter().collect();
    let last = components.len().saturating_sub(1);
    components
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let rename = if i < last || is_dir {
                layout.rename_directories
            } else {
                layout.rename_files
            };
            if rename {
                substitute_component(name, substitutions)
            } else {
                PathBuf::from(name)
            }
        })
        .collect()
}

fn plan_renames(
    root: &Path,
    layout: &TemplateLayout,
    substitutions: &SubstitutionMap,
) -> Result<Vec<PlannedRename>, TemplateError> {
    if substitutions.is_empty() || (!layout.rename_directories && !layout.rename_files) {
        return Ok(vec![]);
    }

    let entries = walk_tree(root, &[])?;

    let mut finals: HashSet<PathBuf> = HashSet::new();
    let mut plan = Vec::new();
    for (rel, is_dir) in entries {
        let target = final_path(&rel, is_dir, layout, substitutions);
        if !finals.insert(target.clone()) {
            return Err(TemplateError::NameCollision {
                from: root.join(&rel),
                to: root.join(target),
            });
        }
        let renamed_here = rel.file_name() != target.file_name();
        if renamed_here {
            let staged = rel.with_file_name(staging_name(plan.len()));
            if root.join(&staged).exists() {
                return Err(TemplateError::NameCollision {
                    from: root.join(&rel),
                    to: root.join(staged),
                });
            }
            plan.push(PlannedRename {
                from: rel,
                to: target,
                is_dir,
                staged,
            });
        }
    }
    Ok(plan)
}

fn apply_renames(
    root: &Path,
    plan: &[PlannedRename],
) -> Result<Vec<(PathBuf, PathBuf)>, TemplateError> {
    let depth = |p: &&PlannedRename| p.from.components().count();

    // Stage, deepest first: every ancestor still has its template name.
    let mut order: Vec<&PlannedRename> = plan.iter().collect();
    order.sort_by_key(|p| std::cmp::Reverse(depth(p)));
    for p in &order {
        rename(&root.join(&p.from), &root.join(&p.staged))?;
    }

    // Settle, shallowest first: every ancestor already has its final name.
    order.reverse();
    for p in &order {
        let parent = p.to.parent().unwrap_or(Path::new(""));
        let staged = root
            .join(parent)
            .join(p.staged.file_name().unwrap_or_default());
        rename(&staged, &root.join(&p.to))?;
    }

    let dirs = plan.iter().filter(|p| p.is_dir);
    let files = plan.iter().filter(|p| !p.is_dir);
    Ok(dirs
        .chain(files)
        .map(|p| (p.from.clone(), p.to.clone()))
        .collect())
}

fn rename(from: &Path, to: &Path) -> Result<(), TemplateError> {
    if to.exists() {
        return Err(TemplateError::NameCollision {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
    }
    std::fs::rename(from, to).map_err(|e| io_err(from, e))?;
    tracing::debug!("renamed {} -> {}", from.display(), to.display());
    Ok(())
}
