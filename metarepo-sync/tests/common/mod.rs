//! In-memory [`Vcs`] that records every call.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use metarepo_sync::{Vcs, VcsError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Clone {
        url: String,
        target: PathBuf,
        branch: String,
    },
    RemoteUrl {
        cwd: PathBuf,
    },
    RemoteAdd {
        url: String,
        cwd: PathBuf,
    },
    SetUrl {
        url: String,
        cwd: PathBuf,
    },
    Init {
        cwd: PathBuf,
    },
    Checkout {
        branch: String,
        cwd: PathBuf,
    },
    Commit {
        message: String,
        cwd: PathBuf,
        allow_empty: bool,
    },
    AddAll {
        cwd: PathBuf,
    },
    AddPath {
        path: PathBuf,
        cwd: PathBuf,
    },
}

impl Call {
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Call::RemoteUrl { .. })
    }
}

/// Clones create the target directory with an empty `.git`; remotes are
/// tracked per repository directory.
#[derive(Default)]
pub struct RecordingVcs {
    calls: RefCell<Vec<Call>>,
    remotes: RefCell<HashMap<PathBuf, String>>,
    /// `(operation, needle)`: fail `operation` when the URL or path contains
    /// `needle`.
    fail_on: Option<(&'static str, String)>,
}

fn key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

impl RecordingVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(operation: &'static str, needle: &str) -> Self {
        Self {
            fail_on: Some((operation, needle.to_string())),
            ..Self::default()
        }
    }

    /// Pretend `dir` is a repository whose origin is `url`.
    pub fn seed_remote(&self, dir: &Path, url: &str) {
        std::fs::create_dir_all(dir.join(".git")).unwrap();
        self.remotes.borrow_mut().insert(key(dir), url.to_string());
    }

    pub fn origin_of(&self, dir: &Path) -> Option<String> {
        self.remotes.borrow().get(&key(dir)).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn clones(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Clone { url, branch, .. } => Some((url, branch)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn check(&self, operation: &str, subject: &str, cwd: &Path) -> Result<(), VcsError> {
        match &self.fail_on {
            Some((op, needle)) if *op == operation && subject.contains(needle.as_str()) => {
                Err(VcsError::CommandFailed {
                    command: format!("git {operation}"),
                    cwd: cwd.to_path_buf(),
                    code: Some(128),
                    stderr: "simulated failure".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl Vcs for RecordingVcs {
    fn clone_repository(&self, url: &str, target: &Path, branch: &str) -> Result<(), VcsError> {
        self.record(Call::Clone {
            url: url.to_string(),
            target: target.to_path_buf(),
            branch: branch.to_string(),
        });
        self.check("clone", url, target)?;
        std::fs::create_dir_all(target.join(".git")).unwrap();
        self.remotes
            .borrow_mut()
            .insert(key(target), url.to_string());
        Ok(())
    }

    fn remote_url(&self, _name: &str, cwd: &Path) -> Result<Option<String>, VcsError> {
        self.record(Call::RemoteUrl {
            cwd: cwd.to_path_buf(),
        });
        self.check("remote-url", &cwd.to_string_lossy(), cwd)?;
        Ok(self.origin_of(cwd))
    }

    fn remote_add(&self, _name: &str, url: &str, cwd: &Path) -> Result<(), VcsError> {
        self.record(Call::RemoteAdd {
            url: url.to_string(),
            cwd: cwd.to_path_buf(),
        });
        self.check("remote-add", url, cwd)?;
        self.remotes.borrow_mut().insert(key(cwd), url.to_string());
        Ok(())
    }

    fn remote_set_url(&self, _name: &str, url: &str, cwd: &Path) -> Result<(), VcsError> {
        self.record(Call::SetUrl {
            url: url.to_string(),
            cwd: cwd.to_path_buf(),
        });
        self.check("set-url", url, cwd)?;
        self.remotes.borrow_mut().insert(key(cwd), url.to_string());
        Ok(())
    }

    fn init(&self, cwd: &Path) -> Result<(), VcsError> {
        self.record(Call::Init {
            cwd: cwd.to_path_buf(),
        });
        self.check("init", &cwd.to_string_lossy(), cwd)?;
        std::fs::create_dir_all(cwd.join(".git")).unwrap();
        Ok(())
    }

    fn checkout_new_branch(&self, branch: &str, cwd: &Path) -> Result<(), VcsError> {
        self.record(Call::Checkout {
            branch: branch.to_string(),
            cwd: cwd.to_path_buf(),
        });
        Ok(())
    }

    fn commit(&self, message: &str, cwd: &Path, allow_empty: bool) -> Result<(), VcsError> {
        self.record(Call::Commit {
            message: message.to_string(),
            cwd: cwd.to_path_buf(),
            allow_empty,
        });
        self.check("commit", message, cwd)
    }

    fn add_all(&self, cwd: &Path) -> Result<(), VcsError> {
        self.record(Call::AddAll {
            cwd: cwd.to_path_buf(),
        });
        Ok(())
    }

    fn add_path(&self, path: &Path, cwd: &Path) -> Result<(), VcsError> {
        self.record(Call::AddPath {
            path: path.to_path_buf(),
            cwd: cwd.to_path_buf(),
        });
        Ok(())
    }
}
