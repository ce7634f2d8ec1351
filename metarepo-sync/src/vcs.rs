//! Version control surface.
//!
//! Every operation names its working directory explicitly; nothing here reads
//! the process working directory.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::VcsError;

/// The git operations the reconciler and the scaffold need.
pub trait Vcs {
    /// Clone `url` into `target`, checking out `branch`.
    fn clone_repository(&self, url: &str, target: &Path, branch: &str) -> Result<(), VcsError>;

    /// URL of remote `name`, or `None` when the remote is not configured.
    fn remote_url(&self, name: &str, cwd: &Path) -> Result<Option<String>, VcsError>;

    fn remote_add(&self, name: &str, url: &str, cwd: &Path) -> Result<(), VcsError>;

    fn remote_set_url(&self, name: &str, url: &str, cwd: &Path) -> Result<(), VcsError>;

    fn init(&self, cwd: &Path) -> Result<(), VcsError>;

    fn checkout_new_branch(&self, branch: &str, cwd: &Path) -> Result<(), VcsError>;

    /// Commit the index. `message` may span several lines; the first is the
    /// subject.
    fn commit(&self, message: &str, cwd: &Path, allow_empty: bool) -> Result<(), VcsError>;

    /// Stage everything under `cwd`.
    fn add_all(&self, cwd: &Path) -> Result<(), VcsError>;

    /// Stage a single path.
    fn add_path(&self, path: &Path, cwd: &Path) -> Result<(), VcsError>;
}

/// [`Vcs`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific git binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Whether the configured git binary can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git<I, S>(&self, args: I, cwd: &Path) -> Result<String, VcsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        run_command(&self.program, args, cwd)
    }

    fn ensure_repository(cwd: &Path) -> Result<(), VcsError> {
        // `.git` is a file in worktrees and submodules.
        if cwd.join(".git").exists() {
            Ok(())
        } else {
            Err(VcsError::NotARepository {
                path: cwd.to_path_buf(),
            })
        }
    }
}

impl Vcs for GitCli {
    fn clone_repository(&self, url: &str, target: &Path, branch: &str) -> Result<(), VcsError> {
        // Clone from the parent so a relative `target` is not resolved twice.
        let (cwd, dest) = match (target.parent(), target.file_name()) {
            (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => (parent, name),
            _ => (Path::new("."), target.as_os_str()),
        };
        let args: [&OsStr; 5] = [
            OsStr::new("clone"),
            OsStr::new("--branch"),
            OsStr::new(branch),
            OsStr::new(url),
            dest,
        ];
        self.git(args, cwd)?;
        Ok(())
    }

    fn remote_url(&self, name: &str, cwd: &Path) -> Result<Option<String>, VcsError> {
        Self::ensure_repository(cwd)?;
        let key = format!("remote.{name}.url");
        match self.git(["config", "--get", key.as_str()], cwd) {
            Ok(url) => Ok(Some(url)),
            // `git config --get` exits 1 when the key is unset.
            Err(VcsError::CommandFailed { code: Some(1), .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn remote_add(&self, name: &str, url: &str, cwd: &Path) -> Result<(), VcsError> {
        Self::ensure_repository(cwd)?;
        self.git(["remote", "add", name, url], cwd)?;
        Ok(())
    }

    fn remote_set_url(&self, name: &str, url: &str, cwd: &Path) -> Result<(), VcsError> {
        Self::ensure_repository(cwd)?;
        self.git(["remote", "set-url", name, url], cwd)?;
        Ok(())
    }

    fn init(&self, cwd: &Path) -> Result<(), VcsError> {
        self.git(["init"], cwd)?;
        Ok(())
    }

    fn checkout_new_branch(&self, branch: &str, cwd: &Path) -> Result<(), VcsError> {
        self.git(["checkout", "-b", branch], cwd)?;
        Ok(())
    }

    fn commit(&self, message: &str, cwd: &Path, allow_empty: bool) -> Result<(), VcsError> {
        let mut args = vec!["commit", "-m", message];
        if allow_empty {
            args.push("--allow-empty");
        }
        self.git(args, cwd)?;
        Ok(())
    }

    fn add_all(&self, cwd: &Path) -> Result<(), VcsError> {
        self.git(["add", "."], cwd)?;
        Ok(())
    }

    fn add_path(&self, path: &Path, cwd: &Path) -> Result<(), VcsError> {
        let args: [&OsStr; 3] = [OsStr::new("add"), OsStr::new("--"), path.as_os_str()];
        self.git(args, cwd)?;
        Ok(())
    }
}

/// Run `program args…` in `cwd` and return its trimmed stdout.
///
/// A non-zero exit becomes [`VcsError::CommandFailed`] carrying stderr.
pub fn run_command<P, I, S>(program: P, args: I, cwd: &Path) -> Result<String, VcsError>
where
    P: AsRef<OsStr>,
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
    let command = render_command(program.as_ref(), &args);
    tracing::debug!("running `{}` in {}", command, cwd.display());

    let output = Command::new(program.as_ref())
        .args(&args)
        .current_dir(cwd)
        .output()
        .map_err(|source| VcsError::Spawn {
            command: command.clone(),
            cwd: cwd.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(VcsError::CommandFailed {
            command,
            cwd: cwd.to_path_buf(),
            code: output.status.code(),
            stderr,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn render_command(program: &OsStr, args: &[OsString]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(OsString::as_os_str))
        .map(|a| a.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_command_joins_program_and_args() {
        let args = vec![OsString::from("remote"), OsString::from("add")];
        assert_eq!(render_command(OsStr::new("git"), &args), "git remote add");
    }

    #[test]
    fn remote_commands_refuse_directories_without_git_metadata() {
        let dir = tempfile::TempDir::new().unwrap();
        // Never spawned: the check happens before git runs.
        let git = GitCli::with_program("metarepo-definitely-not-a-binary");

        let err = git.remote_url("origin", dir.path()).unwrap_err();
        assert!(matches!(err, VcsError::NotARepository { .. }), "got: {err}");
        let err = git.remote_set_url("origin", "https://example.com/org/a", dir.path()).unwrap_err();
        assert!(matches!(err, VcsError::NotARepository { .. }), "got: {err}");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = run_command("metarepo-definitely-not-a-binary", ["x"], dir.path()).unwrap_err();
        assert!(matches!(err, VcsError::Spawn { .. }), "got: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_carries_code_and_stderr() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = run_command("sh", ["-c", "echo boom >&2; exit 3"], dir.path()).unwrap_err();
        match err {
            VcsError::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected CommandFailed, got {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn stdout_is_trimmed() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = run_command("sh", ["-c", "echo '  hi  '"], dir.path()).unwrap();
        assert_eq!(out, "hi");
    }
}
