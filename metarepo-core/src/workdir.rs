//! Scoped change of the process working directory.
//!
//! The current directory is process-wide state. [`WorkingDirectory`] holds a
//! global lock for its whole lifetime, so scopes taken on different threads
//! run one after another. The lock is not reentrant: entering a second scope
//! on a thread that already holds one deadlocks.
//!
//! Code that can pass a directory explicitly (every VCS call does) should do
//! that instead of entering a scope.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::WorkdirError;

static CWD_LOCK: Mutex<()> = Mutex::new(());

/// RAII guard: the previous working directory is restored on drop, on every
/// exit path including `?` propagation and unwinding.
#[derive(Debug)]
pub struct WorkingDirectory {
    previous: PathBuf,
    current: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl WorkingDirectory {
    /// Switch to `path`, creating it (empty) if it does not exist.
    pub fn enter(path: &Path) -> Result<Self, WorkdirError> {
        let lock = CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let err = |source| WorkdirError {
            path: path.to_path_buf(),
            source,
        };

        if !path.exists() {
            std::fs::create_dir_all(path).map_err(err)?;
        }
        let current = path.canonicalize().map_err(err)?;
        let previous = std::env::current_dir().map_err(err)?;
        std::env::set_current_dir(&current).map_err(err)?;
        tracing::debug!("entered {}", current.display());

        Ok(Self {
            previous,
            current,
            _lock: lock,
        })
    }

    /// Absolute path of the directory this scope switched to.
    pub fn path(&self) -> &Path {
        &self.current
    }
}

impl Drop for WorkingDirectory {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            tracing::error!(
                "failed to restore working directory {}: {e}",
                self.previous.display()
            );
        }
    }
}

/// Run `body` with `path` as the working directory and restore the previous
/// directory afterwards, whether `body` succeeds, fails or panics.
pub fn with_working_directory<T, E, F>(path: &Path, body: F) -> Result<T, E>
where
    E: From<WorkdirError>,
    F: FnOnce(&Path) -> Result<T, E>,
{
    let scope = WorkingDirectory::enter(path)?;
    body(scope.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    // Serializes tests that read the process directory outside a scope.
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    fn serial() -> MutexGuard<'static, ()> {
        TEST_LOCK.lock().unwrap_or_else(|p| p.into_inner())
    }

    #[derive(Debug)]
    enum TestError {
        Workdir,
        Body,
    }

    impl From<WorkdirError> for TestError {
        fn from(_: WorkdirError) -> Self {
            TestError::Workdir
        }
    }

    #[test]
    fn creates_switches_and_restores() {
        let _serial = serial();
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("new").join("repo");
        let before = std::env::current_dir().unwrap();

        let seen = with_working_directory(&target, |dir| -> Result<PathBuf, TestError> {
            assert_eq!(std::env::current_dir().unwrap(), dir);
            Ok(dir.to_path_buf())
        })
        .unwrap();

        assert!(target.is_dir());
        assert_eq!(seen, target.canonicalize().unwrap());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn restores_when_body_fails() {
        let _serial = serial();
        let tmp = TempDir::new().unwrap();
        let before = std::env::current_dir().unwrap();

        let result =
            with_working_directory(tmp.path(), |_| -> Result<(), TestError> { Err(TestError::Body) });

        assert!(matches!(result, Err(TestError::Body)));
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn restores_when_body_panics() {
        let _serial = serial();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().to_path_buf();
        let before = std::env::current_dir().unwrap();

        let outcome = std::panic::catch_unwind(move || {
            let _ = with_working_directory(&path, |_| -> Result<(), TestError> {
                panic!("boom");
            });
        });

        assert!(outcome.is_err());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn scopes_on_different_threads_run_one_after_another() {
        let _serial = serial();
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("first");
        let second = tmp.path().join("second");
        let (entered_tx, entered_rx) = mpsc::channel();

        let holder = thread::spawn(move || {
            let scope = WorkingDirectory::enter(&first).unwrap();
            entered_tx.send(()).unwrap();
            for _ in 0..10 {
                assert_eq!(std::env::current_dir().unwrap(), scope.path());
                thread::sleep(Duration::from_millis(10));
            }
            let released = Instant::now();
            drop(scope);
            released
        });

        entered_rx.recv().unwrap();
        let waiter = thread::spawn(move || {
            let scope = WorkingDirectory::enter(&second).unwrap();
            let entered = Instant::now();
            (entered, std::env::current_dir().unwrap(), scope.path().to_path_buf())
        });

        let released = holder.join().unwrap();
        let (entered, cwd, scope_path) = waiter.join().unwrap();
        assert!(entered >= released);
        assert_eq!(cwd, scope_path);
        assert!(scope_path.ends_with("second"));
    }
}
