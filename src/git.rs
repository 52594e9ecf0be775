use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use tracing::debug;

use crate::GitCommandError;

/// Source of git output and working tree file existence.
///
/// Fetches fan out over worker threads, so implementations must be `Sync`.
pub trait GitBackend: Sync {
    /// Run `git` with `args`, returning stdout split on `\n` (without a
    /// trailing empty line). Carriage returns stay part of their line.
    fn git(&self, args: &[&str]) -> Result<Vec<String>, GitCommandError>;

    /// Whether `path` (relative to the repository root) exists on disk.
    fn file_exists(&self, path: &str) -> bool;
}

impl<T: GitBackend + Send + ?Sized> GitBackend for Arc<T> {
    fn git(&self, args: &[&str]) -> Result<Vec<String>, GitCommandError> {
        (**self).git(args)
    }

    fn file_exists(&self, path: &str) -> bool {
        (**self).file_exists(path)
    }
}

/// Runs the `git` executable against a repository's top-level directory
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    /// Use `root` as the repository top level without checking it
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the top level of the repository containing `path`
    ///
    /// Listings from `git diff --name-only` are relative to the top level,
    /// so every later invocation runs from there.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GitCommandError> {
        let probe = Self::new(path.as_ref());
        let root = probe
            .git(&["rev-parse", "--show-toplevel"])?
            .into_iter()
            .find(|line| !line.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| path.as_ref().to_path_buf());

        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl GitBackend for GitCli {
    fn git(&self, args: &[&str]) -> Result<Vec<String>, GitCommandError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(["--no-pager", "-c", "core.quotePath=false"])
            .args(args)
            .output()
            .map_err(|e| GitCommandError::SpawnFailed {
                args: args.join(" "),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitCommandError::ExitError {
                args: args.join(" "),
                stderr: stderr.trim_end().to_string(),
            });
        }

        // Diffed content can be in any encoding; undecodable bytes become U+FFFD
        let stdout = String::from_utf8_lossy(&output.stdout);
        if matches!(stdout, Cow::Owned(_)) {
            debug!(args = %args.join(" "), "git output is not valid UTF-8, decoded lossily");
        }

        // Split on `\n` only so CRLF content keeps its `\r`
        Ok(stdout.split_terminator('\n').map(str::to_string).collect())
    }

    fn file_exists(&self, path: &str) -> bool {
        self.root.join(path).exists()
    }
}
