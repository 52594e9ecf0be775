use error_set::error_set;

pub mod diff;
mod fetch;
mod git;
mod refresh;
mod selection;
mod session;
mod status;

#[cfg(test)]
pub(crate) mod testing;

pub use diff::{Chunk, FileDiff, ParseError, Snippet, parse_file_diff};
pub use fetch::{FetchOptions, UnstagedFailure, Zone, fetch_changes, fetch_status};
pub use git::{GitBackend, GitCli};
pub use refresh::Refresher;
pub use selection::{Outcome, SelectionState};
pub use session::{OpenReview, Session};
pub use status::Status;

error_set! {
    /// Top-level error for review operations
    ReviewError := {
        #[display("No changes found for {file}")]
        UnknownFile { file: String },
    } || FetchError

    /// Errors from loading the working tree's changes
    FetchError := {
        ParseError(ParseError),
        #[display("Fetch worker panicked while loading {task}")]
        WorkerPanicked { task: String },
    } || GitCommandError

    /// Errors from git command execution
    GitCommandError := {
        #[display("Failed to run git {args}: {message}")]
        SpawnFailed { args: String, message: String },
        #[display("git {args} failed: {stderr}")]
        ExitError { args: String, stderr: String },
    }
}

/// Main interface for loading a repository's changes for review
pub struct Reviewer<B> {
    backend: B,
    options: FetchOptions,
}

impl<B: GitBackend> Reviewer<B> {
    /// Create a reviewer reading changes through `backend`
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            options: FetchOptions::default(),
        }
    }

    /// Replace the fetch options used for every load
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Load the staged and unstaged changes of the working tree
    ///
    /// # Examples
    /// ```no_run
    /// # use hunk_review::{GitCli, Reviewer};
    /// let reviewer = Reviewer::new(GitCli::open(".").unwrap());
    /// let status = reviewer.status().unwrap();
    /// for diff in status.unstaged() {
    ///     println!("{} ({} hunks)", diff.filename, diff.chunks.len());
    /// }
    /// ```
    pub fn status(&self) -> Result<Status, ReviewError> {
        Ok(fetch_status(&self.backend, &self.options)?)
    }

    /// Load the current diff of a single changed file
    ///
    /// When `zone` is `None` the file is looked up in whichever zone holds it.
    pub fn file(&self, filename: &str, zone: Option<Zone>) -> Result<(Zone, FileDiff), ReviewError> {
        let status = self.status()?;

        status
            .get(filename)
            .filter(|(found, _)| zone.is_none_or(|wanted| wanted == *found))
            .map(|(found, diff)| (found, diff.clone()))
            .ok_or_else(|| ReviewError::UnknownFile {
                file: filename.to_string(),
            })
    }
}
