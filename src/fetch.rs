//! Loading the working tree's staged and unstaged changes.
//!
//! Each changed file's diff comes from its own `git diff` invocation. Those
//! run on a bounded pool of scoped worker threads pulling filenames from a
//! shared job queue and pushing results onto a single result queue. Every
//! worker is joined before a fetch returns, and results are sorted by
//! filename afterwards, so completion order never shows through.

use std::fmt;
use std::num::NonZeroUsize;
use std::thread;

use crossbeam_channel::unbounded;
use tracing::{debug, warn};

use crate::diff::{FileDiff, parse_file_diff, sort_by_filename};
use crate::git::GitBackend;
use crate::status::Status;
use crate::FetchError;

/// Git's two zones of pending changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Queued in the index for the next commit
    Staged,
    /// Present only in the working tree
    Unstaged,
}

impl Zone {
    /// The zone a toggle moves a file into
    pub fn other(self) -> Self {
        match self {
            Zone::Staged => Zone::Unstaged,
            Zone::Unstaged => Zone::Staged,
        }
    }

    pub fn is_staged(self) -> bool {
        self == Zone::Staged
    }

    fn flag(self) -> Option<&'static str> {
        match self {
            Zone::Staged => Some("--staged"),
            Zone::Unstaged => None,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Staged => f.write_str("staged"),
            Zone::Unstaged => f.write_str("unstaged"),
        }
    }
}

/// What a failed unstaged fetch does to a status fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnstagedFailure {
    /// Log it and continue with no unstaged files
    #[default]
    Tolerate,
    /// Fail the status fetch, same as a staged failure
    Fail,
}

/// Tuning for [`fetch_changes`] and [`fetch_status`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Upper bound on concurrent per-file diff workers per zone
    pub workers: NonZeroUsize,
    pub unstaged_failure: UnstagedFailure,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
            unstaged_failure: UnstagedFailure::default(),
        }
    }
}

/// Arguments listing the changed files of a zone
pub(crate) fn listing_args(zone: Zone) -> Vec<&'static str> {
    let mut args = vec!["diff", "--name-only"];
    args.extend(zone.flag());
    args
}

/// Arguments producing one file's zero-context diff
pub(crate) fn diff_args(zone: Zone, filename: &str) -> Vec<&str> {
    let mut args = vec!["diff", "--no-ext-diff", "--no-color", "--unified=0"];
    args.extend(zone.flag());
    args.extend(["--", filename]);
    args
}

/// Listing entries that are never diffed
fn is_reviewable(filename: &str) -> bool {
    // Patch files confuse the zero-context parser
    !filename.is_empty() && !filename.contains(".diff")
}

/// Load every changed file of one zone, sorted by filename.
///
/// Fails fast: the first listing, diff or parse error fails the whole
/// call and no partial result is returned. Files listed by git but missing
/// from disk come back as [`FileDiff::deleted`] diffs without running
/// `git diff` for them.
pub fn fetch_changes<B: GitBackend + ?Sized>(
    backend: &B,
    zone: Zone,
    options: &FetchOptions,
) -> Result<Vec<FileDiff>, FetchError> {
    let files: Vec<String> = backend
        .git(&listing_args(zone))?
        .into_iter()
        .filter(|name| is_reviewable(name))
        .collect();

    let workers = options.workers.get().min(files.len());
    debug!(%zone, files = files.len(), workers, "fetching changes");

    let (job_tx, job_rx) = unbounded::<&str>();
    for file in &files {
        // The receiver is alive until the end of this function
        let _ = job_tx.send(file.as_str());
    }
    drop(job_tx);

    let (result_tx, result_rx) = unbounded();
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                scope.spawn(move || {
                    for file in jobs {
                        if results.send(diff_file(backend, file, zone)).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();

        // A panicked worker shows up below as a file without a result
        for handle in handles {
            let _ = handle.join();
        }
    });
    drop(result_tx);

    let mut diffs = result_rx
        .into_iter()
        .collect::<Result<Vec<FileDiff>, FetchError>>()?;

    if diffs.len() < files.len() {
        let task = files
            .iter()
            .find(|file| !diffs.iter().any(|diff| &diff.filename == *file))
            .cloned()
            .unwrap_or_else(|| format!("{zone} changes"));
        return Err(FetchError::WorkerPanicked { task });
    }

    sort_by_filename(&mut diffs);
    Ok(diffs)
}

/// Load one file's diff, or a deleted placeholder if it is gone from disk
fn diff_file<B: GitBackend + ?Sized>(
    backend: &B,
    filename: &str,
    zone: Zone,
) -> Result<FileDiff, FetchError> {
    if !backend.file_exists(filename) {
        debug!(file = filename, %zone, "file missing from disk, treating as deleted");
        return Ok(FileDiff::deleted_file(filename));
    }

    let lines = backend.git(&diff_args(zone, filename))?;
    Ok(parse_file_diff(filename, &lines)?)
}

/// Load both zones concurrently into a [`Status`].
///
/// A staged failure always fails the call. An unstaged failure is logged
/// and replaced by an empty unstaged set unless
/// [`UnstagedFailure::Fail`] is configured.
pub fn fetch_status<B: GitBackend + ?Sized>(
    backend: &B,
    options: &FetchOptions,
) -> Result<Status, FetchError> {
    let (staged, unstaged) = thread::scope(|scope| {
        let staged = scope.spawn(|| fetch_changes(backend, Zone::Staged, options));
        let unstaged = scope.spawn(|| fetch_changes(backend, Zone::Unstaged, options));

        (
            join_zone(staged, Zone::Staged),
            join_zone(unstaged, Zone::Unstaged),
        )
    });

    let staged = staged?;
    let unstaged = match unstaged {
        Ok(diffs) => diffs,
        Err(err) if options.unstaged_failure == UnstagedFailure::Tolerate => {
            warn!(error = %err, "failed to load unstaged changes, continuing without them");
            Vec::new()
        }
        Err(err) => return Err(err),
    };

    Ok(Status::new(staged, unstaged))
}

fn join_zone(
    handle: thread::ScopedJoinHandle<'_, Result<Vec<FileDiff>, FetchError>>,
    zone: Zone,
) -> Result<Vec<FileDiff>, FetchError> {
    handle.join().unwrap_or_else(|_| {
        Err(FetchError::WorkerPanicked {
            task: format!("{zone} changes"),
        })
    })
}
