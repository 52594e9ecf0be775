use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use hunk_review::{
    Chunk, FetchOptions, FileDiff, GitCli, OpenReview, Outcome, Refresher, ReviewError, Reviewer,
    Session, Status, UnstagedFailure, Zone,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hunk-review", version)]
#[command(about = "Review a git working tree's uncommitted changes hunk by hunk")]
struct Cli {
    /// Any directory inside the repository
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,

    /// Terminal width; longer output lines are truncated
    #[arg(long, global = true, env = "COLUMNS", default_value_t = 80)]
    width: usize,

    /// Fail when unstaged changes cannot be loaded instead of ignoring them
    #[arg(long, global = true)]
    strict: bool,

    /// Maximum number of concurrent `git diff` processes per zone
    #[arg(long, global = true)]
    workers: Option<NonZeroUsize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List staged and unstaged files
    Status,
    /// Print every hunk of a changed file
    Show {
        file: String,
        /// Only look for the file among staged changes
        #[arg(long, conflicts_with = "unstaged")]
        staged: bool,
        /// Only look for the file among unstaged changes
        #[arg(long)]
        unstaged: bool,
    },
    /// Decide hunk by hunk on a changed file, reading commands from stdin
    ///
    /// Commands: c commit, s/d skip, u undo, j/n next, k/p previous, q quit.
    /// Decisions are reported when the file is complete; the index is never
    /// modified.
    Review { file: String },
    /// Print the status and reprint it whenever it changes
    Watch {
        /// Seconds between refreshes
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },
    /// Generate shell completions
    Completions { shell: Shell },
    /// Generate a man page
    Man,
}

impl Cli {
    fn fetch_options(&self) -> FetchOptions {
        let defaults = FetchOptions::default();
        FetchOptions {
            workers: self.workers.unwrap_or(defaults.workers),
            unstaged_failure: if self.strict {
                UnstagedFailure::Fail
            } else {
                defaults.unstaged_failure
            },
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing().map_err(|e| -> Box<dyn Error> { e })?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "hunk-review", &mut out);
            return Ok(());
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut out)?;
            return Ok(());
        }
        _ => {}
    }

    let backend = GitCli::open(&cli.repo)?;
    debug!(root = %backend.root().display(), "opened repository");
    let reviewer = Reviewer::new(backend).with_options(cli.fetch_options());

    match &cli.command {
        Commands::Status => print_status(&mut out, &reviewer.status()?, cli.width)?,
        Commands::Show {
            file,
            staged,
            unstaged,
        } => {
            let zone = match (*staged, *unstaged) {
                (true, _) => Some(Zone::Staged),
                (_, true) => Some(Zone::Unstaged),
                _ => None,
            };
            let (zone, diff) = reviewer.file(file, zone)?;
            show(&mut out, zone, &diff, cli.width)?;
        }
        Commands::Review { file } => review(&mut out, &reviewer, file, cli.width)?,
        Commands::Watch { interval } => watch(&mut out, &reviewer, *interval, cli.width)?,
        Commands::Completions { .. } | Commands::Man => {}
    }

    Ok(())
}

/// Log to the file named by `HUNK_REVIEW_LOG`, or stderr, filtered by `RUST_LOG`
fn init_tracing() -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match std::env::var_os("HUNK_REVIEW_LOG") {
        Some(path) => {
            let file = File::options().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()?;
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .try_init()?;
        }
    }

    Ok(())
}

/// Cut `line` to at most `width` characters
fn truncate(line: &str, width: usize) -> &str {
    match line.char_indices().nth(width) {
        Some((end, _)) => &line[..end],
        None => line,
    }
}

fn print_status(out: &mut impl Write, status: &Status, width: usize) -> io::Result<()> {
    if status.is_empty() {
        return writeln!(out, "No changes");
    }

    for zone in [Zone::Staged, Zone::Unstaged] {
        let diffs = status.zone(zone);
        if diffs.is_empty() {
            continue;
        }

        writeln!(out, "{} changes:", if zone.is_staged() { "Staged" } else { "Unstaged" })?;
        for diff in diffs {
            let line = if diff.deleted() {
                format!("  deleted:  {}", diff.filename)
            } else {
                let n = diff.chunks.len();
                let noun = if n == 1 { "hunk" } else { "hunks" };
                let also = if status.is_partially_staged(&diff.filename) {
                    ", more staged"
                } else {
                    ""
                };
                format!("  modified: {} ({n} {noun}{also})", diff.filename)
            };
            writeln!(out, "{}", truncate(&line, width))?;
        }
    }

    Ok(())
}

fn print_chunk(out: &mut impl Write, chunk: &Chunk, width: usize) -> io::Result<()> {
    for line in chunk.to_string().lines() {
        writeln!(out, "{}", truncate(line, width))?;
    }
    Ok(())
}

fn show(out: &mut impl Write, zone: Zone, diff: &FileDiff, width: usize) -> io::Result<()> {
    if diff.deleted() {
        return writeln!(out, "{} ({zone}): deleted", diff.filename);
    }

    let total = diff.chunks.len();
    for (i, chunk) in diff.chunks.iter().enumerate() {
        writeln!(out, "{} ({zone}) hunk {}/{total}", diff.filename, i + 1)?;
        print_chunk(out, chunk, width)?;
    }
    Ok(())
}

fn print_review(out: &mut impl Write, review: &OpenReview, width: usize) -> io::Result<()> {
    let state = review.state();
    match (review.current_chunk(), state.progress()) {
        (Some(chunk), Some((position, remaining))) => {
            writeln!(
                out,
                "{} ({}) hunk {position}/{remaining}",
                review.filename(),
                review.zone()
            )?;
            print_chunk(out, chunk, width)
        }
        _ => {
            let index = state.cursor().unwrap_or_default();
            let decision = match state.outcome(index) {
                Some(Outcome::Committed) => "committed",
                Some(Outcome::Skipped) => "skipped",
                None => "undecided",
            };
            writeln!(
                out,
                "hunk {} already {decision}, {} remaining; move with j/k or undo with u",
                index + 1,
                state.remaining_count()
            )
        }
    }
}

fn review(
    out: &mut impl Write,
    reviewer: &Reviewer<GitCli>,
    file: &str,
    width: usize,
) -> Result<(), Box<dyn Error>> {
    let mut session = Session::new(reviewer.status()?);
    if !session.select(file) {
        return Err(ReviewError::UnknownFile {
            file: file.to_string(),
        }
        .into());
    }
    if !session.open_selected() {
        writeln!(out, "{file}: deleted, nothing to review")?;
        return Ok(());
    }
    let Some(review) = session.review_mut() else {
        return Ok(());
    };

    print_review(out, review, width)?;
    for line in io::stdin().lock().lines() {
        let line = line?;
        let state = review.state_mut();
        match line.trim() {
            "c" => {
                state.commit();
            }
            "s" | "d" => {
                state.skip();
            }
            "u" => {
                if state.undo().is_none() {
                    writeln!(out, "nothing to undo")?;
                }
            }
            "j" | "n" => {
                state.move_cursor_forward();
            }
            "k" | "p" => {
                state.move_cursor_backward();
            }
            "q" => break,
            "" => continue,
            other => {
                writeln!(out, "unknown command {other:?}; use c, s, u, j, k or q")?;
                continue;
            }
        }

        if review.state().complete() {
            break;
        }
        print_review(out, review, width)?;
    }

    let state = review.state();
    let hunks = |wanted: Outcome| {
        state
            .decisions()
            .filter(|(_, outcome)| *outcome == wanted)
            .map(|(index, _)| (index + 1).to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    writeln!(
        out,
        "{}: {} of {} hunks decided",
        review.filename(),
        state.history().len(),
        state.chunk_count()
    )?;
    writeln!(out, "committed: {}", hunks(Outcome::Committed))?;
    writeln!(out, "skipped: {}", hunks(Outcome::Skipped))?;

    Ok(())
}

fn watch(
    out: &mut impl Write,
    reviewer: &Reviewer<GitCli>,
    interval: u64,
    width: usize,
) -> Result<(), Box<dyn Error>> {
    let mut session = Session::new(reviewer.status()?);
    print_status(out, session.status(), width)?;
    out.flush()?;

    let refresher = Refresher::spawn(
        reviewer.backend().clone(),
        Duration::from_secs(interval.max(1)),
        reviewer.options().clone(),
        session.status().clone(),
    );

    loop {
        let next = refresher.updates().recv()?;
        let newest = refresher.latest().unwrap_or(next);
        if session.replace_status(newest) {
            writeln!(out)?;
            print_status(out, session.status(), width)?;
            out.flush()?;
        }
    }
}
