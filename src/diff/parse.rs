//! Parsing of `git diff --unified=0 <file>` output into a [`FileDiff`].
//!
//! The first four lines of the output are the standard preamble
//! (`diff --git`, `index`, `---`, `+++`) and are skipped unread. Every line
//! starting with `@@` opens a new chunk; all lines up to the next `@@` line
//! belong to it.
//!
//! Within a chunk the split between old and new lines is positional: the
//! first `old.length` lines (as declared by the header) go to the old side,
//! everything after to the new side. Leading `+`/`-` markers are not
//! inspected, which is only well-defined for zero-context diffs.
//!
//! # Examples
//!
//! ```
//! use hunk_review::diff::parse_file_diff;
//!
//! let lines = [
//!     "diff --git a/f b/f",
//!     "index 1..2",
//!     "--- a/f",
//!     "+++ b/f",
//!     "@@ -1,2 +1,3 @@",
//!     "-old1",
//!     "-old2",
//!     "+new1",
//!     "+new2",
//!     "+new3",
//! ];
//! let diff = parse_file_diff("f", &lines).unwrap();
//! assert_eq!(diff.chunks.len(), 1);
//! assert_eq!(diff.chunks[0].old.lines, vec!["-old1", "-old2"]);
//! assert_eq!(diff.chunks[0].new.length, 3);
//! ```

use error_set::error_set;
use nom::{
    IResult, Parser,
    character::complete::{anychar, char, u32 as decimal},
    combinator::{all_consuming, opt},
    sequence::preceded,
};

use super::chunk::{Chunk, Snippet};
use super::file::FileDiff;

/// `diff --git`, `index`, `---` and `+++`
const PREAMBLE_LINES: usize = 4;

const HEADER_MARKER: &str = "@@";

error_set! {
    /// Errors from parsing zero-context diff output
    ParseError := {
        /// Not even the preamble plus one line was supplied
        #[display("Diff for {file} has too few lines to parse ({lines})")]
        TooShort { file: String, lines: usize },
        /// Hunk header has fewer than four space-separated fields
        #[display("Invalid hunk header in {file}: '{header}'")]
        BadHeader { file: String, header: String },
        /// Range spec is not `<sign><start>` or `<sign><start>,<length>`
        #[display("Invalid hunk range in {file}: '{range}'")]
        BadRange { file: String, range: String },
    }
}

/// Parse one file's diff output into its chunks.
///
/// Lines between the preamble and the first `@@` header (extended headers
/// such as `new file mode`) carry no chunk content and are ignored.
///
/// # Errors
///
/// Returns [`ParseError`] if:
/// - Fewer than five lines are supplied
/// - A hunk header has fewer than four fields
/// - A range in a hunk header is malformed
pub fn parse_file_diff<S: AsRef<str>>(filename: &str, lines: &[S]) -> Result<FileDiff, ParseError> {
    if lines.len() <= PREAMBLE_LINES {
        return Err(ParseError::TooShort {
            file: filename.to_string(),
            lines: lines.len(),
        });
    }

    let mut chunks = Vec::new();
    let mut partition: Option<(&str, Vec<&str>)> = None;

    for line in lines[PREAMBLE_LINES..].iter().map(AsRef::as_ref) {
        if line.starts_with(HEADER_MARKER) {
            if let Some((header, body)) = partition.take() {
                chunks.push(parse_chunk(filename, header, &body)?);
            }
            partition = Some((line, Vec::new()));
        } else if let Some((_, body)) = partition.as_mut() {
            body.push(line);
        }
    }

    if let Some((header, body)) = partition {
        chunks.push(parse_chunk(filename, header, &body)?);
    }

    Ok(FileDiff {
        filename: filename.to_string(),
        chunks,
    })
}

/// Parse a header line and its body into a chunk
fn parse_chunk(filename: &str, header: &str, body: &[&str]) -> Result<Chunk, ParseError> {
    let fields: Vec<&str> = header.split(' ').collect();
    if fields.len() < 4 {
        return Err(ParseError::BadHeader {
            file: filename.to_string(),
            header: header.to_string(),
        });
    }

    let mut old = parse_range(filename, fields[1])?;
    let mut new = parse_range(filename, fields[2])?;

    let split = usize::try_from(old.length)
        .unwrap_or(usize::MAX)
        .min(body.len());
    old.lines = body[..split].iter().map(|l| l.to_string()).collect();
    new.lines = body[split..].iter().map(|l| l.to_string()).collect();

    Ok(Chunk { old, new })
}

/// Parse a range spec like `-136,0` or `+137` into an empty snippet
fn parse_range(filename: &str, spec: &str) -> Result<Snippet, ParseError> {
    let (_, (start, length)) = range_spec(spec).map_err(|_| ParseError::BadRange {
        file: filename.to_string(),
        range: spec.to_string(),
    })?;

    // An unqualified range covers a single line
    Ok(Snippet::new(start, length.unwrap_or(1)))
}

/// `<sign><start>[,<length>]`; the sign is consumed without being checked
fn range_spec(input: &str) -> IResult<&str, (u32, Option<u32>)> {
    all_consuming((
        preceded(anychar, decimal),
        opt(preceded(char(','), decimal)),
    ))
    .parse(input)
}
