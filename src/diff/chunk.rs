use std::fmt;

/// One side (old or new) of a chunk.
///
/// `length` is the count declared by the hunk header. It is trusted as-is
/// and is not re-validated against `lines`, which holds the raw diff lines
/// (markers included) assigned to this side during parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snippet {
    /// 1-based line number where this side begins (0 for an empty side at file start)
    pub start: u32,
    /// Declared number of lines; 0 means nothing on this side
    pub length: u32,
    /// Raw diff lines belonging to this side, in file order
    pub lines: Vec<String>,
}

impl Snippet {
    pub fn new(start: u32, length: u32) -> Self {
        Self {
            start,
            length,
            lines: Vec::new(),
        }
    }

    /// Write the range in hunk-header form, e.g. `10`, `10,0` or `10,3`.
    fn fmt_range(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.length {
            1 => write!(f, "{}", self.start),
            n => write!(f, "{},{}", self.start, n),
        }
    }
}

/// A single `@@ ... @@` unit of a file diff.
///
/// Equality is structural: two chunks are equal when both sides agree on
/// start, length and every line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    pub old: Snippet,
    pub new: Snippet,
}

impl Chunk {
    /// Number of raw diff lines that followed the header.
    pub fn line_count(&self) -> usize {
        self.old.lines.len() + self.new.lines.len()
    }

    /// All raw lines of the chunk, old side first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.old
            .lines
            .iter()
            .chain(self.new.lines.iter())
            .map(String::as_str)
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@@ -")?;
        self.old.fmt_range(f)?;
        write!(f, " +")?;
        self.new.fmt_range(f)?;
        writeln!(f, " @@")?;

        // Lines are kept verbatim, markers included
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }

        Ok(())
    }
}
