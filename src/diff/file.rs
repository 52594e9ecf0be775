use super::chunk::Chunk;

/// All chunks for one file, as produced by a single `git diff` invocation.
///
/// Immutable once parsed: review progress lives in a
/// [`SelectionState`](crate::SelectionState), never on the diff itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDiff {
    /// Path relative to the repository root, as listed by git
    pub filename: String,
    /// Chunks in the order they appeared in the diff
    pub chunks: Vec<Chunk>,
}

impl FileDiff {
    /// A diff for a file git reports as changed but that no longer exists
    /// on disk.
    pub fn deleted_file(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            chunks: Vec::new(),
        }
    }

    /// True when git listed the file as changed but no chunks were
    /// retrieved for it.
    pub fn deleted(&self) -> bool {
        !self.filename.is_empty() && self.chunks.is_empty()
    }
}

/// Sort diffs by filename, the order every status listing is kept in.
pub fn sort_by_filename(diffs: &mut [FileDiff]) {
    diffs.sort_by(|a, b| a.filename.cmp(&b.filename));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Snippet;

    #[test]
    fn deleted_requires_name_and_no_chunks() {
        assert!(FileDiff::deleted_file("gone.rs").deleted());
        assert!(!FileDiff::default().deleted());

        let modified = FileDiff {
            filename: "kept.rs".to_string(),
            chunks: vec![Chunk::default()],
        };
        assert!(!modified.deleted());
    }

    #[test]
    fn equality_requires_identical_filename() {
        assert_ne!(FileDiff::deleted_file("one"), FileDiff::deleted_file("two"));
    }

    #[test]
    fn equality_requires_identical_chunks() {
        let one = FileDiff {
            filename: "one".to_string(),
            chunks: vec![Chunk {
                old: Snippet {
                    start: 0,
                    length: 0,
                    lines: vec!["one".to_string()],
                },
                new: Snippet {
                    start: 0,
                    length: 0,
                    lines: vec!["two".to_string()],
                },
            }],
        };
        let two = FileDiff {
            filename: "one".to_string(),
            chunks: vec![Chunk::default()],
        };
        assert_ne!(one, two);
        assert_eq!(one, one.clone());
    }

    #[test]
    fn sorts_by_filename() {
        let mut diffs = vec![
            FileDiff::deleted_file("src/b.rs"),
            FileDiff::deleted_file("README.md"),
            FileDiff::deleted_file("src/a.rs"),
        ];
        sort_by_filename(&mut diffs);

        let names: Vec<_> = diffs.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["README.md", "src/a.rs", "src/b.rs"]);
    }
}
