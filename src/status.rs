use std::collections::BTreeSet;

use tracing::info;

use crate::diff::{FileDiff, sort_by_filename};
use crate::fetch::Zone;

/// The working tree's changed files, split by zone.
///
/// Both lists are kept sorted by filename and a filename appears in at
/// most one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    staged: Vec<FileDiff>,
    unstaged: Vec<FileDiff>,
    /// Unstaged files that also have staged hunks not listed here
    partially_staged: BTreeSet<String>,
}

impl Status {
    /// Build a status from freshly fetched diffs.
    ///
    /// A partially staged file shows up in both listings. Only its unstaged
    /// diff is kept, and the file is marked with
    /// [`Status::is_partially_staged`].
    pub fn new(mut staged: Vec<FileDiff>, mut unstaged: Vec<FileDiff>) -> Self {
        let mut partially_staged = BTreeSet::new();
        staged.retain(|diff| {
            let duplicate = unstaged.iter().any(|u| u.filename == diff.filename);
            if duplicate {
                info!(file = %diff.filename, "file is partially staged, reviewing its unstaged hunks only");
                partially_staged.insert(diff.filename.clone());
            }
            !duplicate
        });

        sort_by_filename(&mut staged);
        sort_by_filename(&mut unstaged);

        Self {
            staged,
            unstaged,
            partially_staged,
        }
    }

    /// Whether `filename` also has staged hunks that were dropped from the
    /// staged list
    pub fn is_partially_staged(&self, filename: &str) -> bool {
        self.partially_staged.contains(filename)
    }

    pub fn staged(&self) -> &[FileDiff] {
        &self.staged
    }

    pub fn unstaged(&self) -> &[FileDiff] {
        &self.unstaged
    }

    pub fn zone(&self, zone: Zone) -> &[FileDiff] {
        match zone {
            Zone::Staged => &self.staged,
            Zone::Unstaged => &self.unstaged,
        }
    }

    fn zone_mut(&mut self, zone: Zone) -> &mut Vec<FileDiff> {
        match zone {
            Zone::Staged => &mut self.staged,
            Zone::Unstaged => &mut self.unstaged,
        }
    }

    /// Every file, staged ones first
    pub fn files(&self) -> impl Iterator<Item = (Zone, &FileDiff)> {
        let staged = self.staged.iter().map(|diff| (Zone::Staged, diff));
        let unstaged = self.unstaged.iter().map(|diff| (Zone::Unstaged, diff));
        staged.chain(unstaged)
    }

    /// The file at `index` of [`Status::files`]
    pub fn nth(&self, index: usize) -> Option<(Zone, &FileDiff)> {
        if index < self.staged.len() {
            Some((Zone::Staged, &self.staged[index]))
        } else {
            self.unstaged
                .get(index - self.staged.len())
                .map(|diff| (Zone::Unstaged, diff))
        }
    }

    /// Index of `filename` within [`Status::files`]
    pub fn position(&self, filename: &str) -> Option<usize> {
        self.files().position(|(_, diff)| diff.filename == filename)
    }

    pub fn get(&self, filename: &str) -> Option<(Zone, &FileDiff)> {
        self.files().find(|(_, diff)| diff.filename == filename)
    }

    pub fn zone_of(&self, filename: &str) -> Option<Zone> {
        self.get(filename).map(|(zone, _)| zone)
    }

    pub fn len(&self) -> usize {
        self.staged.len() + self.unstaged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty()
    }

    /// Move `filename` to the other zone, returning the zone it landed in.
    ///
    /// Unknown filenames are ignored.
    pub fn toggle_staged(&mut self, filename: &str) -> Option<Zone> {
        let from = self.zone_of(filename)?;
        let source = self.zone_mut(from);
        let index = source.iter().position(|diff| diff.filename == filename)?;
        let diff = source.remove(index);

        let to = from.other();
        let destination = self.zone_mut(to);
        destination.push(diff);
        sort_by_filename(destination);

        Some(to)
    }
}
