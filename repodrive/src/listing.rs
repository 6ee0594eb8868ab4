//! Ordering and filtering of directory listings.

use std::cmp::Ordering;

use glob::{MatchOptions, Pattern};

use crate::{config::ListingConfig, DirectoryEntry, EntryKind, Error, Result};

#[derive(Debug, Default, Clone)]
pub struct PatternList(Vec<Pattern>, MatchOptions);

impl PatternList {
    pub fn new<I>(patterns: I, opts: MatchOptions) -> Result<PatternList>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let patterns: std::result::Result<Vec<_>, _> = patterns
            .into_iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect();
        let patterns = patterns.map_err(|err| Error::Config(format!("invalid pattern: {err}")))?;
        Ok(PatternList(patterns, opts))
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0.iter().any(|p| p.matches_with(name, self.1))
    }
}

/// Which entries are left out of displayed listings.
#[derive(Debug, Clone)]
pub struct ListingPolicy {
    pub hide_readme: bool,
    pub hide: PatternList,
}

impl Default for ListingPolicy {
    fn default() -> Self {
        Self {
            hide_readme: true,
            hide: PatternList::default(),
        }
    }
}

impl ListingPolicy {
    pub fn show_all() -> Self {
        Self {
            hide_readme: false,
            hide: PatternList::default(),
        }
    }

    pub fn from_config(config: &ListingConfig) -> Result<Self> {
        let opts = MatchOptions {
            case_sensitive: false,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        Ok(Self {
            hide_readme: config.hide_readme,
            hide: PatternList::new(config.hide.iter(), opts)?,
        })
    }

    pub fn is_hidden(&self, entry: &DirectoryEntry) -> bool {
        if self.hide_readme
            && entry.is_file()
            && entry.name().eq_ignore_ascii_case(crate::FOLDER_PLACEHOLDER)
        {
            return true;
        }
        self.hide.matches(entry.name())
    }

    /// Sorts `entries` and drops the hidden ones.
    pub fn apply(&self, mut entries: Vec<DirectoryEntry>) -> Vec<DirectoryEntry> {
        sort_entries(&mut entries);
        entries.retain(|e| !self.is_hidden(e));
        entries
    }
}

fn kind_rank(kind: EntryKind) -> u8 {
    match kind {
        EntryKind::Directory => 0,
        EntryKind::File => 1,
    }
}

pub fn compare_entries(lhs: &DirectoryEntry, rhs: &DirectoryEntry) -> Ordering {
    kind_rank(lhs.kind())
        .cmp(&kind_rank(rhs.kind()))
        .then_with(|| lhs.name().cmp(rhs.name()))
}

/// Directories first, then files, each group by case-sensitive name.
pub fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by(compare_entries);
}
