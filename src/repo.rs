//! Access to the shared experiment definitions repository
//!
//! Users push their experiment definitions to one shared repository. The launcher only needs to
//! bring its local clone up to date, list what a commit touched, and read files at that commit.

use std::collections::BTreeMap;

use crate::error::LaunchError;

/// Talk to a git repository through the `git` command line client
pub mod git;

/// Lines changed in one file. Binary files have no line counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeStats {
    pub insertions: Option<u64>,
    pub deletions: Option<u64>,
}

/// Repository relative path -> change statistics, sorted by path
pub type TouchedFiles = BTreeMap<String, ChangeStats>;

/// A resolved commit and the files it added or modified
#[derive(Debug, Clone)]
pub struct Commit {
    /// Full object id, which may differ from the (possibly abbreviated) id that was asked for
    pub id: String,
    pub files: TouchedFiles,
}

pub trait Repository {
    /// Fetch from upstream and fast-forward the checked out branch
    fn sync(&self) -> Result<(), LaunchError>;

    /// Resolve a commit id, failing with [`LaunchError::CommitNotFound`] if it doesn't exist
    fn resolve(&self, commit: &str) -> Result<Commit, LaunchError>;

    /// Read a file as it was at the given commit
    fn read_file(&self, commit: &Commit, path: &str) -> Result<Vec<u8>, LaunchError>;
}

#[cfg(test)]
pub mod fake;
