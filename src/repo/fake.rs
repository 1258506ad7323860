use std::cell::Cell;
use std::collections::BTreeMap;

use crate::error::LaunchError;
use crate::repo::{ChangeStats, Commit, Repository, TouchedFiles};

/// In-memory repository. Commits only become visible after the first sync, like an upstream
/// push that the local clone hasn't fetched yet.
#[derive(Default)]
pub struct FakeRepository {
    pub commits: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    pub syncs: Cell<u32>,
}

impl FakeRepository {
    pub fn with_commit(commit: &str, files: &[(&str, &str)]) -> FakeRepository {
        let mut repo = FakeRepository::default();
        repo.add_commit(commit, files);
        repo
    }

    pub fn add_commit(&mut self, commit: &str, files: &[(&str, &str)]) {
        let files = files
            .iter()
            .map(|(path, content)| (path.to_string(), content.as_bytes().to_vec()))
            .collect();
        self.commits.insert(commit.to_string(), files);
    }
}

impl Repository for FakeRepository {
    fn sync(&self) -> Result<(), LaunchError> {
        self.syncs.set(self.syncs.get() + 1);
        Ok(())
    }

    fn resolve(&self, commit: &str) -> Result<Commit, LaunchError> {
        match (self.syncs.get(), self.commits.get(commit)) {
            (n, Some(files)) if n > 0 => {
                let files: TouchedFiles = files
                    .iter()
                    .map(|(path, content)| {
                        let lines = content.iter().filter(|b| **b == b'\n').count() as u64;
                        (path.clone(), ChangeStats { insertions: Some(lines), deletions: Some(0) })
                    })
                    .collect();
                Ok(Commit { id: commit.to_string(), files })
            }
            _ => Err(LaunchError::CommitNotFound(commit.to_string())),
        }
    }

    fn read_file(&self, commit: &Commit, path: &str) -> Result<Vec<u8>, LaunchError> {
        self.commits
            .get(&commit.id)
            .and_then(|files| files.get(path))
            .cloned()
            .ok_or_else(|| LaunchError::Git(format!("no {path} in {}", commit.id)))
    }
}
