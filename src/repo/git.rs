use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::{info, warn};

use crate::error::LaunchError;
use crate::repo::{ChangeStats, Commit, Repository, TouchedFiles};

/// A local clone of the experiment definitions repository
pub struct GitRepository {
    pub path: PathBuf,
}

impl GitRepository {
    pub fn new(path: &Path) -> GitRepository {
        GitRepository { path: path.to_path_buf() }
    }

    fn git(&self, args: &[&str]) -> Result<Output, LaunchError> {
        let mut git = Command::new("git");
        let cmd = git.args(args).current_dir(&self.path);
        info!("{:?}", &cmd);
        cmd.output()
            .map_err(|e| LaunchError::Git(format!("failed to run git in {}: {e}", self.path.display())))
    }
}

impl Repository for GitRepository {
    fn sync(&self) -> Result<(), LaunchError> {
        info!("Pulling latest experiment definitions into {}", self.path.display());
        let output = self.git(&["pull", "--ff-only"])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LaunchError::Git(format!("pull failed: {}", stderr.trim())));
        }
        Ok(())
    }

    fn resolve(&self, commit: &str) -> Result<Commit, LaunchError> {
        if commit.is_empty() || commit.starts_with('-') {
            return Err(LaunchError::CommitNotFound(commit.to_string()));
        }

        let rev = format!("{commit}^{{commit}}");
        let output = self.git(&["rev-parse", "--verify", "--quiet", &rev])?;
        if !output.status.success() {
            warn!("Can't resolve commit {commit}");
            return Err(LaunchError::CommitNotFound(commit.to_string()));
        }
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();

        // renames are listed as a deletion plus an addition, and deletions are dropped
        let output = self.git(&[
            "show",
            "--format=",
            "--numstat",
            "-z",
            "--no-renames",
            "--diff-filter=d",
            "--diff-merges=first-parent",
            &id,
        ])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LaunchError::Git(format!("can't list files of {id}: {}", stderr.trim())));
        }

        let files = parse_numstat(&output.stdout);
        info!("Commit {id} touched {} file(s)", files.len());
        Ok(Commit { id, files })
    }

    fn read_file(&self, commit: &Commit, path: &str) -> Result<Vec<u8>, LaunchError> {
        let object = format!("{}:{path}", commit.id);
        let output = self.git(&["cat-file", "blob", &object])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LaunchError::Git(format!("can't read {object}: {}", stderr.trim())));
        }
        Ok(output.stdout)
    }
}

/// Parse NUL terminated `--numstat -z` records: `<added>\t<deleted>\t<path>\0`
///
/// Binary files report `-` for both counts. Paths that aren't valid UTF-8 can't be matched against
/// the required file names or passed back to git, so they're skipped.
fn parse_numstat(raw: &[u8]) -> TouchedFiles {
    let mut files = TouchedFiles::new();
    for record in raw.split(|b| *b == b'\0') {
        let record = match std::str::from_utf8(record) {
            Ok(record) => record.trim_start_matches('\n'),
            Err(_) => {
                warn!("Skipping path that isn't valid UTF-8: {}", String::from_utf8_lossy(record));
                continue;
            }
        };
        if record.is_empty() {
            continue;
        }
        let mut fields = record.splitn(3, '\t');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(added), Some(deleted), Some(path)) => {
                let stats = ChangeStats {
                    insertions: added.parse().ok(),
                    deletions: deleted.parse().ok(),
                };
                files.insert(path.to_string(), stats);
            }
            _ => warn!("Skipping unexpected numstat record {record:?}"),
        }
    }
    files
}
