use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop an entry from being launched
///
/// Each stage of the launch pipeline fails fast with one of these. Nothing is retried and nothing
/// is rolled back: the caller logs the error and exits.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no pending experiment entry in the database")]
    NotFound,

    #[error("commit {0} can't be resolved in the experiment repository")]
    CommitNotFound(String),

    #[error("commit is missing required files: {}", join(.0))]
    MissingFiles(BTreeSet<String>),

    #[error("bad data in {}: {reason}", .path.display())]
    DataFormat { path: PathBuf, reason: String },

    #[error("queue submission failed: {0}")]
    Submission(String),

    /// The build job is already queued when this happens, and nothing cancels it
    #[error("build job {build_job_id} is queued but the run job submission failed: {reason}")]
    OrphanedBuildJob { build_job_id: String, reason: String },

    /// Both jobs are queued but the entry is still pending, so the next launch would queue them again
    #[error("build job {build_job_id} and its run job are queued but the entry couldn't be marked as launched: {reason}")]
    Unacknowledged { build_job_id: String, reason: String },

    #[error("git: {0}")]
    Git(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

impl LaunchError {
    /// Failures caused by the entry itself. Retrying the entry can't fix these.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LaunchError::CommitNotFound(_) | LaunchError::MissingFiles(_) | LaunchError::DataFormat { .. }
        )
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
