//! Turn a database entry into a working directory full of experiment files

use std::fs;
use std::path::{Component, Path};

use log::{info, warn};

use crate::config::ClusterConfig;
use crate::error::LaunchError;
use crate::repo::{Commit, Repository};
use crate::WorkingDirectory;

/// Check that a commit contains every required file and copy them to the working directory
pub mod validate;

/// The container definition used to build the experiment image
pub const DEFINITION_FILE: &str = "Singularity.def";
/// One header line, then one line of parameters per array job index
pub const PARAMETERS_FILE: &str = "parameters.csv";
/// Experiment configuration with `repo-name` and `commit` keys
pub const CONFIG_FILE: &str = "config.json";

/// Every experiment commit must touch all of these files (matched by file name)
pub const REQUIRED_FILES: [&str; 3] = [DEFINITION_FILE, PARAMETERS_FILE, CONFIG_FILE];

/// One experiment submission: a user asking for a commit to be run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Row id in the entry store
    pub id: i64,
    pub user: String,
    pub commit: String,
}

/// Create the working directory for an entry and resolve its commit
///
/// The working directory is `experiments_path/user/commit` and is reused if it already exists.
/// The repository is always synced first because the commit was probably pushed after the last
/// launch.
pub fn materialize(
    config: &ClusterConfig,
    repo: &impl Repository,
    entry: &Entry,
) -> Result<(WorkingDirectory, Commit), LaunchError> {
    for part in [&entry.user, &entry.commit] {
        if !is_plain_name(part) {
            return Err(LaunchError::DataFormat {
                path: config.experiments_path.clone(),
                reason: format!("{part:?} can't be used as a directory name"),
            });
        }
    }

    let wd = WorkingDirectory { path: config.experiments_path.join(&entry.user).join(&entry.commit) };
    match wd.path.exists() {
        true => warn!("Working directory {} already exists, files will be overwritten", wd.path.display()),
        false => info!("Creating working directory {}", wd.path.display()),
    }
    fs::create_dir_all(&wd.path)?;

    repo.sync()?;
    let commit = repo.resolve(&entry.commit)?;

    Ok((wd, commit))
}

/// A single normal path component, so joining it can't escape the experiments directory
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}
