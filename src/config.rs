use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;

/// Cluster level settings, read once from a JSON file at startup
///
/// ```json
/// {
///   "experiments_path": "/scratch/experiments",
///   "repo_path": "/scratch/experiment-definitions",
///   "singularity_path": "/usr/local/bin/singularity",
///   "db_path": "/scratch/kokeilu.db"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    /// Root of the per-user, per-commit working directories
    pub experiments_path: PathBuf,
    /// Local clone of the shared experiment definitions repository
    pub repo_path: PathBuf,
    pub singularity_path: PathBuf,
    pub db_path: PathBuf,
    #[serde(default = "default_qsub")]
    pub qsub_path: PathBuf,
    /// Flag that lets unprivileged users build images, passed to `singularity build`
    #[serde(default = "default_privilege_flag")]
    pub build_privilege_flag: String,
}

fn default_qsub() -> PathBuf {
    PathBuf::from("qsub")
}

fn default_privilege_flag() -> String {
    "--fakeroot".to_string()
}

impl ClusterConfig {
    pub fn load(path: &Path) -> Result<ClusterConfig> {
        info!("Reading cluster configuration {}", path.display());
        let json = fs::read_to_string(path)
            .with_context(|| format!("Can't read cluster configuration at {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid cluster configuration in {}", path.display()))
    }

    /// Everything lives under `root`
    #[cfg(test)]
    pub fn for_tests(root: &Path) -> ClusterConfig {
        ClusterConfig {
            experiments_path: root.join("experiments"),
            repo_path: root.join("repo"),
            singularity_path: PathBuf::from("/usr/bin/singularity"),
            db_path: root.join("kokeilu.db"),
            qsub_path: default_qsub(),
            build_privilege_flag: default_privilege_flag(),
        }
    }
}
