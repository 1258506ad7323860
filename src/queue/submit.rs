use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};

use crate::error::LaunchError;
use crate::queue::job::{Dependency, JobDescriptor};

/// Something that can put a job on the batch queue
///
/// Both methods run the submission from `wd`, so relative paths and PBS output files end up in the
/// experiment's working directory.
pub trait QueueExecutor {
    /// Submit a job and return the submitter's raw standard output
    fn submit_and_capture(&self, job: &JobDescriptor, wd: &Path) -> Result<String, LaunchError>;

    /// Submit a job, only checking the submitter's exit status
    fn submit(&self, job: &JobDescriptor, wd: &Path) -> Result<(), LaunchError>;
}

/// PBS `qsub` executable
pub struct Qsub {
    pub path: PathBuf,
}

impl Qsub {
    fn command(&self, job: &JobDescriptor, wd: &Path) -> Command {
        let mut qsub = Command::new(&self.path);
        qsub.args(job.qsub_args()).current_dir(wd);
        info!("Running qsub process");
        info!("{:?}", &qsub);
        qsub
    }
}

impl QueueExecutor for Qsub {
    fn submit_and_capture(&self, job: &JobDescriptor, wd: &Path) -> Result<String, LaunchError> {
        let output = self
            .command(job, wd)
            .output()
            .map_err(|e| LaunchError::Submission(format!("can't run {}: {e}", self.path.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LaunchError::Submission(format!(
                "qsub {} exited with {}: {}",
                job.name,
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| LaunchError::Submission(format!("qsub {} printed a non UTF-8 job id", job.name)))
    }

    fn submit(&self, job: &JobDescriptor, wd: &Path) -> Result<(), LaunchError> {
        let status = self
            .command(job, wd)
            .status()
            .map_err(|e| LaunchError::Submission(format!("can't run {}: {e}", self.path.display())))?;

        match status.success() {
            true => Ok(()),
            false => Err(LaunchError::Submission(format!("qsub {} exited with {status}", job.name))),
        }
    }
}

/// The two jobs as they were submitted
#[derive(Debug, Clone)]
pub struct SubmittedJobs {
    pub build_job_id: String,
    pub run: JobDescriptor,
}

/// Submit the build job, then the run job with a dependency on it
///
/// The build job id is qsub's output with the trailing line terminator removed, and is copied
/// into the run job's dependency as is. If the run submission fails the build job stays queued;
/// that's reported as [`LaunchError::OrphanedBuildJob`] so someone can `qdel` it.
pub fn submit(
    executor: &impl QueueExecutor,
    wd: &Path,
    build: &JobDescriptor,
    mut run: JobDescriptor,
) -> Result<SubmittedJobs, LaunchError> {
    info!("Submitting build job {}", build.name);
    let stdout = executor.submit_and_capture(build, wd)?;
    let build_job_id = parse_job_id(&stdout)?;
    info!("PBS build job id: {build_job_id}");

    run.depends_on = Some(Dependency::AfterOk(build_job_id.clone()));

    info!("Submitting run job {}", run.name);
    if let Err(err) = executor.submit(&run, wd) {
        warn!("Run job submission failed, build job {build_job_id} has nothing waiting on it");
        return Err(LaunchError::OrphanedBuildJob { build_job_id, reason: err.to_string() });
    }

    Ok(SubmittedJobs { build_job_id, run })
}

/// Strip one trailing line terminator from qsub's output
fn parse_job_id(stdout: &str) -> Result<String, LaunchError> {
    let id = stdout.strip_suffix('\n').unwrap_or(stdout);
    let id = id.strip_suffix('\r').unwrap_or(id);

    if id.is_empty() {
        return Err(LaunchError::Submission("qsub didn't print a job id".to_string()));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(LaunchError::Submission(format!("can't parse job id from qsub output {stdout:?}")));
    }
    Ok(id.to_string())
}
