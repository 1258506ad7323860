use log::{info, warn};
use rusqlite::Connection;

use crate::config::ClusterConfig;
use crate::db::entry::{acknowledge, latest_entry, mark_failed};
use crate::error::LaunchError;
use crate::experiment::validate::validate_and_copy;
use crate::experiment::{materialize, Entry};
use crate::queue::command::build_commands;
use crate::queue::job::JobDescriptor;
use crate::queue::submit::{submit, QueueExecutor, SubmittedJobs};
use crate::repo::Repository;
use crate::WorkingDirectory;

/// What happened to the launched entry
#[derive(Debug)]
pub enum Launch {
    Submitted { entry: Entry, wd: WorkingDirectory, jobs: SubmittedJobs },
    /// `--dry-run`: files were copied and jobs described, but nothing was queued
    DryRun { entry: Entry, wd: WorkingDirectory, build: JobDescriptor, run: JobDescriptor },
}

/// Launch the newest pending entry
///
/// Stops at the first error. The entry is only marked as launched once both jobs are queued.
/// Entries that can never launch (unknown commit, missing files, bad experiment data) are marked
/// as failed so older entries get their turn; other failures leave the entry pending for the next
/// invocation. Dry runs never touch the entry.
///
/// At most one launcher may run at a time: nothing locks the working directory or the entry.
pub fn launch(
    config: &ClusterConfig,
    conn: &Connection,
    repo: &impl Repository,
    executor: &impl QueueExecutor,
    dry_run: bool,
) -> Result<Launch, LaunchError> {
    let entry = latest_entry(conn)?;

    match launch_entry(config, conn, repo, executor, entry.clone(), dry_run) {
        Err(err) if err.is_terminal() && !dry_run => {
            warn!("Entry {} can't be launched and won't be retried", entry.id);
            if let Err(db_err) = mark_failed(conn, &entry, &err.to_string()) {
                warn!("Can't record failure of entry {}: {db_err}", entry.id);
            }
            Err(err)
        }
        result => result,
    }
}

fn launch_entry(
    config: &ClusterConfig,
    conn: &Connection,
    repo: &impl Repository,
    executor: &impl QueueExecutor,
    entry: Entry,
    dry_run: bool,
) -> Result<Launch, LaunchError> {
    let (wd, commit) = materialize(config, repo, &entry)?;
    // TODO: check the definition file bootstraps from an allowed image before building it
    validate_and_copy(repo, &wd, &commit)?;
    let (build, run) = build_commands(config, &entry, &wd)?;

    if dry_run {
        info!("--dry-run set, not submitting jobs");
        for line in dry_run_commands(config, &build, &run) {
            info!("{line}");
        }
        return Ok(Launch::DryRun { entry, wd, build, run });
    }

    let jobs = submit(executor, &wd.path, &build, run)?;
    if let Err(err) = acknowledge(conn, &entry, &jobs.build_job_id) {
        warn!("Build job {} is queued for entry {}, mark the entry launched by hand before the next launch",
            jobs.build_job_id, entry.id);
        return Err(LaunchError::Unacknowledged { build_job_id: jobs.build_job_id, reason: err.to_string() });
    }

    Ok(Launch::Submitted { entry, wd, jobs })
}

/// The qsub command lines a real launch would run
fn dry_run_commands(config: &ClusterConfig, build: &JobDescriptor, run: &JobDescriptor) -> [String; 2] {
    let qsub = config.qsub_path.display();
    [
        format!("{qsub} {}", build.qsub_args().join(" ")),
        format!("{qsub} -W depend=afterok:<build job id> {}", run.qsub_args().join(" ")),
    ]
}
