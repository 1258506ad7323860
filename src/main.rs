use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};

use crate::config::ClusterConfig;
use crate::db::ingest::register_entry;
use crate::db::open::open_db;
use crate::error::LaunchError;
use crate::launch::{launch, Launch};
use crate::queue::submit::Qsub;
use crate::repo::git::GitRepository;

mod config;
mod db;
mod error;
mod experiment;
mod launch;
mod queue;
mod repo;

#[derive(Parser, Debug)]
#[command(name = "kokeilu")]
#[command(version = "0.1")]
#[command(about = "Build and run committed experiments on a PBS cluster")]
#[command(long_about = "kokeilu reads the newest experiment entry from its database, copies the \
experiment files of that commit into a working directory, and submits a Singularity image build \
job followed by an array job that runs the image once per parameter row.\n\n\
Run at most one kokeilu process at a time.")]
struct Args {
    /// Path to the cluster configuration JSON file
    #[arg(short, long, default_value = "cluster-config.json")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch the newest experiment entry that hasn't been launched yet
    Launch {
        /// Copy files and render qsub commands without submitting or updating the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Add an experiment entry to the database
    Register {
        #[arg(short, long)]
        user: String,
        #[arg(long)]
        commit: String,
    },
}

/// A directory where experiment files are copied and jobs are submitted from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDirectory {
    pub path: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    info!("terve! starting up :)");

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<LaunchError>() {
                Some(LaunchError::NotFound) => warn!("Nothing to launch: {err}"),
                _ => error!("{err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = ClusterConfig::load(&args.config)?;
    let conn = open_db(&config.db_path)
        .with_context(|| format!("Can't open database {}", config.db_path.display()))?;

    match args.command {
        Commands::Register { user, commit } => {
            let id = register_entry(&conn, &user, &commit)?;
            info!("Registered entry {id}");
        }
        Commands::Launch { dry_run } => {
            let repo = GitRepository::new(&config.repo_path);
            let qsub = Qsub { path: config.qsub_path.clone() };
            match launch(&config, &conn, &repo, &qsub, dry_run)? {
                Launch::Submitted { entry, wd, jobs } => {
                    info!("Launched {} for {}: build job {}, run job {} queued from {}",
                        entry.commit, entry.user, jobs.build_job_id, jobs.run.name, wd.path.display());
                }
                Launch::DryRun { entry, wd, build, run } => {
                    info!("Dry run of {} for {} finished, {} and {} staged in {}",
                        entry.commit, entry.user, build.name, run.name, wd.path.display());
                }
            }
        }
    }

    Ok(())
}
