use std::fs;
use std::path::Path;

use jsonschema::JSONSchema;
use log::info;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ClusterConfig;
use crate::error::LaunchError;
use crate::experiment::{Entry, CONFIG_FILE, DEFINITION_FILE, PARAMETERS_FILE};
use crate::queue::job::{ArrayRange, EnvBundle, JobDescriptor};
use crate::WorkingDirectory;

/// Resources requested for every image build
pub const BUILD_RESOURCES: &str = "select=1:ncpus=1:mem=4gb";

/// The experiment's own `config.json`
///
/// `commit` is the commit of the code repository the experiment runs, not the commit of the
/// experiment definition, so it usually differs from the entry's commit.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct ExperimentConfig {
    #[serde(rename = "repo-name")]
    pub repo_name: String,
    pub commit: String,
}

/// Describe the image build job and the array job that runs it
///
/// Expects [`crate::experiment::validate::validate_and_copy`] to have copied the required files
/// into the working directory. The run job has no dependency yet, it's attached once the build
/// job has a queue id.
pub fn build_commands(
    config: &ClusterConfig,
    entry: &Entry,
    wd: &WorkingDirectory,
) -> Result<(JobDescriptor, JobDescriptor), LaunchError> {
    let config_path = wd.path.join(CONFIG_FILE);
    let experiment = read_experiment_config(&config_path)?;

    let image = wd.path.join(format!("{}.sif", entry.commit)).display().to_string();
    let def_file = wd.path.join(DEFINITION_FILE).display().to_string();

    let mut env = EnvBundle::default();
    env.push("EXP_PATH", &wd.path.display().to_string());
    env.push("REPO_NAME", &experiment.repo_name);
    env.push("COMMIT", &experiment.commit);
    if let Some((key, _)) = env.vars().iter().find(|(_, value)| value.contains(',')) {
        return Err(LaunchError::DataFormat {
            path: config_path,
            reason: format!("{key} can't contain a comma"),
        });
    }

    let singularity = config.singularity_path.display().to_string();

    let build = JobDescriptor {
        name: format!("build_{}", entry.commit),
        command: vec![
            singularity.clone(),
            "build".to_string(),
            "--force".to_string(),
            config.build_privilege_flag.clone(),
            image.clone(),
            def_file,
        ],
        resources: Some(BUILD_RESOURCES.to_string()),
        env: Some(env.clone()),
        array: None,
        depends_on: None,
    };

    let n_jobs = count_array_jobs(&wd.path.join(PARAMETERS_FILE))?;
    info!("Experiment {} runs {n_jobs} array job(s)", entry.commit);

    let run = JobDescriptor {
        name: format!("run_{}", entry.commit),
        command: vec![singularity, "run".to_string(), "--env".to_string(), env.to_string(), image],
        resources: None,
        env: None,
        array: Some(ArrayRange { first: 1, last: n_jobs }),
        depends_on: None,
    };

    Ok((build, run))
}

/// Read `config.json` and check it against the bundled schema
pub fn read_experiment_config(path: &Path) -> Result<ExperimentConfig, LaunchError> {
    let data_error = |reason: String| LaunchError::DataFormat { path: path.to_path_buf(), reason };

    info!("Reading experiment configuration {}", path.display());
    let json_string = fs::read_to_string(path)?;
    let json: Value = serde_json::from_str(&json_string)
        .map_err(|e| data_error(format!("invalid JSON: {e}")))?;
    validate_config(&json).map_err(data_error)?;

    serde_json::from_value::<ExperimentConfig>(json).map_err(|e| data_error(e.to_string()))
}

fn validate_config(json: &Value) -> Result<(), String> {
    /// included experiment configuration schema
    static SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schema/config.json"));
    let schema: Value = serde_json::from_str(SCHEMA).map_err(|e| format!("bad schema: {e}"))?;
    let compiled = JSONSchema::compile(&schema).map_err(|e| format!("bad schema: {e}"))?;

    if let Err(errors) = compiled.validate(json) {
        let reasons: Vec<String> = errors.map(|e| e.to_string()).collect();
        return Err(reasons.join("; "));
    }
    Ok(())
}

/// Number of array jobs: every line of the parameters file except the header
pub fn count_array_jobs(path: &Path) -> Result<u64, LaunchError> {
    let data_error = |reason: &str| LaunchError::DataFormat { path: path.to_path_buf(), reason: reason.to_string() };

    let content = fs::read(path)?;
    let content = String::from_utf8(content).map_err(|_| data_error("not valid UTF-8"))?;
    match content.lines().count() {
        0 => Err(data_error("empty file, expected a header line")),
        1 => Err(data_error("only a header line, no parameters to run")),
        n => Ok(n as u64 - 1),
    }
}
