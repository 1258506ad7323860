use std::fmt;

/// Environment variables shared by the build and run jobs
///
/// Rendered as `KEY=value` pairs joined with commas, which is what both `qsub -v` and
/// `singularity run --env` expect. Values mustn't contain commas.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvBundle {
    vars: Vec<(String, String)>,
}

impl EnvBundle {
    pub fn push(&mut self, key: &str, value: &str) {
        self.vars.push((key.to_string(), value.to_string()));
    }

    pub fn vars(&self) -> &[(String, String)] {
        &self.vars
    }
}

impl fmt::Display for EnvBundle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let pairs: Vec<String> = self.vars.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{}", pairs.join(","))
    }
}

/// Inclusive range of array job indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayRange {
    pub first: u64,
    pub last: u64,
}

impl fmt::Display for ArrayRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// Only start a job once another job has exited successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    AfterOk(String),
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Dependency::AfterOk(id) => write!(f, "afterok:{id}"),
        }
    }
}

/// Everything needed to submit one job to PBS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub name: String,
    /// Executable and arguments run inside the job
    pub command: Vec<String>,
    /// PBS resource request, e.g. `select=1:ncpus=1:mem=4gb`
    pub resources: Option<String>,
    /// Variables exported into the job environment
    pub env: Option<EnvBundle>,
    pub array: Option<ArrayRange>,
    pub depends_on: Option<Dependency>,
}

impl JobDescriptor {
    /// qsub arguments, without the qsub executable itself
    ///
    /// ```text
    /// [-W depend=afterok:ID] -N NAME [-v ENV] [-l RESOURCES] [-J FIRST-LAST] -- COMMAND...
    /// ```
    pub fn qsub_args(&self) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        if let Some(dependency) = &self.depends_on {
            args.push("-W".to_string());
            args.push(format!("depend={dependency}"));
        }
        args.push("-N".to_string());
        args.push(self.name.clone());
        if let Some(env) = &self.env {
            args.push("-v".to_string());
            args.push(env.to_string());
        }
        if let Some(resources) = &self.resources {
            args.push("-l".to_string());
            args.push(resources.clone());
        }
        if let Some(array) = &self.array {
            args.push("-J".to_string());
            args.push(array.to_string());
        }
        args.push("--".to_string());
        args.extend(self.command.iter().cloned());
        args
    }
}
