use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::error::LaunchError;
use crate::queue::job::JobDescriptor;
use crate::queue::submit::QueueExecutor;

#[derive(Debug, Clone)]
pub enum Submission {
    Captured(JobDescriptor),
    FireAndForget(JobDescriptor),
}

/// Records submissions instead of queueing them
pub struct FakeQueue {
    /// What the captured (build) submission prints, or why it fails
    pub build_output: Result<String, String>,
    pub fail_run: bool,
    pub calls: RefCell<Vec<Submission>>,
    pub dirs: RefCell<Vec<PathBuf>>,
}

impl FakeQueue {
    pub fn new(build_output: Result<String, String>) -> FakeQueue {
        FakeQueue {
            build_output,
            fail_run: false,
            calls: RefCell::new(Vec::new()),
            dirs: RefCell::new(Vec::new()),
        }
    }
}

impl QueueExecutor for FakeQueue {
    fn submit_and_capture(&self, job: &JobDescriptor, wd: &Path) -> Result<String, LaunchError> {
        self.calls.borrow_mut().push(Submission::Captured(job.clone()));
        self.dirs.borrow_mut().push(wd.to_path_buf());
        self.build_output.clone().map_err(LaunchError::Submission)
    }

    fn submit(&self, job: &JobDescriptor, wd: &Path) -> Result<(), LaunchError> {
        self.calls.borrow_mut().push(Submission::FireAndForget(job.clone()));
        self.dirs.borrow_mut().push(wd.to_path_buf());
        match self.fail_run {
            true => Err(LaunchError::Submission("qsub exited with status 38".to_string())),
            false => Ok(()),
        }
    }
}
