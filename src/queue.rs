//! Build PBS job descriptors for an experiment and submit them with qsub
//!
//! Every experiment becomes two jobs: one that builds a Singularity image from the committed
//! definition file, and an array job that runs the image once per line of the parameters file.
//! The run job depends on the build job, so it's only released when the image built successfully.

/// Job descriptors and their qsub argument rendering
pub mod job;

/// Read the copied experiment files and describe the build and run jobs
pub mod command;

/// Execute descriptors with qsub and chain the run job to the build job
pub mod submit;

#[cfg(test)]
pub mod fake;
