//! Experiment entries are stored in a SQLite database
//!
//! A separate intake process (or `kokeilu register`) inserts one row per submitted commit. The
//! launcher reads the newest row that hasn't been launched yet and marks it once its jobs are queued.

/// Connect to a SQLite database
pub mod open;
/// Load the latest pending entry and acknowledge launched entries
pub mod entry;
/// Register new experiment entries
pub mod ingest;
