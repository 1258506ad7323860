use chrono::Utc;
use log::info;
use rusqlite::{Connection, OptionalExtension};

use crate::error::LaunchError;
use crate::experiment::Entry;

/// Load the most recently inserted entry that hasn't been launched or failed
///
/// Row ids are assigned in insertion order, so the newest entry is the one with the largest id.
pub fn latest_entry(conn: &Connection) -> Result<Entry, LaunchError> {
    let entry = conn
        .query_row(
            "SELECT id, username, commit_id FROM entry WHERE launched == 0 AND failed_at IS NULL ORDER BY id DESC LIMIT 1",
            [],
            |row| {
                Ok(Entry {
                    id: row.get(0)?,
                    user: row.get(1)?,
                    commit: row.get(2)?,
                })
            },
        )
        .optional()?;

    match entry {
        Some(entry) => {
            info!("Loaded entry {} from db: commit {} by {}", entry.id, entry.commit, entry.user);
            Ok(entry)
        }
        None => Err(LaunchError::NotFound),
    }
}

/// Mark an entry as launched so the next invocation doesn't pick it up again
pub fn acknowledge(conn: &Connection, entry: &Entry, build_job_id: &str) -> Result<(), LaunchError> {
    info!("Updating entry {} with build job id {build_job_id}", entry.id);
    let launched_at = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE entry SET launched = 1, launched_at = ?1, build_job_id = ?2 WHERE id = ?3",
        (&launched_at, build_job_id, entry.id),
    )?;
    Ok(())
}

/// Record why an entry can't be launched so it's skipped from now on
pub fn mark_failed(conn: &Connection, entry: &Entry, reason: &str) -> Result<(), LaunchError> {
    info!("Updating entry {} as failed: {reason}", entry.id);
    let failed_at = Utc::now().to_rfc3339();
    conn.execute(
        "UPDATE entry SET failed_at = ?1, failure = ?2 WHERE id = ?3",
        (&failed_at, reason, entry.id),
    )?;
    Ok(())
}
