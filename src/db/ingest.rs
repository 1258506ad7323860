use chrono::Utc;
use log::info;
use rusqlite::Connection;

/// Add an experiment entry to the database, returning its row id
///
/// The insertion timestamp is only informational. Ordering relies on the row id.
pub fn register_entry(conn: &Connection, user: &str, commit: &str) -> rusqlite::Result<i64> {
    info!("Adding commit {commit} by {user} to db");
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO entry (username, commit_id, created_at) VALUES (?1, ?2, ?3)",
        (user, commit, &created_at),
    )?;

    Ok(conn.last_insert_rowid())
}
