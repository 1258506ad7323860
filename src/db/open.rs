use std::path::Path;

use log::info;

pub fn open_db(path: &Path) -> rusqlite::Result<rusqlite::Connection> {
    if !path.exists() { info!("Creating new database {}", path.display()) }
    let conn = rusqlite::Connection::open(path)?;

    static SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/db/schema.sql"));
    conn.execute(SCHEMA, [])?;

    Ok(conn)
}
