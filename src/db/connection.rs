use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// SQLite file name stored inside the application data directory.
pub const DB_FILE_NAME: &str = "lyrics.sqlite";

/// Open (creating if needed) the database at `path` and run the lazy
/// migration. The parent directory is created so a fresh data directory works
/// on first start.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(path).context("failed to open SQLite database")?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Throw-away database, used by tests.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create the `songs` table if it does not exist yet. Name uniqueness is
/// enforced by the database as well (`COLLATE NOCASE`) so two instances
/// writing the same file cannot both insert "Song A" and "song a".
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            content TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create songs table")?;

    Ok(())
}
