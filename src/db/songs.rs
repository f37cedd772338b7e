use anyhow::{Context, Result};
use rusqlite::{params, Connection, Error as SqlError, ErrorCode, OptionalExtension};

use crate::error::LyricsError;
use crate::models::{Song, SongId};

/// Fetch every song, ordered case-insensitively so mixed-case names group
/// together. Callers still run `sort_songs` because the tie-break on equal
/// folded names is defined in Rust, not in SQL.
pub fn fetch_songs(conn: &Connection) -> Result<Vec<Song>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, content
             FROM songs
             ORDER BY name COLLATE NOCASE, name",
        )
        .context("failed to prepare songs query")?;

    let songs = stmt
        .query_map([], |row| {
            Ok(Song {
                id: SongId::from(row.get::<_, i64>(0)?),
                name: row.get(1)?,
                content: row.get(2)?,
            })
        })
        .context("failed to iterate songs")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect songs")?;

    Ok(songs)
}

/// Look up a single song, used by the full-screen viewer and the CLI.
pub fn fetch_song(conn: &Connection, id: i64) -> Result<Option<Song>> {
    conn.query_row(
        "SELECT id, name, content FROM songs WHERE id = ?1",
        [id],
        |row| {
            Ok(Song {
                id: SongId::from(row.get::<_, i64>(0)?),
                name: row.get(1)?,
                content: row.get(2)?,
            })
        },
    )
    .optional()
    .context("failed to load song")
}

/// Insert a brand new song. We echo the hydrated struct so callers can update
/// their mirror without re-querying.
pub fn create_song(conn: &Connection, name: &str, content: &str) -> Result<Song> {
    conn.execute(
        "INSERT INTO songs (name, content) VALUES (?1, ?2)",
        params![name, content],
    )
    .map_err(|err| map_unique_constraint(err, name))
    .context("failed to insert song")?;

    let id = conn.last_insert_rowid();
    Ok(Song {
        id: SongId::from(id),
        name: name.to_string(),
        content: content.to_string(),
    })
}

/// Update the provided fields; `None` keeps the stored value. Zero touched
/// rows means the song vanished, reported as `LyricsError::NotFound`.
pub fn update_song(
    conn: &Connection,
    id: i64,
    name: Option<&str>,
    content: Option<&str>,
) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE songs
             SET name = COALESCE(?1, name), content = COALESCE(?2, content)
             WHERE id = ?3",
            params![name, content, id],
        )
        .map_err(|err| map_unique_constraint(err, name.unwrap_or_default()))
        .context("failed to update song")?;

    if updated == 0 {
        Err(LyricsError::NotFound(SongId::from(id)).into())
    } else {
        Ok(())
    }
}

/// Permanently delete a song.
pub fn delete_song(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM songs WHERE id = ?1", params![id])
        .context("failed to delete song")?;

    if deleted == 0 {
        Err(LyricsError::NotFound(SongId::from(id)).into())
    } else {
        Ok(())
    }
}

/// SQLite bumps `data_version` whenever another connection commits to the
/// same file. The watcher compares successive values to detect remote edits.
pub fn data_version(conn: &Connection) -> Result<i64> {
    conn.query_row("PRAGMA data_version", [], |row| row.get(0))
        .context("failed to read data_version")
}

/// The only constraint on `songs` is the case-insensitive name, so any
/// constraint violation becomes a `DuplicateName` the store can downcast.
fn map_unique_constraint(err: SqlError, name: &str) -> anyhow::Error {
    if matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    ) {
        LyricsError::DuplicateName(name.to_string()).into()
    } else {
        err.into()
    }
}
