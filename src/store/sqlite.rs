use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::db::{
    create_song, data_version, delete_song, fetch_song, fetch_songs, open_database,
    open_in_memory, update_song,
};
use crate::error::LyricsError;
use crate::models::{validate_name, NewSong, Song, SongId, SongPatch};

use super::{from_plumbing, SongStore, Subscription};

/// How often the watcher thread checks `data_version` by default.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Live backend: a SQLite file that several instances may share. Pushes come
/// from a watcher thread that notices commits made through any connection.
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
    poll_interval: Duration,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_database(path)?;
        info!(path = %path.display(), "opened sqlite song store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Private database with no file behind it; `subscribe` yields nothing.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: open_in_memory()?,
            path: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Row ids are integers; anything else cannot exist in this store.
fn row_id(id: &SongId) -> Result<i64, LyricsError> {
    id.as_str()
        .parse()
        .map_err(|_| LyricsError::NotFound(id.clone()))
}

impl SongStore for SqliteStore {
    fn list(&self) -> Result<Vec<Song>, LyricsError> {
        fetch_songs(&self.conn).map_err(from_plumbing)
    }

    fn get(&self, id: &SongId) -> Result<Option<Song>, LyricsError> {
        let Ok(row) = id.as_str().parse::<i64>() else {
            return Ok(None);
        };
        fetch_song(&self.conn, row).map_err(from_plumbing)
    }

    fn add(&mut self, song: &NewSong) -> Result<Song, LyricsError> {
        let song = song.validated()?;
        let created = create_song(&self.conn, &song.name, &song.content).map_err(from_plumbing)?;
        debug!(id = %created.id, name = %created.name, "inserted song");
        Ok(created)
    }

    fn update(&mut self, id: &SongId, patch: &SongPatch) -> Result<(), LyricsError> {
        let row = row_id(id)?;
        let name = match &patch.name {
            Some(name) => Some(validate_name(name)?),
            None => None,
        };
        update_song(&self.conn, row, name.as_deref(), patch.content.as_deref())
            .map_err(from_plumbing)?;
        debug!(%id, "updated song");
        Ok(())
    }

    fn remove(&mut self, id: &SongId) -> Result<(), LyricsError> {
        let row = row_id(id)?;
        delete_song(&self.conn, row).map_err(from_plumbing)?;
        debug!(%id, "deleted song");
        Ok(())
    }

    fn subscribe(&mut self) -> Option<Subscription> {
        let path = self.path.clone()?;
        let interval = self.poll_interval;
        // The baseline is taken here, not on the thread, so commits made right
        // after `subscribe` returns are never missed.
        let (conn, baseline) = match open_watcher(&path) {
            Ok(opened) => opened,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "live updates disabled");
                return None;
            }
        };
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let watcher_stop = Arc::clone(&stop);

        let spawned = thread::Builder::new()
            .name("sqlite-watcher".to_string())
            .spawn(move || watch(&conn, baseline, interval, &tx, &watcher_stop));

        match spawned {
            Ok(_) => Some(Subscription::with_stop_flag(rx, stop)),
            Err(err) => {
                warn!(%err, "failed to spawn sqlite watcher, live updates disabled");
                None
            }
        }
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("sqlite:{}", path.display()),
            None => "sqlite:memory".to_string(),
        }
    }
}

fn open_watcher(path: &Path) -> Result<(Connection, i64)> {
    let conn = Connection::open(path).context("failed to open watcher connection")?;
    let version = data_version(&conn)?;
    Ok((conn, version))
}

/// Poll `data_version` on a dedicated connection and push the listing after
/// every observed commit. Returns once the subscription is dropped or the
/// receiving side is gone. Failed polls and reads are retried on the next tick.
fn watch(
    conn: &Connection,
    mut last_seen: i64,
    interval: Duration,
    tx: &Sender<Vec<Song>>,
    stop: &AtomicBool,
) {
    debug!(version = last_seen, "sqlite watcher started");

    loop {
        thread::sleep(interval);
        if stop.load(Ordering::Relaxed) {
            debug!("subscription dropped, sqlite watcher exiting");
            return;
        }

        let version = match data_version(conn) {
            Ok(version) => version,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed to poll data_version");
                continue;
            }
        };
        if version == last_seen {
            continue;
        }

        let songs = match fetch_songs(conn) {
            Ok(songs) => songs,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed to read songs after commit");
                continue;
            }
        };
        last_seen = version;
        debug!(count = songs.len(), "pushing collection after external commit");
        if tx.send(songs).is_err() {
            return;
        }
    }
}
