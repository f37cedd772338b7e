//! Persistence adapters. The selection controller only sees `SongStore`; which
//! backend sits behind it is decided once at start-up from the config.

mod snapshot;
mod sqlite;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::{Backend, Config};
use crate::db::DB_FILE_NAME;
use crate::error::LyricsError;
use crate::models::{NewSong, Song, SongId, SongPatch};

pub use snapshot::{SnapshotStore, SNAPSHOT_FILE_NAME};
pub use sqlite::SqliteStore;

/// Contract every backend satisfies. Errors are already mapped into the domain
/// taxonomy: `DuplicateName` for name collisions, `NotFound` for vanished
/// targets, `PersistenceUnavailable` for everything else.
pub trait SongStore {
    /// Full collection in any order.
    fn list(&self) -> Result<Vec<Song>, LyricsError>;

    /// Single song lookup. The default scans `list`.
    fn get(&self, id: &SongId) -> Result<Option<Song>, LyricsError> {
        Ok(self.list()?.into_iter().find(|song| &song.id == id))
    }

    /// Persist a new song and return it with its assigned id.
    fn add(&mut self, song: &NewSong) -> Result<Song, LyricsError>;

    fn update(&mut self, id: &SongId, patch: &SongPatch) -> Result<(), LyricsError>;

    fn remove(&mut self, id: &SongId) -> Result<(), LyricsError>;

    /// Push channel delivering the full collection whenever it changes.
    /// Backends without live updates return `None`.
    fn subscribe(&mut self) -> Option<Subscription> {
        None
    }

    /// Short label for the footer and the log.
    fn describe(&self) -> String;
}

impl<S: SongStore + ?Sized> SongStore for Box<S> {
    fn list(&self) -> Result<Vec<Song>, LyricsError> {
        (**self).list()
    }

    fn get(&self, id: &SongId) -> Result<Option<Song>, LyricsError> {
        (**self).get(id)
    }

    fn add(&mut self, song: &NewSong) -> Result<Song, LyricsError> {
        (**self).add(song)
    }

    fn update(&mut self, id: &SongId, patch: &SongPatch) -> Result<(), LyricsError> {
        (**self).update(id, patch)
    }

    fn remove(&mut self, id: &SongId) -> Result<(), LyricsError> {
        (**self).remove(id)
    }

    fn subscribe(&mut self) -> Option<Subscription> {
        (**self).subscribe()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Live feed of full collections from a store. Dropping it tells a
/// background producer to stop.
pub struct Subscription {
    rx: Receiver<Vec<Song>>,
    stop: Option<Arc<AtomicBool>>,
}

impl Subscription {
    /// Feed whose producer notices a dropped receiver on its next send.
    pub fn new(rx: Receiver<Vec<Song>>) -> Self {
        Self { rx, stop: None }
    }

    /// Feed backed by a thread that polls `stop` between checks.
    pub(crate) fn with_stop_flag(rx: Receiver<Vec<Song>>, stop: Arc<AtomicBool>) -> Self {
        Self {
            rx,
            stop: Some(stop),
        }
    }

    pub fn try_recv(&self) -> Result<Vec<Song>, TryRecvError> {
        self.rx.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Vec<Song>, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(stop) = &self.stop {
            stop.store(true, Ordering::Relaxed);
        }
    }
}

/// Convert an `anyhow` error coming out of the SQL or file helpers. Typed
/// domain errors raised inside the helpers survive the context layers.
pub(crate) fn from_plumbing(err: anyhow::Error) -> LyricsError {
    match err.downcast_ref::<LyricsError>() {
        Some(LyricsError::DuplicateName(name)) => LyricsError::DuplicateName(name.clone()),
        Some(LyricsError::NotFound(id)) => LyricsError::NotFound(id.clone()),
        _ => LyricsError::unavailable(err),
    }
}

/// Songs seeded into a brand-new store so the first start is not empty.
const SAMPLE_SONGS: &[(&str, &str)] = &[
    (
        "Bohemian Rhapsody",
        "Is this the real life?\nIs this just fantasy?\nCaught in a landslide,\nNo escape from reality.",
    ),
    (
        "Stairway to Heaven",
        "There's a lady who's sure\nAll that glitters is gold\nAnd she's buying a stairway to heaven.",
    ),
    (
        "Hotel California",
        "On a dark desert highway, cool wind in my hair\nWarm smell of colitas, rising up through the air\nUp ahead in the distance, I saw a shimmering light\nMy head grew heavy and my sight grew dim\nI had to stop for the night.",
    ),
];

/// Open the backend selected in `config` inside `data_dir`. Samples are only
/// seeded when the backing file did not exist yet, so deleting every song
/// does not bring them back on the next start.
pub fn open_store(config: &Config, data_dir: &Path) -> anyhow::Result<Box<dyn SongStore>> {
    let (mut store, fresh): (Box<dyn SongStore>, bool) = match config.backend {
        Backend::Sqlite => {
            let path = data_dir.join(DB_FILE_NAME);
            let fresh = !path.exists();
            (Box::new(SqliteStore::open(&path)?), fresh)
        }
        Backend::Snapshot => {
            let path = data_dir.join(SNAPSHOT_FILE_NAME);
            let fresh = !path.exists();
            (Box::new(SnapshotStore::open(&path)?), fresh)
        }
    };

    if fresh && config.seed_samples {
        let seeded = seed_samples(store.as_mut())?;
        info!(seeded, store = %store.describe(), "seeded sample songs");
    }
    Ok(store)
}

/// Add the sample songs, skipping names that already exist.
pub fn seed_samples(store: &mut dyn SongStore) -> Result<usize, LyricsError> {
    let mut added = 0;
    for (name, content) in SAMPLE_SONGS {
        match store.add(&NewSong::new(*name, *content)) {
            Ok(_) => added += 1,
            Err(LyricsError::DuplicateName(_)) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(added)
}
