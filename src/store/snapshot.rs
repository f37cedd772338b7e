use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LyricsError;
use crate::models::{names_collide, validate_name, NewSong, Song, SongId, SongPatch};

use super::{SongStore, Subscription};

/// File name of the JSON snapshot inside the data directory.
pub const SNAPSHOT_FILE_NAME: &str = "lyrics.json";

/// On-disk shape: the whole collection plus the id counter.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    songs: Vec<Song>,
}

/// Local backend: the full collection held in memory and rewritten as one JSON
/// document after every mutation. Subscribers receive the collection after
/// each successful write.
pub struct SnapshotStore {
    path: Option<PathBuf>,
    doc: SnapshotDocument,
    subscribers: Vec<Sender<Vec<Song>>>,
}

impl SnapshotStore {
    /// Load the snapshot at `path`, starting empty when the file is missing.
    pub fn open(path: &Path) -> Result<Self> {
        let doc = if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read snapshot {}", path.display()))?;
            let doc: SnapshotDocument =
                serde_json::from_str(&raw).context("failed to parse snapshot")?;
            sanitize(doc)
        } else {
            SnapshotDocument::default()
        };
        info!(path = %path.display(), songs = doc.songs.len(), "opened snapshot song store");

        Ok(Self {
            path: Some(path.to_path_buf()),
            doc,
            subscribers: Vec::new(),
        })
    }

    /// Store that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            doc: SnapshotDocument::default(),
            subscribers: Vec::new(),
        }
    }

    /// Write the document atomically (temp file + rename).
    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
        let raw = serde_json::to_string_pretty(&self.doc).context("failed to encode snapshot")?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, raw).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }

    fn broadcast(&mut self) {
        let songs = self.doc.songs.clone();
        self.subscribers
            .retain(|subscriber| subscriber.send(songs.clone()).is_ok());
    }

    /// Persist `self.doc`, restoring `previous` if the write fails so memory
    /// and disk never disagree.
    fn commit(&mut self, previous: SnapshotDocument) -> Result<(), LyricsError> {
        if let Err(err) = self.persist() {
            self.doc = previous;
            return Err(LyricsError::unavailable(err));
        }
        self.broadcast();
        Ok(())
    }

    fn position(&self, id: &SongId) -> Result<usize, LyricsError> {
        self.doc
            .songs
            .iter()
            .position(|song| &song.id == id)
            .ok_or_else(|| LyricsError::NotFound(id.clone()))
    }

    fn clone_doc(&self) -> SnapshotDocument {
        SnapshotDocument {
            next_id: self.doc.next_id,
            songs: self.doc.songs.clone(),
        }
    }
}

/// Drop entries a well-behaved writer could not have produced (blank names,
/// case-insensitive duplicates, repeated ids) and repair the id counter.
fn sanitize(doc: SnapshotDocument) -> SnapshotDocument {
    let mut seen_ids = HashSet::new();
    let mut kept: Vec<Song> = Vec::with_capacity(doc.songs.len());

    for mut song in doc.songs {
        let Ok(name) = validate_name(&song.name) else {
            warn!(id = %song.id, "skipping snapshot entry with a blank name");
            continue;
        };
        if kept.iter().any(|other| names_collide(&other.name, &name)) {
            warn!(%name, "skipping duplicate snapshot entry");
            continue;
        }
        if !seen_ids.insert(song.id.clone()) {
            warn!(id = %song.id, "skipping snapshot entry with a repeated id");
            continue;
        }
        song.name = name;
        kept.push(song);
    }

    let highest = kept
        .iter()
        .filter_map(|song| song.id.as_str().parse::<u64>().ok())
        .max()
        .map_or(0, |id| id + 1);

    SnapshotDocument {
        next_id: doc.next_id.max(highest),
        songs: kept,
    }
}

impl SongStore for SnapshotStore {
    fn list(&self) -> Result<Vec<Song>, LyricsError> {
        Ok(self.doc.songs.clone())
    }

    fn add(&mut self, song: &NewSong) -> Result<Song, LyricsError> {
        let song = song.validated()?;
        if self.doc.songs.iter().any(|other| other.name_matches(&song.name)) {
            return Err(LyricsError::DuplicateName(song.name));
        }

        let previous = self.clone_doc();
        let created = Song {
            id: SongId::new(self.doc.next_id.to_string()),
            name: song.name,
            content: song.content,
        };
        self.doc.next_id += 1;
        self.doc.songs.push(created.clone());
        self.commit(previous)?;
        debug!(id = %created.id, name = %created.name, "added song to snapshot");
        Ok(created)
    }

    fn update(&mut self, id: &SongId, patch: &SongPatch) -> Result<(), LyricsError> {
        let index = self.position(id)?;
        let mut patch = patch.clone();
        if let Some(name) = &patch.name {
            let name = validate_name(name)?;
            let taken = self
                .doc
                .songs
                .iter()
                .any(|other| &other.id != id && other.name_matches(&name));
            if taken {
                return Err(LyricsError::DuplicateName(name));
            }
            patch.name = Some(name);
        }

        let previous = self.clone_doc();
        patch.apply_to(&mut self.doc.songs[index]);
        self.commit(previous)?;
        debug!(%id, "updated song in snapshot");
        Ok(())
    }

    fn remove(&mut self, id: &SongId) -> Result<(), LyricsError> {
        let index = self.position(id)?;
        let previous = self.clone_doc();
        self.doc.songs.remove(index);
        self.commit(previous)?;
        debug!(%id, "removed song from snapshot");
        Ok(())
    }

    fn subscribe(&mut self) -> Option<Subscription> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        Some(Subscription::new(rx))
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("snapshot:{}", path.display()),
            None => "snapshot:memory".to_string(),
        }
    }
}
