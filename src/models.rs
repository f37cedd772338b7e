//! Domain models shared by the stores, the selection controller and the TUI.
//! The types stay plain data holders; ordering and validation rules that every
//! layer must agree on live here so there is exactly one definition of them.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::LyricsError;

/// Opaque identifier handed out by the persistence layer. The SQLite store uses
/// the stringified row id, the snapshot store a counter, but nothing outside
/// the stores may rely on the format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(String);

impl SongId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for SongId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A stored song. `id` never changes after the store assigns it; `name` and
/// `content` are replaced by edit operations.
pub struct Song {
    pub id: SongId,
    /// Title shown in the list. Unique within a collection, ignoring case.
    pub name: String,
    /// Raw lyrics, newlines preserved.
    pub content: String,
}

impl Song {
    /// Whether `other` names the same song once case is ignored.
    pub fn name_matches(&self, other: &str) -> bool {
        names_collide(&self.name, other)
    }

    /// Number of lines in the lyrics, used by the detail pane header.
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Input record for creating a song. Produced by the manual entry form and by
/// file ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSong {
    pub name: String,
    pub content: String,
}

impl NewSong {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Trim the name and reject blank ones. Content is kept verbatim because
    /// leading blank lines can be meaningful in lyrics.
    pub fn validated(&self) -> Result<NewSong, LyricsError> {
        let name = validate_name(&self.name)?;
        Ok(NewSong {
            name,
            content: self.content.clone(),
        })
    }
}

/// Partial update applied by `SongStore::update`. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongPatch {
    pub name: Option<String>,
    pub content: Option<String>,
}

impl SongPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.content.is_none()
    }

    /// Copy the patched fields onto `song`.
    pub fn apply_to(&self, song: &mut Song) {
        if let Some(name) = &self.name {
            song.name = name.clone();
        }
        if let Some(content) = &self.content {
            song.content = content.clone();
        }
    }
}

/// Presentation mode of the front-end. Compact shows either the list or the
/// lyrics; Wide shows both side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    Compact,
    #[default]
    Wide,
}

impl LayoutMode {
    /// Pick the layout for a terminal `width` given the configured threshold.
    pub fn for_width(width: u16, wide_min_columns: u16) -> Self {
        if width >= wide_min_columns {
            LayoutMode::Wide
        } else {
            LayoutMode::Compact
        }
    }
}

/// Trim a song name and reject it when nothing is left.
pub fn validate_name(raw: &str) -> Result<String, LyricsError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(LyricsError::InvalidSong("Song name is required.".to_string()));
    }
    Ok(name.to_string())
}

/// Case-insensitive name equality, the uniqueness rule of a collection.
pub fn names_collide(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Primary sort key of a name: case and diacritics folded away, so "Éclair"
/// lands among the E's rather than after "Z".
pub fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Ordering used for every song list: folded names first, then case-folded
/// names so accented and plain spellings stay apart, raw names last.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Sort a collection in place by name, the id breaking exact ties.
pub fn sort_songs(songs: &mut [Song]) {
    songs.sort_by_cached_key(|song| {
        (
            collation_key(&song.name),
            song.name.to_lowercase(),
            song.name.clone(),
            song.id.clone(),
        )
    });
}
