//! Turns uploaded files into `NewSong` records. Only plain-text lyrics are
//! accepted; anything else is skipped without complaint, mirroring a file
//! picker filtered to `.txt`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::models::NewSong;

/// Extension accepted as lyrics, compared case-insensitively.
const TEXT_EXTENSION: &str = "txt";

/// Outcome of reading a set of paths.
#[derive(Debug, Default)]
pub struct Ingested {
    pub songs: Vec<NewSong>,
    /// Files ignored because they are not plain text.
    pub skipped: Vec<PathBuf>,
    /// Files that looked like text but could not be read.
    pub unreadable: Vec<(PathBuf, String)>,
}

/// Convert one uploaded blob. The name is the file name without its
/// extension; `None` means the blob is not plain text.
pub fn ingest_blob(file_name: &str, bytes: &[u8]) -> Option<NewSong> {
    let path = Path::new(file_name);
    let is_txt = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TEXT_EXTENSION));
    if !is_txt || bytes.contains(&0) {
        return None;
    }

    let text = std::str::from_utf8(bytes).ok()?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let name = path.file_stem()?.to_str()?.trim();
    if name.is_empty() {
        return None;
    }

    Some(NewSong::new(name, text.replace("\r\n", "\n")))
}

/// Read every path; directories contribute their direct children in name
/// order. A missing path is an error, individual bad files are not.
pub fn ingest_paths(paths: &[PathBuf]) -> Result<Ingested> {
    let mut files = Vec::new();
    for path in paths {
        let meta = fs::metadata(path)
            .with_context(|| format!("cannot access {}", path.display()))?;
        if meta.is_dir() {
            let mut children = fs::read_dir(path)
                .with_context(|| format!("failed to list {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|child| child.is_file())
                .collect::<Vec<_>>();
            children.sort();
            files.extend(children);
        } else {
            files.push(path.clone());
        }
    }

    let mut ingested = Ingested::default();
    for file in files {
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = match fs::read(&file) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %file.display(), %err, "failed to read upload");
                ingested.unreadable.push((file, err.to_string()));
                continue;
            }
        };
        match ingest_blob(&file_name, &bytes) {
            Some(song) => ingested.songs.push(song),
            None => {
                debug!(path = %file.display(), "skipping non-text upload");
                ingested.skipped.push(file);
            }
        }
    }

    Ok(ingested)
}
