//! Error taxonomy of the lyrics domain. Plumbing code (terminal setup, SQL
//! helpers, config loading) keeps using `anyhow`; everything that crosses the
//! store trait or leaves the selection controller is one of these variants so
//! callers can decide between "show a message" and "ignore".

use thiserror::Error;

use crate::models::SongId;

#[derive(Debug, Error)]
pub enum LyricsError {
    /// Add or rename rejected because another song already uses the name.
    #[error("A song named \"{0}\" already exists.")]
    DuplicateName(String),

    /// Selecting a song that is not part of the current collection.
    #[error("Song {0} is not in the current collection.")]
    InvalidSelection(SongId),

    /// The backing store could not be read or written.
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// Update or delete target no longer exists.
    #[error("Song {0} not found.")]
    NotFound(SongId),

    /// Input rejected before it reached the store.
    #[error("{0}")]
    InvalidSong(String),
}

impl LyricsError {
    /// Wrap a plumbing error, keeping the innermost cause as the message
    /// because that is the part a user can act on.
    pub fn unavailable(err: anyhow::Error) -> Self {
        let cause = err
            .chain()
            .last()
            .map(|cause| cause.to_string())
            .unwrap_or_else(|| err.to_string());
        let message = if cause == err.to_string() {
            cause
        } else {
            format!("{err}: {cause}")
        };
        LyricsError::PersistenceUnavailable(message)
    }

    /// Errors a user should see in the footer. `InvalidSelection` and
    /// `NotFound` are swallowed by the controller.
    pub fn is_user_visible(&self) -> bool {
        !matches!(
            self,
            LyricsError::InvalidSelection(_) | LyricsError::NotFound(_)
        )
    }
}
