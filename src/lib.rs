//! Core library surface for the Lyrics Locker TUI.
//!
//! The binary only wires these pieces together: resolve the data directory,
//! load the config, open a store and hand it to the selection controller that
//! the UI drives.
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod store;
pub mod ui;

pub use config::{Backend, Config};
pub use controller::{SelectionCause, SelectionChange, SelectionController, UploadReport};
pub use error::LyricsError;
pub use ingest::{ingest_paths, Ingested};
pub use models::{LayoutMode, NewSong, Song, SongId};
pub use store::{open_store, SongStore, Subscription};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
