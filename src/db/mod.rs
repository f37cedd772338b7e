//! Persistence helpers around the embedded SQLite database, split across
//! logical submodules. Each function wraps one query so `store::sqlite` can
//! stay focused on the adapter contract.

mod connection;
mod songs;

pub use connection::{ensure_schema, open_database, open_in_memory, DB_FILE_NAME};
pub use songs::{create_song, data_version, delete_song, fetch_song, fetch_songs, update_song};
