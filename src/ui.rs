//! Ratatui front end: a song list and a lyrics pane that share the screen on
//! wide terminals and take turns on narrow ones.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
