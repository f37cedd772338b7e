//! Binary entry point. Without arguments it opens the TUI; `list` and
//! `import` work on the same store from a plain shell.
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use lyrics_locker::{
    config, ingest_paths, logging, open_store, run_app, App, Config, LayoutMode,
    SelectionController, SongStore,
};
use tracing::info;

const USAGE: &str = "\
Usage: lyrics-locker [COMMAND]

Commands:
  (none)              Open the lyrics library
  list                Print every song name
  import <PATH>...    Add .txt files, or folders of them, to the library
  help                Show this message

Data lives in ~/.lyrics-locker unless LYRICS_LOCKER_HOME is set.";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if matches!(
        args.first().map(String::as_str),
        Some("help" | "-h" | "--help")
    ) {
        println!("{USAGE}");
        return Ok(());
    }

    let data_dir = config::data_dir()?;
    let config = Config::load(&data_dir)?;
    let log_path = logging::init(&data_dir, &config.log_level)?;
    info!(data_dir = %data_dir.display(), log = %log_path.display(), backend = ?config.backend, "starting");

    match args.first().map(String::as_str) {
        None => run_tui(&config, &data_dir),
        Some("list") => list(&config, &data_dir),
        Some("import") => import(&config, &data_dir, &args[1..]),
        Some(other) => {
            eprintln!("{USAGE}");
            bail!("unknown command {other:?}")
        }
    }
}

fn run_tui(config: &Config, data_dir: &Path) -> Result<()> {
    let store = open_store(config, data_dir)?;
    let width = crossterm::terminal::size()
        .map(|(width, _)| width)
        .unwrap_or(config.wide_min_columns);
    let mut app = App::new(store, width, config.wide_min_columns, data_dir);
    run_app(&mut app)
}

fn load(config: &Config, data_dir: &Path) -> Result<SelectionController<Box<dyn SongStore>>> {
    let store = open_store(config, data_dir)?;
    let controller = SelectionController::load(store, LayoutMode::Compact, None);
    match controller.last_error() {
        Some(message) => Err(anyhow!("{message}")),
        None => Ok(controller),
    }
}

fn list(config: &Config, data_dir: &Path) -> Result<()> {
    let controller = load(config, data_dir)?;
    for song in controller.songs() {
        println!("{:<40} {:>4} lines", song.name, song.line_count());
    }
    Ok(())
}

fn import(config: &Config, data_dir: &Path, raw_paths: &[String]) -> Result<()> {
    if raw_paths.is_empty() {
        eprintln!("{USAGE}");
        bail!("import needs at least one path");
    }
    let paths: Vec<PathBuf> = raw_paths.iter().map(PathBuf::from).collect();
    let ingested = ingest_paths(&paths)?;

    let mut controller = load(config, data_dir)?;
    let reports = controller.upload(ingested.songs);

    let mut failed = ingested.unreadable.len();
    for report in &reports {
        match &report.result {
            Ok(id) => println!("added    {} ({id})", report.name),
            Err(err) => {
                failed += 1;
                println!("failed   {}: {err}", report.name);
            }
        }
    }
    for path in &ingested.skipped {
        println!("skipped  {}", path.display());
    }
    for (path, err) in &ingested.unreadable {
        println!("failed   {}: {err}", path.display());
    }

    if failed > 0 {
        bail!("{failed} file(s) could not be imported");
    }
    Ok(())
}
