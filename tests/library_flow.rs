use std::fs;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use lyrics_locker::controller::SelectionListener;
use lyrics_locker::store::{SnapshotStore, SqliteStore};
use lyrics_locker::{
    ingest_paths, open_store, Backend, Config, LayoutMode, LyricsError, SelectionCause,
    SelectionChange, SelectionController, SongStore,
};

fn recording_listener() -> (SelectionListener, mpsc::Receiver<SelectionChange>) {
    let (tx, rx) = mpsc::channel();
    let listener: SelectionListener = Box::new(move |change: &SelectionChange| {
        tx.send(change.clone()).unwrap();
    });
    (listener, rx)
}

fn names<S: SongStore>(controller: &SelectionController<S>) -> Vec<String> {
    controller
        .songs()
        .iter()
        .map(|song| song.name.clone())
        .collect()
}

#[test]
fn snapshot_library_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lyrics.json");

    {
        let store = SnapshotStore::open(&path).unwrap();
        let mut controller = SelectionController::load(store, LayoutMode::Wide, None);
        controller.on_add("Zebra", "z").unwrap();
        controller.on_add("apple", "a").unwrap();
        let zebra = controller.songs()[1].id.clone();
        controller
            .on_edit_save(&zebra, Some("Banana"), "b\nb")
            .unwrap();
    }

    let store = SnapshotStore::open(&path).unwrap();
    let controller = SelectionController::load(store, LayoutMode::Wide, None);
    assert_eq!(names(&controller), ["apple", "Banana"]);
    assert_eq!(controller.selected().unwrap().name, "apple");
    assert_eq!(controller.songs()[1].content, "b\nb");
}

#[test]
fn sqlite_push_from_another_instance_moves_selection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lyrics.sqlite");

    let store = SqliteStore::open(&path)
        .unwrap()
        .with_poll_interval(Duration::from_millis(20));
    let (listener, changes) = recording_listener();
    let mut controller = SelectionController::load(store, LayoutMode::Wide, Some(listener));
    controller.on_add("A", "first").unwrap();
    controller.on_add("B", "second").unwrap();
    let pushes = controller.subscribe().expect("sqlite store pushes");
    while changes.try_recv().is_ok() {}

    let a = controller.selected_id().cloned().unwrap();
    let mut other = SqliteStore::open(&path).unwrap();
    other.remove(&a).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let songs = pushes.recv_timeout(remaining).expect("push arrives");
        if songs.len() == 1 {
            controller.apply_push(songs);
            break;
        }
    }

    assert_eq!(names(&controller), ["B"]);
    let change = changes.try_recv().unwrap();
    assert_eq!(change.cause, SelectionCause::Replaced);
    assert_eq!(controller.selected().unwrap().name, "B");
}

#[test]
fn duplicate_rename_is_rejected_by_both_backends() {
    let dir = tempfile::tempdir().unwrap();
    let backends: Vec<Box<dyn SongStore>> = vec![
        Box::new(SqliteStore::open(&dir.path().join("lyrics.sqlite")).unwrap()),
        Box::new(SnapshotStore::open(&dir.path().join("lyrics.json")).unwrap()),
    ];

    for store in backends {
        let mut controller = SelectionController::load(store, LayoutMode::Wide, None);
        controller.on_add("Amazing Grace", "x").unwrap();
        let other = controller.on_add("Be Thou My Vision", "y").unwrap();

        let err = controller
            .on_edit_save(&other.id, Some("AMAZING GRACE"), "y")
            .unwrap_err();
        assert!(matches!(err, LyricsError::DuplicateName(_)));

        let stored = controller.store().list().unwrap();
        assert!(stored.iter().any(|song| song.name == "Be Thou My Vision"));
        assert_eq!(stored.len(), 2);
    }
}

#[test]
fn import_directory_reports_each_file() {
    let dir = tempfile::tempdir().unwrap();
    let uploads = dir.path().join("uploads");
    fs::create_dir(&uploads).unwrap();
    fs::write(uploads.join("Hymn.txt"), "verse one").unwrap();
    fs::write(uploads.join("hymn copy.TXT"), "verse two").unwrap();
    fs::write(uploads.join("cover.jpg"), [0xff, 0xd8, 0x00]).unwrap();

    let config = Config {
        backend: Backend::Snapshot,
        seed_samples: false,
        ..Config::default()
    };
    let store = open_store(&config, dir.path()).unwrap();
    let mut controller = SelectionController::load(store, LayoutMode::Compact, None);
    controller.on_add("Hymn", "existing").unwrap();

    let ingested = ingest_paths(&[uploads]).unwrap();
    assert_eq!(ingested.skipped.len(), 1);
    let reports = controller.upload(ingested.songs);

    let outcomes: Vec<(&str, bool)> = reports
        .iter()
        .map(|report| (report.name.as_str(), report.result.is_ok()))
        .collect();
    assert_eq!(outcomes, [("Hymn", false), ("hymn copy", true)]);
    assert_eq!(names(&controller), ["Hymn", "hymn copy"]);
    // The first song into an empty library is selected, later uploads are not.
    assert_eq!(controller.selected().unwrap().name, "Hymn");
}

#[test]
fn fresh_data_dir_is_seeded_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();

    let mut store = open_store(&config, dir.path()).unwrap();
    assert_eq!(store.list().unwrap().len(), 3);
    for song in store.list().unwrap() {
        store.remove(&song.id).unwrap();
    }
    drop(store);

    let store = open_store(&config, dir.path()).unwrap();
    assert!(store.list().unwrap().is_empty());
}
