//! Selection controller: owns the mirrored song collection and the selected
//! song, and keeps the two consistent no matter where a change came from.
//!
//! Local optimistic edits, pushes from the store and full refetches all end in
//! [`SelectionController::on_collection_changed`], so there is exactly one
//! place that decides what happens to the selection when the list moves under
//! it. The selection is stored as an id and resolved against the collection on
//! every read, which makes re-binding to updated data automatic.

use tracing::{debug, info, warn};

use crate::error::LyricsError;
use crate::models::{
    names_collide, sort_songs, validate_name, LayoutMode, NewSong, Song, SongId, SongPatch,
};
use crate::store::{SongStore, Subscription};

/// Why the selection moved. Re-binding never produces a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionCause {
    /// Explicit pick from the list.
    User,
    /// Wide layout filled an empty selection with the first song.
    Default,
    /// The selected song disappeared and the first remaining one took over.
    Replaced,
    /// A song added to an empty collection.
    Added,
    /// Nothing is selected any more.
    Cleared,
}

/// Outbound "selection changed" signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    pub selected: Option<SongId>,
    pub cause: SelectionCause,
    /// Compact layout: the list overlay should close to reveal the lyrics.
    pub collapse_overlay: bool,
}

pub type SelectionListener = Box<dyn FnMut(&SelectionChange)>;

/// Marks the collection revision a refetch was issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    revision: u64,
}

/// Per-file result of a batch upload.
#[derive(Debug)]
pub struct UploadReport {
    pub name: String,
    pub result: Result<SongId, LyricsError>,
}

pub struct SelectionController<S: SongStore> {
    store: S,
    songs: Vec<Song>,
    selected: Option<SongId>,
    layout: LayoutMode,
    /// Bumped every time a collection is applied; refetch tickets compare
    /// against it to drop stale responses.
    revision: u64,
    listener: Option<SelectionListener>,
    last_error: Option<String>,
}

impl<S: SongStore> SelectionController<S> {
    pub fn new(store: S, layout: LayoutMode, listener: Option<SelectionListener>) -> Self {
        Self {
            store,
            songs: Vec::new(),
            selected: None,
            layout,
            revision: 0,
            listener,
            last_error: None,
        }
    }

    /// Build the controller and run the initial fetch. A failing fetch leaves
    /// an empty collection and a visible error instead of aborting start-up.
    pub fn load(store: S, layout: LayoutMode, listener: Option<SelectionListener>) -> Self {
        let mut controller = Self::new(store, layout, listener);
        if let Err(err) = controller.refresh() {
            warn!(%err, "initial song fetch failed");
        }
        controller
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn selected(&self) -> Option<&Song> {
        let id = self.selected.as_ref()?;
        self.songs.iter().find(|song| &song.id == id)
    }

    pub fn selected_id(&self) -> Option<&SongId> {
        self.selected.as_ref()
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Message of the last persistence failure, cleared by the next
    /// successful fetch or push.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn find(&self, id: &SongId) -> Option<&Song> {
        self.songs.iter().find(|song| &song.id == id)
    }

    /// Songs whose name contains `query`, ignoring case. A blank query keeps
    /// everything.
    pub fn filtered(&self, query: &str) -> Vec<&Song> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.songs.iter().collect();
        }
        self.songs
            .iter()
            .filter(|song| song.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Open the store's push channel, if it has one.
    pub fn subscribe(&mut self) -> Option<Subscription> {
        self.store.subscribe()
    }

    /// Apply a complete collection and reconcile the selection against it.
    pub fn on_collection_changed(&mut self, songs: Vec<Song>) {
        self.install(songs);
        self.reconcile();
    }

    /// Entry point for the store's push channel. Last write wins: a push is
    /// applied even if it arrives after a local optimistic change.
    pub fn apply_push(&mut self, songs: Vec<Song>) {
        debug!(count = songs.len(), "applying pushed collection");
        self.last_error = None;
        self.on_collection_changed(songs);
    }

    pub fn begin_refresh(&self) -> RefreshTicket {
        RefreshTicket {
            revision: self.revision,
        }
    }

    /// Apply a refetch result. Returns `Ok(false)` when the response was
    /// discarded because a fresher collection landed after it was requested.
    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<Song>, LyricsError>,
    ) -> Result<bool, LyricsError> {
        let songs = match result {
            Ok(songs) => songs,
            Err(err) => {
                self.record(&err);
                return Err(err);
            }
        };
        if ticket.revision != self.revision {
            debug!(
                issued = ticket.revision,
                current = self.revision,
                "discarding stale refresh"
            );
            return Ok(false);
        }
        self.last_error = None;
        self.on_collection_changed(songs);
        Ok(true)
    }

    /// Synchronous refetch from the store.
    pub fn refresh(&mut self) -> Result<bool, LyricsError> {
        let ticket = self.begin_refresh();
        let result = self.store.list();
        self.finish_refresh(ticket, result)
    }

    /// Explicit pick from the list. Always signals, even when the song was
    /// already selected, because compact layouts need the collapse.
    pub fn on_user_select(&mut self, id: &SongId) -> Result<(), LyricsError> {
        if self.find(id).is_none() {
            warn!(%id, "ignoring selection of a song outside the collection");
            return Err(LyricsError::InvalidSelection(id.clone()));
        }
        let collapse = self.layout == LayoutMode::Compact;
        self.set_selection(Some(id.clone()), SelectionCause::User, collapse);
        Ok(())
    }

    /// Wide → Compact clears the selection; Compact → Wide fills an empty one.
    pub fn on_layout_mode_changed(&mut self, mode: LayoutMode) {
        if mode == self.layout {
            return;
        }
        debug!(from = ?self.layout, to = ?mode, "layout changed");
        self.layout = mode;
        match mode {
            LayoutMode::Wide => self.reconcile(),
            LayoutMode::Compact => self.set_selection(None, SelectionCause::Cleared, false),
        }
    }

    /// Remove the song from the mirror first, then from the store. A target
    /// that is already gone counts as success.
    pub fn on_delete(&mut self, id: &SongId) -> Result<(), LyricsError> {
        if self.find(id).is_some() {
            let remaining: Vec<Song> = self
                .songs
                .iter()
                .filter(|song| &song.id != id)
                .cloned()
                .collect();
            self.on_collection_changed(remaining);
        }

        match self.store.remove(id) {
            Ok(()) => {
                info!(%id, "deleted song");
                Ok(())
            }
            Err(LyricsError::NotFound(_)) => {
                debug!(%id, "delete target already gone");
                Ok(())
            }
            Err(err) => {
                self.record(&err);
                Err(err)
            }
        }
    }

    /// Save an edit. `new_name` of `None` keeps the current name. The mirror
    /// is updated after the store accepts the change; a selected song re-binds
    /// to the new values.
    pub fn on_edit_save(
        &mut self,
        id: &SongId,
        new_name: Option<&str>,
        new_content: &str,
    ) -> Result<(), LyricsError> {
        if self.find(id).is_none() {
            debug!(%id, "edit target not in collection, nothing to save");
            return Ok(());
        }

        let name = match new_name {
            Some(raw) => {
                let name = validate_name(raw)?;
                let taken = self
                    .songs
                    .iter()
                    .any(|other| &other.id != id && names_collide(&other.name, &name));
                if taken {
                    return Err(LyricsError::DuplicateName(name));
                }
                Some(name)
            }
            None => None,
        };
        let patch = SongPatch {
            name,
            content: Some(new_content.to_string()),
        };

        match self.store.update(id, &patch) {
            Ok(()) => {
                let mut next = self.songs.clone();
                if let Some(song) = next.iter_mut().find(|song| &song.id == id) {
                    patch.apply_to(song);
                }
                self.on_collection_changed(next);
                info!(%id, "saved song edit");
                Ok(())
            }
            Err(LyricsError::NotFound(_)) => {
                debug!(%id, "edit target vanished from the store");
                let remaining: Vec<Song> = self
                    .songs
                    .iter()
                    .filter(|song| &song.id != id)
                    .cloned()
                    .collect();
                self.on_collection_changed(remaining);
                Ok(())
            }
            Err(err) => {
                self.record(&err);
                Err(err)
            }
        }
    }

    /// Create a song. Names colliding with an existing song (ignoring case)
    /// are rejected before the store is touched.
    pub fn on_add(&mut self, name: &str, content: &str) -> Result<Song, LyricsError> {
        let song = NewSong::new(name, content).validated()?;
        if self.songs.iter().any(|other| other.name_matches(&song.name)) {
            debug!(name = %song.name, "rejecting duplicate song name");
            return Err(LyricsError::DuplicateName(song.name));
        }

        let was_empty = self.songs.is_empty();
        let created = match self.store.add(&song) {
            Ok(created) => created,
            Err(err) => {
                self.record(&err);
                return Err(err);
            }
        };

        let mut next = self.songs.clone();
        next.push(created.clone());
        self.install(next);
        if was_empty {
            self.set_selection(Some(created.id.clone()), SelectionCause::Added, false);
        }
        self.reconcile();
        info!(id = %created.id, name = %created.name, "added song");
        Ok(created)
    }

    /// Add every item independently; one failure never blocks the others.
    pub fn upload(&mut self, batch: Vec<NewSong>) -> Vec<UploadReport> {
        let reports: Vec<UploadReport> = batch
            .into_iter()
            .map(|item| {
                let result = self
                    .on_add(&item.name, &item.content)
                    .map(|song| song.id);
                UploadReport {
                    name: item.name.trim().to_string(),
                    result,
                }
            })
            .collect();

        let added = reports.iter().filter(|report| report.result.is_ok()).count();
        info!(added, failed = reports.len() - added, "upload finished");
        reports
    }

    fn install(&mut self, mut songs: Vec<Song>) {
        sort_songs(&mut songs);
        self.songs = songs;
        self.revision += 1;
    }

    /// The reconciliation rules: keep a selection whose id survived, replace
    /// or clear one that vanished, default-select in the wide layout only.
    fn reconcile(&mut self) {
        let first = self.songs.first().map(|song| song.id.clone());
        let fallback = first.filter(|_| self.layout == LayoutMode::Wide);

        let survived = self
            .selected
            .as_ref()
            .is_some_and(|id| self.songs.iter().any(|song| &song.id == id));
        if survived {
            return;
        }

        if self.selected.is_some() {
            let cause = if fallback.is_some() {
                SelectionCause::Replaced
            } else {
                SelectionCause::Cleared
            };
            self.set_selection(fallback, cause, false);
        } else if fallback.is_some() {
            self.set_selection(fallback, SelectionCause::Default, false);
        }
    }

    fn set_selection(&mut self, next: Option<SongId>, cause: SelectionCause, collapse: bool) {
        let changed = self.selected != next;
        self.selected = next;
        if !changed && cause != SelectionCause::User {
            return;
        }

        let change = SelectionChange {
            selected: self.selected.clone(),
            cause,
            collapse_overlay: collapse,
        };
        debug!(selected = ?change.selected, cause = ?change.cause, "selection changed");
        if let Some(listener) = self.listener.as_mut() {
            listener(&change);
        }
    }

    fn record(&mut self, err: &LyricsError) {
        if let LyricsError::PersistenceUnavailable(message) = err {
            warn!(%message, "persistence failure");
            self.last_error = Some(message.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::store::SnapshotStore;

    fn song(id: &str, name: &str, content: &str) -> Song {
        Song {
            id: SongId::new(id),
            name: name.to_string(),
            content: content.to_string(),
        }
    }

    fn id(raw: &str) -> SongId {
        SongId::new(raw)
    }

    type Changes = Rc<RefCell<Vec<SelectionChange>>>;

    fn controller(layout: LayoutMode) -> (SelectionController<SnapshotStore>, Changes) {
        let changes: Changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        let listener: SelectionListener =
            Box::new(move |change: &SelectionChange| sink.borrow_mut().push(change.clone()));
        (
            SelectionController::new(SnapshotStore::in_memory(), layout, Some(listener)),
            changes,
        )
    }

    fn selected_id<S: SongStore>(ctrl: &SelectionController<S>) -> Option<&str> {
        ctrl.selected_id().map(SongId::as_str)
    }

    /// Store double whose writes and reads can be switched to fail.
    struct FlakyStore {
        inner: SnapshotStore,
        failing: Rc<Cell<bool>>,
    }

    impl FlakyStore {
        fn check(&self) -> Result<(), LyricsError> {
            if self.failing.get() {
                Err(LyricsError::PersistenceUnavailable("offline".into()))
            } else {
                Ok(())
            }
        }
    }

    impl SongStore for FlakyStore {
        fn list(&self) -> Result<Vec<Song>, LyricsError> {
            self.check()?;
            self.inner.list()
        }

        fn add(&mut self, song: &NewSong) -> Result<Song, LyricsError> {
            self.check()?;
            self.inner.add(song)
        }

        fn update(&mut self, id: &SongId, patch: &SongPatch) -> Result<(), LyricsError> {
            self.check()?;
            self.inner.update(id, patch)
        }

        fn remove(&mut self, id: &SongId) -> Result<(), LyricsError> {
            self.check()?;
            self.inner.remove(id)
        }

        fn describe(&self) -> String {
            "flaky".into()
        }
    }

    #[test]
    fn wide_layout_default_selects_first_song() {
        let (mut ctrl, changes) = controller(LayoutMode::Wide);
        ctrl.on_collection_changed(vec![song("1", "Amazing Grace", "")]);
        assert_eq!(selected_id(&ctrl), Some("1"));
        assert_eq!(changes.borrow()[0].cause, SelectionCause::Default);
    }

    #[test]
    fn compact_layout_never_auto_selects() {
        let (mut ctrl, changes) = controller(LayoutMode::Compact);
        ctrl.on_collection_changed(vec![song("1", "Amazing Grace", "")]);
        assert_eq!(selected_id(&ctrl), None);
        assert!(changes.borrow().is_empty());
    }

    #[test]
    fn rebinding_follows_updated_data_without_a_signal() {
        let (mut ctrl, changes) = controller(LayoutMode::Wide);
        ctrl.on_collection_changed(vec![song("1", "A", "old"), song("2", "B", "")]);
        ctrl.on_user_select(&id("2")).unwrap();
        let before = changes.borrow().len();

        ctrl.on_collection_changed(vec![song("1", "A", "old"), song("2", "Zed", "new words")]);
        let selected = ctrl.selected().unwrap();
        assert_eq!(selected.id, id("2"));
        assert_eq!(selected.name, "Zed");
        assert_eq!(selected.content, "new words");
        assert_eq!(changes.borrow().len(), before);
    }

    #[test]
    fn reapplying_the_same_collection_is_idempotent() {
        let (mut ctrl, _) = controller(LayoutMode::Wide);
        let collection = vec![song("3", "C", ""), song("1", "A", ""), song("2", "B", "")];
        ctrl.on_collection_changed(collection.clone());
        let first = ctrl.selected().cloned();
        ctrl.on_collection_changed(collection);
        assert_eq!(ctrl.selected().cloned(), first);
        assert_eq!(selected_id(&ctrl), Some("1"));
    }

    #[test]
    fn vanished_selection_moves_to_first_in_wide_and_clears_in_compact() {
        let (mut wide, _) = controller(LayoutMode::Wide);
        wide.on_collection_changed(vec![song("1", "A", ""), song("2", "B", "")]);
        wide.on_user_select(&id("2")).unwrap();
        wide.on_collection_changed(vec![song("1", "A", "")]);
        assert_eq!(selected_id(&wide), Some("1"));

        let (mut compact, changes) = controller(LayoutMode::Compact);
        compact.on_collection_changed(vec![song("1", "A", ""), song("2", "B", "")]);
        compact.on_user_select(&id("2")).unwrap();
        compact.on_collection_changed(vec![song("1", "A", "")]);
        assert_eq!(selected_id(&compact), None);
        assert_eq!(changes.borrow().last().unwrap().cause, SelectionCause::Cleared);
    }

    #[test]
    fn deleting_selected_song_in_wide_selects_a_remaining_one() {
        let (mut ctrl, _) = controller(LayoutMode::Wide);
        let a = ctrl.on_add("Amazing Grace", "how sweet").unwrap();
        let b = ctrl.on_add("Be Thou My Vision", "o lord").unwrap();
        assert_eq!(ctrl.selected_id(), Some(&a.id));

        ctrl.on_delete(&a.id).unwrap();
        assert_eq!(ctrl.selected_id(), Some(&b.id));
        assert!(ctrl.store().list().unwrap().iter().all(|s| s.id != a.id));

        ctrl.on_delete(&b.id).unwrap();
        assert!(ctrl.selected().is_none());
        assert!(ctrl.songs().is_empty());
    }

    #[test]
    fn delete_of_a_missing_song_is_not_an_error() {
        let (mut ctrl, _) = controller(LayoutMode::Wide);
        ctrl.on_add("Only", "one").unwrap();
        assert!(ctrl.on_delete(&id("ghost")).is_ok());
        assert_eq!(ctrl.songs().len(), 1);
    }

    #[test]
    fn duplicate_add_is_rejected_and_collection_grows_by_one() {
        let (mut ctrl, _) = controller(LayoutMode::Wide);
        ctrl.on_add("Song A", "first").unwrap();
        let err = ctrl.on_add("song a", "second").unwrap_err();
        assert!(matches!(err, LyricsError::DuplicateName(_)));
        assert_eq!(ctrl.songs().len(), 1);
        assert_eq!(ctrl.songs()[0].content, "first");
    }

    #[test]
    fn collection_stays_sorted_for_every_insertion_order() {
        let names = ["delta", "Alpha", "charlie", "Bravo"];
        let mut orders = Vec::new();
        permutations(&mut names.to_vec(), names.len(), &mut orders);
        assert_eq!(orders.len(), 24);

        for order in orders {
            let (mut ctrl, _) = controller(LayoutMode::Compact);
            for name in &order {
                ctrl.on_add(name, "").unwrap();
            }
            let got: Vec<&str> = ctrl.songs().iter().map(|s| s.name.as_str()).collect();
            assert_eq!(got, ["Alpha", "Bravo", "charlie", "delta"], "order {order:?}");
        }
    }

    #[test]
    fn accented_titles_sort_among_their_letters() {
        let (mut ctrl, _) = controller(LayoutMode::Wide);
        for name in ["Zebra", "Éclair", "apple", "Ödipus"] {
            ctrl.on_add(name, "").unwrap();
        }
        let got: Vec<&str> = ctrl.songs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(got, ["apple", "Éclair", "Ödipus", "Zebra"]);
    }

    fn permutations<'a>(items: &mut Vec<&'a str>, k: usize, out: &mut Vec<Vec<&'a str>>) {
        if k <= 1 {
            out.push(items.clone());
            return;
        }
        for i in 0..k {
            permutations(items, k - 1, out);
            let swap = if k % 2 == 0 { i } else { 0 };
            items.swap(swap, k - 1);
        }
    }

    #[test]
    fn rename_resorts_and_keeps_selection() {
        let (mut ctrl, _) = controller(LayoutMode::Wide);
        let a = ctrl.on_add("Alpha", "a").unwrap();
        ctrl.on_add("Bravo", "b").unwrap();
        assert_eq!(ctrl.selected_id(), Some(&a.id));

        ctrl.on_edit_save(&a.id, Some("Zulu"), "z").unwrap();
        let names: Vec<&str> = ctrl.songs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Bravo", "Zulu"]);
        let selected = ctrl.selected().unwrap();
        assert_eq!(selected.id, a.id);
        assert_eq!(selected.content, "z");
    }

    #[test]
    fn rename_onto_existing_name_is_rejected() {
        let (mut ctrl, _) = controller(LayoutMode::Wide);
        let a = ctrl.on_add("Alpha", "a").unwrap();
        ctrl.on_add("Bravo", "b").unwrap();
        let err = ctrl.on_edit_save(&a.id, Some("BRAVO"), "a").unwrap_err();
        assert!(matches!(err, LyricsError::DuplicateName(_)));
        assert_eq!(ctrl.find(&a.id).unwrap().name, "Alpha");
    }

    #[test]
    fn edit_of_song_deleted_elsewhere_reconciles_silently() {
        let (mut ctrl, _) = controller(LayoutMode::Wide);
        let a = ctrl.on_add("Alpha", "a").unwrap();
        let b = ctrl.on_add("Bravo", "b").unwrap();

        // Another writer removed the song behind the mirror's back.
        ctrl.store.remove(&a.id).unwrap();

        assert!(ctrl.on_edit_save(&a.id, None, "new").is_ok());
        assert!(ctrl.find(&a.id).is_none());
        assert_eq!(ctrl.selected_id(), Some(&b.id));
    }

    #[test]
    fn add_to_empty_collection_selects_even_in_compact() {
        let (mut ctrl, changes) = controller(LayoutMode::Compact);
        let first = ctrl.on_add("First", "").unwrap();
        assert_eq!(ctrl.selected_id(), Some(&first.id));
        assert_eq!(changes.borrow()[0].cause, SelectionCause::Added);

        ctrl.on_user_select(&first.id).unwrap();
        ctrl.on_add("Second", "").unwrap();
        assert_eq!(ctrl.selected_id(), Some(&first.id));
    }

    #[test]
    fn user_select_outside_collection_fails_without_changing_state() {
        let (mut ctrl, changes) = controller(LayoutMode::Wide);
        ctrl.on_collection_changed(vec![song("1", "A", "")]);
        let count = changes.borrow().len();
        let err = ctrl.on_user_select(&id("9")).unwrap_err();
        assert!(matches!(err, LyricsError::InvalidSelection(_)));
        assert_eq!(selected_id(&ctrl), Some("1"));
        assert_eq!(changes.borrow().len(), count);
    }

    #[test]
    fn compact_user_select_asks_to_collapse_overlay() {
        let (mut ctrl, changes) = controller(LayoutMode::Compact);
        ctrl.on_collection_changed(vec![song("1", "A", "")]);
        ctrl.on_user_select(&id("1")).unwrap();
        ctrl.on_user_select(&id("1")).unwrap();
        let changes = changes.borrow();
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.collapse_overlay));
    }

    #[test]
    fn layout_transitions() {
        let (mut ctrl, _) = controller(LayoutMode::Compact);
        ctrl.on_collection_changed(vec![song("1", "A", ""), song("2", "B", "")]);
        assert_eq!(selected_id(&ctrl), None);

        ctrl.on_layout_mode_changed(LayoutMode::Wide);
        assert_eq!(selected_id(&ctrl), Some("1"));

        ctrl.on_user_select(&id("2")).unwrap();
        ctrl.on_layout_mode_changed(LayoutMode::Compact);
        assert_eq!(selected_id(&ctrl), None);

        ctrl.on_layout_mode_changed(LayoutMode::Wide);
        assert_eq!(selected_id(&ctrl), Some("1"));
    }

    #[test]
    fn stale_refresh_is_discarded() {
        let (mut ctrl, _) = controller(LayoutMode::Wide);
        let ticket = ctrl.begin_refresh();
        ctrl.apply_push(vec![song("1", "Fresh", "")]);

        let applied = ctrl
            .finish_refresh(ticket, Ok(vec![song("0", "Stale", "")]))
            .unwrap();
        assert!(!applied);
        assert_eq!(ctrl.songs()[0].name, "Fresh");

        let ticket = ctrl.begin_refresh();
        let applied = ctrl
            .finish_refresh(ticket, Ok(vec![song("2", "Newer", "")]))
            .unwrap();
        assert!(applied);
        assert_eq!(selected_id(&ctrl), Some("2"));
    }

    #[test]
    fn duplicate_names_in_one_upload_batch() {
        let (mut ctrl, _) = controller(LayoutMode::Wide);
        let reports = ctrl.upload(vec![
            NewSong::new("X", "first"),
            NewSong::new("X", "second"),
            NewSong::new("Y", "third"),
        ]);
        assert!(reports[0].result.is_ok());
        assert!(matches!(
            reports[1].result,
            Err(LyricsError::DuplicateName(_))
        ));
        assert!(reports[2].result.is_ok());
        assert_eq!(ctrl.songs().len(), 2);
    }

    #[test]
    fn persistence_failures_leave_a_valid_controller() {
        let failing = Rc::new(Cell::new(false));
        let store = FlakyStore {
            inner: SnapshotStore::in_memory(),
            failing: Rc::clone(&failing),
        };
        let mut ctrl = SelectionController::load(store, LayoutMode::Wide, None);
        let a = ctrl.on_add("Alpha", "a").unwrap();

        failing.set(true);
        assert!(matches!(
            ctrl.on_add("Bravo", "b"),
            Err(LyricsError::PersistenceUnavailable(_))
        ));
        assert!(ctrl.on_edit_save(&a.id, None, "changed").is_err());
        assert!(ctrl.refresh().is_err());
        assert_eq!(ctrl.last_error(), Some("offline"));
        assert_eq!(ctrl.songs().len(), 1);
        assert_eq!(ctrl.selected().unwrap().content, "a");

        failing.set(false);
        assert!(ctrl.refresh().unwrap());
        assert!(ctrl.last_error().is_none());
    }

    #[test]
    fn search_filters_by_name_ignoring_case() {
        let (mut ctrl, _) = controller(LayoutMode::Wide);
        ctrl.on_collection_changed(vec![
            song("1", "Bohemian Rhapsody", ""),
            song("2", "Hotel California", ""),
            song("3", "Stairway to Heaven", ""),
        ]);
        let hits: Vec<&str> = ctrl.filtered("HEAV").iter().map(|s| s.name.as_str()).collect();
        assert_eq!(hits, ["Stairway to Heaven"]);
        assert_eq!(ctrl.filtered("  ").len(), 3);
    }
}
