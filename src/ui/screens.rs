use crate::models::{Song, SongId};

/// Cursor and filter over the song list. The cursor is what the arrow keys
/// move; the selection lives in the controller and changes on Enter.
#[derive(Default)]
pub(crate) struct SongListView {
    pub(crate) filter: Option<String>,
    pub(crate) visible: Vec<SongId>,
    pub(crate) cursor: usize,
}

impl SongListView {
    pub(crate) fn query(&self) -> &str {
        self.filter.as_deref().unwrap_or("")
    }

    pub(crate) fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter;
    }

    /// Replace the visible rows, keeping the cursor on the same song when it
    /// is still listed.
    pub(crate) fn sync(&mut self, visible: &[&Song]) {
        let keep = self.current().cloned();
        self.visible = visible.iter().map(|song| song.id.clone()).collect();
        if let Some(id) = keep {
            if self.focus(&id) {
                return;
            }
        }
        self.ensure_in_bounds();
    }

    pub(crate) fn current(&self) -> Option<&SongId> {
        self.visible.get(self.cursor)
    }

    /// Move the cursor onto `id`. Returns false when it is filtered out.
    pub(crate) fn focus(&mut self, id: &SongId) -> bool {
        match self.visible.iter().position(|candidate| candidate == id) {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => false,
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.visible.is_empty() {
            return;
        }
        let last = self.visible.len() as isize - 1;
        self.cursor = (self.cursor as isize + offset).clamp(0, last) as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.cursor = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.cursor = self.visible.len().saturating_sub(1);
    }

    fn ensure_in_bounds(&mut self) {
        if self.cursor >= self.visible.len() {
            self.cursor = self.visible.len().saturating_sub(1);
        }
    }
}

/// Full-screen lyrics view. The song is fetched from the store when the
/// screen opens, so it can be missing if someone deleted it meanwhile.
pub(crate) struct ViewerScreen {
    pub(crate) requested: SongId,
    pub(crate) song: Option<Song>,
    pub(crate) scroll: u16,
}

impl ViewerScreen {
    pub(crate) fn new(requested: SongId, song: Option<Song>) -> Self {
        Self {
            requested,
            song,
            scroll: 0,
        }
    }

    pub(crate) fn scroll_by(&mut self, delta: i32) {
        let max = self
            .song
            .as_ref()
            .map(|song| song.line_count().saturating_sub(1))
            .unwrap_or(0);
        let next = (i32::from(self.scroll) + delta).clamp(0, max.min(u16::MAX as usize) as i32);
        self.scroll = next as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str, name: &str) -> Song {
        Song {
            id: SongId::new(id),
            name: name.to_string(),
            content: "a\nb\nc".to_string(),
        }
    }

    #[test]
    fn cursor_follows_song_across_resync() {
        let a = song("1", "A");
        let b = song("2", "B");
        let c = song("3", "C");
        let mut view = SongListView::default();
        view.sync(&[&a, &b, &c]);
        view.move_selection(2);
        assert_eq!(view.current(), Some(&c.id));

        view.sync(&[&c, &a]);
        assert_eq!(view.current(), Some(&c.id));
        assert_eq!(view.cursor, 0);
    }

    #[test]
    fn cursor_clamps_when_rows_disappear() {
        let a = song("1", "A");
        let b = song("2", "B");
        let mut view = SongListView::default();
        view.sync(&[&a, &b]);
        view.select_last();
        view.sync(&[&a]);
        assert_eq!(view.current(), Some(&a.id));

        view.sync(&[]);
        assert_eq!(view.current(), None);
        view.move_selection(3);
        assert_eq!(view.cursor, 0);
    }

    #[test]
    fn viewer_scroll_stays_within_lyrics() {
        let mut viewer = ViewerScreen::new(SongId::new("1"), Some(song("1", "A")));
        viewer.scroll_by(10);
        assert_eq!(viewer.scroll, 2);
        viewer.scroll_by(-5);
        assert_eq!(viewer.scroll, 0);

        let mut missing = ViewerScreen::new(SongId::new("9"), None);
        missing.scroll_by(3);
        assert_eq!(missing.scroll, 0);
    }
}
