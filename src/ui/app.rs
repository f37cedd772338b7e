use std::fs;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use open::that as open_path;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{debug, info, warn};

use crate::controller::{SelectionChange, SelectionController, SelectionListener};
use crate::ingest::ingest_paths;
use crate::models::{LayoutMode, Song, SongId};
use crate::store::{SongStore, Subscription};

use super::forms::{ConfirmSongDelete, SongField, SongForm, UploadForm};
use super::helpers::{
    centered_rect, cursor_in, export_file_name, lyrics_lines, surface_error, upload_summary,
};
use super::screens::{SongListView, ViewerScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Share of a wide terminal given to the song list.
const LIST_WIDTH_PERCENT: u16 = 33;
/// Rows moved by PageUp / PageDown.
const PAGE_STEP: isize = 5;
/// Exported lyrics land here, inside the data directory.
const EXPORT_DIR_NAME: &str = "exports";

enum Screen {
    Library,
    Viewer(ViewerScreen),
}

/// Fine-grained modes scoped to the library screen.
enum Mode {
    Normal,
    AddingSong(SongForm),
    EditingSong { id: SongId, form: SongForm },
    ConfirmSongDelete(ConfirmSongDelete),
    Uploading(UploadForm),
    Searching(SearchState),
}

/// State for an active inline search.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    controller: SelectionController<Box<dyn SongStore>>,
    /// Selection changes emitted by the controller's listener.
    changes: Receiver<SelectionChange>,
    /// Live collection pushes; `None` for backends without them.
    pushes: Option<Subscription>,
    list: SongListView,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    /// Compact layout only: the song list covers the lyrics.
    overlay_open: bool,
    lyrics_scroll: u16,
    wide_min_columns: u16,
    export_dir: PathBuf,
    saved_search: Option<SearchState>,
}

impl App {
    pub fn new(
        store: Box<dyn SongStore>,
        width: u16,
        wide_min_columns: u16,
        data_dir: &Path,
    ) -> Self {
        let (tx, changes) = mpsc::channel();
        let listener: SelectionListener = Box::new(move |change: &SelectionChange| {
            // The receiver only goes away together with the app.
            let _ = tx.send(change.clone());
        });

        let layout = LayoutMode::for_width(width, wide_min_columns);
        let describe = store.describe();
        let mut controller = SelectionController::load(store, layout, Some(listener));
        let pushes = controller.subscribe();
        info!(store = %describe, ?layout, live = pushes.is_some(), "library opened");

        let mut app = Self {
            overlay_open: layout == LayoutMode::Compact && controller.selected().is_none(),
            controller,
            changes,
            pushes,
            list: SongListView::default(),
            screen: Screen::Library,
            mode: Mode::Normal,
            status: None,
            lyrics_scroll: 0,
            wide_min_columns,
            export_dir: data_dir.join(EXPORT_DIR_NAME),
            saved_search: None,
        };

        match app.controller.last_error().map(str::to_string) {
            Some(message) => app.set_status(format!("{message} Press r to retry."), StatusKind::Error),
            None => app.set_status(
                format!(
                    "Loaded {} songs from {describe}.",
                    app.controller.songs().len()
                ),
                StatusKind::Info,
            ),
        }
        app.sync_view();
        app
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingSong(form) => self.handle_add_song(code, form)?,
            Mode::EditingSong { id, form } => self.handle_edit_song(code, id, form)?,
            Mode::ConfirmSongDelete(confirm) => self.handle_confirm_song_delete(code, confirm)?,
            Mode::Uploading(form) => self.handle_upload(code, form)?,
            Mode::Searching(state) => self.handle_search(code, state)?,
        };

        self.mode = mode;
        self.sync_view();
        Ok(exit)
    }

    /// Apply whatever the store pushed since the last frame. Only the newest
    /// snapshot matters; each one is a full collection.
    pub(crate) fn tick(&mut self) {
        let Some(pushes) = &self.pushes else {
            return;
        };

        let mut latest = None;
        let mut disconnected = false;
        loop {
            match pushes.try_recv() {
                Ok(songs) => latest = Some(songs),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        if let Some(songs) = latest {
            debug!(count = songs.len(), "applying pushed collection");
            self.controller.apply_push(songs);
            self.refresh_viewer();
        }
        if disconnected {
            warn!("live updates stopped");
            self.pushes = None;
            self.set_status(
                "Live updates stopped. Press r to reload.",
                StatusKind::Error,
            );
        }
        self.sync_view();
    }

    pub(crate) fn handle_resize(&mut self, width: u16) {
        let layout = LayoutMode::for_width(width, self.wide_min_columns);
        if layout == self.controller.layout() {
            return;
        }
        self.controller.on_layout_mode_changed(layout);
        self.overlay_open = layout == LayoutMode::Compact;
        self.sync_view();
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        if let Screen::Viewer(viewer) = &mut self.screen {
            match code {
                KeyCode::Char('q') => *exit = true,
                KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('v') => {
                    self.screen = Screen::Library;
                }
                KeyCode::Up | KeyCode::Char('k') => viewer.scroll_by(-1),
                KeyCode::Down | KeyCode::Char('j') => viewer.scroll_by(1),
                KeyCode::PageUp => viewer.scroll_by(-(PAGE_STEP as i32)),
                KeyCode::PageDown => viewer.scroll_by(PAGE_STEP as i32),
                KeyCode::Home => viewer.scroll = 0,
                _ => {}
            }
            return Ok(Mode::Normal);
        }

        let list_visible = self.list_visible();
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if self.controller.layout() == LayoutMode::Compact && !self.overlay_open {
                    self.overlay_open = true;
                } else if self.list.filter.is_some() {
                    self.list.set_filter(None);
                    self.clear_status();
                } else {
                    *exit = true;
                }
            }
            KeyCode::Up if list_visible => self.list.move_selection(-1),
            KeyCode::Down if list_visible => self.list.move_selection(1),
            KeyCode::PageUp if list_visible => self.list.move_selection(-PAGE_STEP),
            KeyCode::PageDown if list_visible => self.list.move_selection(PAGE_STEP),
            KeyCode::Home if list_visible => self.list.select_first(),
            KeyCode::End if list_visible => self.list.select_last(),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_lyrics(-1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_lyrics(1),
            KeyCode::PageUp => self.scroll_lyrics(-(PAGE_STEP as i32)),
            KeyCode::PageDown => self.scroll_lyrics(PAGE_STEP as i32),
            KeyCode::Enter if list_visible => self.select_under_cursor(),
            KeyCode::Tab => {
                if self.controller.layout() == LayoutMode::Compact {
                    self.overlay_open = !self.overlay_open;
                }
            }
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.clear_status();
                let query = self.list.query().to_string();
                if self.controller.layout() == LayoutMode::Compact {
                    self.overlay_open = true;
                }
                return Ok(Mode::Searching(SearchState { query }));
            }
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Ok(Mode::AddingSong(SongForm::default()));
            }
            KeyCode::Char('u') => {
                self.clear_status();
                return Ok(Mode::Uploading(UploadForm::default()));
            }
            KeyCode::Char('e') => match self.controller.selected() {
                Some(song) => {
                    let mode = Mode::EditingSong {
                        id: song.id.clone(),
                        form: SongForm::from_song(song),
                    };
                    self.clear_status();
                    return Ok(mode);
                }
                None => self.set_status("Select a song to edit.", StatusKind::Error),
            },
            KeyCode::Char('-') | KeyCode::Char('d') => match self.controller.selected() {
                Some(song) => {
                    let confirm = ConfirmSongDelete::from(song);
                    return Ok(Mode::ConfirmSongDelete(confirm));
                }
                None => self.set_status("Select a song to delete.", StatusKind::Error),
            },
            KeyCode::Char('v') => self.open_viewer(),
            KeyCode::Char('o') => self.export_selected()?,
            KeyCode::Char('r') => self.refresh(),
            _ => {}
        }

        Ok(Mode::Normal)
    }

    fn handle_add_song(&mut self, code: KeyCode, mut form: SongForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Add cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Enter => form.newline(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::AddingSong(form))
    }

    fn handle_edit_song(&mut self, code: KeyCode, id: SongId, mut form: SongForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                return Ok(self.leave_form());
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Enter => form.newline(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::EditingSong { id, form })
    }

    fn handle_confirm_song_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmSongDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.controller.on_delete(&confirm.id) {
                    Ok(()) => self.set_status("Song deleted successfully.", StatusKind::Info),
                    Err(err) => self.set_status(
                        format!("Failed to delete song. {err}"),
                        StatusKind::Error,
                    ),
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmSongDelete(confirm)),
        }
    }

    fn handle_upload(&mut self, code: KeyCode, mut form: UploadForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Upload cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            KeyCode::Enter => {
                let paths = match form.paths() {
                    Ok(paths) => paths,
                    Err(message) => {
                        form.error = Some(message);
                        return Ok(Mode::Uploading(form));
                    }
                };
                match ingest_paths(&paths) {
                    Ok(mut ingested) => {
                        let batch = mem::take(&mut ingested.songs);
                        let reports = self.controller.upload(batch);
                        let (text, is_error) = upload_summary(&reports, &ingested);
                        let kind = if is_error {
                            StatusKind::Error
                        } else {
                            StatusKind::Info
                        };
                        self.set_status(text, kind);
                        return Ok(Mode::Normal);
                    }
                    Err(err) => {
                        let message = format!("{err:#}");
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                }
            }
            _ => {}
        }
        Ok(Mode::Uploading(form))
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.list.set_filter(None);
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => {
                self.select_under_cursor();
                return Ok(Mode::Normal);
            }
            KeyCode::Up => self.list.move_selection(-1),
            KeyCode::Down => self.list.move_selection(1),
            KeyCode::PageUp => self.list.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.list.move_selection(PAGE_STEP),
            KeyCode::Home => self.list.select_first(),
            KeyCode::End => self.list.select_last(),
            KeyCode::Backspace => {
                state.query.pop();
                self.apply_search(&state);
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    state.query.push(ch);
                    self.apply_search(&state);
                }
            }
            _ => {}
        }
        Ok(Mode::Searching(state))
    }

    fn apply_search(&mut self, state: &SearchState) {
        let filter = if state.query.trim().is_empty() {
            None
        } else {
            Some(state.query.clone())
        };
        self.list.set_filter(filter);
        self.sync_list();
        self.list.select_first();
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Library => self.draw_library(frame, content_area),
            Screen::Viewer(viewer) => self.draw_viewer(frame, content_area, viewer),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingSong(form) => self.draw_song_form(frame, area, "Add New Song", form),
            Mode::EditingSong { form, .. } => self.draw_song_form(frame, area, "Edit Song", form),
            Mode::ConfirmSongDelete(confirm) => self.draw_confirm_song_delete(frame, area, confirm),
            Mode::Uploading(form) => self.draw_upload_form(frame, area, form),
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::Normal => {}
        }
    }

    /// Ctrl+E from the search bar edits the song under the cursor and returns
    /// to the search afterwards.
    pub(crate) fn handle_ctrl_e(&mut self) -> Result<()> {
        if !matches!(self.mode, Mode::Searching(_)) {
            return Ok(());
        }

        let song = self
            .list
            .current()
            .and_then(|id| self.controller.find(id))
            .cloned();
        match song {
            Some(song) => {
                if let Mode::Searching(state) = mem::replace(
                    &mut self.mode,
                    Mode::EditingSong {
                        id: song.id.clone(),
                        form: SongForm::from_song(&song),
                    },
                ) {
                    self.saved_search = Some(state);
                }
            }
            None => self.set_status("No song selected to edit.", StatusKind::Error),
        }
        Ok(())
    }

    /// Ctrl+S saves the open song form.
    pub(crate) fn handle_ctrl_s(&mut self) -> Result<()> {
        let mode = mem::replace(&mut self.mode, Mode::Normal);
        self.mode = match mode {
            Mode::AddingSong(form) => self.save_new_song(form),
            Mode::EditingSong { id, form } => self.save_song_edit(id, form),
            other => other,
        };
        self.sync_view();
        Ok(())
    }

    fn save_new_song(&mut self, mut form: SongForm) -> Mode {
        let result = form
            .parse_inputs()
            .and_then(|(name, content)| self.controller.on_add(&name, &content));
        match result {
            Ok(song) => {
                self.set_status(format!("Song \"{}\" added.", song.name), StatusKind::Info);
                Mode::Normal
            }
            Err(err) => {
                let message = err.to_string();
                form.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
                Mode::AddingSong(form)
            }
        }
    }

    fn save_song_edit(&mut self, id: SongId, mut form: SongForm) -> Mode {
        let result = form.parse_inputs().and_then(|(name, content)| {
            self.controller.on_edit_save(&id, Some(&name), &content)
        });
        match result {
            Ok(()) => {
                if self.controller.find(&id).is_some() {
                    self.set_status("Song updated successfully.", StatusKind::Info);
                } else {
                    self.set_status(
                        "That song was already deleted elsewhere.",
                        StatusKind::Info,
                    );
                }
                self.refresh_viewer();
                self.leave_form()
            }
            Err(err) => {
                let message = err.to_string();
                form.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
                Mode::EditingSong { id, form }
            }
        }
    }

    /// Mode to return to after a song form closes.
    fn leave_form(&mut self) -> Mode {
        match self.saved_search.take() {
            Some(state) => Mode::Searching(state),
            None => Mode::Normal,
        }
    }

    fn select_under_cursor(&mut self) {
        let Some(id) = self.list.current().cloned() else {
            return;
        };
        if let Err(err) = self.controller.on_user_select(&id) {
            debug!(%err, "selection ignored");
        }
    }

    fn open_viewer(&mut self) {
        let Some(id) = self.controller.selected_id().cloned() else {
            self.set_status("Select a song to view.", StatusKind::Error);
            return;
        };
        match self.controller.store().get(&id) {
            Ok(song) => {
                self.clear_status();
                self.screen = Screen::Viewer(ViewerScreen::new(id, song));
            }
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    /// Keep an open viewer in step with the mirrored collection.
    fn refresh_viewer(&mut self) {
        if let Screen::Viewer(viewer) = &mut self.screen {
            viewer.song = self.controller.find(&viewer.requested).cloned();
        }
    }

    fn export_selected(&mut self) -> Result<()> {
        let Some(song) = self.controller.selected().cloned() else {
            self.set_status("Select a song to open.", StatusKind::Error);
            return Ok(());
        };

        let path = match self.write_export(&song) {
            Ok(path) => path,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "export failed");
                self.set_status(surface_error(&err), StatusKind::Error);
                return Ok(());
            }
        };
        match open_path(&path) {
            Ok(()) => self.set_status(format!("Opened {}.", path.display()), StatusKind::Info),
            Err(err) => self.set_status(
                format!("Saved {} but failed to open it: {err}", path.display()),
                StatusKind::Error,
            ),
        }
        Ok(())
    }

    fn write_export(&self, song: &Song) -> Result<PathBuf> {
        fs::create_dir_all(&self.export_dir)
            .with_context(|| format!("failed to create {}", self.export_dir.display()))?;
        let path = self.export_dir.join(export_file_name(&song.name));
        fs::write(&path, &song.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "exported lyrics");
        Ok(path)
    }

    fn refresh(&mut self) {
        match self.controller.refresh() {
            Ok(true) => self.set_status(
                format!("Reloaded {} songs.", self.controller.songs().len()),
                StatusKind::Info,
            ),
            Ok(false) => self.set_status("Kept a newer update.", StatusKind::Info),
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
        self.refresh_viewer();
    }

    fn scroll_lyrics(&mut self, delta: i32) {
        let max = self
            .controller
            .selected()
            .map(|song| song.line_count() + 1)
            .unwrap_or(0);
        let next = (i32::from(self.lyrics_scroll) + delta).clamp(0, max.min(u16::MAX as usize) as i32);
        self.lyrics_scroll = next as u16;
    }

    /// Whether the song list is on screen and owns the arrow keys.
    fn list_visible(&self) -> bool {
        self.controller.layout() == LayoutMode::Wide || self.overlay_open
    }

    fn sync_list(&mut self) {
        let visible = self.controller.filtered(self.list.query());
        self.list.sync(&visible);
    }

    /// Re-derive the list rows and react to selection changes queued by the
    /// controller since the last call.
    fn sync_view(&mut self) {
        self.sync_list();
        while let Ok(change) = self.changes.try_recv() {
            debug!(selected = ?change.selected, cause = ?change.cause, "selection changed");
            self.lyrics_scroll = 0;
            if change.collapse_overlay {
                self.overlay_open = false;
            }
            match &change.selected {
                Some(id) => {
                    self.list.focus(id);
                }
                None => {
                    if self.controller.layout() == LayoutMode::Compact {
                        self.overlay_open = true;
                    }
                }
            }
        }
    }

    fn draw_library(&self, frame: &mut Frame, area: Rect) {
        match self.controller.layout() {
            LayoutMode::Wide => {
                let chunks = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Percentage(LIST_WIDTH_PERCENT),
                        Constraint::Min(0),
                    ])
                    .split(area);
                self.draw_song_list(frame, chunks[0]);
                self.draw_lyrics(frame, chunks[1]);
            }
            LayoutMode::Compact => {
                if self.overlay_open {
                    self.draw_song_list(frame, area);
                } else {
                    self.draw_lyrics(frame, area);
                }
            }
        }
    }

    fn draw_song_list(&self, frame: &mut Frame, area: Rect) {
        let title = match &self.list.filter {
            Some(query) => format!("Songs • \"{query}\""),
            None => format!("Songs ({})", self.controller.songs().len()),
        };
        let block = Block::default().title(title).borders(Borders::ALL);

        if self.controller.songs().is_empty() || self.list.visible.is_empty() {
            let message = if self.controller.songs().is_empty() {
                "No songs yet. Press '+' to add one or 'u' to upload."
            } else {
                "No songs found."
            };
            let paragraph = Paragraph::new(message)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let selected = self.controller.selected_id();
        let items: Vec<ListItem> = self
            .list
            .visible
            .iter()
            .filter_map(|id| self.controller.find(id))
            .map(|song| {
                let style = if Some(&song.id) == selected {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(song.name.clone(), style)))
            })
            .collect();

        let mut state = ListState::default();
        state.select(Some(self.list.cursor));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_lyrics(&self, frame: &mut Frame, area: Rect) {
        let Some(song) = self.controller.selected() else {
            let (heading, hint, style) = if let Some(error) = self.controller.last_error() {
                (
                    "Could not load songs",
                    error.to_string(),
                    Style::default().fg(Color::Red),
                )
            } else if self.controller.songs().is_empty() {
                (
                    "No songs found",
                    "Add a new song to get started.".to_string(),
                    Style::default().fg(Color::Gray),
                )
            } else {
                (
                    "Select a song",
                    "Choose a song from the list to see its lyrics.".to_string(),
                    Style::default().fg(Color::Gray),
                )
            };
            let lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    heading,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(hint, style)),
            ];
            let paragraph = Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("Lyrics"));
            frame.render_widget(paragraph, area);
            return;
        };

        let mut lines = vec![
            Line::from(Span::styled(
                format!("{} lines", song.line_count()),
                Style::default().fg(Color::Gray),
            )),
            Line::from(""),
        ];
        lines.extend(lyrics_lines(&song.content));

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(song.name.clone()),
            )
            .wrap(Wrap { trim: false })
            .scroll((self.lyrics_scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn draw_viewer(&self, frame: &mut Frame, area: Rect, viewer: &ViewerScreen) {
        let Some(song) = &viewer.song else {
            let paragraph = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "Could not find the requested lyrics.",
                    Style::default().fg(Color::Red),
                )),
            ])
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Lyrics"));
            frame.render_widget(paragraph, area);
            return;
        };

        let paragraph = Paragraph::new(lyrics_lines(&song.content))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(song.name.clone()),
            )
            .wrap(Wrap { trim: false })
            .scroll((viewer.scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let column = "Search: ".len() + state.query.chars().count();
        frame.set_cursor_position(cursor_in(inner, column, 0));
    }

    fn footer_instructions(&self) -> Line<'static> {
        let hints: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (Screen::Viewer(_), _) => &[("↑↓", "Scroll"), ("Esc", "Back"), ("q", "Quit")],
            (_, Mode::Searching(_)) => &[
                ("↑↓", "Navigate"),
                ("Enter", "Select"),
                ("Ctrl+E", "Edit"),
                ("Esc", "Clear"),
            ],
            (_, Mode::AddingSong(_)) | (_, Mode::EditingSong { .. }) => &[
                ("Tab", "Switch field"),
                ("Enter", "Next line"),
                ("Ctrl+S", "Save"),
                ("Esc", "Cancel"),
            ],
            (_, Mode::Uploading(_)) => &[("Enter", "Upload"), ("Esc", "Cancel")],
            (_, Mode::ConfirmSongDelete(_)) => &[("Y", "Confirm"), ("N/Esc", "Cancel")],
            (_, Mode::Normal) => {
                if self.controller.layout() == LayoutMode::Compact && !self.overlay_open {
                    &[
                        ("Tab", "Songs"),
                        ("↑↓", "Scroll"),
                        ("e", "Edit"),
                        ("-", "Delete"),
                        ("v", "View"),
                        ("o", "Open"),
                        ("q", "Quit"),
                    ]
                } else {
                    &[
                        ("↑↓", "Navigate"),
                        ("Enter", "Select"),
                        ("f", "Search"),
                        ("+", "Add"),
                        ("u", "Upload"),
                        ("e", "Edit"),
                        ("-", "Delete"),
                        ("v", "View"),
                        ("o", "Open"),
                        ("r", "Reload"),
                        ("q", "Quit"),
                    ]
                }
            }
        };

        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let mut spans = Vec::with_capacity(hints.len() * 2);
        for (key, action) in hints {
            spans.push(Span::styled(format!("[{key}]"), key_style));
            spans.push(Span::raw(format!(" {action}   ")));
        }
        Line::from(spans)
    }

    fn draw_song_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &SongForm) {
        let popup_area = centered_rect(80, 80, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        // Name, blank, label and the hint line around the lyrics box.
        let content_height = inner.height.saturating_sub(4) as usize;

        let mut lines = vec![
            form.name_line(),
            Line::from(""),
            Line::from("Lyrics:"),
        ];
        let mut content = form.content_lines(content_height);
        content.resize(content_height.max(1), Line::from(""));
        lines.extend(content);

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Ctrl+S to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        let cursor = match form.active {
            SongField::Name => cursor_in(inner, "Name: ".len() + form.name_len(), 0),
            SongField::Content => {
                let (column, row) = form.content_cursor(content_height);
                // Lyrics start below the name line, a blank line and the label.
                cursor_in(inner, column, row.saturating_add(3))
            }
        };
        frame.set_cursor_position(cursor);
    }

    fn draw_upload_form(&self, frame: &mut Frame, area: Rect, form: &UploadForm) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Upload Lyrics").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from(vec![
                Span::raw("Path: "),
                Span::styled(form.input.clone(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "A .txt file or a folder of them. Separate several paths with ';'.",
                Style::default().fg(Color::Gray),
            )),
        ];
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let column = "Path: ".len() + form.input.chars().count();
        frame.set_cursor_position(cursor_in(inner, column, 0));
    }

    fn draw_confirm_song_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmSongDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Song").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete '{}' permanently?", confirm.name)),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}
