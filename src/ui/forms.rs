use std::path::PathBuf;

use directories::BaseDirs;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::error::LyricsError;
use crate::models::{validate_name, Song, SongId};

/// Form state for adding a song or editing an existing one.
#[derive(Default, Clone)]
pub(crate) struct SongForm {
    pub(crate) name: String,
    pub(crate) content: String,
    pub(crate) active: SongField,
    pub(crate) error: Option<String>,
}

/// Fields within the song form to drive focus management.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum SongField {
    #[default]
    Name,
    Content,
}

impl SongForm {
    /// Populate the form from an existing song when entering edit mode.
    pub(crate) fn from_song(song: &Song) -> Self {
        Self {
            name: song.name.clone(),
            content: song.content.clone(),
            active: SongField::Content,
            error: None,
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            SongField::Name => SongField::Content,
            SongField::Content => SongField::Name,
        };
    }

    /// Insert a character into the active field.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            SongField::Name => self.name.push(ch),
            SongField::Content => self.content.push(ch),
        }
        true
    }

    /// Enter moves from the name to the lyrics, and starts a new line there.
    pub(crate) fn newline(&mut self) {
        match self.active {
            SongField::Name => self.active = SongField::Content,
            SongField::Content => self.content.push('\n'),
        }
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            SongField::Name => {
                self.name.pop();
            }
            SongField::Content => {
                self.content.pop();
            }
        }
    }

    /// Validate the inputs and return the trimmed name plus the lyrics.
    pub(crate) fn parse_inputs(&self) -> Result<(String, String), LyricsError> {
        let name = validate_name(&self.name)?;
        if self.content.trim().is_empty() {
            return Err(LyricsError::InvalidSong("Lyrics are required.".to_string()));
        }
        Ok((name, self.content.clone()))
    }

    /// Render the name line for the modal form.
    pub(crate) fn name_line(&self) -> Line<'static> {
        let is_active = self.active == SongField::Name;
        let display = if self.name.is_empty() {
            "<required>".to_string()
        } else {
            self.name.clone()
        };
        Line::from(vec![
            Span::raw("Name: "),
            Span::styled(display, field_style(is_active, self.name.is_empty())),
        ])
    }

    /// Lyrics lines, keeping only the last `height` so the end being typed
    /// stays visible.
    pub(crate) fn content_lines(&self, height: usize) -> Vec<Line<'static>> {
        let is_active = self.active == SongField::Content;
        if self.content.is_empty() {
            return vec![Line::from(Span::styled(
                "<required>",
                field_style(is_active, true),
            ))];
        }
        let style = field_style(is_active, false);
        let lines = self.content_rows();
        let skip = lines.len().saturating_sub(height.max(1));
        lines
            .into_iter()
            .skip(skip)
            .map(|line| Line::from(Span::styled(line.to_string(), style)))
            .collect()
    }

    /// Cursor offset within the lyrics box: (column, row) of the end of the
    /// text, relative to the visible window of `height` rows.
    pub(crate) fn content_cursor(&self, height: usize) -> (usize, usize) {
        let lines = self.content_rows();
        let last = lines.last().map(|line| line.chars().count()).unwrap_or(0);
        let visible = lines.len().min(height.max(1));
        (last, visible.saturating_sub(1))
    }

    pub(crate) fn name_len(&self) -> usize {
        self.name.chars().count()
    }

    // `str::lines` drops a trailing empty line, which is where the cursor sits
    // right after Enter.
    fn content_rows(&self) -> Vec<&str> {
        self.content.split('\n').collect()
    }
}

fn field_style(is_active: bool, is_empty: bool) -> Style {
    if is_active {
        Style::default().fg(Color::Yellow)
    } else if is_empty {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    }
}

/// Path input for uploading lyrics files. Several paths are separated by `;`.
#[derive(Default, Clone)]
pub(crate) struct UploadForm {
    pub(crate) input: String,
    pub(crate) error: Option<String>,
}

impl UploadForm {
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.input.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.input.pop();
    }

    /// Split the input into paths, expanding a leading `~`.
    pub(crate) fn paths(&self) -> Result<Vec<PathBuf>, String> {
        let paths: Vec<PathBuf> = self
            .input
            .split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(expand_home)
            .collect();
        if paths.is_empty() {
            return Err("Enter at least one file or folder.".to_string());
        }
        Ok(paths)
    }
}

fn expand_home(raw: &str) -> PathBuf {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/")
    };
    match (rest, BaseDirs::new()) {
        (Some(rest), Some(base_dirs)) => base_dirs.home_dir().join(rest),
        _ => PathBuf::from(raw),
    }
}

/// State for confirming permanent song deletion.
pub(crate) struct ConfirmSongDelete {
    pub(crate) id: SongId,
    pub(crate) name: String,
}

impl ConfirmSongDelete {
    pub(crate) fn from(song: &Song) -> Self {
        Self {
            id: song.id.clone(),
            name: song.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_moves_to_lyrics_then_breaks_lines() {
        let mut form = SongForm::default();
        for ch in "Hymn".chars() {
            form.push_char(ch);
        }
        form.newline();
        assert!(form.active == SongField::Content);
        form.push_char('a');
        form.newline();
        form.push_char('b');
        assert_eq!(form.name, "Hymn");
        assert_eq!(form.content, "a\nb");
    }

    #[test]
    fn parse_requires_name_and_lyrics() {
        let mut form = SongForm::default();
        form.content = "la la".to_string();
        assert!(matches!(form.parse_inputs(), Err(LyricsError::InvalidSong(_))));

        form.name = "  Song  ".to_string();
        assert_eq!(
            form.parse_inputs().unwrap(),
            ("Song".to_string(), "la la".to_string())
        );

        form.content = " \n ".to_string();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn editing_starts_in_lyrics() {
        let song = Song {
            id: SongId::new("1"),
            name: "A".to_string(),
            content: "x".to_string(),
        };
        let form = SongForm::from_song(&song);
        assert!(form.active == SongField::Content);
        assert_eq!(form.name, "A");
    }

    #[test]
    fn content_window_follows_the_end() {
        let mut form = SongForm::default();
        form.content = "one\ntwo\nthree\n".to_string();
        assert_eq!(form.content_lines(2).len(), 2);
        assert_eq!(form.content_cursor(2), (0, 1));
        assert_eq!(form.content_cursor(10), (0, 3));
    }

    #[test]
    fn upload_paths_split_on_semicolons() {
        let form = UploadForm {
            input: "a.txt; /tmp/lyrics ;".to_string(),
            error: None,
        };
        assert_eq!(
            form.paths().unwrap(),
            vec![PathBuf::from("a.txt"), PathBuf::from("/tmp/lyrics")]
        );
        assert!(UploadForm::default().paths().is_err());
    }
}
