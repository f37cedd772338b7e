use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::controller::UploadReport;
use crate::error::LyricsError;
use crate::ingest::Ingested;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Terminal cell for a cursor `column` cells right and `row` cells down from
/// the top-left of `inner`, kept inside `inner`.
pub(crate) fn cursor_in(inner: Rect, column: usize, row: usize) -> (u16, u16) {
    (
        clamp_offset(inner.x, inner.width, column),
        clamp_offset(inner.y, inner.height, row),
    )
}

fn clamp_offset(start: u16, span: u16, offset: usize) -> u16 {
    let offset = u16::try_from(offset)
        .unwrap_or(u16::MAX)
        .min(span.saturating_sub(1));
    start.saturating_add(offset)
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Lyrics as display lines. Blank lines are kept so verses stay apart.
pub(crate) fn lyrics_lines(content: &str) -> Vec<Line<'static>> {
    if content.trim().is_empty() {
        return vec![Line::from(Span::styled(
            "(no lyrics)",
            Style::default().fg(Color::DarkGray),
        ))];
    }
    content
        .lines()
        .map(|line| Line::from(line.to_string()))
        .collect()
}

/// Footer text for a finished upload plus whether anything went wrong.
pub(crate) fn upload_summary(reports: &[UploadReport], ingested: &Ingested) -> (String, bool) {
    let added: Vec<&str> = reports
        .iter()
        .filter(|report| report.result.is_ok())
        .map(|report| report.name.as_str())
        .collect();
    let failures: Vec<String> = reports
        .iter()
        .filter_map(|report| match &report.result {
            Err(LyricsError::DuplicateName(name)) => Some(format!("\"{name}\" already exists")),
            Err(err) => Some(format!("{}: {err}", report.name)),
            Ok(_) => None,
        })
        .chain(
            ingested
                .unreadable
                .iter()
                .map(|(path, err)| format!("{}: {err}", path.display())),
        )
        .collect();

    let mut parts = Vec::new();
    match added.len() {
        0 => {}
        1 => parts.push(format!("Song \"{}\" added.", added[0])),
        n => parts.push(format!("{n} songs added.")),
    }
    if !failures.is_empty() {
        parts.push(format!("Failed: {}.", failures.join("; ")));
    }
    if !ingested.skipped.is_empty() {
        let plural = if ingested.skipped.len() == 1 { "" } else { "s" };
        parts.push(format!(
            "Skipped {} non-text file{plural}.",
            ingested.skipped.len()
        ));
    }
    if parts.is_empty() {
        parts.push("No text files found.".to_string());
    }

    (parts.join(" "), !failures.is_empty() || added.is_empty())
}

/// File name used when exporting lyrics. Characters that are awkward in file
/// names on any platform become underscores.
pub(crate) fn export_file_name(song_name: &str) -> String {
    let cleaned: String = song_name
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, ' ' | '-' | '_' | '.' | '\'') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').trim();
    if cleaned.is_empty() {
        "lyrics.txt".to_string()
    } else {
        format!("{cleaned}.txt")
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::models::SongId;

    fn report(name: &str, result: Result<SongId, LyricsError>) -> UploadReport {
        UploadReport {
            name: name.to_string(),
            result,
        }
    }

    #[test]
    fn summary_lists_each_failure() {
        let reports = vec![
            report("X", Ok(SongId::new("1"))),
            report("X", Err(LyricsError::DuplicateName("X".into()))),
        ];
        let ingested = Ingested {
            skipped: vec![PathBuf::from("cover.png")],
            ..Ingested::default()
        };
        let (text, is_error) = upload_summary(&reports, &ingested);
        assert_eq!(
            text,
            "Song \"X\" added. Failed: \"X\" already exists. Skipped 1 non-text file."
        );
        assert!(is_error);
    }

    #[test]
    fn summary_for_clean_batch() {
        let reports = vec![
            report("A", Ok(SongId::new("1"))),
            report("B", Ok(SongId::new("2"))),
        ];
        let (text, is_error) = upload_summary(&reports, &Ingested::default());
        assert_eq!(text, "2 songs added.");
        assert!(!is_error);

        let (text, is_error) = upload_summary(&[], &Ingested::default());
        assert_eq!(text, "No text files found.");
        assert!(is_error);
    }

    #[test]
    fn export_names_are_filesystem_safe() {
        assert_eq!(export_file_name("AC/DC: Thunder?"), "AC_DC_ Thunder_.txt");
        assert_eq!(export_file_name("Don't Stop"), "Don't Stop.txt");
        assert_eq!(export_file_name(" .. "), "lyrics.txt");
    }

    #[test]
    fn cursor_stays_inside_its_box() {
        let inner = Rect::new(10, 5, 20, 4);
        assert_eq!(cursor_in(inner, 6, 0), (16, 5));
        assert_eq!(cursor_in(inner, 100_000, 2), (29, 7));
        assert_eq!(cursor_in(inner, 0, usize::MAX), (10, 8));

        let edge = Rect::new(u16::MAX - 2, 0, 2, 1);
        assert_eq!(cursor_in(edge, 70_000, 0), (u16::MAX - 1, 0));
        assert_eq!(cursor_in(Rect::new(3, 4, 0, 0), 9, 9), (3, 4));
    }
}
