//! Terminal rendering of the session state.
//!
//! Each frame is built into one buffer (screen clear, cursor home, then the
//! story and comment tables) and written with a single `write_all`, so a
//! frame never appears half drawn.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::session::SessionState;

/// Sink for rendered session snapshots.
pub trait Renderer {
    fn render(&mut self, state: &SessionState) -> io::Result<()>;
}

/// Cells wider than this are cut and end with an ellipsis.
pub const MAX_CELL_WIDTH: usize = 60;

/// Renders the state as two tables on a terminal-like writer.
pub struct TerminalRenderer<W: Write> {
    out: W,
    frame: Vec<u8>,
    clear_screen: bool,
    max_cell_width: usize,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            frame: Vec::with_capacity(4096),
            clear_screen: true,
            max_cell_width: MAX_CELL_WIDTH,
        }
    }

    /// Disable clearing between frames (for output that is not a terminal).
    pub fn with_clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    pub fn with_max_cell_width(mut self, width: usize) -> Self {
        self.max_cell_width = width.max(1);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, state: &SessionState) -> io::Result<()> {
        self.frame.clear();
        if self.clear_screen {
            queue!(self.frame, MoveTo(0, 0), Clear(ClearType::All))?;
        }
        self.frame
            .extend_from_slice(render_frame(state, self.max_cell_width).as_bytes());
        self.out.write_all(&self.frame)?;
        self.out.flush()
    }
}

/// The stories table followed by the comments table.
pub fn render_frame(state: &SessionState, max_cell_width: usize) -> String {
    let mut stories = Table::new(&["id", "title", "username", "domain", "type", "points"]);
    for story in &state.stories {
        stories.push_row(vec![
            story.id.clone(),
            cell(&story.title),
            cell(&story.username),
            cell(&story.domain),
            story.kind.map(|k| k.to_string()).unwrap_or_default(),
            story.points.map(|p| p.to_string()).unwrap_or_default(),
        ]);
    }

    let mut comments = Table::new(&["story", "id", "reply_to_id", "username", "comment"]);
    for (story, tree) in &state.comments {
        for comment in tree {
            comments.push_row(vec![
                story.to_string(),
                cell(&comment.id),
                cell(&comment.reply_to_id),
                cell(&comment.username),
                cell(&comment.comment),
            ]);
        }
    }

    let mut out = String::new();
    out.push_str(&stories.render(max_cell_width));
    out.push('\n');
    out.push_str(&comments.render(max_cell_width));
    out
}

fn cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// A bordered text table.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Missing cells render blank; extra cells are ignored.
    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn render(&self, max_cell_width: usize) -> String {
        let columns = self.headers.len();
        let fit = |text: &str| truncate(&sanitize(text), max_cell_width);

        let header: Vec<String> = self.headers.iter().map(|h| fit(h)).collect();
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                (0..columns)
                    .map(|i| row.get(i).map(|c| fit(c)).unwrap_or_default())
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = (0..columns)
            .map(|i| {
                body.iter()
                    .map(|row| row[i].width())
                    .chain(std::iter::once(header[i].width()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        out.push_str(&rule(&widths, '┌', '┬', '┐'));
        out.push_str(&line(&header, &widths));
        out.push_str(&rule(&widths, '├', '┼', '┤'));
        for row in &body {
            out.push_str(&line(row, &widths));
        }
        out.push_str(&rule(&widths, '└', '┴', '┘'));
        out
    }
}

fn rule(widths: &[usize], left: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{left}{}{right}\n", segments.join(&mid.to_string()))
}

fn line(cells: &[String], widths: &[usize]) -> String {
    let mut out = String::from("│");
    for (text, width) in cells.iter().zip(widths) {
        let pad = width.saturating_sub(text.width());
        out.push(' ');
        out.push_str(text);
        out.push_str(&" ".repeat(pad + 1));
        out.push('│');
    }
    out.push('\n');
    out
}

/// Control characters (newlines, tabs, escapes) would break the grid.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Cut `text` to at most `max` display columns, marking the cut with `…`.
fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max.saturating_sub(1) {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hn::{Comment, Story, StoryType};
    use crate::session::SlotUpdate;

    fn sample_state() -> SessionState {
        let mut state = SessionState::new();
        state.apply(SlotUpdate::Stories(vec![
            Story {
                title: Some("Show HN: A tiny VM".into()),
                username: Some("pg".into()),
                kind: Some(StoryType::Show),
                points: Some(120),
                ..Default::default()
            },
            Story {
                title: Some("Partial".into()),
                ..Default::default()
            },
        ]));
        state.apply(SlotUpdate::Comments {
            story: 1,
            comments: vec![Comment {
                id: Some("7".into()),
                username: Some("dang".into()),
                comment: Some("line one\nline two".into()),
                ..Default::default()
            }],
        });
        state
    }

    #[test]
    fn frame_lists_stories_and_comments() {
        let frame = render_frame(&sample_state(), MAX_CELL_WIDTH);
        assert!(frame.contains("│ 0  │ Show HN: A tiny VM │ pg       │"), "{frame}");
        assert!(frame.contains("│ show │ 120    │"), "{frame}");
        assert!(frame.contains("line one line two"));
        assert!(frame.contains("│ 1     │ 7  │"), "{frame}");
    }

    #[test]
    fn rows_have_equal_display_width() {
        let mut table = Table::new(&["name", "note"]);
        table.push_row(vec!["日本語".into(), "wide".into()]);
        table.push_row(vec!["a".into()]);
        let rendered = table.render(MAX_CELL_WIDTH);
        let widths: Vec<usize> = rendered.lines().map(UnicodeWidthStr::width).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{rendered}");
    }

    #[test]
    fn long_cells_are_truncated() {
        assert_eq!(truncate("abcdefgh", 5), "abcd…");
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("日本語です", 5), "日本…");
    }

    #[test]
    fn terminal_renderer_clears_then_writes_one_frame() {
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.render(&sample_state()).unwrap();
        let written = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(written.starts_with("\u{1b}["), "{written:?}");
        assert!(written.contains("\u{1b}[2J"));
        assert!(written.contains("Show HN: A tiny VM"));
    }

    #[test]
    fn clearing_can_be_disabled() {
        let mut renderer = TerminalRenderer::new(Vec::new()).with_clear_screen(false);
        renderer.render(&SessionState::new()).unwrap();
        let written = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(written.starts_with('┌'));
    }
}
