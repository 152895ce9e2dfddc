//! Full-screen rendering of the narrator
//!
//! The whole screen is recomposed from [`State`] on every redraw:
//!
//! ```text
//! Story Text-to-Speech
//! Listen to your story, one word at a time
//! ────────────────────────────────────────
//! Voice: Lekha (hi-IN) | Speed: 1.0x | Pitch: 1.0 | Idle
//! ────────────────────────────────────────
//! story text, wrapped, with the spoken word highlighted
//! ────────────────────────────────────────
//! status or mode line
//! Space Speak  p Pause  x Stop  ...
//! ```

use crate::coordinator::PlaybackState;
use crate::state::State;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const TITLE: &str = "Story Text-to-Speech";
pub const TAGLINE: &str = "Listen to your story, one word at a time";
pub const PLACEHOLDER: &str = "Enter your story here... (press e to type, o to open a file, Ctrl-V to paste)";
pub const LOADING_VOICES: &str = "Loading voices...";

/// Rows used by everything except the story
const CHROME_ROWS: usize = 8;

const CLEAR: &str = "\x1b[H\x1b[2J";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// One run of text drawn with or without the highlight
pub type Run = (String, bool);

/// A display line made of runs
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Line {
    pub runs: Vec<Run>,
    pub width: usize,
}

impl Line {
    fn push(&mut self, c: char, highlighted: bool) {
        self.width += c.width().unwrap_or(0);
        match self.runs.last_mut() {
            Some((text, h)) if *h == highlighted => text.push(c),
            _ => self.runs.push((c.to_string(), highlighted)),
        }
    }

    /// Whether any part of the line is highlighted
    pub fn is_highlighted(&self) -> bool {
        self.runs.iter().any(|(_, h)| *h)
    }

    /// The line's text without styling
    pub fn text(&self) -> String {
        self.runs.iter().map(|(t, _)| t.as_str()).collect()
    }
}

/// Word-wrap highlighted segments to `width` columns
///
/// Breaks at whitespace where it can, inside a word only when the word is
/// wider than the line. Newlines always break; whitespace at the start of a
/// wrapped line is dropped.
pub fn wrap(segments: &[(&str, bool)], width: usize) -> Vec<Line> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = Line::default();

    // Tokens are runs of whitespace or non-whitespace, with per-char style
    let mut token: Vec<(char, bool)> = Vec::new();
    let chars = segments
        .iter()
        .flat_map(|(text, h)| text.chars().map(move |c| (c, *h)));

    let flush = |token: &mut Vec<(char, bool)>, line: &mut Line, lines: &mut Vec<Line>| {
        if token.is_empty() {
            return;
        }
        let is_space = token[0].0.is_whitespace();
        let token_width: usize = token.iter().map(|(c, _)| c.width().unwrap_or(0)).sum();

        if is_space {
            if line.width + token_width <= width {
                for &(c, h) in token.iter() {
                    line.push(c, h);
                }
            } else if line.width > 0 {
                lines.push(std::mem::take(line));
            }
        } else {
            if line.width > 0 && line.width + token_width > width {
                lines.push(std::mem::take(line));
            }
            for &(c, h) in token.iter() {
                let w = c.width().unwrap_or(0);
                if line.width > 0 && line.width + w > width {
                    lines.push(std::mem::take(line));
                }
                line.push(c, h);
            }
        }
        token.clear();
    };

    for (c, h) in chars {
        if c == '\n' {
            flush(&mut token, &mut line, &mut lines);
            lines.push(std::mem::take(&mut line));
            continue;
        }
        if c == '\r' || (c.is_control() && c != '\t') {
            continue;
        }
        // Tabs are drawn, and measured, as a single space
        let c = if c == '\t' { ' ' } else { c };
        if let Some(&(prev, _)) = token.last() {
            if prev.is_whitespace() != c.is_whitespace() {
                flush(&mut token, &mut line, &mut lines);
            }
        }
        token.push((c, h));
    }
    flush(&mut token, &mut line, &mut lines);
    if line.width > 0 || !line.runs.is_empty() {
        lines.push(line);
    }

    lines
}

/// Cut `text` to at most `width` columns
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

/// First line to show so the highlighted line stays in view
fn scroll_top(lines: &[Line], height: usize, follow_tail: bool) -> usize {
    if lines.len() <= height {
        return 0;
    }
    let last_top = lines.len() - height;
    match lines.iter().position(Line::is_highlighted) {
        Some(index) => index.saturating_sub(height / 3).min(last_top),
        None if follow_tail => last_top,
        None => 0,
    }
}

/// The voice, speed, pitch and state line
pub fn controls_line(state: &State) -> String {
    let coordinator = &state.coordinator;
    let voice = if coordinator.is_initializing() {
        LOADING_VOICES.to_string()
    } else {
        match coordinator.selected_voice() {
            Some(voice) => voice.to_string(),
            None => "none".to_string(),
        }
    };
    let params = coordinator.params();
    format!(
        "Voice: {} | Speed: {:.1}x | Pitch: {:.1} | {}",
        voice,
        params.rate(),
        params.pitch(),
        coordinator.state()
    )
}

/// Key help, which follows the playback state
pub fn help_line(state: &State) -> String {
    let speak = match state.coordinator.state() {
        PlaybackState::Paused => "Space Resume",
        _ => "Space Speak",
    };
    format!(
        "{}  p Pause  x Stop  v/V Voice  +/- Speed  [/] Pitch  e Edit  o Open  q Quit",
        speak
    )
}

/// What the status row shows: an active prompt or mode, else the last message
pub fn status_line(state: &State) -> String {
    if let Some(label) = state.handlers.top_label() {
        return label;
    }
    if let Some(status) = state.status() {
        return status.to_string();
    }
    match state.coordinator.last_error() {
        Some(cause) => format!("Error: {}", cause),
        None => String::new(),
    }
}

/// Compose the whole screen for a terminal of `cols` by `rows`
pub fn compose(state: &State, cols: u16, rows: u16) -> String {
    let cols = usize::from(cols).max(1);
    let rows = usize::from(rows);
    let body_height = rows.saturating_sub(CHROME_ROWS).max(1);
    let (hl_on, hl_off) = state.config.highlight_style().sgr();
    let separator = "─".repeat(cols);

    let mut out = String::from(CLEAR);
    let line = |out: &mut String, text: &str| {
        out.push_str(text);
        out.push_str("\r\n");
    };

    line(&mut out, &format!("{}{}{}", BOLD, truncate(TITLE, cols), RESET));
    line(&mut out, &format!("{}{}{}", DIM, truncate(TAGLINE, cols), RESET));
    line(&mut out, &separator);
    line(&mut out, &truncate(&controls_line(state), cols));
    line(&mut out, &separator);

    let text = state.coordinator.text();
    if text.trim().is_empty() && state.handlers.is_empty() {
        line(&mut out, &format!("{}{}{}", DIM, truncate(PLACEHOLDER, cols), RESET));
        for _ in 1..body_height {
            line(&mut out, "");
        }
    } else {
        let highlight = state.coordinator.highlight();
        let lines = wrap(&highlight.segments(), cols);
        let top = scroll_top(&lines, body_height, !state.handlers.is_empty());

        for index in top..top + body_height {
            let mut rendered = String::new();
            if let Some(body) = lines.get(index) {
                for (run, highlighted) in &body.runs {
                    if *highlighted {
                        rendered.push_str(hl_on);
                        rendered.push_str(run);
                        rendered.push_str(hl_off);
                    } else {
                        rendered.push_str(run);
                    }
                }
            }
            line(&mut out, &rendered);
        }
    }

    line(&mut out, &separator);
    line(&mut out, &truncate(&status_line(state), cols));
    out.push_str(DIM);
    out.push_str(&truncate(&help_line(state), cols));
    out.push_str(RESET);

    out
}
