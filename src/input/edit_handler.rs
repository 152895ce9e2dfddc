//! Edit mode: type or paste story text straight into the story
//!
//! Edits apply to the story immediately but only reach the speech engine
//! on the next Speak.

use super::{HandlerAction, KeyHandler};
use crate::state::State;
use crate::Result;
use log::debug;

/// Handler that appends typed text to the story until Esc
#[derive(Default)]
pub struct EditHandler;

impl EditHandler {
    pub fn new() -> Self {
        Self
    }
}

/// Drop the last word and any whitespace after it
fn delete_word(text: &mut String) {
    let trimmed = text.trim_end().len();
    text.truncate(trimmed);
    let word_start = text
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    text.truncate(word_start);
}

/// Keep printable text, turning CR and CRLF line endings into LF
fn sanitize(input: &str) -> String {
    input
        .replace("\r\n", "\n")
        .chars()
        .map(|c| if c == '\r' { '\n' } else { c })
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect()
}

impl KeyHandler for EditHandler {
    fn process(&mut self, key: &[u8], state: &mut State) -> Result<HandlerAction> {
        match key {
            // Escape alone leaves edit mode
            b"\x1b" => {
                debug!("Leaving edit mode");
                state.set_status("Story updated; press Space to hear it");
                Ok(HandlerAction::Remove)
            }

            // ctrl+c still quits
            b"\x03" => Ok(HandlerAction::Passthrough),

            // Backspace - remove last character
            b"\x08" | b"\x7f" => {
                state.coordinator.edit_text(|text| {
                    text.pop();
                });
                Ok(HandlerAction::Handled)
            }

            // ctrl+w - remove last word
            b"\x17" => {
                state.coordinator.edit_text(delete_word);
                Ok(HandlerAction::Handled)
            }

            // Other escape sequences (arrows, function keys) are ignored
            _ if key.first() == Some(&0x1b) => Ok(HandlerAction::Handled),

            // Typed or pasted text
            _ => {
                let typed = sanitize(&String::from_utf8_lossy(key));
                if !typed.is_empty() {
                    state.coordinator.edit_text(|text| text.push_str(&typed));
                }
                Ok(HandlerAction::Handled)
            }
        }
    }

    fn label(&self) -> Option<String> {
        Some("EDIT  type or paste text, Backspace deletes, Ctrl-W deletes a word, Esc finishes".to_string())
    }
}
