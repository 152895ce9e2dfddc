//! Prompt handler for collecting a line of input
//!
//! Used when the narrator needs a value from the user, such as the path
//! of a story file to open.

use super::{HandlerAction, KeyHandler};
use crate::state::State;
use crate::Result;
use log::debug;

/// Callback function type for when input is complete
type OnAcceptFn = Box<dyn FnMut(String, &mut State) -> Result<()>>;

/// Handler that collects text input until Enter is pressed
///
/// Enter invokes the callback with the collected text, Esc abandons it.
/// When the callback fails the prompt stays open with its text intact.
pub struct PromptHandler {
    /// Shown before the typed text
    prompt: String,

    /// Accumulated input buffer
    buffer: String,

    /// Callback to execute when Enter is pressed
    on_accept: OnAcceptFn,
}

impl PromptHandler {
    /// Create a new prompt handler
    pub fn new(prompt: &str, on_accept: OnAcceptFn) -> Self {
        Self {
            prompt: prompt.to_string(),
            buffer: String::new(),
            on_accept,
        }
    }
}

impl KeyHandler for PromptHandler {
    fn process(&mut self, key: &[u8], state: &mut State) -> Result<HandlerAction> {
        match key {
            // Enter - accept input and invoke callback
            b"\r" | b"\n" => {
                debug!("Prompt: accepting input '{}'", self.buffer);
                (self.on_accept)(self.buffer.clone(), state)?;
                Ok(HandlerAction::Remove)
            }

            // Escape - abandon input
            b"\x1b" | b"\x03" => {
                debug!("Prompt: cancelled");
                Ok(HandlerAction::Remove)
            }

            // Backspace - remove last character
            b"\x08" | b"\x7f" => {
                self.buffer.pop();
                Ok(HandlerAction::Handled)
            }

            // Regular characters - add to buffer
            _ => {
                if let Ok(s) = std::str::from_utf8(key) {
                    self.buffer.extend(s.chars().filter(|c| !c.is_control()));
                }
                Ok(HandlerAction::Handled)
            }
        }
    }

    fn label(&self) -> Option<String> {
        Some(format!("{}: {}", self.prompt, self.buffer))
    }
}
