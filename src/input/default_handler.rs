//! Default key handler
//!
//! Maps single keys to playback, voice, and story commands. Keys without
//! a binding are ignored.

use super::edit_handler::EditHandler;
use super::prompt_handler::PromptHandler;
use super::{HandlerAction, KeyAction, KeyHandler};
use crate::state::State;
use crate::Result;
use log::{debug, trace};
use std::collections::HashMap;
use std::path::PathBuf;

/// Default key handler for narrator commands
pub struct DefaultKeyHandler {
    /// Key bindings map
    keymap: HashMap<Vec<u8>, KeyAction>,
}

impl DefaultKeyHandler {
    /// Create a new default key handler
    pub fn new(keymap: HashMap<Vec<u8>, KeyAction>) -> Self {
        debug!("Creating default key handler with {} bindings", keymap.len());
        Self { keymap }
    }

    /// Execute a narrator action
    fn execute_action(&mut self, action: KeyAction, state: &mut State) -> Result<HandlerAction> {
        use KeyAction::*;

        match action {
            SpeakOrResume => state.speak()?,
            Pause => state.pause()?,
            Stop => state.stop()?,

            NextVoice => state.cycle_voice(true),
            PrevVoice => state.cycle_voice(false),
            RefreshVoices => state.refresh_voices()?,

            Faster => state.step_rate(1),
            Slower => state.step_rate(-1),
            HigherPitch => state.step_pitch(1),
            LowerPitch => state.step_pitch(-1),

            Edit => {
                debug!("Entering edit mode");
                state.handlers.push(Box::new(EditHandler::new()));
            }
            OpenFile => {
                debug!("Prompting for story file");
                state.handlers.push(Box::new(PromptHandler::new(
                    "Open story file",
                    Box::new(|input: String, state: &mut State| {
                        let path = PathBuf::from(input.trim());
                        state.load_story(&path)
                    }),
                )));
            }
            ReloadStory => state.reload_story()?,
            Paste => state.paste_story()?,
            ClearStory => state.clear_story(),

            Quit => {
                debug!("Quit requested");
                state.quit = true;
            }
        }

        Ok(HandlerAction::Handled)
    }
}

impl KeyHandler for DefaultKeyHandler {
    fn process(&mut self, key: &[u8], state: &mut State) -> Result<HandlerAction> {
        match self.keymap.get(key).copied() {
            Some(action) => {
                trace!("Key action: {:?}", action);
                self.execute_action(action, state)
            }
            None => {
                trace!("Unbound key: {:?}", key);
                Ok(HandlerAction::Passthrough)
            }
        }
    }
}
