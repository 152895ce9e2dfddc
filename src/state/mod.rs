//! Application state management
//!
//! The State struct ties the pieces together: configuration, the playback
//! coordinator, the modal key handler stack, and the status line. Key
//! handlers call the methods here; the view reads from it.

pub mod config;

use crate::coordinator::{Outcome, PlaybackCoordinator, PlaybackState};
use crate::input::HandlerStack;
use crate::speech::{CapabilityEvent, EventSink, SpeechCapability};
use crate::{ReadAloudError, Result};
use config::Config;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application state for the narrator
pub struct State {
    /// Configuration loaded from ~/.readaloud.cfg
    pub config: Config,

    /// Read-along state machine; owns the story text
    pub coordinator: PlaybackCoordinator,

    /// Key handler stack for modal input (edit mode, prompts)
    pub handlers: HandlerStack,

    /// File the story was last loaded from, for reloading
    pub story_path: Option<PathBuf>,

    /// Set when the user asked to quit
    pub quit: bool,

    /// One-line message for the status bar
    status: Option<String>,
}

impl State {
    /// Create the application state around a speech capability
    ///
    /// `sink` is the sending half of the channel the main loop drains.
    pub fn new(config: Config, capability: Box<dyn SpeechCapability>, sink: EventSink) -> Result<Self> {
        let prefs = config.locale_preference();
        let params = config.playback();
        info!(
            "Initializing state: locales {}/{}, rate {}, pitch {}",
            prefs.primary,
            prefs.secondary,
            params.rate(),
            params.pitch()
        );

        let coordinator = PlaybackCoordinator::new(capability, sink, prefs, params)?;

        Ok(Self {
            config,
            coordinator,
            handlers: HandlerStack::new(),
            story_path: None,
            quit: false,
            status: None,
        })
    }

    // ========== Status line ==========

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Show an error in the status line without ending the session
    pub fn report_error(&mut self, error: &ReadAloudError) {
        warn!("{}", error);
        self.set_status(format!("Error: {}", error));
    }

    // ========== Story text ==========

    /// Load the story from a file
    pub fn load_story(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)?;
        info!("Loaded story from {:?} ({} bytes)", path, text.len());
        self.coordinator.set_text(text);
        self.story_path = Some(path.to_path_buf());
        self.set_status(format!("Opened {}", path.display()));
        Ok(())
    }

    /// Load the story file again
    pub fn reload_story(&mut self) -> Result<()> {
        match self.story_path.clone() {
            Some(path) => self.load_story(&path),
            None => {
                self.set_status("No story file to reload");
                Ok(())
            }
        }
    }

    /// Replace the story with the clipboard contents
    pub fn paste_story(&mut self) -> Result<()> {
        let text = crate::clipboard::get_from_clipboard()?;
        self.set_story(text);
        self.set_status("Pasted story from clipboard");
        Ok(())
    }

    /// Replace the story with `text`
    pub fn set_story(&mut self, text: String) {
        debug!("Story replaced ({} bytes)", text.len());
        self.coordinator.set_text(text);
    }

    pub fn clear_story(&mut self) {
        self.coordinator.set_text(String::new());
        self.set_status("Story cleared");
    }

    // ========== Playback ==========

    fn report_outcome(&mut self, outcome: Outcome) {
        let message = match outcome {
            Outcome::Started(_) => "Speaking".to_string(),
            Outcome::Resumed => "Resumed".to_string(),
            Outcome::Paused => "Paused".to_string(),
            Outcome::Stopped => "Stopped".to_string(),
            Outcome::Rejected(reason) => format!("Cannot speak: {}", reason),
            Outcome::Ignored => return,
        };
        self.set_status(message);
    }

    /// Speak the story, or resume it when paused
    pub fn speak(&mut self) -> Result<()> {
        let outcome = self.coordinator.speak()?;
        self.report_outcome(outcome);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        let outcome = self.coordinator.pause()?;
        self.report_outcome(outcome);
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        let outcome = self.coordinator.stop()?;
        self.report_outcome(outcome);
        Ok(())
    }

    // ========== Voice and parameters ==========

    pub fn cycle_voice(&mut self, forward: bool) {
        let message = match self.coordinator.cycle_voice(forward) {
            Some(voice) => format!("Voice: {}", voice),
            None => "Voices are still loading".to_string(),
        };
        self.set_status(message);
    }

    pub fn refresh_voices(&mut self) -> Result<()> {
        self.coordinator.refresh_voices()?;
        let count = self.coordinator.voices().len();
        self.set_status(format!("{} voices available", count));
        Ok(())
    }

    pub fn step_rate(&mut self, steps: i32) {
        self.coordinator.params_mut().step_rate(steps);
        let rate = self.coordinator.params().rate();
        self.set_status(format!("Speed {:.1}x, applies on next Speak", rate));
    }

    pub fn step_pitch(&mut self, steps: i32) {
        self.coordinator.params_mut().step_pitch(steps);
        let pitch = self.coordinator.params().pitch();
        self.set_status(format!("Pitch {:.1}, applies on next Speak", pitch));
    }

    // ========== Capability events ==========

    /// Apply a capability event; returns whether the view needs a redraw
    pub fn handle_event(&mut self, event: CapabilityEvent) -> bool {
        let was_playing = self.coordinator.state() != PlaybackState::Idle;

        let changed = match self.coordinator.handle_event(event) {
            Ok(changed) => changed,
            Err(e) => {
                self.report_error(&e);
                return true;
            }
        };

        if was_playing && self.coordinator.state() == PlaybackState::Idle {
            let message = match self.coordinator.last_error() {
                Some(cause) => format!("Speech failed: {}", cause),
                None => "Finished".to_string(),
            };
            self.set_status(message);
        }
        changed
    }
}
