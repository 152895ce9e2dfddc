//! Playback coordinator
//!
//! Owns the story text and playback parameters, turns user intent into
//! commands against a [`SpeechCapability`], and folds the capability's
//! asynchronous events back into playback state and the highlighted word.
//!
//! All methods run on the main loop thread. Events are matched against the
//! id of the active utterance, so callbacks from an utterance that was
//! stopped or replaced never touch the current state.

pub mod highlight;
pub mod params;
pub mod voice_policy;

pub use highlight::Highlight;
pub use params::{PlaybackParameters, PlaybackState, WordRange};
pub use voice_policy::LocalePreference;

use crate::speech::{
    CapabilityEvent, EventSink, SpeechCapability, SpeechEvent, Utterance, UtteranceId,
    VoiceDescriptor,
};
use crate::{ReadAloudError, Result};
use log::{debug, info, trace, warn};
use std::fmt;

/// Why a Speak request was not carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The capability has not listed any voice yet
    NoVoices,
    NoVoiceSelected,
    /// The story is empty or whitespace only
    EmptyText,
    AlreadySpeaking,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::NoVoices => "voices are still loading",
            Rejection::NoVoiceSelected => "no voice selected",
            Rejection::EmptyText => "the story is empty",
            Rejection::AlreadySpeaking => "already speaking",
        };
        f.write_str(reason)
    }
}

/// What a playback command did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A new utterance was submitted
    Started(UtteranceId),
    Paused,
    Resumed,
    Stopped,
    /// The command does not apply in the current state
    Ignored,
    Rejected(Rejection),
}

/// The read-along state machine
pub struct PlaybackCoordinator {
    capability: Box<dyn SpeechCapability>,
    prefs: LocalePreference,

    text: String,
    params: PlaybackParameters,

    voices: Vec<VoiceDescriptor>,
    /// Name of the selected voice; always present in `voices` when set
    selected: Option<String>,

    state: PlaybackState,
    word: WordRange,
    /// The only utterance whose events are honoured
    active: Option<UtteranceId>,
    last_error: Option<String>,
}

impl PlaybackCoordinator {
    /// Create a coordinator and subscribe `sink` to the capability
    ///
    /// The voice list is queried once here; it may well be empty until the
    /// capability reports `VoicesChanged`.
    pub fn new(
        mut capability: Box<dyn SpeechCapability>,
        sink: EventSink,
        prefs: LocalePreference,
        params: PlaybackParameters,
    ) -> Result<Self> {
        capability.subscribe(sink)?;

        let mut coordinator = Self {
            capability,
            prefs,
            text: String::new(),
            params,
            voices: Vec::new(),
            selected: None,
            state: PlaybackState::Idle,
            word: WordRange::default(),
            active: None,
            last_error: None,
        };

        if let Err(e) = coordinator.refresh_voices() {
            warn!("Initial voice query failed: {}", e);
        }

        Ok(coordinator)
    }

    // ========== Story text ==========

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the story; takes effect on the next Speak
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        trace!("Story text replaced ({} bytes)", self.text.len());
    }

    /// Edit the story in place; takes effect on the next Speak
    pub fn edit_text<F: FnOnce(&mut String)>(&mut self, edit: F) {
        edit(&mut self.text);
    }

    // ========== Parameters ==========

    pub fn params(&self) -> PlaybackParameters {
        self.params
    }

    pub fn params_mut(&mut self) -> &mut PlaybackParameters {
        &mut self.params
    }

    // ========== Voices ==========

    pub fn voices(&self) -> &[VoiceDescriptor] {
        &self.voices
    }

    pub fn selected_voice(&self) -> Option<&VoiceDescriptor> {
        let name = self.selected.as_deref()?;
        self.voices.iter().find(|v| v.name == name)
    }

    /// No voices have been listed yet
    pub fn is_initializing(&self) -> bool {
        self.voices.is_empty()
    }

    /// Query the capability again and reconcile the selection
    pub fn refresh_voices(&mut self) -> Result<()> {
        let voices = self.capability.list_voices()?;
        self.apply_voice_list(voices);
        Ok(())
    }

    /// Adopt a new voice list, keeping the user's choice when it survived
    pub fn apply_voice_list(&mut self, voices: Vec<VoiceDescriptor>) {
        debug!("Voice list updated: {} voices", voices.len());
        self.voices = voices;

        let previous = self.selected.take();
        self.selected = voice_policy::reconcile(previous.as_deref(), &self.voices, &self.prefs);

        if self.selected != previous {
            match self.selected_voice() {
                Some(voice) => info!("Selected voice {}", voice),
                None => info!("No voice available"),
            }
        }
    }

    /// Select a voice by name
    pub fn select_voice(&mut self, name: &str) -> Result<()> {
        if !self.voices.iter().any(|v| v.name == name) {
            return Err(ReadAloudError::VoiceNotFound(name.to_string()));
        }
        debug!("User selected voice {}", name);
        self.selected = Some(name.to_string());
        Ok(())
    }

    /// Move the selection forwards or backwards through the list, wrapping
    pub fn cycle_voice(&mut self, forward: bool) -> Option<&VoiceDescriptor> {
        if self.voices.is_empty() {
            return None;
        }

        let len = self.voices.len();
        let next = match self.selected.as_deref() {
            Some(name) => {
                let current = self.voices.iter().position(|v| v.name == name).unwrap_or(0);
                if forward {
                    (current + 1) % len
                } else {
                    (current + len - 1) % len
                }
            }
            None => 0,
        };

        self.selected = Some(self.voices[next].name.clone());
        self.selected_voice()
    }

    // ========== Playback ==========

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn word_range(&self) -> WordRange {
        self.word
    }

    pub fn active_utterance(&self) -> Option<UtteranceId> {
        self.active
    }

    /// Cause of the most recent synthesis error, if any
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Why Speak would be rejected right now, if it would be
    pub fn speak_blocker(&self) -> Option<Rejection> {
        match self.state {
            PlaybackState::Paused => None,
            PlaybackState::Speaking => Some(Rejection::AlreadySpeaking),
            PlaybackState::Idle => {
                if self.voices.is_empty() {
                    Some(Rejection::NoVoices)
                } else if self.selected_voice().is_none() {
                    Some(Rejection::NoVoiceSelected)
                } else if self.text.trim().is_empty() {
                    Some(Rejection::EmptyText)
                } else {
                    None
                }
            }
        }
    }

    /// Speak the story, or resume it when paused
    pub fn speak(&mut self) -> Result<Outcome> {
        if self.state == PlaybackState::Paused {
            return self.resume();
        }

        if let Some(rejection) = self.speak_blocker() {
            debug!("Speak rejected: {}", rejection);
            return Ok(Outcome::Rejected(rejection));
        }

        let voice = match self.selected_voice() {
            Some(voice) => voice.clone(),
            None => return Ok(Outcome::Rejected(Rejection::NoVoiceSelected)),
        };

        self.active = None;
        self.word = WordRange::default();
        self.last_error = None;

        let utterance = Utterance {
            text: self.text.clone(),
            voice,
            rate: self.params.rate(),
            pitch: self.params.pitch(),
        };

        self.capability.cancel_all()?;
        match self.capability.speak(utterance) {
            Ok(id) => {
                info!("Speaking utterance {}", id);
                self.active = Some(id);
                self.state = PlaybackState::Speaking;
                Ok(Outcome::Started(id))
            }
            Err(e) => {
                warn!("Failed to submit utterance: {}", e);
                self.last_error = Some(e.to_string());
                self.reset();
                Err(e)
            }
        }
    }

    /// Pause speech; only meaningful while speaking
    pub fn pause(&mut self) -> Result<Outcome> {
        let id = match (self.state, self.active) {
            (PlaybackState::Speaking, Some(id)) => id,
            _ => {
                trace!("Pause ignored in state {}", self.state);
                return Ok(Outcome::Ignored);
            }
        };

        self.capability.pause(id)?;
        self.state = PlaybackState::Paused;
        debug!("Paused utterance {}", id);
        Ok(Outcome::Paused)
    }

    /// Resume paused speech without resubmitting the text
    pub fn resume(&mut self) -> Result<Outcome> {
        let id = match (self.state, self.active) {
            (PlaybackState::Paused, Some(id)) => id,
            _ => {
                trace!("Resume ignored in state {}", self.state);
                return Ok(Outcome::Ignored);
            }
        };

        self.capability.resume(id)?;
        self.state = PlaybackState::Speaking;
        debug!("Resumed utterance {}", id);
        Ok(Outcome::Resumed)
    }

    /// Stop speech and clear the highlight
    ///
    /// Always ends `Idle` with an empty word range, even when the cancel
    /// command fails.
    pub fn stop(&mut self) -> Result<Outcome> {
        let live = match self.state {
            PlaybackState::Speaking | PlaybackState::Paused => self.active,
            PlaybackState::Idle => None,
        };
        self.reset();

        match live {
            Some(id) => {
                debug!("Stopping utterance {}", id);
                self.capability.cancel(id)?;
                Ok(Outcome::Stopped)
            }
            None => Ok(Outcome::Ignored),
        }
    }

    fn reset(&mut self) {
        self.state = PlaybackState::Idle;
        self.word = WordRange::default();
        self.active = None;
    }

    /// Fold one capability event into the state
    ///
    /// Returns whether anything visible changed.
    pub fn handle_event(&mut self, event: CapabilityEvent) -> Result<bool> {
        match event {
            CapabilityEvent::VoicesChanged => {
                self.refresh_voices()?;
                Ok(true)
            }
            CapabilityEvent::Utterance { id, event } => Ok(self.handle_utterance_event(id, event)),
        }
    }

    fn handle_utterance_event(&mut self, id: UtteranceId, event: SpeechEvent) -> bool {
        if self.active != Some(id) {
            trace!("Dropping {:?} from superseded utterance {}", event, id);
            return false;
        }

        match event {
            SpeechEvent::Start => {
                debug!("Utterance {} started", id);
                false
            }
            SpeechEvent::WordBoundary { offset, length } => {
                if self.state != PlaybackState::Speaking {
                    trace!("Dropping boundary at {} while {}", offset, self.state);
                    return false;
                }
                self.word = WordRange::new(offset, offset.saturating_add(length));
                true
            }
            SpeechEvent::End => {
                info!("Utterance {} finished", id);
                self.reset();
                true
            }
            SpeechEvent::Error(cause) => {
                warn!("Utterance {} failed: {}", id, cause);
                self.last_error = Some(cause);
                self.reset();
                true
            }
        }
    }

    /// The story split around the spoken word
    ///
    /// Nothing is highlighted unless speech is actually playing.
    pub fn highlight(&self) -> Highlight<'_> {
        if self.state != PlaybackState::Speaking {
            return Highlight::plain(&self.text);
        }
        highlight::split(&self.text, self.word)
    }
}

impl Drop for PlaybackCoordinator {
    fn drop(&mut self) {
        if let Some(id) = self.active.take() {
            let _ = self.capability.cancel(id);
        }
        self.capability.unsubscribe();
        debug!("Playback coordinator shut down");
    }
}
