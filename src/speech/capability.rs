//! Speech capability abstraction
//!
//! The narrator never synthesizes audio itself. Everything audible goes
//! through a [`SpeechCapability`]: list voices, submit an utterance, and
//! pause, resume, or cancel it. Progress comes back asynchronously as
//! [`CapabilityEvent`](super::CapabilityEvent)s on the subscribed sink.

use super::events::{EventSink, UtteranceId};
use super::voice::VoiceDescriptor;
use crate::platform::Host;
use crate::{ReadAloudError, Result};
use log::info;
use std::fmt;
use std::str::FromStr;

/// One text-to-speech request
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: VoiceDescriptor,
    /// Speed multiplier, 1.0 is the engine's normal rate
    pub rate: f32,
    /// Pitch, 1.0 is the engine's normal pitch
    pub pitch: f32,
}

/// Speech capability trait
///
/// Commands return as soon as they are queued; their effects are only
/// observable through the events delivered to the subscribed sink. A
/// handle that is no longer current is ignored by every command.
pub trait SpeechCapability: Send {
    /// Voices currently available (may be empty while the engine starts)
    fn list_voices(&mut self) -> Result<Vec<VoiceDescriptor>>;

    /// Start delivering events to `sink`, replacing any previous sink
    fn subscribe(&mut self, sink: EventSink) -> Result<()>;

    /// Stop delivering events
    fn unsubscribe(&mut self);

    /// Submit an utterance, superseding whatever was playing
    fn speak(&mut self, utterance: Utterance) -> Result<UtteranceId>;

    /// Pause the given utterance
    fn pause(&mut self, id: UtteranceId) -> Result<()>;

    /// Resume the given utterance where it was paused
    fn resume(&mut self, id: UtteranceId) -> Result<()>;

    /// Cancel the given utterance
    fn cancel(&mut self, id: UtteranceId) -> Result<()>;

    /// Cancel whatever is playing, whoever submitted it
    fn cancel_all(&mut self) -> Result<()>;
}

/// Which backend to create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Pick the best backend for the host
    Auto,
    /// Platform TTS through the tts crate
    Native,
    /// espeak-ng processes
    Espeak,
}

impl FromStr for BackendKind {
    type Err = ReadAloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(BackendKind::Auto),
            "native" | "tts" => Ok(BackendKind::Native),
            "espeak" | "espeak-ng" => Ok(BackendKind::Espeak),
            other => Err(ReadAloudError::Config(format!(
                "Unknown speech backend '{}' (expected auto, native or espeak)",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Auto => "auto",
            BackendKind::Native => "native",
            BackendKind::Espeak => "espeak",
        };
        f.write_str(name)
    }
}

/// Backends to try, in order, for a host
pub fn backend_order(kind: BackendKind, host: Host) -> Vec<BackendKind> {
    match kind {
        BackendKind::Native | BackendKind::Espeak => vec![kind],
        BackendKind::Auto => match host {
            // WSLg has PulseAudio but rarely a configured speech-dispatcher
            Host::Wsl => vec![BackendKind::Espeak, BackendKind::Native],
            Host::Linux => vec![BackendKind::Native, BackendKind::Espeak],
            Host::Other => vec![BackendKind::Native],
        },
    }
}

fn create_backend(kind: BackendKind) -> Result<Box<dyn SpeechCapability>> {
    use super::backends::espeak::EspeakCapability;
    use super::backends::native::NativeCapability;

    match kind {
        BackendKind::Espeak => Ok(Box::new(EspeakCapability::new()?)),
        BackendKind::Native | BackendKind::Auto => Ok(Box::new(NativeCapability::new()?)),
    }
}

/// Create a speech capability
///
/// Tries each backend in [`backend_order`] and returns the first that
/// initializes. The error lists every backend that was tried.
pub fn create_capability(kind: BackendKind) -> Result<Box<dyn SpeechCapability>> {
    let host = Host::detect();
    info!("Creating speech capability ({}) on {:?}", kind, host);

    let mut failures = Vec::new();
    for candidate in backend_order(kind, host) {
        info!("Trying {} backend...", candidate);
        match create_backend(candidate) {
            Ok(capability) => {
                info!("✓ Initialized {} backend", candidate);
                return Ok(capability);
            }
            Err(e) => {
                info!("✗ {} backend unavailable: {}", candidate, e);
                failures.push(format!("{}: {}", candidate, e));
            }
        }
    }

    Err(ReadAloudError::Speech(format!(
        "No speech backend available. Tried:\n  {}\n\
         Install speech-dispatcher or espeak-ng (e.g. sudo apt install espeak-ng)",
        failures.join("\n  ")
    )))
}
