//! Events flowing from a speech capability back to the coordinator
//!
//! Backends run their engines on other threads. Everything they observe
//! is funnelled through an [`EventSink`] into a single channel that the
//! main loop drains, so the coordinator only ever sees events on its own
//! thread.

use log::trace;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

/// Handle identifying one submitted utterance
///
/// Handles increase monotonically per capability, so a stale handle can
/// never collide with the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(pub u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a single utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// The engine started speaking
    Start,
    /// A word starts at `offset` (bytes into the utterance text)
    WordBoundary { offset: usize, length: usize },
    /// Finished normally
    End,
    /// Failed, was cancelled, or was superseded
    Error(String),
}

impl SpeechEvent {
    /// End and Error close an utterance; nothing follows them
    pub fn is_terminal(&self) -> bool {
        matches!(self, SpeechEvent::End | SpeechEvent::Error(_))
    }
}

/// Cause reported when an utterance is cancelled or replaced
pub const INTERRUPTED: &str = "interrupted";

/// Everything a capability can tell its subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityEvent {
    /// The set of available voices may have changed; re-query it
    VoicesChanged,
    /// Progress of one utterance
    Utterance { id: UtteranceId, event: SpeechEvent },
}

/// Sending half of the capability event channel
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<CapabilityEvent>,
}

impl EventSink {
    /// Deliver an event; silently dropped once the receiver is gone
    pub fn emit(&self, event: CapabilityEvent) {
        trace!("Capability event: {:?}", event);
        let _ = self.tx.send(event);
    }

    /// Shorthand for an utterance event
    pub fn utterance(&self, id: UtteranceId, event: SpeechEvent) {
        self.emit(CapabilityEvent::Utterance { id, event });
    }
}

/// Create the channel a coordinator listens on
pub fn event_channel() -> (EventSink, Receiver<CapabilityEvent>) {
    let (tx, rx) = mpsc::channel();
    (EventSink { tx }, rx)
}
