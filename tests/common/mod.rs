//! Shared test support: a speech capability that records every command

#![allow(dead_code)]

use readaloud::coordinator::{LocalePreference, PlaybackCoordinator, PlaybackParameters};
use readaloud::speech::{
    event_channel, CapabilityEvent, EventSink, SpeechCapability, SpeechEvent, Utterance,
    UtteranceId, VoiceDescriptor,
};
use readaloud::{ReadAloudError, Result};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

/// A command the coordinator sent to the capability
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListVoices,
    Subscribe,
    Unsubscribe,
    Speak(Utterance),
    Pause(UtteranceId),
    Resume(UtteranceId),
    Cancel(UtteranceId),
    CancelAll,
}

#[derive(Default)]
struct Shared {
    calls: Vec<Call>,
    voices: Vec<VoiceDescriptor>,
    sink: Option<EventSink>,
    next_id: u64,
    fail_speak: bool,
}

/// Fake capability; clones share the same log and voice list
#[derive(Clone, Default)]
pub struct RecordingCapability {
    shared: Arc<Mutex<Shared>>,
}

impl RecordingCapability {
    pub fn with_voices(voices: Vec<VoiceDescriptor>) -> Self {
        let fake = Self::default();
        fake.set_voices(voices);
        fake
    }

    pub fn set_voices(&self, voices: Vec<VoiceDescriptor>) {
        self.shared.lock().unwrap().voices = voices;
    }

    pub fn fail_speak(&self, fail: bool) {
        self.shared.lock().unwrap().fail_speak = fail;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.shared.lock().unwrap().calls.clear();
    }

    /// Utterances submitted so far
    pub fn spoken(&self) -> Vec<Utterance> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Speak(u) => Some(u),
                _ => None,
            })
            .collect()
    }

    pub fn is_subscribed(&self) -> bool {
        self.shared.lock().unwrap().sink.is_some()
    }

    /// Deliver an event as the engine would
    pub fn emit(&self, event: CapabilityEvent) {
        if let Some(sink) = self.shared.lock().unwrap().sink.as_ref() {
            sink.emit(event);
        }
    }

    pub fn emit_utterance(&self, id: UtteranceId, event: SpeechEvent) {
        self.emit(CapabilityEvent::Utterance { id, event });
    }

    fn record(&self, call: Call) {
        self.shared.lock().unwrap().calls.push(call);
    }
}

impl SpeechCapability for RecordingCapability {
    fn list_voices(&mut self) -> Result<Vec<VoiceDescriptor>> {
        self.record(Call::ListVoices);
        Ok(self.shared.lock().unwrap().voices.clone())
    }

    fn subscribe(&mut self, sink: EventSink) -> Result<()> {
        self.record(Call::Subscribe);
        self.shared.lock().unwrap().sink = Some(sink);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.record(Call::Unsubscribe);
        self.shared.lock().unwrap().sink = None;
    }

    fn speak(&mut self, utterance: Utterance) -> Result<UtteranceId> {
        self.record(Call::Speak(utterance));
        let mut shared = self.shared.lock().unwrap();
        if shared.fail_speak {
            return Err(ReadAloudError::Speech("engine unavailable".to_string()));
        }
        shared.next_id += 1;
        Ok(UtteranceId(shared.next_id))
    }

    fn pause(&mut self, id: UtteranceId) -> Result<()> {
        self.record(Call::Pause(id));
        Ok(())
    }

    fn resume(&mut self, id: UtteranceId) -> Result<()> {
        self.record(Call::Resume(id));
        Ok(())
    }

    fn cancel(&mut self, id: UtteranceId) -> Result<()> {
        self.record(Call::Cancel(id));
        Ok(())
    }

    fn cancel_all(&mut self) -> Result<()> {
        self.record(Call::CancelAll);
        Ok(())
    }
}

pub fn english() -> VoiceDescriptor {
    VoiceDescriptor::new("voice-a", "A", "en-US")
}

pub fn hindi() -> VoiceDescriptor {
    VoiceDescriptor::new("voice-b", "B", "hi-IN")
}

/// A coordinator over a fake with the given voices, plus its event channel
pub fn coordinator(
    voices: Vec<VoiceDescriptor>,
) -> (PlaybackCoordinator, RecordingCapability, Receiver<CapabilityEvent>) {
    let fake = RecordingCapability::with_voices(voices);
    let (sink, events) = event_channel();
    let coordinator = PlaybackCoordinator::new(
        Box::new(fake.clone()),
        sink,
        LocalePreference::default(),
        PlaybackParameters::default(),
    )
    .unwrap();
    (coordinator, fake, events)
}

/// Feed every queued event to the coordinator
pub fn pump(coordinator: &mut PlaybackCoordinator, events: &Receiver<CapabilityEvent>) {
    for event in events.try_iter() {
        coordinator.handle_event(event).unwrap();
    }
}
