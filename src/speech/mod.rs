//! Speech capability: the boundary to the platform's text-to-speech

pub mod backends;
pub mod capability;
pub mod events;
pub mod player;
pub mod segment;
pub mod voice;

pub use capability::{create_capability, BackendKind, SpeechCapability, Utterance};
pub use events::{event_channel, CapabilityEvent, EventSink, SpeechEvent, UtteranceId};
pub use voice::VoiceDescriptor;
