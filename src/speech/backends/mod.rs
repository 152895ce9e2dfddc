//! Platform-specific speech backends

// Native TTS backend using the tts crate (cross-platform)
pub mod native;

// espeak-ng processes, for WSLg and hosts without speech-dispatcher
pub mod espeak;
