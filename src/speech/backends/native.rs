//! Native TTS backend using the tts crate
//!
//! The `tts` crate wraps the platform engine:
//! - Speech Dispatcher on Linux
//! - AVFoundation on macOS/iOS
//! - WinRT/SAPI on Windows
//!
//! Words are fed to the engine one at a time by the chunk player. Chunk
//! completion is learned from `on_utterance_end` where the platform
//! supports callbacks, from `is_speaking` where it does not, and as a last
//! resort from an estimate of how long the word takes to say.

use crate::speech::player::{ChunkEngine, ChunkPlayer, ChunkStatus, Waker};
use crate::speech::{EventSink, SpeechCapability, Utterance, UtteranceId, VoiceDescriptor};
use crate::{ReadAloudError, Result};
use log::{debug, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tts::{Tts, UtteranceId as TtsUtteranceId};

/// Id of the placeholder voice offered when the platform cannot list voices
const DEFAULT_VOICE_ID: &str = "default";

/// Engines report "not speaking" for a moment after a speak call
const SPEAKING_GRACE: Duration = Duration::from_millis(150);

/// Map a speed multiplier onto the engine's rate range
///
/// Engines with a positive normal rate take the multiplier directly.
/// Speech Dispatcher centres its range on 0, so there 0.5x..2x spans the
/// middle half of min..max.
fn scale_rate(multiplier: f32, min: f32, normal: f32, max: f32) -> f32 {
    let rate = if normal > 0.0 {
        normal * multiplier
    } else if multiplier <= 1.0 {
        normal - (normal - min) * (1.0 - multiplier)
    } else {
        normal + (max - normal) * (multiplier - 1.0) / 2.0
    };
    rate.clamp(min, max)
}

/// Map pitch 0..=2 onto min..=normal..=max
fn scale_pitch(pitch: f32, min: f32, normal: f32, max: f32) -> f32 {
    let pitch = pitch.clamp(0.0, 2.0);
    if pitch <= 1.0 {
        min + (normal - min) * pitch
    } else {
        normal + (max - normal) * (pitch - 1.0)
    }
}

/// Rough time to say a word at `rate`, assuming 150 words per minute
fn estimate_word_duration(word: &str, rate: f32) -> Duration {
    let syllables = (word.chars().count() as f32 / 3.0).max(1.0);
    let millis = 400.0 * syllables.min(4.0) / rate.max(0.1);
    Duration::from_millis(millis as u64)
}

fn lock_ended(ended: &Mutex<Vec<TtsUtteranceId>>) -> MutexGuard<'_, Vec<TtsUtteranceId>> {
    match ended.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Chunk engine driving a `tts::Tts` instance
struct NativeEngine {
    tts: Tts,

    /// Utterance ids the engine reported as finished
    ended: Arc<Mutex<Vec<TtsUtteranceId>>>,

    /// Id of the chunk currently playing, when the platform returns one
    current: Option<TtsUtteranceId>,

    /// When the current chunk started and how long it should take
    started: Option<(Instant, Duration)>,

    /// Rate of the utterance being played, for duration estimates
    rate: f32,

    callbacks: bool,
}

impl NativeEngine {
    fn new(tts: Tts) -> Self {
        let callbacks = tts.supported_features().utterance_callbacks;
        Self {
            tts,
            ended: Arc::new(Mutex::new(Vec::new())),
            current: None,
            started: None,
            rate: 1.0,
            callbacks,
        }
    }

    fn set_voice(&mut self, voice: &VoiceDescriptor) -> Result<()> {
        if voice.id == DEFAULT_VOICE_ID || !self.tts.supported_features().voice {
            return Ok(());
        }

        let voices = self
            .tts
            .voices()
            .map_err(|e| ReadAloudError::Speech(format!("Failed to get voices: {}", e)))?;

        match voices.iter().find(|v| v.id() == voice.id) {
            Some(found) => {
                debug!("Selecting voice: {}", voice);
                self.tts
                    .set_voice(found)
                    .map_err(|e| ReadAloudError::Speech(format!("Failed to set voice: {}", e)))
            }
            None => Err(ReadAloudError::VoiceNotFound(voice.name.clone())),
        }
    }
}

impl ChunkEngine for NativeEngine {
    fn attach(&mut self, waker: Waker) -> Result<()> {
        if !self.callbacks {
            debug!("Utterance callbacks unsupported, polling for completion");
            return Ok(());
        }

        let ended = Arc::clone(&self.ended);
        self.tts
            .on_utterance_end(Some(Box::new(move |id: TtsUtteranceId| {
                lock_ended(&ended).push(id);
                waker.wake();
            })))
            .map_err(|e| ReadAloudError::Speech(format!("Failed to register callback: {}", e)))
    }

    fn configure(&mut self, utterance: &Utterance) -> Result<()> {
        self.set_voice(&utterance.voice)?;
        self.rate = utterance.rate;

        let features = self.tts.supported_features();

        if features.rate {
            let rate = scale_rate(
                utterance.rate,
                self.tts.min_rate(),
                self.tts.normal_rate(),
                self.tts.max_rate(),
            );
            debug!("Setting rate to {} ({}x)", rate, utterance.rate);
            self.tts
                .set_rate(rate)
                .map_err(|e| ReadAloudError::Speech(format!("Failed to set rate: {}", e)))?;
        } else {
            warn!("Rate control not supported on this platform");
        }

        if features.pitch {
            let pitch = scale_pitch(
                utterance.pitch,
                self.tts.min_pitch(),
                self.tts.normal_pitch(),
                self.tts.max_pitch(),
            );
            debug!("Setting pitch to {}", pitch);
            self.tts
                .set_pitch(pitch)
                .map_err(|e| ReadAloudError::Speech(format!("Failed to set pitch: {}", e)))?;
        } else {
            warn!("Pitch control not supported on this platform");
        }

        Ok(())
    }

    fn play(&mut self, chunk: &str) -> Result<()> {
        lock_ended(&self.ended).clear();

        self.current = self
            .tts
            .speak(chunk, true)
            .map_err(|e| ReadAloudError::Speech(format!("Speak failed: {}", e)))?;
        self.started = Some((Instant::now(), estimate_word_duration(chunk, self.rate)));

        Ok(())
    }

    fn halt(&mut self) -> Result<()> {
        self.current = None;
        self.started = None;

        if !self.tts.supported_features().stop {
            warn!("Stopping speech not supported on this platform");
            return Ok(());
        }

        self.tts
            .stop()
            .map_err(|e| ReadAloudError::Speech(format!("Stop failed: {}", e)))?;
        Ok(())
    }

    fn status(&mut self) -> ChunkStatus {
        let Some((started, estimate)) = self.started else {
            return ChunkStatus::Finished;
        };

        let finished = if self.callbacks {
            let mut ended = lock_ended(&self.ended);
            let done = match &self.current {
                Some(id) => ended.iter().any(|e| e == id),
                None => !ended.is_empty(),
            };
            if done {
                ended.clear();
            }
            done
        } else if self.tts.supported_features().is_speaking {
            match self.tts.is_speaking() {
                Ok(speaking) => !speaking && started.elapsed() >= SPEAKING_GRACE,
                Err(e) => return ChunkStatus::Failed(format!("Failed to query engine: {}", e)),
            }
        } else {
            started.elapsed() >= estimate
        };

        if finished {
            self.started = None;
            self.current = None;
            ChunkStatus::Finished
        } else {
            ChunkStatus::Playing
        }
    }
}

/// Native TTS backend using the tts crate
pub struct NativeCapability {
    /// Handle used for voice enumeration; the player owns a clone
    tts: Tts,
    player: ChunkPlayer,
}

impl NativeCapability {
    /// Create a new native TTS capability
    ///
    /// Initializes the platform-appropriate TTS engine and starts its player
    pub fn new() -> Result<Self> {
        debug!("Creating native TTS backend");

        let tts = Tts::default()
            .map_err(|e| ReadAloudError::Speech(format!("Failed to initialize TTS: {}", e)))?;
        let player = ChunkPlayer::spawn("native", NativeEngine::new(tts.clone()))?;

        debug!("Native TTS backend created successfully");
        Ok(Self { tts, player })
    }
}

impl SpeechCapability for NativeCapability {
    fn list_voices(&mut self) -> Result<Vec<VoiceDescriptor>> {
        if !self.tts.supported_features().voice {
            return Ok(vec![VoiceDescriptor::new(DEFAULT_VOICE_ID, "System default", "und")]);
        }

        let voices = self
            .tts
            .voices()
            .map_err(|e| ReadAloudError::Speech(format!("Failed to get voices: {}", e)))?;

        Ok(voices
            .iter()
            .map(|v| VoiceDescriptor::new(v.id(), v.name(), v.language().to_string()))
            .collect())
    }

    fn subscribe(&mut self, sink: EventSink) -> Result<()> {
        self.player.subscribe(sink)
    }

    fn unsubscribe(&mut self) {
        self.player.unsubscribe();
    }

    fn speak(&mut self, utterance: Utterance) -> Result<UtteranceId> {
        self.player.speak(utterance)
    }

    fn pause(&mut self, id: UtteranceId) -> Result<()> {
        self.player.pause(id)
    }

    fn resume(&mut self, id: UtteranceId) -> Result<()> {
        self.player.resume(id)
    }

    fn cancel(&mut self, id: UtteranceId) -> Result<()> {
        self.player.cancel(id)
    }

    fn cancel_all(&mut self) -> Result<()> {
        self.player.cancel_all()
    }
}

impl Drop for NativeCapability {
    fn drop(&mut self) {
        if self.tts.supported_features().utterance_callbacks {
            let _ = self.tts.on_utterance_end(None);
        }
    }
}
