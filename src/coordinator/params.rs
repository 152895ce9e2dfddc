//! Playback parameters, playback state and the spoken word range

use std::fmt;

/// Step of the speed and pitch controls
pub const STEP: f32 = 0.1;

pub const MIN_RATE: f32 = 0.5;
pub const MAX_RATE: f32 = 2.0;
pub const MIN_PITCH: f32 = 0.0;
pub const MAX_PITCH: f32 = 2.0;

/// Clamp into range and snap to the control step
fn snap(value: f32, min: f32, max: f32) -> f32 {
    if !value.is_finite() {
        return 1.0_f32.clamp(min, max);
    }
    let snapped = (value.clamp(min, max) / STEP).round() * STEP;
    // Rounding can leave 1.2000001; keep one decimal
    ((snapped * 10.0).round() / 10.0).clamp(min, max)
}

/// Speed and pitch of the next utterance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackParameters {
    rate: f32,
    pitch: f32,
}

impl PlaybackParameters {
    pub fn new(rate: f32, pitch: f32) -> Self {
        Self {
            rate: snap(rate, MIN_RATE, MAX_RATE),
            pitch: snap(pitch, MIN_PITCH, MAX_PITCH),
        }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate = snap(rate, MIN_RATE, MAX_RATE);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = snap(pitch, MIN_PITCH, MAX_PITCH);
    }

    /// Move the rate by whole control steps
    pub fn step_rate(&mut self, steps: i32) {
        self.set_rate(self.rate + steps as f32 * STEP);
    }

    /// Move the pitch by whole control steps
    pub fn step_pitch(&mut self, steps: i32) {
        self.set_pitch(self.pitch + steps as f32 * STEP);
    }
}

impl Default for PlaybackParameters {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

/// Where the coordinator is in its playback lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Speaking,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Speaking => "Speaking",
            PlaybackState::Paused => "Paused",
        };
        f.write_str(label)
    }
}

/// Byte range of the most recently announced word; `{0,0}` means none
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WordRange {
    pub start: usize,
    pub end: usize,
}

impl WordRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
