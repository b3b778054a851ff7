//! Collision audio gate.
//!
//! The crate does not synthesize sound. It maps collision impacts to
//! (pitch, volume) pairs and forwards them to a host tone service, but
//! only once the host has reported audio activation (browser-style
//! permission gating) and while not muted. Everything else is dropped
//! silently.

use serde::{Deserialize, Serialize};

/// Tone-emission service implemented by the host.
pub trait ToneSink {
    fn play_impact(&mut self, pitch_hz: f32, volume: f32);
}

/// A tone service that goes nowhere.
#[derive(Debug, Default)]
pub struct NullTone;

impl ToneSink for NullTone {
    fn play_impact(&mut self, _pitch_hz: f32, _volume: f32) {}
}

/// Impact-to-tone mapping parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Impacts slower than this are inaudible.
    pub min_speed: f32,
    /// Impacts at or above this speed play at full volume.
    pub max_speed: f32,
    /// Pitch numerator: pitch = pitch_ref / size, clamped below.
    pub pitch_ref: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
    /// Volume at full intensity.
    pub volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            min_speed: 40.0,
            max_speed: 600.0,
            pitch_ref: 24_000.0,
            min_pitch: 120.0,
            max_pitch: 1_200.0,
            volume: 0.8,
        }
    }
}

/// Gate between physics impacts and the tone service.
#[derive(Debug)]
pub struct ImpactAudio {
    cfg: AudioConfig,
    activated: bool,
    muted: bool,
}

impl ImpactAudio {
    pub fn new(cfg: AudioConfig) -> Self {
        Self {
            cfg,
            activated: false,
            muted: false,
        }
    }

    /// Host reports that audio output is allowed. Until then every impact
    /// is dropped.
    pub fn activate(&mut self) {
        self.activated = true;
    }

    /// Toggle mute; returns the new muted state.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Map one impact to a tone. Smaller colliders ring higher; louder
    /// with impact speed, clamped to the configured ceiling.
    pub fn impact(&self, speed: f32, size: f32, tone: &mut dyn ToneSink) {
        if !self.activated || self.muted || speed < self.cfg.min_speed {
            return;
        }
        let span = (self.cfg.max_speed - self.cfg.min_speed).max(f32::EPSILON);
        let intensity = ((speed - self.cfg.min_speed) / span).clamp(0.0, 1.0);
        let pitch = (self.cfg.pitch_ref / size.max(1.0))
            .clamp(self.cfg.min_pitch, self.cfg.max_pitch);
        tone.play_impact(pitch, intensity * self.cfg.volume);
    }
}
