//! Engine configuration
//!
//! All settings default to the Nintendo DS player values, so a
//! configuration file only needs the fields it wants to change:
//!
//! ```json
//! { "tick_rate_hz": 60.0, "event_matching": "exact" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CHANNEL_COUNT, DEFAULT_TICK_RATE_HZ, GLOBAL_VOLUME_MULTIPLIER, MAX_OCTAVE_SHIFT,
    NOISE_CHANNEL_START,
};
use crate::frequency::Tuning;
use crate::{Result, SequencerError};

/// When an event whose frame has been reached is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventMatching {
    /// Fire on the first tick where the frame counter has reached the
    /// event's frame. Survives skipped ticks and frame-0 events.
    #[default]
    CatchUp,
    /// Fire only on the tick whose frame counter equals the event's frame.
    Exact,
}

/// What to do with an event line that cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedLinePolicy {
    /// Fail the whole song load.
    #[default]
    Abort,
    /// Log a warning and drop the line.
    Skip,
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// External clock rate the host calls `tick()` at, in Hz.
    pub tick_rate_hz: f64,
    /// Multiplier applied to every note-on volume.
    pub global_volume: f32,
    /// First channel index played as noise.
    pub noise_channel_start: usize,
    /// Note to frequency conversion.
    pub tuning: Tuning,
    /// Event dispatch policy.
    pub event_matching: EventMatching,
    /// Handling of malformed song lines.
    pub malformed_lines: MalformedLinePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            global_volume: GLOBAL_VOLUME_MULTIPLIER,
            noise_channel_start: NOISE_CHANNEL_START,
            tuning: Tuning::default(),
            event_matching: EventMatching::default(),
            malformed_lines: MalformedLinePolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Decode a JSON configuration and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and decode a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// Returns [`SequencerError::ConfigError`] for a non-positive tick rate,
    /// a negative or non-finite volume, a noise channel start beyond the
    /// channel count, an octave shift beyond ±127 semitones, or a non-finite
    /// bend range.
    pub fn validate(&self) -> Result<()> {
        if !self.tick_rate_hz.is_finite() || self.tick_rate_hz <= 0.0 {
            return Err(SequencerError::ConfigError(format!(
                "tick_rate_hz must be > 0, got {}",
                self.tick_rate_hz
            )));
        }
        if !self.global_volume.is_finite() || self.global_volume < 0.0 {
            return Err(SequencerError::ConfigError(format!(
                "global_volume must be >= 0, got {}",
                self.global_volume
            )));
        }
        if self.noise_channel_start > CHANNEL_COUNT {
            return Err(SequencerError::ConfigError(format!(
                "noise_channel_start {} exceeds channel count {}",
                self.noise_channel_start, CHANNEL_COUNT
            )));
        }
        if !(-MAX_OCTAVE_SHIFT..=MAX_OCTAVE_SHIFT).contains(&self.tuning.octave_shift) {
            return Err(SequencerError::ConfigError(format!(
                "octave_shift must be within ±{MAX_OCTAVE_SHIFT}, got {}",
                self.tuning.octave_shift
            )));
        }
        if !self.tuning.pitch_bend_range.is_finite() {
            return Err(SequencerError::ConfigError(
                "pitch_bend_range must be finite".into(),
            ));
        }
        Ok(())
    }
}
