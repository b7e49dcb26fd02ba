//! Tick/Frame Timing
//!
//! Converts positions in 64th-note ticks to the frame numbers of the
//! external clock the host drives the engine with.

use crate::constants::TICKS_PER_BEAT;
use crate::{Result, SequencerError};

/// Frame timing for a song at a fixed tempo and tick rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    bpm: u32,
    tick_rate_hz: f64,
    frames_per_tick: f64,
}

impl FrameTiming {
    /// Create timing for `bpm` beats per minute at `tick_rate_hz` frames per second.
    ///
    /// # Errors
    /// Returns an error if `bpm` is zero or the tick rate is not a positive finite number.
    pub fn new(bpm: u32, tick_rate_hz: f64) -> Result<Self> {
        if bpm == 0 {
            return Err(SequencerError::ConfigError("BPM must be > 0".into()));
        }
        if !tick_rate_hz.is_finite() || tick_rate_hz <= 0.0 {
            return Err(SequencerError::ConfigError(format!(
                "tick rate must be a positive number of Hz, got {tick_rate_hz}"
            )));
        }
        let frames_per_tick = (60.0 / bpm as f64) / TICKS_PER_BEAT * tick_rate_hz;
        Ok(Self {
            bpm,
            tick_rate_hz,
            frames_per_tick,
        })
    }

    /// Tempo in beats per minute.
    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// External clock rate in Hz.
    pub fn tick_rate_hz(&self) -> f64 {
        self.tick_rate_hz
    }

    /// Frames per 64th-note tick.
    pub fn frames_per_tick(&self) -> f64 {
        self.frames_per_tick
    }

    /// Frame number of a 64th-note position: `round(div * frames_per_tick)`.
    pub fn frame_of(&self, div: i32) -> i64 {
        (div as f64 * self.frames_per_tick).round() as i64
    }

    /// Length in frames of `ticks` 64th notes, unrounded.
    pub fn frames_for(&self, ticks: i32) -> f64 {
        ticks as f64 * self.frames_per_tick
    }

    /// Song position in 64th-note ticks for a frame number.
    pub fn position_of(&self, frame: i64) -> f64 {
        frame as f64 / self.frames_per_tick
    }
}
