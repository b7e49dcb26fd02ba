//! Note and pitch-bend to frequency conversion.

use serde::{Deserialize, Serialize};

use crate::constants::{OCTAVE_SHIFT, PITCH_BEND_FULL_SCALE, PITCH_BEND_RANGE_SEMITONES};

/// Tuning parameters for converting notes to Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Semitones added to every note before conversion.
    pub octave_shift: i32,
    /// Semitones covered by a full ±8192 pitch bend.
    pub pitch_bend_range: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            octave_shift: OCTAVE_SHIFT,
            pitch_bend_range: PITCH_BEND_RANGE_SEMITONES,
        }
    }
}

impl Tuning {
    /// Equal-tempered frequency of `note` bent by `pitch_bend` (A4 = 440 Hz
    /// after the octave shift is applied).
    pub fn frequency(&self, note: i32, pitch_bend: i32) -> f32 {
        let bend = (pitch_bend as f32 / PITCH_BEND_FULL_SCALE) * self.pitch_bend_range;
        let semitones = note as f32 + self.octave_shift as f32 + bend - 69.0;
        440.0 * 2.0f32.powf(semitones / 12.0)
    }
}

/// Convert a note and pitch bend to Hz using the default tuning.
pub fn note_to_frequency(note: i32, pitch_bend: i32) -> f32 {
    Tuning::default().frequency(note, pitch_bend)
}
