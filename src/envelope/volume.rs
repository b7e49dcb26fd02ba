//! ADSR volume envelope engine.
//!
//! Runs once per tick on an active channel. Phase changes:
//!
//! ```text
//! Idle -> Attack -> Decay -> Sustain
//!           \________\_________\____-> Release -> Idle
//! ```
//!
//! Release is only entered from outside (note end); reaching zero in
//! Release reports [`EnvelopeOutcome::Finished`] exactly once.

use super::VolumeEnvelope;
use crate::constants::MAX_LEVEL;

/// ADSR phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolumePhase {
    /// Not running. Initial and terminal phase.
    #[default]
    Idle,
    /// Ramping up to full level.
    Attack,
    /// Falling to the sustain level.
    Decay,
    /// Holding the sustain level.
    Sustain,
    /// Fading out after note end.
    Release,
}

/// Result of one envelope tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnvelopeOutcome {
    /// Current amplitude (0-127).
    Level(f32),
    /// Release completed on this tick; the channel should be silenced.
    Finished,
}

/// Per-channel ADSR runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VolumeEnvelopeState {
    phase: VolumePhase,
    amplitude: f32,
    counter: u32,
}

impl VolumeEnvelopeState {
    /// Current phase.
    pub fn phase(&self) -> VolumePhase {
        self.phase
    }

    /// Current amplitude (0-127).
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Ticks spent in the current phase.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Restart at Attack from silence.
    pub fn trigger(&mut self) {
        self.phase = VolumePhase::Attack;
        self.amplitude = 0.0;
        self.counter = 0;
    }

    /// Enter Release from whatever phase the envelope is in.
    pub fn release(&mut self) {
        self.phase = VolumePhase::Release;
        self.counter = 0;
    }

    /// Advance the envelope by one tick.
    pub fn advance(&mut self, env: &VolumeEnvelope) -> EnvelopeOutcome {
        self.counter += 1;
        let sustain = env.sustain as f32;

        match self.phase {
            VolumePhase::Attack => {
                self.amplitude += MAX_LEVEL / env.attack.max(1) as f32;
                if self.amplitude >= MAX_LEVEL {
                    self.amplitude = MAX_LEVEL;
                    self.phase = VolumePhase::Decay;
                    self.counter = 0;
                }
            }
            VolumePhase::Decay => {
                self.amplitude -= (MAX_LEVEL - sustain) / env.decay.max(1) as f32;
                if self.amplitude <= sustain {
                    self.amplitude = sustain;
                    self.phase = VolumePhase::Sustain;
                }
            }
            VolumePhase::Release => {
                self.amplitude -= sustain / env.release.max(1) as f32;
                if self.amplitude <= 0.0 {
                    self.amplitude = 0.0;
                    self.phase = VolumePhase::Idle;
                    return EnvelopeOutcome::Finished;
                }
            }
            VolumePhase::Sustain | VolumePhase::Idle => {}
        }

        EnvelopeOutcome::Level(self.amplitude)
    }
}

/// Output volume for an amplitude scaled against the note's base volume.
pub fn scaled_volume(amplitude: f32, base_volume: u8) -> u8 {
    (amplitude / MAX_LEVEL * base_volume as f32)
        .round()
        .clamp(0.0, MAX_LEVEL) as u8
}
