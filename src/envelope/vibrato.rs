//! Delayed, ramped sinusoidal vibrato.

use std::f32::consts::TAU;

use super::PitchEnvelope;
use crate::constants::{VIBRATO_MAX_HZ, VIBRATO_MIN_HZ};

/// Vibrato sub-phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VibratoPhase {
    /// Counting down the delay.
    #[default]
    WaitingDelay,
    /// Modulating the frequency.
    Modulating,
}

/// Per-channel vibrato runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VibratoState {
    active: bool,
    phase: VibratoPhase,
    angle: f32,
    current_depth: f32,
    counter: u32,
}

impl VibratoState {
    /// Whether the vibrato is running.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current sub-phase.
    pub fn phase(&self) -> VibratoPhase {
        self.phase
    }

    /// Depth reached so far by the ramp (Hz).
    pub fn current_depth(&self) -> f32 {
        self.current_depth
    }

    /// Restart from the delay with zero phase and depth.
    pub fn trigger(&mut self) {
        *self = Self {
            active: true,
            ..Self::default()
        };
    }

    /// Stop modulating and clear the accumulators.
    pub fn stop(&mut self) {
        self.active = false;
        self.angle = 0.0;
        self.current_depth = 0.0;
        self.counter = 0;
    }

    /// Advance one tick. Returns the modulated frequency once the delay has
    /// elapsed, `None` while waiting.
    pub fn advance(&mut self, env: &PitchEnvelope, base_frequency: f32) -> Option<f32> {
        self.counter += 1;
        if self.phase == VibratoPhase::WaitingDelay && self.counter as i64 >= env.delay as i64 {
            self.phase = VibratoPhase::Modulating;
            self.counter = 0;
        }
        if self.phase != VibratoPhase::Modulating {
            return None;
        }

        if self.current_depth < env.depth {
            self.current_depth += env.depth / env.ramp.max(1) as f32;
            if self.current_depth > env.depth {
                self.current_depth = env.depth;
            }
        }
        self.angle += TAU / env.rate.max(1) as f32;

        let offset = self.angle.sin() * self.current_depth;
        let frequency = base_frequency + offset;
        if frequency.is_nan() {
            return Some(VIBRATO_MIN_HZ);
        }
        Some(frequency.clamp(VIBRATO_MIN_HZ, VIBRATO_MAX_HZ))
    }
}
