//! Linear pitch slide (portamento).

use super::SlideEntry;
use crate::constants::SLIDE_MAX_HZ;
use crate::frequency::Tuning;
use crate::timing::FrameTiming;

/// Per-channel slide runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlideState {
    active: bool,
    start_frame: i64,
    start_note: i32,
    end_note: i32,
    duration: i32,
}

impl SlideState {
    /// Whether a slide is in progress.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Resolved start note.
    pub fn start_note(&self) -> i32 {
        self.start_note
    }

    /// Resolved end note.
    pub fn end_note(&self) -> i32 {
        self.end_note
    }

    /// Frame the slide started on.
    pub fn start_frame(&self) -> i64 {
        self.start_frame
    }

    /// Start a slide for `played_note` beginning at `frame`.
    pub fn start(&mut self, entry: &SlideEntry, played_note: i32, frame: i64) {
        let (start_note, end_note) = entry.resolve(played_note);
        *self = Self {
            active: true,
            start_frame: frame,
            start_note,
            end_note,
            duration: entry.duration,
        };
    }

    /// Deactivate and forget the current slide.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Interpolated (fractional) note at `frame`. Deactivates the slide once
    /// the end is reached; the final note is still returned for that tick.
    pub fn advance(&mut self, frame: i64, timing: &FrameTiming) -> f32 {
        let span = timing.frames_for(self.duration);
        let mut t = if span > 0.0 {
            (frame - self.start_frame) as f64 / span
        } else {
            1.0
        };
        if t >= 1.0 {
            t = 1.0;
            self.active = false;
        }
        let (start, end) = (f64::from(self.start_note), f64::from(self.end_note));
        (start + t.max(0.0) * (end - start)) as f32
    }

    /// Advance one tick and return the frequency to drive.
    pub fn advance_frequency(
        &mut self,
        frame: i64,
        timing: &FrameTiming,
        tuning: &Tuning,
        pitch_bend: i32,
    ) -> f32 {
        let note = self.advance(frame, timing);
        tuning
            .frequency(note.round() as i32, pitch_bend)
            .clamp(0.0, SLIDE_MAX_HZ)
    }
}
