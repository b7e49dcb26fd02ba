//! Envelope definitions and per-channel envelope engines.
//!
//! Definition tables ([`EnvelopeBank`]) are decoded once from the envelope
//! source and never change afterwards. Each channel owns one runtime state
//! per engine:
//!
//! - [`volume::VolumeEnvelopeState`] - ADSR amplitude
//! - [`vibrato::VibratoState`] - delayed, ramped sinusoidal pitch modulation
//! - [`slide::SlideState`] - linear note-to-note glide

pub mod slide;
pub mod vibrato;
pub mod volume;

use crate::constants::{ENVELOPE_SLOTS, TRIGGER_NOTES};

pub use slide::SlideState;
pub use vibrato::{VibratoPhase, VibratoState};
pub use volume::{EnvelopeOutcome, VolumePhase, VolumeEnvelopeState};

/// Index of a slot in one of the sixteen-entry envelope tables (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnvelopeSlot(u8);

impl EnvelopeSlot {
    /// Slot for a 0-based index, or `None` if outside the table.
    pub fn new(index: usize) -> Option<Self> {
        (index < ENVELOPE_SLOTS).then_some(Self(index as u8))
    }

    /// Decode a raw 1-based slot field where 0 means "unassigned".
    pub fn from_raw(raw: i32) -> Option<Self> {
        if raw <= 0 {
            return None;
        }
        Self::new((raw - 1) as usize)
    }

    /// 0-based table index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// ADSR definition. Attack, decay and release are in 64th-note ticks, sustain
/// is a level from 0 to 127.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeEnvelope {
    /// Attack duration.
    pub attack: i32,
    /// Decay duration.
    pub decay: i32,
    /// Sustain level.
    pub sustain: i32,
    /// Release duration.
    pub release: i32,
}

impl Default for VolumeEnvelope {
    fn default() -> Self {
        Self {
            attack: 4,
            decay: 8,
            sustain: 100,
            release: 12,
        }
    }
}

/// Vibrato definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEnvelope {
    /// Ticks to wait before modulation starts.
    pub delay: i32,
    /// Ticks per modulation cycle.
    pub rate: i32,
    /// Peak deviation in Hz.
    pub depth: f32,
    /// Ticks to ramp from zero to full depth.
    pub ramp: i32,
}

impl Default for PitchEnvelope {
    fn default() -> Self {
        Self {
            delay: 0,
            rate: 1,
            depth: 0.0,
            ramp: 0,
        }
    }
}

/// How a slide entry's notes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideMode {
    /// Start and end are absolute note numbers.
    Absolute,
    /// Start and end are offsets from the played note.
    Relative,
}

/// One slide definition for a trigger note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideEntry {
    /// Start note (or offset).
    pub start_note: i32,
    /// End note (or offset).
    pub end_note: i32,
    /// Duration in 64th-note ticks.
    pub duration: i32,
    /// Absolute or relative notes.
    pub mode: SlideMode,
}

impl SlideEntry {
    /// Resolve the start and end notes for a played note. Relative offsets
    /// saturate at the `i32` range.
    pub fn resolve(&self, played_note: i32) -> (i32, i32) {
        match self.mode {
            SlideMode::Absolute => (self.start_note, self.end_note),
            SlideMode::Relative => (
                played_note.saturating_add(self.start_note),
                played_note.saturating_add(self.end_note),
            ),
        }
    }
}

/// Slide definitions for one kit, indexed by trigger note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideKit {
    entries: [Option<SlideEntry>; TRIGGER_NOTES],
}

impl Default for SlideKit {
    fn default() -> Self {
        Self {
            entries: [None; TRIGGER_NOTES],
        }
    }
}

impl SlideKit {
    /// Entry for a trigger note, if one is defined.
    pub fn entry(&self, trigger: u8) -> Option<&SlideEntry> {
        self.entries.get(trigger as usize).and_then(Option::as_ref)
    }

    /// Define a single absolute entry. Triggers outside 0-127 are ignored.
    pub fn set_absolute(&mut self, trigger: usize, start_note: i32, end_note: i32, duration: i32) {
        if let Some(slot) = self.entries.get_mut(trigger) {
            *slot = Some(SlideEntry {
                start_note,
                end_note,
                duration,
                mode: SlideMode::Absolute,
            });
        }
    }

    /// Define the same relative entry for every trigger note.
    pub fn set_wildcard(&mut self, start_offset: i32, end_offset: i32, duration: i32) {
        let entry = SlideEntry {
            start_note: start_offset,
            end_note: end_offset,
            duration,
            mode: SlideMode::Relative,
        };
        self.entries.fill(Some(entry));
    }

    /// Number of trigger notes with a definition.
    pub fn defined_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}

/// All envelope definition tables, built once at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeBank {
    volume: [VolumeEnvelope; ENVELOPE_SLOTS],
    pitch: [PitchEnvelope; ENVELOPE_SLOTS],
    slides: Box<[SlideKit; ENVELOPE_SLOTS]>,
}

impl Default for EnvelopeBank {
    fn default() -> Self {
        Self {
            volume: [VolumeEnvelope::default(); ENVELOPE_SLOTS],
            pitch: [PitchEnvelope::default(); ENVELOPE_SLOTS],
            slides: Box::new(std::array::from_fn(|_| SlideKit::default())),
        }
    }
}

impl EnvelopeBank {
    /// Volume envelope in a slot.
    pub fn volume(&self, slot: EnvelopeSlot) -> &VolumeEnvelope {
        &self.volume[slot.index()]
    }

    /// Vibrato envelope in a slot.
    pub fn pitch(&self, slot: EnvelopeSlot) -> &PitchEnvelope {
        &self.pitch[slot.index()]
    }

    /// Slide kit in a slot.
    pub fn slide_kit(&self, slot: EnvelopeSlot) -> &SlideKit {
        &self.slides[slot.index()]
    }

    pub(crate) fn set_volume(&mut self, slot: EnvelopeSlot, env: VolumeEnvelope) {
        self.volume[slot.index()] = env;
    }

    pub(crate) fn set_pitch(&mut self, slot: EnvelopeSlot, env: PitchEnvelope) {
        self.pitch[slot.index()] = env;
    }

    pub(crate) fn slide_kit_mut(&mut self, slot: EnvelopeSlot) -> &mut SlideKit {
        &mut self.slides[slot.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_slot_decoding() {
        assert_eq!(EnvelopeSlot::from_raw(0), None);
        assert_eq!(EnvelopeSlot::from_raw(-1), None);
        assert_eq!(EnvelopeSlot::from_raw(5).map(EnvelopeSlot::index), Some(4));
        assert_eq!(EnvelopeSlot::from_raw(16).map(EnvelopeSlot::index), Some(15));
        assert_eq!(EnvelopeSlot::from_raw(17), None);
    }

    #[test]
    fn relative_entry_offsets_from_played_note() {
        let entry = SlideEntry {
            start_note: 12,
            end_note: -12,
            duration: 8,
            mode: SlideMode::Relative,
        };
        assert_eq!(entry.resolve(48), (60, 36));

        let absolute = SlideEntry {
            mode: SlideMode::Absolute,
            ..entry
        };
        assert_eq!(absolute.resolve(48), (12, -12));
    }

    #[test]
    fn relative_entry_saturates_extreme_offsets() {
        let entry = SlideEntry {
            start_note: i32::MAX,
            end_note: i32::MIN,
            duration: 4,
            mode: SlideMode::Relative,
        };
        assert_eq!(entry.resolve(60), (i32::MAX, i32::MIN + 60));
    }

    #[test]
    fn wildcard_then_specific_overrides_one_note() {
        let mut kit = SlideKit::default();
        kit.set_wildcard(0, 5, 4);
        kit.set_absolute(60, 40, 50, 2);

        assert_eq!(kit.defined_count(), TRIGGER_NOTES);
        assert_eq!(kit.entry(60).unwrap().mode, SlideMode::Absolute);
        assert_eq!(kit.entry(59).unwrap().mode, SlideMode::Relative);
        assert_eq!(kit.entry(61).unwrap().end_note, 5);
    }

    #[test]
    fn specific_then_wildcard_overwrites_everything() {
        let mut kit = SlideKit::default();
        kit.set_absolute(60, 40, 50, 2);
        kit.set_wildcard(0, 5, 4);
        assert_eq!(kit.entry(60).unwrap().mode, SlideMode::Relative);
    }

    #[test]
    fn default_bank_uses_builtin_envelopes() {
        let bank = EnvelopeBank::default();
        let slot = EnvelopeSlot::new(3).unwrap();
        assert_eq!(*bank.volume(slot), VolumeEnvelope::default());
        assert_eq!(bank.pitch(slot).rate, 1);
        assert_eq!(bank.slide_kit(slot).defined_count(), 0);
    }
}
