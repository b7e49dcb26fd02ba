//! Decoded song data: tempo, note events and loop markers.

use crate::constants::DEFAULT_BPM;
use crate::envelope::EnvelopeSlot;

/// What an event line does when its start position is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Play a note (2-127).
    Note(u8),
    /// Update channel controllers without retriggering anything.
    Controller,
}

/// One event line of a song.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    /// Target channel (0-15).
    pub channel: usize,
    /// Program, used as duty selector on tone channels.
    pub program: u8,
    /// Note or controller-only update.
    pub kind: EventKind,
    /// Note velocity (0-127).
    pub velocity: u8,
    /// Start position in 64th-note ticks.
    pub start_div: i32,
    /// End position in 64th-note ticks.
    pub end_div: i32,
    /// Pan (0-127).
    pub pan: u8,
    /// Pitch bend, ±8192 spans the configured bend range.
    pub pitch_bend: i32,
    /// Channel volume (0-127).
    pub channel_volume: u8,
    /// Volume envelope slot.
    pub volume_env: Option<EnvelopeSlot>,
    /// Vibrato envelope slot.
    pub vibrato_env: Option<EnvelopeSlot>,
    /// Slide kit slot.
    pub slide_env: Option<EnvelopeSlot>,
}

impl NoteEvent {
    /// Note number for note events.
    pub fn note(&self) -> Option<u8> {
        match self.kind {
            EventKind::Note(note) => Some(note),
            EventKind::Controller => None,
        }
    }
}

/// A decoded song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    /// Tempo in beats per minute.
    pub bpm: u32,
    /// Events in source order.
    pub events: Vec<NoteEvent>,
    /// Loop start position in 64th-note ticks.
    pub loop_start_div: Option<i32>,
    /// Loop end position in 64th-note ticks.
    pub loop_end_div: Option<i32>,
}

impl Song {
    /// Song with no events at the default tempo.
    pub fn empty() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            events: Vec::new(),
            loop_start_div: None,
            loop_end_div: None,
        }
    }

    /// Whether the song has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for Song {
    fn default() -> Self {
        Self::empty()
    }
}
