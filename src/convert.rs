//! Standard MIDI file to song source conversion.
//!
//! Every note-on/note-off pair becomes one song line, positioned in 64th
//! notes. Program, pan (CC10), channel volume (CC7), pitch bend and the
//! three envelope selectors (CC74 volume, CC75 vibrato, CC76 slide) are
//! tracked per MIDI channel and captured when a note starts. Whenever one of
//! them changes, a controller-only line (note -1) carries the new values.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use crate::constants::{CHANNEL_COUNT, DEFAULT_BPM, DEFAULT_PAN, TICKS_PER_BEAT};
use crate::{Result, SequencerError};

const CONTROLLER_NOTE: i32 = -1;
const UNASSIGNED_ENVELOPE: i32 = -1;

const CC_VOLUME: u8 = 7;
const CC_PAN: u8 = 10;
const CC_VOLUME_ENV: u8 = 74;
const CC_VIBRATO_ENV: u8 = 75;
const CC_SLIDE_ENV: u8 = 76;

const DEFAULT_CHANNEL_VOLUME: i32 = 127;
const FALLBACK_VELOCITY: i32 = 64;

const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// One event line of a converted song, in song-source field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SongLine {
    /// MIDI channel, 0-15
    pub channel: u8,
    /// Program at note start
    pub program: i32,
    /// Note number, or -1 for a controller-only line
    pub note: i32,
    /// Note-on velocity
    pub velocity: i32,
    /// Start position in 64th notes
    pub start_div: i64,
    /// End position in 64th notes
    pub end_div: i64,
    /// Pan (CC10)
    pub pan: i32,
    /// Signed pitch bend, -8192..=8191
    pub pitch_bend: i32,
    /// Channel volume (CC7)
    pub volume: i32,
    /// Volume envelope slot (CC74), -1 when unset
    pub volume_env: i32,
    /// Vibrato envelope slot (CC75), -1 when unset
    pub vibrato_env: i32,
    /// Slide kit (CC76), -1 when unset
    pub slide_env: i32,
}

impl fmt::Display for SongLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            self.channel,
            self.program,
            self.note,
            self.velocity,
            self.start_div,
            self.end_div,
            self.pan,
            self.pitch_bend,
            self.volume,
            self.volume_env,
            self.vibrato_env,
            self.slide_env
        )
    }
}

/// Result of converting a MIDI file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedSong {
    /// Tempo from the first tempo change, rounded down
    pub bpm: u32,
    /// Unique lines ordered by start position
    pub lines: Vec<SongLine>,
}

impl ConvertedSong {
    /// Render as song source text.
    pub fn to_song_text(&self) -> String {
        let mut text = format!("BPM:{}\n", self.bpm);
        for line in &self.lines {
            text.push_str(&line.to_string());
            text.push('\n');
        }
        text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChannelControls {
    program: i32,
    pan: i32,
    pitch_bend: i32,
    volume: i32,
    volume_env: i32,
    vibrato_env: i32,
    slide_env: i32,
}

impl Default for ChannelControls {
    fn default() -> Self {
        Self {
            program: 0,
            pan: DEFAULT_PAN,
            pitch_bend: 0,
            volume: DEFAULT_CHANNEL_VOLUME,
            volume_env: 0,
            vibrato_env: 0,
            slide_env: 0,
        }
    }
}

fn envelope_selector(value: i32) -> i32 {
    if value == 0 {
        UNASSIGNED_ENVELOPE
    } else {
        value
    }
}

impl ChannelControls {
    fn line(
        &self,
        channel: u8,
        note: i32,
        velocity: i32,
        start_div: i64,
        end_div: i64,
    ) -> SongLine {
        SongLine {
            channel,
            program: self.program,
            note,
            velocity,
            start_div,
            end_div,
            pan: self.pan,
            pitch_bend: self.pitch_bend,
            volume: self.volume,
            volume_env: envelope_selector(self.volume_env),
            vibrato_env: envelope_selector(self.vibrato_env),
            slide_env: envelope_selector(self.slide_env),
        }
    }
}

fn start_div(tick: u64, ticks_per_div: f64) -> i64 {
    (tick as f64 / ticks_per_div).round_ties_even() as i64
}

fn end_div(tick: u64, ticks_per_div: f64) -> i64 {
    (tick as f64 / ticks_per_div).ceil() as i64
}

#[derive(Debug, Clone, Copy)]
struct HeldNote {
    channel: u8,
    key: u8,
    velocity: i32,
    start_div: i64,
    controls: ChannelControls,
}

struct Converter {
    ticks_per_div: f64,
    controls: [ChannelControls; CHANNEL_COUNT],
    emitted: [ChannelControls; CHANNEL_COUNT],
    // in note-on order
    held: Vec<HeldNote>,
    lines: Vec<SongLine>,
}

impl Converter {
    fn new(ticks_per_div: f64) -> Self {
        Self {
            ticks_per_div,
            controls: [ChannelControls::default(); CHANNEL_COUNT],
            emitted: [ChannelControls::default(); CHANNEL_COUNT],
            held: Vec::new(),
            lines: Vec::new(),
        }
    }

    fn handle(&mut self, channel: u8, message: MidiMessage, tick: u64) {
        let controls = &mut self.controls[usize::from(channel)];
        match message {
            MidiMessage::ProgramChange { program } => controls.program = program.as_int().into(),
            MidiMessage::Controller { controller, value } => {
                let value = i32::from(value.as_int());
                match controller.as_int() {
                    CC_PAN => controls.pan = value,
                    CC_VOLUME => controls.volume = value,
                    CC_VOLUME_ENV => controls.volume_env = value,
                    CC_VIBRATO_ENV => controls.vibrato_env = value,
                    CC_SLIDE_ENV => controls.slide_env = value,
                    _ => {}
                }
            }
            MidiMessage::PitchBend { bend } => controls.pitch_bend = bend.as_int().into(),
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                let note = HeldNote {
                    channel,
                    key: key.as_int(),
                    velocity: vel.as_int().into(),
                    start_div: start_div(tick, self.ticks_per_div),
                    controls: *controls,
                };
                match self
                    .held
                    .iter_mut()
                    .find(|h| h.channel == channel && h.key == note.key)
                {
                    Some(held) => *held = note,
                    None => self.held.push(note),
                }
            }
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                let key = key.as_int();
                let Some(index) = self
                    .held
                    .iter()
                    .position(|h| h.channel == channel && h.key == key)
                else {
                    return;
                };
                let note = self.held.remove(index);
                let end_div = end_div(tick, self.ticks_per_div);
                self.lines.push(note.controls.line(
                    channel,
                    i32::from(key),
                    note.velocity,
                    note.start_div,
                    end_div,
                ));
            }
            _ => {}
        }
    }

    /// Velocity for a controller-only line: a held note on the channel,
    /// else the channel's most recent finished note.
    fn controller_velocity(&self, channel: u8) -> i32 {
        self.held
            .iter()
            .find(|h| h.channel == channel)
            .map(|h| h.velocity)
            .or_else(|| {
                self.lines
                    .iter()
                    .rev()
                    .find(|l| l.channel == channel && l.note != CONTROLLER_NOTE)
                    .map(|l| l.velocity)
            })
            .unwrap_or(FALLBACK_VELOCITY)
    }

    fn emit_controller_changes(&mut self, tick: u64) {
        for channel in 0..CHANNEL_COUNT {
            if self.controls[channel] == self.emitted[channel] {
                continue;
            }
            // CHANNEL_COUNT fits in u8
            let id = channel as u8;
            let start_div = start_div(tick, self.ticks_per_div);
            let velocity = self.controller_velocity(id);
            let line =
                self.controls[channel].line(id, CONTROLLER_NOTE, velocity, start_div, start_div);
            self.lines.push(line);
            self.emitted[channel] = self.controls[channel];
        }
    }

    fn finish(mut self, bpm: u32) -> ConvertedSong {
        if !self.held.is_empty() {
            log::debug!("{} notes never released, dropped", self.held.len());
        }
        self.lines.sort_by_key(|l| l.start_div);
        let mut seen = HashSet::new();
        self.lines.retain(|line| seen.insert(*line));
        ConvertedSong {
            bpm,
            lines: self.lines,
        }
    }
}

fn first_tempo(smf: &Smf) -> u32 {
    smf.tracks
        .iter()
        .flatten()
        .find_map(|event| match event.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(micros)) if micros.as_int() > 0 => {
                Some((MICROS_PER_MINUTE / f64::from(micros.as_int())).floor() as u32)
            }
            _ => None,
        })
        .unwrap_or(DEFAULT_BPM)
}

/// Convert a Standard MIDI file to song lines.
///
/// # Errors
/// Returns [`SequencerError::Midi`] when the file cannot be decoded or uses
/// timecode (SMPTE) timing.
pub fn convert_midi(bytes: &[u8]) -> Result<ConvertedSong> {
    let smf = Smf::parse(bytes).map_err(|e| SequencerError::Midi(e.to_string()))?;
    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(tpb) if tpb.as_int() > 0 => tpb.as_int(),
        Timing::Metrical(_) => {
            return Err(SequencerError::Midi("zero ticks per beat".into()));
        }
        Timing::Timecode(..) => {
            return Err(SequencerError::Midi("timecode timing is not supported".into()));
        }
    };
    let bpm = first_tempo(&smf);

    let mut converter = Converter::new(f64::from(ticks_per_beat) / f64::from(TICKS_PER_BEAT));
    for track in &smf.tracks {
        // positions restart for every track
        let mut tick = 0u64;
        for event in track {
            tick += u64::from(event.delta.as_int());
            if let TrackEventKind::Midi { channel, message } = event.kind {
                converter.handle(channel.as_int(), message, tick);
            }
            converter.emit_controller_changes(tick);
        }
    }

    let song = converter.finish(bpm);
    log::info!("Converted {} unique events at {} BPM", song.lines.len(), song.bpm);
    Ok(song)
}

/// Convert the MIDI file at `input` and write the song source to `output`.
pub fn convert_midi_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
) -> Result<ConvertedSong> {
    let bytes = std::fs::read(input.as_ref())?;
    let song = convert_midi(&bytes)?;
    std::fs::write(output.as_ref(), song.to_song_text())?;
    log::debug!(
        "Wrote {} -> {}",
        input.as_ref().display(),
        output.as_ref().display()
    );
    Ok(song)
}
