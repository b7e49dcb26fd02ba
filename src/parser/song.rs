//! Song source decoder
//!
//! ```text
//! BPM:120
//! channel,program,note,velocity,startDiv,endDiv,pan,pitchBend,volume,volEnv,vibEnv,slideEnv
//! ```
//!
//! Note numbers 0 and 1 are loop start/end markers and never become events;
//! -1 is a controller-only update.
//!
//! Each field is read up to the end of its leading integer, so `12.5` is 12
//! and `0 ;lead` is 0. A field with no leading integer makes the line
//! malformed. Lines addressing a channel or note number that does not exist
//! are dropped with a warning under every policy.

use csv::{ReaderBuilder, StringRecord, Trim};

use super::int_prefix;
use crate::config::MalformedLinePolicy;
use crate::constants::{CHANNEL_COUNT, DEFAULT_BPM, ENVELOPE_SLOTS};
use crate::envelope::EnvelopeSlot;
use crate::song::{EventKind, NoteEvent, Song};
use crate::{Result, SequencerError};

const BPM_PREFIX: &str = "BPM:";
const FIELD_COUNT: usize = 12;

const LOOP_START_NOTE: i32 = 0;
const LOOP_END_NOTE: i32 = 1;
const CONTROLLER_NOTE: i32 = -1;

/// One decoded body line.
enum Line {
    Event(NoteEvent),
    LoopStart(i32),
    LoopEnd(i32),
    Ignored(String),
}

fn level(value: i32) -> u8 {
    value.clamp(0, 127) as u8
}

fn envelope_field(raw: i32, name: &str, line: u64) -> Option<EnvelopeSlot> {
    if raw > ENVELOPE_SLOTS as i32 {
        log::debug!("line {line}: {name} envelope {raw} has no slot, ignored");
    }
    EnvelopeSlot::from_raw(raw)
}

fn decode_record(record: &StringRecord, line: u64) -> std::result::Result<Line, String> {
    if record.len() != FIELD_COUNT {
        return Err(format!(
            "expected {FIELD_COUNT} fields, found {}",
            record.len()
        ));
    }

    let mut fields = [0i32; FIELD_COUNT];
    for (i, (dst, text)) in fields.iter_mut().zip(record.iter()).enumerate() {
        *dst = int_prefix(text)
            .ok_or_else(|| format!("field {} is not an integer: {text:?}", i + 1))?;
    }
    let [channel, program, note, velocity, start_div, end_div, pan, pitch_bend, volume, vol_env, vib_env, slide_env] =
        fields;

    let Some(channel) = usize::try_from(channel).ok().filter(|c| *c < CHANNEL_COUNT) else {
        return Ok(Line::Ignored(format!("channel {channel} out of range 0-15")));
    };

    let kind = match note {
        LOOP_START_NOTE => return Ok(Line::LoopStart(start_div)),
        LOOP_END_NOTE => return Ok(Line::LoopEnd(start_div)),
        CONTROLLER_NOTE => EventKind::Controller,
        2..=127 => EventKind::Note(note as u8),
        other => return Ok(Line::Ignored(format!("note number {other} out of range"))),
    };

    Ok(Line::Event(NoteEvent {
        channel,
        program: level(program),
        kind,
        velocity: level(velocity),
        start_div,
        end_div,
        pan: level(pan),
        pitch_bend,
        channel_volume: level(volume),
        volume_env: envelope_field(vol_env, "volume", line),
        vibrato_env: envelope_field(vib_env, "vibrato", line),
        slide_env: envelope_field(slide_env, "slide", line),
    }))
}

fn parse_header(header: &str) -> Result<Option<u32>> {
    let header = header.trim_start_matches('\u{feff}').trim_end();
    let Some(value) = header.strip_prefix(BPM_PREFIX) else {
        return Ok(None);
    };
    match int_prefix(value) {
        Some(bpm) if bpm > 0 => Ok(Some(bpm as u32)),
        _ => Err(SequencerError::parse(1, format!("invalid tempo {value:?}"))),
    }
}

/// Decode a song source.
///
/// # Errors
/// A non-positive or non-numeric tempo is always an error. Lines with the
/// wrong field count or a field that is not a number are errors under
/// [`MalformedLinePolicy::Abort`] and skipped with a warning under
/// [`MalformedLinePolicy::Skip`].
pub fn parse_song(text: &str, policy: MalformedLinePolicy) -> Result<Song> {
    let mut song = Song::empty();
    if text.is_empty() {
        return Ok(song);
    }

    let (header, body) = text.split_once('\n').unwrap_or((text, ""));
    match parse_header(header)? {
        Some(bpm) => song.bpm = bpm,
        None => log::warn!(
            "first line {:?} is not a BPM header, discarded; using {DEFAULT_BPM} BPM",
            header.trim_end()
        ),
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(body.as_bytes());

    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        // body lines start on line 2
        let line = record.position().map_or(0, |p| p.line()) + 1;
        if record.iter().all(str::is_empty) {
            continue;
        }

        match decode_record(&record, line) {
            Ok(Line::Event(event)) => song.events.push(event),
            Ok(Line::LoopStart(div)) => {
                song.loop_start_div.get_or_insert(div);
            }
            Ok(Line::LoopEnd(div)) => {
                song.loop_end_div.get_or_insert(div);
            }
            Ok(Line::Ignored(reason)) => {
                log::warn!("line {line}: {reason}, ignored");
                skipped += 1;
            }
            Err(message) => match policy {
                MalformedLinePolicy::Abort => return Err(SequencerError::parse(line, message)),
                MalformedLinePolicy::Skip => {
                    log::warn!("line {line}: {message}, skipped");
                    skipped += 1;
                }
            },
        }
    }

    log::info!(
        "Loaded {} events at {} BPM ({} lines skipped)",
        song.events.len(),
        song.bpm,
        skipped
    );
    Ok(song)
}
