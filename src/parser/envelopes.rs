//! Envelope-definition source decoder
//!
//! Three label families can appear anywhere on a line:
//!
//! ```text
//! Volume_Env<1-16>: attack,decay,sustain,release
//! Pitch_Env<1-16>: delay,rate,depth,ramp
//! Slide_Env: kit(1-16),trigger(-1|0-127),start,end,duration
//! ```
//!
//! Lines are applied in file order, so a later definition for the same slot
//! (or the same kit and trigger) replaces an earlier one.

use super::{int_prefix, label_index, leading_float, leading_int};
use crate::constants::TRIGGER_NOTES;
use crate::envelope::{EnvelopeBank, EnvelopeSlot, PitchEnvelope, VolumeEnvelope};

const VOLUME_LABEL: &str = "Volume_Env";
const PITCH_LABEL: &str = "Pitch_Env";
const SLIDE_LABEL: &str = "Slide_Env";

/// Trigger value that applies a slide to every note of a kit.
const WILDCARD_TRIGGER: i32 = -1;

/// Split a line at `label` into the text between the label and the first
/// following colon, and the text after that colon.
fn split_label<'a>(line: &'a str, label: &str) -> Option<(&'a str, &'a str)> {
    let start = line.find(label)? + label.len();
    let rest = &line[start..];
    let colon = rest.find(':')?;
    Some((&rest[..colon], rest[colon + 1..].trim()))
}

fn value_fields(values: &str) -> impl Iterator<Item = &str> {
    values.split_terminator(',').map(str::trim)
}

fn labelled_slot(index_text: &str) -> Option<EnvelopeSlot> {
    let index = label_index(index_text)?;
    EnvelopeSlot::new(index.checked_sub(1)?)
}

fn apply_volume(bank: &mut EnvelopeBank, index_text: &str, values: &str) -> bool {
    let Some(slot) = labelled_slot(index_text) else {
        return false;
    };
    let mut parsed = [0i32; 4];
    for (dst, field) in parsed.iter_mut().zip(value_fields(values)) {
        *dst = leading_int(field);
    }
    let [attack, decay, sustain, release] = parsed;
    bank.set_volume(
        slot,
        VolumeEnvelope {
            attack,
            decay,
            sustain,
            release,
        },
    );
    true
}

fn apply_pitch(bank: &mut EnvelopeBank, index_text: &str, values: &str) -> bool {
    let Some(slot) = labelled_slot(index_text) else {
        return false;
    };
    let mut fields = value_fields(values);
    let delay = fields.next().map(leading_int).unwrap_or(0);
    let rate = fields.next().and_then(int_prefix).unwrap_or(1);
    let depth = fields.next().map(leading_float).unwrap_or(0.0);
    let ramp = fields.next().map(leading_int).unwrap_or(0);
    bank.set_pitch(
        slot,
        PitchEnvelope {
            delay,
            rate,
            depth,
            ramp,
        },
    );
    true
}

fn apply_slide(bank: &mut EnvelopeBank, values: &str) -> bool {
    let mut parsed = [0i32; 5];
    for (dst, field) in parsed.iter_mut().zip(value_fields(values)) {
        *dst = leading_int(field);
    }
    let [kit, trigger, start, end, duration] = parsed;

    let Some(slot) = kit
        .checked_sub(1)
        .and_then(|i| usize::try_from(i).ok())
        .and_then(EnvelopeSlot::new)
    else {
        return false;
    };

    let kit = bank.slide_kit_mut(slot);
    if trigger == WILDCARD_TRIGGER {
        kit.set_wildcard(start, end, duration);
        return true;
    }
    match usize::try_from(trigger) {
        Ok(note) if note < TRIGGER_NOTES => {
            kit.set_absolute(note, start, end, duration);
            true
        }
        _ => false,
    }
}

/// Decode an envelope-definition source. Never fails: lines that do not
/// address a valid slot are ignored and untouched slots keep their defaults.
pub fn parse_envelopes(text: &str) -> EnvelopeBank {
    let mut bank = EnvelopeBank::default();
    let (mut volumes, mut pitches, mut slides) = (0usize, 0usize, 0usize);

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some((index, values)) = split_label(line, VOLUME_LABEL) {
            if apply_volume(&mut bank, index, values) {
                volumes += 1;
            }
        }
        if let Some((index, values)) = split_label(line, PITCH_LABEL) {
            if apply_pitch(&mut bank, index, values) {
                pitches += 1;
            }
        }
        if let Some((_, values)) = split_label(line, SLIDE_LABEL) {
            if apply_slide(&mut bank, values) {
                slides += 1;
            }
        }
    }

    log::info!("Loaded {volumes} volume envelopes");
    log::info!("Loaded {pitches} pitch envelopes");
    log::info!("Loaded {slides} slide definitions");
    bank
}
