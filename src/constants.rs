//! Sequencer constants
//!
//! Fixed sizes and numeric limits shared by the parser, the envelope
//! engines and the scheduler.

/// Number of monophonic channels driven by the engine.
pub const CHANNEL_COUNT: usize = 16;

/// First channel index that plays noise instead of a duty-cycle tone.
///
/// Channels 14 and 15 are noise generators on the target hardware.
pub const NOISE_CHANNEL_START: usize = 14;

/// Number of slots in each envelope definition table (1-based in source files).
pub const ENVELOPE_SLOTS: usize = 16;

/// Number of trigger notes in a slide kit.
pub const TRIGGER_NOTES: usize = 128;

/// Full-scale level for velocity, volume, pan and envelope amplitude.
pub const MAX_LEVEL: f32 = 127.0;

/// Default external tick rate in Hz (Nintendo DS vertical blank).
pub const DEFAULT_TICK_RATE_HZ: f64 = 59.73;

/// Default tempo used when a song has no `BPM:` header.
pub const DEFAULT_BPM: u32 = 120;

/// Number of 64th-note ticks per beat.
pub const TICKS_PER_BEAT: f64 = 16.0;

/// Default master volume multiplier applied at note-on.
pub const GLOBAL_VOLUME_MULTIPLIER: f32 = 0.5;

/// Default pitch bend range in semitones for a full ±8192 bend.
pub const PITCH_BEND_RANGE_SEMITONES: f32 = 12.0;

/// Pitch bend value that corresponds to the full bend range.
pub const PITCH_BEND_FULL_SCALE: f32 = 8192.0;

/// Default transposition applied to every note, in semitones.
pub const OCTAVE_SHIFT: i32 = 36;

/// Largest transposition a configuration may request, either direction.
pub const MAX_OCTAVE_SHIFT: i32 = 127;

/// Vibrato output is clamped to this range (Hz).
pub const VIBRATO_MIN_HZ: f32 = 20.0;
/// Upper bound of vibrato output (Hz).
pub const VIBRATO_MAX_HZ: f32 = 20_000.0;

/// Slide output is clamped to the 16-bit frequency register range (Hz).
pub const SLIDE_MAX_HZ: f32 = 65_535.0;

/// Initial note held by an idle channel.
pub const DEFAULT_NOTE: i32 = 60;

/// Initial pan (center).
pub const DEFAULT_PAN: i32 = 64;
