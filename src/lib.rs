//! Frame-clocked PSG song sequencer
//!
//! Replays a multi-channel song of note events against sixteen monophonic
//! channels, shaping each note with a volume ADSR envelope, a delayed
//! sinusoidal vibrato and a linear pitch slide. The engine runs once per
//! tick of an external fixed-rate clock (the Nintendo DS vertical blank,
//! 59.73 Hz, by default) and pushes note-on, frequency, volume and pan
//! changes to a [`ChannelDriver`].
//!
//! # Features
//! - Song and envelope-definition text decoders
//! - Tempo to frame timing conversion
//! - Per-channel ADSR, vibrato and slide engines
//! - Loop markers with seamless frame wrap
//! - JSON engine configuration
//! - Standard MIDI file to song source converter
//! - Recording and logging driver doubles
//!
//! # Crate feature flags
//! - `cli` (default): headless `psg-sequencer` host binary (enables `env_logger`)
//! - `midi` (default): MIDI file converter in [`convert`] (enables `midly`)
//!
//! # Quick start
//! ```no_run
//! use psg_sequencer::{load_engine, EngineConfig, LoggingDriver};
//!
//! let mut engine = load_engine("songs/demo", EngineConfig::default(), LoggingDriver)?;
//! loop {
//!     engine.tick();
//!     // wait for the next vertical blank
//! }
//! # Ok::<(), psg_sequencer::SequencerError>(())
//! ```

#![warn(missing_docs)]

pub mod channel; // Per-channel runtime state
pub mod config; // Engine configuration
pub mod constants; // Hardware and format constants
#[cfg(feature = "midi")]
pub mod convert; // MIDI file to song source
pub mod driver; // Channel driver capability
pub mod engine; // Scheduler and loop controller
pub mod envelope; // Envelope tables and engines
pub mod error; // Error types
pub mod frequency; // Note to Hz
pub mod loader; // Song directory loading
pub mod parser; // Text decoders
pub mod song; // Decoded song data
pub mod timing; // Tick to frame conversion

pub use error::{Result, SequencerError};

// Public API exports
pub use channel::Channel;
pub use config::{EngineConfig, EventMatching, MalformedLinePolicy};
#[cfg(feature = "midi")]
pub use convert::{convert_midi, convert_midi_file, ConvertedSong, SongLine};
pub use driver::{ChannelDriver, DriverCommand, LoggingDriver, NullDriver, RecordingDriver, Voice};
pub use engine::{Engine, LoopWindow, ScheduledEvent, TickResult};
pub use envelope::{
    EnvelopeBank, EnvelopeSlot, PitchEnvelope, SlideEntry, SlideKit, SlideMode, VibratoPhase,
    VolumeEnvelope, VolumePhase,
};
pub use frequency::{note_to_frequency, Tuning};
pub use loader::{load_engine, load_envelope_file, load_song_file, resolve_song_path};
pub use parser::{parse_envelopes, parse_song};
pub use song::{EventKind, NoteEvent, Song};
pub use timing::FrameTiming;
