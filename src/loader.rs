//! Loading songs and envelope tables from a song directory.
//!
//! A song directory holds `song.txt` (or `demoSong.txt` as a fallback) and
//! `envelopes.txt`. Missing files are not fatal: playback starts with an
//! empty song or the built-in envelopes and a warning is logged.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::{EngineConfig, MalformedLinePolicy};
use crate::driver::ChannelDriver;
use crate::engine::Engine;
use crate::envelope::EnvelopeBank;
use crate::parser::{parse_envelopes, parse_song};
use crate::song::Song;
use crate::Result;

/// Preferred song file name.
pub const SONG_FILE: &str = "song.txt";
/// Song file used when [`SONG_FILE`] is absent.
pub const DEMO_SONG_FILE: &str = "demoSong.txt";
/// Envelope definition file name.
pub const ENVELOPE_FILE: &str = "envelopes.txt";

/// Pick the song file to play from `dir`.
pub fn resolve_song_path<P: AsRef<Path>>(dir: P) -> PathBuf {
    let dir = dir.as_ref();
    let song = dir.join(SONG_FILE);
    if song.is_file() {
        song
    } else {
        dir.join(DEMO_SONG_FILE)
    }
}

/// Read `path` as text, mapping a missing file to `None`.
fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Load and decode a song file. A missing file yields an empty song.
pub fn load_song_file<P: AsRef<Path>>(path: P, policy: MalformedLinePolicy) -> Result<Song> {
    let path = path.as_ref();
    match read_optional(path)? {
        Some(text) => {
            log::info!("Loading song {}", path.display());
            parse_song(&text, policy)
        }
        None => {
            log::warn!("Song file {} not found, playing nothing", path.display());
            Ok(Song::empty())
        }
    }
}

/// Load and decode an envelope file. A missing file yields the built-in
/// envelopes.
pub fn load_envelope_file<P: AsRef<Path>>(path: P) -> Result<EnvelopeBank> {
    let path = path.as_ref();
    match read_optional(path)? {
        Some(text) => Ok(parse_envelopes(&text)),
        None => {
            log::warn!(
                "Envelope file {} not found, using built-in envelopes",
                path.display()
            );
            Ok(EnvelopeBank::default())
        }
    }
}

/// Load the song and envelopes in `dir` and build an engine around `driver`.
pub fn load_engine<P: AsRef<Path>, D: ChannelDriver>(
    dir: P,
    config: EngineConfig,
    driver: D,
) -> Result<Engine<D>> {
    let dir = dir.as_ref();
    let song = load_song_file(resolve_song_path(dir), config.malformed_lines)?;
    let envelopes = load_envelope_file(dir.join(ENVELOPE_FILE))?;
    Engine::new(song, envelopes, config, driver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::NullDriver;

    const SONG: &str = "BPM:100\n0,0,60,100,0,16,64,0,100,1,0,0\n";

    #[test]
    fn prefers_song_over_demo() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_song_path(dir.path()), dir.path().join(DEMO_SONG_FILE));

        fs::write(dir.path().join(SONG_FILE), SONG).unwrap();
        assert_eq!(resolve_song_path(dir.path()), dir.path().join(SONG_FILE));
    }

    #[test]
    fn missing_files_degrade_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let song = load_song_file(dir.path().join(SONG_FILE), MalformedLinePolicy::Abort).unwrap();
        assert_eq!(song, Song::empty());
        let bank = load_envelope_file(dir.path().join(ENVELOPE_FILE)).unwrap();
        assert_eq!(bank, EnvelopeBank::default());
    }

    #[test]
    fn reading_a_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_song_file(dir.path(), MalformedLinePolicy::Abort).is_err());
    }

    #[test]
    fn loads_demo_song_with_envelopes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DEMO_SONG_FILE), SONG).unwrap();
        fs::write(dir.path().join(ENVELOPE_FILE), "Volume_Env1: 0,2,80,6\n").unwrap();

        let engine = load_engine(dir.path(), EngineConfig::default(), NullDriver).unwrap();
        assert_eq!(engine.bpm(), 100);
        assert_eq!(engine.events().len(), 1);
        let slot = engine.events()[0].event().volume_env.unwrap();
        assert_eq!(engine.envelopes().volume(slot).sustain, 80);
    }
}
