#![cfg(feature = "midi")]

use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use psg_sequencer::{
    convert_midi, parse_song, DriverCommand, Engine, EngineConfig, EnvelopeBank, EventKind,
    MalformedLinePolicy, RecordingDriver,
};

fn event(delta: u32, kind: TrackEventKind<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::from(delta),
        kind,
    }
}

fn midi(channel: u8, message: MidiMessage) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: u4::from(channel),
        message,
    }
}

fn note(key: u8, vel: u8) -> MidiMessage {
    MidiMessage::NoteOn {
        key: u7::from(key),
        vel: u7::from(vel),
    }
}

/// Two-track file at 150 BPM, 96 ticks per beat (6 ticks per 64th note).
fn two_track_file() -> Vec<u8> {
    let tempo = vec![
        event(0, TrackEventKind::Meta(MetaMessage::Tempo(u24::from(400_000)))),
        event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
    ];
    let lead = vec![
        event(
            0,
            midi(
                1,
                MidiMessage::Controller {
                    controller: u7::from(74),
                    value: u7::from(2),
                },
            ),
        ),
        event(0, midi(1, note(60, 100))),
        event(96, midi(1, note(60, 0))),
        event(0, midi(1, note(64, 80))),
        event(48, midi(1, note(64, 0))),
        event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
    ];
    let smf = Smf {
        header: Header {
            format: Format::Parallel,
            timing: Timing::Metrical(u15::from(96)),
        },
        tracks: vec![tempo, lead],
    };
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes).unwrap();
    bytes
}

#[test]
fn converted_song_loads_and_plays() {
    let text = convert_midi(&two_track_file()).unwrap().to_song_text();
    assert!(text.starts_with("BPM:150\n"));

    let song = parse_song(&text, MalformedLinePolicy::Abort).unwrap();
    assert_eq!(song.bpm, 150);
    let kinds: Vec<_> = song.events.iter().map(|e| (e.kind, e.start_div, e.end_div)).collect();
    assert_eq!(
        kinds,
        [
            (EventKind::Controller, 0, 0),
            (EventKind::Note(60), 0, 16),
            (EventKind::Note(64), 16, 24),
        ]
    );
    assert!(song.events.iter().all(|e| e.channel == 1));
    assert_eq!(song.events[1].volume_env.map(|s| s.index()), Some(1));
    assert_eq!(song.events[1].vibrato_env, None);

    let mut engine = Engine::new(
        song,
        EnvelopeBank::default(),
        EngineConfig::default(),
        RecordingDriver::default(),
    )
    .unwrap();
    for _ in 0..60 {
        engine.tick();
    }
    let note_ons = engine
        .driver()
        .commands_for(1)
        .filter(|c| matches!(c, DriverCommand::NoteOn { .. }))
        .count();
    assert_eq!(note_ons, 2);
}
