use approx::assert_relative_eq;
use psg_sequencer::{
    note_to_frequency, parse_envelopes, parse_song, DriverCommand, Engine, EngineConfig,
    EnvelopeBank, MalformedLinePolicy, RecordingDriver, Voice,
};

fn engine(song: &str, envelopes: &str) -> Engine<RecordingDriver> {
    let song = parse_song(song, MalformedLinePolicy::Abort).unwrap();
    let envelopes = if envelopes.is_empty() {
        EnvelopeBank::default()
    } else {
        parse_envelopes(envelopes)
    };
    Engine::new(song, envelopes, EngineConfig::default(), RecordingDriver::default()).unwrap()
}

/// Tick `count` times and return the commands issued on each tick, indexed
/// by frame number (entry 0 is unused).
fn run(engine: &mut Engine<RecordingDriver>, count: usize) -> Vec<Vec<DriverCommand>> {
    let mut frames = vec![Vec::new()];
    for _ in 0..count {
        engine.tick();
        frames.push(engine.driver_mut().take());
    }
    frames
}

fn volumes(commands: &[DriverCommand]) -> Vec<u8> {
    commands
        .iter()
        .filter_map(|c| match c {
            DriverCommand::SetVolume { volume, .. } => Some(*volume),
            _ => None,
        })
        .collect()
}

fn frequencies(frames: &[Vec<DriverCommand>]) -> Vec<f32> {
    frames
        .iter()
        .flatten()
        .filter_map(|c| match c {
            DriverCommand::SetFrequency { frequency_hz, .. } => Some(*frequency_hz),
            _ => None,
        })
        .collect()
}

#[test]
fn single_note_plays_for_sixteen_ticks() {
    let mut engine = engine("BPM:120\n0,0,60,100,0,16,64,0,100,0,0,0\n", "");
    assert_relative_eq!(engine.frames_per_tick(), 1.8665625, epsilon = 1e-9);
    assert_eq!(engine.events()[0].end_frame(), 30);

    let frames = run(&mut engine, 40);
    match frames[1].as_slice() {
        [DriverCommand::NoteOn {
            channel: 0,
            voice: Voice::Tone { duty: 0 },
            frequency_hz,
            volume: 39,
            pan: 64,
        }] => assert_relative_eq!(*frequency_hz, note_to_frequency(60, 0)),
        other => panic!("unexpected first frame: {other:?}"),
    }

    // volume stays at 39: nothing else is sent until the kill
    for (frame, commands) in frames.iter().enumerate().skip(2) {
        if frame == 30 {
            assert_eq!(commands, &[DriverCommand::Kill { channel: 0 }]);
        } else {
            assert!(commands.is_empty(), "frame {frame}: {commands:?}");
        }
    }
    assert!(!engine.channel(0).unwrap().is_active());
}

#[test]
fn adsr_shapes_volume_and_kills_after_release() {
    let mut engine = engine(
        "BPM:120\n0,0,60,127,0,16,64,0,127,1,0,0\n",
        "Volume_Env1: 0,4,64,4\n",
    );
    let frames = run(&mut engine, 40);

    assert!(matches!(
        frames[1].as_slice(),
        [DriverCommand::NoteOn { volume: 64, .. }, DriverCommand::SetVolume { volume: 64, .. }]
    ));
    for frame in 5..30 {
        assert_eq!(volumes(&frames[frame]), vec![32], "frame {frame}");
    }

    let all: Vec<u8> = frames.iter().flat_map(|f| volumes(f)).collect();
    assert!(all.windows(2).all(|w| w[1] <= w[0]));

    let kills: Vec<usize> = frames
        .iter()
        .enumerate()
        .filter(|(_, f)| f.contains(&DriverCommand::Kill { channel: 0 }))
        .map(|(frame, _)| frame)
        .collect();
    assert_eq!(kills, vec![33]);
    assert!(frames[34..].iter().all(Vec::is_empty));
}

#[test]
fn upper_channels_play_noise() {
    let mut engine = engine(
        "BPM:120\n14,3,40,100,0,4,64,0,127,0,0,0\n13,3,40,100,0,4,64,0,127,0,0,0\n",
        "",
    );
    let frames = run(&mut engine, 1);
    assert!(matches!(
        frames[1].as_slice(),
        [
            DriverCommand::NoteOn {
                channel: 14,
                voice: Voice::Noise,
                ..
            },
            DriverCommand::NoteOn {
                channel: 13,
                voice: Voice::Tone { duty: 3 },
                ..
            }
        ]
    ));
}

#[test]
fn vibrato_waits_then_stays_around_base() {
    let mut engine = engine(
        "BPM:120\n0,0,57,100,0,64,64,0,127,0,1,0\n",
        "Pitch_Env1: 2,8,50.0,4\n",
    );
    let frames = run(&mut engine, 100);
    assert!(frequencies(&frames[..2]).is_empty());

    let base = note_to_frequency(57, 0);
    assert_relative_eq!(base, 1760.0, epsilon = 1e-2);
    let modulated = frequencies(&frames[2..]);
    assert!(modulated.len() > 90);
    for freq in modulated {
        assert!((base - 50.01..=base + 50.01).contains(&freq), "{freq}");
    }
}

#[test]
fn slide_glides_from_start_to_end_note() {
    let mut engine = engine(
        "BPM:120\n0,0,60,100,0,64,64,0,127,0,0,1\n",
        "Slide_Env: 1, 60, 48, 72, 8\n",
    );
    let frames = run(&mut engine, 40);
    let glide = frequencies(&frames);

    assert_relative_eq!(glide[0], note_to_frequency(48, 0));
    assert_relative_eq!(*glide.last().unwrap(), note_to_frequency(72, 0));
    assert!(glide.windows(2).all(|w| w[1] >= w[0]));
    assert!(!engine.channel(0).unwrap().slide_state().is_active());
}

#[test]
fn controller_event_updates_pan_without_retrigger() {
    let mut engine = engine(
        "BPM:120\n2,0,60,100,0,32,64,0,100,0,0,0\n2,0,-1,0,8,8,10,0,100,0,0,0\n",
        "",
    );
    let frames = run(&mut engine, 20);
    assert_eq!(
        frames[15],
        vec![
            DriverCommand::SetPan { channel: 2, pan: 10 },
            DriverCommand::SetVolume {
                channel: 2,
                volume: 39
            },
        ]
    );
    let channel = engine.channel(2).unwrap();
    assert!(channel.is_active());
    assert_eq!(channel.pan(), 10);
    assert_eq!(channel.note(), 60);
}
