//! Per-channel runtime state
//!
//! Each of the sixteen channels keeps a snapshot of the controllers of the
//! last event that touched it and owns the runtime state of the three
//! envelope engines. The engine hands every due event to its channel and
//! then calls [`Channel::step`] once per tick.

use crate::config::EngineConfig;
use crate::constants::{DEFAULT_NOTE, DEFAULT_PAN, MAX_LEVEL};
use crate::driver::{ChannelDriver, Voice};
use crate::envelope::volume::scaled_volume;
use crate::envelope::{
    EnvelopeBank, EnvelopeOutcome, EnvelopeSlot, SlideState, VibratoState, VolumeEnvelopeState,
};
use crate::song::{EventKind, NoteEvent};
use crate::timing::FrameTiming;

/// Shared, read-only inputs for one tick.
pub(crate) struct TickContext<'a> {
    pub frame: i64,
    pub timing: &'a FrameTiming,
    pub config: &'a EngineConfig,
    pub envelopes: &'a EnvelopeBank,
}

/// Runtime state of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    active: bool,
    note: i32,
    pitch_bend: i32,
    pan: u8,
    channel_volume: u8,
    program: u8,
    base_volume: u8,
    volume_env: Option<EnvelopeSlot>,
    vibrato_env: Option<EnvelopeSlot>,
    slide_env: Option<EnvelopeSlot>,
    volume: VolumeEnvelopeState,
    vibrato: VibratoState,
    slide: SlideState,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            active: false,
            note: DEFAULT_NOTE,
            pitch_bend: 0,
            pan: DEFAULT_PAN as u8,
            channel_volume: MAX_LEVEL as u8,
            program: 0,
            base_volume: MAX_LEVEL as u8,
            volume_env: None,
            vibrato_env: None,
            slide_env: None,
            volume: VolumeEnvelopeState::default(),
            vibrato: VibratoState::default(),
            slide: SlideState::default(),
        }
    }
}

impl Channel {
    /// Whether a note is sounding.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Last played note.
    pub fn note(&self) -> i32 {
        self.note
    }

    /// Current pitch bend.
    pub fn pitch_bend(&self) -> i32 {
        self.pitch_bend
    }

    /// Current pan.
    pub fn pan(&self) -> u8 {
        self.pan
    }

    /// Current channel volume controller.
    pub fn channel_volume(&self) -> u8 {
        self.channel_volume
    }

    /// Current program.
    pub fn program(&self) -> u8 {
        self.program
    }

    /// Output volume of the last note-on, before enveloping.
    pub fn base_volume(&self) -> u8 {
        self.base_volume
    }

    /// Volume envelope slot in effect.
    pub fn volume_envelope(&self) -> Option<EnvelopeSlot> {
        self.volume_env
    }

    /// Vibrato envelope slot in effect.
    pub fn vibrato_envelope(&self) -> Option<EnvelopeSlot> {
        self.vibrato_env
    }

    /// Slide kit slot in effect.
    pub fn slide_envelope(&self) -> Option<EnvelopeSlot> {
        self.slide_env
    }

    /// ADSR runtime state.
    pub fn volume_state(&self) -> &VolumeEnvelopeState {
        &self.volume
    }

    /// Vibrato runtime state.
    pub fn vibrato_state(&self) -> &VibratoState {
        &self.vibrato
    }

    /// Slide runtime state.
    pub fn slide_state(&self) -> &SlideState {
        &self.slide
    }

    fn base_frequency(&self, config: &EngineConfig) -> f32 {
        config.tuning.frequency(self.note, self.pitch_bend)
    }

    /// Handle an event whose start position was reached.
    pub(crate) fn start_event<D: ChannelDriver>(
        &mut self,
        index: usize,
        event: &NoteEvent,
        ctx: &TickContext<'_>,
        driver: &mut D,
    ) {
        match event.kind {
            EventKind::Note(note) => self.note_on(index, note, event, ctx, driver),
            EventKind::Controller => {
                log::trace!("ch{index:02} controller update at frame {}", ctx.frame);
                self.pitch_bend = event.pitch_bend;
                self.pan = event.pan;
                self.channel_volume = event.channel_volume;
                self.program = event.program;
                self.volume_env = event.volume_env;
                self.vibrato_env = event.vibrato_env;
                self.slide_env = event.slide_env;
                driver.set_pan(index, self.pan);
                driver.set_volume(index, self.base_volume);
            }
        }
    }

    fn note_on<D: ChannelDriver>(
        &mut self,
        index: usize,
        note: u8,
        event: &NoteEvent,
        ctx: &TickContext<'_>,
        driver: &mut D,
    ) {
        let config = ctx.config;
        let volume = (event.velocity as f32 * event.channel_volume as f32 / MAX_LEVEL
            * config.global_volume)
            .round()
            .clamp(0.0, MAX_LEVEL) as u8;
        let frequency = config.tuning.frequency(note as i32, event.pitch_bend);
        let voice = if index >= config.noise_channel_start {
            Voice::Noise
        } else {
            Voice::Tone {
                duty: event.program,
            }
        };
        log::trace!("ch{index:02} note {note} at frame {}", ctx.frame);
        driver.note_on(index, voice, frequency, volume, event.pan);

        self.active = true;
        self.note = note as i32;
        self.pitch_bend = event.pitch_bend;
        self.pan = event.pan;
        self.channel_volume = event.channel_volume;
        self.program = event.program;
        self.base_volume = volume;
        self.volume_env = event.volume_env;
        self.vibrato_env = event.vibrato_env;
        self.slide_env = event.slide_env;

        if event.volume_env.is_some() {
            self.volume.trigger();
        }
        if event.vibrato_env.is_some() {
            self.vibrato.trigger();
        }
        if let Some(slot) = event.slide_env {
            if let Some(entry) = ctx.envelopes.slide_kit(slot).entry(note) {
                self.slide.start(entry, note as i32, ctx.frame);
            }
        }
    }

    /// Handle an event whose end position was reached.
    pub(crate) fn end_event<D: ChannelDriver>(
        &mut self,
        index: usize,
        event: &NoteEvent,
        ctx: &TickContext<'_>,
        driver: &mut D,
    ) {
        if event.kind == EventKind::Controller {
            return;
        }
        log::trace!("ch{index:02} note end at frame {}", ctx.frame);

        if event.volume_env.is_some() {
            self.volume.release();
        } else {
            driver.kill(index);
            self.active = false;
        }

        if event.vibrato_env.is_some() && self.vibrato.is_active() {
            self.vibrato.stop();
            if self.active {
                driver.set_frequency(index, self.base_frequency(ctx.config));
            }
        }
    }

    /// Run the volume, vibrato and slide engines for one tick.
    pub(crate) fn step<D: ChannelDriver>(
        &mut self,
        index: usize,
        ctx: &TickContext<'_>,
        driver: &mut D,
    ) {
        if !self.active {
            return;
        }

        if let Some(slot) = self.volume_env {
            match self.volume.advance(ctx.envelopes.volume(slot)) {
                EnvelopeOutcome::Finished => {
                    log::trace!("ch{index:02} release finished");
                    driver.kill(index);
                    self.active = false;
                    return;
                }
                EnvelopeOutcome::Level(amplitude) => {
                    driver.set_volume(index, scaled_volume(amplitude, self.base_volume));
                }
            }
        }

        if !self.slide.is_active() && self.vibrato.is_active() {
            if let Some(slot) = self.vibrato_env {
                let base = self.base_frequency(ctx.config);
                if let Some(frequency) = self.vibrato.advance(ctx.envelopes.pitch(slot), base) {
                    driver.set_frequency(index, frequency);
                }
            }
        }

        if self.slide.is_active() {
            let frequency = self.slide.advance_frequency(
                ctx.frame,
                ctx.timing,
                &ctx.config.tuning,
                self.pitch_bend,
            );
            driver.set_frequency(index, frequency);
        }
    }

    /// Drop any slide in progress.
    pub(crate) fn clear_slide(&mut self) {
        self.slide.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverCommand, RecordingDriver};
    use crate::envelope::VolumePhase;

    fn event(kind: EventKind) -> NoteEvent {
        NoteEvent {
            channel: 0,
            program: 2,
            kind,
            velocity: 127,
            start_div: 0,
            end_div: 16,
            pan: 30,
            pitch_bend: 0,
            channel_volume: 127,
            volume_env: None,
            vibrato_env: None,
            slide_env: None,
        }
    }

    struct Fixture {
        timing: FrameTiming,
        config: EngineConfig,
        envelopes: EnvelopeBank,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                timing: FrameTiming::new(120, 60.0).unwrap(),
                config: EngineConfig::default(),
                envelopes: EnvelopeBank::default(),
            }
        }

        fn ctx(&self, frame: i64) -> TickContext<'_> {
            TickContext {
                frame,
                timing: &self.timing,
                config: &self.config,
                envelopes: &self.envelopes,
            }
        }
    }

    #[test]
    fn defaults_match_power_on_state() {
        let channel = Channel::default();
        assert!(!channel.is_active());
        assert_eq!(channel.note(), 60);
        assert_eq!(channel.pan(), 64);
        assert_eq!(channel.channel_volume(), 127);
        assert_eq!(channel.base_volume(), 127);
        assert_eq!(channel.volume_envelope(), None);
    }

    #[test]
    fn note_on_scales_volume_and_picks_voice() {
        let fixture = Fixture::new();
        let mut driver = RecordingDriver::default();

        let mut tone = Channel::default();
        tone.start_event(3, &event(EventKind::Note(69)), &fixture.ctx(1), &mut driver);
        let mut noise = Channel::default();
        noise.start_event(14, &event(EventKind::Note(69)), &fixture.ctx(1), &mut driver);

        match driver.commands() {
            [DriverCommand::NoteOn {
                voice: Voice::Tone { duty: 2 },
                volume: 64,
                pan: 30,
                ..
            }, DriverCommand::NoteOn {
                voice: Voice::Noise,
                ..
            }] => {}
            other => panic!("unexpected commands: {other:?}"),
        }
        assert!(tone.is_active());
        assert_eq!(tone.base_volume(), 64);
        assert_eq!(tone.note(), 69);
    }

    #[test]
    fn controller_keeps_note_and_envelopes_running() {
        let fixture = Fixture::new();
        let mut driver = RecordingDriver::default();
        let mut channel = Channel::default();
        let mut note = event(EventKind::Note(60));
        note.volume_env = EnvelopeSlot::new(0);
        channel.start_event(0, &note, &fixture.ctx(1), &mut driver);
        channel.step(0, &fixture.ctx(1), &mut driver);
        driver.clear();

        let mut controller = event(EventKind::Controller);
        controller.pan = 100;
        controller.pitch_bend = 4096;
        controller.volume_env = EnvelopeSlot::new(0);
        channel.start_event(0, &controller, &fixture.ctx(2), &mut driver);

        assert_eq!(
            driver.commands(),
            &[
                DriverCommand::SetPan {
                    channel: 0,
                    pan: 100
                },
                DriverCommand::SetVolume {
                    channel: 0,
                    volume: 64
                },
            ]
        );
        assert_eq!(channel.note(), 60);
        assert_eq!(channel.pitch_bend(), 4096);
        assert_eq!(channel.volume_state().phase(), VolumePhase::Attack);
    }

    #[test]
    fn end_without_volume_envelope_kills() {
        let fixture = Fixture::new();
        let mut driver = RecordingDriver::default();
        let mut channel = Channel::default();
        let note = event(EventKind::Note(60));
        channel.start_event(5, &note, &fixture.ctx(1), &mut driver);
        channel.end_event(5, &note, &fixture.ctx(30), &mut driver);

        assert!(!channel.is_active());
        assert_eq!(
            driver.commands().last(),
            Some(&DriverCommand::Kill { channel: 5 })
        );
    }

    #[test]
    fn end_with_volume_envelope_releases_then_kills_once() {
        let fixture = Fixture::new();
        let mut driver = RecordingDriver::default();
        let mut channel = Channel::default();
        let mut note = event(EventKind::Note(60));
        note.volume_env = EnvelopeSlot::new(0);
        channel.start_event(0, &note, &fixture.ctx(1), &mut driver);
        for frame in 1..20 {
            channel.step(0, &fixture.ctx(frame), &mut driver);
        }
        channel.end_event(0, &note, &fixture.ctx(20), &mut driver);
        assert!(channel.is_active());
        assert_eq!(channel.volume_state().phase(), VolumePhase::Release);

        for frame in 20..80 {
            channel.step(0, &fixture.ctx(frame), &mut driver);
        }
        assert!(!channel.is_active());
        let kills = driver
            .commands()
            .iter()
            .filter(|c| matches!(c, DriverCommand::Kill { .. }))
            .count();
        assert_eq!(kills, 1);
    }

    #[test]
    fn end_stops_vibrato_and_restores_base_frequency() {
        let mut fixture = Fixture::new();
        let slot = EnvelopeSlot::new(1).unwrap();
        fixture.envelopes.set_pitch(
            slot,
            crate::envelope::PitchEnvelope {
                delay: 0,
                rate: 4,
                depth: 10.0,
                ramp: 0,
            },
        );
        let mut driver = RecordingDriver::default();
        let mut channel = Channel::default();
        let mut note = event(EventKind::Note(45));
        note.volume_env = EnvelopeSlot::new(0);
        note.vibrato_env = Some(slot);
        channel.start_event(0, &note, &fixture.ctx(1), &mut driver);
        channel.step(0, &fixture.ctx(1), &mut driver);
        assert!(channel.vibrato_state().is_active());

        driver.clear();
        channel.end_event(0, &note, &fixture.ctx(2), &mut driver);
        assert!(!channel.vibrato_state().is_active());
        assert_eq!(
            driver.commands(),
            &[DriverCommand::SetFrequency {
                channel: 0,
                frequency_hz: fixture.config.tuning.frequency(45, 0),
            }]
        );
    }

    #[test]
    fn active_slide_suppresses_vibrato() {
        let mut fixture = Fixture::new();
        let slot = EnvelopeSlot::new(0).unwrap();
        fixture.envelopes.set_pitch(
            slot,
            crate::envelope::PitchEnvelope {
                delay: 0,
                rate: 4,
                depth: 10.0,
                ramp: 0,
            },
        );
        fixture.envelopes.slide_kit_mut(slot).set_wildcard(0, 12, 8);
        let mut driver = RecordingDriver::default();
        let mut channel = Channel::default();
        let mut note = event(EventKind::Note(40));
        note.vibrato_env = Some(slot);
        note.slide_env = Some(slot);
        channel.start_event(0, &note, &fixture.ctx(1), &mut driver);
        driver.clear();

        channel.step(0, &fixture.ctx(1), &mut driver);
        assert_eq!(driver.commands().len(), 1);
        assert_eq!(channel.vibrato_state().current_depth(), 0.0);
        assert!(channel.slide_state().is_active());
    }
}
