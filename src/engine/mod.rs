//! Frame-clocked playback engine
//!
//! [`Engine`] owns the decoded song, the envelope tables, the sixteen
//! channels and the channel driver. The host calls [`Engine::tick`] once per
//! external clock tick; every tick:
//!
//! 1. advances the frame counter,
//! 2. dispatches due event starts and ends in song order,
//! 3. runs the volume, vibrato and slide engines of every active channel,
//! 4. wraps the frame counter at the loop end.
//!
//! # Example
//!
//! ```
//! use psg_sequencer::{
//!     parse_song, Engine, EngineConfig, EnvelopeBank, MalformedLinePolicy, RecordingDriver,
//! };
//!
//! let song = parse_song("BPM:120\n0,0,60,100,0,16,64,0,100,0,0,0\n", MalformedLinePolicy::Abort)?;
//! let mut engine = Engine::new(song, EnvelopeBank::default(), EngineConfig::default(), RecordingDriver::default())?;
//! for _ in 0..30 {
//!     engine.tick();
//! }
//! assert!(!engine.channel(0).unwrap().is_active());
//! # Ok::<(), psg_sequencer::SequencerError>(())
//! ```

pub mod looping;
pub mod scheduler;

use crate::channel::{Channel, TickContext};
use crate::config::EngineConfig;
use crate::constants::CHANNEL_COUNT;
use crate::driver::ChannelDriver;
use crate::envelope::EnvelopeBank;
use crate::song::Song;
use crate::timing::FrameTiming;
use crate::{Result, SequencerError};

pub use looping::LoopWindow;
pub use scheduler::ScheduledEvent;

/// Outcome of one [`Engine::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    /// The frame counter moved forward.
    Advanced,
    /// The loop end was reached and the frame counter wrapped.
    Looped,
}

/// Playback engine driving a [`ChannelDriver`].
pub struct Engine<D: ChannelDriver> {
    config: EngineConfig,
    timing: FrameTiming,
    envelopes: EnvelopeBank,
    events: Vec<ScheduledEvent>,
    loop_window: Option<LoopWindow>,
    channels: [Channel; CHANNEL_COUNT],
    frame: i64,
    driver: D,
}

impl<D: ChannelDriver> Engine<D> {
    /// Build an engine for a decoded song.
    ///
    /// # Errors
    /// Returns [`SequencerError::ConfigError`] for an invalid configuration or
    /// tempo, and [`SequencerError::Other`] for events addressing a channel
    /// that does not exist.
    pub fn new(song: Song, envelopes: EnvelopeBank, config: EngineConfig, driver: D) -> Result<Self> {
        config.validate()?;
        let timing = FrameTiming::new(song.bpm, config.tick_rate_hz)?;

        if let Some(bad) = song.events.iter().find(|e| e.channel >= CHANNEL_COUNT) {
            return Err(SequencerError::Other(format!(
                "event targets channel {}, only {CHANNEL_COUNT} exist",
                bad.channel
            )));
        }

        let loop_window = LoopWindow::from_song(&song, &timing);
        let events: Vec<ScheduledEvent> = song
            .events
            .into_iter()
            .map(|event| ScheduledEvent::new(event, &timing))
            .collect();

        log::info!(
            "{} events at {} BPM, {:.4} frames per 64th at {} Hz",
            events.len(),
            timing.bpm(),
            timing.frames_per_tick(),
            timing.tick_rate_hz()
        );
        if let Some(window) = loop_window {
            log::info!(
                "Looping frames {}..{}",
                window.start_frame(),
                window.end_frame()
            );
        }

        Ok(Self {
            config,
            timing,
            envelopes,
            events,
            loop_window,
            channels: std::array::from_fn(|_| Channel::default()),
            frame: 0,
            driver,
        })
    }

    /// Advance playback by one frame.
    pub fn tick(&mut self) -> TickResult {
        self.frame += 1;
        let ctx = TickContext {
            frame: self.frame,
            timing: &self.timing,
            config: &self.config,
            envelopes: &self.envelopes,
        };
        let matching = self.config.event_matching;

        for scheduled in self.events.iter_mut() {
            let event = *scheduled.event();
            let channel = &mut self.channels[event.channel];
            if scheduled.start_due(ctx.frame, matching) {
                channel.start_event(event.channel, &event, &ctx, &mut self.driver);
            }
            if scheduled.end_due(ctx.frame, matching) {
                channel.end_event(event.channel, &event, &ctx, &mut self.driver);
            }
        }

        for (index, channel) in self.channels.iter_mut().enumerate() {
            channel.step(index, &ctx, &mut self.driver);
        }

        match self.loop_window {
            Some(window) if window.should_wrap(self.frame) => {
                self.wrap(window);
                TickResult::Looped
            }
            _ => TickResult::Advanced,
        }
    }

    fn wrap(&mut self, window: LoopWindow) {
        log::debug!(
            "Looping back to 64th {:.2} at frame {}",
            self.timing.position_of(window.start_frame()),
            self.frame
        );
        self.frame = window.restart_frame();
        for channel in self.channels.iter_mut() {
            channel.clear_slide();
        }
        for event in self.events.iter_mut() {
            event.rearm_from(window.start_frame());
        }
    }

    /// Stop every channel and restart playback from the top.
    pub fn reset(&mut self) {
        for (index, channel) in self.channels.iter_mut().enumerate() {
            self.driver.kill(index);
            *channel = Channel::default();
        }
        for event in self.events.iter_mut() {
            event.rearm();
        }
        self.frame = 0;
        log::debug!("Playback reset");
    }

    /// Current frame counter.
    pub fn frame(&self) -> i64 {
        self.frame
    }

    /// Song tempo.
    pub fn bpm(&self) -> u32 {
        self.timing.bpm()
    }

    /// Frames per 64th-note tick.
    pub fn frames_per_tick(&self) -> f64 {
        self.timing.frames_per_tick()
    }

    /// Frame timing in use.
    pub fn timing(&self) -> &FrameTiming {
        &self.timing
    }

    /// Current position in 64th-note ticks.
    pub fn song_position(&self) -> f64 {
        self.timing.position_of(self.frame)
    }

    /// Runtime state of one channel.
    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    /// Runtime state of every channel.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Scheduled events in song order.
    pub fn events(&self) -> &[ScheduledEvent] {
        &self.events
    }

    /// Envelope tables.
    pub fn envelopes(&self) -> &EnvelopeBank {
        &self.envelopes
    }

    /// Active loop window, if any.
    pub fn loop_window(&self) -> Option<LoopWindow> {
        self.loop_window
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The channel driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable access to the channel driver.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Consume the engine and hand back its driver.
    pub fn into_driver(self) -> D {
        self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EventMatching, MalformedLinePolicy};
    use crate::driver::{DriverCommand, NullDriver, RecordingDriver};
    use crate::parser::parse_song;

    fn engine(text: &str, config: EngineConfig) -> Engine<RecordingDriver> {
        let song = parse_song(text, MalformedLinePolicy::Abort).unwrap();
        Engine::new(song, EnvelopeBank::default(), config, RecordingDriver::default()).unwrap()
    }

    #[test]
    fn first_tick_processes_frame_one() {
        let mut engine = engine("BPM:120\n", EngineConfig::default());
        assert_eq!(engine.frame(), 0);
        assert_eq!(engine.tick(), TickResult::Advanced);
        assert_eq!(engine.frame(), 1);
    }

    #[test]
    fn catch_up_plays_frame_zero_events() {
        let mut engine = engine(
            "BPM:120\n0,0,60,100,0,16,64,0,100,0,0,0\n",
            EngineConfig::default(),
        );
        engine.tick();
        assert!(engine.channel(0).unwrap().is_active());
        assert!(matches!(
            engine.driver().commands(),
            [DriverCommand::NoteOn { volume: 39, .. }]
        ));
    }

    #[test]
    fn exact_matching_skips_frame_zero_events() {
        let config = EngineConfig {
            event_matching: EventMatching::Exact,
            ..EngineConfig::default()
        };
        let mut engine = engine(
            "BPM:120\n0,0,60,100,0,16,64,0,100,0,0,0\n0,0,62,100,16,32,64,0,100,0,0,0\n",
            config,
        );
        for _ in 0..30 {
            engine.tick();
        }
        let notes: Vec<_> = engine
            .driver()
            .commands()
            .iter()
            .filter(|c| matches!(c, DriverCommand::NoteOn { .. }))
            .collect();
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn reset_kills_everything_and_rewinds() {
        let mut engine = engine(
            "BPM:120\n3,0,60,100,0,16,64,0,100,0,0,0\n",
            EngineConfig::default(),
        );
        engine.tick();
        engine.tick();
        engine.driver_mut().clear();

        engine.reset();
        assert_eq!(engine.frame(), 0);
        assert!(engine.channels().iter().all(|c| !c.is_active()));
        assert_eq!(engine.driver().commands().len(), CHANNEL_COUNT);

        engine.driver_mut().clear();
        engine.tick();
        assert!(engine.channel(3).unwrap().is_active());
    }

    #[test]
    fn rejects_bad_config_and_channels() {
        let config = EngineConfig {
            tick_rate_hz: -1.0,
            ..EngineConfig::default()
        };
        assert!(Engine::new(Song::empty(), EnvelopeBank::default(), config, NullDriver).is_err());

        let mut song = parse_song(
            "BPM:120\n0,0,60,100,0,16,64,0,100,0,0,0\n",
            MalformedLinePolicy::Abort,
        )
        .unwrap();
        song.events[0].channel = 16;
        assert!(Engine::new(song, EnvelopeBank::default(), EngineConfig::default(), NullDriver).is_err());
    }

    #[test]
    fn song_position_tracks_frames() {
        let mut engine = engine("BPM:120\n", EngineConfig::default());
        for _ in 0..30 {
            engine.tick();
        }
        assert!((engine.song_position() - 30.0 / 1.8665625).abs() < 1e-9);
    }
}
