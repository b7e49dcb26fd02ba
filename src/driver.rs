//! Channel driver abstraction
//!
//! The engine never generates audio itself. Every note-on, frequency,
//! volume and pan change is pushed to a [`ChannelDriver`], which maps it
//! onto the actual tone/noise generators of the host.
//!
//! # Example
//!
//! ```
//! use psg_sequencer::{ChannelDriver, RecordingDriver, Voice};
//!
//! let mut driver = RecordingDriver::default();
//! driver.note_on(0, Voice::Tone { duty: 3 }, 440.0, 100, 64);
//! driver.set_volume(0, 80);
//! assert_eq!(driver.commands().len(), 2);
//! ```

/// Generator kind used for a note-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voice {
    /// Pulse/duty-cycle tone keyed by the event's program.
    Tone {
        /// Duty cycle selector.
        duty: u8,
    },
    /// Pseudo-random noise.
    Noise,
}

/// Common interface for hardware or software channel backends
pub trait ChannelDriver {
    /// Start a note on a channel.
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel index (0-15)
    /// * `voice` - Tone (with duty) or noise generator
    /// * `frequency_hz` - Initial frequency
    /// * `volume` - Initial volume (0-127)
    /// * `pan` - Pan position (0 = left, 64 = center, 127 = right)
    fn note_on(&mut self, channel: usize, voice: Voice, frequency_hz: f32, volume: u8, pan: u8);

    /// Silence a channel immediately.
    fn kill(&mut self, channel: usize);

    /// Change a playing channel's frequency.
    fn set_frequency(&mut self, channel: usize, frequency_hz: f32);

    /// Change a channel's volume (0-127).
    fn set_volume(&mut self, channel: usize, volume: u8);

    /// Change a channel's pan (0-127).
    fn set_pan(&mut self, channel: usize, pan: u8);
}

impl<D: ChannelDriver + ?Sized> ChannelDriver for &mut D {
    fn note_on(&mut self, channel: usize, voice: Voice, frequency_hz: f32, volume: u8, pan: u8) {
        (**self).note_on(channel, voice, frequency_hz, volume, pan)
    }

    fn kill(&mut self, channel: usize) {
        (**self).kill(channel)
    }

    fn set_frequency(&mut self, channel: usize, frequency_hz: f32) {
        (**self).set_frequency(channel, frequency_hz)
    }

    fn set_volume(&mut self, channel: usize, volume: u8) {
        (**self).set_volume(channel, volume)
    }

    fn set_pan(&mut self, channel: usize, pan: u8) {
        (**self).set_pan(channel, pan)
    }
}

impl<D: ChannelDriver + ?Sized> ChannelDriver for Box<D> {
    fn note_on(&mut self, channel: usize, voice: Voice, frequency_hz: f32, volume: u8, pan: u8) {
        (**self).note_on(channel, voice, frequency_hz, volume, pan)
    }

    fn kill(&mut self, channel: usize) {
        (**self).kill(channel)
    }

    fn set_frequency(&mut self, channel: usize, frequency_hz: f32) {
        (**self).set_frequency(channel, frequency_hz)
    }

    fn set_volume(&mut self, channel: usize, volume: u8) {
        (**self).set_volume(channel, volume)
    }

    fn set_pan(&mut self, channel: usize, pan: u8) {
        (**self).set_pan(channel, pan)
    }
}

/// Driver that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDriver;

impl ChannelDriver for NullDriver {
    fn note_on(&mut self, _: usize, _: Voice, _: f32, _: u8, _: u8) {}
    fn kill(&mut self, _: usize) {}
    fn set_frequency(&mut self, _: usize, _: f32) {}
    fn set_volume(&mut self, _: usize, _: u8) {}
    fn set_pan(&mut self, _: usize, _: u8) {}
}

/// One call made on a driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverCommand {
    /// [`ChannelDriver::note_on`]
    NoteOn {
        /// Channel index
        channel: usize,
        /// Generator kind
        voice: Voice,
        /// Frequency in Hz
        frequency_hz: f32,
        /// Volume 0-127
        volume: u8,
        /// Pan 0-127
        pan: u8,
    },
    /// [`ChannelDriver::kill`]
    Kill {
        /// Channel index
        channel: usize,
    },
    /// [`ChannelDriver::set_frequency`]
    SetFrequency {
        /// Channel index
        channel: usize,
        /// Frequency in Hz
        frequency_hz: f32,
    },
    /// [`ChannelDriver::set_volume`]
    SetVolume {
        /// Channel index
        channel: usize,
        /// Volume 0-127
        volume: u8,
    },
    /// [`ChannelDriver::set_pan`]
    SetPan {
        /// Channel index
        channel: usize,
        /// Pan 0-127
        pan: u8,
    },
}

impl DriverCommand {
    /// Channel the command targets.
    pub fn channel(&self) -> usize {
        match *self {
            DriverCommand::NoteOn { channel, .. }
            | DriverCommand::Kill { channel }
            | DriverCommand::SetFrequency { channel, .. }
            | DriverCommand::SetVolume { channel, .. }
            | DriverCommand::SetPan { channel, .. } => channel,
        }
    }
}

/// Driver that records every command for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingDriver {
    commands: Vec<DriverCommand>,
}

impl RecordingDriver {
    /// All commands recorded so far, oldest first.
    pub fn commands(&self) -> &[DriverCommand] {
        &self.commands
    }

    /// Drain the recorded commands.
    pub fn take(&mut self) -> Vec<DriverCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Commands that targeted one channel.
    pub fn commands_for(&self, channel: usize) -> impl Iterator<Item = &DriverCommand> + '_ {
        self.commands.iter().filter(move |c| c.channel() == channel)
    }

    /// Forget everything recorded.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl ChannelDriver for RecordingDriver {
    fn note_on(&mut self, channel: usize, voice: Voice, frequency_hz: f32, volume: u8, pan: u8) {
        self.commands.push(DriverCommand::NoteOn {
            channel,
            voice,
            frequency_hz,
            volume,
            pan,
        });
    }

    fn kill(&mut self, channel: usize) {
        self.commands.push(DriverCommand::Kill { channel });
    }

    fn set_frequency(&mut self, channel: usize, frequency_hz: f32) {
        self.commands.push(DriverCommand::SetFrequency {
            channel,
            frequency_hz,
        });
    }

    fn set_volume(&mut self, channel: usize, volume: u8) {
        self.commands.push(DriverCommand::SetVolume { channel, volume });
    }

    fn set_pan(&mut self, channel: usize, pan: u8) {
        self.commands.push(DriverCommand::SetPan { channel, pan });
    }
}

/// Driver that reports every command through the `log` facade.
///
/// Note-ons and kills are logged at debug level; the per-tick frequency and
/// volume traffic at trace level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDriver;

impl ChannelDriver for LoggingDriver {
    fn note_on(&mut self, channel: usize, voice: Voice, frequency_hz: f32, volume: u8, pan: u8) {
        log::debug!(
            "ch{channel:02} note-on {voice:?} {frequency_hz:.1}Hz vol={volume} pan={pan}"
        );
    }

    fn kill(&mut self, channel: usize) {
        log::debug!("ch{channel:02} kill");
    }

    fn set_frequency(&mut self, channel: usize, frequency_hz: f32) {
        log::trace!("ch{channel:02} freq={frequency_hz:.1}Hz");
    }

    fn set_volume(&mut self, channel: usize, volume: u8) {
        log::trace!("ch{channel:02} vol={volume}");
    }

    fn set_pan(&mut self, channel: usize, pan: u8) {
        log::trace!("ch{channel:02} pan={pan}");
    }
}
