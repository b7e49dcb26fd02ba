//! Loop window between the loop start and loop end markers.

use crate::song::Song;
use crate::timing::FrameTiming;

/// Loop points in frames. Only exists when both markers are present and
/// start lies before end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopWindow {
    start_frame: i64,
    end_frame: i64,
}

impl LoopWindow {
    /// Build a window from frame positions.
    pub fn new(start_frame: i64, end_frame: i64) -> Option<Self> {
        (start_frame < end_frame).then_some(Self {
            start_frame,
            end_frame,
        })
    }

    /// Convert a song's loop markers.
    pub fn from_song(song: &Song, timing: &FrameTiming) -> Option<Self> {
        let (start, end) = match (song.loop_start_div, song.loop_end_div) {
            (Some(start), Some(end)) => (start, end),
            (None, None) => return None,
            (start, end) => {
                log::warn!("incomplete loop markers (start {start:?}, end {end:?}), not looping");
                return None;
            }
        };
        let window = Self::new(timing.frame_of(start), timing.frame_of(end));
        if window.is_none() {
            log::warn!("loop start {start} is not before loop end {end}, not looping");
        }
        window
    }

    /// First frame of the loop.
    pub fn start_frame(&self) -> i64 {
        self.start_frame
    }

    /// Frame that triggers the wrap.
    pub fn end_frame(&self) -> i64 {
        self.end_frame
    }

    /// Whether the frame counter has reached the loop end.
    pub fn should_wrap(&self, frame: i64) -> bool {
        frame >= self.end_frame
    }

    /// Frame counter value after a wrap. The next tick increments it onto
    /// the loop start.
    pub fn restart_frame(&self) -> i64 {
        (self.start_frame - 1).max(0)
    }
}
